//! Session controllers for the two modes.
//!
//! Each controller owns its state exclusively. Every upload, clear and new
//! request bumps a generation counter, and completions tagged with an older
//! generation are dropped instead of being written into current state.
//! Nothing in flight is ever cancelled.

mod chef;
mod editor;
mod illustration;

pub use chef::{RecipeSession, RECIPE_FAILURE_MESSAGE};
pub use editor::{EditSession, EDIT_FAILURE_MESSAGE};
pub use illustration::{IllustrationTask, IllustrationUpdate};

use crate::error::NanoChefError;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Where a session is in its request cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing requested yet for the current upload.
    #[default]
    Idle,
    /// A request is outstanding.
    Generating,
    /// The last request succeeded.
    Complete,
    /// The last request failed.
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Generating => write!(f, "generating"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Why a session ended up in [`SessionState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transport, auth or parse failure from the gateway.
    RequestFailed,
    /// The call worked but returned no image.
    EmptyResult,
}

/// A failed request, reduced to what the user gets to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Failure category.
    pub kind: FailureKind,
    /// The underlying error, for logs.
    pub detail: String,
    /// The one message shown to the user.
    pub message: &'static str,
}

impl Failure {
    pub(crate) fn from_error(err: &NanoChefError, message: &'static str) -> Self {
        let kind = if err.is_request_failure() {
            FailureKind::RequestFailed
        } else {
            FailureKind::EmptyResult
        };
        Self {
            kind,
            detail: err.to_string(),
            message,
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
