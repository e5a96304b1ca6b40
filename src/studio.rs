//! The two-mode shell: one recipe session and one edit session side by side.

use crate::error::Result;
use crate::gateway::AiGateway;
use crate::intake::{ImageIntake, ImagePayload};
use crate::session::{EditSession, RecipeSession, SessionState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Which workflow is in front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ingredients photo to recipes.
    #[default]
    Chef,
    /// Instruction-guided image editing.
    Editor,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chef => write!(f, "chef"),
            Self::Editor => write!(f, "editor"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chef" | "recipes" => Ok(Self::Chef),
            "editor" | "edit" => Ok(Self::Editor),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Both sessions plus the intake that feeds them.
///
/// Switching modes keeps each session's state; sessions never share state.
pub struct Studio {
    mode: Mode,
    intake: ImageIntake,
    chef: RecipeSession,
    editor: EditSession,
}

impl Studio {
    /// Creates a studio in [`Mode::Chef`] with both sessions idle.
    pub fn new(gateway: Arc<dyn AiGateway>, intake: ImageIntake) -> Self {
        Self {
            mode: Mode::default(),
            intake,
            chef: RecipeSession::new(Arc::clone(&gateway)),
            editor: EditSession::new(gateway),
        }
    }

    /// The active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches the active mode.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            tracing::debug!(from = %self.mode, to = %mode, "switching mode");
        }
        self.mode = mode;
    }

    /// The recipe session.
    pub fn chef(&self) -> &RecipeSession {
        &self.chef
    }

    /// The edit session.
    pub fn editor(&self) -> &EditSession {
        &self.editor
    }

    /// State of the session in front.
    pub fn active_state(&self) -> SessionState {
        match self.mode {
            Mode::Chef => self.chef.state(),
            Mode::Editor => self.editor.state(),
        }
    }

    /// Hands a payload to the session in front.
    pub fn upload(&self, payload: ImagePayload) {
        match self.mode {
            Mode::Chef => self.chef.upload(payload),
            Mode::Editor => self.editor.upload(payload),
        }
    }

    /// Reads a file through the intake and uploads it to the session in
    /// front.
    ///
    /// Returns `Ok(false)` if the intake dropped the file, in which case the
    /// session is left untouched.
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> Result<bool> {
        match self.intake.read_file(path).await? {
            Some(payload) => {
                self.upload(payload);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Clears the session in front.
    pub fn clear(&self) {
        match self.mode {
            Mode::Chef => self.chef.clear(),
            Mode::Editor => self.editor.clear(),
        }
    }
}
