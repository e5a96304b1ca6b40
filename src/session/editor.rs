//! Source image plus instruction to edited image.

use super::{lock, Failure, SessionState};
use crate::error::NanoChefError;
use crate::gateway::{AiGateway, EditResult};
use crate::intake::ImagePayload;
use std::sync::{Arc, Mutex};

/// What the user sees when an edit fails.
pub const EDIT_FAILURE_MESSAGE: &str = "Failed to process image. Make sure your request is clear.";

#[derive(Debug, Default)]
struct EditState {
    payload: Option<ImagePayload>,
    instruction: String,
    state: SessionState,
    result: Option<EditResult>,
    failure: Option<Failure>,
    generation: u64,
}

/// Controller for the "edit a photo with an instruction" workflow.
///
/// At most one edit result is held at a time.
pub struct EditSession {
    gateway: Arc<dyn AiGateway>,
    inner: Mutex<EditState>,
}

impl EditSession {
    /// Creates an idle session with no image.
    pub fn new(gateway: Arc<dyn AiGateway>) -> Self {
        Self {
            gateway,
            inner: Mutex::new(EditState::default()),
        }
    }

    /// Replaces the source image, clearing the result and the instruction.
    pub fn upload(&self, payload: ImagePayload) {
        let mut inner = lock(&self.inner);
        inner.generation += 1;
        inner.payload = Some(payload);
        inner.instruction.clear();
        inner.result = None;
        inner.failure = None;
        inner.state = SessionState::Idle;
    }

    /// Drops the image, the instruction and any result.
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        let generation = inner.generation + 1;
        *inner = EditState {
            generation,
            ..EditState::default()
        };
    }

    /// Sets the edit instruction.
    pub fn set_instruction(&self, instruction: impl Into<String>) {
        lock(&self.inner).instruction = instruction.into();
    }

    /// The current edit instruction.
    pub fn instruction(&self) -> String {
        lock(&self.inner).instruction.clone()
    }

    /// Sends the image and instruction to the gateway.
    ///
    /// Does nothing without an image or with a blank instruction. A response
    /// that carries no image puts the session in [`SessionState::Failed`]
    /// even though the call itself succeeded.
    pub async fn submit(&self) -> SessionState {
        let (payload, instruction, generation) = {
            let mut inner = lock(&self.inner);
            let Some(payload) = inner.payload.clone() else {
                return inner.state;
            };
            if inner.instruction.trim().is_empty() {
                return inner.state;
            }
            inner.generation += 1;
            inner.result = None;
            inner.failure = None;
            inner.state = SessionState::Generating;
            (payload, inner.instruction.clone(), inner.generation)
        };

        tracing::debug!(generation, "requesting image edit");
        let outcome = self
            .gateway
            .edit_image(&payload, &instruction)
            .await
            .and_then(|result| {
                if result.has_image() {
                    Ok(result)
                } else {
                    Err(NanoChefError::EmptyResult(
                        "The model did not return an image. Try refining your prompt.".into(),
                    ))
                }
            });

        let mut inner = lock(&self.inner);
        if inner.generation != generation {
            tracing::debug!(
                generation,
                current = inner.generation,
                "discarding superseded edit response"
            );
            return inner.state;
        }

        match outcome {
            Ok(result) => {
                inner.result = Some(result);
                inner.state = SessionState::Complete;
            }
            Err(e) => {
                tracing::warn!(generation, "image edit failed: {e}");
                inner.failure = Some(Failure::from_error(&e, EDIT_FAILURE_MESSAGE));
                inner.state = SessionState::Failed;
            }
        }
        inner.state
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        lock(&self.inner).state
    }

    /// The source image.
    pub fn payload(&self) -> Option<ImagePayload> {
        lock(&self.inner).payload.clone()
    }

    /// The source image as a data URL.
    pub fn preview_url(&self) -> Option<String> {
        lock(&self.inner).payload.as_ref().map(ImagePayload::to_data_url)
    }

    /// The last successful edit.
    pub fn result(&self) -> Option<EditResult> {
        lock(&self.inner).result.clone()
    }

    /// The edited image from the last successful edit.
    pub fn result_image(&self) -> Option<ImagePayload> {
        lock(&self.inner)
            .result
            .as_ref()
            .and_then(|r| r.image.clone())
    }

    /// The last failure, if the session is in [`SessionState::Failed`].
    pub fn failure(&self) -> Option<Failure> {
        lock(&self.inner).failure.clone()
    }

    /// The user-facing error message, if any.
    pub fn error_message(&self) -> Option<&'static str> {
        lock(&self.inner).failure.as_ref().map(|f| f.message)
    }
}
