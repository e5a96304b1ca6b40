//! Background dish-image synthesis, one task per recipe.

use crate::gateway::AiGateway;
use crate::intake::ImagePayload;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The completion of one [`IllustrationTask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustrationUpdate {
    /// Generation of the session that launched the task.
    pub generation: u64,
    /// Recipe index; the only map slot this update may write.
    pub index: usize,
    /// The synthesized image, or `None` for a miss.
    pub image: Option<ImagePayload>,
}

/// A request to illustrate one recipe.
#[derive(Debug, Clone)]
pub struct IllustrationTask {
    generation: u64,
    index: usize,
    description: String,
}

impl IllustrationTask {
    /// Creates a task for the recipe at `index`.
    pub fn new(generation: u64, index: usize, description: impl Into<String>) -> Self {
        Self {
            generation,
            index,
            description: description.into(),
        }
    }

    /// Runs the synthesis call. Errors are logged and reported as a miss.
    pub async fn run(self, gateway: &dyn AiGateway) -> IllustrationUpdate {
        let image = match gateway.synthesize_dish_image(&self.description).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(index = self.index, "dish illustration failed: {e}");
                None
            }
        };

        if image.is_none() {
            tracing::debug!(index = self.index, "no illustration produced");
        }

        IllustrationUpdate {
            generation: self.generation,
            index: self.index,
            image,
        }
    }

    /// Spawns the task, sending its update on `tx` when done.
    ///
    /// An update is sent even if the synthesis call panics; it then
    /// carries a miss.
    pub fn spawn(
        self,
        gateway: Arc<dyn AiGateway>,
        tx: mpsc::UnboundedSender<IllustrationUpdate>,
    ) -> JoinHandle<()> {
        let (generation, index) = (self.generation, self.index);
        tokio::spawn(async move {
            let work = tokio::spawn(async move { self.run(gateway.as_ref()).await });
            let update = match work.await {
                Ok(update) => update,
                Err(e) => {
                    tracing::warn!(index, "dish illustration task aborted: {e}");
                    IllustrationUpdate {
                        generation,
                        index,
                        image: None,
                    }
                }
            };
            // Fails only once the session has been dropped.
            let _ = tx.send(update);
        })
    }
}
