//! Ingredients photo to recipes, with background dish illustrations.

use super::illustration::{IllustrationTask, IllustrationUpdate};
use super::{lock, Failure, SessionState};
use crate::gateway::AiGateway;
use crate::intake::ImagePayload;
use crate::recipe::{IllustrationMap, Recipe, RecipeSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// What the user sees when recipe generation fails.
pub const RECIPE_FAILURE_MESSAGE: &str = "Failed to generate recipes. Please try again.";

#[derive(Debug, Default)]
struct RecipeState {
    payload: Option<ImagePayload>,
    state: SessionState,
    recipes: RecipeSet,
    illustrations: IllustrationMap,
    failure: Option<Failure>,
    generation: u64,
    /// Illustration tasks of the current generation not yet applied.
    pending: usize,
}

impl RecipeState {
    fn reset_results(&mut self) {
        self.generation += 1;
        self.recipes.clear();
        self.illustrations.clear();
        self.failure = None;
        self.pending = 0;
    }
}

/// Controller for the "ingredients photo to recipe list" workflow.
///
/// All methods take `&self`, so an upload can land while a request is
/// outstanding; the late response is then discarded.
pub struct RecipeSession {
    gateway: Arc<dyn AiGateway>,
    inner: Mutex<RecipeState>,
    updates_tx: mpsc::UnboundedSender<IllustrationUpdate>,
    updates_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<IllustrationUpdate>>,
}

impl RecipeSession {
    /// Creates an idle session with no image.
    pub fn new(gateway: Arc<dyn AiGateway>) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            inner: Mutex::new(RecipeState::default()),
            updates_tx,
            updates_rx: tokio::sync::Mutex::new(updates_rx),
        }
    }

    /// Replaces the ingredients photo and drops every previous result.
    pub fn upload(&self, payload: ImagePayload) {
        let mut inner = lock(&self.inner);
        inner.reset_results();
        inner.payload = Some(payload);
        inner.state = SessionState::Idle;
        tracing::debug!(generation = inner.generation, "ingredients photo uploaded");
    }

    /// Drops the photo and every result.
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        inner.reset_results();
        inner.payload = None;
        inner.state = SessionState::Idle;
    }

    /// Asks the gateway for recipes for the current photo.
    ///
    /// Does nothing without a photo. On success the cursor is on the first
    /// recipe and one illustration task per recipe is running in the
    /// background; the returned state does not wait for them.
    pub async fn generate(&self) -> SessionState {
        let (payload, generation) = {
            let mut inner = lock(&self.inner);
            let Some(payload) = inner.payload.clone() else {
                return inner.state;
            };
            inner.reset_results();
            inner.state = SessionState::Generating;
            (payload, inner.generation)
        };

        tracing::debug!(generation, "requesting recipe suggestions");
        let result = self.gateway.suggest_recipes(&payload).await;

        let mut inner = lock(&self.inner);
        if inner.generation != generation {
            tracing::debug!(
                generation,
                current = inner.generation,
                "discarding superseded recipe response"
            );
            return inner.state;
        }

        match result {
            Ok(recipes) => {
                let tasks: Vec<IllustrationTask> = recipes
                    .iter()
                    .enumerate()
                    .map(|(i, r)| IllustrationTask::new(generation, i, r.visual_description.as_str()))
                    .collect();

                inner.recipes = recipes;
                inner.state = SessionState::Complete;
                inner.pending = tasks.len();
                drop(inner);

                tracing::debug!(generation, count = tasks.len(), "launching dish illustrations");
                for task in tasks {
                    task.spawn(Arc::clone(&self.gateway), self.updates_tx.clone());
                }
                SessionState::Complete
            }
            Err(e) => {
                tracing::warn!(generation, "recipe generation failed: {e}");
                inner.failure = Some(Failure::from_error(&e, RECIPE_FAILURE_MESSAGE));
                inner.state = SessionState::Failed;
                SessionState::Failed
            }
        }
    }

    /// Moves to the next recipe, wrapping around.
    pub fn advance(&self) {
        lock(&self.inner).recipes.advance();
    }

    /// Moves to the previous recipe, wrapping around.
    pub fn retreat(&self) {
        lock(&self.inner).recipes.retreat();
    }

    /// Waits for the next illustration of the current generation, writes it
    /// into the map and returns it.
    ///
    /// Returns `None` once nothing is pending. Stale updates are skipped.
    pub async fn next_illustration(&self) -> Option<IllustrationUpdate> {
        let mut rx = self.updates_rx.lock().await;
        loop {
            if lock(&self.inner).pending == 0 {
                return None;
            }
            let update = rx.recv().await?;
            if self.apply(&update) {
                return Some(update);
            }
        }
    }

    /// Applies every update that has already arrived without waiting.
    ///
    /// Returns the number of current-generation updates applied. Returns 0
    /// without draining while a [`next_illustration`](Self::next_illustration)
    /// call is waiting, since that call owns the receiver.
    pub fn drain_illustrations(&self) -> usize {
        let Ok(mut rx) = self.updates_rx.try_lock() else {
            tracing::debug!("illustration receiver busy, skipping drain");
            return 0;
        };
        let mut applied = 0;
        while let Ok(update) = rx.try_recv() {
            if self.apply(&update) {
                applied += 1;
            }
        }
        applied
    }

    /// Applies illustrations until none are pending.
    pub async fn wait_for_illustrations(&self) {
        while self.next_illustration().await.is_some() {}
    }

    fn apply(&self, update: &IllustrationUpdate) -> bool {
        let mut inner = lock(&self.inner);
        if update.generation != inner.generation {
            tracing::debug!(
                index = update.index,
                generation = update.generation,
                "discarding stale illustration"
            );
            return false;
        }

        inner.pending = inner.pending.saturating_sub(1);
        if let Some(ref image) = update.image {
            inner.illustrations.insert(update.index, image.clone());
        }
        true
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        lock(&self.inner).state
    }

    /// The uploaded photo.
    pub fn payload(&self) -> Option<ImagePayload> {
        lock(&self.inner).payload.clone()
    }

    /// The uploaded photo as a data URL.
    pub fn preview_url(&self) -> Option<String> {
        lock(&self.inner).payload.as_ref().map(ImagePayload::to_data_url)
    }

    /// A copy of the recipe set, including its cursor.
    pub fn recipes(&self) -> RecipeSet {
        lock(&self.inner).recipes.clone()
    }

    /// The recipe under the cursor.
    pub fn current_recipe(&self) -> Option<Recipe> {
        lock(&self.inner).recipes.current().cloned()
    }

    /// Cursor position, `None` while there are no recipes.
    pub fn cursor(&self) -> Option<usize> {
        lock(&self.inner).recipes.cursor()
    }

    /// A copy of the illustrations received so far.
    pub fn illustrations(&self) -> IllustrationMap {
        lock(&self.inner).illustrations.clone()
    }

    /// Illustration for one recipe, if it has arrived.
    pub fn illustration(&self, index: usize) -> Option<ImagePayload> {
        lock(&self.inner).illustrations.get(index).cloned()
    }

    /// Illustration tasks still outstanding for the current recipes.
    pub fn pending_illustrations(&self) -> usize {
        lock(&self.inner).pending
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
