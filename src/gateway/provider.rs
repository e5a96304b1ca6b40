//! Gateway trait.

use crate::error::Result;
use crate::gateway::types::{EditResult, GatewayKind};
use crate::intake::ImagePayload;
use crate::recipe::RecipeSet;
use async_trait::async_trait;

/// Stateless facade over a hosted generative model.
///
/// Implementations never retry; every failure is handed back to the caller.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Suggests recipes for the ingredients visible in `image`.
    ///
    /// An empty or unparseable answer is an error, never a partial set.
    async fn suggest_recipes(&self, image: &ImagePayload) -> Result<RecipeSet>;

    /// Synthesizes a photo of a dish from its description.
    ///
    /// Returns `Ok(None)` when the model produced no image.
    async fn synthesize_dish_image(&self, description: &str) -> Result<Option<ImagePayload>>;

    /// Applies a natural-language edit to `image`.
    ///
    /// A result without an image is still `Ok`; deciding whether that is a
    /// failure is up to the caller.
    async fn edit_image(&self, image: &ImagePayload, instruction: &str) -> Result<EditResult>;

    /// Returns the kind of this gateway.
    fn kind(&self) -> GatewayKind;

    /// Returns the name of this gateway for display.
    fn name(&self) -> &str {
        match self.kind() {
            GatewayKind::Gemini => "Gemini (Google)",
            GatewayKind::Custom => "custom",
        }
    }

    /// Checks if the backend is reachable and the credential is accepted.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
