//! Gateway result types.

use crate::intake::ImagePayload;
use serde::{Deserialize, Serialize};

/// Gateway backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// Google Gemini models.
    Gemini,
    /// Anything else, including test doubles.
    Custom,
}

impl std::fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// The outcome of one image edit request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    /// Commentary the model returned alongside (or instead of) the image.
    pub text: Option<String>,
    /// The edited image.
    pub image: Option<ImagePayload>,
}

impl EditResult {
    /// True if the model returned an image.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}
