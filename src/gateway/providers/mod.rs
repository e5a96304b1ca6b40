//! Gateway implementations.

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiGateway, GeminiGatewayBuilder, GeminiModel, DEFAULT_TEXT_MODEL};
