//! The AI gateway: recipe suggestion, dish synthesis and image editing.

mod provider;
pub mod providers;
mod types;

pub use provider::AiGateway;
pub use types::{EditResult, GatewayKind};
