#![warn(missing_docs)]
//! NanoChef - recipe ideas from an ingredients photo, and instruction-guided
//! image edits, on top of Gemini.
//!
//! # Quick Start - Recipes
//!
//! ```no_run
//! use std::sync::Arc;
//! use nanochef::{GeminiGateway, ImageIntake, RecipeSession, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> nanochef::Result<()> {
//!     let gateway = Arc::new(GeminiGateway::builder().build());
//!     let session = RecipeSession::new(gateway);
//!
//!     if let Some(photo) = ImageIntake::default().read_file("fridge.jpg").await? {
//!         session.upload(photo);
//!     }
//!
//!     if session.generate().await == SessionState::Complete {
//!         session.wait_for_illustrations().await;
//!         for (i, recipe) in session.recipes().iter().enumerate() {
//!             println!("{} ({})", recipe.title, recipe.cooking_time);
//!             if let Some(image) = session.illustration(i) {
//!                 image.save(format!("dish-{i}.png"))?;
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Editing
//!
//! ```no_run
//! use std::sync::Arc;
//! use nanochef::{EditSession, GeminiGateway, ImageIntake};
//!
//! #[tokio::main]
//! async fn main() -> nanochef::Result<()> {
//!     let session = EditSession::new(Arc::new(GeminiGateway::builder().build()));
//!     if let Some(photo) = ImageIntake::default().read_file("cat.png").await? {
//!         session.upload(photo);
//!     }
//!     session.set_instruction("Give the cat a tiny chef's hat");
//!     session.submit().await;
//!     if let Some(image) = session.result_image() {
//!         image.save("edited.png")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini`: the Gemini gateway (default)
//! - `cli`: the `nanochef` command-line interface (default)

mod error;

pub mod gateway;
pub mod intake;
pub mod recipe;
pub mod session;
pub mod studio;

// Re-export error types at crate root
pub use error::{NanoChefError, Result};

pub use gateway::{AiGateway, EditResult, GatewayKind};
pub use intake::{ImageFormat, ImageIntake, ImagePayload, IntakePolicy};
pub use recipe::{Difficulty, IllustrationMap, Recipe, RecipeSet};
pub use session::{
    EditSession, Failure, FailureKind, IllustrationTask, IllustrationUpdate, RecipeSession,
    SessionState, EDIT_FAILURE_MESSAGE, RECIPE_FAILURE_MESSAGE,
};
pub use studio::{Mode, Studio};

#[cfg(feature = "gemini")]
pub use gateway::providers::{GeminiGateway, GeminiGatewayBuilder, GeminiModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{NanoChefError, Result};
    pub use crate::gateway::{AiGateway, EditResult};
    pub use crate::intake::{ImageIntake, ImagePayload};
    pub use crate::recipe::{Recipe, RecipeSet};
    pub use crate::session::{EditSession, RecipeSession, SessionState};

    #[cfg(feature = "gemini")]
    pub use crate::gateway::providers::GeminiGateway;
}
