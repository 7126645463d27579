//! Lumina - turn text prompts into AI-generated images
//!
//! Sends prompts to Gemini's image model, keeps a local newest-first history
//! of the results, and exports them as PNG files.

pub mod ai;
pub mod app;
pub mod confirm;
pub mod error;
pub mod export;
pub mod gallery;
pub mod history;
pub mod models;
pub mod repl;
pub mod session;

pub use error::{Error, Result};
