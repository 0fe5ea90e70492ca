//! Site Tailor
//!
//! Applies natural-language modification instructions to the HTML files of
//! a cloned website. Small edits are resolved to specific elements and
//! applied in place; broad ones go through a plan/design/code/test model
//! pipeline. Every overwrite is snapshotted so it can be restored.

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::EngineConfig;
pub use models::{Instruction, ModificationResult};
pub use services::{DocumentStore, ModificationEngine, ProgressReporter};
pub use site_tailor_core::{ProgressEvent, ProgressStatus};
pub use utils::error::{AppError, AppResult};
