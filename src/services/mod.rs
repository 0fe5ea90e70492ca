//! Services
//!
//! The engine's components. Leaf modules (html, store, instruction, locator,
//! gateway, progress) know nothing of each other's callers; applier,
//! pipeline, clone and engine compose them.

pub mod applier;
pub mod clone;
pub mod engine;
pub mod gateway;
pub mod html;
pub mod instruction;
pub mod locator;
pub mod pipeline;
pub mod progress;
pub mod server;
pub mod store;

pub use applier::ChangeApplier;
pub use clone::{CloneService, LlmVisionCodegen, ScreenshotProvider, VisionCodegenProvider};
pub use engine::ModificationEngine;
pub use gateway::{ModelGateway, ModelRole};
pub use instruction::InstructionParser;
pub use locator::ElementLocator;
pub use pipeline::PipelineOrchestrator;
pub use progress::ProgressReporter;
pub use server::{NoopServerHandle, ServerHandle};
pub use store::{Document, DocumentStore, VersionSnapshot};
