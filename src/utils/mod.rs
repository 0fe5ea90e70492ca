//! Utilities
//!
//! Error type and path helpers shared across services.

pub mod error;
pub mod paths;

pub use error::*;
pub use paths::*;
