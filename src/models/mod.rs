//! Data Models
//!
//! Transient data structures owned by a single request.

pub mod candidate;
pub mod instruction;
pub mod modification;
pub mod pipeline;

pub use candidate::*;
pub use instruction::*;
pub use modification::*;
pub use pipeline::*;
