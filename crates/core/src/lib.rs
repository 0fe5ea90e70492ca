//! Site Tailor Core
//!
//! Foundational types shared by every crate in the Site Tailor workspace. This
//! crate has no dependency on HTML handling, storage, or LLM providers.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `progress` - Progress event vocabulary emitted while modifying a site
//! - `proxy` - Proxy configuration data types used by the HTTP client factory

pub mod error;
pub mod progress;
pub mod proxy;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Progress Events ────────────────────────────────────────────────────
pub use progress::{ProgressEvent, ProgressStatus};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
