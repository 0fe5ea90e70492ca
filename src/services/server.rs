//! Server Handle
//!
//! The engine asks whatever serves a domain's files to pick up new content
//! after a write. Process lifecycle stays with the caller.

use async_trait::async_trait;

use crate::utils::error::AppResult;

/// Something that serves a domain's files and can be told to reload them.
#[async_trait]
pub trait ServerHandle: Send + Sync {
    async fn restart(&self, domain: &str) -> AppResult<()>;
}

/// Used when nothing is serving the files.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopServerHandle;

#[async_trait]
impl ServerHandle for NoopServerHandle {
    async fn restart(&self, domain: &str) -> AppResult<()> {
        tracing::trace!("[server] no server to restart for {}", domain);
        Ok(())
    }
}
