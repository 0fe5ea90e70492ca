//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients with proxy support.

use site_tailor_core::proxy::ProxyConfig;

use crate::types::{LlmError, LlmResult};

/// Build a `reqwest::Client` with the resolved proxy configuration.
///
/// - `Some(proxy)` -> configure proxy on the client
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
pub fn build_http_client(proxy: Option<&ProxyConfig>) -> LlmResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    match proxy {
        Some(cfg) => {
            let mut p = reqwest::Proxy::all(cfg.url()).map_err(|e| LlmError::InvalidRequest {
                message: format!("invalid proxy {}: {}", cfg.url(), e),
            })?;
            if let (Some(u), Some(pw)) = (&cfg.username, &cfg.password) {
                p = p.basic_auth(u, pw);
            }
            builder = builder.proxy(p);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder.build().map_err(|e| LlmError::NetworkError {
        message: format!("failed to build HTTP client: {}", e),
    })
}
