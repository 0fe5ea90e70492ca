//! Engine Configuration
//!
//! `EngineConfig` is loaded from an optional TOML file, then overlaid with
//! environment variables. Every field has a default so a partial file (or no
//! file at all) yields a usable configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use site_tailor_core::ProxyConfig;
use site_tailor_llm::{ProviderConfig, ProviderType};

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::default_workspace_root;

pub const ENV_API_KEY: &str = "SITE_TAILOR_API_KEY";
pub const ENV_MODEL: &str = "SITE_TAILOR_MODEL";
pub const ENV_BASE_URL: &str = "SITE_TAILOR_BASE_URL";
pub const ENV_PROVIDER: &str = "SITE_TAILOR_PROVIDER";
pub const ENV_WORKSPACE: &str = "SITE_TAILOR_WORKSPACE";
pub const ENV_PROXY: &str = "SITE_TAILOR_PROXY";

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding one sub-directory per domain
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// Name of the per-domain snapshot directory
    #[serde(default = "default_versions_dir_name")]
    pub versions_dir_name: String,
    /// Model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Attempts per model call before a rate limit is surfaced
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    /// Upper bound on a single backoff sleep
    #[serde(default = "default_retry_max_delay_secs")]
    pub retry_max_delay_secs: u64,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub locator: LocatorSettings,
    /// Buffered progress events per subscriber
    #[serde(default = "default_progress_capacity")]
    pub progress_capacity: usize,
}

fn default_versions_dir_name() -> String {
    "versions".to_string()
}

fn default_max_retry_attempts() -> u32 {
    5
}

fn default_retry_max_delay_secs() -> u64 {
    60
}

fn default_progress_capacity() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            versions_dir_name: default_versions_dir_name(),
            provider: ProviderConfig::default(),
            max_retry_attempts: default_max_retry_attempts(),
            retry_max_delay_secs: default_retry_max_delay_secs(),
            pipeline: PipelineSettings::default(),
            locator: LocatorSettings::default(),
            progress_capacity: default_progress_capacity(),
        }
    }
}

/// Multi-stage pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Refinement rounds after the first Coding pass
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Pause between role invocations
    #[serde(default = "default_inter_call_delay_ms")]
    pub inter_call_delay_ms: u64,
    /// Pause between documents of a batch
    #[serde(default = "default_inter_document_delay_ms")]
    pub inter_document_delay_ms: u64,
    /// Case-insensitive phrases that mark review feedback as approval
    #[serde(default = "default_approval_patterns")]
    pub approval_patterns: Vec<String>,
}

fn default_max_iterations() -> u32 {
    3
}

fn default_inter_call_delay_ms() -> u64 {
    2000
}

fn default_inter_document_delay_ms() -> u64 {
    3000
}

fn default_approval_patterns() -> Vec<String> {
    ["looks good", "excellent", "great job", "no issues", "passed"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            inter_call_delay_ms: default_inter_call_delay_ms(),
            inter_document_delay_ms: default_inter_document_delay_ms(),
            approval_patterns: default_approval_patterns(),
        }
    }
}

impl PipelineSettings {
    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_millis(self.inter_call_delay_ms)
    }

    pub fn inter_document_delay(&self) -> Duration {
        Duration::from_millis(self.inter_document_delay_ms)
    }

    /// No throttling; used by tests and dry runs.
    pub fn without_delays(mut self) -> Self {
        self.inter_call_delay_ms = 0;
        self.inter_document_delay_ms = 0;
        self
    }
}

/// Candidate scoring thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocatorSettings {
    /// Top score at or above which a single candidate is returned
    #[serde(default = "default_confident_score")]
    pub confident_score: u8,
    /// Lowest score kept when no candidate is confident
    #[serde(default = "default_ambiguous_floor")]
    pub ambiguous_floor: u8,
    /// Points per overlapping word
    #[serde(default = "default_word_bonus")]
    pub word_bonus: u8,
    /// Base score for any word overlap
    #[serde(default = "default_word_base")]
    pub word_base: u8,
    /// Ceiling for word-overlap scores; must stay below `confident_score`
    #[serde(default = "default_word_cap")]
    pub word_cap: u8,
}

fn default_confident_score() -> u8 {
    70
}

fn default_ambiguous_floor() -> u8 {
    40
}

fn default_word_bonus() -> u8 {
    10
}

fn default_word_base() -> u8 {
    50
}

fn default_word_cap() -> u8 {
    50
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            confident_score: default_confident_score(),
            ambiguous_floor: default_ambiguous_floor(),
            word_bonus: default_word_bonus(),
            word_base: default_word_base(),
            word_cap: default_word_cap(),
        }
    }
}

/// Partial update (CLI flags, programmatic overrides)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfigUpdate {
    pub workspace_root: Option<PathBuf>,
    pub provider: Option<ProviderType>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub proxy: Option<ProxyConfig>,
    pub max_retry_attempts: Option<u32>,
    pub max_iterations: Option<u32>,
    pub inter_call_delay_ms: Option<u64>,
    pub inter_document_delay_ms: Option<u64>,
}

impl EngineConfig {
    /// Load from a TOML file. A missing file yields defaults; a malformed
    /// one is a `Config` error.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            tracing::debug!("[config] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| AppError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| AppError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `SITE_TAILOR_*` variables from the process environment.
    pub fn with_env_overrides(self) -> AppResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay variables from an arbitrary lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut update = EngineConfigUpdate {
            api_key: non_empty(ENV_API_KEY),
            model: non_empty(ENV_MODEL),
            base_url: non_empty(ENV_BASE_URL),
            workspace_root: non_empty(ENV_WORKSPACE).map(PathBuf::from),
            ..Default::default()
        };
        if let Some(provider) = non_empty(ENV_PROVIDER) {
            update.provider = Some(
                provider
                    .parse::<ProviderType>()
                    .map_err(|e| AppError::config(e.to_string()))?,
            );
        }
        if let Some(proxy) = non_empty(ENV_PROXY) {
            update.proxy = Some(ProxyConfig::parse(&proxy)?);
        }
        self.apply_update(update);
        self.validate()?;
        Ok(self)
    }

    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: EngineConfigUpdate) {
        if let Some(root) = update.workspace_root {
            self.workspace_root = root;
        }
        if let Some(provider) = update.provider {
            self.provider.provider = provider;
        }
        if let Some(model) = update.model {
            self.provider.model = model;
        }
        if let Some(key) = update.api_key {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = update.base_url {
            self.provider.base_url = Some(url);
        }
        if let Some(proxy) = update.proxy {
            self.provider.proxy = Some(proxy);
        }
        if let Some(attempts) = update.max_retry_attempts {
            self.max_retry_attempts = attempts;
        }
        if let Some(iterations) = update.max_iterations {
            self.pipeline.max_iterations = iterations;
        }
        if let Some(delay) = update.inter_call_delay_ms {
            self.pipeline.inter_call_delay_ms = delay;
        }
        if let Some(delay) = update.inter_document_delay_ms {
            self.pipeline.inter_document_delay_ms = delay;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.max_retry_attempts == 0 {
            return Err(AppError::config("max_retry_attempts must be at least 1"));
        }
        if self.versions_dir_name.trim().is_empty() || self.versions_dir_name.contains(['/', '\\'])
        {
            return Err(AppError::config(
                "versions_dir_name must be a single directory name",
            ));
        }
        if self.locator.ambiguous_floor > self.locator.confident_score {
            return Err(AppError::config(
                "locator.ambiguous_floor cannot exceed locator.confident_score",
            ));
        }
        if self.locator.word_cap >= self.locator.confident_score {
            return Err(AppError::config(
                "locator.word_cap must be below locator.confident_score",
            ));
        }
        if self.locator.confident_score > 100 {
            return Err(AppError::config("locator.confident_score cannot exceed 100"));
        }
        if self.progress_capacity == 0 {
            return Err(AppError::config("progress_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_secs(self.retry_max_delay_secs)
    }
}
