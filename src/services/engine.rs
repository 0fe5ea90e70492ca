//! Modification Engine
//!
//! Entry point for a modification request: recognizes simple text
//! replacements, routes broad requests to the pipeline, and handles the rest
//! file by file through locate and apply. Every outcome, including internal
//! failure, comes back as a `ModificationResult`.

use std::sync::Arc;

use site_tailor_core::{ProgressEvent, ProgressStatus};
use site_tailor_llm::LlmProvider;

use crate::config::EngineConfig;
use crate::models::{
    ActionType, Instruction, MatchConfidence, ModificationResult, SimpleReplacement, TargetFile,
};
use crate::services::applier::ChangeApplier;
use crate::services::gateway::ModelGateway;
use crate::services::instruction::InstructionParser;
use crate::services::locator::ElementLocator;
use crate::services::pipeline::PipelineOrchestrator;
use crate::services::progress::ProgressReporter;
use crate::services::server::{NoopServerHandle, ServerHandle};
use crate::services::store::{DocumentStore, VersionSnapshot};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{validate_domain, validate_relative_file};

/// Page a creation lands on when the instruction names no file.
const DEFAULT_PAGE: &str = "index.html";

pub struct ModificationEngine {
    store: DocumentStore,
    parser: InstructionParser,
    locator: ElementLocator,
    applier: ChangeApplier,
    pipeline: PipelineOrchestrator,
    progress: ProgressReporter,
    server: Arc<dyn ServerHandle>,
}

impl ModificationEngine {
    pub fn new(config: &EngineConfig, provider: Arc<dyn LlmProvider>) -> Self {
        let store = DocumentStore::new(config.workspace_root.clone(), config.versions_dir_name.clone());
        let gateway = ModelGateway::from_config(provider, config);
        let progress = ProgressReporter::new(config.progress_capacity);
        let pipeline = PipelineOrchestrator::new(
            gateway.clone(),
            store.clone(),
            config.pipeline.clone(),
            progress.clone(),
        );
        Self {
            store,
            parser: InstructionParser::new(),
            locator: ElementLocator::new(config.locator),
            applier: ChangeApplier::new(gateway),
            pipeline,
            progress,
            server: Arc::new(NoopServerHandle),
        }
    }

    /// Build the engine with the provider named in the config.
    pub fn from_config(config: &EngineConfig) -> AppResult<Self> {
        config.validate()?;
        let provider = site_tailor_llm::create_provider(config.provider.clone())?;
        Ok(Self::new(config, provider))
    }

    pub fn with_server(mut self, server: Arc<dyn ServerHandle>) -> Self {
        self.server = server;
        self
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    /// Apply `instruction` to `file` (or the file named by an `@file`
    /// token, or every page) of `domain`.
    pub async fn modify(&self, domain: &str, file: Option<&str>, instruction: &str) -> ModificationResult {
        self.progress
            .status(ProgressStatus::Started, domain, "Applying instruction");
        let result = match self.modify_inner(domain, file, instruction).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("[engine] modify failed for {}: {}", domain, e);
                self.progress
                    .status(ProgressStatus::Error, domain, e.user_message());
                ModificationResult::failure(e.user_message())
            }
        };
        self.finish(domain, &result).await;
        result
    }

    /// Run the plan/design/code/test pipeline over every page of `domain`.
    pub async fn run_pipeline(&self, domain: &str, instruction: &str) -> ModificationResult {
        self.progress
            .status(ProgressStatus::Started, domain, "Running pipeline");
        let result = match self.pipeline_inner(domain, &TargetFile::All, instruction).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("[engine] pipeline failed for {}: {}", domain, e);
                ModificationResult::failure(e.user_message())
            }
        };
        self.finish(domain, &result).await;
        result
    }

    /// Put a snapshot back. The current content is itself snapshotted.
    pub async fn restore(&self, domain: &str, file: &str, version_id: &str) -> AppResult<Option<VersionSnapshot>> {
        let snapshot = self.store.restore_version(domain, file, version_id).await?;
        self.restart_server(domain).await;
        Ok(snapshot)
    }

    /// Whether a parsed instruction goes to the pipeline instead of the
    /// per-element path.
    pub fn should_use_pipeline(&self, instruction: &Instruction, file_count: usize) -> bool {
        if instruction.action_type == ActionType::Create {
            return false;
        }
        let target = instruction.target_description.as_str();
        if self.parser.is_page_target(target) {
            return true;
        }
        let open_ended = instruction.action_type.is_open_ended() || instruction.action_type == ActionType::Generic;
        open_ended
            && target.is_empty()
            && ((instruction.target_file.is_all() && file_count > 1)
                || self.parser.mentions_page_scope(&instruction.raw_text))
    }

    async fn modify_inner(&self, domain: &str, file: Option<&str>, instruction: &str) -> AppResult<ModificationResult> {
        validate_domain(domain)?;
        let explicit = file
            .map(str::trim)
            .filter(|f| !f.is_empty() && *f != "all")
            .map(|f| TargetFile::File(f.to_string()));

        if let Some(mut replacement) = self.parser.parse_replacement(instruction) {
            if let Some(target) = explicit {
                replacement.target_file = target;
            }
            return self.replace_text(domain, &replacement).await;
        }

        let mut parsed = self.parser.parse(instruction);
        if let Some(target) = explicit {
            parsed.target_file = target;
        }
        tracing::info!(
            "[engine] {}: {} '{}' -> '{}' ({})",
            domain,
            parsed.action_type,
            parsed.target_description,
            parsed.action_value,
            parsed.target_file
        );

        let files = self.resolve_files(domain, &parsed.target_file).await?;
        if self.should_use_pipeline(&parsed, files.len()) {
            return self.pipeline_inner(domain, &parsed.target_file, instruction).await;
        }

        let files = if parsed.action_type == ActionType::Create && parsed.target_file.is_all() {
            vec![creation_page(&files)]
        } else {
            files
        };
        self.apply_per_file(domain, &files, &parsed).await
    }

    async fn apply_per_file(&self, domain: &str, files: &[String], instruction: &Instruction) -> AppResult<ModificationResult> {
        let mut result = ModificationResult::default();
        let mut last_error: Option<AppError> = None;

        for file in files {
            self.progress
                .file_status(ProgressStatus::Processing, domain, file, "Locating elements");
            match self.apply_to_file(domain, file, instruction).await {
                Ok(changed) => {
                    self.progress.emit(
                        ProgressEvent::new(ProgressStatus::Completed, domain, "Updated")
                            .with_file(file.as_str())
                            .with_changed_count(changed),
                    );
                    result.changed_count += changed;
                    result.files_updated.push(file.clone());
                }
                Err(AppError::NoMatch(target)) => {
                    tracing::info!("[engine] {}: nothing matched '{}'", file, target);
                    self.progress
                        .file_status(ProgressStatus::Skipped, domain, file, "No matching element");
                    last_error.get_or_insert(AppError::NoMatch(target));
                }
                Err(e) => {
                    tracing::warn!("[engine] {} failed: {}", file, e);
                    self.progress
                        .file_status(ProgressStatus::Error, domain, file, e.user_message());
                    result.files_failed.push(file.clone());
                    last_error = Some(e);
                }
            }
        }

        result.success = !result.files_updated.is_empty();
        result.message = if result.success {
            format!(
                "Updated {} element(s) in {} file(s)",
                result.changed_count,
                result.files_updated.len()
            )
        } else {
            last_error
                .map(|e| e.user_message())
                .unwrap_or_else(|| "Nothing was changed".to_string())
        };
        Ok(result)
    }

    /// Locate and apply within one file, then save. Returns the number of
    /// changed elements; the file is untouched on error.
    async fn apply_to_file(&self, domain: &str, file: &str, instruction: &Instruction) -> AppResult<usize> {
        let mut doc = self.store.load(domain, file).await?;

        let outcome = if instruction.action_type == ActionType::Create {
            self.applier.create(&mut doc, instruction).await?
        } else {
            let located = self
                .locator
                .locate(doc.tree(), &instruction.target_description);
            tracing::debug!(
                "[engine] {}: {:?} match, {} candidate(s), top score {:?}",
                file,
                located.confidence,
                located.candidates.len(),
                located.top_score()
            );
            let candidates = if located.confidence == MatchConfidence::Unfiltered {
                self.applier
                    .select_candidates(instruction, &located.candidates)
                    .await
            } else {
                located.candidates
            };
            if candidates.is_empty() {
                return Err(AppError::no_match(instruction.target_description.clone()));
            }
            self.applier.apply(&mut doc, &candidates, instruction).await?
        };

        if doc.is_modified() {
            self.store.save(domain, &doc).await?;
        }
        Ok(outcome.changed_count)
    }

    async fn replace_text(&self, domain: &str, replacement: &SimpleReplacement) -> AppResult<ModificationResult> {
        let files = self.resolve_files(domain, &replacement.target_file).await?;
        let mut result = ModificationResult::default();

        for file in &files {
            let content = match self.store.read(domain, file).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("[engine] {} unreadable: {}", file, e);
                    result.files_failed.push(file.clone());
                    continue;
                }
            };
            let (updated, count) = replacement.apply(&content);
            if count == 0 {
                self.progress
                    .file_status(ProgressStatus::Skipped, domain, file, "Text not found");
                continue;
            }
            match self.store.write(domain, file, &updated).await {
                Ok(_) => {
                    self.progress.emit(
                        ProgressEvent::new(ProgressStatus::Completed, domain, "Text replaced")
                            .with_file(file.as_str())
                            .with_changed_count(count),
                    );
                    result.changed_count += count;
                    result.files_updated.push(file.clone());
                }
                Err(e) => {
                    tracing::warn!("[engine] writing {} failed: {}", file, e);
                    self.progress
                        .file_status(ProgressStatus::Error, domain, file, e.user_message());
                    result.files_failed.push(file.clone());
                }
            }
        }

        result.success = !result.files_updated.is_empty();
        result.message = if result.success {
            format!(
                "Replaced {} occurrence(s) in {} file(s)",
                result.changed_count,
                result.files_updated.len()
            )
        } else {
            format!("Text '{}' not found", replacement.old_text)
        };
        Ok(result)
    }

    async fn pipeline_inner(&self, domain: &str, target: &TargetFile, instruction: &str) -> AppResult<ModificationResult> {
        validate_domain(domain)?;
        let files = self.resolve_files(domain, target).await?;
        tracing::info!("[engine] {}: pipeline over {} file(s)", domain, files.len());

        let summary = self.pipeline.run_batch(domain, &files, instruction).await;
        let files_updated = summary.written_files();
        let files_failed = summary.abandoned_files();
        let success = !files_updated.is_empty();
        let message = if success {
            format!(
                "Pipeline updated {} of {} file(s)",
                files_updated.len(),
                summary.outcomes.len()
            )
        } else if !files_failed.is_empty() {
            summary
                .outcomes
                .iter()
                .find_map(|o| o.error.clone())
                .unwrap_or_else(|| "Pipeline could not update any file".to_string())
        } else {
            "Pipeline produced no changes".to_string()
        };
        Ok(ModificationResult {
            success,
            message,
            changed_count: files_updated.len(),
            files_updated,
            files_failed,
        })
    }

    async fn resolve_files(&self, domain: &str, target: &TargetFile) -> AppResult<Vec<String>> {
        match target {
            TargetFile::File(file) => Ok(vec![validate_relative_file(file)?]),
            TargetFile::All => {
                let files = self.store.list_files(domain).await?;
                if files.is_empty() {
                    return Err(AppError::not_found(format!("no HTML files in {}", domain)));
                }
                Ok(files)
            }
        }
    }

    async fn finish(&self, domain: &str, result: &ModificationResult) {
        if !result.files_updated.is_empty() {
            self.restart_server(domain).await;
        }
        self.progress.emit(
            ProgressEvent::new(ProgressStatus::Finished, domain, result.message.clone())
                .with_changed_count(result.changed_count),
        );
    }

    async fn restart_server(&self, domain: &str) {
        if let Err(e) = self.server.restart(domain).await {
            tracing::warn!("[engine] server restart for {} failed: {}", domain, e);
        }
    }
}

/// `index.html` when present, else the first page.
fn creation_page(files: &[String]) -> String {
    files
        .iter()
        .find(|f| f.as_str() == DEFAULT_PAGE)
        .or_else(|| files.first())
        .cloned()
        .unwrap_or_else(|| DEFAULT_PAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gateway::testing::ScriptedProvider;

    fn engine() -> ModificationEngine {
        ModificationEngine::new(&EngineConfig::default(), Arc::new(ScriptedProvider::new()))
    }

    #[test]
    fn test_routing() {
        let engine = engine();
        let parser = InstructionParser::new();

        let broad = parser.parse("redesign the whole website to look modern");
        assert!(engine.should_use_pipeline(&broad, 3));

        let button = parser.parse("make the Submit button red");
        assert!(!engine.should_use_pipeline(&button, 3));

        let create = parser.parse("add a button that says Subscribe to the page");
        assert!(!engine.should_use_pipeline(&create, 3));

        let visit = parser.parse("make the Visit website button green");
        assert!(!engine.should_use_pipeline(&visit, 3));
    }

    #[test]
    fn test_creation_page() {
        let files = vec!["about.html".to_string(), "index.html".to_string()];
        assert_eq!(creation_page(&files), "index.html");
        assert_eq!(creation_page(&files[..1]), "about.html");
    }
}
