//! Pipeline Orchestrator
//!
//! Drives broad modifications through four model roles: a plan shared by
//! the batch, then per document design, code and review with a bounded
//! refinement loop. Documents run one after another with fixed throttling
//! between calls; a failing document is abandoned without stopping the
//! batch.

mod prompts;

use site_tailor_core::{ProgressEvent, ProgressStatus};

use crate::config::PipelineSettings;
use crate::models::{BatchSummary, DocumentOutcome, PipelineRun, PipelineState};
use crate::services::gateway::{ModelGateway, ModelRole};
use crate::services::progress::ProgressReporter;
use crate::services::store::DocumentStore;
use crate::utils::error::{AppError, AppResult};

/// Runs the plan/design/code/test loop over a batch of documents.
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    gateway: ModelGateway,
    store: DocumentStore,
    settings: PipelineSettings,
    progress: ProgressReporter,
    approval_patterns: Vec<String>,
}

impl PipelineOrchestrator {
    pub fn new(
        gateway: ModelGateway,
        store: DocumentStore,
        settings: PipelineSettings,
        progress: ProgressReporter,
    ) -> Self {
        let approval_patterns = settings
            .approval_patterns
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            gateway,
            store,
            settings,
            progress,
            approval_patterns,
        }
    }

    /// Whether review feedback approves the change.
    pub fn is_approval(&self, feedback: &str) -> bool {
        let feedback = feedback.to_lowercase();
        self.approval_patterns.iter().any(|p| feedback.contains(p))
    }

    /// Process `files` in order. Planning failure abandons every document.
    pub async fn run_batch(&self, domain: &str, files: &[String], instruction: &str) -> BatchSummary {
        let mut summary = BatchSummary::default();
        if files.is_empty() {
            return summary;
        }

        self.emit_stage(domain, None, PipelineState::Planning, "planning the modification");
        let plan = match self
            .gateway
            .generate(&prompts::plan_prompt(instruction), ModelRole::Analysis)
            .await
        {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!("[pipeline] planning failed for {}: {}", domain, e);
                self.progress
                    .status(ProgressStatus::Error, domain, format!("Planning failed: {}", e.user_message()));
                summary.outcomes = files
                    .iter()
                    .map(|file| abandoned(file, 0, &e))
                    .collect();
                return summary;
            }
        };
        tracing::debug!("[pipeline] plan for {}:\n{}", domain, plan);

        for (index, file) in files.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.inter_document_delay()).await;
            }
            let outcome = self.run_document(domain, file, &plan, instruction).await;
            summary.outcomes.push(outcome);
        }

        tracing::info!(
            "[pipeline] {}: {} done, {} abandoned, {} written",
            domain,
            summary.completed(),
            summary.abandoned(),
            summary.written_files().len()
        );
        summary
    }

    /// Run one document through design, code and review. Never fails; errors
    /// are folded into an abandoned outcome.
    pub async fn run_document(&self, domain: &str, file: &str, plan: &str, instruction: &str) -> DocumentOutcome {
        let content = match self.store.read(domain, file).await {
            Ok(content) => content,
            Err(e) => return self.abandon(domain, file, 0, e),
        };

        let mut run = PipelineRun::new(file, content, plan);
        if let Err(e) = self.drive(domain, &mut run, instruction).await {
            return self.abandon(domain, file, run.coding_invocations, e);
        }

        let approved = run
            .feedback
            .as_deref()
            .is_some_and(|feedback| self.is_approval(feedback));
        let mut outcome = DocumentOutcome {
            file: file.to_string(),
            state: PipelineState::Done,
            coding_invocations: run.coding_invocations,
            written: false,
            approved,
            error: None,
        };

        if !run.is_changed() {
            self.progress
                .file_status(ProgressStatus::Skipped, domain, file, "No changes produced");
            return outcome;
        }

        match self.store.write(domain, file, &run.current_content).await {
            Ok(_) => {
                outcome.written = true;
                self.progress
                    .file_status(ProgressStatus::Completed, domain, file, "Updated");
                outcome
            }
            Err(e) => self.abandon(domain, file, run.coding_invocations, e),
        }
    }

    async fn drive(&self, domain: &str, run: &mut PipelineRun, instruction: &str) -> AppResult<()> {
        run.state = PipelineState::Designing;
        self.emit_stage(domain, Some(&run.file), run.state, "designing");
        self.throttle().await;
        run.design_specs = self
            .gateway
            .generate(
                &prompts::design_prompt(&run.current_content, &run.plan),
                ModelRole::Design,
            )
            .await?;

        loop {
            run.state = PipelineState::Coding;
            self.emit_stage(domain, Some(&run.file), run.state, "writing the page");
            self.throttle().await;
            let coded = self
                .gateway
                .generate_html(
                    &prompts::code_prompt(&run.current_content, &run.plan, &run.design_specs),
                    ModelRole::Code,
                )
                .await?;
            run.coding_invocations += 1;
            run.current_content = extract_document(&coded)?;

            run.state = PipelineState::Testing;
            self.emit_stage(domain, Some(&run.file), run.state, "reviewing");
            self.throttle().await;
            let feedback = self
                .gateway
                .generate(
                    &prompts::review_prompt(&run.original_content, &run.current_content, instruction),
                    ModelRole::Test,
                )
                .await?;

            if self.is_approval(&feedback) {
                tracing::info!("[pipeline] {} approved after {} round(s)", run.file, run.iteration + 1);
                run.feedback = Some(feedback);
                break;
            }
            if run.iteration >= self.settings.max_iterations {
                tracing::info!(
                    "[pipeline] {} reached {} refinement(s), keeping last version",
                    run.file,
                    run.iteration
                );
                run.feedback = Some(feedback);
                break;
            }

            run.iteration += 1;
            run.state = PipelineState::Refining;
            run.design_specs
                .push_str(&prompts::feedback_section(run.iteration, &feedback));
            run.feedback = Some(feedback);
            self.emit_stage(domain, Some(&run.file), run.state, "refining from review");
        }

        run.state = PipelineState::Done;
        Ok(())
    }

    async fn throttle(&self) {
        let delay = self.settings.inter_call_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn abandon(&self, domain: &str, file: &str, coding_invocations: u32, error: AppError) -> DocumentOutcome {
        tracing::warn!("[pipeline] abandoning {}: {}", file, error);
        self.progress.file_status(
            ProgressStatus::Error,
            domain,
            file,
            error.user_message(),
        );
        abandoned(file, coding_invocations, &error)
    }

    fn emit_stage(&self, domain: &str, file: Option<&str>, state: PipelineState, message: &str) {
        let mut event = ProgressEvent::new(ProgressStatus::Processing, domain, message).with_stage(state.as_str());
        if let Some(file) = file {
            event = event.with_file(file);
        }
        self.progress.emit(event);
    }
}

fn abandoned(file: &str, coding_invocations: u32, error: &AppError) -> DocumentOutcome {
    DocumentOutcome {
        file: file.to_string(),
        state: PipelineState::Abandoned,
        coding_invocations,
        written: false,
        approved: false,
        error: Some(error.user_message()),
    }
}

/// Trim any prose around a generated document.
fn extract_document(text: &str) -> AppResult<String> {
    let lower = text.to_ascii_lowercase();
    let start = lower
        .find("<!doctype")
        .or_else(|| lower.find("<html"))
        .or_else(|| lower.find('<'))
        .ok_or_else(|| AppError::response_parse("coding step returned no markup"))?;
    let end = lower
        .rfind("</html>")
        .map(|i| i + "</html>".len())
        .or_else(|| lower.rfind('>').map(|i| i + 1))
        .filter(|&end| end > start)
        .ok_or_else(|| AppError::response_parse("coding step returned no markup"))?;
    Ok(text[start..end].to_string())
}
