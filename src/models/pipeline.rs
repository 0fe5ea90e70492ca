//! Pipeline Models
//!
//! Per-document state for the plan/design/code/test loop.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Planning,
    Designing,
    Coding,
    Testing,
    Refining,
    Done,
    Abandoned,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Abandoned)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Planning => "planning",
            PipelineState::Designing => "designing",
            PipelineState::Coding => "coding",
            PipelineState::Testing => "testing",
            PipelineState::Refining => "refining",
            PipelineState::Done => "done",
            PipelineState::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loop state for a single document.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub file: String,
    pub original_content: String,
    pub current_content: String,
    pub plan: String,
    pub design_specs: String,
    /// Refinement round, 0..=max_iterations
    pub iteration: u32,
    pub feedback: Option<String>,
    pub state: PipelineState,
    pub coding_invocations: u32,
}

impl PipelineRun {
    pub fn new(file: impl Into<String>, content: impl Into<String>, plan: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            file: file.into(),
            original_content: content.clone(),
            current_content: content,
            plan: plan.into(),
            design_specs: String::new(),
            iteration: 0,
            feedback: None,
            state: PipelineState::Designing,
            coding_invocations: 0,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.current_content != self.original_content
    }
}

/// Final disposition of one document in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutcome {
    pub file: String,
    pub state: PipelineState,
    pub coding_invocations: u32,
    /// Whether new content was written
    pub written: bool,
    /// Approved by review rather than stopped at the iteration cap
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Best-effort summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == PipelineState::Done)
            .count()
    }

    pub fn abandoned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == PipelineState::Abandoned)
            .count()
    }

    pub fn written_files(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.written)
            .map(|o| o.file.clone())
            .collect()
    }

    pub fn abandoned_files(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.state == PipelineState::Abandoned)
            .map(|o| o.file.clone())
            .collect()
    }
}
