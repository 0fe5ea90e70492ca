//! Candidate Element Models

use serde::Serialize;

use crate::services::html::NodeId;

/// A located element and how well it matches the target description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateElement {
    #[serde(skip)]
    pub node: NodeId,
    /// Relevance in [0, 100]
    pub score: u8,
    pub tag: String,
    /// Visible label used for scoring
    pub text: String,
}

/// How `locate` arrived at its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// Empty target: every interactive element, all scored 100
    Blanket,
    /// Single top candidate at or above the confident score
    Confident,
    /// Several candidates above the ambiguity floor (or tied at the top)
    Ambiguous,
    /// Nothing scored well; every interactive element is returned
    Unfiltered,
    /// No interactive elements on the page
    Empty,
}

/// Sorted candidates plus the confidence band they came from.
#[derive(Debug, Clone, Serialize)]
pub struct LocateResult {
    pub confidence: MatchConfidence,
    pub candidates: Vec<CandidateElement>,
}

impl LocateResult {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn top_score(&self) -> u8 {
        self.candidates.first().map(|c| c.score).unwrap_or(0)
    }
}
