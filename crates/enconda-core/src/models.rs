//! Input records and oracle judgments
//!
//! Field names follow the on-disk JSON format produced by the analyzers and
//! by the golden-answer authoring tools, so the Rust names are mapped with
//! `serde(rename)`.

use serde::{Deserialize, Serialize};

/// A reference error written by a human annotator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenError {
    #[serde(rename = "error_type")]
    pub category: String,
    #[serde(rename = "error_description")]
    pub description: String,
    #[serde(rename = "golden_answer")]
    pub reference_fix: String,
}

impl GoldenError {
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        reference_fix: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            reference_fix: reference_fix.into(),
        }
    }
}

/// The `README.json` ground truth for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenAnswer {
    #[serde(rename = "readme_name", default)]
    pub document_id: String,
    #[serde(default)]
    pub errors: Vec<GoldenError>,
}

/// An error reported by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictedError {
    #[serde(rename = "error_type")]
    pub category: String,
    #[serde(rename = "error_description")]
    pub description: String,
    #[serde(rename = "fix_answer")]
    pub fix_text: String,
}

impl PredictedError {
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        fix_text: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            fix_text: fix_text.into(),
        }
    }
}

/// One `*_errors.json` result file.
///
/// Top-level fields default to empty so partially written files still load;
/// every field of an individual error is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictedResult {
    #[serde(rename = "repo_name", default)]
    pub repo_id: String,
    #[serde(rename = "readme_name", default)]
    pub document_id: String,
    #[serde(default)]
    pub errors: Vec<PredictedError>,
    #[serde(rename = "shell_script", default, skip_serializing_if = "Option::is_none")]
    pub generated_script: Option<String>,
    #[serde(rename = "raw_output", default)]
    pub raw_text: String,
}

/// Verdict returned by a similarity oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityJudgment {
    pub is_similar: bool,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub reason: String,
}

impl SimilarityJudgment {
    pub fn new(is_similar: bool, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            is_similar,
            confidence: clamp_confidence(confidence),
            reason: reason.into(),
        }
    }

    /// Negative judgment used whenever the oracle could not produce a verdict.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            is_similar: false,
            confidence: 0.0,
            reason: reason.into(),
        }
    }

    /// Confidence counted toward a match score: zero unless the texts are similar.
    pub fn weighted_confidence(&self) -> f64 {
        if self.is_similar {
            self.confidence
        } else {
            0.0
        }
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
