//! Condensed evaluation summary

use super::engine::OverallEvaluationResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Precision/recall/F1 without the raw counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTriple {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub error_type: ScoreTriple,
    pub description_accuracy: f64,
    pub fix_solution_accuracy: f64,
}

/// Contents of `evaluation_summary.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_files: usize,
    pub overall_metrics: OverallMetrics,
    pub error_type_breakdown: BTreeMap<String, ScoreTriple>,
}

impl EvaluationSummary {
    pub fn from_overall(overall: &OverallEvaluationResult) -> Self {
        let metrics = &overall.overall_metrics;
        Self {
            total_files: overall.total_files,
            overall_metrics: OverallMetrics {
                error_type: ScoreTriple {
                    precision: metrics.precision,
                    recall: metrics.recall,
                    f1_score: metrics.f1_score,
                },
                description_accuracy: overall.description_accuracy,
                fix_solution_accuracy: overall.fix_accuracy,
            },
            error_type_breakdown: overall
                .breakdown
                .iter()
                .map(|(category, m)| {
                    (
                        category.clone(),
                        ScoreTriple {
                            precision: m.precision,
                            recall: m.recall,
                            f1_score: m.f1_score,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Format summary as Markdown table
    pub fn to_markdown(&self) -> String {
        let error_type = &self.overall_metrics.error_type;
        let mut lines = vec![
            "## Evaluation Summary".to_string(),
            String::new(),
            format!("**Files**: {}", self.total_files),
            format!(
                "**Error type**: precision={:.2}%, recall={:.2}%, F1={:.2}%",
                error_type.precision * 100.0,
                error_type.recall * 100.0,
                error_type.f1_score * 100.0
            ),
            format!(
                "**Text similarity**: description={:.2}%, fix={:.2}%",
                self.overall_metrics.description_accuracy * 100.0,
                self.overall_metrics.fix_solution_accuracy * 100.0
            ),
        ];

        if !self.error_type_breakdown.is_empty() {
            lines.extend([
                String::new(),
                "### Per-Category Metrics".to_string(),
                String::new(),
                "| Category | Name | Precision | Recall | F1 |".to_string(),
                "|----------|------|----------:|-------:|---:|".to_string(),
            ]);

            for (category, scores) in &self.error_type_breakdown {
                lines.push(format!(
                    "| {} | {} | {:.2}% | {:.2}% | {:.2}% |",
                    category,
                    enconda_categories::get_category_name(category).unwrap_or("-"),
                    scores.precision * 100.0,
                    scores.recall * 100.0,
                    scores.f1_score * 100.0
                ));
            }
        }

        lines.join("\n")
    }
}
