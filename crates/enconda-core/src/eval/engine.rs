//! Per-document evaluation and aggregation across documents

use super::matcher::{ErrorMatcher, category_set_counts};
use super::metrics::{CategoryCounts, CategoryMetrics};
use super::oracle::{JudgmentKind, SimilarityOracle};
use crate::config::BreakdownMode;
use crate::models::{GoldenAnswer, GoldenError, PredictedError, PredictedResult, SimilarityJudgment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome for one predicted error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvaluation {
    pub predicted_error: PredictedError,
    pub matched_golden_error: Option<GoldenError>,
    #[serde(rename = "error_type_correct")]
    pub category_correct: bool,
    #[serde(rename = "description_similar")]
    pub description_similarity: Option<SimilarityJudgment>,
    #[serde(rename = "golden_answer_similar")]
    pub fix_similarity: Option<SimilarityJudgment>,
}

impl ErrorEvaluation {
    pub fn is_matched(&self) -> bool {
        self.matched_golden_error.is_some()
    }
}

/// Evaluation of one result file against its golden answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEvaluationResult {
    #[serde(rename = "readme_name")]
    pub document_id: String,
    #[serde(rename = "repo_name")]
    pub repo_id: String,
    pub golden_errors_count: usize,
    pub predicted_errors_count: usize,
    pub error_evaluations: Vec<ErrorEvaluation>,
    #[serde(rename = "error_type_metrics")]
    pub category_metrics: CategoryMetrics,
    pub description_accuracy: f64,
    #[serde(rename = "golden_answer_accuracy")]
    pub fix_accuracy: f64,
    /// Golden errors no prediction was paired with
    #[serde(default)]
    pub missed_golden_errors: Vec<GoldenError>,
}

/// Aggregate over every evaluated file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallEvaluationResult {
    pub total_files: usize,
    #[serde(rename = "overall_error_type_metrics")]
    pub overall_metrics: CategoryMetrics,
    #[serde(rename = "overall_description_accuracy")]
    pub description_accuracy: f64,
    #[serde(rename = "overall_golden_answer_accuracy")]
    pub fix_accuracy: f64,
    pub per_file_results: Vec<FileEvaluationResult>,
    #[serde(rename = "error_type_breakdown")]
    pub breakdown: BTreeMap<String, CategoryMetrics>,
}

/// Scores predicted results against golden answers using a similarity oracle.
pub struct EvaluationEngine<'a, O: SimilarityOracle + ?Sized> {
    oracle: &'a O,
    breakdown: BreakdownMode,
}

impl<'a, O: SimilarityOracle + ?Sized> EvaluationEngine<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            breakdown: BreakdownMode::default(),
        }
    }

    pub fn with_breakdown(mut self, breakdown: BreakdownMode) -> Self {
        self.breakdown = breakdown;
        self
    }

    pub fn evaluate_document(
        &self,
        predicted: &PredictedResult,
        golden: &GoldenAnswer,
    ) -> FileEvaluationResult {
        let matcher = ErrorMatcher::new(self.oracle);
        let indices = matcher.match_indices(&predicted.errors, &golden.errors);

        let mut used = vec![false; golden.errors.len()];
        let mut error_evaluations = Vec::with_capacity(indices.len());

        for (pred, matched) in predicted.errors.iter().zip(indices) {
            if let Some(idx) = matched {
                used[idx] = true;
            }
            error_evaluations.push(self.evaluate_error(pred, matched.map(|idx| &golden.errors[idx])));
        }

        let missed_golden_errors = golden
            .errors
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(g, _)| g.clone())
            .collect();

        let category_metrics =
            CategoryMetrics::from_counts(category_set_counts(&predicted.errors, &golden.errors));

        let description_accuracy =
            matched_accuracy(&error_evaluations, |e| e.description_similarity.as_ref());
        let fix_accuracy = matched_accuracy(&error_evaluations, |e| e.fix_similarity.as_ref());

        FileEvaluationResult {
            document_id: predicted.document_id.clone(),
            repo_id: predicted.repo_id.clone(),
            golden_errors_count: golden.errors.len(),
            predicted_errors_count: predicted.errors.len(),
            error_evaluations,
            category_metrics,
            description_accuracy,
            fix_accuracy,
            missed_golden_errors,
        }
    }

    /// Unmatched predictions get no oracle calls; matched ones get exactly two.
    fn evaluate_error(&self, pred: &PredictedError, matched: Option<&GoldenError>) -> ErrorEvaluation {
        let Some(golden) = matched else {
            return ErrorEvaluation {
                predicted_error: pred.clone(),
                matched_golden_error: None,
                category_correct: false,
                description_similarity: None,
                fix_similarity: None,
            };
        };

        let description_similarity =
            self.oracle
                .judge(&pred.description, &golden.description, JudgmentKind::Description);
        let fix_similarity = self
            .oracle
            .judge(&pred.fix_text, &golden.reference_fix, JudgmentKind::Fix);

        ErrorEvaluation {
            predicted_error: pred.clone(),
            matched_golden_error: Some(golden.clone()),
            category_correct: pred.category == golden.category,
            description_similarity: Some(description_similarity),
            fix_similarity: Some(fix_similarity),
        }
    }

    /// Combine per-file results.
    ///
    /// Overall metrics come from summed counts, accuracies are an unweighted
    /// mean over files. An empty input yields a zero-valued result.
    pub fn aggregate(&self, results: Vec<FileEvaluationResult>) -> OverallEvaluationResult {
        if results.is_empty() {
            return OverallEvaluationResult::default();
        }

        let mut totals = CategoryCounts::default();
        for result in &results {
            totals += result.category_metrics.counts();
        }

        let file_count = results.len() as f64;
        let description_accuracy =
            results.iter().map(|r| r.description_accuracy).sum::<f64>() / file_count;
        let fix_accuracy = results.iter().map(|r| r.fix_accuracy).sum::<f64>() / file_count;

        let breakdown = category_breakdown(&results, self.breakdown);

        OverallEvaluationResult {
            total_files: results.len(),
            overall_metrics: CategoryMetrics::from_counts(totals),
            description_accuracy,
            fix_accuracy,
            per_file_results: results,
            breakdown,
        }
    }
}

/// Per-category metrics keyed by category code.
///
/// Every evaluation counts toward its predicted category: a category-correct
/// match is a TP, anything else an FP. In [`BreakdownMode::IncludeGoldenMisses`]
/// each golden error left unmatched, or matched by a prediction of another
/// category, adds one FN to the golden category.
pub fn category_breakdown(
    results: &[FileEvaluationResult],
    mode: BreakdownMode,
) -> BTreeMap<String, CategoryMetrics> {
    let mut counts: BTreeMap<String, CategoryCounts> = BTreeMap::new();

    for result in results {
        for evaluation in &result.error_evaluations {
            let entry = counts
                .entry(evaluation.predicted_error.category.clone())
                .or_default();
            if evaluation.is_matched() && evaluation.category_correct {
                entry.true_positives += 1;
            } else {
                entry.false_positives += 1;
            }
        }

        if mode == BreakdownMode::IncludeGoldenMisses {
            let miscategorized = result
                .error_evaluations
                .iter()
                .filter(|e| !e.category_correct)
                .filter_map(|e| e.matched_golden_error.as_ref());

            for golden in result.missed_golden_errors.iter().chain(miscategorized) {
                counts.entry(golden.category.clone()).or_default().false_negatives += 1;
            }
        }
    }

    counts
        .into_iter()
        .map(|(category, c)| (category, CategoryMetrics::from_counts(c)))
        .collect()
}

/// Share of matched evaluations whose judgment is similar; 0.0 with no matches.
fn matched_accuracy<F>(evaluations: &[ErrorEvaluation], judgment: F) -> f64
where
    F: Fn(&ErrorEvaluation) -> Option<&SimilarityJudgment>,
{
    let mut matched = 0usize;
    let mut similar = 0usize;
    for evaluation in evaluations.iter().filter(|e| e.is_matched()) {
        matched += 1;
        if judgment(evaluation).is_some_and(|j| j.is_similar) {
            similar += 1;
        }
    }

    if matched == 0 {
        0.0
    } else {
        similar as f64 / matched as f64
    }
}
