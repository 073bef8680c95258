//! Precision, recall and F1 from TP/FP/FN counts

use serde::{Deserialize, Serialize};

/// Raw true/false positive/negative counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl CategoryCounts {
    pub fn new(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        Self {
            true_positives,
            false_positives,
            false_negatives,
        }
    }
}

impl std::ops::AddAssign for CategoryCounts {
    fn add_assign(&mut self, other: Self) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }
}

/// Metrics for one category (or the whole run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1")]
    pub f1_score: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl CategoryMetrics {
    /// Derive ratios from counts.
    ///
    /// Every ratio with a zero denominator is 0.0.
    pub fn derive(tp: usize, fp: usize, fn_count: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_count);
        let denom = precision + recall;
        let f1_score = if denom == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / denom
        };

        Self {
            precision,
            recall,
            f1_score,
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_count,
        }
    }

    pub fn from_counts(counts: CategoryCounts) -> Self {
        Self::derive(
            counts.true_positives,
            counts.false_positives,
            counts.false_negatives,
        )
    }

    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts::new(
            self.true_positives,
            self.false_positives,
            self.false_negatives,
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
