//! Greedy one-to-one matching of predicted errors to golden errors

use super::metrics::CategoryCounts;
use super::oracle::{JudgmentKind, SimilarityOracle};
use crate::models::{GoldenError, PredictedError};
use std::collections::BTreeSet;

pub const CATEGORY_WEIGHT: f64 = 0.6;
pub const DESCRIPTION_WEIGHT: f64 = 0.3;
pub const FIX_WEIGHT: f64 = 0.1;

/// A candidate must score strictly above this to be matched.
pub const MATCH_THRESHOLD: f64 = 0.5;

/// Pairs each predicted error with at most one unused golden error.
pub struct ErrorMatcher<'a, O: SimilarityOracle + ?Sized> {
    oracle: &'a O,
}

impl<'a, O: SimilarityOracle + ?Sized> ErrorMatcher<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self { oracle }
    }

    /// Match in prediction order.
    ///
    /// Each prediction takes the not-yet-used golden error with the strictly
    /// highest score above [`MATCH_THRESHOLD`]; ties go to the lower index.
    /// The output has one entry per prediction, in input order.
    pub fn match_errors<'p, 'g>(
        &self,
        predicted: &'p [PredictedError],
        golden: &'g [GoldenError],
    ) -> Vec<(&'p PredictedError, Option<&'g GoldenError>)> {
        predicted
            .iter()
            .zip(self.match_indices(predicted, golden))
            .map(|(pred, idx)| (pred, idx.map(|i| &golden[i])))
            .collect()
    }

    /// Same as [`match_errors`](Self::match_errors), as golden indices.
    pub fn match_indices(
        &self,
        predicted: &[PredictedError],
        golden: &[GoldenError],
    ) -> Vec<Option<usize>> {
        let mut used = vec![false; golden.len()];
        let mut matches = Vec::with_capacity(predicted.len());

        for pred in predicted {
            let mut best: Option<(usize, f64)> = None;

            for (idx, candidate) in golden.iter().enumerate() {
                if used[idx] {
                    continue;
                }

                let score = self.match_score(pred, candidate);
                let best_score = best.map_or(0.0, |(_, s)| s);
                if score > best_score && score > MATCH_THRESHOLD {
                    best = Some((idx, score));
                }
            }

            match best {
                Some((idx, score)) => {
                    tracing::debug!(
                        category = %pred.category,
                        golden_index = idx,
                        score,
                        "Matched predicted error"
                    );
                    used[idx] = true;
                    matches.push(Some(idx));
                }
                None => matches.push(None),
            }
        }

        matches
    }

    /// Weighted score in `[0, 1]`: exact category equality plus the
    /// confidences of similar description and fix judgments.
    pub fn match_score(&self, pred: &PredictedError, golden: &GoldenError) -> f64 {
        let mut score = 0.0;

        if pred.category == golden.category {
            score += CATEGORY_WEIGHT;
        }

        let description =
            self.oracle
                .judge(&pred.description, &golden.description, JudgmentKind::Description);
        score += DESCRIPTION_WEIGHT * description.weighted_confidence();

        let fix = self
            .oracle
            .judge(&pred.fix_text, &golden.reference_fix, JudgmentKind::Fix);
        score += FIX_WEIGHT * fix.weighted_confidence();

        score
    }
}

/// Distinct predicted and golden categories.
pub fn category_sets<'a>(
    predicted: &'a [PredictedError],
    golden: &'a [GoldenError],
) -> (BTreeSet<&'a str>, BTreeSet<&'a str>) {
    let predicted_set = predicted.iter().map(|e| e.category.as_str()).collect();
    let golden_set = golden.iter().map(|e| e.category.as_str()).collect();
    (predicted_set, golden_set)
}

/// Set-based counts: TP is the intersection, FP predicted-only, FN golden-only.
pub fn category_set_counts(predicted: &[PredictedError], golden: &[GoldenError]) -> CategoryCounts {
    let (predicted_set, golden_set) = category_sets(predicted, golden);
    CategoryCounts::new(
        predicted_set.intersection(&golden_set).count(),
        predicted_set.difference(&golden_set).count(),
        golden_set.difference(&predicted_set).count(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SimilarityJudgment;
    use std::cell::Cell;

    /// Similar whenever the two texts are equal.
    struct EqualityOracle {
        calls: Cell<usize>,
    }

    impl EqualityOracle {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl SimilarityOracle for EqualityOracle {
        fn judge(&self, a: &str, b: &str, _kind: JudgmentKind) -> SimilarityJudgment {
            self.calls.set(self.calls.get() + 1);
            if a == b {
                SimilarityJudgment::new(true, 1.0, "equal")
            } else {
                SimilarityJudgment::failure("different")
            }
        }
    }

    fn pred(category: &str, description: &str, fix: &str) -> PredictedError {
        PredictedError::new(category, description, fix)
    }

    fn gold(category: &str, description: &str, fix: &str) -> GoldenError {
        GoldenError::new(category, description, fix)
    }

    #[test]
    fn test_score_components() {
        let oracle = EqualityOracle::new();
        let matcher = ErrorMatcher::new(&oracle);

        let score = matcher.match_score(&pred("E1", "d", "f"), &gold("E1", "d", "f"));
        assert!((score - 1.0).abs() < 1e-10);

        let score = matcher.match_score(&pred("E1", "d", "x"), &gold("E2", "d", "f"));
        assert!((score - 0.3).abs() < 1e-10);

        let score = matcher.match_score(&pred("E1", "a", "b"), &gold("E2", "c", "d"));
        assert_eq!(score, 0.0);
        assert_eq!(oracle.calls.get(), 6);
    }

    #[test]
    fn test_category_only_match_exceeds_threshold() {
        let oracle = EqualityOracle::new();
        let matcher = ErrorMatcher::new(&oracle);
        let predicted = vec![pred("E4", "missing config", "touch config")];
        let golden = vec![gold("E4", "no such file", "create it")];

        let matches = matcher.match_errors(&predicted, &golden);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].1, Some(&golden[0]));
    }

    #[test]
    fn test_description_only_does_not_match() {
        let oracle = EqualityOracle::new();
        let matcher = ErrorMatcher::new(&oracle);
        // 0.3 + 0.1 stays below the threshold
        let predicted = vec![pred("E1", "same", "same fix")];
        let golden = vec![gold("E2", "same", "same fix")];

        let matches = matcher.match_errors(&predicted, &golden);
        assert!(matches[0].1.is_none());
    }

    #[test]
    fn test_best_candidate_wins() {
        let oracle = EqualityOracle::new();
        let matcher = ErrorMatcher::new(&oracle);
        let predicted = vec![pred("E1", "pip fails", "pin numpy")];
        let golden = vec![
            gold("E1", "something else", "other"),
            gold("E1", "pip fails", "pin numpy"),
        ];

        let matches = matcher.match_errors(&predicted, &golden);
        assert_eq!(matches[0].1, Some(&golden[1]));
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let oracle = EqualityOracle::new();
        let matcher = ErrorMatcher::new(&oracle);
        let predicted = vec![pred("E7", "a", "b")];
        let golden = vec![gold("E7", "x", "y"), gold("E7", "z", "w")];

        let matches = matcher.match_errors(&predicted, &golden);
        assert_eq!(matches[0].1, Some(&golden[0]));
    }

    #[test]
    fn test_golden_used_at_most_once() {
        let oracle = EqualityOracle::new();
        let matcher = ErrorMatcher::new(&oracle);
        let predicted = vec![pred("E2", "a", "b"), pred("E2", "a", "b")];
        let golden = vec![gold("E2", "a", "b")];

        let matches = matcher.match_errors(&predicted, &golden);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].1, Some(&golden[0]));
        assert!(matches[1].1.is_none());
    }

    #[test]
    fn test_no_golden_errors() {
        let oracle = EqualityOracle::new();
        let matcher = ErrorMatcher::new(&oracle);
        let predicted = vec![pred("E2", "a", "b")];

        let matches = matcher.match_errors(&predicted, &[]);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].1.is_none());
        assert_eq!(oracle.calls.get(), 0);
    }

    #[test]
    fn test_category_set_counts() {
        let predicted = vec![pred("E1", "", ""), pred("E1", "", ""), pred("E2", "", "")];
        let golden = vec![gold("E1", "", ""), gold("E7", "", "")];

        let counts = category_set_counts(&predicted, &golden);
        assert_eq!(counts, CategoryCounts::new(1, 1, 1));
    }

    #[test]
    fn test_category_sets_are_case_sensitive() {
        let predicted = vec![pred("e1", "", "")];
        let golden = vec![gold("E1", "", "")];

        let (p, g) = category_sets(&predicted, &golden);
        assert!(p.contains("e1"));
        assert!(g.contains("E1"));
        assert_eq!(category_set_counts(&predicted, &golden), CategoryCounts::new(0, 1, 1));
    }
}
