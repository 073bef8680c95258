//! Property-based tests for matching, metrics and aggregation
//!
//! Oracles here are deterministic stand-ins so every property holds without
//! network access.

use enconda_core::eval::{
    CategoryMetrics, ErrorMatcher, EvaluationEngine, JudgmentKind, MATCH_THRESHOLD,
    SimilarityOracle, category_set_counts, category_sets, parse_judgment,
};
use enconda_core::{
    BreakdownMode, GoldenAnswer, GoldenError, PredictedError, PredictedResult, SimilarityJudgment,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

/// Similar with full confidence exactly when the texts are equal.
struct EqualityOracle;

impl SimilarityOracle for EqualityOracle {
    fn judge(&self, text_a: &str, text_b: &str, _kind: JudgmentKind) -> SimilarityJudgment {
        if text_a == text_b {
            SimilarityJudgment::new(true, 1.0, "equal")
        } else {
            SimilarityJudgment::new(false, 0.0, "different")
        }
    }
}

/// Returns the same judgment for every pair.
struct ConstantOracle(SimilarityJudgment);

impl SimilarityOracle for ConstantOracle {
    fn judge(&self, _text_a: &str, _text_b: &str, _kind: JudgmentKind) -> SimilarityJudgment {
        self.0.clone()
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn category_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["E1", "E2", "E4", "E6", "E7", "E8"]).prop_map(str::to_string)
}

fn predicted_strategy() -> impl Strategy<Value = PredictedError> {
    (category_strategy(), "[ab]{1,2}", "[ab]{1,2}")
        .prop_map(|(category, description, fix)| PredictedError::new(category, description, fix))
}

fn golden_strategy() -> impl Strategy<Value = GoldenError> {
    (category_strategy(), "[ab]{1,2}", "[ab]{1,2}")
        .prop_map(|(category, description, fix)| GoldenError::new(category, description, fix))
}

fn document_strategy() -> impl Strategy<Value = (PredictedResult, GoldenAnswer)> {
    (
        prop::collection::vec(predicted_strategy(), 0..6),
        prop::collection::vec(golden_strategy(), 0..6),
    )
        .prop_map(|(predicted, golden)| {
            (
                PredictedResult {
                    repo_id: "repo".to_string(),
                    document_id: "README_1".to_string(),
                    errors: predicted,
                    ..PredictedResult::default()
                },
                GoldenAnswer {
                    document_id: "README_1".to_string(),
                    errors: golden,
                },
            )
        })
}

fn breakdown_for(
    engine: &EvaluationEngine<'_, EqualityOracle>,
    documents: &[(PredictedResult, GoldenAnswer)],
) -> BTreeMap<String, CategoryMetrics> {
    let results = documents
        .iter()
        .map(|(predicted, golden)| engine.evaluate_document(predicted, golden))
        .collect();
    engine.aggregate(results).breakdown
}

fn assert_unit_interval(value: f64) -> Result<(), TestCaseError> {
    prop_assert!((-1e-12..=1.0 + 1e-12).contains(&value), "{} outside [0, 1]", value);
    Ok(())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    // Property: match scores stay in [0, 1] whatever the oracle says
    #[test]
    fn test_match_score_bounded(
        pred in predicted_strategy(),
        golden in golden_strategy(),
        is_similar in any::<bool>(),
        confidence in -2.0f64..3.0,
    ) {
        let oracle = ConstantOracle(SimilarityJudgment::new(is_similar, confidence, "fixed"));
        let score = ErrorMatcher::new(&oracle).match_score(&pred, &golden);
        assert_unit_interval(score)?;
    }

    // Property: each golden error is matched at most once, above threshold
    #[test]
    fn test_matching_is_injective(
        predicted in prop::collection::vec(predicted_strategy(), 0..8),
        golden in prop::collection::vec(golden_strategy(), 0..8),
    ) {
        let matcher = ErrorMatcher::new(&EqualityOracle);
        let indices = matcher.match_indices(&predicted, &golden);
        prop_assert_eq!(indices.len(), predicted.len());

        let mut seen = HashSet::new();
        for (pred, idx) in predicted.iter().zip(&indices) {
            if let Some(idx) = idx {
                prop_assert!(seen.insert(*idx), "golden index {} matched twice", idx);
                prop_assert!(matcher.match_score(pred, &golden[*idx]) > MATCH_THRESHOLD);
            }
        }
    }

    // Property: derived metrics are ratios in [0, 1] and F1 never exceeds both inputs
    #[test]
    fn test_metrics_bounded(tp in 0usize..50, fp in 0usize..50, fn_count in 0usize..50) {
        let metrics = CategoryMetrics::derive(tp, fp, fn_count);
        assert_unit_interval(metrics.precision)?;
        assert_unit_interval(metrics.recall)?;
        assert_unit_interval(metrics.f1_score)?;
        prop_assert!(metrics.f1_score <= metrics.precision.max(metrics.recall) + 1e-12);
    }

    // Property: per-file results are consistent with their inputs
    #[test]
    fn test_document_evaluation_consistent((predicted, golden) in document_strategy()) {
        let engine = EvaluationEngine::new(&EqualityOracle);
        let result = engine.evaluate_document(&predicted, &golden);

        prop_assert_eq!(result.predicted_errors_count, predicted.errors.len());
        prop_assert_eq!(result.golden_errors_count, golden.errors.len());
        prop_assert_eq!(result.error_evaluations.len(), predicted.errors.len());

        let matched = result.error_evaluations.iter().filter(|e| e.is_matched()).count();
        prop_assert_eq!(matched + result.missed_golden_errors.len(), golden.errors.len());

        for evaluation in &result.error_evaluations {
            prop_assert_eq!(evaluation.is_matched(), evaluation.description_similarity.is_some());
            prop_assert_eq!(evaluation.is_matched(), evaluation.fix_similarity.is_some());
        }

        assert_unit_interval(result.description_accuracy)?;
        assert_unit_interval(result.fix_accuracy)?;
    }

    // Property: per-file category counts partition the predicted and golden
    // category sets
    #[test]
    fn test_category_counts_cover_category_sets((predicted, golden) in document_strategy()) {
        let (predicted_set, golden_set) = category_sets(&predicted.errors, &golden.errors);
        let counts = category_set_counts(&predicted.errors, &golden.errors);

        prop_assert_eq!(counts.true_positives + counts.false_positives, predicted_set.len());
        prop_assert_eq!(counts.true_positives + counts.false_negatives, golden_set.len());
        prop_assert_eq!(
            counts.true_positives,
            predicted_set.intersection(&golden_set).count()
        );

        let result = EvaluationEngine::new(&EqualityOracle).evaluate_document(&predicted, &golden);
        prop_assert_eq!(result.category_metrics.counts(), counts);
    }

    // Property: overall counts are the sum of per-file counts and the
    // breakdown sees every predicted error exactly once
    #[test]
    fn test_aggregate_sums_counts(documents in prop::collection::vec(document_strategy(), 0..5)) {
        let engine = EvaluationEngine::new(&EqualityOracle);
        let results: Vec<_> = documents
            .iter()
            .map(|(predicted, golden)| engine.evaluate_document(predicted, golden))
            .collect();

        let tp: usize = results.iter().map(|r| r.category_metrics.true_positives).sum();
        let fp: usize = results.iter().map(|r| r.category_metrics.false_positives).sum();
        let fn_count: usize = results.iter().map(|r| r.category_metrics.false_negatives).sum();
        let predicted_total: usize = results.iter().map(|r| r.predicted_errors_count).sum();

        let overall = engine.aggregate(results);
        prop_assert_eq!(overall.total_files, documents.len());
        prop_assert_eq!(overall.overall_metrics.true_positives, tp);
        prop_assert_eq!(overall.overall_metrics.false_positives, fp);
        prop_assert_eq!(overall.overall_metrics.false_negatives, fn_count);

        let breakdown_total: usize = overall
            .breakdown
            .values()
            .map(|m| m.true_positives + m.false_positives)
            .sum();
        prop_assert_eq!(breakdown_total, predicted_total);
        for metrics in overall.breakdown.values() {
            prop_assert_eq!(metrics.false_negatives, 0);
        }
    }

    // Property: golden misses only ever add false negatives
    #[test]
    fn test_golden_miss_breakdown_only_adds_false_negatives(
        documents in prop::collection::vec(document_strategy(), 1..4),
    ) {
        let plain = EvaluationEngine::new(&EqualityOracle);
        let with_misses =
            EvaluationEngine::new(&EqualityOracle).with_breakdown(BreakdownMode::IncludeGoldenMisses);

        let base = breakdown_for(&plain, &documents);
        let extended = breakdown_for(&with_misses, &documents);

        for (category, metrics) in &base {
            let other = &extended[category];
            prop_assert_eq!(metrics.true_positives, other.true_positives);
            prop_assert_eq!(metrics.false_positives, other.false_positives);
        }
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_metrics_zero_counts() {
    let metrics = CategoryMetrics::derive(0, 0, 0);
    assert_eq!(metrics.precision, 0.0);
    assert_eq!(metrics.recall, 0.0);
    assert_eq!(metrics.f1_score, 0.0);
}

#[test]
fn test_metrics_two_one_one() {
    let metrics = CategoryMetrics::derive(2, 1, 1);
    assert!((metrics.precision - 2.0 / 3.0).abs() < 1e-12);
    assert!((metrics.recall - 2.0 / 3.0).abs() < 1e-12);
    assert!((metrics.f1_score - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_same_category_confident_oracle_scores_096() {
    let oracle = ConstantOracle(SimilarityJudgment::new(true, 0.9, "close"));
    let pred = PredictedError::new("E1", "numpy missing", "pip install numpy");
    let golden = GoldenError::new("E1", "numpy not installed", "install numpy");

    let score = ErrorMatcher::new(&oracle).match_score(&pred, &golden);
    assert!((score - 0.96).abs() < 1e-9, "score was {}", score);
}

#[test]
fn test_unmatched_prediction_without_golden_errors() {
    let engine = EvaluationEngine::new(&EqualityOracle);
    let predicted = PredictedResult {
        document_id: "README_1".to_string(),
        errors: vec![PredictedError::new("E2", "typo in command", "fix typo")],
        ..PredictedResult::default()
    };

    let result = engine.evaluate_document(&predicted, &GoldenAnswer::default());
    assert_eq!(result.category_metrics.true_positives, 0);
    assert_eq!(result.category_metrics.false_positives, 1);
    assert_eq!(result.category_metrics.false_negatives, 0);
    assert_eq!(result.description_accuracy, 0.0);
    assert!(!result.error_evaluations[0].is_matched());
}

#[test]
fn test_empty_aggregate() {
    let engine = EvaluationEngine::new(&EqualityOracle);
    let overall = engine.aggregate(Vec::new());

    assert_eq!(overall.total_files, 0);
    assert_eq!(overall.overall_metrics.f1_score, 0.0);
    assert_eq!(overall.description_accuracy, 0.0);
    assert!(overall.breakdown.is_empty());
}

#[test]
fn test_two_file_aggregate_means_accuracies() {
    let engine = EvaluationEngine::new(&EqualityOracle);

    let hit = PredictedResult {
        document_id: "README_1".to_string(),
        errors: vec![PredictedError::new("E1", "a", "b")],
        ..PredictedResult::default()
    };
    let hit_golden = GoldenAnswer {
        document_id: "README_1".to_string(),
        errors: vec![GoldenError::new("E1", "a", "b")],
    };

    let miss = PredictedResult {
        document_id: "README_2".to_string(),
        errors: vec![PredictedError::new("E4", "x", "y")],
        ..PredictedResult::default()
    };
    let miss_golden = GoldenAnswer {
        document_id: "README_2".to_string(),
        errors: vec![GoldenError::new("E4", "other", "thing")],
    };

    let results = vec![
        engine.evaluate_document(&hit, &hit_golden),
        engine.evaluate_document(&miss, &miss_golden),
    ];
    let overall = engine.aggregate(results);

    assert_eq!(overall.total_files, 2);
    assert_eq!(overall.overall_metrics.true_positives, 2);
    // Second file matches on category alone (0.6) but neither text is similar
    assert!((overall.description_accuracy - 0.5).abs() < 1e-12);
    assert!((overall.fix_accuracy - 0.5).abs() < 1e-12);
    assert_eq!(overall.breakdown["E1"].true_positives, 1);
    assert_eq!(overall.breakdown["E4"].true_positives, 1);
}

#[test]
fn test_braceless_similar_reply() {
    let judgment = parse_judgment("These two descriptions are similar.");
    assert!(judgment.is_similar);
    assert_eq!(judgment.confidence, 0.5);
}
