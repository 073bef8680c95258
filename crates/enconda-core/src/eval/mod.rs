//! Scoring analyzer output against golden answers
//!
//! Data flows driver → engine → matcher → oracle, then back through the
//! metrics calculator into per-file and aggregate results.

mod driver;
mod engine;
mod matcher;
mod metrics;
mod oracle;
mod report;

pub use driver::{
    DETAILED_RESULTS_FILE, EvaluationRun, Evaluator, GOLDEN_FILE, ReportPaths, SUMMARY_FILE,
    SkippedFile,
};
pub use engine::{
    ErrorEvaluation, EvaluationEngine, FileEvaluationResult, OverallEvaluationResult,
    category_breakdown,
};
pub use matcher::{
    CATEGORY_WEIGHT, DESCRIPTION_WEIGHT, ErrorMatcher, FIX_WEIGHT, MATCH_THRESHOLD,
    category_set_counts, category_sets,
};
pub use metrics::{CategoryCounts, CategoryMetrics};
pub use oracle::{
    JudgmentKind, LlmOracle, SIMILARITY_MAX_TOKENS, SIMILARITY_SYSTEM_PROMPT,
    SIMILARITY_TEMPERATURE, SimilarityOracle, build_similarity_prompt, parse_judgment,
};
pub use report::{EvaluationSummary, OverallMetrics, ScoreTriple};
