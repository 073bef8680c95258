//! # enconda-core
//!
//! Detection and evaluation engine for README environment-setup errors.
//!
//! Two pipelines share the data model in [`models`]:
//! - [`inference`] asks an LLM or an external agent to find setup errors in
//!   benchmark READMEs and writes `*_errors.json` result files
//! - [`eval`] matches those results against human golden answers with a
//!   similarity oracle and reports precision, recall and accuracy

mod regex_util;

pub mod config;
pub mod errors;
pub mod eval;
pub mod file_utils;
pub mod inference;
pub mod llm;
pub mod models;

pub use config::{BenchConfig, BreakdownMode, ConfigOverrides};
pub use errors::{BenchError, BenchResult};
pub use llm::{Completion, OpenAiClient, TextGenerator, TokenUsage};
pub use models::{GoldenAnswer, GoldenError, PredictedError, PredictedResult, SimilarityJudgment};
