//! Error types for analysis and evaluation

use std::path::PathBuf;
use thiserror::Error;

pub type BenchResult<T> = Result<T, BenchError>;

/// Errors raised by enconda-core.
///
/// Oracle failures never surface as a `BenchError`; they are folded into a
/// negative [`SimilarityJudgment`](crate::models::SimilarityJudgment).
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to read symlink: {path}")]
    FileSymlink { path: PathBuf },

    #[error("Not a regular file: {path}")]
    FileNotRegular { path: PathBuf },

    #[error("File too large: {path} ({size} bytes, limit {limit} bytes)")]
    FileTooBig { path: PathBuf, size: u64, limit: u64 },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record in {path}")]
    MalformedRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to load config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Missing required setting: {field}")]
    MissingCredential { field: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("LLM request failed: {message}")]
    Http { message: String },

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Unexpected model output: {message}")]
    ResponseFormat { message: String },

    #[error("Agent command failed: {message}")]
    Agent { message: String },

    #[error(transparent)]
    Other(anyhow::Error),
}
