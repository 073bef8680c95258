//! Result files, processing log and summary report for analysis runs
//!
//! ```text
//! output_dir/
//! ├── results/<repo>/<readme>_errors.json
//! ├── results/<repo>/<readme>_setup.sh
//! ├── processing_records.jsonl
//! └── summary_report.json
//! ```

use super::types::{AnalysisResult, ProcessingRecord, now_timestamp};
use crate::errors::{BenchError, BenchResult};
use crate::file_utils::{write_json_pretty, write_text};
use crate::llm::TokenUsage;
use crate::models::PredictedError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const RESULTS_DIR: &str = "results";
pub const RECORDS_FILE: &str = "processing_records.jsonl";
pub const SUMMARY_REPORT_FILE: &str = "summary_report.json";

/// Script written when an analyzer produced none.
const EMPTY_SCRIPT: &str = "#!/bin/bash\necho 'No setup script generated'";

/// On-disk form of `<readme>_errors.json`; loads as a `PredictedResult`.
#[derive(Debug, Serialize)]
struct ErrorsFile<'a> {
    repo_name: &'a str,
    readme_name: &'a str,
    errors: &'a [PredictedError],
    shell_script: &'a str,
    raw_output: &'a str,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_usage: Option<TokenUsage>,
}

/// Paths written for one analyzed README.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedResult {
    pub errors_path: PathBuf,
    pub script_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub summary: RunTotals,
    pub token_statistics: TokenStatistics,
    pub error_type_distribution: BTreeMap<String, usize>,
    pub failed_repositories: Vec<FailedRepository>,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub total_repositories: usize,
    pub successful_processing: usize,
    pub failed_processing: usize,
    pub total_errors_found: usize,
    /// Percentage with two decimals, e.g. `"66.67%"`
    pub success_rate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenStatistics {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub average_input_tokens: f64,
    pub average_output_tokens: f64,
    pub average_total_tokens: f64,
    pub repositories_with_token_data: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRepository {
    pub repo_name: String,
    pub error_message: String,
}

pub struct OutputManager {
    output_dir: PathBuf,
}

impl OutputManager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn results_dir(&self) -> PathBuf {
        self.output_dir.join(RESULTS_DIR)
    }

    pub fn errors_path(&self, repo_name: &str, readme_name: &str) -> PathBuf {
        self.results_dir()
            .join(repo_name)
            .join(format!("{}_errors.json", readme_name))
    }

    pub fn script_path(&self, repo_name: &str, readme_name: &str) -> PathBuf {
        self.results_dir()
            .join(repo_name)
            .join(format!("{}_setup.sh", readme_name))
    }

    pub fn records_path(&self) -> PathBuf {
        self.output_dir.join(RECORDS_FILE)
    }

    /// Write the errors file and the executable setup script.
    pub fn save_result(
        &self,
        repo_name: &str,
        readme_name: &str,
        result: &AnalysisResult,
    ) -> BenchResult<SavedResult> {
        let errors_path = self.errors_path(repo_name, readme_name);
        let file = ErrorsFile {
            repo_name,
            readme_name,
            errors: &result.errors,
            shell_script: &result.shell_script,
            raw_output: &result.raw_output,
            timestamp: now_timestamp(),
            token_usage: result.token_usage,
        };
        write_json_pretty(&errors_path, &file)?;

        let script_path = self.script_path(repo_name, readme_name);
        let script = if result.shell_script.trim().is_empty() {
            EMPTY_SCRIPT
        } else {
            result.shell_script.as_str()
        };
        write_text(&script_path, script)?;
        make_executable(&script_path)?;

        tracing::info!(
            repo = repo_name,
            readme = readme_name,
            errors = result.errors.len(),
            "Saved analysis result"
        );

        Ok(SavedResult {
            errors_path,
            script_path,
        })
    }

    /// Append one JSON line to `processing_records.jsonl`.
    pub fn append_record(&self, record: &ProcessingRecord) -> BenchResult<()> {
        let path = self.records_path();
        let line = serde_json::to_string(record).map_err(|e| BenchError::Other(e.into()))?;

        std::fs::create_dir_all(&self.output_dir).map_err(|e| BenchError::FileWrite {
            path: self.output_dir.clone(),
            source: e,
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| BenchError::FileWrite {
                path: path.clone(),
                source: e,
            })?;
        writeln!(file, "{}", line).map_err(|e| BenchError::FileWrite { path, source: e })
    }

    pub fn write_summary(&self, records: &[ProcessingRecord]) -> BenchResult<SummaryReport> {
        let report = build_summary(records);
        write_json_pretty(&self.output_dir.join(SUMMARY_REPORT_FILE), &report)?;
        Ok(report)
    }
}

pub fn build_summary(records: &[ProcessingRecord]) -> SummaryReport {
    let total = records.len();
    let successful: Vec<&ProcessingRecord> = records.iter().filter(|r| r.success).collect();

    let mut distribution = BTreeMap::new();
    for error in successful.iter().flat_map(|r| &r.errors_detected) {
        *distribution.entry(error.category.clone()).or_insert(0) += 1;
    }

    let failed_repositories = records
        .iter()
        .filter(|r| !r.success)
        .map(|r| FailedRepository {
            repo_name: r.repo_name.clone(),
            error_message: r
                .error_message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string()),
        })
        .collect();

    let success_rate = if total == 0 {
        0.0
    } else {
        successful.len() as f64 / total as f64 * 100.0
    };

    SummaryReport {
        summary: RunTotals {
            total_repositories: total,
            successful_processing: successful.len(),
            failed_processing: total - successful.len(),
            total_errors_found: successful.iter().map(|r| r.errors_detected.len()).sum(),
            success_rate: format!("{:.2}%", success_rate),
        },
        token_statistics: token_statistics(&successful),
        error_type_distribution: distribution,
        failed_repositories,
        generated_at: now_timestamp(),
    }
}

fn token_statistics(records: &[&ProcessingRecord]) -> TokenStatistics {
    let usages: Vec<TokenUsage> = records.iter().filter_map(|r| r.token_usage).collect();
    if usages.is_empty() {
        return TokenStatistics::default();
    }

    let input: u64 = usages.iter().map(|u| u.prompt_tokens).sum();
    let output: u64 = usages.iter().map(|u| u.completion_tokens).sum();
    let total: u64 = usages.iter().map(|u| u.total_tokens).sum();
    let count = usages.len() as f64;

    TokenStatistics {
        total_input_tokens: input,
        total_output_tokens: output,
        total_tokens: total,
        average_input_tokens: round2(input as f64 / count),
        average_output_tokens: round2(output as f64 / count),
        average_total_tokens: round2(total as f64 / count),
        repositories_with_token_data: usages.len(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(unix)]
fn make_executable(path: &Path) -> BenchResult<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
        BenchError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> BenchResult<()> {
    Ok(())
}
