//! Result-file discovery, golden-answer lookup and report persistence

use super::engine::{EvaluationEngine, FileEvaluationResult, OverallEvaluationResult};
use super::oracle::SimilarityOracle;
use super::report::EvaluationSummary;
use crate::errors::{BenchError, BenchResult};
use crate::file_utils::{read_json, write_json_pretty};
use crate::models::{GoldenAnswer, PredictedResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DETAILED_RESULTS_FILE: &str = "detailed_evaluation_results.json";
pub const SUMMARY_FILE: &str = "evaluation_summary.json";
pub const GOLDEN_FILE: &str = "README.json";

/// A result file excluded from aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct EvaluationRun {
    pub overall: OverallEvaluationResult,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub detailed: PathBuf,
    pub summary: PathBuf,
}

/// Walks a results directory and a benchmark data root.
pub struct Evaluator {
    results_dir: PathBuf,
    data_root_dir: PathBuf,
    output_dir: PathBuf,
}

impl Evaluator {
    pub fn new(
        results_dir: impl Into<PathBuf>,
        data_root_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            results_dir: results_dir.into(),
            data_root_dir: data_root_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `*.json` files one level below the results directory whose lowercase
    /// name contains "error", sorted by path. The extension match is
    /// case-sensitive.
    pub fn find_result_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.results_dir)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry in results directory");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy();
                name.ends_with(".json") && name.to_lowercase().contains("error")
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Locate `<data_root>/<repo>/<folder>/README.json` for a document.
    ///
    /// A folder qualifies when its name equals the document id, equals the id
    /// without extension, contains the extension-less id, or is contained in
    /// it. Folders are visited in sorted order; the first qualifying folder
    /// holding a golden file wins.
    pub fn find_golden_answer_file(&self, document_id: &str) -> Option<PathBuf> {
        let base_name = document_id
            .rsplit_once('.')
            .map_or(document_id, |(base, _)| base);
        if base_name.is_empty() {
            return None;
        }

        for repo_dir in sorted_subdirs(&self.data_root_dir) {
            for folder in sorted_subdirs(&repo_dir) {
                let Some(name) = folder.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };

                let is_match = name == document_id
                    || name == base_name
                    || name.contains(base_name)
                    || (!name.is_empty() && base_name.contains(name));

                if is_match {
                    let golden = folder.join(GOLDEN_FILE);
                    if golden.is_file() {
                        return Some(golden);
                    }
                }
            }
        }

        None
    }

    /// Evaluate every discovered result file.
    ///
    /// Unreadable or malformed files and files without a golden answer are
    /// skipped with a warning and reported in [`EvaluationRun::skipped`].
    pub fn evaluate<O: SimilarityOracle + ?Sized>(
        &self,
        engine: &EvaluationEngine<'_, O>,
    ) -> EvaluationRun {
        let result_files = self.find_result_files();
        tracing::info!(count = result_files.len(), "Found result files");

        let mut file_results = Vec::with_capacity(result_files.len());
        let mut skipped = Vec::new();

        for path in result_files {
            match self.evaluate_file(engine, &path) {
                Ok(result) => {
                    tracing::info!(
                        file = %path.display(),
                        predicted = result.predicted_errors_count,
                        golden = result.golden_errors_count,
                        f1 = result.category_metrics.f1_score,
                        "Evaluated result file"
                    );
                    file_results.push(result);
                }
                Err(reason) => {
                    tracing::warn!(file = %path.display(), %reason, "Skipping result file");
                    skipped.push(SkippedFile { path, reason });
                }
            }
        }

        EvaluationRun {
            overall: engine.aggregate(file_results),
            skipped,
        }
    }

    fn evaluate_file<O: SimilarityOracle + ?Sized>(
        &self,
        engine: &EvaluationEngine<'_, O>,
        path: &Path,
    ) -> Result<FileEvaluationResult, String> {
        let predicted: PredictedResult = read_json(path).map_err(|e| error_chain(&e))?;

        let golden_path = self
            .find_golden_answer_file(&predicted.document_id)
            .ok_or_else(|| format!("Golden answer not found for {:?}", predicted.document_id))?;

        let golden: GoldenAnswer = read_json(&golden_path).map_err(|e| error_chain(&e))?;

        Ok(engine.evaluate_document(&predicted, &golden))
    }

    /// Write the detailed and summary reports into the output directory.
    pub fn save_reports(&self, overall: &OverallEvaluationResult) -> BenchResult<ReportPaths> {
        fs::create_dir_all(&self.output_dir).map_err(|e| BenchError::FileWrite {
            path: self.output_dir.clone(),
            source: e,
        })?;

        let paths = ReportPaths {
            detailed: self.output_dir.join(DETAILED_RESULTS_FILE),
            summary: self.output_dir.join(SUMMARY_FILE),
        };

        write_json_pretty(&paths.detailed, overall)?;
        write_json_pretty(&paths.summary, &EvaluationSummary::from_overall(overall))?;

        Ok(paths)
    }
}

fn sorted_subdirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
