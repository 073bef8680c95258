//! Batch analysis over every README folder of a benchmark

use super::analyzer::ReadmeAnalyzer;
use super::dataset::{ReadmeDataset, ReadmeFolder, sample_evenly};
use super::output::{OutputManager, SummaryReport};
use super::types::{ProcessingRecord, now_timestamp};
use crate::errors::BenchResult;

/// Records and summary of one batch run.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub records: Vec<ProcessingRecord>,
    /// Folders left alone because their errors file already existed
    pub skipped: usize,
    pub summary: SummaryReport,
}

pub struct BatchProcessor<'a, A: ReadmeAnalyzer + ?Sized> {
    analyzer: &'a A,
    dataset: ReadmeDataset,
    output: OutputManager,
    sample_size: Option<usize>,
    skip_existing: bool,
}

impl<'a, A: ReadmeAnalyzer + ?Sized> BatchProcessor<'a, A> {
    pub fn new(analyzer: &'a A, dataset: ReadmeDataset, output: OutputManager) -> Self {
        Self {
            analyzer,
            dataset,
            output,
            sample_size: None,
            skip_existing: true,
        }
    }

    pub fn with_sample_size(mut self, sample_size: Option<usize>) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    /// Folders that a run would process, after sampling.
    pub fn planned_folders(&self) -> Vec<ReadmeFolder> {
        let folders = self.dataset.readme_folders();
        match self.sample_size {
            Some(n) => {
                let sampled = sample_evenly(&folders, n);
                tracing::info!(sampled = sampled.len(), total = folders.len(), "Sampled README folders");
                sampled
            }
            None => folders,
        }
    }

    /// Analyze every planned folder; per-folder failures become unsuccessful records.
    pub fn run(&self) -> BenchResult<BatchRun> {
        let mut records = Vec::new();
        let mut skipped = 0;

        for folder in self.planned_folders() {
            if self.skip_existing
                && self
                    .output
                    .errors_path(&folder.repo_name, &folder.readme_name)
                    .exists()
            {
                tracing::info!(document = %folder.document_id(), "Skipping already processed README");
                skipped += 1;
                continue;
            }

            let record = self.process_folder(&folder);
            self.output.append_record(&record)?;
            records.push(record);
        }

        let summary = self.output.write_summary(&records)?;
        tracing::info!(
            processed = records.len(),
            skipped,
            success_rate = %summary.summary.success_rate,
            "Batch processing finished"
        );

        Ok(BatchRun {
            records,
            skipped,
            summary,
        })
    }

    fn process_folder(&self, folder: &ReadmeFolder) -> ProcessingRecord {
        match self.try_process_folder(folder) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(document = %folder.document_id(), error = %e, "Failed to process README");
                ProcessingRecord::failed(&folder.repo_name, &folder.readme_name, e.to_string())
            }
        }
    }

    fn try_process_folder(&self, folder: &ReadmeFolder) -> BenchResult<ProcessingRecord> {
        tracing::info!(document = %folder.document_id(), "Processing README");

        let readme = self.dataset.read_readme(folder)?;
        let structure = self.dataset.repository_structure(&folder.repo_name);
        let result = self.analyzer.analyze(&readme, &structure)?;
        let saved = self
            .output
            .save_result(&folder.repo_name, &folder.readme_name, &result)?;

        Ok(ProcessingRecord {
            repo_name: folder.repo_name.clone(),
            readme_name: folder.readme_name.clone(),
            input_prompt: format!("{} analysis of {}", self.analyzer.mode(), folder.document_id()),
            model_output: result.raw_output,
            errors_detected: result.errors,
            shell_script_path: saved.script_path.display().to_string(),
            errors_json_path: saved.errors_path.display().to_string(),
            timestamp: now_timestamp(),
            success: true,
            error_message: None,
            token_usage: result.token_usage,
        })
    }
}
