//! README analysis pipeline producing the result files that evaluation consumes

mod analyzer;
mod dataset;
mod output;
mod processor;
mod prompt;
mod response;
mod types;

pub use analyzer::{AgentAnalyzer, LlmAnalyzer, ReadmeAnalyzer};
pub use dataset::{REPO_DIR_PREFIX, ReadmeDataset, ReadmeFolder, sample_evenly};
pub use output::{
    FailedRepository, OutputManager, RECORDS_FILE, RESULTS_DIR, RunTotals, SUMMARY_REPORT_FILE,
    SavedResult, SummaryReport, TokenStatistics, build_summary,
};
pub use processor::{BatchProcessor, BatchRun};
pub use prompt::{ANALYSIS_SYSTEM_PROMPT, build_agent_task, build_analysis_prompt};
pub use response::{PLACEHOLDER_SCRIPT, parse_agent_output, parse_analysis_response};
pub use types::{AnalysisResult, ProcessingRecord, now_timestamp};
