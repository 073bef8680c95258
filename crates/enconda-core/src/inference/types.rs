use crate::llm::TokenUsage;
use crate::models::PredictedError;
use serde::{Deserialize, Serialize};

/// Parsed analyzer output for one README.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub errors: Vec<PredictedError>,
    pub shell_script: String,
    pub raw_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

/// One line of `processing_records.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub repo_name: String,
    pub readme_name: String,
    pub input_prompt: String,
    pub model_output: String,
    #[serde(default)]
    pub errors_detected: Vec<PredictedError>,
    pub shell_script_path: String,
    pub errors_json_path: String,
    pub timestamp: String,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub token_usage: Option<TokenUsage>,
}

impl ProcessingRecord {
    pub fn failed(
        repo_name: impl Into<String>,
        readme_name: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            repo_name: repo_name.into(),
            readme_name: readme_name.into(),
            input_prompt: String::new(),
            model_output: String::new(),
            errors_detected: Vec::new(),
            shell_script_path: String::new(),
            errors_json_path: String::new(),
            timestamp: now_timestamp(),
            success: false,
            error_message: Some(error_message.into()),
            token_usage: None,
        }
    }
}

/// Local time in RFC 3339 form, used for every record and report.
pub fn now_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}
