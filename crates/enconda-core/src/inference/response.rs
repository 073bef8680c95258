//! Parsing analyzer replies into error lists and setup scripts

use super::types::AnalysisResult;
use crate::errors::{BenchError, BenchResult};
use crate::llm::TokenUsage;
use crate::models::PredictedError;
use crate::regex_util::static_regex;
use regex::Regex;
use serde::Deserialize;

/// Script used when a reply has no ```bash block.
pub const PLACEHOLDER_SCRIPT: &str = "#!/bin/bash\n\n# Environment setup script\necho 'Setting up environment...'\n\necho 'Environment setup completed.'";

static_regex!(fn json_fence, r"(?s)```json(.*?)```");
static_regex!(fn bash_fence, r"(?s)```bash(.*?)```");

const TEXT_ERROR_MARKERS: [&str; 6] = ["ERROR:", "Error:", "ISSUE:", "Issue:", "PROBLEM:", "Problem:"];
const TEXT_ERROR_FIX: &str = "Please review the agent output for specific recommendations";

#[derive(Debug, Deserialize)]
struct DetectedError {
    error_type: String,
    error_description: String,
    #[serde(alias = "fix_answer")]
    fix_suggestion: String,
}

impl From<DetectedError> for PredictedError {
    fn from(error: DetectedError) -> Self {
        let category = enconda_categories::normalize_category(&error.error_type)
            .map(str::to_string)
            .unwrap_or_else(|| error.error_type.trim().to_string());
        PredictedError::new(category, error.error_description, error.fix_suggestion)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorReport {
    #[serde(default)]
    detected_errors: Vec<DetectedError>,
}

/// JSON object printed by an agent on stdout.
#[derive(Debug, Deserialize)]
struct AgentReport {
    #[serde(default)]
    detected_errors: Vec<DetectedError>,
    #[serde(default)]
    shell_script: String,
    #[serde(default)]
    analysis_report: Option<String>,
    #[serde(default)]
    token_usage: Option<TokenUsage>,
}

/// Parse a reply holding a ```json error report and an optional ```bash script.
pub fn parse_analysis_response(raw_output: &str) -> BenchResult<AnalysisResult> {
    let json = json_fence()
        .captures(raw_output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| BenchError::ResponseFormat {
            message: "JSON error analysis block not found".to_string(),
        })?;

    let report: ErrorReport = serde_json::from_str(json).map_err(|e| BenchError::ResponseFormat {
        message: format!("Invalid error analysis JSON: {}", e),
    })?;

    let shell_script = match bash_fence().captures(raw_output).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim().to_string(),
        None => {
            tracing::warn!("Bash script block not found, using placeholder script");
            PLACEHOLDER_SCRIPT.to_string()
        }
    };

    Ok(AnalysisResult {
        errors: report.detected_errors.into_iter().map(Into::into).collect(),
        shell_script,
        raw_output: raw_output.to_string(),
        token_usage: None,
    })
}

/// Parse agent stdout: fenced blocks, then a bare JSON object, then plain text.
pub fn parse_agent_output(stdout: &str) -> AnalysisResult {
    if json_fence().is_match(stdout) {
        match parse_analysis_response(stdout) {
            Ok(result) => return result,
            Err(e) => tracing::debug!(error = %e, "Fenced agent output did not parse"),
        }
    }

    if let Some(report) = bare_json_report(stdout) {
        return AnalysisResult {
            errors: report.detected_errors.into_iter().map(Into::into).collect(),
            shell_script: report.shell_script,
            raw_output: report.analysis_report.unwrap_or_else(|| stdout.to_string()),
            token_usage: report.token_usage.filter(|usage| *usage != TokenUsage::default()),
        };
    }

    parse_text_output(stdout)
}

fn bare_json_report(stdout: &str) -> Option<AgentReport> {
    let start = stdout.find('{')?;
    let end = stdout.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str(&stdout[start..=end]) {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse agent JSON output");
            None
        }
    }
}

fn parse_text_output(stdout: &str) -> AnalysisResult {
    let mut script_lines = Vec::new();
    if let Some(start) = stdout.find("#!/bin/bash") {
        for line in stdout[start..].lines() {
            let separator = line.starts_with("---") || line.starts_with("===");
            if separator {
                if !script_lines.is_empty() {
                    break;
                }
            } else if !line.trim().is_empty() {
                script_lines.push(line);
            }
        }
    }

    let errors = stdout
        .lines()
        .filter(|line| TEXT_ERROR_MARKERS.iter().any(|marker| line.contains(marker)))
        .map(|line| PredictedError::new("E8", line.trim(), TEXT_ERROR_FIX))
        .collect();

    AnalysisResult {
        errors,
        shell_script: script_lines.join("\n"),
        raw_output: stdout.to_string(),
        token_usage: None,
    }
}
