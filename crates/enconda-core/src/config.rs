//! Benchmark configuration

use crate::errors::{BenchError, BenchResult};
use crate::file_utils::safe_read_file;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".enconda.toml";

/// Configuration for analysis and evaluation runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub llm: LlmConfig,
    pub evaluation: EvaluationConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
    pub agent: AgentConfig,
}

/// Connection settings for the OpenAI-compatible endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key, usually `${OPENAI_API_KEY}`
    pub api_key: String,
    pub base_url: String,
    /// Model used by the README analyzer
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
    /// Extra attempts after the first failed request
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model_name: "gpt-4".to_string(),
            max_tokens: 4000,
            temperature: 0.1,
            timeout_secs: 60,
            max_retries: 3,
            retry_delay_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Model used by the similarity oracle
    pub model_name: String,
    pub breakdown: BreakdownMode,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            model_name: "gpt-4o-mini".to_string(),
            breakdown: BreakdownMode::default(),
        }
    }
}

/// How the per-category breakdown counts false negatives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakdownMode {
    /// Keys come from predicted categories only; false negatives stay zero
    #[default]
    PredictedOnly,
    /// Golden errors without a same-category match count as false negatives
    IncludeGoldenMisses,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root holding `error_gen_<repo>/<folder>/README.*` and `README.json`
    pub data_root_dir: PathBuf,
    /// Directory with `*.jsonl` repository structure dumps
    pub source_root_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<usize>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_root_dir: PathBuf::from("./benchmark_data"),
            source_root_dir: PathBuf::from("./source_repos"),
            sample_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    /// Skip README folders whose errors file already exists
    pub skip_existing: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            skip_existing: true,
        }
    }
}

/// External agent invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub executable: String,
    /// Arguments placed before the task file path
    pub args: Vec<String>,
    pub timeout_secs: u64,
    pub model_name: String,
    pub max_iterations: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            executable: "python".to_string(),
            args: vec!["./agent/swe_agent_wrapper.py".to_string()],
            timeout_secs: 300,
            model_name: "gpt-4".to_string(),
            max_iterations: 5,
        }
    }
}

/// Command-line overrides merged on top of a loaded config
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub llm_model: Option<String>,
    pub evaluation_model: Option<String>,
    pub breakdown: Option<BreakdownMode>,
    pub data_root_dir: Option<PathBuf>,
    pub source_root_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub sample_size: Option<usize>,
}

impl BenchConfig {
    /// Load config from file
    pub fn load(path: &Path) -> BenchResult<Self> {
        let content = safe_read_file(path)?;
        toml::from_str(&content).map_err(|e| BenchError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load an explicit config, or the default file if present, or defaults.
    ///
    /// An explicit path that cannot be loaded is an error; a missing default
    /// file is not.
    pub fn load_or_default(path: Option<&Path>) -> BenchResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_key) = overrides.api_key {
            self.llm.api_key = api_key;
        }
        if let Some(base_url) = overrides.base_url {
            self.llm.base_url = base_url;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model_name = model;
        }
        if let Some(model) = overrides.evaluation_model {
            self.evaluation.model_name = model;
        }
        if let Some(mode) = overrides.breakdown {
            self.evaluation.breakdown = mode;
        }
        if let Some(dir) = overrides.data_root_dir {
            self.data.data_root_dir = dir;
        }
        if let Some(dir) = overrides.source_root_dir {
            self.data.source_root_dir = dir;
        }
        if let Some(dir) = overrides.output_dir {
            self.output.output_dir = dir;
        }
        if overrides.sample_size.is_some() {
            self.data.sample_size = overrides.sample_size;
        }
    }

    /// Substitute `${VAR}` / `$VAR` string values from the process environment.
    pub fn resolve_env_vars(&mut self) {
        self.resolve_env_vars_with(|name| std::env::var(name).ok());
    }

    /// Substitute placeholders using a custom lookup.
    pub fn resolve_env_vars_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [&mut String; 6] = [
            &mut self.llm.api_key,
            &mut self.llm.base_url,
            &mut self.llm.model_name,
            &mut self.evaluation.model_name,
            &mut self.agent.executable,
            &mut self.agent.model_name,
        ];
        for field in fields {
            substitute(field, &lookup);
        }
        for arg in &mut self.agent.args {
            substitute(arg, &lookup);
        }
    }

    /// Check settings that would otherwise fail on the first request.
    pub fn validate(&self) -> BenchResult<()> {
        let key = self.llm.api_key.trim();
        if key.is_empty() || placeholder_name(key).is_some() {
            return Err(BenchError::MissingCredential {
                field: "llm.api_key".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(BenchError::InvalidConfig {
                message: format!(
                    "llm.temperature must be within [0, 2], got {}",
                    self.llm.temperature
                ),
            });
        }

        if self.llm.max_tokens == 0 {
            return Err(BenchError::InvalidConfig {
                message: "llm.max_tokens must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Variable name when `value` is exactly `${NAME}` or `$NAME`.
fn placeholder_name(value: &str) -> Option<&str> {
    let name = if let Some(inner) = value.strip_prefix("${") {
        inner.strip_suffix('}')?
    } else {
        value.strip_prefix('$')?
    };

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(name)
}

fn substitute<F>(value: &mut String, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(resolved) = placeholder_name(value).and_then(lookup) {
        *value = resolved;
    }
}
