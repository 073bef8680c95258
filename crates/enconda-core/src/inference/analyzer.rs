//! README analyzers: a single LLM call, or an external agent process

use super::prompt::{ANALYSIS_SYSTEM_PROMPT, build_agent_task, build_analysis_prompt};
use super::response::{parse_agent_output, parse_analysis_response};
use super::types::AnalysisResult;
use crate::config::{AgentConfig, LlmConfig};
use crate::errors::{BenchError, BenchResult};
use crate::file_utils::{write_json_pretty, write_text};
use crate::llm::TextGenerator;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Produces an error list and setup script for one README.
pub trait ReadmeAnalyzer {
    fn analyze(&self, readme_content: &str, repository_structure: &str) -> BenchResult<AnalysisResult>;

    /// Short label recorded as the input prompt of processing records.
    fn mode(&self) -> &'static str;
}

pub struct LlmAnalyzer<G> {
    generator: G,
}

impl<G: TextGenerator> LlmAnalyzer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

impl<G: TextGenerator> ReadmeAnalyzer for LlmAnalyzer<G> {
    fn analyze(&self, readme_content: &str, repository_structure: &str) -> BenchResult<AnalysisResult> {
        let prompt = build_analysis_prompt(readme_content, repository_structure);
        let completion = self.generator.generate(ANALYSIS_SYSTEM_PROMPT, &prompt)?;
        tracing::info!(model = self.generator.model_name(), "Obtained LLM response");

        let mut result = parse_analysis_response(&completion.text)?;
        result.token_usage = completion.usage;
        Ok(result)
    }

    fn mode(&self) -> &'static str {
        "llm"
    }
}

/// Runs `<executable> <args...> --task-file <task.md> --config-file <agent.json> --work-dir <dir>`.
pub struct AgentAnalyzer {
    agent: AgentConfig,
    api_key: String,
    base_url: String,
}

impl AgentAnalyzer {
    pub fn new(agent: AgentConfig, llm: &LlmConfig) -> Self {
        Self {
            agent,
            api_key: llm.api_key.clone(),
            base_url: llm.base_url.clone(),
        }
    }

    fn write_task_files(&self, dir: &Path, task: &str) -> BenchResult<(PathBuf, PathBuf)> {
        let task_file = dir.join("task.md");
        write_text(&task_file, task)?;

        let config_file = dir.join("agent.json");
        let settings = serde_json::json!({
            "model_name": self.agent.model_name,
            "max_iterations": self.agent.max_iterations,
            "timeout": self.agent.timeout_secs,
            "task_type": "environment_analysis",
            "output_format": "json_with_script",
        });
        write_json_pretty(&config_file, &settings)?;

        Ok((task_file, config_file))
    }

    fn run_agent(&self, task_file: &Path, config_file: &Path, work_dir: &Path) -> BenchResult<String> {
        let mut command = Command::new(&self.agent.executable);
        command
            .args(&self.agent.args)
            .arg("--task-file")
            .arg(task_file)
            .arg("--config-file")
            .arg(config_file)
            .arg("--work-dir")
            .arg(work_dir)
            .env("OPENAI_API_KEY", &self.api_key)
            .env("OPENAI_BASE_URL", &self.base_url)
            .env("AGENT_WORK_DIR", work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::info!(executable = %self.agent.executable, "Executing agent command");

        let mut child = command.spawn().map_err(|e| BenchError::Agent {
            message: if e.kind() == std::io::ErrorKind::NotFound {
                format!("Agent executable not found: {}", self.agent.executable)
            } else {
                format!("Failed to start agent: {}", e)
            },
        })?;

        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let timeout = Duration::from_secs(self.agent.timeout_secs);
        let status = match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                kill_quietly(&mut child);
                return Err(BenchError::Agent {
                    message: format!(
                        "Agent execution timed out after {} seconds",
                        self.agent.timeout_secs
                    ),
                });
            }
            Err(e) => {
                kill_quietly(&mut child);
                return Err(BenchError::Agent {
                    message: format!("Failed to wait for agent: {}", e),
                });
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(BenchError::Agent {
                message: format!("Agent exited with {}: {}", status, stderr.trim()),
            });
        }

        Ok(stdout)
    }
}

impl ReadmeAnalyzer for AgentAnalyzer {
    fn analyze(&self, readme_content: &str, repository_structure: &str) -> BenchResult<AnalysisResult> {
        let work_dir = tempfile::tempdir().map_err(|e| BenchError::Agent {
            message: format!("Failed to create agent work directory: {}", e),
        })?;

        let task = build_agent_task(readme_content, repository_structure);
        let (task_file, config_file) = self.write_task_files(work_dir.path(), &task)?;
        let stdout = self.run_agent(&task_file, &config_file, work_dir.path())?;

        Ok(parse_agent_output(&stdout))
    }

    fn mode(&self) -> &'static str {
        "agent"
    }
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn kill_quietly(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
