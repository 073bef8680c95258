//! OpenAI-compatible text generation
//!
//! Both the README analyzer and the similarity oracle talk to a
//! chat-completions endpoint through the [`TextGenerator`] trait, which keeps
//! the HTTP client out of the evaluation core and lets tests swap in a stub.

use crate::config::LlmConfig;
use crate::errors::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Token accounting reported by the endpoint.
///
/// Agents report `input_tokens`/`output_tokens`, which are accepted as aliases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, alias = "input_tokens")]
    pub prompt_tokens: u64,
    #[serde(default, alias = "output_tokens")]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Produces a completion for a system/user prompt pair.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> BenchResult<Completion>;

    /// Model identifier, recorded in output files.
    fn model_name(&self) -> &str;
}

/// Blocking client for `POST {base_url}/chat/completions`.
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> BenchResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .user_agent(format!("enconda/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BenchError::Http {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            endpoint: chat_endpoint(&config.base_url),
            api_key: config.api_key.clone(),
            model: config.model_name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_sampling(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn request_once(&self, system_prompt: &str, user_prompt: &str) -> Result<Completion, Attempt> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| Attempt::Retry(BenchError::Http {
                message: format!("Failed to call {}: {}", self.endpoint, e),
            }))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            let err = BenchError::Http {
                message: format!("{} - {}", status, truncate(&error_text, 500)),
            };
            return Err(if is_retryable_status(status.as_u16()) {
                Attempt::Retry(err)
            } else {
                Attempt::Fatal(err)
            });
        }

        let text = response.text().map_err(|e| Attempt::Retry(BenchError::Http {
            message: format!("Failed to read response body: {}", e),
        }))?;

        parse_chat_response(&text).map_err(Attempt::Fatal)
    }
}

impl TextGenerator for OpenAiClient {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> BenchResult<Completion> {
        let mut attempt = 0;
        loop {
            match self.request_once(system_prompt, user_prompt) {
                Ok(completion) => return Ok(completion),
                Err(Attempt::Fatal(err)) => return Err(err),
                Err(Attempt::Retry(err)) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "LLM request failed, retrying"
                    );
                    thread::sleep(self.retry_delay);
                }
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

enum Attempt {
    Retry(BenchError),
    Fatal(BenchError),
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract `choices[0].message.content` and usage from a response body.
pub fn parse_chat_response(body: &str) -> BenchResult<Completion> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| BenchError::ResponseFormat {
            message: format!("Invalid chat completion response: {}", e),
        })?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(BenchError::EmptyResponse)?;

    Ok(Completion {
        text,
        usage: parsed.usage,
    })
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
