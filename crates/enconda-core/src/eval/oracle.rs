//! Semantic similarity judgments
//!
//! The matcher asks an oracle whether two descriptions (or two fixes) say the
//! same thing. The LLM-backed oracle never fails to its caller: transport and
//! parse problems become a negative judgment with zero confidence.

use crate::config::BenchConfig;
use crate::errors::BenchResult;
use crate::llm::{OpenAiClient, TextGenerator};
use crate::models::SimilarityJudgment;
use serde_json::Value;
use std::fmt;

pub const SIMILARITY_SYSTEM_PROMPT: &str =
    "You are an expert evaluator for text similarity assessment.";

/// Sampling used for every similarity request
pub const SIMILARITY_TEMPERATURE: f64 = 0.1;
pub const SIMILARITY_MAX_TOKENS: u32 = 500;

const NO_REASON: &str = "No reason provided";
const HEURISTIC_REASON: &str = "Parsed from non-JSON response";
const HEURISTIC_CONFIDENCE: f64 = 0.5;

/// What the two texts being compared are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JudgmentKind {
    Description,
    Fix,
    General,
}

impl JudgmentKind {
    fn instruction(self) -> &'static str {
        match self {
            Self::Description => {
                "You need to evaluate whether two error descriptions are semantically similar.\n\
                 Two descriptions are considered similar if they describe the same type of problem,\n\
                 even if the wording is different."
            }
            Self::Fix => {
                "You need to evaluate whether two fix solutions are semantically similar.\n\
                 Two solutions are considered similar if they propose the same or equivalent\n\
                 approach to solve the problem, even if the specific commands or wording differ."
            }
            Self::General => "You need to evaluate whether two texts are semantically similar.",
        }
    }
}

impl fmt::Display for JudgmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Description => write!(f, "description"),
            Self::Fix => write!(f, "fix"),
            Self::General => write!(f, "general"),
        }
    }
}

/// Judges whether two text fragments are semantically equivalent.
pub trait SimilarityOracle {
    fn judge(&self, text_a: &str, text_b: &str, kind: JudgmentKind) -> SimilarityJudgment;

    /// Judge each pair in order. No caching: repeated pairs are judged again.
    fn judge_batch(&self, pairs: &[(&str, &str)], kind: JudgmentKind) -> Vec<SimilarityJudgment> {
        pairs
            .iter()
            .map(|(text_a, text_b)| self.judge(text_a, text_b, kind))
            .collect()
    }
}

/// Build the user prompt for one similarity request.
pub fn build_similarity_prompt(text_a: &str, text_b: &str, kind: JudgmentKind) -> String {
    format!(
        r#"{}

Text 1: {}

Text 2: {}

Please evaluate the similarity and respond in the following JSON format:
{{
    "is_similar": true/false,
    "confidence": 0.0-1.0,
    "reason": "Brief explanation of your decision"
}}

Consider the texts similar if they convey the same core meaning, even with different wording."#,
        kind.instruction(),
        text_a,
        text_b
    )
}

/// Parse a model reply into a judgment.
///
/// Text containing a `{` is parsed strictly: the slice from the first `{` to
/// the last `}` must be a JSON object. Text without any `{` falls back to a
/// keyword search for "true" or "similar" with fixed confidence 0.5.
pub fn parse_judgment(text: &str) -> SimilarityJudgment {
    let Some(start) = text.find('{') else {
        let lower = text.to_lowercase();
        let is_similar = lower.contains("true") || lower.contains("similar");
        return SimilarityJudgment::new(is_similar, HEURISTIC_CONFIDENCE, HEURISTIC_REASON);
    };

    let end = match text.rfind('}') {
        Some(end) if end > start => end,
        _ => return SimilarityJudgment::failure("Parsing failed: no closing brace after '{'"),
    };

    match parse_judgment_object(&text[start..=end]) {
        Ok(judgment) => judgment,
        Err(message) => SimilarityJudgment::failure(format!("Parsing failed: {}", message)),
    }
}

fn parse_judgment_object(json: &str) -> Result<SimilarityJudgment, String> {
    let value: Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let object = value
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;

    let is_similar = match object.get("is_similar") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(other) => return Err(format!("invalid is_similar value: {}", other)),
    };

    let confidence = match object.get("confidence") {
        None => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("could not convert confidence to float: {:?}", s))?,
        Some(other) => return Err(format!("could not convert confidence to float: {}", other)),
    };

    let reason = match object.get("reason") {
        None | Some(Value::Null) => NO_REASON.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    Ok(SimilarityJudgment::new(is_similar, confidence, reason))
}

/// Oracle backed by a chat-completions model.
pub struct LlmOracle<G> {
    generator: G,
}

impl<G: TextGenerator> LlmOracle<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }
}

impl LlmOracle<OpenAiClient> {
    /// Client for `[evaluation].model_name` with similarity sampling settings.
    pub fn from_config(config: &BenchConfig) -> BenchResult<Self> {
        let client = OpenAiClient::new(&config.llm)?
            .with_model(config.evaluation.model_name.clone())
            .with_sampling(SIMILARITY_TEMPERATURE, SIMILARITY_MAX_TOKENS);
        Ok(Self::new(client))
    }
}

impl<G: TextGenerator> SimilarityOracle for LlmOracle<G> {
    fn judge(&self, text_a: &str, text_b: &str, kind: JudgmentKind) -> SimilarityJudgment {
        let prompt = build_similarity_prompt(text_a, text_b, kind);
        match self.generator.generate(SIMILARITY_SYSTEM_PROMPT, &prompt) {
            Ok(completion) => parse_judgment(completion.text.trim()),
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Text similarity evaluation failed");
                SimilarityJudgment::failure(format!("Evaluation failed: {}", e))
            }
        }
    }
}
