use crate::error::ResqError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One chat turn in the completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat-completions request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: ResponseFormat,
}

/// Constrained-decoding request: the server must answer with a JSON object
/// matching the attached schema.
#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub schema: Value,
}

impl ResponseFormat {
    /// `{"sql_query": "..."}` — the only completion shape the translator
    /// accepts.
    pub fn sql_answer() -> Self {
        Self {
            kind: "json_object",
            schema: json!({
                "type": "object",
                "properties": { "sql_query": { "type": "string" } },
                "required": ["sql_query"],
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// The structured answer the model is asked for.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SqlAnswer {
    pub sql_query: String,
}

/// Parse a completion's content into [`SqlAnswer`]. Constrained decoding
/// keeps the payload JSON, but smaller models still occasionally wrap it in
/// Markdown fences, so those are stripped first.
pub fn parse_sql_answer(content: &str) -> Result<SqlAnswer, ResqError> {
    let cleaned = strip_code_fences(content.trim());
    serde_json::from_str(cleaned).map_err(|_| {
        ResqError::LlmDecode(format!(
            "completion is not a {{\"sql_query\"}} object: {}",
            excerpt(content)
        ))
    })
}

pub(crate) fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json", "sql", ...) on the opening fence line.
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or(rest);
    body.trim().strip_suffix("```").unwrap_or(body).trim()
}

fn excerpt(text: &str) -> String {
    const MAX: usize = 160;
    if text.len() <= MAX {
        return text.to_string();
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
