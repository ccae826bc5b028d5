//! Boundary parsing for query service responses.
//!
//! The service is loosely typed: `facts` may be a list or a newline-separated
//! block, `suggestedQuestions` may be a list, a bare string or missing, and the
//! answer may live under `response` or `answer`. Everything is parsed once here
//! into [`QueryAnswer`]; malformed shapes become empty values instead of errors.

use serde::Deserialize;
use serde_json::Value;

/// A field the service may send as a string, a list, or anything else
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Text(String),
    List(Vec<Value>),
    Other(Value),
}

/// Wire shape of a `/agentic-rag` reply before validation
#[derive(Debug, Default, Deserialize)]
pub struct RawAnswer {
    #[serde(default)]
    pub facts: Option<Loose>,
    #[serde(default)]
    pub response: Option<Loose>,
    #[serde(default)]
    pub answer: Option<Loose>,
    #[serde(default, rename = "suggestedQuestions")]
    pub suggested_questions: Option<Loose>,
}

/// Validated answer ready to become a turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryAnswer {
    pub facts: Vec<String>,
    pub response: String,
    pub suggested_questions: Vec<String>,
}

impl QueryAnswer {
    /// Parse a response body. Only non-JSON input is an error.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;
        Ok(Self::from_value(value))
    }

    /// Normalize an already-decoded body. Non-object bodies yield an empty answer.
    pub fn from_value(value: Value) -> Self {
        let raw = match value {
            Value::Object(_) => serde_json::from_value::<RawAnswer>(value).unwrap_or_default(),
            _ => RawAnswer::default(),
        };
        Self::from(raw)
    }
}

impl From<RawAnswer> for QueryAnswer {
    fn from(raw: RawAnswer) -> Self {
        let response = non_empty_text(raw.response.as_ref())
            .or_else(|| non_empty_text(raw.answer.as_ref()))
            .unwrap_or_default();

        Self {
            facts: normalize_facts(raw.facts.as_ref()),
            response,
            suggested_questions: normalize_suggestions(raw.suggested_questions.as_ref()),
        }
    }
}

fn normalize_facts(field: Option<&Loose>) -> Vec<String> {
    match field {
        Some(Loose::Text(block)) => block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Loose::List(items)) => trimmed_strings(items),
        _ => Vec::new(),
    }
}

fn normalize_suggestions(field: Option<&Loose>) -> Vec<String> {
    match field {
        Some(Loose::Text(single)) => {
            let single = single.trim();
            if single.is_empty() {
                Vec::new()
            } else {
                vec![single.to_string()]
            }
        }
        Some(Loose::List(items)) => trimmed_strings(items),
        _ => Vec::new(),
    }
}

fn trimmed_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_text(field: Option<&Loose>) -> Option<String> {
    match field {
        Some(Loose::Text(text)) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    }
}
