//! Structured Output Normalizer: coerces JSON-mode model output into the shape
//! a task needs.
//!
//! Accommodations, in order:
//! 1. Markdown code fences around the JSON are stripped.
//! 2. A top-level array is unwrapped to its first element (object tasks only).
//! 3. Required keys that are missing, blank, or not strings are back-filled
//!    from request-derived defaults.
//!
//! Object normalization fails only when the payload is not JSON or is not an object
//! after step 2. Missing keys never fail it.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::generation::prompts::QUIZ_OPTION_COUNT;
use crate::generation::request::QuizQuestion;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Model output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("No question list found in model output")]
    MissingQuestions,

    #[error("Malformed quiz question: {0}")]
    InvalidQuestion(serde_json::Error),

    #[error("No usable quiz question in model output ({0} rejected)")]
    NoUsableQuestions(usize),
}

/// Parses `raw` as a JSON object and back-fills every key in `defaults`
/// that the model left out.
pub fn normalize_object(
    raw: &str,
    defaults: &[(&str, String)],
) -> Result<Map<String, Value>, NormalizeError> {
    let value: Value = serde_json::from_str(strip_json_fences(raw))?;

    // The provider sometimes wraps a single object in an array.
    let candidate = match value {
        Value::Array(items) if !items.is_empty() => {
            items.into_iter().next().unwrap_or(Value::Null)
        }
        other => other,
    };

    let mut object = match candidate {
        Value::Object(map) => map,
        other => return Err(NormalizeError::NotAnObject(json_type_name(&other))),
    };

    for (key, default) in defaults {
        if !has_text(object.get(*key)) {
            object.insert((*key).to_string(), Value::String(default.clone()));
        }
    }

    Ok(object)
}

/// Locates the question list in quiz output and deserializes it.
///
/// Lookup order: a `quiz` key, then a `questions` key, then the payload
/// itself. A bare array is taken as the list; a bare object is accepted only
/// when it is itself a single question.
///
/// Questions without exactly `QUIZ_OPTION_COUNT` options, or whose answer is
/// not one of them, are dropped. If none survive the quiz is rejected.
pub fn normalize_quiz(raw: &str) -> Result<Vec<QuizQuestion>, NormalizeError> {
    let value: Value = serde_json::from_str(strip_json_fences(raw))?;

    let located = match value {
        Value::Object(mut map) => {
            let list = map.remove("quiz").or_else(|| map.remove("questions"));
            match list {
                Some(list) => list,
                None if map.contains_key("question") => Value::Array(vec![Value::Object(map)]),
                None => return Err(NormalizeError::MissingQuestions),
            }
        }
        Value::Array(items) => Value::Array(items),
        other => return Err(NormalizeError::NotAnObject(json_type_name(&other))),
    };

    let located = match located {
        Value::Object(single) => Value::Array(vec![Value::Object(single)]),
        other => other,
    };

    let questions: Vec<QuizQuestion> =
        serde_json::from_value(located).map_err(NormalizeError::InvalidQuestion)?;

    if questions.is_empty() {
        return Err(NormalizeError::MissingQuestions);
    }

    let total = questions.len();
    let usable: Vec<QuizQuestion> = questions.into_iter().filter(is_well_formed).collect();
    let rejected = total - usable.len();
    if usable.is_empty() {
        return Err(NormalizeError::NoUsableQuestions(rejected));
    }
    if rejected > 0 {
        warn!("Dropped {rejected} of {total} quiz questions with a bad option set");
    }
    Ok(usable)
}

fn is_well_formed(question: &QuizQuestion) -> bool {
    question.options.len() == QUIZ_OPTION_COUNT && question.options.contains(&question.answer)
}

fn has_text(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
