//! Reasoning Step Parsing
//!
//! The model answers every turn with one JSON object. It either carries a
//! `final_answer` (which ends the run) or a `thought`, a list of `action`
//! requests and an optional `pause` reflection.

use serde_json::{Map, Value};

use crate::error::{AgentError, Result};

/// A single tool invocation requested by the model
#[derive(Clone, Debug, PartialEq)]
pub struct ActionRequest {
    pub tool_choice: Option<String>,
    pub tool_input: Option<String>,

    /// The element as it appeared in the step
    pub raw: Value,
}

impl ActionRequest {
    pub fn from_value(raw: Value) -> Self {
        let (tool_choice, tool_input) = match raw.as_object() {
            Some(fields) => (
                fields
                    .get("tool_choice")
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
                fields.get("tool_input").and_then(text_of),
            ),
            None => (None, None),
        };
        Self {
            tool_choice,
            tool_input,
            raw,
        }
    }

    /// Tool name and argument, when both are present
    pub fn target(&self) -> Option<(&str, &str)> {
        Some((self.tool_choice.as_deref()?, self.tool_input.as_deref()?))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReasoningStep {
    pub thought: String,
    pub actions: Vec<ActionRequest>,
    pub pause: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    FinalAnswer(String),
    Continue(ReasoningStep),
}

/// Parse one model response.
///
/// Text that is not a JSON object is a fatal [`AgentError::Parse`] carrying
/// the raw text.
pub fn parse_step(text: &str) -> Result<StepOutcome> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| AgentError::parse(e.to_string(), text))?;

    let Value::Object(mut fields) = value else {
        return Err(AgentError::parse(
            format!("expected a JSON object, found {}", kind_of(&value)),
            text,
        ));
    };

    if let Some(answer) = fields.remove("final_answer") {
        return Ok(StepOutcome::FinalAnswer(answer_text(answer)));
    }

    Ok(StepOutcome::Continue(ReasoningStep {
        thought: fields.get("thought").and_then(text_of).unwrap_or_default(),
        actions: actions_of(&mut fields),
        pause: fields.get("pause").and_then(text_of),
    }))
}

/// A lone action object is shorthand for a one-element list
fn actions_of(fields: &mut Map<String, Value>) -> Vec<ActionRequest> {
    match fields.remove("action") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().map(ActionRequest::from_value).collect(),
        Some(single) => vec![ActionRequest::from_value(single)],
    }
}

/// Strings verbatim, null as absent, anything else as compact JSON
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn answer_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
