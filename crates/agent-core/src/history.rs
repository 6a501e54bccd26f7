//! Reasoning History
//!
//! Append-only log of dispatched actions and what came back from them,
//! replayed into every subsequent prompt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One dispatched action and its result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Thought of the step that requested the action
    pub thought: String,

    /// Action payload exactly as the model produced it
    pub action: Value,

    pub observation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryLog {
    records: Vec<Observation>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Observation) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render as `Thought:` / `Action:` / `Observation:` / `PAUSE:` lines.
    ///
    /// Empty fields are left out; every emitted line ends with a newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            if !record.thought.is_empty() {
                out.push_str(&format!("Thought: {}\n", record.thought));
            }
            if !is_blank(&record.action) {
                out.push_str(&format!("Action: {}\n", record.action));
            }
            if !record.observation.is_empty() {
                out.push_str(&format!("Observation: {}\n", record.observation));
            }
            if let Some(pause) = record.pause.as_deref().filter(|p| !p.is_empty()) {
                out.push_str(&format!("PAUSE: {pause}\n"));
            }
        }
        out
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl<'a> IntoIterator for &'a HistoryLog {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
