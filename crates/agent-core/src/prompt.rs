//! Prompt Composition

use crate::history::HistoryLog;

/// Placeholder replaced by the rendered tool catalog
pub const TOOL_PLACEHOLDER: &str = "{tool_descriptions}";

/// Default system prompt instructing the model to answer in ReAct JSON steps
pub const REACT_PROMPT_TEMPLATE: &str = r#"You are an AI assistant that works in the ReAct (Reasoning + Acting) pattern.
Break the user's request into small steps, using tools whenever they help.

On every turn:
    1. Think about what needs to be done next
    2. Choose one or more actions if a tool is needed
    3. Read the observations those actions produce
    4. PAUSE to reflect on whether you have enough to answer
    5. Repeat until you can give a final answer

Reply with a single JSON object and nothing else:
    "thought": your reasoning for this step
    "action": a list of objects, each with
        - "tool_choice": name of the tool to call
        - "tool_input": the input string for that tool
    "pause": reflection on the latest observations and your next move

When you have enough information, reply with:
    "thought": "I now know the final answer"
    "final_answer": your complete, well-explained answer

Guidelines:
    - Only call tools listed below, using their exact names
    - If a tool reports an error, explain what went wrong and try another approach
    - Never wrap the JSON in code fences such as ```json

Available tools and their descriptions:
{tool_descriptions}"#;

/// Builds the system prompt for one iteration
#[derive(Clone, Debug)]
pub struct PromptComposer {
    template: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(REACT_PROMPT_TEMPLATE)
    }
}

impl PromptComposer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn compose(&self, catalog: &str, history: &HistoryLog) -> String {
        compose(&self.template, catalog, history)
    }
}

/// Substitute the catalog into `template`, then append the rendered history.
///
/// A template without the placeholder gets the catalog appended on its own
/// line. A non-empty history is appended after a newline.
pub fn compose(template: &str, catalog: &str, history: &HistoryLog) -> String {
    let mut prompt = if template.contains(TOOL_PLACEHOLDER) {
        template.replace(TOOL_PLACEHOLDER, catalog)
    } else if catalog.is_empty() {
        template.to_string()
    } else {
        format!("{template}\n{catalog}")
    };

    if !history.is_empty() {
        prompt.push('\n');
        prompt.push_str(&history.render());
    }
    prompt
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::history::Observation;

    #[test]
    fn test_placeholder_substitution() {
        let prompt = compose("Tools:\n{tool_descriptions}", "add: \"adds\"", &HistoryLog::new());
        assert_eq!(prompt, "Tools:\nadd: \"adds\"");
    }

    #[test]
    fn test_missing_placeholder_appends_catalog() {
        let history = HistoryLog::new();
        assert_eq!(compose("Be helpful.", "add: \"adds\"", &history), "Be helpful.\nadd: \"adds\"");
        assert_eq!(compose("Be helpful.", "", &history), "Be helpful.");
    }

    #[test]
    fn test_history_is_appended_after_catalog() {
        let mut history = HistoryLog::new();
        history.push(Observation {
            thought: "t".into(),
            action: json!({"tool_choice": "add", "tool_input": "1"}),
            observation: "2".into(),
            pause: None,
        });

        let composer = PromptComposer::new("{tool_descriptions}");
        let prompt = composer.compose("add: \"adds\"", &history);
        assert!(prompt.starts_with("add: \"adds\"\nThought: t\n"));
        assert!(prompt.ends_with("Observation: 2\n"));
    }

    #[test]
    fn test_default_template_has_placeholder() {
        assert!(PromptComposer::default().template().contains(TOOL_PLACEHOLDER));
    }
}
