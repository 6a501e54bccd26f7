//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern. Each iteration composes a
//! prompt from the tool catalog and the history so far, asks the model for
//! one JSON step, and either returns its final answer or dispatches the
//! requested actions and records what they observed.
//!
//! ```text
//!   COMPOSING ──▶ QUERYING ──▶ PARSING ──┬──▶ DISPATCHING ──▶ COMPOSING
//!                                        ├──▶ TERMINATED (final answer)
//!                                        └──▶ TERMINATED (parse failure)
//! ```

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::history::{HistoryLog, Observation};
use crate::message::Message;
use crate::prompt::{PromptComposer, REACT_PROMPT_TEMPLATE};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::source::ToolSource;
use crate::step::{ReasoningStep, StepOutcome, parse_step};

/// Observation recorded for an action lacking a tool name or input
pub const MISSING_ACTION_FIELDS: &str = "Missing tool_choice/tool_input";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt template, may contain `{tool_descriptions}`
    pub system_prompt: String,

    /// Iteration cap; `None` runs until a final answer or a fatal error
    pub max_iterations: Option<usize>,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: REACT_PROMPT_TEMPLATE.into(),
            max_iterations: None,
            generation: GenerationOptions::default(),
        }
    }
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunTrace {
    pub outcome: Result<String>,
    pub history: HistoryLog,
    pub iterations: usize,
}

/// The ReAct agent
pub struct AgentLoop {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolSource>,
    composer: PromptComposer,
    config: AgentConfig,
    catalog: OnceCell<String>,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolSource>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            composer: PromptComposer::new(config.system_prompt.clone()),
            config,
            catalog: OnceCell::new(),
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<dyn ToolSource>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Answer `query`, or fail with a fatal error
    pub async fn run(&self, query: &str) -> Result<String> {
        self.run_traced(query).await.outcome
    }

    /// Like [`run`](Self::run), also returning the history and iteration count
    pub async fn run_traced(&self, query: &str) -> RunTrace {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("agent_run", %run_id);

        async {
            let mut history = HistoryLog::new();
            let mut iterations = 0;
            let outcome = self.drive(query, &mut history, &mut iterations).await;
            match &outcome {
                Ok(_) => tracing::info!(iterations, "Run finished with a final answer"),
                Err(e) => tracing::error!(iterations, error = %e, "Run terminated"),
            }
            RunTrace {
                outcome,
                history,
                iterations,
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        query: &str,
        history: &mut HistoryLog,
        iterations: &mut usize,
    ) -> Result<String> {
        let catalog = self.tool_catalog().await?;

        loop {
            if self.config.max_iterations.is_some_and(|max| *iterations >= max) {
                return Err(AgentError::MaxIterations(*iterations));
            }
            *iterations += 1;

            let prompt = self.composer.compose(catalog, history);
            let text = self.query_model(&prompt, query).await;

            match parse_step(&text)? {
                StepOutcome::FinalAnswer(answer) => {
                    tracing::debug!(trace = %history.render(), "Reasoning trace");
                    return Ok(answer);
                }
                StepOutcome::Continue(step) => self.dispatch(step, history).await,
            }
        }
    }

    /// Rendered catalog, fetched on first use
    async fn tool_catalog(&self) -> Result<&str> {
        self.catalog
            .get_or_try_init(|| async { self.tools.list().await.map(|c| c.render()) })
            .await
            .map(String::as_str)
    }

    /// Provider failures become response text, which then fails to parse
    async fn query_model(&self, prompt: &str, query: &str) -> String {
        let messages = Message::exchange(prompt, query);
        match self.provider.complete(&messages, &self.config.generation).await {
            Ok(completion) => {
                tracing::debug!(response = %completion.content, "Model response");
                completion.content
            }
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "Model call failed");
                format!("Error generating response: {e}")
            }
        }
    }

    async fn dispatch(&self, step: ReasoningStep, history: &mut HistoryLog) {
        let ReasoningStep {
            thought,
            actions,
            pause,
        } = step;

        for action in actions {
            let observation = match action.target() {
                Some((name, input)) => {
                    tracing::debug!(tool = name, "Dispatching action");
                    self.tools.invoke(name, input).await
                }
                None => {
                    tracing::warn!(action = %action.raw, "Action is missing tool_choice or tool_input");
                    MISSING_ACTION_FIELDS.to_string()
                }
            };
            history.push(Observation {
                thought: thought.clone(),
                action: action.raw,
                observation,
                pause: pause.clone(),
            });
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for [`AgentLoop`]
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Option<Arc<dyn ToolSource>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: None,
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tools(mut self, tools: Arc<dyn ToolSource>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    pub fn max_iterations(mut self, max: Option<usize>) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<AgentLoop> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let tools = self
            .tools
            .ok_or_else(|| AgentError::Config("Tool source is required".into()))?;

        Ok(AgentLoop::new(provider, tools, self.config))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::provider::Completion;
    use crate::tool::{FnTool, ToolRegistry};

    /// Replays canned responses and records every prompt it receives
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: impl IntoIterator<Item = Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn replies(texts: &[&str]) -> Arc<Self> {
            Self::new(texts.iter().map(|t| Ok((*t).to_string())))
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            self.prompts.lock().unwrap().push(messages[0].content.clone());
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(r#"{"final_answer": "script exhausted"}"#.into()));
            next.map(|text| Completion::text(&options.model, text))
        }
    }

    fn registry(calls: &Arc<AtomicUsize>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        let counter = Arc::clone(calls);
        registry
            .register(FnTool::new("add", "Adds two comma separated integers", move |s: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
                let (a, b) = s
                    .split_once(',')
                    .ok_or_else(|| AgentError::ToolExecution("expected a,b".into()))?;
                let parse = |v: &str| {
                    v.trim()
                        .parse::<i64>()
                        .map_err(|e| AgentError::ToolExecution(e.to_string()))
                };
                Ok::<_, AgentError>((parse(a)? + parse(b)?).to_string())
            }))
            .unwrap();
        registry
            .register(FnTool::new("echo", "Repeats its input", |s: &str| {
                Ok::<_, AgentError>(s.to_string())
            }))
            .unwrap();
        Arc::new(registry)
    }

    fn agent(provider: Arc<ScriptedProvider>, calls: &Arc<AtomicUsize>) -> AgentLoop {
        AgentLoop::new(
            provider,
            registry(calls),
            AgentConfig {
                system_prompt: "Tools:\n{tool_descriptions}".into(),
                max_iterations: Some(10),
                generation: GenerationOptions::default(),
            },
        )
    }

    #[tokio::test]
    async fn test_immediate_final_answer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider::replies(&[r#"{"thought":"easy","final_answer":"4"}"#]);
        let agent = agent(Arc::clone(&provider), &calls);

        let trace = agent.run_traced("What is 2+2?").await;
        assert_eq!(trace.outcome.unwrap(), "4");
        assert_eq!(trace.iterations, 1);
        assert!(trace.history.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            provider.prompts()[0],
            "Tools:\nadd: \"Adds two comma separated integers\"\necho: \"Repeats its input\""
        );
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider::replies(&[
            r#"{"thought":"add them","action":{"tool_choice":"add","tool_input":"2,3"},"pause":"check"}"#,
            r#"{"final_answer":"The sum is 5"}"#,
        ]);
        let agent = agent(Arc::clone(&provider), &calls);

        let trace = agent.run_traced("2+3?").await;
        assert_eq!(trace.outcome.unwrap(), "The sum is 5");
        assert_eq!(trace.iterations, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let record = trace.history.last().unwrap();
        assert_eq!(record.observation, "5");
        assert_eq!(record.thought, "add them");
        assert_eq!(record.pause.as_deref(), Some("check"));

        let second = &provider.prompts()[1];
        assert!(second.contains("Thought: add them\n"));
        assert!(second.contains("Observation: 5\n"));
        assert!(second.contains("PAUSE: check\n"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_recoverable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider::replies(&[
            r#"{"action":[{"tool_choice":"unknown_tool","tool_input":"x"}]}"#,
            r#"{"final_answer":"recovered"}"#,
        ]);
        let trace = agent(provider, &calls).run_traced("q").await;

        assert_eq!(trace.outcome.unwrap(), "recovered");
        assert_eq!(trace.history.len(), 1);
        assert_eq!(trace.history.records()[0].observation, "Unknown tool 'unknown_tool'");
    }

    #[tokio::test]
    async fn test_malformed_json_terminates_without_dispatch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider::replies(&["not json"]);
        let trace = agent(provider, &calls).run_traced("q").await;

        let err = trace.outcome.unwrap_err();
        assert!(matches!(err, AgentError::Parse { .. }));
        assert!(err.to_string().contains("Could not parse LLM JSON"));
        assert!(err.to_string().contains("not json"));
        assert!(trace.history.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tool_error_becomes_observation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider::replies(&[
            r#"{"action":{"tool_choice":"add","tool_input":"two,three"}}"#,
            r#"{"final_answer":"could not add"}"#,
        ]);
        let trace = agent(provider, &calls).run_traced("q").await;

        assert_eq!(trace.outcome.unwrap(), "could not add");
        let observation = &trace.history.records()[0].observation;
        assert!(observation.starts_with("Tool runtime error: "), "{observation}");
    }

    #[tokio::test]
    async fn test_every_action_yields_one_observation_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider::replies(&[
            r#"{"thought":"many","action":[
                {"tool_choice":"echo","tool_input":"first"},
                {"tool_choice":"add"},
                {"tool_choice":"echo","tool_input":"third"}
            ]}"#,
            r#"{"final_answer":"done"}"#,
        ]);
        let trace = agent(provider, &calls).run_traced("q").await;

        let observations: Vec<_> = trace.history.iter().map(|r| r.observation.as_str()).collect();
        assert_eq!(observations, ["first", MISSING_ACTION_FIELDS, "third"]);
        assert!(trace.history.iter().all(|r| r.thought == "many"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_fatal_parse_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider =
            ScriptedProvider::new([Err(AgentError::ProviderUnavailable("connection refused".into()))]);
        let err = agent(provider, &calls).run("q").await.unwrap_err();

        let text = err.to_string();
        assert!(text.contains("Raw: Error generating response: "), "{text}");
        assert!(text.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let calls = Arc::new(AtomicUsize::new(0));
        let looping = r#"{"thought":"again","action":{"tool_choice":"echo","tool_input":"x"}}"#;
        let provider = ScriptedProvider::replies(&[looping; 5]);
        let agent = AgentBuilder::new()
            .provider(provider)
            .tools(registry(&calls))
            .max_iterations(Some(3))
            .build()
            .unwrap();

        let trace = agent.run_traced("q").await;
        assert!(matches!(trace.outcome, Err(AgentError::MaxIterations(3))));
        assert_eq!(trace.iterations, 3);
        assert_eq!(trace.history.len(), 3);
    }

    #[tokio::test]
    async fn test_builder_requires_provider_and_tools() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));

        let provider = ScriptedProvider::replies(&[]);
        assert!(matches!(
            AgentBuilder::new().provider(provider).build(),
            Err(AgentError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_catalog_fetched_once_across_runs() {
        struct CountingSource {
            lists: AtomicUsize,
        }

        #[async_trait]
        impl ToolSource for CountingSource {
            async fn list(&self) -> Result<crate::catalog::ToolCatalog> {
                self.lists.fetch_add(1, Ordering::SeqCst);
                Ok([("noop", "does nothing")].into_iter().collect())
            }

            async fn invoke(&self, _name: &str, _argument: &str) -> String {
                String::new()
            }
        }

        let source = Arc::new(CountingSource {
            lists: AtomicUsize::new(0),
        });
        let provider = ScriptedProvider::replies(&[r#"{"final_answer":"a"}"#, r#"{"final_answer":"b"}"#]);
        let agent = AgentLoop::with_defaults(provider, Arc::clone(&source) as Arc<dyn ToolSource>);

        assert_eq!(agent.run("one").await.unwrap(), "a");
        assert_eq!(agent.run("two").await.unwrap(), "b");
        assert_eq!(source.lists.load(Ordering::SeqCst), 1);
    }
}
