//! Tool System
//!
//! Tools are named capabilities taking one string argument and returning one
//! string. They are registered explicitly, either one at a time, as members of
//! a [`ToolBundle`], or as nested collections of both, and are invoked by the
//! reasoning loop through [`ToolRegistry::dispatch`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::ToolCatalog;
use crate::error::{AgentError, Result};

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool identifier, shown to the model
    fn name(&self) -> &str;

    /// Human-readable description (shown to the model)
    fn description(&self) -> &str {
        ""
    }

    /// Run the tool against a single opaque argument
    async fn invoke(&self, argument: &str) -> Result<String>;
}

type ToolFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;
type Handler = Arc<dyn Fn(String) -> ToolFuture + Send + Sync>;

/// A tool backed by a closure
#[derive(Clone)]
pub struct FnTool {
    name: String,
    description: String,
    handler: Handler,
}

impl FnTool {
    /// Wrap a synchronous function
    pub fn new<F, E>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, E> + Send + Sync + 'static,
        E: Into<AgentError>,
    {
        let handler: Handler = Arc::new(move |argument: String| -> ToolFuture {
            let result = f(&argument).map_err(Into::into);
            Box::pin(std::future::ready(result))
        });
        Self::with_handler(name, description, handler)
    }

    /// Wrap an asynchronous function
    pub fn new_async<F, Fut, E>(
        name: impl Into<String>,
        description: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<String, E>> + Send + 'static,
        E: Into<AgentError> + 'static,
    {
        let handler: Handler = Arc::new(move |argument: String| -> ToolFuture {
            let fut = f(argument);
            Box::pin(async move { fut.await.map_err(Into::into) })
        });
        Self::with_handler(name, description, handler)
    }

    fn with_handler(name: impl Into<String>, description: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            description: description.into().trim().to_string(),
            handler,
        }
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, argument: &str) -> Result<String> {
        (self.handler)(argument.to_string()).await
    }
}

/// One entry of a bundle's member table
pub enum BundleMember {
    /// A callable member, registered under its tool name
    Callable(Arc<dyn Tool>),
    /// A plain data member; never registered
    Field(String),
}

impl BundleMember {
    pub fn callable(tool: impl Tool + 'static) -> Self {
        Self::Callable(Arc::new(tool))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Callable(tool) => tool.name(),
            Self::Field(name) => name,
        }
    }

    /// Members named with a leading underscore are private
    pub fn is_private(&self) -> bool {
        self.name().starts_with('_')
    }
}

/// A group of related tools exposed as an explicit member table
pub trait ToolBundle: Send + Sync {
    fn bundle_name(&self) -> &str;

    fn members(&self) -> Vec<BundleMember>;
}

/// Anything the registry accepts
pub enum ToolItem {
    Tool(Arc<dyn Tool>),
    Bundle(Arc<dyn ToolBundle>),
    Collection(Vec<ToolItem>),
}

impl ToolItem {
    pub fn tool(tool: impl Tool + 'static) -> Self {
        Self::Tool(Arc::new(tool))
    }

    pub fn bundle(bundle: impl ToolBundle + 'static) -> Self {
        Self::Bundle(Arc::new(bundle))
    }
}

impl From<FnTool> for ToolItem {
    fn from(tool: FnTool) -> Self {
        Self::tool(tool)
    }
}

impl From<Arc<dyn Tool>> for ToolItem {
    fn from(tool: Arc<dyn Tool>) -> Self {
        Self::Tool(tool)
    }
}

impl From<Arc<dyn ToolBundle>> for ToolItem {
    fn from(bundle: Arc<dyn ToolBundle>) -> Self {
        Self::Bundle(bundle)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ToolItem {
    fn from(items: Vec<T>) -> Self {
        Self::Collection(items.into_iter().map(Into::into).collect())
    }
}

/// Reject names that cannot be rendered as a single catalog line
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AgentError::UnsupportedToolKind(
            "tool name must not be empty".into(),
        ));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AgentError::UnsupportedToolKind(format!(
            "tool name {name:?} contains whitespace or control characters"
        )));
    }
    Ok(())
}

/// Registry for available tools
///
/// Keeps registration order. Re-registering a name replaces the tool but
/// keeps its original position.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, a bundle, or a nested collection of either.
    ///
    /// Collections are flattened depth-first. Returns the number of tools
    /// registered by this call.
    pub fn register(&mut self, item: impl Into<ToolItem>) -> Result<usize> {
        self.register_item(item.into())
    }

    fn register_item(&mut self, item: ToolItem) -> Result<usize> {
        match item {
            ToolItem::Tool(tool) => self.insert(tool).map(|()| 1),
            ToolItem::Bundle(bundle) => {
                let mut count = 0;
                for member in bundle.members() {
                    if member.is_private() {
                        continue;
                    }
                    if let BundleMember::Callable(tool) = member {
                        self.insert(tool)?;
                        count += 1;
                    }
                }
                tracing::debug!(bundle = bundle.bundle_name(), count, "Registered tool bundle");
                Ok(count)
            }
            ToolItem::Collection(items) => {
                let mut count = 0;
                for item in items {
                    count += self.register_item(item)?;
                }
                Ok(count)
            }
        }
    }

    fn insert(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        validate_name(&name)?;
        if let Some(&slot) = self.index.get(&name) {
            tracing::debug!(tool = %name, "Replacing previously registered tool");
            self.tools[slot] = tool;
        } else {
            self.index.insert(name, self.tools.len());
            self.tools.push(tool);
        }
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| Arc::clone(&self.tools[slot]))
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn catalog(&self) -> ToolCatalog {
        self.tools
            .iter()
            .map(|t| (t.name(), t.description().trim()))
            .collect()
    }

    /// Catalog text for prompt injection
    pub fn describe(&self) -> String {
        self.catalog().render()
    }

    /// Run a registered tool on its own task so that a panic surfaces as an
    /// ordinary tool error. Returns `None` when no tool has that name.
    pub async fn execute(&self, name: &str, argument: &str) -> Option<Result<String>> {
        let tool = self.get(name)?;
        let argument = argument.to_string();

        Some(match tokio::spawn(async move { tool.invoke(&argument).await }).await {
            Ok(result) => result,
            Err(join_error) => {
                tracing::warn!(tool = name, error = %join_error, "Tool panicked");
                Err(AgentError::ToolExecution(join_error.to_string()))
            }
        })
    }

    /// Execute a tool, folding every failure into the returned observation
    pub async fn dispatch(&self, name: &str, argument: &str) -> String {
        match self.execute(name, argument).await {
            None => {
                tracing::warn!(tool = name, "Unknown tool requested");
                format!("Unknown tool '{name}'")
            }
            Some(Ok(output)) => output,
            Some(Err(e)) => {
                tracing::warn!(tool = name, error = %e, "Tool failed");
                format!("Tool runtime error: {}", e.detail())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_tool() -> FnTool {
        FnTool::new("add", "  adds two numbers\n", |arg: &str| {
            let sum: i64 = arg
                .split(',')
                .map(|n| n.trim().parse::<i64>())
                .sum::<std::result::Result<i64, _>>()
                .map_err(|e| anyhow::anyhow!("bad number: {e}"))?;
            Ok::<_, anyhow::Error>(sum.to_string())
        })
    }

    struct MathBundle;

    impl ToolBundle for MathBundle {
        fn bundle_name(&self) -> &str {
            "math"
        }

        fn members(&self) -> Vec<BundleMember> {
            vec![
                BundleMember::callable(add_tool()),
                BundleMember::callable(FnTool::new("negate", "flips the sign", |arg: &str| {
                    Ok::<_, AgentError>(format!("-{arg}"))
                })),
                BundleMember::callable(FnTool::new("_helper", "private", |_: &str| {
                    Ok::<_, AgentError>(String::new())
                })),
                BundleMember::Field("precision".into()),
            ]
        }
    }

    #[test]
    fn test_describe_single_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(add_tool()).unwrap();
        assert_eq!(registry.describe(), "add: \"adds two numbers\"");
    }

    #[test]
    fn test_describe_is_idempotent() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolItem::bundle(MathBundle)).unwrap();
        assert_eq!(registry.describe(), registry.describe());
    }

    #[test]
    fn test_bundle_skips_private_and_fields() {
        let mut registry = ToolRegistry::new();
        let count = registry.register(ToolItem::bundle(MathBundle)).unwrap();
        assert_eq!(count, 2);
        assert_eq!(registry.names(), vec!["add", "negate"]);
        assert!(registry.get("_helper").is_none());
        assert!(registry.get("precision").is_none());
    }

    #[test]
    fn test_nested_collections_flatten_depth_first() {
        let greet = FnTool::new("greet", "", |n: &str| Ok::<_, AgentError>(format!("hi {n}")));
        let echo = FnTool::new("echo", "", |s: &str| Ok::<_, AgentError>(s.to_string()));
        let items = ToolItem::Collection(vec![
            ToolItem::Collection(vec![greet.into(), ToolItem::bundle(MathBundle)]),
            echo.into(),
        ]);

        let mut registry = ToolRegistry::new();
        assert_eq!(registry.register(items).unwrap(), 4);
        assert_eq!(registry.names(), vec!["greet", "add", "negate", "echo"]);
    }

    #[test]
    fn test_last_registration_wins_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(add_tool()).unwrap();
        registry
            .register(FnTool::new("echo", "", |s: &str| Ok::<_, AgentError>(s.into())))
            .unwrap();
        registry
            .register(FnTool::new("add", "concatenates", |s: &str| {
                Ok::<_, AgentError>(s.replace(',', ""))
            }))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.describe(), "add: \"concatenates\"\necho: \"\"");
    }

    #[test]
    fn test_unsupported_names_rejected() {
        let mut registry = ToolRegistry::new();
        let err = registry
            .register(FnTool::new("", "", |s: &str| Ok::<_, AgentError>(s.into())))
            .unwrap_err();
        assert!(matches!(err, AgentError::UnsupportedToolKind(_)));

        let err = registry
            .register(FnTool::new("two words", "", |s: &str| Ok::<_, AgentError>(s.into())))
            .unwrap_err();
        assert!(matches!(err, AgentError::UnsupportedToolKind(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let mut registry = ToolRegistry::new();
        registry.register(add_tool()).unwrap();
        assert_eq!(registry.dispatch("add", "2, 3").await, "5");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        assert_eq!(
            registry.dispatch("unknown_tool", "x").await,
            "Unknown tool 'unknown_tool'"
        );
    }

    #[tokio::test]
    async fn test_dispatch_never_raises() {
        let mut registry = ToolRegistry::new();
        registry.register(add_tool()).unwrap();
        registry
            .register(FnTool::new("explode", "", |_: &str| -> std::result::Result<String, AgentError> {
                panic!("kaboom")
            }))
            .unwrap();

        let failed = registry.dispatch("add", "two, three").await;
        assert!(failed.starts_with("Tool runtime error: bad number"));

        let panicked = registry.dispatch("explode", "").await;
        assert!(panicked.starts_with("Tool runtime error:"));
    }

    #[tokio::test]
    async fn test_async_tool() {
        let mut registry = ToolRegistry::new();
        registry
            .register(FnTool::new_async("shout", "uppercases", |s: String| async move {
                tokio::task::yield_now().await;
                Ok::<_, AgentError>(s.to_uppercase())
            }))
            .unwrap();
        assert_eq!(registry.dispatch("shout", "hey").await, "HEY");
    }
}
