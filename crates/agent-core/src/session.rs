//! Remote Tool Sessions
//!
//! A [`ToolSession`] is a handle to a separately running tool host. The wire
//! protocol lives behind [`ToolTransport`]; establishing one is the job of a
//! [`TransportConnector`] (for example, spawning a child process and
//! performing a handshake).
//!
//! ```text
//!   Disconnected ──connect()──▶ Connected ──list_tools()──▶ Connected + cached catalog
//!        ▲                          │
//!        └────────close()───────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::catalog::ToolCatalog;
use crate::error::{AgentError, Result};
use crate::source::ToolSource;

/// Tool as advertised by a remote host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteTool {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema of the argument object
    #[serde(default, rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl RemoteTool {
    /// Map the agent's single string argument onto the remote argument object.
    ///
    /// A schema with exactly one property receives the string under that
    /// property. Otherwise a JSON object string is forwarded as-is, and
    /// anything else is sent under `input`.
    pub fn arguments_for(&self, argument: &str) -> Value {
        let properties = self
            .input_schema
            .as_ref()
            .and_then(|schema| schema.get("properties"))
            .and_then(Value::as_object);

        if let Some(props) = properties.filter(|p| p.len() == 1) {
            if let Some(key) = props.keys().next() {
                return json!({ key.as_str(): argument });
            }
        }

        match serde_json::from_str::<Value>(argument) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => json!({ "input": argument }),
        }
    }
}

/// One element of a remote call's content list
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: Some(text.into()),
        }
    }
}

/// Result of a remote tool call
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,

    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Text of the first content element; the observation the agent sees
    pub fn first_text(&self) -> &str {
        self.content
            .first()
            .and_then(|c| c.text.as_deref())
            .unwrap_or_default()
    }
}

/// An established channel to a tool host
#[async_trait]
pub trait ToolTransport: Send {
    async fn list_tools(&mut self) -> Result<Vec<RemoteTool>>;

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult>;

    /// Release the channel and anything spawned for it
    async fn shutdown(&mut self) -> Result<()>;
}

/// Factory for transports; called once per connection
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Short label for logs (e.g. the spawned command line)
    fn describe(&self) -> String;

    async fn connect(&self) -> Result<Box<dyn ToolTransport>>;
}

struct Connected {
    transport: Box<dyn ToolTransport>,
    tools: Option<Vec<RemoteTool>>,
}

impl Connected {
    async fn tools(&mut self) -> Result<&[RemoteTool]> {
        if self.tools.is_none() {
            let tools = self.transport.list_tools().await?;
            tracing::info!(count = tools.len(), "Fetched remote tool catalog");
            self.tools = Some(tools);
        }
        Ok(self.tools.as_deref().unwrap_or_default())
    }
}

/// Handle to a remote tool host
pub struct ToolSession {
    connector: Box<dyn TransportConnector>,
    state: Mutex<Option<Connected>>,
}

impl ToolSession {
    pub fn new(connector: impl TransportConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            state: Mutex::new(None),
        }
    }

    async fn ensure_connected<'a>(&self, state: &'a mut Option<Connected>) -> Result<&'a mut Connected> {
        if state.is_none() {
            let target = self.connector.describe();
            let transport = self.connector.connect().await.map_err(|e| {
                tracing::error!(%target, error = %e, "Failed to establish tool session");
                AgentError::Session(format!("{target}: {}", e.detail()))
            })?;
            tracing::info!(%target, "Tool session established");
            *state = Some(Connected {
                transport,
                tools: None,
            });
        }
        state
            .as_mut()
            .ok_or_else(|| AgentError::Session("session unavailable".into()))
    }

    /// Establish the session. A second call while connected is a no-op.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_connected(&mut state).await.map(|_| ())
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Remote catalog, fetched once per connection
    pub async fn list_tools(&self) -> Result<ToolCatalog> {
        let mut state = self.state.lock().await;
        let connected = self.ensure_connected(&mut state).await?;
        let tools = connected.tools().await?;
        Ok(tools
            .iter()
            .map(|t| (t.name.as_str(), t.description.as_deref().unwrap_or_default().trim()))
            .collect())
    }

    /// Forward a call to the host, folding every failure into the result text
    pub async fn call_tool(&self, name: &str, argument: &str) -> String {
        let mut state = self.state.lock().await;
        let connected = match self.ensure_connected(&mut state).await {
            Ok(connected) => connected,
            Err(e) => return format!("Tool runtime error: {}", e.detail()),
        };

        let arguments = match connected.tools().await {
            Ok(tools) => match tools.iter().find(|t| t.name == name) {
                Some(tool) => tool.arguments_for(argument),
                None => {
                    tracing::warn!(tool = name, "Unknown remote tool requested");
                    return format!("Unknown tool '{name}'");
                }
            },
            Err(e) => return format!("Tool runtime error: {}", e.detail()),
        };

        match connected.transport.call_tool(name, arguments).await {
            Ok(result) => {
                if result.is_error {
                    tracing::warn!(tool = name, "Remote tool reported an error");
                }
                result.first_text().to_string()
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Remote tool call failed");
                format!("Tool runtime error: {}", e.detail())
            }
        }
    }

    /// Release the channel. Safe to call when never connected.
    pub async fn close(&self) {
        let Some(mut connected) = self.state.lock().await.take() else {
            return;
        };
        match connected.transport.shutdown().await {
            Ok(()) => tracing::info!("Tool session closed"),
            Err(e) => tracing::warn!(error = %e, "Tool session teardown was incomplete"),
        }
    }
}

#[async_trait]
impl ToolSource for ToolSession {
    async fn list(&self) -> Result<ToolCatalog> {
        self.list_tools().await
    }

    async fn invoke(&self, name: &str, argument: &str) -> String {
        self.call_tool(name, argument).await
    }
}
