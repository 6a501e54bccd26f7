//! Server side of the MCP stdio transport.
//!
//! Serves the tools of a [`ToolRegistry`] to one client over a line-oriented
//! byte stream pair, normally the process's own stdin and stdout.

use agent_core::{CallToolResult, ContentItem, RemoteTool, Result, ToolRegistry};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::protocol::{
    CallToolParams, Implementation, ListToolsResult, PROTOCOL_VERSION, Request, Response, RpcError,
    codes, methods,
};

pub struct McpServer {
    info: Implementation,
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>, registry: ToolRegistry) -> Self {
        Self {
            info: Implementation {
                name: name.into(),
                version: version.into(),
            },
            registry,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve on this process's stdin/stdout until the client hangs up
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve requests read from `reader` until end of stream
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(server = %self.info.name, tools = self.registry.len(), "Serving tools");

        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Client disconnected");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Option<Response> {
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable request");
                return Some(Response::failure(
                    Value::Null,
                    RpcError::new(codes::PARSE_ERROR, format!("Parse error: {e}")),
                ));
            }
        };

        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        };

        Some(match self.handle(&request.method, request.params).await {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error),
        })
    }

    async fn handle(&self, method: &str, params: Option<Value>) -> std::result::Result<Value, RpcError> {
        tracing::debug!(method, "Request received");
        match method {
            methods::INITIALIZE => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": self.info,
            })),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => to_value(&ListToolsResult {
                tools: self.advertised_tools(),
                next_cursor: None,
            }),
            methods::TOOLS_CALL => {
                let params: CallToolParams = params
                    .ok_or_else(|| RpcError::new(codes::INVALID_PARAMS, "Missing params"))
                    .and_then(|p| {
                        serde_json::from_value(p)
                            .map_err(|e| RpcError::new(codes::INVALID_PARAMS, e.to_string()))
                    })?;
                to_value(&self.call(&params).await)
            }
            other => Err(RpcError::new(
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }

    fn advertised_tools(&self) -> Vec<RemoteTool> {
        self.registry
            .catalog()
            .entries()
            .iter()
            .map(|entry| RemoteTool {
                name: entry.name.clone(),
                description: Some(entry.description.clone()),
                input_schema: Some(json!({
                    "type": "object",
                    "properties": { "input": { "type": "string" } },
                    "required": ["input"],
                })),
            })
            .collect()
    }

    async fn call(&self, params: &CallToolParams) -> CallToolResult {
        let argument = argument_text(&params.arguments);
        let (text, is_error) = match self.registry.execute(&params.name, &argument).await {
            None => (format!("Unknown tool '{}'", params.name), true),
            Some(Ok(output)) => (output, false),
            Some(Err(e)) => {
                tracing::warn!(tool = %params.name, error = %e, "Tool failed");
                (format!("Error executing tool {}: {}", params.name, e.detail()), true)
            }
        };
        CallToolResult {
            content: vec![ContentItem::text(text)],
            is_error,
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> std::result::Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::new(codes::INTERNAL_ERROR, e.to_string()))
}

/// Recover the single string argument from a call's argument object
fn argument_text(arguments: &Value) -> String {
    match arguments {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            let single = if map.len() == 1 { map.values().next() } else { None };
            match map.get("input").or(single) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => arguments.to_string(),
            }
        }
        other => other.to_string(),
    }
}
