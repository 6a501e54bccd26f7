//! Client side of the MCP stdio transport.

use std::process::Stdio;
use std::time::Duration;

use agent_core::{
    AgentError, CallToolResult, RemoteTool, Result, ToolTransport, TransportConnector,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::protocol::{
    Implementation, InitializeResult, ListToolsResult, PROTOCOL_VERSION, Request, Response, methods,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// JSON-RPC client over any line-oriented byte stream pair
pub struct McpTransport<R, W> {
    lines: Lines<BufReader<R>>,
    /// Dropped on shutdown so the host sees end of input
    writer: Option<W>,
    next_id: u64,
    request_timeout: Duration,
    child: Option<Child>,
    stderr_task: Option<JoinHandle<()>>,
}

impl<R, W> McpTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            writer: Some(writer),
            next_id: 0,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            child: None,
            stderr_task: None,
        }
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Perform the `initialize` handshake and announce readiness
    pub async fn initialize(&mut self) -> Result<InitializeResult> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
        });
        let result: InitializeResult =
            serde_json::from_value(self.request(methods::INITIALIZE, Some(params)).await?)?;
        self.send(&Request::notification(methods::INITIALIZED)).await?;

        tracing::info!(
            server = %result.server_info.name,
            version = %result.server_info.version,
            protocol = %result.protocol_version,
            "Tool host initialized"
        );
        Ok(result)
    }

    async fn send(&mut self, message: &impl Serialize) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| AgentError::Transport("transport already shut down".into()))?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Send a request and wait for the response carrying its id
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;
        self.send(&Request::new(id, method, params)).await?;

        let timeout = self.request_timeout;
        tokio::time::timeout(timeout, self.await_response(id))
            .await
            .map_err(|_| AgentError::Transport(format!("timed out waiting for {method} after {timeout:?}")))?
    }

    async fn await_response(&mut self, id: u64) -> Result<Value> {
        loop {
            let line = self
                .lines
                .next_line()
                .await?
                .ok_or_else(|| AgentError::Transport("tool host closed the connection".into()))?;
            if line.trim().is_empty() {
                continue;
            }

            let message: Value = match serde_json::from_str(&line) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping non-JSON line from tool host");
                    continue;
                }
            };
            if message.get("method").is_some()
                || message.get("id").and_then(Value::as_u64) != Some(id)
            {
                tracing::debug!(%message, "Ignoring unrelated message from tool host");
                continue;
            }

            let response: Response = serde_json::from_value(message)?;
            if let Some(error) = response.error {
                return Err(AgentError::Remote {
                    code: error.code,
                    message: error.message,
                });
            }
            return Ok(response.result.unwrap_or(Value::Null));
        }
    }
}

impl McpTransport<ChildStdout, ChildStdin> {
    fn attach(mut self, child: Child, stderr: Option<ChildStderr>) -> Self {
        self.stderr_task = stderr.map(|stderr| tokio::spawn(forward_stderr(stderr)));
        self.child = Some(child);
        self
    }
}

#[async_trait]
impl<R, W> ToolTransport for McpTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn list_tools(&mut self) -> Result<Vec<RemoteTool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.take().map(|c| json!({ "cursor": c }));
            let page: ListToolsResult =
                serde_json::from_value(self.request(methods::TOOLS_LIST, params).await?)?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(tools)
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = self.request(methods::TOOLS_CALL, Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn shutdown(&mut self) -> Result<()> {
        let closed = match self.writer.take() {
            Some(mut writer) => writer.shutdown().await,
            None => Ok(()),
        };

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
                Ok(Ok(status)) => tracing::debug!(%status, "Tool host exited"),
                Ok(Err(e)) => tracing::warn!(error = %e, "Could not reap tool host"),
                Err(_) => {
                    tracing::warn!("Tool host did not exit in time, killing it");
                    child.kill().await?;
                }
            }
        }
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
        closed.map_err(AgentError::from)
    }
}

/// Relay the host's diagnostics into our log
async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => tracing::info!(target: "tool_host", "{line}"),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Tool host stderr closed");
                break;
            }
        }
    }
}

/// Spawns a tool host process and speaks MCP over its stdin/stdout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StdioConnector {
    program: String,
    args: Vec<String>,
    request_timeout: Duration,
}

impl StdioConnector {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Split a whitespace-separated command line into program and arguments.
    /// Quoting is not supported; use [`StdioConnector::new`] for paths or
    /// arguments containing spaces.
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| AgentError::Config("tool host command is empty".into()))?;
        Ok(Self::new(program, parts))
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[async_trait]
impl TransportConnector for StdioConnector {
    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn connect(&self) -> Result<Box<dyn ToolTransport>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Transport("tool host stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Transport("tool host stdout unavailable".into()))?;
        let stderr = child.stderr.take();

        let mut transport = McpTransport::new(stdout, stdin)
            .with_request_timeout(self.request_timeout)
            .attach(child, stderr);

        if let Err(e) = transport.initialize().await {
            if let Err(teardown) = transport.shutdown().await {
                tracing::debug!(error = %teardown, "Teardown after failed handshake");
            }
            return Err(e);
        }
        Ok(Box::new(transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let connector = StdioConnector::parse("  python  mcp_server.py --quiet ").unwrap();
        assert_eq!(connector.describe(), "python mcp_server.py --quiet");
        assert!(matches!(StdioConnector::parse("   "), Err(AgentError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_connect() {
        let connector = StdioConnector::new("definitely-not-a-real-tool-host", Vec::<String>::new());
        assert!(connector.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_skips_noise_and_matches_ids() {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_side);
        let mut transport = McpTransport::new(client_read, client_write);

        let server = tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(server_side);
            let mut lines = BufReader::new(read).lines();
            let request = lines.next_line().await.unwrap().unwrap();
            assert!(request.contains(r#""method":"ping""#));
            let noise = concat!(
                "starting up...\n",
                "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\",\"params\":{}}\n",
                "{\"jsonrpc\":\"2.0\",\"id\":99,\"result\":{}}\n",
                "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}\n",
            );
            write.write_all(noise.as_bytes()).await.unwrap();
        });

        let result = transport.request(methods::PING, None).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_stream_is_transport_error() {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_side);
        drop(server_side);
        let mut transport = McpTransport::new(client_read, client_write);

        let err = transport.list_tools().await.unwrap_err();
        assert!(matches!(err, AgentError::Transport(_) | AgentError::Io(_)));
    }

    #[tokio::test]
    async fn test_shutdown_closes_stdin_before_waiting() {
        let mut child = Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let stdin = child.stdin.take().unwrap();
        let stdout = child.stdout.take().unwrap();
        let stderr = child.stderr.take();
        let mut transport = McpTransport::new(stdout, stdin).attach(child, stderr);

        let started = std::time::Instant::now();
        transport.shutdown().await.unwrap();
        assert!(started.elapsed() < SHUTDOWN_GRACE / 2, "took {:?}", started.elapsed());

        let err = transport.request(methods::PING, None).await.unwrap_err();
        assert!(matches!(err, AgentError::Transport(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout() {
        let (client_side, _server_side) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_side);
        let mut transport =
            McpTransport::new(client_read, client_write).with_request_timeout(Duration::from_secs(1));

        let err = transport.request(methods::PING, None).await.unwrap_err();
        assert!(err.to_string().contains("timed out waiting for ping"));
    }
}
