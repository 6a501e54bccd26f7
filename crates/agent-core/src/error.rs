//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Item handed to the registry cannot be represented as a tool
    #[error("Unsupported tool kind: {0}")]
    UnsupportedToolKind(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Maximum iterations reached in reasoning loop
    #[error("Maximum iterations ({0}) reached without a final answer")]
    MaxIterations(usize),

    /// Model output was not a usable JSON step
    #[error("Could not parse LLM JSON: {message}\nRaw: {raw}")]
    Parse { message: String, raw: String },

    /// Remote tool session could not be established
    #[error("Session error: {0}")]
    Session(String),

    /// Remote tool channel failed mid-session
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote host answered with a protocol-level error
    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    pub fn parse(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Whether this error ends a reasoning run instead of becoming an observation
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::MaxIterations(_) | Self::Session(_) | Self::Config(_)
        )
    }

    /// Bare message without the variant prefix, for embedding in observations
    pub fn detail(&self) -> String {
        match self {
            Self::ToolExecution(msg)
            | Self::Transport(msg)
            | Self::Session(msg)
            | Self::Other(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::MaxIterations(n) => {
                format!("The agent gave up after {n} reasoning steps without an answer.")
            }
            Self::Parse { .. } => self.to_string(),
            Self::Session(msg) => format!("Could not start the tool host: {msg}"),
            Self::Config(msg) => format!("Invalid configuration: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = AgentError::parse("expected value at line 1 column 1", "not json");
        let text = err.to_string();
        assert!(text.starts_with("Could not parse LLM JSON: "));
        assert!(text.ends_with("\nRaw: not json"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_recoverable_errors_are_not_fatal() {
        assert!(!AgentError::ToolExecution("boom".into()).is_fatal());
        assert!(!AgentError::Transport("closed".into()).is_fatal());
        assert!(AgentError::Session("spawn failed".into()).is_fatal());
    }

    #[test]
    fn test_user_message() {
        let parse = AgentError::parse("eof", "not json");
        assert_eq!(parse.user_message(), parse.to_string());
        assert_eq!(
            AgentError::MaxIterations(3).user_message(),
            "The agent gave up after 3 reasoning steps without an answer."
        );
        assert!(AgentError::Session("spawn failed".into())
            .user_message()
            .ends_with("spawn failed"));
    }
}
