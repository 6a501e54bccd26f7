//! Error Types for the Demo Tools

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolboxError>;

#[derive(Error, Debug)]
pub enum ToolboxError {
    #[error("Invalid input format: {0}")]
    InvalidInput(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result of {0} is out of range")]
    Overflow(String),

    #[error("Weather service error: {0}")]
    Weather(String),

    #[error("No weather data for {0}")]
    NoWeatherData(String),
}

impl From<ToolboxError> for AgentError {
    fn from(err: ToolboxError) -> Self {
        Self::ToolExecution(err.to_string())
    }
}

impl From<reqwest::Error> for ToolboxError {
    fn from(err: reqwest::Error) -> Self {
        Self::Weather(err.to_string())
    }
}
