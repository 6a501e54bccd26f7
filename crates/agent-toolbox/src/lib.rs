//! # agent-toolbox
//!
//! Demo tools for the ReAct agent, usable in-process through a
//! [`ToolRegistry`](agent_core::ToolRegistry) or remotely through the
//! `tool-host` binary, which serves them over MCP stdio.
//!
//! | tool               | input                                         |
//! |--------------------|-----------------------------------------------|
//! | `basic_calculator` | `{"num1": 5, "num2": 3, "operation": "add"}`  |
//! | `get_weather`      | a city name                                   |
//! | `greeting`         | a name                                        |

pub mod bundle;
pub mod error;
pub mod svckit;
pub mod weather;

pub use bundle::DemoTools;
pub use error::{Result, ToolboxError};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{BasicCalculatorTool, GreetingTool, WeatherTool};
}
