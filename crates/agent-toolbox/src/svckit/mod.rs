//! Service Kit - Agent Tools
//!
//! Demo tools implementing `agent_core::Tool`.

pub mod calculator;
pub mod greeting;
pub mod weather;

pub use calculator::BasicCalculatorTool;
pub use greeting::GreetingTool;
pub use weather::WeatherTool;
