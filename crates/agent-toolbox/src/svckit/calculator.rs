//! Basic Calculator Tool
//!
//! Applies one binary operation to two numbers given as a JSON object string,
//! e.g. `{"num1": 5, "num2": 3, "operation": "add"}`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Number;

use agent_core::{Result as CoreResult, Tool};

use crate::error::{Result, ToolboxError};

pub const NAME: &str = "basic_calculator";

const DESCRIPTION: &str = r#"Perform a numeric operation on two numbers.
Input: a JSON object string with keys "num1", "num2" and "operation", e.g. {"num1": 5, "num2": 3, "operation": "add"}.
Operations: add, subtract, multiply, divide, floor_divide, modulus, power, lt, le, eq, ne, ge, gt.
Returns the formatted result of the operation."#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulus,
    Power,
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl std::str::FromStr for Operation {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "add" => Self::Add,
            "subtract" => Self::Subtract,
            "multiply" => Self::Multiply,
            "divide" => Self::Divide,
            "floor_divide" => Self::FloorDivide,
            "modulus" => Self::Modulus,
            "power" => Self::Power,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "ge" => Self::Ge,
            "gt" => Self::Gt,
            other => return Err(ToolboxError::UnsupportedOperation(other.to_string())),
        })
    }
}

/// Integers stay exact until an operation needs a fraction
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    fn from_number(n: &Number) -> Result<Self> {
        if let Some(i) = n.as_i64() {
            return Ok(Self::Int(i));
        }
        n.as_f64()
            .map(Self::Float)
            .ok_or_else(|| ToolboxError::InvalidInput(format!("{n} is not a usable number")))
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
            Self::Bool(b) => if b { 1.0 } else { 0.0 },
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
        }
    }
}

#[derive(Deserialize)]
struct Request {
    num1: Number,
    num2: Number,
    operation: String,
}

/// Parse the tool argument, tolerating single quotes and stray wrapping quotes
fn parse_request(input: &str) -> Result<(Value, Value, Operation)> {
    let cleaned = input.replace('\'', "\"");
    let cleaned = cleaned.trim().trim_matches('"');
    let request: Request =
        serde_json::from_str(cleaned).map_err(|e| ToolboxError::InvalidInput(e.to_string()))?;
    Ok((
        Value::from_number(&request.num1)?,
        Value::from_number(&request.num2)?,
        request.operation.parse()?,
    ))
}

pub fn evaluate(a: Value, b: Value, op: Operation) -> Result<Value> {
    use Value::{Bool, Float, Int};

    let overflow = || ToolboxError::Overflow(format!("{op:?}").to_lowercase());
    let (x, y) = (a.as_f64(), b.as_f64());

    Ok(match (op, a, b) {
        (Operation::Add, Int(i), Int(j)) => Int(i.checked_add(j).ok_or_else(overflow)?),
        (Operation::Subtract, Int(i), Int(j)) => Int(i.checked_sub(j).ok_or_else(overflow)?),
        (Operation::Multiply, Int(i), Int(j)) => Int(i.checked_mul(j).ok_or_else(overflow)?),
        (Operation::Add, ..) => Float(x + y),
        (Operation::Subtract, ..) => Float(x - y),
        (Operation::Multiply, ..) => Float(x * y),

        (Operation::Divide | Operation::FloorDivide | Operation::Modulus, ..) if y == 0.0 => {
            return Err(ToolboxError::DivisionByZero);
        }
        (Operation::Divide, ..) => Float(x / y),
        (Operation::FloorDivide, Int(i), Int(j)) => {
            let q = i.checked_div(j).ok_or_else(overflow)?;
            Int(if i % j != 0 && (i < 0) != (j < 0) { q - 1 } else { q })
        }
        (Operation::FloorDivide, ..) => Float((x / y).floor()),
        (Operation::Modulus, Int(i), Int(j)) => {
            let r = i.checked_rem(j).ok_or_else(overflow)?;
            Int(if r != 0 && (r < 0) != (j < 0) { r + j } else { r })
        }
        (Operation::Modulus, ..) => Float(x - y * (x / y).floor()),

        (Operation::Power, Int(i), Int(j)) if j >= 0 => {
            let exp = u32::try_from(j).map_err(|_| overflow())?;
            Int(i.checked_pow(exp).ok_or_else(overflow)?)
        }
        (Operation::Power, ..) => Float(x.powf(y)),

        (Operation::Lt, ..) => Bool(x < y),
        (Operation::Le, ..) => Bool(x <= y),
        (Operation::Eq, ..) => Bool(x == y),
        (Operation::Ne, ..) => Bool(x != y),
        (Operation::Ge, ..) => Bool(x >= y),
        (Operation::Gt, ..) => Bool(x > y),
    })
}

pub fn calculate(input: &str) -> Result<String> {
    let (a, b, op) = parse_request(input)?;
    let result = evaluate(a, b, op)?;
    Ok(format!("\n\nThe answer is: {result}.\nCalculated with {NAME}."))
}

pub struct BasicCalculatorTool;

#[async_trait]
impl Tool for BasicCalculatorTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, argument: &str) -> CoreResult<String> {
        Ok(calculate(argument)?)
    }
}
