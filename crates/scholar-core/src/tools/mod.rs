//! Deterministic tools used by specialists before consulting the model
//!
//! - [`calculate`]: two-operand arithmetic
//! - [`solve_equation`]: single-variable polynomial equations (degree ≤ 2)
//! - [`get_constant`]: physical constant lookup
//! - [`ScenarioSimulator`]: model-backed description of a physics scenario

mod calculator;
mod constants;
mod equation;
mod simulator;

use thiserror::Error;

pub use calculator::{calculate, format_number};
pub use constants::{PHYSICAL_CONSTANTS, PhysicalConstant, find_constant_in, get_constant};
pub use equation::solve_equation;
pub use simulator::ScenarioSimulator;

/// A deterministic tool rejected its input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Could not solve equation '{equation}'. {reason}")]
    Unsolvable { equation: String, reason: String },

    #[error("Constant '{0}' not found")]
    UnknownConstant(String),
}
