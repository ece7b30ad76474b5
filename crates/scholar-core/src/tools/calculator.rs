//! Two-operand arithmetic calculator

use super::ToolError;

/// Evaluate `a <op> b` where `op` is one of `+ - * /`
///
/// Whitespace is ignored. The operator is the first `+`, `*` or `/`, or a
/// `-` that is not the sign of the first operand.
pub fn calculate(expression: &str) -> Result<f64, ToolError> {
    let compact: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
    let invalid = || ToolError::InvalidExpression(expression.trim().to_string());

    let (op_index, op) = compact
        .char_indices()
        .find(|&(i, c)| matches!(c, '+' | '*' | '/') || (c == '-' && i > 0))
        .ok_or_else(invalid)?;

    let lhs: f64 = compact[..op_index].parse().map_err(|_| invalid())?;
    let rhs: f64 = compact[op_index + 1..].parse().map_err(|_| invalid())?;

    match op {
        '+' => Ok(lhs + rhs),
        '-' => Ok(lhs - rhs),
        '*' => Ok(lhs * rhs),
        '/' if rhs == 0.0 => Err(ToolError::DivisionByZero),
        '/' => Ok(lhs / rhs),
        _ => Err(invalid()),
    }
}

/// Render a number without a trailing `.0` when it is integral
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let rendered = format!("{:.6}", value);
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
