use crate::error::{AbacusError, AbacusResult, OperationError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The arithmetic operations understood by the calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Root,
    Modulus,
    IntDivide,
    Percent,
    AbsDiff,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Power,
        Operation::Root,
        Operation::Modulus,
        Operation::IntDivide,
        Operation::Percent,
        Operation::AbsDiff,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Power => "power",
            Operation::Root => "root",
            Operation::Modulus => "modulus",
            Operation::IntDivide => "int_divide",
            Operation::Percent => "percent",
            Operation::AbsDiff => "abs_diff",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::Add => "Sum of a and b",
            Operation::Subtract => "Difference a - b",
            Operation::Multiply => "Product of a and b",
            Operation::Divide => "Quotient a / b",
            Operation::Power => "a raised to the power b",
            Operation::Root => "The b-th root of a",
            Operation::Modulus => "Remainder of a / b",
            Operation::IntDivide => "Quotient a / b truncated toward zero",
            Operation::Percent => "a as a percentage of b",
            Operation::AbsDiff => "Absolute difference |a - b|",
        }
    }

    /// Evaluate the operation on two already-parsed operands
    pub fn apply(&self, a: Decimal, b: Decimal) -> Result<Decimal, OperationError> {
        let overflow = || OperationError::overflow(self.name());

        match self {
            Operation::Add => a.checked_add(b).ok_or_else(overflow),
            Operation::Subtract => a.checked_sub(b).ok_or_else(overflow),
            Operation::Multiply => a.checked_mul(b).ok_or_else(overflow),
            Operation::Divide => {
                ensure_nonzero(b)?;
                a.checked_div(b).ok_or_else(overflow)
            }
            Operation::Power => power(a, b),
            Operation::Root => root(a, b),
            Operation::Modulus => {
                ensure_nonzero(b)?;
                a.checked_rem(b).ok_or_else(overflow)
            }
            Operation::IntDivide => {
                ensure_nonzero(b)?;
                a.checked_div(b).map(|q| q.trunc()).ok_or_else(overflow)
            }
            Operation::Percent => {
                ensure_nonzero(b)?;
                a.checked_div(b)
                    .and_then(|q| q.checked_mul(Decimal::ONE_HUNDRED))
                    .ok_or_else(overflow)
            }
            Operation::AbsDiff => a.checked_sub(b).map(|d| d.abs()).ok_or_else(overflow),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.name() == wanted)
            .ok_or_else(|| OperationError::unknown_operation(s.trim()))
    }
}

/// Map a command name to its operation
pub fn create_operation(name: &str) -> Result<Operation, OperationError> {
    name.parse()
}

fn ensure_nonzero(divisor: Decimal) -> Result<(), OperationError> {
    if divisor.is_zero() {
        Err(OperationError::DivisionByZero)
    } else {
        Ok(())
    }
}

fn is_integer(value: Decimal) -> bool {
    value.fract().is_zero()
}

fn power(base: Decimal, exponent: Decimal) -> Result<Decimal, OperationError> {
    let overflow = || OperationError::overflow("power");

    if base.is_zero() && exponent.is_sign_negative() && !exponent.is_zero() {
        return Err(OperationError::invalid_power(
            "zero cannot be raised to a negative power",
        ));
    }

    if is_integer(exponent) {
        let exp = exponent.to_i64().ok_or_else(overflow)?;
        if exp >= 0 {
            return base.checked_powi(exp).ok_or_else(overflow);
        }
        let positive = exp.checked_neg().ok_or_else(overflow)?;
        return match base.checked_powi(positive) {
            Some(denominator) => Decimal::ONE.checked_div(denominator).ok_or_else(overflow),
            // |base| > 1 and the magnitude left the decimal range: the reciprocal
            // is below 1e-28 and rounds to zero at every precision.
            None if base.abs() > Decimal::ONE => Ok(Decimal::ZERO),
            None => Err(overflow()),
        };
    }

    if base.is_sign_negative() && !base.is_zero() {
        return Err(OperationError::invalid_power(
            "a negative base has no real fractional power",
        ));
    }
    if base.is_zero() {
        return Ok(Decimal::ZERO);
    }
    base.checked_powd(exponent).ok_or_else(overflow)
}

fn root(radicand: Decimal, degree: Decimal) -> Result<Decimal, OperationError> {
    if degree.is_zero() {
        return Err(OperationError::invalid_root("root degree cannot be zero"));
    }

    let negative = radicand.is_sign_negative() && !radicand.is_zero();
    if negative {
        if !is_integer(degree) {
            return Err(OperationError::invalid_root(
                "a negative number has no real fractional root",
            ));
        }
        let even = degree
            .checked_rem(Decimal::TWO)
            .map(|r| r.is_zero())
            .unwrap_or(false);
        if even {
            return Err(OperationError::invalid_root(
                "a negative number has no real even root",
            ));
        }
    }

    if radicand.is_zero() {
        if degree.is_sign_negative() {
            return Err(OperationError::DivisionByZero);
        }
        return Ok(Decimal::ZERO);
    }

    let magnitude = positive_root(radicand.abs(), degree)?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Root of a positive radicand, snapped to an exact value when one exists
fn positive_root(radicand: Decimal, degree: Decimal) -> Result<Decimal, OperationError> {
    let overflow = || OperationError::overflow("root");

    let approx = if degree == Decimal::TWO {
        radicand.sqrt().ok_or_else(overflow)?
    } else {
        let inverse = Decimal::ONE.checked_div(degree).ok_or_else(overflow)?;
        radicand.checked_powd(inverse).ok_or_else(overflow)?
    };

    if let Some(n) = degree.to_i64().filter(|_| is_integer(degree) && degree > Decimal::ZERO) {
        for places in 0..=12 {
            let candidate = approx.round_dp(places);
            if candidate.checked_powi(n) == Some(radicand) {
                return Ok(candidate);
            }
        }
    }

    Ok(approx)
}

/// Converts raw operand text into decimals, enforcing the configured magnitude bound
#[derive(Debug, Clone)]
pub struct InputValidator {
    max_input_value: Decimal,
}

impl InputValidator {
    pub fn new(max_input_value: Decimal) -> Self {
        Self {
            max_input_value: max_input_value.abs(),
        }
    }

    pub fn max_input_value(&self) -> Decimal {
        self.max_input_value
    }

    pub fn parse(&self, raw: &str) -> AbacusResult<Decimal> {
        let value = parse_decimal(raw)?;
        if value.abs() > self.max_input_value {
            return Err(AbacusError::validation(
                raw.trim(),
                format!("value exceeds maximum allowed magnitude {}", self.max_input_value),
            ));
        }
        Ok(value)
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(Decimal::from(1_000_000_000_000_000i64))
    }
}

/// Parse a decimal literal, accepting scientific notation
pub fn parse_decimal(raw: &str) -> AbacusResult<Decimal> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AbacusError::validation(raw, "no number given"));
    }

    let lowered = text.to_ascii_lowercase();
    let bare = lowered.trim_start_matches(['+', '-']);
    if matches!(bare, "nan" | "inf" | "infinity") {
        return Err(AbacusError::validation(text, "value must be finite"));
    }

    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| AbacusError::validation(text, e.to_string()))
}
