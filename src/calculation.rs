use crate::error::OperationError;
use crate::operations::Operation;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One committed calculation. Records are never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calculation {
    operation: Operation,
    operand_a: Decimal,
    operand_b: Decimal,
    result: Decimal,
    timestamp: DateTime<Utc>,
}

impl Calculation {
    /// Evaluate `operation` and capture the outcome, rounding the result to `precision` places
    pub fn compute(
        operation: Operation,
        operand_a: Decimal,
        operand_b: Decimal,
        precision: u32,
    ) -> Result<Self, OperationError> {
        let result = operation.apply(operand_a, operand_b)?;
        let result = result
            .round_dp_with_strategy(precision, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            .normalize();

        Ok(Self::from_parts(operation, operand_a, operand_b, result, Utc::now()))
    }

    pub fn from_parts(
        operation: Operation,
        operand_a: Decimal,
        operand_b: Decimal,
        result: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            operation,
            operand_a,
            operand_b,
            result,
            timestamp,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn operand_a(&self) -> Decimal {
        self.operand_a
    }

    pub fn operand_b(&self) -> Decimal {
        self.operand_b
    }

    pub fn result(&self) -> Decimal {
        self.result
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {}) = {}",
            self.operation, self.operand_a, self.operand_b, self.result
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_compute_and_display() {
        let calc = Calculation::compute(Operation::Add, dec("2"), dec("3"), 10).unwrap();
        assert_eq!(calc.result(), dec("5"));
        assert_eq!(calc.to_string(), "add(2, 3) = 5");
    }

    #[test]
    fn test_operands_keep_their_scale() {
        let calc = Calculation::compute(Operation::Multiply, dec("2.50"), dec("2"), 10).unwrap();
        assert_eq!(calc.to_string(), "multiply(2.50, 2) = 5");
    }

    #[test]
    fn test_result_is_rounded() {
        let calc = Calculation::compute(Operation::Divide, dec("2"), dec("3"), 4).unwrap();
        assert_eq!(calc.result().to_string(), "0.6667");
    }

    #[test]
    fn test_failed_compute() {
        let err = Calculation::compute(Operation::Divide, dec("1"), dec("0"), 10).unwrap_err();
        assert_eq!(err, OperationError::DivisionByZero);
    }
}
