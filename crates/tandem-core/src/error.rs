//! Error types for fixed-point arithmetic.

use std::error::Error;
use std::fmt;

/// An invalid fixed-point operation.
///
/// Fatal to the operation that produced it, never to the process. Callers
/// that cannot meaningfully continue propagate it with `?`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticError {
    /// The divisor was zero.
    DivisionByZero,
    /// The exact result does not fit in the Q16.16 range.
    Overflow,
}

impl fmt::Display for ArithmeticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "fixed-point division by zero"),
            Self::Overflow => write!(f, "fixed-point result out of range"),
        }
    }
}

impl Error for ArithmeticError {}
