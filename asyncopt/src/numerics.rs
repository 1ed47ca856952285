//! Dense linear algebra and least-squares surface fitting for the
//! asynchronous Newton method.

pub mod matrix;
pub mod regression;

use std::error::Error;
use std::fmt;

/// An error raised by the numerical routines.
#[derive(Debug, PartialEq, Eq)]
pub enum NumericsError {
    /// A matrix to be decomposed or inverted was singular (or so
    /// close to singular that no pivot exceeded the tolerance).
    SingularMatrix,
    /// Operand dimensions were incompatible.
    DimensionMismatch,
    /// Fewer sample points than the quadratic fit has coefficients.
    InsufficientSamples { needed: usize, provided: usize },
}

impl fmt::Display for NumericsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingularMatrix => write!(f, "matrix is singular and cannot be inverted"),
            Self::DimensionMismatch => write!(f, "operand dimensions are incompatible"),
            Self::InsufficientSamples { needed, provided } => write!(
                f,
                "quadratic fit needs at least {} sample points, only {} provided",
                needed, provided
            ),
        }
    }
}

impl Error for NumericsError {}
