//! Runtime fault types.
//!
//! Every fault in this runtime is fatal at the generated-code boundary; the
//! `Display` form of a variant is exactly the diagnostic printed before the
//! process terminates. Carrying the faults as values first keeps the core
//! operations testable without tearing the test process down.

use derive_more::{Display, Error};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// Allocation failed during construction or growth.
    #[display("Out of memory")]
    OutOfMemory,

    /// Index-based access past the live elements of an array.
    #[display("Array index out of bounds")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Slice bounds are inverted or reach past the array's length.
    #[display("Invalid slice range")]
    InvalidSliceRange { start: usize, end: usize, length: usize },

    /// Concatenation of arrays with different element widths.
    #[display("Cannot concat arrays of different types")]
    ElementSizeMismatch { left: usize, right: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_boundary_diagnostics() {
        assert_eq!(RuntimeError::OutOfMemory.to_string(), "Out of memory");
        assert_eq!(
            RuntimeError::IndexOutOfBounds { index: 5, length: 5 }.to_string(),
            "Array index out of bounds"
        );
        assert_eq!(
            RuntimeError::InvalidSliceRange { start: 3, end: 1, length: 4 }.to_string(),
            "Invalid slice range"
        );
        assert_eq!(
            RuntimeError::ElementSizeMismatch { left: 4, right: 8 }.to_string(),
            "Cannot concat arrays of different types"
        );
    }
}
