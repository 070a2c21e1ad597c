//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building codes and errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Two operands that must have the same length do not.
    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch {
        /// Expected length.
        left: usize,
        /// Actual length.
        right: usize,
    },

    /// A character that is not one of `I`, `X`, `Y`, `Z`.
    #[error("Invalid Pauli symbol '{0}'")]
    InvalidPauli(char),

    /// A stabilizer state must fix exactly one logical type per logical qubit.
    #[error("Number of logical operators ({got}) does not match k={expected}")]
    LogicalCountMismatch {
        /// Number of logical qubits of the code.
        expected: usize,
        /// Number of logical types given.
        got: usize,
    },

    /// Concatenation level beyond the code's own level.
    #[error("Level {level} out of range (code has {max} levels)")]
    LevelOutOfRange {
        /// Requested level.
        level: usize,
        /// Highest available level.
        max: usize,
    },

    /// Operation not supported for this code.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
