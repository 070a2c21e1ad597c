//! Error types for the counting engine.

use qfault_ir::IrError;
use thiserror::Error;

/// Errors that can occur while building components or counting faults.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CountError {
    /// Error from the IR layer.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// Adjacent sequential children disagree on their block signature.
    #[error("Block mismatch between child {index} (out: {out_blocks}) and child {next} (in: {in_blocks})")]
    BlockMismatch {
        /// Index of the earlier child.
        index: usize,
        /// Index of the later child.
        next: usize,
        /// Output blocks of the earlier child.
        out_blocks: String,
        /// Input blocks of the later child.
        in_blocks: String,
    },

    /// Blocks that share a key generator have different parity checks.
    #[error("Parity check mismatch: {0}")]
    ParityCheckMismatch(String),

    /// Control and target of a transversal CNOT differ in length.
    #[error("Control ({ctrl}) and target ({targ}) block lengths do not match")]
    BlockLengthMismatch {
        /// Control block length.
        ctrl: usize,
        /// Target block length.
        targ: usize,
    },

    /// Two count tables cannot be convolved because their key layouts differ.
    #[error("Incompatible key lengths {left:?}, {right:?}")]
    IncompatibleKeyLengths {
        /// Key widths of the left table.
        left: Vec<usize>,
        /// Key widths of the right table.
        right: Vec<usize>,
    },

    /// A count result has the wrong number of blocks.
    #[error("Invalid result: expected {expected} blocks, got {got}")]
    InvalidResult {
        /// Expected number of blocks.
        expected: usize,
        /// Actual number of blocks (or key length).
        got: usize,
    },

    /// Requested fault order is beyond what a result holds.
    #[error("Fault order {k} out of range (k_max = {k_max})")]
    FaultOrderOutOfRange {
        /// Requested order.
        k: usize,
        /// Highest available order.
        k_max: usize,
    },

    /// A location refers to a block or bit the component does not have.
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// A noise model produced an outcome that cannot occur at the location.
    #[error("Outcome {error} is not a valid error at {location}")]
    UnknownOutcome {
        /// The location.
        location: String,
        /// The offending outcome.
        error: String,
    },

    /// Blocks that must share a code are encoded differently.
    #[error("Code mismatch: {0}")]
    CodeMismatch(String),

    /// Operation not supported for this input.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The result cache lock was poisoned by a panicking thread.
    #[error("Result cache poisoned")]
    CachePoisoned,

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Worker pool construction failed.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for counting operations.
pub type CountingResult<T> = Result<T, CountError>;
