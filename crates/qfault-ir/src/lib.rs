//! qfault intermediate representation
//!
//! This crate describes *what* is being counted: the circuits, the codes their
//! blocks are encoded in, the Pauli errors that can occur and the noise models
//! that weight them. The counting engine itself lives in `qfault-count`.
//!
//! # Core Components
//!
//! - **Bit strings**: [`Bits`] for syndromes, keys and symplectic error parts
//!   of any width
//! - **Pauli errors**: [`Pauli`] and [`PauliError`] in symplectic form
//! - **Locations**: [`Location`] and [`Locations`], the primitive gate set
//!   `{|0>, |+>, rest, CNOT, X/Z measurement}` addressed by `(block, bit)`
//! - **Codes**: [`Code`] (trivial, [[4,2,2]], Golay, explicit, stabilizer
//!   states, concatenations) and named [`Block`]s
//! - **Golay decoder**: [`golay::GOLAY`], the table-driven classical decoder
//! - **Symbolic arithmetic**: [`Polynomial`] and [`RationalFunction`] in the
//!   noise strength γ
//! - **Noise models**: the [`NoiseModel`] contract and its concrete models
//!
//! # Example: Correcting an error
//!
//! ```rust
//! use std::sync::Arc;
//! use qfault_ir::{Basis, Block, Code, PauliError};
//!
//! let code = Arc::new(Code::ed422(None));
//! let block = Block::new("data", code.clone());
//! assert_eq!(block.len(), 4);
//!
//! // A weight-one error is detected but (distance 2) not corrected.
//! let e: PauliError = "IXII".parse().unwrap();
//! assert!(code.detect_error(&e));
//!
//! // |0> encoded in the [[4,2,2]] code has the logical Z in its stabilizer.
//! let zero = Code::state(code, vec![Basis::Z]).unwrap();
//! assert_eq!(zero.stabilizer_generators().len(), 3);
//! ```
//!
//! # Example: Noise models
//!
//! ```rust
//! use qfault_ir::{Bound, LocationType, MarginalNoiseModel, ErrorType, NoiseModel};
//!
//! let model = MarginalNoiseModel::new(ErrorType::X);
//! // Three X errors at a CNOT, weight 4 each.
//! let pr = model.pr_fail(LocationType::Cnot, Bound::Upper);
//! assert!((pr.eval(0.001) - 0.012).abs() < 1e-12);
//! ```

pub mod bits;
pub mod block;
pub mod code;
pub mod error;
pub mod golay;
pub mod location;
pub mod noise;
pub mod pauli;
pub mod poly;
pub mod weight;

pub use bits::Bits;
pub use block::Block;
pub use code::{Code, ExplicitCode, LogicalOperator, StabilizerState};
pub use error::{IrError, IrResult};
pub use location::{Basis, Location, LocationTotals, LocationType, Locations};
pub use noise::{
    Bound, CountingNoiseModel, DepolarizingNoiseModel, ErrorType, MarginalNoiseModel,
    NoiseModel, NoiseModels, SharedNoiseModel, TransformedNoiseModel, ZeroNoiseModel,
};
pub use pauli::{Pauli, PauliError};
pub use poly::{Polynomial, RationalFunction};
pub use weight::Weight;
