//! qfault counting engine
//!
//! Counts, per fault order, the weighted fault configurations of a
//! fault-tolerance gadget that lead to each error key, and turns the counts
//! into rational-function bounds in the noise strength γ.
//!
//! # Core Components
//!
//! - **Keys**: [`Key`] and the syndrome key generators of [`key`]
//! - **Leaf counting**: [`leaf`], fault enumeration over physical locations
//! - **Key manipulation**: [`KeyOp`] and [`KeyPropagator`] for noiseless
//!   transformations and postselection
//! - **Convolution**: [`convolve`], combining independent fault counts
//! - **Components**: [`Component`], the tree that composes gadgets, with
//!   transversal, Bell-state and teleportation building blocks
//! - **Probability bounds**: [`probability`], `Pr[bad]`, `Pr[accept]` and
//!   tail bounds
//! - **Runtime**: [`RuntimeContext`] with its worker pool and result cache
//!
//! # Example: Counting a transversal CNOT
//!
//! ```rust
//! use std::sync::Arc;
//! use qfault_count::{Component, KGood, RuntimeContext};
//! use qfault_ir::{Code, ErrorType, NoiseModels};
//!
//! let code = Arc::new(Code::trivial());
//! let cnot = Component::trans_cnot(KGood::uniform(1), code.clone(), code).unwrap();
//!
//! let ctx = RuntimeContext::sequential();
//! let result = cnot.analyze(&ctx, &NoiseModels::depolarizing(), ErrorType::Y).unwrap();
//!
//! // 15 CNOT errors of weight 1 each.
//! assert_eq!(result.summed(), vec![1, 15]);
//! assert!(result.pr_bad_at(1e-3) < 1e-3);
//! ```

pub mod cache;
pub mod component;
pub mod config;
pub mod convolve;
pub mod error;
pub mod iteration;
pub mod key;
pub mod leaf;
pub mod manipulator;
pub mod probability;
pub mod result;
pub mod runtime;
pub mod tracing_config;

pub use cache::{CacheKey, CacheQuery, CountCache};
pub use component::{Component, ComponentKind, KGood, SyndromeAcceptor};
pub use config::{Config, LoggingConfig, RuntimeConfig};
pub use error::{CountError, CountingResult};
pub use key::{Key, KeyDecoder, MultiBlockKeyGenerator, SyndromeKeyGenerator};
pub use manipulator::{KeyOp, KeyPropagator};
pub use result::{CountResult, Counts};
pub use runtime::{RuntimeContext, RuntimeFlags};
pub use tracing_config::{TracingConfig, TracingFormat, init_default_tracing, init_tracing};
