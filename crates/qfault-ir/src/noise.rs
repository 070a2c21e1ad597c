//! Noise models.
//!
//! A noise model says which Pauli errors can occur at each location type and
//! how each is weighted. The probability of a particular error is bounded by
//! `weight · likelihood(γ)`; the probability that a location fails at all is
//! `Σ weights · γ`.
//!
//! # Error lists
//!
//! | Location | X | Z | XZ |
//! |----------|---|---|----|
//! | `prepZ`, `measZ` | X | – | X |
//! | `prepX`, `measX` | – | Z | Z |
//! | `rest` | X | Z | X, Z, Y |
//! | `cnot` | IX, XI, XX | IZ, ZI, ZZ | all 15 non-identity |
//!
//! Two-qubit errors list the control first.

use std::fmt;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::location::LocationType;
use crate::pauli::{Pauli, PauliError};
use crate::poly::{Polynomial, RationalFunction};
use crate::weight::Weight;

/// Which side of a bound is being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bound {
    /// Upper bound.
    Upper,
    /// Lower bound.
    Lower,
}

impl Bound {
    /// The opposite bound.
    pub fn flip(self) -> Self {
        match self {
            Bound::Upper => Bound::Lower,
            Bound::Lower => Bound::Upper,
        }
    }
}

/// The error type being counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorType {
    /// X errors only.
    X,
    /// Z errors only.
    Z,
    /// X and Z errors together.
    Y,
}

impl ErrorType {
    /// Every error type.
    pub const ALL: [ErrorType; 3] = [ErrorType::X, ErrorType::Z, ErrorType::Y];

    /// The matching single-qubit Pauli.
    pub fn pauli(self) -> Pauli {
        match self {
            ErrorType::X => Pauli::X,
            ErrorType::Z => Pauli::Z,
            ErrorType::Y => Pauli::Y,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pauli())
    }
}

// ---------------------------------------------------------------------------
// Error lists
// ---------------------------------------------------------------------------

type ErrorTable = Vec<Vec<PauliError>>;

fn table(entries: &[(LocationType, &[&str])]) -> ErrorTable {
    let mut t = vec![Vec::new(); LocationType::ALL.len()];
    for (kind, errors) in entries {
        t[kind.index()] = errors
            .iter()
            .map(|s| {
                let paulis: Vec<Pauli> = s
                    .chars()
                    .map(|c| match c {
                        'X' => Pauli::X,
                        'Z' => Pauli::Z,
                        'Y' => Pauli::Y,
                        _ => Pauli::I,
                    })
                    .collect();
                let mut e = PauliError::identity(paulis.len());
                for (q, p) in paulis.into_iter().enumerate() {
                    e.set(q, p);
                }
                e
            })
            .collect();
    }
    t
}

static ERRORS_X: LazyLock<ErrorTable> = LazyLock::new(|| {
    table(&[
        (LocationType::PrepZ, &["X"]),
        (LocationType::MeasZ, &["X"]),
        (LocationType::Rest, &["X"]),
        (LocationType::Cnot, &["IX", "XI", "XX"]),
    ])
});

static ERRORS_Z: LazyLock<ErrorTable> = LazyLock::new(|| {
    table(&[
        (LocationType::PrepX, &["Z"]),
        (LocationType::MeasX, &["Z"]),
        (LocationType::Rest, &["Z"]),
        (LocationType::Cnot, &["IZ", "ZI", "ZZ"]),
    ])
});

static ERRORS_XZ: LazyLock<ErrorTable> = LazyLock::new(|| {
    table(&[
        (LocationType::PrepZ, &["X"]),
        (LocationType::MeasZ, &["X"]),
        (LocationType::PrepX, &["Z"]),
        (LocationType::MeasX, &["Z"]),
        (LocationType::Rest, &["X", "Z", "Y"]),
        (
            LocationType::Cnot,
            &[
                "IX", "IZ", "IY", "XI", "XX", "XZ", "XY", "ZI", "ZX", "ZZ", "ZY", "YI", "YX",
                "YZ", "YY",
            ],
        ),
    ])
});

/// X errors that can occur at a location of the given type.
pub fn error_list_x(kind: LocationType) -> &'static [PauliError] {
    &ERRORS_X[kind.index()]
}

/// Z errors that can occur at a location of the given type.
pub fn error_list_z(kind: LocationType) -> &'static [PauliError] {
    &ERRORS_Z[kind.index()]
}

/// All Pauli errors that can occur at a location of the given type.
pub fn error_list_xz(kind: LocationType) -> &'static [PauliError] {
    &ERRORS_XZ[kind.index()]
}

/// The error list for an error type.
pub fn error_list(error_type: ErrorType, kind: LocationType) -> &'static [PauliError] {
    match error_type {
        ErrorType::X => error_list_x(kind),
        ErrorType::Z => error_list_z(kind),
        ErrorType::Y => error_list_xz(kind),
    }
}

// ---------------------------------------------------------------------------
// Noise model contract
// ---------------------------------------------------------------------------

/// A depolarizing-style noise model.
pub trait NoiseModel: fmt::Debug + Send + Sync {
    /// Weight type produced by [`NoiseModel::weight`].
    type Weight: Weight;

    /// Errors that occur with non-zero probability at `kind`.
    fn error_list(&self, kind: LocationType) -> &[PauliError];

    /// Weight of `error` at a location of type `kind`.
    fn weight(&self, kind: LocationType, error: &PauliError, bound: Bound) -> Self::Weight;

    /// Per-fault likelihood factor.
    fn likelihood(&self, bound: Bound) -> RationalFunction;

    /// Short text that identifies the model in cache keys and logs.
    fn descriptor(&self) -> String;

    /// Probability that a location of type `kind` fails.
    fn pr_fail(&self, kind: LocationType, bound: Bound) -> RationalFunction {
        let total = self
            .error_list(kind)
            .iter()
            .fold(RationalFunction::zero(), |acc, e| {
                &acc + &self.weight(kind, e, bound).to_rational()
            });
        &total * &RationalFunction::x()
    }

    /// Probability that a location of type `kind` acts ideally.
    fn pr_ideal(&self, kind: LocationType, bound: Bound) -> RationalFunction {
        &RationalFunction::one() - &self.pr_fail(kind, bound.flip())
    }
}

/// A shared noise model.
pub type SharedNoiseModel<W> = Arc<dyn NoiseModel<Weight = W>>;

/// One noise model per error type.
#[derive(Debug, Clone)]
pub struct NoiseModels<W: Weight> {
    x: SharedNoiseModel<W>,
    z: SharedNoiseModel<W>,
    y: SharedNoiseModel<W>,
}

impl<W: Weight> NoiseModels<W> {
    /// Group three models.
    pub fn new(x: SharedNoiseModel<W>, z: SharedNoiseModel<W>, y: SharedNoiseModel<W>) -> Self {
        Self { x, z, y }
    }

    /// The model for `error_type`.
    pub fn get(&self, error_type: ErrorType) -> &SharedNoiseModel<W> {
        match error_type {
            ErrorType::X => &self.x,
            ErrorType::Z => &self.z,
            ErrorType::Y => &self.y,
        }
    }

    /// Descriptor of all three models.
    pub fn descriptor(&self) -> String {
        format!(
            "{}|{}|{}",
            self.x.descriptor(),
            self.z.descriptor(),
            self.y.descriptor()
        )
    }
}

impl NoiseModels<u64> {
    /// Counting models (every error has weight 1).
    pub fn counting() -> Self {
        Self::new(
            Arc::new(CountingNoiseModel::new(ErrorType::X)),
            Arc::new(CountingNoiseModel::new(ErrorType::Z)),
            Arc::new(CountingNoiseModel::new(ErrorType::Y)),
        )
    }

    /// Marginal X/Z models with the depolarizing XZ model.
    pub fn depolarizing() -> Self {
        Self::new(
            Arc::new(MarginalNoiseModel::new(ErrorType::X)),
            Arc::new(MarginalNoiseModel::new(ErrorType::Z)),
            Arc::new(DepolarizingNoiseModel),
        )
    }

    /// The noiseless models.
    pub fn zero() -> Self {
        Self::new(
            Arc::new(ZeroNoiseModel),
            Arc::new(ZeroNoiseModel),
            Arc::new(ZeroNoiseModel),
        )
    }
}

// ---------------------------------------------------------------------------
// Concrete models
// ---------------------------------------------------------------------------

/// `γ / (1 − c·γ)`.
fn gamma_over(c: f64) -> RationalFunction {
    RationalFunction::over_linear(Polynomial::x(), c, 1)
}

/// Every error has weight 1 and likelihood `1 / (1 − γ)`.
#[derive(Debug, Clone, Copy)]
pub struct CountingNoiseModel {
    error_type: ErrorType,
}

impl CountingNoiseModel {
    /// Counting model for the given error type.
    pub fn new(error_type: ErrorType) -> Self {
        Self { error_type }
    }
}

impl NoiseModel for CountingNoiseModel {
    type Weight = u64;

    fn error_list(&self, kind: LocationType) -> &[PauliError] {
        error_list(self.error_type, kind)
    }

    fn weight(&self, _kind: LocationType, _error: &PauliError, _bound: Bound) -> u64 {
        1
    }

    fn likelihood(&self, _bound: Bound) -> RationalFunction {
        RationalFunction::over_linear(Polynomial::constant(1.0), 1.0, 1)
    }

    fn descriptor(&self) -> String {
        format!("counting-{}", self.error_type)
    }
}

/// Marginal model for X (or Z) errors considered independently.
///
/// Rest locations weigh 8, everything else 4. Likelihood `γ / (1 − 12γ)` for
/// upper bounds and `γ / (1 − 4γ)` for lower bounds.
#[derive(Debug, Clone, Copy)]
pub struct MarginalNoiseModel {
    error_type: ErrorType,
}

impl MarginalNoiseModel {
    /// Marginal model for `X` or `Z`. A `Y` request counts both.
    pub fn new(error_type: ErrorType) -> Self {
        Self { error_type }
    }
}

impl NoiseModel for MarginalNoiseModel {
    type Weight = u64;

    fn error_list(&self, kind: LocationType) -> &[PauliError] {
        error_list(self.error_type, kind)
    }

    fn weight(&self, kind: LocationType, _error: &PauliError, _bound: Bound) -> u64 {
        if kind == LocationType::Rest { 8 } else { 4 }
    }

    fn likelihood(&self, bound: Bound) -> RationalFunction {
        match bound {
            Bound::Upper => gamma_over(12.0),
            Bound::Lower => gamma_over(4.0),
        }
    }

    fn descriptor(&self) -> String {
        format!("w=4.r=8-{}", self.error_type)
    }
}

/// Depolarizing model for X and Z errors counted together.
///
/// CNOT errors weigh 1, everything else 4. Likelihood `γ / (1 − 15γ)` for
/// upper bounds and `γ / (1 − 4γ)` for lower bounds.
#[derive(Debug, Clone, Copy)]
pub struct DepolarizingNoiseModel;

impl NoiseModel for DepolarizingNoiseModel {
    type Weight = u64;

    fn error_list(&self, kind: LocationType) -> &[PauliError] {
        error_list_xz(kind)
    }

    fn weight(&self, kind: LocationType, _error: &PauliError, _bound: Bound) -> u64 {
        if kind == LocationType::Cnot { 1 } else { 4 }
    }

    fn likelihood(&self, bound: Bound) -> RationalFunction {
        match bound {
            Bound::Upper => gamma_over(15.0),
            Bound::Lower => gamma_over(4.0),
        }
    }

    fn descriptor(&self) -> String {
        "lower-w=4.c=1".to_string()
    }
}

/// A model with explicit per-error weights and likelihood `γ`.
#[derive(Debug, Clone)]
pub struct TransformedNoiseModel {
    errors: Vec<Vec<PauliError>>,
    weights: Vec<Vec<f64>>,
}

impl TransformedNoiseModel {
    /// A model with no errors; add them with [`TransformedNoiseModel::with_weight`].
    pub fn new() -> Self {
        Self {
            errors: vec![Vec::new(); LocationType::ALL.len()],
            weights: vec![Vec::new(); LocationType::ALL.len()],
        }
    }

    /// Marginal X model with the given weights.
    pub fn x(prep_z: f64, meas_z: f64, rest: f64, cnot_ix: f64, cnot_xi: f64, cnot_xx: f64) -> Self {
        Self::marginal(ErrorType::X, [prep_z, meas_z, rest], [cnot_ix, cnot_xi, cnot_xx])
    }

    /// Marginal Z model with the given weights.
    pub fn z(prep_x: f64, meas_x: f64, rest: f64, cnot_iz: f64, cnot_zi: f64, cnot_zz: f64) -> Self {
        Self::marginal(ErrorType::Z, [prep_x, meas_x, rest], [cnot_iz, cnot_zi, cnot_zz])
    }

    fn marginal(error_type: ErrorType, single: [f64; 3], cnot: [f64; 3]) -> Self {
        let (prep, meas) = match error_type {
            ErrorType::Z => (LocationType::PrepX, LocationType::MeasX),
            _ => (LocationType::PrepZ, LocationType::MeasZ),
        };
        let mut model = Self::new();
        for (kind, w) in [prep, meas, LocationType::Rest].into_iter().zip(single) {
            for e in error_list(error_type, kind) {
                model = model.with_weight(kind, e.clone(), w);
            }
        }
        for (e, w) in error_list(error_type, LocationType::Cnot).iter().zip(cnot) {
            model = model.with_weight(LocationType::Cnot, e.clone(), w);
        }
        model
    }

    /// Set the weight of `error` at locations of type `kind`.
    #[must_use]
    pub fn with_weight(mut self, kind: LocationType, error: PauliError, weight: f64) -> Self {
        let i = kind.index();
        match self.errors[i].iter().position(|e| *e == error) {
            Some(j) => self.weights[i][j] = weight,
            None => {
                self.errors[i].push(error);
                self.weights[i].push(weight);
            }
        }
        self
    }
}

impl Default for TransformedNoiseModel {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseModel for TransformedNoiseModel {
    type Weight = f64;

    fn error_list(&self, kind: LocationType) -> &[PauliError] {
        &self.errors[kind.index()]
    }

    fn weight(&self, kind: LocationType, error: &PauliError, _bound: Bound) -> f64 {
        let i = kind.index();
        self.errors[i]
            .iter()
            .position(|e| e == error)
            .map_or(0.0, |j| self.weights[i][j])
    }

    fn likelihood(&self, _bound: Bound) -> RationalFunction {
        RationalFunction::x()
    }

    fn descriptor(&self) -> String {
        let parts: Vec<String> = LocationType::ALL
            .iter()
            .zip(self.errors.iter().zip(&self.weights))
            .filter(|(_, (errors, _))| !errors.is_empty())
            .map(|(kind, (errors, weights))| {
                let listed: Vec<String> = errors
                    .iter()
                    .zip(weights)
                    .map(|(e, w)| format!("{e}={w:?}"))
                    .collect();
                format!("{kind}:{}", listed.join(","))
            })
            .collect();
        format!("transformed[{}]", parts.join("."))
    }
}

/// The noiseless model.
#[derive(Debug, Clone, Copy)]
pub struct ZeroNoiseModel;

impl NoiseModel for ZeroNoiseModel {
    type Weight = u64;

    fn error_list(&self, _kind: LocationType) -> &[PauliError] {
        &[]
    }

    fn weight(&self, _kind: LocationType, _error: &PauliError, _bound: Bound) -> u64 {
        0
    }

    fn likelihood(&self, _bound: Bound) -> RationalFunction {
        RationalFunction::zero()
    }

    fn descriptor(&self) -> String {
        "0".to_string()
    }

    fn pr_ideal(&self, _kind: LocationType, _bound: Bound) -> RationalFunction {
        RationalFunction::one()
    }
}
