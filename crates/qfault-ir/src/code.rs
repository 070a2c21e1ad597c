//! Stabilizer codes.
//!
//! [`Code`] is a closed set of the codes the counting engine understands. All
//! operators are [`PauliError`]s over the code's `n` physical qubits, and all
//! syndromes are [`Bits`] with the first stabilizer generator in the most
//! significant position.
//!
//! Normalizer generators are ordered `X1, Z1, X2, Z2, ...`, one pair per
//! logical qubit. A [`StabilizerState`] fixes one logical operator per
//! logical qubit; it adds those operators to the stabilizer and has no
//! normalizers of its own.
//!
//! ```rust
//! use qfault_ir::code::Code;
//! use qfault_ir::pauli::PauliError;
//!
//! let code = Code::golay();
//! let e: PauliError = format!("X{}", "I".repeat(22)).parse().unwrap();
//! // A single X error is corrected perfectly.
//! assert!(code.decode_error(&e).is_identity());
//! assert!(code.detect_error(&e));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::bits::{self, Bits};
use crate::error::{IrError, IrResult};
use crate::golay::{self, GOLAY};
use crate::location::Basis;
use crate::pauli::{Pauli, PauliError};

/// The X and Z logical operators of one logical qubit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalOperator {
    /// Logical X.
    pub x: PauliError,
    /// Logical Z.
    pub z: PauliError,
}

impl LogicalOperator {
    /// The operator of the given basis.
    pub fn get(&self, basis: Basis) -> &PauliError {
        match basis {
            Basis::X => &self.x,
            Basis::Z => &self.z,
        }
    }
}

/// A quantum error-correcting code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Code {
    /// One unencoded qubit.
    Trivial,
    /// The [[4,2,2]] detecting code used with one logical qubit, optionally
    /// with the gauge operator of the given type added to the stabilizer.
    Ed422 {
        /// Gauge operator type, if fixed.
        gauge: Option<Basis>,
    },
    /// The [[23,1,7]] Golay code.
    Golay,
    /// A code given by explicit generators.
    Explicit(ExplicitCode),
    /// A stabilizer state of an underlying code.
    State(StabilizerState),
    /// `top` concatenated with `bottom` (bottom must encode one qubit).
    Concatenated {
        /// Outer code.
        top: Arc<Code>,
        /// Inner code.
        bottom: Arc<Code>,
    },
}

impl Code {
    /// The trivial one-qubit code.
    pub fn trivial() -> Self {
        Code::Trivial
    }

    /// The [[4,2,2]] code with an optional gauge fixing.
    pub fn ed422(gauge: Option<Basis>) -> Self {
        Code::Ed422 { gauge }
    }

    /// The Golay code.
    pub fn golay() -> Self {
        Code::Golay
    }

    /// `top` concatenated with `bottom`.
    pub fn concatenated(top: Arc<Code>, bottom: Arc<Code>) -> IrResult<Self> {
        if bottom.k() != 1 {
            return Err(IrError::Unsupported(format!(
                "concatenation requires a one-qubit bottom code, got k={}",
                bottom.k()
            )));
        }
        Ok(Code::Concatenated { top, bottom })
    }

    /// A stabilizer state of `code` with one logical type per logical qubit.
    pub fn state(code: Arc<Code>, logical_types: Vec<Basis>) -> IrResult<Self> {
        StabilizerState::new(code, logical_types).map(Code::State)
    }

    /// Human-readable name.
    pub fn name(&self) -> String {
        match self {
            Code::Trivial => "Trivial".to_string(),
            Code::Ed422 { gauge } => match gauge {
                Some(g) => format!("[[4,1,2]]{g}"),
                None => "[[4,1,2]]".to_string(),
            },
            Code::Golay => "Golay".to_string(),
            Code::Explicit(c) => c.name.clone(),
            Code::State(s) => s.name(),
            Code::Concatenated { top, bottom } => format!("{}^{}", top.name(), bottom.name()),
        }
    }

    /// Number of physical qubits.
    pub fn n(&self) -> usize {
        match self {
            Code::Trivial => 1,
            Code::Ed422 { .. } => 4,
            Code::Golay => golay::LENGTH,
            Code::Explicit(c) => c.n,
            Code::State(s) => s.code.n(),
            Code::Concatenated { top, bottom } => top.n() * bottom.n(),
        }
    }

    /// Number of logical qubits.
    pub fn k(&self) -> usize {
        match self {
            Code::Trivial | Code::Ed422 { .. } | Code::Golay => 1,
            Code::Explicit(c) => c.logicals.len(),
            Code::State(s) => s.code.k(),
            Code::Concatenated { top, .. } => top.k(),
        }
    }

    /// Code distance.
    pub fn d(&self) -> usize {
        match self {
            Code::Trivial => 1,
            Code::Ed422 { .. } => 2,
            Code::Golay => 7,
            Code::Explicit(c) => c.d,
            Code::State(s) => s.code.d(),
            Code::Concatenated { top, bottom } => top.d() * bottom.d(),
        }
    }

    /// Concatenation level (0 for an unencoded qubit).
    pub fn level(&self) -> usize {
        match self {
            Code::Trivial => 0,
            Code::State(s) => s.code.level(),
            Code::Concatenated { top, bottom } => top.level() + bottom.level(),
            _ => 1,
        }
    }

    /// The code used at concatenation level `level`.
    pub fn subcode(&self, level: usize) -> IrResult<&Code> {
        let max = self.level();
        if level > max {
            return Err(IrError::LevelOutOfRange { level, max });
        }
        if level == max {
            return Ok(self);
        }
        match self {
            Code::Concatenated { bottom, .. } if level <= bottom.level() => bottom.subcode(level),
            Code::State(s) => s.code.subcode(level),
            _ => Err(IrError::LevelOutOfRange { level, max }),
        }
    }

    /// The code underneath a stabilizer state, or the code itself.
    pub fn underlying(&self) -> &Code {
        match self {
            Code::State(s) => s.code.underlying(),
            other => other,
        }
    }

    /// True for stabilizer states.
    pub fn is_state(&self) -> bool {
        matches!(self, Code::State(_))
    }

    /// Stabilizer generators.
    pub fn stabilizer_generators(&self) -> Vec<PauliError> {
        match self {
            Code::Trivial => Vec::new(),
            Code::Ed422 { gauge } => {
                let mut gens = vec![op("XXXX"), op("ZZZZ")];
                if let Some(g) = gauge {
                    gens.push(ed422_gauge(*g));
                }
                gens
            }
            Code::Golay => {
                let x = golay_checks()
                    .iter()
                    .map(|&p| PauliError::from_parts(golay::LENGTH, Bits::from(u64::from(p)), Bits::zero()));
                let z = golay_checks()
                    .iter()
                    .map(|&p| PauliError::from_parts(golay::LENGTH, Bits::zero(), Bits::from(u64::from(p))));
                x.chain(z).collect()
            }
            Code::Explicit(c) => c.stabilizers.clone(),
            Code::State(s) => s.stabilizer_generators(),
            Code::Concatenated { top, bottom } => {
                let n = self.n();
                let mut gens = Vec::new();
                for q in 0..top.n() {
                    gens.extend(
                        bottom
                            .stabilizer_generators()
                            .iter()
                            .map(|g| g.embed(n, q * bottom.n())),
                    );
                }
                gens.extend(
                    top.stabilizer_generators()
                        .iter()
                        .map(|g| expand_top_operator(g, bottom)),
                );
                gens
            }
        }
    }

    /// Normalizer generators, ordered `X1, Z1, X2, Z2, ...`.
    pub fn normalizer_generators(&self) -> Vec<PauliError> {
        match self {
            Code::State(_) => Vec::new(),
            _ => self
                .logical_operators()
                .into_iter()
                .flat_map(|l| [l.x, l.z])
                .collect(),
        }
    }

    /// Logical operators, one pair per logical qubit.
    pub fn logical_operators(&self) -> Vec<LogicalOperator> {
        match self {
            Code::Trivial => vec![LogicalOperator {
                x: op("X"),
                z: op("Z"),
            }],
            Code::Ed422 { .. } => vec![LogicalOperator {
                x: op("XXII"),
                z: op("ZIZI"),
            }],
            Code::Golay => vec![LogicalOperator {
                x: PauliError::from(Pauli::X).pow(golay::LENGTH),
                z: PauliError::from(Pauli::Z).pow(golay::LENGTH),
            }],
            Code::Explicit(c) => c.logicals.clone(),
            Code::State(s) => s.code.logical_operators(),
            Code::Concatenated { top, bottom } => top
                .logical_operators()
                .iter()
                .map(|l| LogicalOperator {
                    x: expand_top_operator(&l.x, bottom),
                    z: expand_top_operator(&l.z, bottom),
                })
                .collect(),
        }
    }

    /// Stabilizer generators followed by normalizer generators of the
    /// underlying code. These are the parity checks used for error keys.
    pub fn parity_checks(&self) -> Vec<PauliError> {
        let code = self.underlying();
        let mut checks = code.stabilizer_generators();
        checks.extend(code.normalizer_generators());
        checks
    }

    /// Width of an error key for one block of this code.
    ///
    /// Concatenated codes use hierarchical keys: one bottom-code key per top
    /// qubit.
    pub fn key_width(&self) -> usize {
        match self.underlying() {
            Code::Concatenated { top, bottom } => top.n() * bottom.key_width(),
            code => code.stabilizer_generators().len() + code.normalizer_generators().len(),
        }
    }

    /// Syndrome of `e` with respect to the stabilizer generators.
    pub fn syndrome(&self, e: &PauliError) -> Bits {
        syndrome_against(e, &self.stabilizer_generators())
    }

    /// Recovery operator for syndrome `s`.
    pub fn syndrome_correction(&self, s: &Bits) -> PauliError {
        match self {
            Code::Trivial => PauliError::identity(1),
            Code::Ed422 { gauge } => ed422_correction(*gauge, s),
            Code::Golay => {
                let width = golay::SYNDROME_BITS;
                let low = Bits::low_mask(width);
                let x_checks = (s >> width) & &low;
                let z_checks = s & &low;
                let table = golay_check_table();
                let z_corr = table[x_checks.as_u64().unwrap_or(0) as usize];
                let x_corr = table[z_checks.as_u64().unwrap_or(0) as usize];
                PauliError::from_parts(
                    golay::LENGTH,
                    Bits::from(u64::from(x_corr)),
                    Bits::from(u64::from(z_corr)),
                )
            }
            Code::Explicit(c) => c
                .corrections
                .get(s)
                .cloned()
                .unwrap_or_else(|| PauliError::identity(c.n)),
            Code::State(state) => state.syndrome_correction(s),
            Code::Concatenated { top, bottom } => concatenated_correction(self.n(), top, bottom, s),
        }
    }

    /// The logical error left after perfect correction of `e`.
    ///
    /// The result has one qubit per logical qubit.
    pub fn decode_error(&self, e: &PauliError) -> PauliError {
        let corrected = e * &self.syndrome_correction(&self.syndrome(e));
        let logicals = self.logical_operators();
        let mut decoded = PauliError::identity(logicals.len());
        for (q, l) in logicals.iter().enumerate() {
            let x = !corrected.commutes_with(&l.z);
            let z = !corrected.commutes_with(&l.x);
            decoded.set(q, Pauli::from_bits(x, z));
        }
        decoded
    }

    /// True if `e` has a non-trivial syndrome.
    pub fn detect_error(&self, e: &PauliError) -> bool {
        !self.syndrome(e).is_zero()
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.stabilizer_generators() == other.stabilizer_generators()
            && self.normalizer_generators() == other.normalizer_generators()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Explicit codes and stabilizer states
// ---------------------------------------------------------------------------

/// A stabilizer code given by its generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplicitCode {
    name: String,
    n: usize,
    d: usize,
    stabilizers: Vec<PauliError>,
    logicals: Vec<LogicalOperator>,
    corrections: BTreeMap<Bits, PauliError>,
}

impl ExplicitCode {
    /// Create a code; every operator must act on `n` qubits.
    pub fn new(
        name: impl Into<String>,
        n: usize,
        d: usize,
        stabilizers: Vec<PauliError>,
        logicals: Vec<LogicalOperator>,
    ) -> IrResult<Self> {
        let operators = stabilizers
            .iter()
            .chain(logicals.iter().flat_map(|l| [&l.x, &l.z]));
        for op in operators {
            if op.len() != n {
                return Err(IrError::LengthMismatch {
                    left: n,
                    right: op.len(),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            n,
            d,
            stabilizers,
            logicals,
            corrections: BTreeMap::new(),
        })
    }

    /// Set the recovery operator for a syndrome. Unlisted syndromes are
    /// corrected by the identity.
    #[must_use]
    pub fn with_correction(mut self, syndrome: Bits, correction: PauliError) -> Self {
        self.corrections.insert(syndrome, correction);
        self
    }
}

/// A code with one logical operator per logical qubit fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizerState {
    code: Arc<Code>,
    logical_types: Vec<Basis>,
}

impl StabilizerState {
    /// Fix `logical_types[i]` on logical qubit `i`.
    pub fn new(code: Arc<Code>, logical_types: Vec<Basis>) -> IrResult<Self> {
        if code.k() != logical_types.len() {
            return Err(IrError::LogicalCountMismatch {
                expected: code.k(),
                got: logical_types.len(),
            });
        }
        Ok(Self {
            code,
            logical_types,
        })
    }

    /// The code the state is encoded in.
    pub fn code(&self) -> &Arc<Code> {
        &self.code
    }

    /// The fixed logical type of every logical qubit.
    pub fn logical_types(&self) -> &[Basis] {
        &self.logical_types
    }

    fn name(&self) -> String {
        let types: String = self.logical_types.iter().map(Basis::to_string).collect();
        format!("{}{}", self.code.name(), types)
    }

    fn logical_stabilizers(&self) -> Vec<PauliError> {
        self.code
            .logical_operators()
            .iter()
            .zip(&self.logical_types)
            .map(|(l, &t)| l.get(t).clone())
            .collect()
    }

    fn stabilizer_generators(&self) -> Vec<PauliError> {
        let mut gens = self.code.stabilizer_generators();
        gens.extend(self.logical_stabilizers());
        gens
    }

    fn syndrome_correction(&self, s: &Bits) -> PauliError {
        let k = self.logical_types.len();
        let mut correction = self.code.syndrome_correction(&(s >> k));
        let logical_stabs = self.logical_stabilizers();
        let residual = (s & &Bits::low_mask(k)) ^ syndrome_against(&correction, &logical_stabs);
        let logicals = self.code.logical_operators();
        for (i, (l, &t)) in logicals.iter().zip(&self.logical_types).enumerate() {
            if residual.bit(k - 1 - i) {
                correction *= l.get(t.dual());
            }
        }
        correction
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Anticommutation bits of `e` against `checks`, first check = MSB.
pub fn syndrome_against(e: &PauliError, checks: &[PauliError]) -> Bits {
    Bits::from_bools(checks.iter().map(|c| !e.commutes_with(c)))
}

fn op(symbols: &str) -> PauliError {
    let x: Vec<bool> = symbols.chars().map(|c| matches!(c, 'X' | 'Y')).collect();
    let z: Vec<bool> = symbols.chars().map(|c| matches!(c, 'Z' | 'Y')).collect();
    PauliError::from_parts(symbols.len(), Bits::from_bools(x), Bits::from_bools(z))
}

fn ed422_gauge(basis: Basis) -> PauliError {
    match basis {
        Basis::X => op("XIXI"),
        Basis::Z => op("ZZII"),
    }
}

/// Syndrome bits, MSB to LSB: XXXX, ZZZZ, gauge. A single-qubit Pauli on the
/// last qubit fixes the stabilizer syndromes; the dual gauge operator fixes
/// the gauge syndrome.
fn ed422_correction(gauge: Option<Basis>, s: &Bits) -> PauliError {
    let z_corr = op("IIIX");
    let x_corr = op("IIIZ");
    let s = s.as_u64().unwrap_or(0);
    let (xx, zz, g) = match gauge {
        None => ((s >> 1) & 1, s & 1, 0),
        Some(_) => ((s >> 2) & 1, (s >> 1) & 1, s & 1),
    };
    let mut corr = PauliError::identity(4);
    if xx == 1 {
        corr *= &x_corr;
    }
    if zz == 1 {
        corr *= &z_corr;
    }
    if let (Some(basis), 1) = (gauge, g) {
        corr *= &ed422_gauge(basis.dual());
    }
    corr
}

/// Replace each top-level Pauli by the bottom code's logical operator.
fn expand_top_operator(operator: &PauliError, bottom: &Code) -> PauliError {
    let logical = bottom.logical_operators().into_iter().next();
    let n_bottom = bottom.n();
    (0..operator.len()).fold(PauliError::identity(0), |acc, q| {
        let mut sub = PauliError::identity(n_bottom);
        if let Some(l) = &logical {
            let p = operator.get(q);
            if p.x_bit() {
                sub *= &l.x;
            }
            if p.z_bit() {
                sub *= &l.z;
            }
        }
        acc.tensor(&sub)
    })
}

/// Correct each bottom block, then correct the top-level syndrome that
/// remains after the bottom corrections.
fn concatenated_correction(n: usize, top: &Code, bottom: &Code, s: &Bits) -> PauliError {
    let n_top = top.n();
    let n_bottom = bottom.n();
    let bottom_len = bottom.stabilizer_generators().len();
    let top_gens: Vec<PauliError> = top
        .stabilizer_generators()
        .iter()
        .map(|g| expand_top_operator(g, bottom))
        .collect();

    let mut lengths = vec![bottom_len; n_top];
    lengths.push(top_gens.len());
    let parts = bits::split(s, &lengths, false);

    let mut correction = PauliError::identity(n);
    for (q, part) in parts.iter().take(n_top).enumerate() {
        correction *= &bottom.syndrome_correction(part).embed(n, q * n_bottom);
    }
    let top_syndrome = parts.last().cloned().unwrap_or_default();
    let residual = top_syndrome ^ syndrome_against(&correction, &top_gens);
    let top_correction = top.syndrome_correction(&residual);
    correction *= &expand_top_operator(&top_correction, bottom);
    correction
}

/// The 11 cyclic shifts of `(x + 1) g(x)`.
fn golay_checks() -> &'static [u32] {
    static CHECKS: LazyLock<Vec<u32>> = LazyLock::new(|| {
        let base = (golay::GENPOL << 1) ^ golay::GENPOL;
        (0..golay::SYNDROME_BITS).map(|i| base << i).collect()
    });
    &CHECKS
}

/// Minimum-weight pattern indexed by its syndrome against [`golay_checks`].
fn golay_check_table() -> &'static [u32] {
    static TABLE: LazyLock<Vec<u32>> = LazyLock::new(|| {
        let mut table = vec![0u32; 1 << golay::SYNDROME_BITS];
        for &pattern in GOLAY.corrections() {
            let s = golay_checks()
                .iter()
                .fold(0usize, |acc, &c| (acc << 1) | usize::from(bits::parity(u64::from(pattern & c))));
            table[s] = pattern;
        }
        table
    });
    &TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PauliError {
        s.parse().unwrap()
    }

    #[test]
    fn test_ed422_syndromes() {
        let code = Code::ed422(None);
        assert_eq!(code.syndrome(&p("XIII")).as_u64(), Some(0b01));
        assert_eq!(code.syndrome(&p("ZIII")).as_u64(), Some(0b10));
        assert_eq!(code.syndrome(&p("YIII")).as_u64(), Some(0b11));
        assert!(!code.detect_error(&p("XXII")));
    }

    #[test]
    fn test_ed422_correction_matches_syndrome() {
        for gauge in [None, Some(Basis::X), Some(Basis::Z)] {
            let code = Code::ed422(gauge);
            let width = code.stabilizer_generators().len();
            for s in 0..(1u64 << width) {
                let s = Bits::from(s);
                let corr = code.syndrome_correction(&s);
                assert_eq!(code.syndrome(&corr), s, "gauge={gauge:?}");
            }
        }
    }

    #[test]
    fn test_ed422_logical_error() {
        let code = Code::ed422(None);
        // XXII is logical X; decoding yields X on the logical qubit.
        assert_eq!(code.decode_error(&p("XXII")).to_string(), "X");
        assert_eq!(code.decode_error(&p("ZIZI")).to_string(), "Z");
        assert_eq!(code.decode_error(&p("XXXX")).to_string(), "I");
    }

    #[test]
    fn test_golay_generators_commute() {
        let code = Code::golay();
        let gens = code.stabilizer_generators();
        assert_eq!(gens.len(), 22);
        for a in &gens {
            for b in &gens {
                assert!(a.commutes_with(b));
            }
        }
        let l = &code.logical_operators()[0];
        assert!(gens.iter().all(|g| g.commutes_with(&l.x) && g.commutes_with(&l.z)));
        assert!(!l.x.commutes_with(&l.z));
    }

    #[test]
    fn test_golay_corrects_three_errors() {
        let code = Code::golay();
        let e = p(&format!("XIIIZIIIIYII{}", "I".repeat(11)));
        assert!(code.decode_error(&e).is_identity());
        let logical = PauliError::from(Pauli::X).pow(23);
        assert_eq!(code.decode_error(&logical).to_string(), "X");
    }

    #[test]
    fn test_state_stabilizers_and_correction() {
        let code = Arc::new(Code::ed422(None));
        let state = Code::state(code.clone(), vec![Basis::Z]).unwrap();
        assert_eq!(state.stabilizer_generators().len(), 3);
        assert!(state.normalizer_generators().is_empty());
        assert_eq!(state.underlying(), &*code);
        // Logical X flips the logical Z stabilizer and is corrected away.
        let s = state.syndrome(&p("XXII"));
        assert_eq!(s.as_u64(), Some(0b001));
        let corrected = &p("XXII") * &state.syndrome_correction(&s);
        assert!(state.syndrome(&corrected).is_zero());
    }

    #[test]
    fn test_state_count_mismatch() {
        let code = Arc::new(Code::golay());
        assert!(matches!(
            Code::state(code, vec![Basis::X, Basis::Z]),
            Err(IrError::LogicalCountMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_concatenated_shape() {
        let ed = Arc::new(Code::ed422(None));
        let cat = Code::concatenated(ed.clone(), ed.clone()).unwrap();
        assert_eq!(cat.n(), 16);
        assert_eq!(cat.k(), 1);
        assert_eq!(cat.d(), 4);
        assert_eq!(cat.level(), 2);
        assert_eq!(cat.stabilizer_generators().len(), 4 * 2 + 2);
        assert_eq!(cat.key_width(), 4 * 4);
        assert_eq!(cat.subcode(1).unwrap(), &*ed);
        assert!(matches!(cat.subcode(3), Err(IrError::LevelOutOfRange { level: 3, max: 2 })));
    }

    #[test]
    fn test_concatenated_correction() {
        let ed = Arc::new(Code::ed422(None));
        let cat = Code::concatenated(ed.clone(), ed).unwrap();
        for e in [p("XIIIIIIIIIIIIIII"), p("IIIIIZIIIIIIIIII")] {
            let corr = cat.syndrome_correction(&cat.syndrome(&e));
            assert!(cat.syndrome(&(&e * &corr)).is_zero());
        }
    }

    #[test]
    fn test_explicit_code() {
        let code = ExplicitCode::new(
            "rep3",
            3,
            1,
            vec![p("ZZI"), p("IZZ")],
            vec![LogicalOperator {
                x: p("XXX"),
                z: p("ZII"),
            }],
        )
        .unwrap()
        .with_correction(Bits::from(0b10), p("XII"));
        let code = Code::Explicit(code);
        assert_eq!(code.k(), 1);
        assert_eq!(code.syndrome_correction(&Bits::from(0b10)).to_string(), "XII");
        assert!(code.syndrome_correction(&Bits::from(0b01)).is_identity());
        assert!(matches!(
            ExplicitCode::new("bad", 3, 1, vec![p("ZZ")], vec![]),
            Err(IrError::LengthMismatch { left: 3, right: 2 })
        ));
    }
}
