//! Error keys: canonical representatives of Pauli errors modulo stabilizers.
//!
//! A [`Key`] holds one [`Bits`] value per block. Bit `i` of a block's key
//! (first parity check = most significant bit) is set iff the block error
//! anticommutes with parity check `i`. Parity checks are the stabilizer
//! generators followed by the normalizer generators of the block's
//! underlying code, so two errors get the same key iff they differ by a
//! stabilizer element.
//!
//! Blocks encoded in a stabilizer state mask out the logical checks whose
//! dual is stabilised by the state, so errors that differ by a logical
//! operator the state cannot see collapse to one key.
//!
//! Concatenated codes use hierarchical keys: one bottom-code key per top
//! qubit, top qubit 0 in the least significant position.
//!
//! ```rust
//! use std::sync::Arc;
//! use qfault_count::key::SyndromeKeyGenerator;
//! use qfault_ir::{Code, PauliError};
//!
//! let keygen = SyndromeKeyGenerator::for_code(&Code::ed422(None));
//! let e: PauliError = "XIII".parse().unwrap();
//! let s: PauliError = "ZZZZ".parse().unwrap();
//! // Multiplying by a stabilizer does not change the key.
//! assert_eq!(keygen.key(&e), keygen.key(&(&e * &s)));
//! ```

use std::fmt;
use std::ops::BitXor;

use qfault_ir::bits::{self, Bits};
use qfault_ir::code::syndrome_against;
use qfault_ir::{Block, Code, Pauli, PauliError};
use serde::{Deserialize, Serialize};

use crate::error::{CountError, CountingResult};

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Per-block error key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    blocks: Vec<Bits>,
}

impl Key {
    /// Build a key from per-block values.
    pub fn new(blocks: Vec<Bits>) -> Self {
        Self { blocks }
    }

    /// The all-zero key over `num_blocks` blocks.
    pub fn trivial(num_blocks: usize) -> Self {
        Self {
            blocks: vec![Bits::zero(); num_blocks],
        }
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True for a key over zero blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// True if every block is zero.
    pub fn is_trivial(&self) -> bool {
        self.blocks.iter().all(Bits::is_zero)
    }

    /// The key of block `index`.
    pub fn block(&self, index: usize) -> Option<&Bits> {
        self.blocks.get(index)
    }

    /// All block keys.
    pub fn blocks(&self) -> &[Bits] {
        &self.blocks
    }

    /// Consume into the block keys.
    pub fn into_blocks(self) -> Vec<Bits> {
        self.blocks
    }

    /// Pack the key into one bit string, block 0 least significant.
    pub fn pack(&self, widths: &[usize]) -> Bits {
        bits::concatenate(&self.blocks, widths, true)
    }

    /// Inverse of [`Key::pack`].
    pub fn unpack(packed: &Bits, widths: &[usize]) -> Self {
        Self::new(bits::split(packed, widths, true))
    }
}

impl From<Vec<Bits>> for Key {
    fn from(blocks: Vec<Bits>) -> Self {
        Self::new(blocks)
    }
}

/// Blockwise XOR. The shorter key is extended with zero blocks.
impl BitXor<&Key> for &Key {
    type Output = Key;

    fn bitxor(self, rhs: &Key) -> Key {
        let (long, short) = if self.len() >= rhs.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let mut blocks = long.blocks.clone();
        for (b, s) in blocks.iter_mut().zip(&short.blocks) {
            *b ^= s;
        }
        Key::new(blocks)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, b) in self.blocks.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{b}")?;
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Single-block generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum GeneratorKind {
    Flat {
        checks: Vec<PauliError>,
    },
    Concatenated {
        top_n: usize,
        bottom_len: usize,
        bottom_width: usize,
        bottom: Box<SyndromeKeyGenerator>,
    },
}

/// Computes the key of a single-block error.
#[derive(Debug, Clone)]
pub struct SyndromeKeyGenerator {
    kind: GeneratorKind,
    mask: Option<Bits>,
}

impl SyndromeKeyGenerator {
    /// Key generator for blocks encoded in `code`.
    pub fn for_code(code: &Code) -> Self {
        let kind = match code.underlying() {
            Code::Concatenated { top, bottom } => GeneratorKind::Concatenated {
                top_n: top.n(),
                bottom_len: bottom.n(),
                bottom_width: bottom.key_width(),
                bottom: Box::new(Self::for_code(bottom)),
            },
            underlying => GeneratorKind::Flat {
                checks: underlying.parity_checks(),
            },
        };
        let mut generator = Self { kind, mask: None };
        if code.is_state() {
            generator.mask = generator.state_mask(code);
        }
        generator
    }

    /// Checks of the state's stabilizer survive; logical checks the state
    /// cannot distinguish are dropped. Hierarchical keys are left unmasked.
    fn state_mask(&self, state: &Code) -> Option<Bits> {
        let GeneratorKind::Flat { checks } = &self.kind else {
            return None;
        };
        let mut kept = state.stabilizer_generators();
        kept.extend(state.normalizer_generators());
        Some(Bits::from_bools(checks.iter().map(|c| kept.contains(c))))
    }

    /// Key width in bits.
    pub fn width(&self) -> usize {
        match &self.kind {
            GeneratorKind::Flat { checks } => checks.len(),
            GeneratorKind::Concatenated {
                top_n, bottom_width, ..
            } => top_n * bottom_width,
        }
    }

    /// The mask applied to every key, if any.
    pub fn mask(&self) -> Option<&Bits> {
        self.mask.as_ref()
    }

    /// Parity checks, in key bit order (most significant first).
    pub fn parity_checks(&self) -> Vec<PauliError> {
        match &self.kind {
            GeneratorKind::Flat { checks } => checks.clone(),
            GeneratorKind::Concatenated {
                top_n,
                bottom_len,
                bottom,
                ..
            } => {
                let total = top_n * bottom_len;
                let sub = bottom.parity_checks();
                (0..*top_n)
                    .rev()
                    .flat_map(|q| sub.iter().map(move |c| c.embed(total, q * bottom_len)))
                    .collect()
            }
        }
    }

    /// Key of `e`.
    pub fn key(&self, e: &PauliError) -> Bits {
        let key = match &self.kind {
            GeneratorKind::Flat { checks } => syndrome_against(e, checks),
            GeneratorKind::Concatenated {
                top_n,
                bottom_len,
                bottom_width,
                bottom,
            } => {
                let parts: Vec<Bits> = (0..*top_n)
                    .map(|q| bottom.key(&sub_error(e, q * bottom_len, *bottom_len)))
                    .collect();
                bits::concatenate(&parts, &vec![*bottom_width; *top_n], true)
            }
        };
        match &self.mask {
            Some(mask) => key & mask,
            None => key,
        }
    }
}

/// Qubits `offset..offset+len` of `e`.
fn sub_error(e: &PauliError, offset: usize, len: usize) -> PauliError {
    let total = e.len().max(offset + len);
    let shift = total - offset - len;
    PauliError::from_parts(len, e.x_bits() >> shift, e.z_bits() >> shift)
}

// ---------------------------------------------------------------------------
// Multi-block generator
// ---------------------------------------------------------------------------

/// Computes per-block keys for a fixed, ordered list of blocks.
///
/// All blocks must share the same parity checks.
#[derive(Debug, Clone)]
pub struct MultiBlockKeyGenerator {
    generators: Vec<SyndromeKeyGenerator>,
    lengths: Vec<usize>,
    parity_checks: Vec<PauliError>,
}

impl MultiBlockKeyGenerator {
    /// Build the generator for `blocks`.
    pub fn new(blocks: &[Block]) -> CountingResult<Self> {
        let generators: Vec<SyndromeKeyGenerator> = blocks
            .iter()
            .map(|b| SyndromeKeyGenerator::for_code(b.code()))
            .collect();
        let parity_checks = generators
            .first()
            .map(SyndromeKeyGenerator::parity_checks)
            .unwrap_or_default();
        for (block, generator) in blocks.iter().zip(&generators).skip(1) {
            if generator.parity_checks() != parity_checks {
                return Err(CountError::ParityCheckMismatch(format!(
                    "block {} ({}) differs from block {} ({})",
                    block.name(),
                    block.code(),
                    blocks[0].name(),
                    blocks[0].code()
                )));
            }
        }
        Ok(Self {
            generators,
            lengths: blocks.iter().map(Block::len).collect(),
            parity_checks,
        })
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// True for zero blocks.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// The shared parity checks.
    pub fn parity_checks(&self) -> &[PauliError] {
        &self.parity_checks
    }

    /// Per-block key widths.
    pub fn widths(&self) -> Vec<usize> {
        self.generators.iter().map(SyndromeKeyGenerator::width).collect()
    }

    /// Key of the per-block errors. Missing trailing blocks are identity.
    pub fn key(&self, errors: &[PauliError]) -> Key {
        self.generators
            .iter()
            .enumerate()
            .map(|(i, g)| match errors.get(i) {
                Some(e) => g.key(e),
                None => g.key(&PauliError::identity(self.lengths[i])),
            })
            .collect::<Vec<_>>()
            .into()
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum DecoderKind {
    Flat {
        code: Code,
        normalizers: Vec<PauliError>,
    },
    Concatenated {
        top_n: usize,
        bottom_width: usize,
        bottom: Box<KeyDecoder>,
        top_generator: SyndromeKeyGenerator,
        top: Box<KeyDecoder>,
    },
}

/// Turns a single-block key into a logical-error verdict.
#[derive(Debug, Clone)]
pub struct KeyDecoder {
    kind: DecoderKind,
    n_norms: usize,
}

impl KeyDecoder {
    /// Decoder for keys of `code`. The code must have logical operators.
    pub fn new(code: &Code) -> CountingResult<Self> {
        let normalizers = code.normalizer_generators();
        if normalizers.is_empty() {
            return Err(CountError::Unsupported(format!(
                "key decoding requires logical operators, {} has none",
                code.name()
            )));
        }
        let n_norms = normalizers.len();
        let kind = match code {
            Code::Concatenated { top, bottom } => DecoderKind::Concatenated {
                top_n: top.n(),
                bottom_width: bottom.key_width(),
                bottom: Box::new(Self::new(bottom)?),
                top_generator: SyndromeKeyGenerator::for_code(top),
                top: Box::new(Self::new(top)?),
            },
            _ => DecoderKind::Flat {
                code: code.clone(),
                normalizers,
            },
        };
        Ok(Self { kind, n_norms })
    }

    /// Number of logical (normalizer) bits.
    pub fn n_norms(&self) -> usize {
        self.n_norms
    }

    /// The stabilizer syndrome contained in `key`. For concatenated codes
    /// this is the syndrome of the outermost code.
    pub fn syndrome(&self, key: &Bits) -> Bits {
        match &self.kind {
            DecoderKind::Flat { .. } => key >> self.n_norms,
            DecoderKind::Concatenated {
                top, top_generator, ..
            } => top.syndrome(&top_generator.key(&self.top_error(key))),
        }
    }

    /// Logical bits left after correcting the syndrome: bit `i` (most
    /// significant first) is set iff the residual error anticommutes with
    /// normalizer `i`.
    pub fn decode(&self, key: &Bits) -> Bits {
        match &self.kind {
            DecoderKind::Flat { code, normalizers } => {
                let logical = key & &Bits::low_mask(self.n_norms);
                let correction = code.syndrome_correction(&(key >> self.n_norms));
                logical ^ syndrome_against(&correction, normalizers)
            }
            DecoderKind::Concatenated {
                top, top_generator, ..
            } => top.decode(&top_generator.key(&self.top_error(key))),
        }
    }

    /// The residual logical error as a `k`-qubit Pauli.
    pub fn logical_error(&self, key: &Bits) -> PauliError {
        logical_from_bits(&self.decode(key), self.n_norms)
    }

    /// True if the residual logical error is not the identity.
    pub fn is_logical_error(&self, key: &Bits) -> bool {
        !self.decode(key).is_zero()
    }

    /// A physical error with key `key`.
    pub fn as_pauli(&self, key: &Bits) -> CountingResult<PauliError> {
        let DecoderKind::Flat { code, .. } = &self.kind else {
            return Err(CountError::Unsupported(
                "representative errors for hierarchical keys".to_string(),
            ));
        };
        let mut e = code.syndrome_correction(&(key >> self.n_norms));
        let flags = self.decode(key).to_bools(self.n_norms);
        for (l, pair) in code.logical_operators().iter().zip(flags.chunks(2)) {
            if pair[0] {
                // Anticommutes with logical X.
                e *= &l.z;
            }
            if pair.get(1).copied().unwrap_or(false) {
                e *= &l.x;
            }
        }
        Ok(e)
    }

    /// Logical errors of the bottom blocks, as an error on the top code.
    fn top_error(&self, key: &Bits) -> PauliError {
        let DecoderKind::Concatenated {
            top_n,
            bottom_width,
            bottom,
            ..
        } = &self.kind
        else {
            return PauliError::identity(0);
        };
        let parts = bits::split(key, &vec![*bottom_width; *top_n], true);
        let mut e = PauliError::identity(*top_n);
        for (q, part) in parts.iter().enumerate() {
            e.set(q, bottom.logical_error(part).get(0));
        }
        e
    }
}

/// `X1, Z1, ...` anticommutation flags to a Pauli on the logical qubits.
fn logical_from_bits(flags: &Bits, n_norms: usize) -> PauliError {
    let flags = flags.to_bools(n_norms);
    let mut e = PauliError::identity(n_norms / 2);
    for (q, pair) in flags.chunks(2).enumerate() {
        let anti_x = pair[0];
        let anti_z = pair.get(1).copied().unwrap_or(false);
        e.set(q, Pauli::from_bits(anti_z, anti_x));
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfault_ir::Basis;
    use std::sync::Arc;

    fn p(s: &str) -> PauliError {
        s.parse().unwrap()
    }

    #[test]
    fn test_trivial_key_bits() {
        let generator = SyndromeKeyGenerator::for_code(&Code::trivial());
        assert_eq!(generator.width(), 2);
        assert_eq!(generator.key(&p("I")), Bits::zero());
        assert_eq!(generator.key(&p("X")), Bits::from(0b01));
        assert_eq!(generator.key(&p("Z")), Bits::from(0b10));
        assert_eq!(generator.key(&p("Y")), Bits::from(0b11));
    }

    #[test]
    fn test_stabilizer_invariance() {
        let code = Code::ed422(None);
        let generator = SyndromeKeyGenerator::for_code(&code);
        let errors = ["XIII", "IZII", "YIII", "XXII", "ZIZI", "IIIY"];
        for e in errors {
            let e = p(e);
            for s in code.stabilizer_generators() {
                assert_eq!(generator.key(&e), generator.key(&(&e * &s)));
            }
        }
    }

    #[test]
    fn test_inequivalent_errors_differ() {
        let generator = SyndromeKeyGenerator::for_code(&Code::ed422(None));
        assert_ne!(generator.key(&p("XIII")), generator.key(&p("IXII")));
        // Logical X is not a stabilizer.
        assert_ne!(generator.key(&p("XXII")), generator.key(&p("IIII")));
    }

    #[test]
    fn test_state_mask_collapses_stabilized_logical() {
        let code = Arc::new(Code::trivial());
        let zero = Code::state(code, vec![Basis::Z]).unwrap();
        let generator = SyndromeKeyGenerator::for_code(&zero);
        // Z on |0> is harmless, X is not.
        assert!(generator.key(&p("Z")).is_zero());
        assert!(!generator.key(&p("X")).is_zero());
        assert_eq!(generator.parity_checks().len(), 2);
    }

    #[test]
    fn test_multi_block_key() {
        let code = Arc::new(Code::trivial());
        let blocks = vec![Block::new("a", code.clone()), Block::new("b", code)];
        let generator = MultiBlockKeyGenerator::new(&blocks).unwrap();
        let key = generator.key(&[p("X")]);
        assert_eq!(key, Key::new(vec![Bits::from(1), Bits::zero()]));
        assert_eq!(generator.widths(), vec![2, 2]);
    }

    #[test]
    fn test_parity_check_mismatch() {
        let blocks = vec![
            Block::new("a", Arc::new(Code::trivial())),
            Block::new("b", Arc::new(Code::ed422(None))),
        ];
        assert!(matches!(
            MultiBlockKeyGenerator::new(&blocks),
            Err(CountError::ParityCheckMismatch(_))
        ));
    }

    #[test]
    fn test_key_xor_extends() {
        let a = Key::new(vec![Bits::from(0b11)]);
        let b = Key::new(vec![Bits::from(0b01), Bits::from(0b10)]);
        assert_eq!(&a ^ &b, Key::new(vec![Bits::from(0b10), Bits::from(0b10)]));
        assert_eq!(&a ^ &b, &b ^ &a);
        assert!((&a ^ &a).is_trivial());
    }

    #[test]
    fn test_pack_unpack() {
        let key = Key::new(vec![Bits::from(0b01), Bits::from(0b11)]);
        let packed = key.pack(&[2, 2]);
        assert_eq!(packed, Bits::from(0b1101));
        assert_eq!(Key::unpack(&packed, &[2, 2]), key);
    }

    #[test]
    fn test_decoder_trivial() {
        let decoder = KeyDecoder::new(&Code::trivial()).unwrap();
        // X error: anticommutes with Z-bar (second check).
        assert_eq!(decoder.logical_error(&Bits::from(0b01)), p("X"));
        assert_eq!(decoder.logical_error(&Bits::from(0b10)), p("Z"));
        assert!(!decoder.is_logical_error(&Bits::zero()));
    }

    #[test]
    fn test_decoder_as_pauli_round_trip() {
        let code = Code::ed422(None);
        let generator = SyndromeKeyGenerator::for_code(&code);
        let decoder = KeyDecoder::new(&code).unwrap();
        for raw in 0u64..16 {
            let key = Bits::from(raw);
            let e = decoder.as_pauli(&key).unwrap();
            assert_eq!(generator.key(&e), key);
        }
    }

    #[test]
    fn test_decoder_rejects_state() {
        let zero = Code::state(Arc::new(Code::trivial()), vec![Basis::Z]).unwrap();
        assert!(matches!(KeyDecoder::new(&zero), Err(CountError::Unsupported(_))));
    }

    #[test]
    fn test_concatenated_key_layout() {
        let bottom = Arc::new(Code::trivial());
        let top = Arc::new(Code::ed422(None));
        let code = Code::concatenated(top, bottom).unwrap();
        let generator = SyndromeKeyGenerator::for_code(&code);
        assert_eq!(generator.width(), 8);
        // X on top qubit 0 lands in the least significant sub-key.
        assert_eq!(generator.key(&p("XIII")), Bits::from(0b01));
        assert_eq!(generator.key(&p("IIIZ")), Bits::from(0b10 << 6));
        // Parity checks agree with the bit layout.
        let checks = generator.parity_checks();
        assert_eq!(checks.len(), 8);
        let e = p("IZXI");
        assert_eq!(syndrome_against(&e, &checks), generator.key(&e));
    }

    #[test]
    fn test_concatenated_decoder() {
        let bottom = Arc::new(Code::trivial());
        let top = Arc::new(Code::ed422(None));
        let code = Code::concatenated(top.clone(), bottom).unwrap();
        let generator = SyndromeKeyGenerator::for_code(&code);
        let decoder = KeyDecoder::new(&code).unwrap();
        let flat = KeyDecoder::new(&top).unwrap();
        let top_generator = SyndromeKeyGenerator::for_code(&top);
        for e in ["XXII", "ZIZI", "XIII", "IIII"] {
            let e = p(e);
            assert_eq!(
                decoder.decode(&generator.key(&e)),
                flat.decode(&top_generator.key(&e))
            );
        }
    }
}
