//! Classical decoder for the binary [23,12,7] Golay code.
//!
//! The quantum Golay code is CSS, so X and Z errors are corrected
//! independently by this classical decoder. Patterns are 23-bit words; the
//! syndrome is the remainder of the pattern polynomial modulo the generator
//! polynomial `g(x) = x^11 + x^10 + x^6 + x^5 + x^4 + x^2 + 1`.
//!
//! The code is perfect: every one of the `2^11` syndromes has exactly one
//! correction of weight at most three, so the table is built by enumerating
//! those patterns.
//!
//! ```rust
//! use qfault_ir::golay::GOLAY;
//!
//! // A single bit flip is always corrected.
//! let e = 1 << 7;
//! assert_eq!(GOLAY.correction(GOLAY.syndrome(e)), e);
//! assert!(!GOLAY.decode(e));
//! ```

use std::sync::LazyLock;

use crate::bits;

/// Code length.
pub const LENGTH: usize = 23;
/// Number of syndrome bits.
pub const SYNDROME_BITS: usize = 11;
/// Number of bits in a logical syndrome: the parity bit above the syndrome.
pub const LOGICAL_SYNDROME_BITS: usize = SYNDROME_BITS + 1;
/// Generator polynomial.
pub const GENPOL: u32 = 0xC75;

const SYNDROME_MASK: u32 = (1 << SYNDROME_BITS) - 1;
const PATTERN_MASK: u32 = (1 << LENGTH) - 1;
const PARITY_BIT: u32 = 1 << SYNDROME_BITS;

const X11: u32 = 1 << 11;
const X22: u32 = 1 << 22;
const MASK12: u32 = (1 << 23) - (1 << 11);

/// Shared decoder, built on first use.
pub static GOLAY: LazyLock<GolayCorrector> = LazyLock::new(GolayCorrector::new);

/// Syndrome to minimum-weight correction table.
#[derive(Debug, Clone)]
pub struct GolayCorrector {
    corrections: Vec<u32>,
}

impl GolayCorrector {
    /// Build the table from every pattern of weight 0 to 3.
    pub fn new() -> Self {
        let mut corrections = vec![0u32; 1 << SYNDROME_BITS];
        for a in 0..LENGTH {
            let pa = 1u32 << a;
            corrections[Self::poly_syndrome(pa) as usize] = pa;
            for b in (a + 1)..LENGTH {
                let pb = pa | (1 << b);
                corrections[Self::poly_syndrome(pb) as usize] = pb;
                for c in (b + 1)..LENGTH {
                    let pc = pb | (1 << c);
                    corrections[Self::poly_syndrome(pc) as usize] = pc;
                }
            }
        }
        Self { corrections }
    }

    fn poly_syndrome(mut pattern: u32) -> u32 {
        let mut aux = X22;
        if pattern >= X11 {
            while pattern & MASK12 != 0 {
                while aux & pattern == 0 {
                    aux >>= 1;
                }
                pattern ^= (aux / X11) * GENPOL;
            }
        }
        pattern
    }

    /// The 11-bit syndrome of a 23-bit pattern.
    pub fn syndrome(&self, pattern: u32) -> u32 {
        Self::poly_syndrome(pattern)
    }

    /// The minimum-weight pattern with the given syndrome. A parity bit
    /// above the syndrome is ignored.
    pub fn correction(&self, syndrome: u32) -> u32 {
        self.corrections[(syndrome & SYNDROME_MASK) as usize]
    }

    /// The 12-bit logical syndrome of a pattern: the pattern's parity in bit
    /// 11 above its 11-bit syndrome.
    ///
    /// The all-ones word is a codeword of odd weight, so the parity
    /// distinguishes the two logical classes of patterns sharing a syndrome.
    pub fn logical_syndrome(&self, pattern: u32) -> u32 {
        let parity = u32::from(bits::parity(u64::from(pattern)));
        self.syndrome(pattern) ^ (parity << SYNDROME_BITS)
    }

    /// A pattern with the given logical syndrome.
    ///
    /// Syndrome bits read as a pattern are their own syndrome; complementing
    /// it keeps the syndrome and flips the parity.
    pub fn error_for_syndrome(&self, logical_syndrome: u32) -> u32 {
        let pattern = logical_syndrome & SYNDROME_MASK;
        let parity = logical_syndrome & PARITY_BIT != 0;
        if bits::parity(u64::from(pattern)) == parity {
            pattern
        } else {
            pattern ^ PATTERN_MASK
        }
    }

    /// True if correcting a pattern with the given logical syndrome leaves a
    /// logical error.
    pub fn decode_syndrome(&self, logical_syndrome: u32) -> bool {
        let pattern = self.error_for_syndrome(logical_syndrome);
        bits::parity(u64::from(pattern ^ self.correction(logical_syndrome)))
    }

    /// Logical syndrome of the correction for `logical_syndrome`.
    pub fn correct_logical_syndrome(&self, logical_syndrome: u32) -> u32 {
        self.logical_syndrome(self.correction(logical_syndrome))
    }

    /// Syndrome of the correction for `syndrome`, without the parity bit.
    pub fn correct_syndrome(&self, syndrome: u32) -> u32 {
        self.syndrome(self.correction(syndrome))
    }

    /// The pattern after applying the correction (always a codeword).
    pub fn correct(&self, pattern: u32) -> u32 {
        pattern ^ self.correction(self.syndrome(pattern))
    }

    /// True if correction leaves an odd-weight codeword, i.e. a logical
    /// error with respect to the all-ones logical operator.
    pub fn decode(&self, pattern: u32) -> bool {
        bits::parity(u64::from(self.correct(pattern)))
    }

    /// Alias of [`GolayCorrector::decode`].
    pub fn is_logical_error(&self, pattern: u32) -> bool {
        self.decode(pattern)
    }

    /// Every correction pattern, indexed by syndrome.
    pub fn corrections(&self) -> &[u32] {
        &self.corrections
    }
}

impl Default for GolayCorrector {
    fn default() -> Self {
        Self::new()
    }
}
