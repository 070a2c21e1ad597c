//! Arbitrary-width bit strings.
//!
//! Syndromes, error keys and the symplectic parts of Pauli errors all need
//! more than 64 bits once codes are concatenated (a level-2 Golay block has
//! 529 qubits). [`Bits`] is a small unsigned big-integer restricted to the
//! bitwise operations the counting engine needs.
//!
//! Conventions shared with the rest of the workspace:
//!
//! - [`Bits::from_bools`] treats the *first* item as the most significant bit.
//! - [`concatenate`] / [`split`] with `reverse = true` place the *first* item
//!   in the least significant bits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Shl, Shr};

const WORD: usize = 64;

/// An unsigned bit string of arbitrary width.
///
/// Words are stored little-endian and trailing zero words are always trimmed,
/// so equal values have equal representations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bits {
    words: Vec<u64>,
}

impl Bits {
    /// The all-zero bit string.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from a single machine word.
    pub fn from_u64(value: u64) -> Self {
        let mut bits = Self { words: vec![value] };
        bits.trim();
        bits
    }

    /// Build from a sequence of booleans, first item = most significant bit.
    pub fn from_bools<I>(items: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let items: Vec<bool> = items.into_iter().collect();
        let n = items.len();
        let mut bits = Self::zero();
        for (i, &b) in items.iter().enumerate() {
            if b {
                bits.set_bit(n - 1 - i, true);
            }
        }
        bits
    }

    /// Expand into `len` booleans, first item = most significant bit.
    pub fn to_bools(&self, len: usize) -> Vec<bool> {
        (0..len).map(|i| self.bit(len - 1 - i)).collect()
    }

    /// A mask with the `n` least significant bits set.
    pub fn low_mask(n: usize) -> Self {
        let mut words = vec![u64::MAX; n / WORD];
        let rem = n % WORD;
        if rem != 0 {
            words.push((1u64 << rem) - 1);
        }
        let mut bits = Self { words };
        bits.trim();
        bits
    }

    /// Read bit `i` (0 = least significant).
    pub fn bit(&self, i: usize) -> bool {
        self.words
            .get(i / WORD)
            .is_some_and(|w| (w >> (i % WORD)) & 1 == 1)
    }

    /// Write bit `i` (0 = least significant).
    pub fn set_bit(&mut self, i: usize, value: bool) {
        let word = i / WORD;
        if value {
            if word >= self.words.len() {
                self.words.resize(word + 1, 0);
            }
            self.words[word] |= 1u64 << (i % WORD);
        } else if word < self.words.len() {
            self.words[word] &= !(1u64 << (i % WORD));
            self.trim();
        }
    }

    /// Number of set bits.
    pub fn weight(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Parity of the set bits.
    pub fn parity(&self) -> bool {
        self.weight() % 2 == 1
    }

    /// True if no bit is set.
    pub fn is_zero(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of significant bits (position of the highest set bit + 1).
    pub fn bit_len(&self) -> usize {
        match self.words.last() {
            Some(&top) => (self.words.len() - 1) * WORD + (WORD - top.leading_zeros() as usize),
            None => 0,
        }
    }

    /// The value as a machine word, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        match self.words.len() {
            0 => Some(0),
            1 => Some(self.words[0]),
            _ => None,
        }
    }

    /// Indices of the set bits, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            (0..WORD)
                .filter(move |b| (w >> b) & 1 == 1)
                .map(move |b| wi * WORD + b)
        })
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }

    fn zip_words(&self, other: &Self, op: impl Fn(u64, u64) -> u64) -> Self {
        let len = self.words.len().max(other.words.len());
        let words = (0..len)
            .map(|i| {
                op(
                    self.words.get(i).copied().unwrap_or(0),
                    other.words.get(i).copied().unwrap_or(0),
                )
            })
            .collect();
        let mut bits = Self { words };
        bits.trim();
        bits
    }
}

impl From<u64> for Bits {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let s: String = (0..self.bit_len())
            .rev()
            .map(|i| if self.bit(i) { '1' } else { '0' })
            .collect();
        write!(f, "{s}")
    }
}

impl fmt::Binary for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Bitwise operators
// ---------------------------------------------------------------------------

macro_rules! bitwise_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait<&Bits> for &Bits {
            type Output = Bits;

            fn $method(self, rhs: &Bits) -> Bits {
                self.zip_words(rhs, |a, b| a $op b)
            }
        }

        impl $trait for Bits {
            type Output = Bits;

            fn $method(self, rhs: Bits) -> Bits {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Bits> for Bits {
            type Output = Bits;

            fn $method(self, rhs: &Bits) -> Bits {
                (&self).$method(rhs)
            }
        }

        impl $assign_trait<&Bits> for Bits {
            fn $assign_method(&mut self, rhs: &Bits) {
                *self = (&*self).$method(rhs);
            }
        }

        impl $assign_trait for Bits {
            fn $assign_method(&mut self, rhs: Bits) {
                *self = (&*self).$method(&rhs);
            }
        }
    };
}

bitwise_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, ^);
bitwise_op!(BitAnd, bitand, BitAndAssign, bitand_assign, &);
bitwise_op!(BitOr, bitor, BitOrAssign, bitor_assign, |);

impl Shl<usize> for &Bits {
    type Output = Bits;

    fn shl(self, shift: usize) -> Bits {
        if self.is_zero() {
            return Bits::zero();
        }
        let word_shift = shift / WORD;
        let bit_shift = shift % WORD;
        let mut words = vec![0u64; word_shift];
        let mut carry = 0u64;
        for &w in &self.words {
            if bit_shift == 0 {
                words.push(w);
            } else {
                words.push((w << bit_shift) | carry);
                carry = w >> (WORD - bit_shift);
            }
        }
        if carry != 0 {
            words.push(carry);
        }
        let mut bits = Bits { words };
        bits.trim();
        bits
    }
}

impl Shl<usize> for Bits {
    type Output = Bits;

    fn shl(self, shift: usize) -> Bits {
        &self << shift
    }
}

impl Shr<usize> for &Bits {
    type Output = Bits;

    fn shr(self, shift: usize) -> Bits {
        let word_shift = shift / WORD;
        if word_shift >= self.words.len() {
            return Bits::zero();
        }
        let bit_shift = shift % WORD;
        let src = &self.words[word_shift..];
        let words = (0..src.len())
            .map(|i| {
                if bit_shift == 0 {
                    src[i]
                } else {
                    let hi = src.get(i + 1).copied().unwrap_or(0);
                    (src[i] >> bit_shift) | (hi << (WORD - bit_shift))
                }
            })
            .collect();
        let mut bits = Bits { words };
        bits.trim();
        bits
    }
}

impl Shr<usize> for Bits {
    type Output = Bits;

    fn shr(self, shift: usize) -> Bits {
        &self >> shift
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

/// Number of set bits in a machine word.
pub fn weight(value: u64) -> u32 {
    value.count_ones()
}

/// Parity of a machine word.
pub fn parity(value: u64) -> bool {
    value.count_ones() % 2 == 1
}

/// Concatenate bit strings of the given widths into one.
///
/// With `reverse = false` the first part ends up in the most significant
/// bits; with `reverse = true` it ends up in the least significant bits.
pub fn concatenate(parts: &[Bits], lengths: &[usize], reverse: bool) -> Bits {
    let mut out = Bits::zero();
    let order: Vec<usize> = if reverse {
        (0..parts.len()).rev().collect()
    } else {
        (0..parts.len()).collect()
    };
    for i in order {
        let width = lengths.get(i).copied().unwrap_or(0);
        out = &out << width;
        out ^= &parts[i] & &Bits::low_mask(width);
    }
    out
}

/// Split a bit string into parts of the given widths.
///
/// Inverse of [`concatenate`] with the same `lengths` and `reverse`.
pub fn split(bits: &Bits, lengths: &[usize], reverse: bool) -> Vec<Bits> {
    let mut parts = vec![Bits::zero(); lengths.len()];
    let mut rest = bits.clone();
    let order: Vec<usize> = if reverse {
        (0..lengths.len()).collect()
    } else {
        (0..lengths.len()).rev().collect()
    };
    for i in order {
        parts[i] = &rest & &Bits::low_mask(lengths[i]);
        rest = &rest >> lengths[i];
    }
    parts
}
