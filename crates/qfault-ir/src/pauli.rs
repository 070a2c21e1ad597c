//! Pauli operators and multi-qubit Pauli errors.
//!
//! Errors are tracked in symplectic form (an X part and a Z part) and phases
//! are ignored. Qubit 0 is the most significant bit, so the tensor product
//! reads left to right: `"XYZ"` is X on qubit 0, Y on qubit 1, Z on qubit 2.
//!
//! ```rust
//! use qfault_ir::pauli::{Pauli, PauliError};
//!
//! let e: PauliError = "XYZ".parse().unwrap();
//! assert_eq!(e.get(1), Pauli::Y);
//! assert_eq!(e.partial(Pauli::X).to_string(), "XXI");
//! assert_eq!(e.partial(Pauli::Z).to_string(), "IZZ");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Mul, MulAssign};
use std::str::FromStr;

use crate::bits::Bits;
use crate::error::{IrError, IrResult};

/// Single-qubit Pauli operator (phase ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity.
    I,
    /// Bit flip.
    X,
    /// Phase flip.
    Z,
    /// Both.
    Y,
}

impl Pauli {
    /// Build from the symplectic bits.
    pub fn from_bits(x: bool, z: bool) -> Self {
        match (x, z) {
            (false, false) => Pauli::I,
            (true, false) => Pauli::X,
            (false, true) => Pauli::Z,
            (true, true) => Pauli::Y,
        }
    }

    /// X component.
    pub fn x_bit(self) -> bool {
        matches!(self, Pauli::X | Pauli::Y)
    }

    /// Z component.
    pub fn z_bit(self) -> bool {
        matches!(self, Pauli::Z | Pauli::Y)
    }

    /// X ↔ Z exchange.
    pub fn dual(self) -> Self {
        match self {
            Pauli::X => Pauli::Z,
            Pauli::Z => Pauli::X,
            other => other,
        }
    }

    /// Product, ignoring phase.
    pub fn compose(self, other: Self) -> Self {
        Pauli::from_bits(self.x_bit() ^ other.x_bit(), self.z_bit() ^ other.z_bit())
    }

    fn symbol(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Z => 'Z',
            Pauli::Y => 'Y',
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An n-qubit Pauli error in symplectic form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PauliError {
    len: usize,
    x: Bits,
    z: Bits,
}

impl PauliError {
    /// The identity on `len` qubits.
    pub fn identity(len: usize) -> Self {
        Self {
            len,
            x: Bits::zero(),
            z: Bits::zero(),
        }
    }

    /// Build from raw symplectic parts. Bits above `len` are discarded.
    pub fn from_parts(len: usize, x: Bits, z: Bits) -> Self {
        let mask = Bits::low_mask(len);
        Self {
            len,
            x: x & &mask,
            z: z & &mask,
        }
    }

    /// A single-qubit Pauli placed on `qubit` of a `len`-qubit register.
    pub fn single(len: usize, qubit: usize, pauli: Pauli) -> Self {
        let mut e = Self::identity(len);
        e.set(qubit, pauli);
        e
    }

    /// Build from per-qubit X and Z flags (qubit 0 first).
    pub fn from_lists(x: &[bool], z: &[bool]) -> IrResult<Self> {
        if x.len() != z.len() {
            return Err(IrError::LengthMismatch {
                left: x.len(),
                right: z.len(),
            });
        }
        Ok(Self {
            len: x.len(),
            x: Bits::from_bools(x.iter().copied()),
            z: Bits::from_bools(z.iter().copied()),
        })
    }

    /// Number of qubits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-qubit operator.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// X part as bits (qubit 0 = MSB).
    pub fn x_bits(&self) -> &Bits {
        &self.x
    }

    /// Z part as bits (qubit 0 = MSB).
    pub fn z_bits(&self) -> &Bits {
        &self.z
    }

    /// True if the error acts trivially on every qubit.
    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.z.is_zero()
    }

    fn bit_index(&self, qubit: usize) -> usize {
        self.len - 1 - qubit
    }

    /// Single-qubit component on `qubit`.
    pub fn get(&self, qubit: usize) -> Pauli {
        let i = self.bit_index(qubit);
        Pauli::from_bits(self.x.bit(i), self.z.bit(i))
    }

    /// Overwrite the single-qubit component on `qubit`.
    pub fn set(&mut self, qubit: usize, pauli: Pauli) {
        let i = self.bit_index(qubit);
        self.x.set_bit(i, pauli.x_bit());
        self.z.set_bit(i, pauli.z_bit());
    }

    /// Number of qubits on which the error acts non-trivially.
    pub fn weight(&self) -> usize {
        (&self.x | &self.z).weight()
    }

    /// Qubits on which the error acts non-trivially, ascending.
    pub fn support(&self) -> Vec<usize> {
        (0..self.len)
            .filter(|&q| self.get(q) != Pauli::I)
            .collect()
    }

    /// True if the two errors commute.
    pub fn commutes_with(&self, other: &PauliError) -> bool {
        (&self.x & &other.z).parity() == (&self.z & &other.x).parity()
    }

    /// The part of the error of the given type.
    ///
    /// `X` keeps the X components, `Z` the Z components and `Y` only the
    /// qubits carrying both.
    pub fn partial(&self, pauli: Pauli) -> PauliError {
        match pauli {
            Pauli::I => Self::identity(self.len),
            Pauli::X => Self {
                len: self.len,
                x: self.x.clone(),
                z: Bits::zero(),
            },
            Pauli::Z => Self {
                len: self.len,
                x: Bits::zero(),
                z: self.z.clone(),
            },
            Pauli::Y => {
                let both = &self.x & &self.z;
                Self {
                    len: self.len,
                    x: both.clone(),
                    z: both,
                }
            }
        }
    }

    /// Tensor product `self ⊗ other`.
    pub fn tensor(&self, other: &PauliError) -> PauliError {
        Self {
            len: self.len + other.len,
            x: (&self.x << other.len) ^ &other.x,
            z: (&self.z << other.len) ^ &other.z,
        }
    }

    /// `self` tensored with itself `n` times.
    pub fn pow(&self, n: usize) -> PauliError {
        (0..n).fold(Self::identity(0), |acc, _| acc.tensor(self))
    }

    /// Place this error on qubits `offset..offset+len` of a `total`-qubit
    /// register.
    pub fn embed(&self, total: usize, offset: usize) -> PauliError {
        let shift = total - offset - self.len;
        Self {
            len: total,
            x: &self.x << shift,
            z: &self.z << shift,
        }
    }

    /// The single-qubit components, qubit 0 first.
    pub fn to_list(&self) -> Vec<Pauli> {
        (0..self.len).map(|q| self.get(q)).collect()
    }
}

impl Mul<&PauliError> for &PauliError {
    type Output = PauliError;

    fn mul(self, rhs: &PauliError) -> PauliError {
        PauliError {
            len: self.len.max(rhs.len),
            x: &self.x ^ &rhs.x,
            z: &self.z ^ &rhs.z,
        }
    }
}

impl Mul for PauliError {
    type Output = PauliError;

    fn mul(self, rhs: PauliError) -> PauliError {
        &self * &rhs
    }
}

impl MulAssign<&PauliError> for PauliError {
    fn mul_assign(&mut self, rhs: &PauliError) {
        self.len = self.len.max(rhs.len);
        self.x ^= &rhs.x;
        self.z ^= &rhs.z;
    }
}

impl FromStr for PauliError {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut x = Vec::with_capacity(s.len());
        let mut z = Vec::with_capacity(s.len());
        for c in s.chars() {
            let p = match c.to_ascii_uppercase() {
                'I' => Pauli::I,
                'X' => Pauli::X,
                'Z' => Pauli::Z,
                'Y' => Pauli::Y,
                other => return Err(IrError::InvalidPauli(other)),
            };
            x.push(p.x_bit());
            z.push(p.z_bit());
        }
        Self::from_lists(&x, &z)
    }
}

impl From<Pauli> for PauliError {
    fn from(p: Pauli) -> Self {
        Self::single(1, 0, p)
    }
}

impl fmt::Display for PauliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for q in 0..self.len {
            write!(f, "{}", self.get(q))?;
        }
        Ok(())
    }
}
