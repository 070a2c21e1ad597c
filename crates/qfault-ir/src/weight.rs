//! Count weights.
//!
//! Fault counts are weighted sums. Integer weights give exact counts, `f64`
//! weights support transformed noise models, and the symbolic types let a
//! caller carry γ-dependence through the counts themselves.

use std::fmt::Debug;
use std::ops::{Add, Mul};

use crate::poly::{Polynomial, RationalFunction};

/// A value that can be accumulated and multiplied in fault counts.
pub trait Weight:
    Clone + Debug + PartialEq + Send + Sync + 'static + Add<Output = Self> + Mul<Output = Self>
{
    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    /// True for the additive identity.
    fn is_zero(&self) -> bool;

    /// `self += other`.
    fn accumulate(&mut self, other: &Self) {
        *self = self.clone() + other.clone();
    }

    /// `self * other`.
    fn product(&self, other: &Self) -> Self {
        self.clone() * other.clone()
    }

    /// A weight at least as large as both `self` and `other` for every
    /// γ ≥ 0. Non-negative weights may fall back to the sum.
    fn dominant(&self, other: &Self) -> Self {
        self.clone() + other.clone()
    }

    /// The weight as a function of γ.
    fn to_rational(&self) -> RationalFunction;
}

impl Weight for u64 {
    fn zero() -> Self {
        0
    }

    fn one() -> Self {
        1
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn accumulate(&mut self, other: &Self) {
        *self += *other;
    }

    fn product(&self, other: &Self) -> Self {
        self * other
    }

    fn dominant(&self, other: &Self) -> Self {
        (*self).max(*other)
    }

    fn to_rational(&self) -> RationalFunction {
        RationalFunction::constant(*self as f64)
    }
}

impl Weight for u128 {
    fn zero() -> Self {
        0
    }

    fn one() -> Self {
        1
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn accumulate(&mut self, other: &Self) {
        *self += *other;
    }

    fn product(&self, other: &Self) -> Self {
        self * other
    }

    fn dominant(&self, other: &Self) -> Self {
        (*self).max(*other)
    }

    fn to_rational(&self) -> RationalFunction {
        RationalFunction::constant(*self as f64)
    }
}

impl Weight for f64 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn accumulate(&mut self, other: &Self) {
        *self += *other;
    }

    fn product(&self, other: &Self) -> Self {
        self * other
    }

    fn dominant(&self, other: &Self) -> Self {
        self.max(*other)
    }

    fn to_rational(&self) -> RationalFunction {
        RationalFunction::constant(*self)
    }
}

impl Weight for Polynomial {
    fn zero() -> Self {
        Polynomial::zero()
    }

    fn one() -> Self {
        Polynomial::constant(1.0)
    }

    fn is_zero(&self) -> bool {
        Polynomial::is_zero(self)
    }

    fn accumulate(&mut self, other: &Self) {
        *self += other;
    }

    fn product(&self, other: &Self) -> Self {
        self * other
    }

    /// Coefficient-wise maximum.
    fn dominant(&self, other: &Self) -> Self {
        let n = self.coeffs().len().max(other.coeffs().len());
        Polynomial::new((0..n).map(|i| self.coeff(i).max(other.coeff(i))).collect())
    }

    fn to_rational(&self) -> RationalFunction {
        RationalFunction::from_polynomial(self.clone())
    }
}

impl Weight for RationalFunction {
    fn zero() -> Self {
        RationalFunction::zero()
    }

    fn one() -> Self {
        RationalFunction::one()
    }

    fn is_zero(&self) -> bool {
        RationalFunction::is_zero(self)
    }

    fn accumulate(&mut self, other: &Self) {
        *self += other;
    }

    fn product(&self, other: &Self) -> Self {
        self * other
    }

    fn to_rational(&self) -> RationalFunction {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_products<W: Weight>(pairs: &[(W, W)]) -> W {
        let mut acc = W::zero();
        for (a, b) in pairs {
            acc.accumulate(&a.product(b));
        }
        acc
    }

    #[test]
    fn test_generic_accumulation() {
        assert_eq!(sum_products(&[(2u64, 3), (4, 5)]), 26);
        assert_eq!(sum_products(&[(0.5f64, 2.0), (1.0, 1.0)]), 2.0);
        let p = sum_products(&[(Polynomial::x(), Polynomial::x())]);
        assert_eq!(p.coeffs(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_identities() {
        assert!(u64::zero().is_zero());
        assert_eq!(u128::one(), 1);
        assert!(RationalFunction::zero().is_zero());
        assert_eq!(7u64.to_rational().eval(0.3), 7.0);
    }

    #[test]
    fn test_dominant_bounds_both() {
        assert_eq!(3u64.dominant(&5), 5);
        assert_eq!(2.5f64.dominant(&1.0), 2.5);
        let a = Polynomial::new(vec![1.0, 0.0, 4.0]);
        let b = Polynomial::new(vec![0.5, 2.0]);
        assert_eq!(a.dominant(&b).coeffs(), &[1.0, 2.0, 4.0]);
        let r = RationalFunction::constant(2.0).dominant(&RationalFunction::constant(3.0));
        assert!(r.eval(0.1) >= 3.0);
    }
}
