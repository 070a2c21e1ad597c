//! Univariate polynomials and rational functions in the noise strength γ.
//!
//! Every probability bound is a [`RationalFunction`] of γ. Noise-model
//! likelihoods have denominators like `(1 − 12γ)`, and high-order bounds raise
//! them to large powers, so the denominator is kept as a product of linear
//! factors `(1 − cγ)^e` (plus a residual polynomial for anything else)
//! instead of being expanded. Evaluation and differentiation stay accurate
//! for exponents where the expanded coefficients would overflow `f64`
//! precision.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub};

/// A polynomial with `f64` coefficients, lowest degree first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// Create from coefficients, lowest degree first.
    pub fn new(coeffs: Vec<f64>) -> Self {
        let mut p = Self { coeffs };
        p.trim();
        p
    }

    /// The zero polynomial.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant.
    pub fn constant(c: f64) -> Self {
        Self::new(vec![c])
    }

    /// The monomial `γ`.
    pub fn x() -> Self {
        Self::new(vec![0.0, 1.0])
    }

    /// `c0 + c1·γ`.
    pub fn linear(c0: f64, c1: f64) -> Self {
        Self::new(vec![c0, c1])
    }

    /// `c·γ^k`.
    pub fn monomial(c: f64, k: usize) -> Self {
        let mut coeffs = vec![0.0; k + 1];
        coeffs[k] = c;
        Self::new(coeffs)
    }

    fn trim(&mut self) {
        while self.coeffs.last() == Some(&0.0) {
            self.coeffs.pop();
        }
    }

    /// True for the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree (0 for constants and for the zero polynomial).
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Coefficient of `γ^i`.
    pub fn coeff(&self, i: usize) -> f64 {
        self.coeffs.get(i).copied().unwrap_or(0.0)
    }

    /// All coefficients, lowest degree first.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// The constant value, if this polynomial has degree zero.
    pub fn as_constant(&self) -> Option<f64> {
        match self.coeffs.len() {
            0 => Some(0.0),
            1 => Some(self.coeffs[0]),
            _ => None,
        }
    }

    /// Evaluate at `x` (Horner).
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// First derivative.
    pub fn derivative(&self) -> Polynomial {
        Polynomial::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, &c)| c * i as f64)
                .collect(),
        )
    }

    /// `self^n`.
    pub fn pow(&self, n: u32) -> Polynomial {
        let mut result = Polynomial::constant(1.0);
        let mut base = self.clone();
        let mut n = n;
        while n > 0 {
            if n & 1 == 1 {
                result = &result * &base;
            }
            base = &base * &base;
            n >>= 1;
        }
        result
    }

    /// Multiply by a scalar.
    pub fn scale(&self, c: f64) -> Polynomial {
        Polynomial::new(self.coeffs.iter().map(|&a| a * c).collect())
    }
}

impl From<f64> for Polynomial {
    fn from(c: f64) -> Self {
        Polynomial::constant(c)
    }
}

impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let len = self.coeffs.len().max(rhs.coeffs.len());
        Polynomial::new((0..len).map(|i| self.coeff(i) + rhs.coeff(i)).collect())
    }
}

impl Sub<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        let len = self.coeffs.len().max(rhs.coeffs.len());
        Polynomial::new((0..len).map(|i| self.coeff(i) - rhs.coeff(i)).collect())
    }
}

impl Mul<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        if self.is_zero() || rhs.is_zero() {
            return Polynomial::zero();
        }
        let mut coeffs = vec![0.0; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial::new(coeffs)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

macro_rules! forward_owned {
    ($ty:ty, $trait:ident, $method:ident) => {
        impl $trait for $ty {
            type Output = $ty;

            fn $method(self, rhs: $ty) -> $ty {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&$ty> for $ty {
            type Output = $ty;

            fn $method(self, rhs: &$ty) -> $ty {
                (&self).$method(rhs)
            }
        }
    };
}

forward_owned!(Polynomial, Add, add);
forward_owned!(Polynomial, Sub, sub);
forward_owned!(Polynomial, Mul, mul);

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        -&self
    }
}

impl Mul<f64> for Polynomial {
    type Output = Polynomial;

    fn mul(self, c: f64) -> Polynomial {
        self.scale(c)
    }
}

impl AddAssign<&Polynomial> for Polynomial {
    fn add_assign(&mut self, rhs: &Polynomial) {
        *self = &*self + rhs;
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (i, &c) in self.coeffs.iter().enumerate() {
            if c == 0.0 {
                continue;
            }
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            match i {
                0 => write!(f, "{c}")?,
                1 => write!(f, "{c}γ")?,
                _ => write!(f, "{c}γ^{i}")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rational functions
// ---------------------------------------------------------------------------

/// `numerator / (∏ (1 − c·γ)^e · residual)`.
///
/// Linear factors are kept sorted by `c` with positive exponents. The
/// residual is either the constant 1 or a non-constant polynomial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationalFunction {
    numer: Polynomial,
    factors: Vec<(f64, u32)>,
    residual: Polynomial,
}

impl RationalFunction {
    /// Build from parts, normalising the representation.
    fn from_parts(numer: Polynomial, factors: Vec<(f64, u32)>, residual: Polynomial) -> Self {
        let (numer, residual) = match residual.as_constant() {
            Some(c) if c != 1.0 => (numer.scale(1.0 / c), Polynomial::constant(1.0)),
            _ => (numer, residual),
        };
        let mut factors: Vec<(f64, u32)> = factors.into_iter().filter(|&(_, e)| e > 0).collect();
        factors.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut merged: Vec<(f64, u32)> = Vec::with_capacity(factors.len());
        for (c, e) in factors {
            if c == 0.0 {
                continue;
            }
            if let Some(last) = merged.last_mut() {
                if last.0 == c {
                    last.1 += e;
                    continue;
                }
            }
            merged.push((c, e));
        }
        if numer.is_zero() {
            return Self::zero();
        }
        Self {
            numer,
            factors: merged,
            residual,
        }
    }

    /// The zero function.
    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    /// The constant one.
    pub fn one() -> Self {
        Self::constant(1.0)
    }

    /// A constant.
    pub fn constant(c: f64) -> Self {
        Self::from_polynomial(Polynomial::constant(c))
    }

    /// The identity function `γ`.
    pub fn x() -> Self {
        Self::from_polynomial(Polynomial::x())
    }

    /// A polynomial (denominator 1).
    pub fn from_polynomial(p: Polynomial) -> Self {
        Self {
            numer: p,
            factors: Vec::new(),
            residual: Polynomial::constant(1.0),
        }
    }

    /// `numer / (1 − c·γ)^e`.
    pub fn over_linear(numer: Polynomial, c: f64, e: u32) -> Self {
        Self::from_parts(numer, vec![(c, e)], Polynomial::constant(1.0))
    }

    /// `numer / denom` for an arbitrary polynomial denominator.
    pub fn ratio(numer: Polynomial, denom: Polynomial) -> Self {
        Self::from_parts(numer, Vec::new(), denom)
    }

    /// True if the numerator is zero.
    pub fn is_zero(&self) -> bool {
        self.numer.is_zero()
    }

    /// The numerator polynomial.
    pub fn numerator(&self) -> &Polynomial {
        &self.numer
    }

    /// The linear denominator factors `(c, e)` of `(1 − c·γ)^e`.
    pub fn linear_factors(&self) -> &[(f64, u32)] {
        &self.factors
    }

    /// The denominator, fully expanded.
    pub fn denominator(&self) -> Polynomial {
        expand_factors(&self.factors, &[]) * &self.residual
    }

    /// Evaluate at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let denom = self
            .factors
            .iter()
            .fold(self.residual.eval(x), |acc, &(c, e)| {
                acc * (1.0 - c * x).powi(e as i32)
            });
        self.numer.eval(x) / denom
    }

    /// First derivative.
    pub fn derivative(&self) -> RationalFunction {
        // f = N / (F·R), F = ∏ (1 − c_i γ)^e_i.
        // f' = [N'·L·R + N·Σ e_i c_i L/(1 − c_i γ)·R − N·R'·L] / (F·L·R²)
        // where L = ∏ (1 − c_i γ).
        let linear: Vec<(f64, u32)> = self.factors.iter().map(|&(c, _)| (c, 1)).collect();
        let l = expand_factors(&linear, &[]);
        let mut numer = &(&self.numer.derivative() * &l) * &self.residual;
        for (i, &(c, e)) in self.factors.iter().enumerate() {
            let others = expand_factors(&linear, &[i]);
            numer += &(&(&self.numer * &others) * &self.residual).scale(f64::from(e) * c);
        }
        numer = &numer - &(&(&self.numer * &self.residual.derivative()) * &l);
        let mut factors = self.factors.clone();
        factors.extend(linear);
        let residual = &self.residual * &self.residual;
        Self::from_parts(numer, factors, residual)
    }

    /// `self^n`.
    pub fn pow(&self, n: u32) -> RationalFunction {
        Self::from_parts(
            self.numer.pow(n),
            self.factors.iter().map(|&(c, e)| (c, e * n)).collect(),
            self.residual.pow(n),
        )
    }

    /// Multiply by a scalar.
    pub fn scale(&self, c: f64) -> RationalFunction {
        Self::from_parts(self.numer.scale(c), self.factors.clone(), self.residual.clone())
    }

    /// `1 / self`.
    pub fn recip(&self) -> RationalFunction {
        let numer = expand_factors(&self.factors, &[]) * &self.residual;
        Self::from_parts(numer, Vec::new(), self.numer.clone())
    }
}

/// `∏ (1 − c·γ)^e`, skipping the factors at the indices in `skip`.
fn expand_factors(factors: &[(f64, u32)], skip: &[usize]) -> Polynomial {
    factors
        .iter()
        .enumerate()
        .filter(|(i, _)| !skip.contains(i))
        .fold(Polynomial::constant(1.0), |acc, (_, &(c, e))| {
            &acc * &Polynomial::linear(1.0, -c).pow(e)
        })
}

/// Exponent of the factor `c` in `factors`.
fn exponent(factors: &[(f64, u32)], c: f64) -> u32 {
    factors
        .iter()
        .find(|&&(fc, _)| fc == c)
        .map_or(0, |&(_, e)| e)
}

impl From<f64> for RationalFunction {
    fn from(c: f64) -> Self {
        RationalFunction::constant(c)
    }
}

impl From<Polynomial> for RationalFunction {
    fn from(p: Polynomial) -> Self {
        RationalFunction::from_polynomial(p)
    }
}

impl Add<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn add(self, rhs: &RationalFunction) -> RationalFunction {
        if self.is_zero() {
            return rhs.clone();
        }
        if rhs.is_zero() {
            return self.clone();
        }
        // Least common multiple of the linear factors.
        let mut common: Vec<(f64, u32)> = self.factors.clone();
        for &(c, e) in &rhs.factors {
            match common.iter_mut().find(|f| f.0 == c) {
                Some(f) => f.1 = f.1.max(e),
                None => common.push((c, e)),
            }
        }
        let lift = |own: &[(f64, u32)]| -> Polynomial {
            common
                .iter()
                .fold(Polynomial::constant(1.0), |acc, &(c, e)| {
                    &acc * &Polynomial::linear(1.0, -c).pow(e - exponent(own, c))
                })
        };
        let (residual, ra, rb) = if self.residual == rhs.residual {
            (self.residual.clone(), Polynomial::constant(1.0), Polynomial::constant(1.0))
        } else {
            (
                &self.residual * &rhs.residual,
                rhs.residual.clone(),
                self.residual.clone(),
            )
        };
        let a = &(&self.numer * &lift(&self.factors)) * &ra;
        let b = &(&rhs.numer * &lift(&rhs.factors)) * &rb;
        RationalFunction::from_parts(&a + &b, common, residual)
    }
}

impl Mul<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn mul(self, rhs: &RationalFunction) -> RationalFunction {
        if self.is_zero() || rhs.is_zero() {
            return RationalFunction::zero();
        }
        let mut factors = self.factors.clone();
        factors.extend_from_slice(&rhs.factors);
        RationalFunction::from_parts(
            &self.numer * &rhs.numer,
            factors,
            &self.residual * &rhs.residual,
        )
    }
}

impl Div<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn div(self, rhs: &RationalFunction) -> RationalFunction {
        self * &rhs.recip()
    }
}

impl Neg for &RationalFunction {
    type Output = RationalFunction;

    fn neg(self) -> RationalFunction {
        self.scale(-1.0)
    }
}

impl Sub<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn sub(self, rhs: &RationalFunction) -> RationalFunction {
        self + &(-rhs)
    }
}

forward_owned!(RationalFunction, Add, add);
forward_owned!(RationalFunction, Sub, sub);
forward_owned!(RationalFunction, Mul, mul);
forward_owned!(RationalFunction, Div, div);

impl Neg for RationalFunction {
    type Output = RationalFunction;

    fn neg(self) -> RationalFunction {
        -&self
    }
}

impl Mul<f64> for RationalFunction {
    type Output = RationalFunction;

    fn mul(self, c: f64) -> RationalFunction {
        self.scale(c)
    }
}

impl AddAssign<&RationalFunction> for RationalFunction {
    fn add_assign(&mut self, rhs: &RationalFunction) {
        *self = &*self + rhs;
    }
}

impl MulAssign<&RationalFunction> for RationalFunction {
    fn mul_assign(&mut self, rhs: &RationalFunction) {
        *self = &*self * rhs;
    }
}

impl std::iter::Sum for RationalFunction {
    fn sum<I: Iterator<Item = RationalFunction>>(iter: I) -> Self {
        iter.fold(RationalFunction::zero(), |acc, r| &acc + &r)
    }
}

impl fmt::Display for RationalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() && self.residual.as_constant() == Some(1.0) {
            return write!(f, "{}", self.numer);
        }
        write!(f, "({}) / (", self.numer)?;
        let mut first = true;
        for &(c, e) in &self.factors {
            if !first {
                write!(f, " · ")?;
            }
            first = false;
            write!(f, "(1 - {c}γ)")?;
            if e > 1 {
                write!(f, "^{e}")?;
            }
        }
        if self.residual.as_constant() != Some(1.0) {
            if !first {
                write!(f, " · ")?;
            }
            write!(f, "({})", self.residual)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn test_polynomial_arithmetic() {
        let p = Polynomial::new(vec![1.0, 2.0]);
        let q = Polynomial::new(vec![0.0, 0.0, 3.0]);
        assert_eq!((&p * &q).coeffs(), &[0.0, 0.0, 3.0, 6.0]);
        assert_eq!((&p + &q).degree(), 2);
        assert!((&p - &p).is_zero());
        assert_eq!(p.pow(3).eval(1.0), 27.0);
        assert_eq!(q.derivative().coeffs(), &[0.0, 6.0]);
        assert_eq!(p.to_string(), "1 + 2γ");
    }

    #[test]
    fn test_rational_eval() {
        // γ / (1 − 12γ)
        let r = RationalFunction::over_linear(Polynomial::x(), 12.0, 1);
        assert!(close(r.eval(0.01), 0.01 / 0.88));
        let r3 = r.pow(3);
        assert!(close(r3.eval(0.01), (0.01f64 / 0.88).powi(3)));
        assert_eq!(r3.linear_factors(), &[(12.0, 3)]);
    }

    #[test]
    fn test_rational_add_uses_common_factors() {
        let a = RationalFunction::over_linear(Polynomial::constant(1.0), 4.0, 2);
        let b = RationalFunction::over_linear(Polynomial::x(), 4.0, 1);
        let c = RationalFunction::over_linear(Polynomial::constant(2.0), 15.0, 1);
        let sum = &(&a + &b) + &c;
        let x: f64 = 0.003;
        let expected = 1.0 / (1.0 - 4.0 * x).powi(2) + x / (1.0 - 4.0 * x) + 2.0 / (1.0 - 15.0 * x);
        assert!(close(sum.eval(x), expected));
        assert_eq!(sum.linear_factors(), &[(4.0, 2), (15.0, 1)]);
    }

    #[test]
    fn test_rational_derivative() {
        let r = &RationalFunction::over_linear(Polynomial::monomial(3.0, 2), 12.0, 4)
            + &RationalFunction::ratio(Polynomial::x(), Polynomial::linear(2.0, 1.0));
        let d = r.derivative();
        for x in [0.0, 0.001, 0.01, 0.05] {
            let h = 1e-6;
            let numeric = (r.eval(x + h) - r.eval(x - h)) / (2.0 * h);
            assert!((d.eval(x) - numeric).abs() < 1e-5, "x={x}");
        }
    }

    #[test]
    fn test_rational_division_and_sub() {
        let a = RationalFunction::over_linear(Polynomial::x(), 1.0, 1);
        let b = RationalFunction::from_polynomial(Polynomial::linear(1.0, 1.0));
        let q = &a / &b;
        assert!(close(q.eval(0.2), 0.2 / 0.8 / 1.2));
        assert!((&a - &a).is_zero());
        assert!(close((RationalFunction::one() - a).eval(0.5), -0.0));
    }
}
