use derivative::Derivative;
use num_bigint::BigUint;
use std::{
    fmt,
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use crate::poly::coefficient::Coefficient;

/// Element of a direct product of rings `R_0 x R_1 x ...`.
///
/// Components past the end of `comps` all equal `fill`, which lets the
/// constants `zero`, `one` and `from_i64` exist without knowing the number
/// of factors. Trailing components equal to `fill` are always trimmed so
/// that equal elements compare and hash alike.
#[derive(Derivative)]
#[derivative(Clone, PartialEq, Eq, Hash)]
pub struct Product<R> {
    comps: Vec<R>,
    fill: R,
}

impl<R: Coefficient> Product<R> {
    /// Finitely many components, zero afterwards.
    pub fn new(comps: Vec<R>) -> Self {
        Self::normalized(comps, R::zero())
    }

    fn normalized(mut comps: Vec<R>, fill: R) -> Self {
        while comps.last() == Some(&fill) {
            comps.pop();
        }
        Self { comps, fill }
    }

    pub fn component(&self, i: usize) -> &R {
        self.comps.get(i).unwrap_or(&self.fill)
    }

    /// Number of explicitly stored components.
    pub fn len(&self) -> usize {
        self.comps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comps.is_empty()
    }

    fn zip_with(&self, rhs: &Self, f: impl Fn(&R, &R) -> R) -> Self {
        let len = self.comps.len().max(rhs.comps.len());
        let comps = (0..len)
            .map(|i| f(self.component(i), rhs.component(i)))
            .collect();
        Self::normalized(comps, f(&self.fill, &rhs.fill))
    }

    fn map(&self, f: impl Fn(&R) -> R) -> Self {
        Self::normalized(self.comps.iter().map(&f).collect(), f(&self.fill))
    }

    /// One where the component is nonzero, zero elsewhere.
    pub fn idempotent(&self) -> Self {
        self.map(|c| if c.is_zero() { R::zero() } else { R::one() })
    }

    /// `1 - self.idempotent()`.
    pub fn complement(&self) -> Self {
        self.map(|c| if c.is_zero() { R::one() } else { R::zero() })
    }

    /// Componentwise inverse on the support, zero elsewhere. Exists whenever
    /// every nonzero component is a unit.
    pub fn quasi_inverse(&self) -> Option<Self> {
        let inv = |c: &R| {
            if c.is_zero() {
                Some(R::zero())
            } else {
                c.inverse()
            }
        };
        let comps = self.comps.iter().map(inv).collect::<Option<Vec<_>>>()?;
        Some(Self::normalized(comps, inv(&self.fill)?))
    }

    /// Whether `self` is zero in every component where `other` is nonzero.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        (self.clone() * other).is_zero()
    }
}

impl<R: Coefficient> fmt::Debug for Product<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl<R: Coefficient> fmt::Display for Product<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for c in &self.comps {
            write!(f, "{c}, ")?;
        }
        write!(f, "{}..)", self.fill)
    }
}

impl<R: Coefficient> Neg for Product<R> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.map(|c| -c.clone())
    }
}

impl<'a, R: Coefficient> AddAssign<&'a Self> for Product<R> {
    fn add_assign(&mut self, rhs: &'a Self) {
        *self = self.zip_with(rhs, |a, b| a.clone() + b);
    }
}

impl<'a, R: Coefficient> SubAssign<&'a Self> for Product<R> {
    fn sub_assign(&mut self, rhs: &'a Self) {
        *self = self.zip_with(rhs, |a, b| a.clone() - b);
    }
}

impl<'a, R: Coefficient> MulAssign<&'a Self> for Product<R> {
    fn mul_assign(&mut self, rhs: &'a Self) {
        *self = self.zip_with(rhs, |a, b| a.clone() * b);
    }
}

impl<'a, R: Coefficient> Add<&'a Self> for Product<R> {
    type Output = Self;

    fn add(self, rhs: &'a Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a.clone() + b)
    }
}

impl<'a, R: Coefficient> Sub<&'a Self> for Product<R> {
    type Output = Self;

    fn sub(self, rhs: &'a Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a.clone() - b)
    }
}

impl<'a, R: Coefficient> Mul<&'a Self> for Product<R> {
    type Output = Self;

    fn mul(self, rhs: &'a Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a.clone() * b)
    }
}

impl<R: Coefficient> Coefficient for Product<R> {
    fn zero() -> Self {
        Self {
            comps: Vec::new(),
            fill: R::zero(),
        }
    }

    fn one() -> Self {
        Self {
            comps: Vec::new(),
            fill: R::one(),
        }
    }

    fn is_zero(&self) -> bool {
        self.comps.is_empty() && self.fill.is_zero()
    }

    fn is_one(&self) -> bool {
        self.comps.is_empty() && self.fill.is_one()
    }

    fn inverse(&self) -> Option<Self> {
        let comps = self
            .comps
            .iter()
            .map(Coefficient::inverse)
            .collect::<Option<Vec<_>>>()?;
        Some(Self::normalized(comps, self.fill.inverse()?))
    }

    /// Componentwise, with `0 / 0 = 0`.
    fn checked_div(&self, rhs: &Self) -> Option<Self> {
        let div = |a: &R, b: &R| {
            if a.is_zero() {
                Some(R::zero())
            } else {
                a.checked_div(b)
            }
        };
        let len = self.comps.len().max(rhs.comps.len());
        let comps = (0..len)
            .map(|i| div(self.component(i), rhs.component(i)))
            .collect::<Option<Vec<_>>>()?;
        Some(Self::normalized(comps, div(&self.fill, &rhs.fill)?))
    }

    fn gcd(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a.gcd(b))
    }

    fn is_field() -> bool {
        false
    }

    fn from_i64(n: i64) -> Self {
        Self {
            comps: Vec::new(),
            fill: R::from_i64(n),
        }
    }

    fn characteristic() -> BigUint {
        R::characteristic()
    }
}
