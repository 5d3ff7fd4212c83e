use ark_ff::{Fp, FpConfig};
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_rational::BigRational;
use std::{
    fmt::{Debug, Display},
    hash::Hash,
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

/// Arithmetic a polynomial needs from its coefficient ring.
///
/// Fields answer `inverse` for every nonzero element; integral domains only
/// for units and fall back to `checked_div` and `gcd` for pseudo-division.
pub trait Coefficient:
    Sized
    + Clone
    + Debug
    + Display
    + PartialEq
    + Eq
    + Hash
    + Send
    + Sync
    + 'static
    + Neg<Output = Self>
    + for<'a> AddAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> Add<&'a Self, Output = Self>
    + for<'a> Sub<&'a Self, Output = Self>
    + for<'a> Mul<&'a Self, Output = Self>
{
    fn zero() -> Self;

    fn one() -> Self;

    fn is_zero(&self) -> bool;

    fn is_one(&self) -> bool {
        *self == Self::one()
    }

    fn is_unit(&self) -> bool {
        self.inverse().is_some()
    }

    fn inverse(&self) -> Option<Self>;

    /// Exact quotient `self / rhs`, `None` when `rhs` does not divide `self`.
    fn checked_div(&self, rhs: &Self) -> Option<Self>;

    /// A common divisor of both operands, the greatest one where the ring
    /// has a cheap gcd.
    fn gcd(&self, other: &Self) -> Self;

    /// The unit `u` with `self = u * a` for the preferred associate `a`.
    fn unit_part(&self) -> Self {
        Self::one()
    }

    fn is_field() -> bool;

    fn from_i64(n: i64) -> Self;

    fn characteristic() -> BigUint;
}

impl<P: FpConfig<N>, const N: usize> Coefficient for Fp<P, N> {
    fn zero() -> Self {
        <Self as ark_ff::Zero>::zero()
    }

    fn one() -> Self {
        <Self as ark_ff::One>::one()
    }

    fn is_zero(&self) -> bool {
        <Self as ark_ff::Zero>::is_zero(self)
    }

    fn is_one(&self) -> bool {
        <Self as ark_ff::One>::is_one(self)
    }

    fn inverse(&self) -> Option<Self> {
        <Self as ark_ff::Field>::inverse(self)
    }

    fn checked_div(&self, rhs: &Self) -> Option<Self> {
        Coefficient::inverse(rhs).map(|inv| inv * self)
    }

    fn gcd(&self, other: &Self) -> Self {
        if Coefficient::is_zero(self) && Coefficient::is_zero(other) {
            <Self as Coefficient>::zero()
        } else {
            <Self as Coefficient>::one()
        }
    }

    fn is_field() -> bool {
        true
    }

    fn from_i64(n: i64) -> Self {
        Self::from(n)
    }

    fn characteristic() -> BigUint {
        BigUint::from(P::MODULUS)
    }
}

impl Coefficient for BigRational {
    fn zero() -> Self {
        num_traits::Zero::zero()
    }

    fn one() -> Self {
        num_traits::One::one()
    }

    fn is_zero(&self) -> bool {
        num_traits::Zero::is_zero(self)
    }

    fn is_one(&self) -> bool {
        num_traits::One::is_one(self)
    }

    fn inverse(&self) -> Option<Self> {
        (!Coefficient::is_zero(self)).then(|| self.recip())
    }

    fn checked_div(&self, rhs: &Self) -> Option<Self> {
        (!Coefficient::is_zero(rhs)).then(|| self / rhs)
    }

    fn gcd(&self, other: &Self) -> Self {
        if Coefficient::is_zero(self) && Coefficient::is_zero(other) {
            <Self as Coefficient>::zero()
        } else {
            <Self as Coefficient>::one()
        }
    }

    fn is_field() -> bool {
        true
    }

    fn from_i64(n: i64) -> Self {
        BigRational::from_integer(BigInt::from(n))
    }

    fn characteristic() -> BigUint {
        BigUint::default()
    }
}

impl Coefficient for BigInt {
    fn zero() -> Self {
        num_traits::Zero::zero()
    }

    fn one() -> Self {
        num_traits::One::one()
    }

    fn is_zero(&self) -> bool {
        num_traits::Zero::is_zero(self)
    }

    fn inverse(&self) -> Option<Self> {
        let one: BigInt = num_traits::One::one();
        (self.magnitude() == one.magnitude()).then(|| self.clone())
    }

    fn checked_div(&self, rhs: &Self) -> Option<Self> {
        if Coefficient::is_zero(rhs) {
            return None;
        }
        let (quotient, remainder) = self.div_rem(rhs);
        Coefficient::is_zero(&remainder).then_some(quotient)
    }

    fn gcd(&self, other: &Self) -> Self {
        Integer::gcd(self, other)
    }

    fn unit_part(&self) -> Self {
        if self.sign() == Sign::Minus {
            BigInt::from(-1)
        } else {
            num_traits::One::one()
        }
    }

    fn is_field() -> bool {
        false
    }

    fn from_i64(n: i64) -> Self {
        BigInt::from(n)
    }

    fn characteristic() -> BigUint {
        BigUint::default()
    }
}

/// Image of an integer in `D`, reduced modulo the characteristic for
/// prime fields.
pub fn from_bigint<D: Coefficient>(n: &BigInt) -> D {
    let (sign, digits) = n.to_u32_digits();
    let base = D::from_i64(1 << 32);
    let value = digits
        .iter()
        .rev()
        .fold(D::zero(), |acc, &d| acc * &base + &D::from_i64(d as i64));
    if sign == Sign::Minus {
        -value
    } else {
        value
    }
}

/// Shorthand for building rationals in tests and fixtures.
pub fn rational(numer: i64, denom: i64) -> BigRational {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GF;

    #[test]
    fn test_prime_field_inverse() {
        let a = GF::from_i64(-7);
        let inv = Coefficient::inverse(&a).unwrap();
        assert!(Coefficient::is_one(&(a * &inv)));
        assert!(Coefficient::inverse(&<GF as Coefficient>::zero()).is_none());
        assert!(GF::is_field());
        assert_eq!(
            GF::characteristic(),
            BigUint::from(18446744073709551557u64)
        );
    }

    #[test]
    fn test_rational_division() {
        let a = rational(3, 4);
        let b = rational(-1, 2);
        assert_eq!(Coefficient::checked_div(&a, &b), Some(rational(-3, 2)));
        assert_eq!(
            Coefficient::checked_div(&a, &<BigRational as Coefficient>::zero()),
            None
        );
        assert!(BigRational::characteristic() == BigUint::default());
    }

    #[test]
    fn test_integer_domain() {
        let six = <BigInt as Coefficient>::from_i64(6);
        let four = <BigInt as Coefficient>::from_i64(4);
        assert_eq!(Coefficient::checked_div(&six, &four), None);
        assert_eq!(
            Coefficient::checked_div(&six, &<BigInt as Coefficient>::from_i64(-3)),
            Some(<BigInt as Coefficient>::from_i64(-2))
        );
        assert_eq!(Coefficient::gcd(&six, &four), <BigInt as Coefficient>::from_i64(2));
        assert!(<BigInt as Coefficient>::from_i64(-1).is_unit());
        assert!(!<BigInt as Coefficient>::from_i64(2).is_unit());
        assert!(!BigInt::is_field());
        assert_eq!(
            <BigInt as Coefficient>::from_i64(-5).unit_part(),
            <BigInt as Coefficient>::from_i64(-1)
        );
    }

    #[test]
    fn test_big_integers_map_into_prime_field() {
        // 2^64 is 59 above the modulus
        let two_64 = BigInt::from(1u128 << 64);
        assert_eq!(from_bigint::<GF>(&two_64), GF::from_i64(59));
        assert_eq!(from_bigint::<GF>(&-two_64.clone()), GF::from_i64(-59));
        assert_eq!(from_bigint::<GF>(&BigInt::from(-12)), GF::from_i64(-12));
        assert_eq!(from_bigint::<BigRational>(&two_64), BigRational::from_integer(two_64));
    }
}
