use derivative::Derivative;
use num_bigint::BigUint;
use std::{
    fmt,
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    sync::Arc,
};

use crate::{
    groebner::GroebnerBaseSeq,
    module::{ModuleElement, PositionOverTerm},
    poly::{coefficient::Coefficient, monomial::Monomial, polynomial::SparsePolynomial},
};

/// `b` with `a * b = 1` modulo the Groebner basis `modulus`, read off a
/// Groebner basis of the module generated by `(a, 1)` and every `(z, 0)`:
/// an element `(c, b)` with a constant `c` exists iff `a` is invertible.
fn inverse_modulo<C: Coefficient, M: Monomial>(
    a: &SparsePolynomial<C, M>,
    modulus: &[SparsePolynomial<C, M>],
) -> Option<SparsePolynomial<C, M>> {
    if !C::is_field() || a.is_zero() {
        return None;
    }
    let num = modulus.iter().map(|z| z.num_of_vars()).fold(a.num_of_vars(), usize::max);
    let zero = SparsePolynomial::zero().with_num_of_vars(num);
    let mut generators = vec![ModuleElement::<C, M, PositionOverTerm>::new(vec![
        a.clone(),
        SparsePolynomial::one(num),
    ])];
    generators.extend(
        modulus
            .iter()
            .map(|z| ModuleElement::new(vec![z.clone(), zero.clone()])),
    );
    let gb = GroebnerBaseSeq::new().gb(&generators).ok()?;
    gb.iter().find_map(|v| {
        let lead = v.component(0);
        if !lead.is_constant() {
            return None;
        }
        let c = lead.leading_coefficient()?.inverse()?;
        Some(v.component(1).scaled(&c))
    })
}

/// Residue class ring `K[x]/Z` for a Groebner basis `Z` over a field.
#[derive(Debug, Clone)]
pub struct ResidueRing<C, M> {
    modulus: Arc<Vec<SparsePolynomial<C, M>>>,
}

impl<C: Coefficient, M: Monomial> ResidueRing<C, M> {
    /// `modulus` must be a Groebner basis.
    pub fn new(modulus: Vec<SparsePolynomial<C, M>>) -> Self {
        Self {
            modulus: Arc::new(modulus.into_iter().filter(|p| !p.is_zero()).collect()),
        }
    }

    pub fn modulus(&self) -> &[SparsePolynomial<C, M>] {
        &self.modulus
    }

    pub fn element(&self, value: &SparsePolynomial<C, M>) -> Residue<C, M> {
        Residue::reduced(value.clone(), Some(self.modulus.clone()))
    }

    pub fn zero(&self) -> Residue<C, M> {
        self.element(&SparsePolynomial::zero())
    }

    pub fn one(&self) -> Residue<C, M> {
        self.element(&SparsePolynomial::one(0))
    }

    /// The whole ring collapses to zero when the modulus contains a unit.
    pub fn is_trivial(&self) -> bool {
        self.one().is_zero()
    }
}

/// An element of a [`ResidueRing`], always kept as the normal form of its
/// representative. Constants built without a ring (`zero`, `one`,
/// `from_i64`) pick up the modulus of the first operand that carries one and
/// are reduced by it from then on.
#[derive(Derivative)]
#[derivative(Clone, PartialEq, Eq, Hash)]
pub struct Residue<C, M> {
    value: SparsePolynomial<C, M>,
    #[derivative(PartialEq = "ignore")]
    #[derivative(Hash = "ignore")]
    modulus: Option<Arc<Vec<SparsePolynomial<C, M>>>>,
}

impl<C: Coefficient, M: Monomial> Residue<C, M> {
    fn reduced(value: SparsePolynomial<C, M>, modulus: Option<Arc<Vec<SparsePolynomial<C, M>>>>) -> Self {
        let value = match &modulus {
            Some(gb) if !gb.is_empty() && !value.is_zero() => value.div_mod_polys(gb).1,
            _ => value,
        };
        Self { value, modulus }
    }

    pub fn value(&self) -> &SparsePolynomial<C, M> {
        &self.value
    }

    /// Adopts the modulus of `other` if this element has none yet.
    fn join_modulus(&mut self, other: &Self) {
        if self.modulus.is_none() && other.modulus.is_some() {
            *self = Self::reduced(std::mem::take(&mut self.value), other.modulus.clone());
        }
    }

    /// Normal form again after combining with an operand that had no modulus.
    fn absorb(&mut self, rhs: &Self) {
        if rhs.modulus.is_none() && self.modulus.is_some() {
            *self = Self::reduced(std::mem::take(&mut self.value), self.modulus.take());
        }
    }
}

impl<C: Coefficient, M: Monomial> fmt::Debug for Residue<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.value)
    }
}

impl<C: Coefficient, M: Monomial> fmt::Display for Residue<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<C: Coefficient, M: Monomial> Neg for Residue<C, M> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            value: -self.value,
            modulus: self.modulus,
        }
    }
}

impl<'a, C: Coefficient, M: Monomial> AddAssign<&'a Self> for Residue<C, M> {
    fn add_assign(&mut self, rhs: &'a Self) {
        self.join_modulus(rhs);
        self.value += &rhs.value;
        self.absorb(rhs);
    }
}

impl<'a, C: Coefficient, M: Monomial> SubAssign<&'a Self> for Residue<C, M> {
    fn sub_assign(&mut self, rhs: &'a Self) {
        self.join_modulus(rhs);
        self.value -= &rhs.value;
        self.absorb(rhs);
    }
}

impl<'a, C: Coefficient, M: Monomial> MulAssign<&'a Self> for Residue<C, M> {
    fn mul_assign(&mut self, rhs: &'a Self) {
        self.join_modulus(rhs);
        let product = &self.value * &rhs.value;
        *self = Self::reduced(product, self.modulus.take());
    }
}

impl<'a, C: Coefficient, M: Monomial> Add<&'a Self> for Residue<C, M> {
    type Output = Self;

    fn add(mut self, rhs: &'a Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl<'a, C: Coefficient, M: Monomial> Sub<&'a Self> for Residue<C, M> {
    type Output = Self;

    fn sub(mut self, rhs: &'a Self) -> Self::Output {
        self -= rhs;
        self
    }
}

impl<'a, C: Coefficient, M: Monomial> Mul<&'a Self> for Residue<C, M> {
    type Output = Self;

    fn mul(mut self, rhs: &'a Self) -> Self::Output {
        self *= rhs;
        self
    }
}

impl<C: Coefficient, M: Monomial> Coefficient for Residue<C, M> {
    fn zero() -> Self {
        Self {
            value: SparsePolynomial::zero(),
            modulus: None,
        }
    }

    fn one() -> Self {
        Self {
            value: SparsePolynomial::one(0),
            modulus: None,
        }
    }

    fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    fn is_one(&self) -> bool {
        self.value.is_one()
    }

    fn inverse(&self) -> Option<Self> {
        if let Some(value) = Coefficient::inverse(&self.value) {
            return Some(Self::reduced(value, self.modulus.clone()));
        }
        let modulus = self.modulus.as_ref()?;
        let value = inverse_modulo(&self.value, modulus)?;
        Some(Self::reduced(value, self.modulus.clone()))
    }

    fn checked_div(&self, rhs: &Self) -> Option<Self> {
        if self.is_zero() {
            return Some(self.clone());
        }
        let quotient = Coefficient::checked_div(&self.value, &rhs.value)?;
        Some(Self::reduced(
            quotient,
            self.modulus.clone().or_else(|| rhs.modulus.clone()),
        ))
    }

    fn gcd(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() || Coefficient::checked_div(self, other).is_some() {
            return other.clone();
        }
        let mut one = <Self as Coefficient>::one();
        one.join_modulus(self);
        one
    }

    fn is_field() -> bool {
        false
    }

    fn from_i64(n: i64) -> Self {
        Self {
            value: SparsePolynomial::constant(0, C::from_i64(n)),
            modulus: None,
        }
    }

    fn characteristic() -> BigUint {
        C::characteristic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        poly::{
            coefficient::rational,
            monomial::{DenseMonomial, LexOrder},
        },
    };
    use num_rational::BigRational;

    type P = SparsePolynomial<BigRational, DenseMonomial<LexOrder>>;

    fn poly(terms: &[(i64, &[u16])]) -> P {
        SparsePolynomial::from_terms(
            1,
            terms
                .iter()
                .map(|(c, e)| (rational(*c, 1), DenseMonomial::from_exponents(e)))
                .collect(),
        )
    }

    #[test]
    fn test_arithmetic_modulo_square_root_of_two() {
        // Q[a]/(a^2 - 2)
        let ring = ResidueRing::new(vec![poly(&[(1, &[2]), (-2, &[])])]);
        let a = ring.element(&poly(&[(1, &[1])]));
        let square = a.clone() * &a;
        assert_eq!(square, ring.element(&poly(&[(2, &[])])));
        let cube = square * &a;
        assert_eq!(cube.value(), &poly(&[(2, &[1])]));
        assert!(!ring.is_trivial());
        let sum = a.clone() + &<Residue<_, _> as Coefficient>::one();
        assert_eq!(sum.value(), &poly(&[(1, &[1]), (1, &[])]));
    }

    #[test]
    fn test_unit_modulus_is_trivial() {
        let ring = ResidueRing::new(vec![poly(&[(1, &[])])]);
        assert!(ring.is_trivial());
        let one = <Residue<_, _> as Coefficient>::one();
        let a = ring.element(&poly(&[(1, &[1])]));
        assert!(a.is_zero());
        // ring-less constants collapse as soon as they meet the ring
        assert!((one.clone() + &a).is_zero());
        assert!((a.clone() + &one).is_zero());
        assert!((a.clone() - &<Residue<_, _> as Coefficient>::from_i64(5)).is_zero());
        assert!((<Residue<_, _> as Coefficient>::from_i64(3) * &a).is_zero());
    }

    #[test]
    fn test_inverse_of_non_constant_residues() {
        // Q[a]/(a^2 - 2): 1/a = a/2 and 1/(a + 1) = a - 1
        let ring = ResidueRing::new(vec![poly(&[(1, &[2]), (-2, &[])])]);
        let a = ring.element(&poly(&[(1, &[1])]));
        let inv = Coefficient::inverse(&a).unwrap();
        assert_eq!(inv.value(), &poly(&[(1, &[1])]).scaled(&rational(1, 2)));
        assert!((a.clone() * &inv).is_one());
        let a_plus_1 = ring.element(&poly(&[(1, &[1]), (1, &[])]));
        assert_eq!(Coefficient::inverse(&a_plus_1).unwrap(), ring.element(&poly(&[(1, &[1]), (-1, &[])])));
        assert!(a.is_unit());

        // Q[a]/(a^2): a is nilpotent, 1 + a is a unit
        let dual = ResidueRing::new(vec![poly(&[(1, &[2])])]);
        let eps = dual.element(&poly(&[(1, &[1])]));
        assert!(Coefficient::inverse(&eps).is_none());
        let one_plus_eps = dual.element(&poly(&[(1, &[1]), (1, &[])]));
        assert_eq!(
            Coefficient::inverse(&one_plus_eps).unwrap(),
            dual.element(&poly(&[(-1, &[1]), (1, &[])]))
        );
    }

    #[test]
    fn test_division_of_residues() {
        let ring = ResidueRing::new(vec![poly(&[(1, &[3])])]);
        let a = ring.element(&poly(&[(2, &[1])]));
        let two = <Residue<_, _> as Coefficient>::from_i64(2);
        let half = Coefficient::checked_div(&a, &two).unwrap();
        assert_eq!(half.value(), &poly(&[(1, &[1])]));
        assert!(Coefficient::inverse(&a).is_none());
        assert_eq!(Coefficient::inverse(&two).unwrap().value(), &poly(&[(1, &[])]).scaled(&rational(1, 2)));
    }
}
