use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt::{Debug, Error, Formatter},
    hash::Hash,
    marker::PhantomData,
    ops::{Div, Mul, MulAssign},
    vec::Vec,
};

pub trait Monomial:
    Clone
    + PartialOrd
    + Ord
    + PartialEq
    + Eq
    + Hash
    + Default
    + Debug
    + Send
    + Sync
    + 'static
    + for<'a> MulAssign<&'a Self>
    + for<'a> Mul<&'a Self, Output = Self>
    + for<'a> Div<&'a Self, Output = Option<Self>>
    + MulAssign<usize>
    + Mul<usize, Output = Self>
    + Div<usize, Output = Option<Self>>
{
    fn new(monomial: &[(usize, u16)]) -> Self;

    fn from_exponents(exponents: &[u16]) -> Self;

    /// Exponents up to the last nonzero one.
    fn exponents(&self) -> &[u16];

    fn exponent(&self, var: usize) -> u16 {
        self.exponents().get(var).copied().unwrap_or(0)
    }

    fn degree(&self) -> u32 {
        self.exponents().iter().map(|&e| e as u32).sum()
    }

    fn is_constant(&self) -> bool {
        self.exponents().is_empty()
    }

    fn lcm(&self, other: &Self) -> Self;

    fn gcd(&self, other: &Self) -> Self;

    fn divides(&self, other: &Self) -> bool {
        self.exponents()
            .iter()
            .enumerate()
            .all(|(i, &e)| e <= other.exponent(i))
    }

    fn is_coprime(&self, other: &Self) -> bool {
        self.gcd(other).is_constant()
    }

    fn one() -> Self;

    /// Variables `start..end` renumbered from zero.
    fn block(&self, start: usize, end: usize) -> Self {
        let exps = self.exponents();
        let end = end.min(exps.len());
        if start >= end {
            return Self::one();
        }
        Self::from_exponents(&exps[start..end])
    }

    /// Every variable index moved up by `offset`.
    fn shift(&self, offset: usize) -> Self {
        let mut exps = vec![0; offset];
        exps.extend_from_slice(self.exponents());
        Self::from_exponents(&exps)
    }

    fn compare_lex_order(lhs: &Self, rhs: &Self) -> Ordering {
        let (a, b) = (lhs.exponents(), rhs.exponents());
        (0..a.len().max(b.len()))
            .map(|i| lhs.exponent(i).cmp(&rhs.exponent(i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    fn compare_deg_lex_order(lhs: &Self, rhs: &Self) -> Ordering {
        lhs.degree()
            .cmp(&rhs.degree())
            .then_with(|| Self::compare_lex_order(lhs, rhs))
    }

    fn compare_deg_rev_lex_order(lhs: &Self, rhs: &Self) -> Ordering {
        lhs.degree().cmp(&rhs.degree()).then_with(|| {
            let len = lhs.exponents().len().max(rhs.exponents().len());
            (0..len)
                .rev()
                .map(|i| rhs.exponent(i).cmp(&lhs.exponent(i)))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        })
    }
}

pub trait MonomialOrd:
    Clone + PartialEq + Eq + Hash + Default + Debug + Send + Sync + 'static
{
    fn compare<T: Monomial>(lhs: &T, rhs: &T) -> Ordering;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LexOrder {}
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DegLexOrder {}
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DegRevLexOrder {}

impl MonomialOrd for LexOrder {
    fn compare<T: Monomial>(lhs: &T, rhs: &T) -> Ordering {
        T::compare_lex_order(lhs, rhs)
    }
}

impl MonomialOrd for DegLexOrder {
    fn compare<T: Monomial>(lhs: &T, rhs: &T) -> Ordering {
        T::compare_deg_lex_order(lhs, rhs)
    }
}

impl MonomialOrd for DegRevLexOrder {
    fn compare<T: Monomial>(lhs: &T, rhs: &T) -> Ordering {
        T::compare_deg_rev_lex_order(lhs, rhs)
    }
}

/// Variable weights of a [`WeightedOrder`]. Variables past the end weigh 1.
pub trait Weights: Clone + PartialEq + Eq + Hash + Default + Debug + Send + Sync + 'static {
    const WEIGHTS: &'static [u32];

    fn weighted_degree<T: Monomial>(m: &T) -> u64 {
        m.exponents()
            .iter()
            .enumerate()
            .map(|(i, &e)| Self::WEIGHTS.get(i).copied().unwrap_or(1) as u64 * e as u64)
            .sum()
    }
}

/// Weighted degree first, ties broken by `O`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct WeightedOrder<W, O = DegRevLexOrder>(PhantomData<(W, O)>);

impl<W: Weights, O: MonomialOrd> MonomialOrd for WeightedOrder<W, O> {
    fn compare<T: Monomial>(lhs: &T, rhs: &T) -> Ordering {
        W::weighted_degree(lhs)
            .cmp(&W::weighted_degree(rhs))
            .then_with(|| O::compare(lhs, rhs))
    }
}

/// Elimination order: the first `K` variables under `O1`, the rest under `O2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BlockOrder<const K: usize, O1 = DegRevLexOrder, O2 = DegRevLexOrder>(
    PhantomData<(O1, O2)>,
);

impl<const K: usize, O1: MonomialOrd, O2: MonomialOrd> MonomialOrd for BlockOrder<K, O1, O2> {
    fn compare<T: Monomial>(lhs: &T, rhs: &T) -> Ordering {
        O1::compare(&lhs.block(0, K), &rhs.block(0, K))
            .then_with(|| O2::compare(&lhs.block(K, usize::MAX), &rhs.block(K, usize::MAX)))
    }
}

/// Exponent vector with trailing zeros stripped, so monomials of different
/// arity compare and hash alike.
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(
    Clone(bound = ""),
    PartialEq(bound = ""),
    Eq(bound = ""),
    Hash(bound = ""),
    Default(bound = "")
)]
#[serde(bound = "")]
pub struct DenseMonomial<O> {
    exponents: Vec<u16>,
    #[serde(skip)]
    order: PhantomData<O>,
}

impl<O: MonomialOrd> DenseMonomial<O> {
    fn trimmed(mut exponents: Vec<u16>) -> Self {
        while exponents.last() == Some(&0) {
            exponents.pop();
        }
        Self {
            exponents,
            order: PhantomData,
        }
    }

    pub fn transform_order<OT: MonomialOrd>(self) -> DenseMonomial<OT> {
        DenseMonomial {
            exponents: self.exponents,
            order: PhantomData,
        }
    }
}

impl<O: MonomialOrd> PartialOrd for DenseMonomial<O> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<O: MonomialOrd> Ord for DenseMonomial<O> {
    fn cmp(&self, other: &Self) -> Ordering {
        O::compare(self, other)
    }
}

impl<O: MonomialOrd> Monomial for DenseMonomial<O> {
    fn new(term: &[(usize, u16)]) -> Self {
        let len = term
            .iter()
            .filter(|(_, pow)| *pow != 0)
            .map(|(var, _)| var + 1)
            .max()
            .unwrap_or(0);
        let mut exponents = vec![0u16; len];
        for &(var, pow) in term.iter().filter(|(_, pow)| *pow != 0) {
            exponents[var] += pow;
        }
        Self::trimmed(exponents)
    }

    fn from_exponents(exponents: &[u16]) -> Self {
        Self::trimmed(exponents.to_vec())
    }

    fn exponents(&self) -> &[u16] {
        &self.exponents
    }

    fn one() -> Self {
        Self::default()
    }

    fn lcm(&self, other: &Self) -> Self {
        let len = self.exponents.len().max(other.exponents.len());
        Self::trimmed(
            (0..len)
                .map(|i| self.exponent(i).max(other.exponent(i)))
                .collect(),
        )
    }

    fn gcd(&self, other: &Self) -> Self {
        let len = self.exponents.len().min(other.exponents.len());
        Self::trimmed(
            (0..len)
                .map(|i| self.exponents[i].min(other.exponents[i]))
                .collect(),
        )
    }
}

impl<O> Debug for DenseMonomial<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        for variable in self.exponents.iter().enumerate() {
            match variable.1.cmp(&1) {
                Ordering::Less => {},
                Ordering::Equal => write!(f, " * x_{}", variable.0)?,
                Ordering::Greater => write!(f, " * x_{}^{}", variable.0, variable.1)?,
            }
        }
        Ok(())
    }
}

impl<'a, O: MonomialOrd> MulAssign<&'a DenseMonomial<O>> for DenseMonomial<O> {
    fn mul_assign(&mut self, other: &'a DenseMonomial<O>) {
        if self.exponents.len() < other.exponents.len() {
            self.exponents.resize(other.exponents.len(), 0);
        }
        self.exponents
            .iter_mut()
            .zip(other.exponents.iter())
            .for_each(|(lhs, rhs)| *lhs += rhs);
    }
}

impl<'a, O: MonomialOrd> Mul<&'a DenseMonomial<O>> for DenseMonomial<O> {
    type Output = Self;

    fn mul(self, other: &'a DenseMonomial<O>) -> Self::Output {
        let mut result = self;
        result.mul_assign(other);
        result
    }
}

impl<'a, 'b, O: MonomialOrd> Mul<&'a DenseMonomial<O>> for &'b DenseMonomial<O> {
    type Output = DenseMonomial<O>;

    fn mul(self, other: &'a DenseMonomial<O>) -> Self::Output {
        let mut result = self.clone();
        result.mul_assign(other);
        result
    }
}

impl<'a, O: MonomialOrd> Div<&'a DenseMonomial<O>> for DenseMonomial<O> {
    type Output = Option<Self>;

    fn div(self, other: &'a DenseMonomial<O>) -> Self::Output {
        (&self).div(other)
    }
}

impl<'a, 'b, O: MonomialOrd> Div<&'a DenseMonomial<O>> for &'b DenseMonomial<O> {
    type Output = Option<DenseMonomial<O>>;

    fn div(self, other: &'a DenseMonomial<O>) -> Self::Output {
        if other.divides(self) {
            let mut exponents = self.exponents.clone();
            exponents
                .iter_mut()
                .zip(other.exponents.iter())
                .for_each(|(lhs, rhs)| *lhs -= rhs);
            Some(DenseMonomial::trimmed(exponents))
        } else {
            None
        }
    }
}

impl<O: MonomialOrd> MulAssign<usize> for DenseMonomial<O> {
    fn mul_assign(&mut self, var: usize) {
        if self.exponents.len() <= var {
            self.exponents.resize(var + 1, 0);
        }
        self.exponents[var] += 1;
    }
}

impl<O: MonomialOrd> Mul<usize> for DenseMonomial<O> {
    type Output = Self;

    fn mul(self, var: usize) -> Self::Output {
        let mut result = self;
        result.mul_assign(var);
        result
    }
}

impl<'b, O: MonomialOrd> Mul<usize> for &'b DenseMonomial<O> {
    type Output = DenseMonomial<O>;

    fn mul(self, var: usize) -> Self::Output {
        let mut result = self.clone();
        result.mul_assign(var);
        result
    }
}

impl<O: MonomialOrd> Div<usize> for DenseMonomial<O> {
    type Output = Option<Self>;

    fn div(self, var: usize) -> Self::Output {
        (&self).div(var)
    }
}

impl<'b, O: MonomialOrd> Div<usize> for &'b DenseMonomial<O> {
    type Output = Option<DenseMonomial<O>>;

    fn div(self, var: usize) -> Self::Output {
        if self.exponent(var) == 0 {
            return None;
        }
        let mut exponents = self.exponents.clone();
        exponents[var] -= 1;
        Some(DenseMonomial::trimmed(exponents))
    }
}
