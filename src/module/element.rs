use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, marker::PhantomData};

use crate::{
    poly::{coefficient::Coefficient, monomial::Monomial, polynomial::SparsePolynomial},
    reduction::GbElement,
};

/// Order on module terms `m * e_pos`. A smaller position is the larger unit
/// vector under both orders.
pub trait ModuleOrd: Clone + Default + fmt::Debug + Send + Sync + 'static {
    fn compare<M: Monomial>(lhs: (&M, usize), rhs: (&M, usize)) -> Ordering;
}

/// Positions first, then monomials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PositionOverTerm;

/// Monomials first, then positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TermOverPosition;

impl ModuleOrd for PositionOverTerm {
    fn compare<M: Monomial>((m, i): (&M, usize), (n, j): (&M, usize)) -> Ordering {
        j.cmp(&i).then_with(|| m.cmp(n))
    }
}

impl ModuleOrd for TermOverPosition {
    fn compare<M: Monomial>((m, i): (&M, usize), (n, j): (&M, usize)) -> Ordering {
        m.cmp(n).then_with(|| j.cmp(&i))
    }
}

/// Element of the free module of rank `components.len()`.
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Clone(bound = "C: Clone, M: Clone"), PartialEq(bound = "C: PartialEq, M: PartialEq"))]
#[serde(bound(
    serialize = "C: Serialize, M: Serialize",
    deserialize = "C: Deserialize<'de>, M: Deserialize<'de>"
))]
pub struct ModuleElement<C, M, P> {
    components: Vec<SparsePolynomial<C, M>>,
    #[serde(skip)]
    #[derivative(PartialEq = "ignore")]
    order: PhantomData<P>,
}

impl<C: Coefficient, M: Monomial, P: ModuleOrd> ModuleElement<C, M, P> {
    pub fn new(components: Vec<SparsePolynomial<C, M>>) -> Self {
        Self {
            components,
            order: PhantomData,
        }
    }

    /// The zero vector of rank `rank` over `num` variables.
    pub fn zero(num: usize, rank: usize) -> Self {
        Self::new(vec![SparsePolynomial::zero().with_num_of_vars(num); rank])
    }

    /// `p * e_pos` in a module of rank `rank`.
    pub fn unit(p: SparsePolynomial<C, M>, pos: usize, rank: usize) -> Self {
        let mut element = Self::zero(p.num_of_vars(), rank);
        element.components[pos] = p;
        element
    }

    pub fn rank(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[SparsePolynomial<C, M>] {
        &self.components
    }

    pub fn component(&self, pos: usize) -> &SparsePolynomial<C, M> {
        &self.components[pos]
    }

    pub fn into_components(self) -> Vec<SparsePolynomial<C, M>> {
        self.components
    }

    fn lead_position(&self) -> Option<usize> {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(pos, p)| p.leading_monomial().map(|m| (m, pos)))
            .max_by(|&a, &b| P::compare(a, b))
            .map(|(_, pos)| pos)
    }

    /// `sum_i a_i * self_i`, the inner product with a polynomial vector.
    pub fn dot(&self, coefficients: &[SparsePolynomial<C, M>]) -> SparsePolynomial<C, M> {
        let num = self.components.first().map_or(0, |p| p.num_of_vars());
        self.components
            .iter()
            .zip(coefficients)
            .fold(SparsePolynomial::zero().with_num_of_vars(num), |acc, (p, a)| acc + &(p * a))
    }
}

impl<C: Coefficient, M: Monomial, P: ModuleOrd> GbElement for ModuleElement<C, M, P> {
    type Coeff = C;
    type Mono = M;

    const PRODUCT_CRITERION: bool = false;

    fn is_zero(&self) -> bool {
        self.components.iter().all(|p| p.is_zero())
    }

    fn leading_term(&self) -> Option<(&C, &M, usize)> {
        let pos = self.lead_position()?;
        self.components[pos].leading_term().map(|(c, m)| (c, m, pos))
    }

    fn pop_leading(&mut self) -> Option<(C, M, usize)> {
        let pos = self.lead_position()?;
        self.components[pos].pop_leading().map(|(c, m)| (c, m, pos))
    }

    fn append_trailing(&mut self, tail: Vec<(C, M, usize)>) {
        let mut by_position: Vec<Vec<(C, M)>> = vec![Vec::new(); self.components.len()];
        for (c, m, pos) in tail {
            by_position[pos].push((c, m));
        }
        for (p, tail) in self.components.iter_mut().zip(by_position) {
            p.append_trailing(tail);
        }
    }

    fn zero_like(&self) -> Self {
        Self::new(self.components.iter().map(|p| p.zero_like()).collect())
    }

    fn scale(&mut self, c: &C) {
        self.components.iter_mut().for_each(|p| p.scale(c));
    }

    fn sub_scaled(&mut self, c: &C, other: &Self) {
        for (p, q) in self.components.iter_mut().zip(&other.components) {
            GbElement::sub_scaled(p, c, q);
        }
    }

    fn map_polys(&self, f: impl Fn(&SparsePolynomial<C, M>) -> SparsePolynomial<C, M>) -> Self {
        Self::new(self.components.iter().map(f).collect())
    }

    fn monic(&self) -> Option<Self> {
        match GbElement::leading_coefficient(self) {
            None => Some(self.clone()),
            Some(lc) if lc.is_one() => Some(self.clone()),
            Some(lc) => {
                let inv = lc.inverse()?;
                Some(Self::new(self.components.iter().map(|p| p.scaled(&inv)).collect()))
            },
        }
    }

    fn primitive(&self) -> Self {
        let Some(lc) = GbElement::leading_coefficient(self) else {
            return self.clone();
        };
        let content = self
            .components
            .iter()
            .filter(|p| !p.is_zero())
            .map(|p| p.content())
            .reduce(|a, b| a.gcd(&b))
            .unwrap_or_else(C::one);
        let content = content.checked_div(&content.unit_part()).unwrap_or(content);
        let divisor = content * &lc.unit_part();
        if divisor.is_zero() || divisor.is_one() {
            return self.clone();
        }
        self.components
            .iter()
            .map(|p| p.exact_div_scalar(&divisor))
            .collect::<Option<Vec<_>>>()
            .map(Self::new)
            .unwrap_or_else(|| self.clone())
    }

    fn is_unit(&self) -> bool {
        false
    }

    fn compare_leading(&self, other: &Self) -> Ordering {
        match (self.leading_term(), other.leading_term()) {
            (Some((_, m, i)), Some((_, n, j))) => P::compare((m, i), (n, j)),
            (lhs, rhs) => lhs.is_some().cmp(&rhs.is_some()),
        }
    }
}

impl<C: fmt::Debug, M: fmt::Debug, P> fmt::Debug for ModuleElement<C, M, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.components.iter()).finish()
    }
}

impl<C: Coefficient, M: Monomial, P> fmt::Display for ModuleElement<C, M, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|p| p.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}
