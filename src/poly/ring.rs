use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, marker::PhantomData, sync::Arc};

use crate::poly::{
    coefficient::Coefficient,
    monomial::{DenseMonomial, Monomial, MonomialOrd},
    polynomial::SparsePolynomial,
};

pub type Poly<C, O> = SparsePolynomial<C, DenseMonomial<O>>;

/// Variable names over a coefficient ring `C` under the term order `O`.
///
/// Rings are immutable and shared through `Arc` by everything built on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolynomialRing<C, O> {
    names: Vec<String>,
    marker: PhantomData<(C, O)>,
}

impl<C: Coefficient, O: MonomialOrd> PolynomialRing<C, O> {
    pub fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            marker: PhantomData,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn num_of_vars(&self) -> usize {
        self.names.len()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn zero(&self) -> Poly<C, O> {
        Poly::zero().with_num_of_vars(self.num_of_vars())
    }

    pub fn one(&self) -> Poly<C, O> {
        Poly::one(self.num_of_vars())
    }

    pub fn constant(&self, c: C) -> Poly<C, O> {
        Poly::constant(self.num_of_vars(), c)
    }

    pub fn from_i64(&self, n: i64) -> Poly<C, O> {
        self.constant(C::from_i64(n))
    }

    pub fn variable(&self, var: usize) -> Poly<C, O> {
        Poly::variable(self.num_of_vars(), var)
    }

    /// Generators in declaration order.
    pub fn gens(&self) -> Vec<Poly<C, O>> {
        (0..self.num_of_vars()).map(|v| self.variable(v)).collect()
    }

    pub fn term(&self, c: C, exponents: &[u16]) -> Poly<C, O> {
        Poly::monomial(
            self.num_of_vars(),
            c,
            DenseMonomial::from_exponents(exponents),
        )
    }

    /// Builds a polynomial from `(coefficient, exponents)` pairs.
    pub fn poly(&self, terms: &[(i64, &[u16])]) -> Poly<C, O> {
        Poly::from_terms(
            self.num_of_vars(),
            terms
                .iter()
                .map(|(c, e)| (C::from_i64(*c), DenseMonomial::from_exponents(e)))
                .collect(),
        )
    }

    /// The same ring with `names` prepended as the greatest variables.
    pub fn extend_front(&self, names: &[&str]) -> Arc<Self> {
        let mut all: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        all.extend(self.names.iter().cloned());
        Arc::new(Self {
            names: all,
            marker: PhantomData,
        })
    }

    /// The same variables under another order.
    pub fn with_order<OT: MonomialOrd>(&self) -> Arc<PolynomialRing<C, OT>> {
        Arc::new(PolynomialRing {
            names: self.names.clone(),
            marker: PhantomData,
        })
    }

    /// The same variables over another coefficient ring.
    pub fn with_coefficients<D: Coefficient>(&self) -> Arc<PolynomialRing<D, O>> {
        Arc::new(PolynomialRing {
            names: self.names.clone(),
            marker: PhantomData,
        })
    }

    /// Renders `p` with this ring's variable names.
    pub fn format(&self, p: &Poly<C, O>) -> String {
        if p.is_zero() {
            return "0".to_string();
        }
        p.iter()
            .map(|(coeff, term)| {
                let mut parts = Vec::new();
                if !coeff.is_one() || term.is_constant() {
                    let coeff = coeff.to_string();
                    parts.push(if coeff.contains(' ') {
                        format!("({coeff})")
                    } else {
                        coeff
                    });
                }
                for (var, &e) in term.exponents().iter().enumerate() {
                    let name = self
                        .names
                        .get(var)
                        .cloned()
                        .unwrap_or_else(|| format!("x{var}"));
                    match e.cmp(&1) {
                        Ordering::Less => {},
                        Ordering::Equal => parts.push(name),
                        Ordering::Greater => parts.push(format!("{name}^{e}")),
                    }
                }
                parts.join("*")
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// Generators of an ideal or submodule. `is_gb` is only ever set by a
/// finished Groebner basis computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basis<E> {
    elements: Vec<E>,
    is_gb: bool,
}

impl<E> Basis<E> {
    pub fn new(elements: Vec<E>) -> Self {
        Self {
            elements,
            is_gb: false,
        }
    }

    pub(crate) fn groebner(elements: Vec<E>) -> Self {
        Self {
            elements,
            is_gb: true,
        }
    }

    pub(crate) fn with_status(elements: Vec<E>, is_gb: bool) -> Self {
        Self { elements, is_gb }
    }

    pub fn is_gb(&self) -> bool {
        self.is_gb
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<E> {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.elements.iter()
    }
}

impl<E> From<Vec<E>> for Basis<E> {
    fn from(elements: Vec<E>) -> Self {
        Basis::new(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly::{coefficient::rational, monomial::LexOrder};
    use num_rational::BigRational;

    #[test]
    fn test_ring_factory_and_format() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let [x, y] = [ring.variable(0), ring.variable(1)];
        let p = &(&x * &x) + &y.scaled(&rational(-3, 2));
        assert_eq!(ring.format(&p), "x^2 + -3/2*y");
        assert_eq!(ring.format(&ring.one()), "1");
        assert_eq!(ring.format(&ring.zero()), "0");
        assert_eq!(ring.gens().len(), 2);
        assert_eq!(ring.index_of("y"), Some(1));
        assert_eq!(ring.poly(&[(1, &[2]), (-1, &[0, 1])]), &(&x * &x) - &y);
    }

    #[test]
    fn test_extended_ring_puts_new_names_first() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let ext = ring.extend_front(&["t"]);
        assert_eq!(ext.names(), &["t", "x", "y"]);
        let x = ring.variable(0).shift_vars(1);
        assert_eq!(ext.format(&x), "x");
    }

    #[test]
    fn test_basis_flag_only_from_computation() {
        let basis: Basis<u8> = vec![1, 2].into();
        assert!(!basis.is_gb());
        assert!(Basis::groebner(vec![1u8]).is_gb());
    }
}
