use rayon::prelude::*;
use std::sync::Arc;

use crate::{
    error::GbResult,
    groebner::{is_groebner_basis, GroebnerBaseSeq},
    log_info,
    parallel::GroebnerBaseParallel,
    poly::{coefficient::Coefficient, monomial::Monomial, polynomial::SparsePolynomial, ring::Basis},
    reduction::{normal_form, normalize, GbElement, Multiplier},
    solvable::relation::SolvableRing,
};

/// Cofactors multiply basis elements from the left.
#[derive(Debug, Clone)]
pub struct SolvableLeft<C, M> {
    ring: Arc<SolvableRing<C, M>>,
}

/// Cofactors multiply basis elements from the right.
#[derive(Debug, Clone)]
pub struct SolvableRight<C, M> {
    ring: Arc<SolvableRing<C, M>>,
}

impl<C, M> SolvableLeft<C, M> {
    pub fn new(ring: Arc<SolvableRing<C, M>>) -> Self {
        Self { ring }
    }
}

impl<C, M> SolvableRight<C, M> {
    pub fn new(ring: Arc<SolvableRing<C, M>>) -> Self {
        Self { ring }
    }
}

impl<C, M, E> Multiplier<E> for SolvableLeft<C, M>
where
    C: Coefficient,
    M: Monomial,
    E: GbElement<Coeff = C, Mono = M>,
{
    fn multiply(&self, t: &E::Mono, g: &E) -> E {
        g.map_polys(|p| self.ring.multiply_left(t, p))
    }
}

impl<C, M, E> Multiplier<E> for SolvableRight<C, M>
where
    C: Coefficient,
    M: Monomial,
    E: GbElement<Coeff = C, Mono = M>,
{
    fn multiply(&self, t: &E::Mono, g: &E) -> E {
        g.map_polys(|p| self.ring.multiply_right(p, t))
    }
}

/// Left, right and two-sided Groebner bases over a solvable ring.
///
/// Works for polynomials and for module elements alike; a two-sided basis is
/// a left basis closed under right multiplication by the variables.
#[derive(Debug, Clone)]
pub struct SolvableGroebnerBase<C, M> {
    ring: Arc<SolvableRing<C, M>>,
    left: GroebnerBaseSeq<SolvableLeft<C, M>>,
    right: GroebnerBaseSeq<SolvableRight<C, M>>,
}

impl<C, M> SolvableGroebnerBase<C, M> {
    pub fn new(ring: Arc<SolvableRing<C, M>>) -> Self {
        Self {
            left: GroebnerBaseSeq::with_multiplier(SolvableLeft::new(ring.clone())),
            right: GroebnerBaseSeq::with_multiplier(SolvableRight::new(ring.clone())),
            ring,
        }
    }

    pub fn ring(&self) -> &Arc<SolvableRing<C, M>> {
        &self.ring
    }
}

impl<C: Coefficient, M: Monomial> SolvableGroebnerBase<C, M> {
    pub fn left_gb<E>(&self, generators: &[E]) -> GbResult<Basis<E>>
    where
        E: GbElement<Coeff = C, Mono = M>,
    {
        self.left.gb(generators)
    }

    pub fn right_gb<E>(&self, generators: &[E]) -> GbResult<Basis<E>>
    where
        E: GbElement<Coeff = C, Mono = M>,
    {
        self.right.gb(generators)
    }

    pub fn is_left_gb<E: GbElement<Coeff = C, Mono = M>>(&self, basis: &[E]) -> bool {
        self.left.is_gb(basis)
    }

    pub fn is_right_gb<E: GbElement<Coeff = C, Mono = M>>(&self, basis: &[E]) -> bool {
        self.right.is_gb(basis)
    }

    pub fn left_normal_form<E: GbElement<Coeff = C, Mono = M>>(&self, p: &E, basis: &[E]) -> E {
        self.left.normal_form(p, basis)
    }

    pub fn right_normal_form<E: GbElement<Coeff = C, Mono = M>>(&self, p: &E, basis: &[E]) -> E {
        self.right.normal_form(p, basis)
    }

    pub fn left_reduced_gb<E: GbElement<Coeff = C, Mono = M>>(&self, basis: &Basis<E>) -> GbResult<Basis<E>> {
        self.left.reduced_gb(basis)
    }

    /// `g * x_k` for every element and variable that is not already in the
    /// left ideal of `basis`.
    fn right_products<E: GbElement<Coeff = C, Mono = M>>(&self, basis: &[E]) -> GbResult<Vec<E>> {
        let vars = self.ring.num_of_vars();
        let left = self.left.multiplier();
        let products = basis
            .par_iter()
            .flat_map_iter(|g| {
                (0..vars).map(move |k| {
                    let x = M::one() * k;
                    g.map_polys(|p| self.ring.multiply_right(p, &x))
                })
            })
            .map(|h| normal_form(left, &h, basis))
            .filter(|h| !h.is_zero())
            .map(|h| normalize(&h))
            .collect::<GbResult<Vec<E>>>()?;
        Ok(products)
    }

    fn close<E, F>(&self, generators: &[E], left_gb: F) -> GbResult<Basis<E>>
    where
        E: GbElement<Coeff = C, Mono = M>,
        F: Fn(&[E]) -> GbResult<Basis<E>>,
    {
        let mut basis = left_gb(generators)?.into_elements();
        let mut rounds = 0usize;
        loop {
            let extra = self.right_products(&basis)?;
            if extra.is_empty() {
                break;
            }
            rounds += 1;
            basis.extend(extra);
            basis = left_gb(&basis)?.into_elements();
        }
        log_info!(
            "Two-sided closure end with basis.len(): {} after {} rounds",
            basis.len(),
            rounds
        );
        Ok(Basis::groebner(basis))
    }

    pub fn twosided_gb<E>(&self, generators: &[E]) -> GbResult<Basis<E>>
    where
        E: GbElement<Coeff = C, Mono = M>,
    {
        self.close(generators, |gs| self.left.gb(gs))
    }

    pub fn is_twosided_gb<E>(&self, basis: &[E]) -> GbResult<bool>
    where
        E: GbElement<Coeff = C, Mono = M>,
    {
        Ok(self.is_left_gb(basis) && self.right_products(basis)?.is_empty())
    }

    /// Left Groebner basis on `threads` workers.
    pub fn par_left_gb<E>(&self, threads: usize, generators: &[E]) -> GbResult<Basis<E>>
    where
        E: GbElement<Coeff = C, Mono = M>,
    {
        GroebnerBaseParallel::with_multiplier(threads, self.left.multiplier().clone())?.gb(generators)
    }

    /// Two-sided Groebner basis whose left bases are computed on `threads`
    /// workers.
    pub fn par_twosided_gb<E>(&self, threads: usize, generators: &[E]) -> GbResult<Basis<E>>
    where
        E: GbElement<Coeff = C, Mono = M>,
    {
        let par = GroebnerBaseParallel::with_multiplier(threads, self.left.multiplier().clone())?;
        self.close(generators, |gs| par.gb(gs))
    }
}

/// Whether every element of `basis` times every variable from either side
/// reduces to zero from the left.
pub fn is_twosided_closed<C: Coefficient, M: Monomial>(
    ring: &Arc<SolvableRing<C, M>>,
    basis: &[SparsePolynomial<C, M>],
) -> bool {
    let left = SolvableLeft::new(ring.clone());
    let vars = ring.num_of_vars();
    is_groebner_basis(&left, basis)
        && basis.par_iter().all(|g| {
            (0..vars).all(|k| {
                let x = ring.variable(k);
                let gx = ring.multiply(g, &x);
                let xg = ring.multiply(&x, g);
                normal_form(&left, &gx, basis).is_zero() && normal_form(&left, &xg, basis).is_zero()
            })
        })
}
