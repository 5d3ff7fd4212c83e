use rayon::prelude::*;
use std::{cmp::Reverse, collections::BinaryHeap, time::Instant};

use crate::{
    comprehensive::system::{GroebnerSystem, ParamPoly},
    error::GbResult,
    log_info,
    poly::{
        coefficient::Coefficient,
        monomial::{DenseMonomial, Monomial, MonomialOrd},
        polynomial::SparsePolynomial,
        product::Product,
        residue::{Residue, ResidueRing},
        ring::Basis,
    },
    Entry,
};

/// Polynomial with coefficients in a direct product of rings.
pub type ProductPoly<R, M> = SparsePolynomial<Product<R>, M>;

/// Coefficients of a Groebner system's polynomials as seen by every branch:
/// component `k` lives in the residue ring modulo branch `k`'s zero ideal.
pub type ProductResPoly<C, OP, O> = ProductPoly<Residue<C, DenseMonomial<OP>>, DenseMonomial<O>>;

/// Maps `polys` into the product of the residue rings of `moduli`.
pub fn to_product_res<C, OP, O>(
    polys: &[ParamPoly<C, OP, O>],
    moduli: &[Vec<SparsePolynomial<C, DenseMonomial<OP>>>],
) -> Vec<ProductResPoly<C, OP, O>>
where
    C: Coefficient,
    OP: MonomialOrd,
    O: MonomialOrd,
{
    let rings: Vec<ResidueRing<C, DenseMonomial<OP>>> =
        moduli.iter().map(|z| ResidueRing::new(z.clone())).collect();
    polys
        .iter()
        .map(|p| p.map_coefficients(|c| Product::new(rings.iter().map(|r| r.element(c)).collect())))
        .filter(|p| !p.is_zero())
        .collect()
}

/// The comprehensive Groebner basis of `system` over the product of its
/// branches' residue rings, one component per branch.
pub fn regular_representation<C, OP, O>(system: &GroebnerSystem<C, OP, O>) -> Vec<ProductResPoly<C, OP, O>>
where
    C: Coefficient,
    OP: MonomialOrd,
    O: MonomialOrd,
{
    let moduli: Vec<_> = system
        .branches()
        .iter()
        .map(|b| b.condition.zero().to_vec())
        .collect();
    to_product_res(&system.cgb(), &moduli)
}

/// Component `k` of every polynomial, zeros dropped.
pub fn component_polys<R: Coefficient, M: Monomial>(ps: &[ProductPoly<R, M>], k: usize) -> Vec<SparsePolynomial<R, M>> {
    ps.iter()
        .map(|p| p.map_coefficients(|c| c.component(k).clone()))
        .filter(|p| !p.is_zero())
        .collect()
}

/// Splits `p` by the supports of its successive leading coefficients, so
/// that every piece has a leading coefficient whose idempotent is one on
/// the piece's whole support.
pub fn boolean_closure<R: Coefficient, M: Monomial>(p: &ProductPoly<R, M>) -> Vec<ProductPoly<R, M>> {
    let mut pieces = Vec::new();
    let mut work = p.clone();
    while let Some(lc) = work.leading_coefficient() {
        let e = lc.idempotent();
        let rest = e.complement();
        pieces.push(work.scaled(&e));
        work.scale(&rest);
    }
    pieces
}

pub fn is_boolean_closed<R: Coefficient, M: Monomial>(p: &ProductPoly<R, M>) -> bool {
    match p.leading_coefficient() {
        Some(lc) => p.scaled(&lc.idempotent()) == *p,
        None => true,
    }
}

/// Cancels the leading term of `f` on the support it shares with `g`.
/// Returns the factor `f` was multiplied with, `None` if nothing is shared.
fn reduce_step<R: Coefficient, M: Monomial>(
    f: &mut ProductPoly<R, M>,
    g: &ProductPoly<R, M>,
) -> Option<Product<R>> {
    let (a, m) = f.leading_term().cloned()?;
    let (b, u) = g.leading_term()?;
    let t = (m / u)?;
    let e = a.idempotent() * &b.idempotent();
    if e.is_zero() {
        return None;
    }
    let ae = a * &e;
    if let Some(q) = ae.checked_div(b) {
        *f -= &(g * &(q, t));
        return Some(Product::one());
    }
    let factor = b.clone() * &e + &e.complement();
    f.scale(&factor);
    *f -= &(g * &(ae, t));
    Some(factor)
}

/// Normal form with idempotent-aware pseudo-division.
pub fn normal_form<R: Coefficient, M: Monomial>(p: &ProductPoly<R, M>, basis: &[ProductPoly<R, M>]) -> ProductPoly<R, M> {
    let mut work = p.clone();
    let mut tail: Vec<(Product<R>, M)> = Vec::new();
    while !work.is_zero() {
        let factor = basis
            .iter()
            .filter(|g| !g.is_zero())
            .find_map(|g| reduce_step(&mut work, g));
        match factor {
            Some(factor) if !factor.is_one() => {
                tail.iter_mut().for_each(|(c, _)| *c *= &factor);
                tail.retain(|(c, _)| !c.is_zero());
            },
            Some(_) => {},
            None => tail.extend(work.pop_leading()),
        }
    }
    let mut remainder = SparsePolynomial::zero().with_num_of_vars(p.num_of_vars());
    remainder.append_trailing(tail);
    remainder
}

fn s_polynomial<R: Coefficient, M: Monomial>(f: &ProductPoly<R, M>, g: &ProductPoly<R, M>) -> Option<ProductPoly<R, M>> {
    let (a, m) = f.leading_term()?;
    let (b, u) = g.leading_term()?;
    if (a.idempotent() * &b.idempotent()).is_zero() {
        return None;
    }
    let lcm = m.lcm(u);
    let tf = (lcm.clone() / m)?;
    let tg = (lcm / u)?;
    Some(f * &(b.clone(), tf) - &(g * &(a.clone(), tg)))
}

/// Critical pairs, smallest lcm degree first.
#[derive(Default)]
struct PairQueue(BinaryHeap<Entry<Reverse<(u32, usize, usize)>, (usize, usize)>>);

impl PairQueue {
    /// Pairs of the newest element `basis[j]` with all earlier ones.
    fn add<R: Coefficient, M: Monomial>(&mut self, basis: &[ProductPoly<R, M>], j: usize) {
        let Some(u) = basis[j].leading_monomial() else {
            return;
        };
        for (i, f) in basis[..j].iter().enumerate() {
            if let Some(m) = f.leading_monomial() {
                self.0.push(Entry(Reverse((m.lcm(u).degree(), j, i)), (i, j)));
            }
        }
    }

    fn pop(&mut self) -> Option<(usize, usize)> {
        self.0.pop().map(|Entry(_, pair)| pair)
    }
}

fn add_closed<R: Coefficient, M: Monomial>(h: &ProductPoly<R, M>, basis: &mut Vec<ProductPoly<R, M>>, pairs: &mut PairQueue) {
    for piece in boolean_closure(h) {
        basis.push(piece);
        pairs.add(basis, basis.len() - 1);
    }
}

/// Buchberger's algorithm over a product of rings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegularGroebnerBase;

impl RegularGroebnerBase {
    pub fn new() -> Self {
        Self
    }

    pub fn gb<R: Coefficient, M: Monomial>(&self, generators: &[ProductPoly<R, M>]) -> GbResult<Basis<ProductPoly<R, M>>> {
        let start = Instant::now();
        let mut basis: Vec<ProductPoly<R, M>> = Vec::new();
        let mut pairs = PairQueue::default();
        for p in generators.iter().filter(|p| !p.is_zero()) {
            add_closed(p, &mut basis, &mut pairs);
        }

        let mut reduced = 0usize;
        while let Some((i, j)) = pairs.pop() {
            let Some(s) = s_polynomial(&basis[i], &basis[j]) else {
                continue;
            };
            reduced += 1;
            let h = normal_form(&s, &basis);
            if !h.is_zero() {
                add_closed(&h, &mut basis, &mut pairs);
            }
        }

        let minimal = self.minimal(basis);
        log_info!(
            "Regular Buchberger end with basis.len(): {}, {} pairs reduced, {:?}",
            minimal.len(),
            reduced,
            start.elapsed()
        );
        Ok(Basis::groebner(minimal))
    }

    /// Drops elements that reduce to zero modulo the rest.
    fn minimal<R: Coefficient, M: Monomial>(&self, mut basis: Vec<ProductPoly<R, M>>) -> Vec<ProductPoly<R, M>> {
        let mut i = 0;
        while i < basis.len() {
            let f = basis.remove(i);
            if normal_form(&f, &basis).is_zero() {
                continue;
            }
            basis.insert(i, f);
            i += 1;
        }
        basis
    }

    pub fn is_gb<R: Coefficient, M: Monomial>(&self, basis: &[ProductPoly<R, M>]) -> bool {
        if !basis.iter().all(is_boolean_closed) {
            return false;
        }
        basis.par_iter().enumerate().all(|(i, f)| {
            basis[i + 1..].iter().all(|g| match s_polynomial(f, g) {
                Some(s) => normal_form(&s, basis).is_zero(),
                None => true,
            })
        })
    }

    pub fn normal_form<R: Coefficient, M: Monomial>(&self, p: &ProductPoly<R, M>, basis: &[ProductPoly<R, M>]) -> ProductPoly<R, M> {
        normal_form(p, basis)
    }
}
