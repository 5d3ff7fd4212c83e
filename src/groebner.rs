use rayon::prelude::*;
use std::{cmp::Ordering, time::Instant};

use crate::{
    error::GbResult,
    log_info,
    pairs::PairList,
    poly::{monomial::Monomial, ring::Basis},
    reduction::{normal_form, normalize, s_polynomial, Commutative, GbElement, Multiplier},
};

/// Check whether every S-polynomial of `basis` reduces to zero.
pub fn is_groebner_basis<E, X>(mult: &X, basis: &[E]) -> bool
where
    E: GbElement,
    X: Multiplier<E> + ?Sized,
{
    basis.par_iter().enumerate().all(|(i, f)| {
        basis[i + 1..].par_iter().all(|g| match s_polynomial(mult, f, g) {
            Some(s) => normal_form(mult, &s, basis).is_zero(),
            None => true,
        })
    })
}

fn same_leading<E: GbElement>(f: &E, g: &E) -> bool {
    f.leading_position() == g.leading_position() && f.leading_monomial() == g.leading_monomial()
}

/// Drops zeros and every element whose leading term is a multiple of another
/// one, then normalises the rest. A unit collapses the basis to itself.
pub fn minimal_basis<E: GbElement>(mut basis: Vec<E>) -> GbResult<Vec<E>> {
    basis.retain(|f| !f.is_zero());
    if let Some(unit) = basis.iter().find(|f| f.is_unit()) {
        return Ok(vec![normalize(unit)?]);
    }
    basis.par_sort_by(|f, g| f.compare_leading(g));
    basis.dedup_by(|f, g| same_leading(f, g));

    let mut minimal: Vec<E> = Vec::with_capacity(basis.len());
    for f in basis {
        let Some((_, lm, pos)) = f.leading_term() else {
            continue;
        };
        let redundant = minimal.iter().any(|g| {
            g.leading_term()
                .map_or(false, |(_, g_lm, g_pos)| g_pos == pos && g_lm.divides(lm))
        });
        if !redundant {
            minimal.push(f);
        }
    }
    minimal.iter().map(normalize).collect()
}

/// Reduced form of a Groebner basis: minimal, every tail reduced by the other
/// elements, normalised and sorted by leading term.
pub fn interreduce<E, X>(mult: &X, basis: Vec<E>) -> GbResult<Vec<E>>
where
    E: GbElement,
    X: Multiplier<E> + ?Sized,
{
    let minimal = minimal_basis(basis)?;
    log_info!("Interreduce start with basis.len(): {}", minimal.len());
    let mut reduced = minimal
        .par_iter()
        .enumerate()
        .map(|(i, f)| {
            let others = minimal
                .iter()
                .enumerate()
                .filter(move |(j, _)| *j != i)
                .map(|(_, g)| g);
            normalize(&normal_form(mult, f, others))
        })
        .collect::<GbResult<Vec<E>>>()?;
    reduced.retain(|f| !f.is_zero());
    reduced.par_sort_by(|f, g| f.compare_leading(g));
    log_info!("Interreduce end with basis.len(): {}", reduced.len());
    Ok(reduced)
}

/// Sequential Buchberger algorithm over any element shape and multiplication.
#[derive(Debug, Clone, Default)]
pub struct GroebnerBaseSeq<X = Commutative> {
    mult: X,
}

impl GroebnerBaseSeq<Commutative> {
    pub fn new() -> Self {
        Self { mult: Commutative }
    }
}

impl<X> GroebnerBaseSeq<X> {
    pub fn with_multiplier(mult: X) -> Self {
        Self { mult }
    }

    pub fn multiplier(&self) -> &X {
        &self.mult
    }

    /// Groebner basis of the ideal generated by `generators`.
    pub fn gb<E>(&self, generators: &[E]) -> GbResult<Basis<E>>
    where
        E: GbElement,
        X: Multiplier<E>,
    {
        let start = Instant::now();
        let mut pairs = PairList::new(E::PRODUCT_CRITERION && self.mult.is_commutative());
        let mut basis: Vec<E> = Vec::with_capacity(generators.len());

        for p in generators.iter().filter(|p| !p.is_zero()) {
            let p = normalize(p)?;
            if p.is_unit() {
                return Ok(Basis::groebner(vec![p]));
            }
            let Some((_, lm, pos)) = p.leading_term() else {
                continue;
            };
            pairs.put(lm.clone(), pos);
            basis.push(p);
        }

        while let Some(pair) = pairs.remove_next() {
            let Some(s) = s_polynomial(&self.mult, &basis[pair.i], &basis[pair.j]) else {
                continue;
            };
            let h = normal_form(&self.mult, &s, &basis);
            if h.is_zero() {
                continue;
            }
            let h = normalize(&h)?;
            if h.is_unit() {
                log_info!("Buchberger found a unit after {:?}", start.elapsed());
                return Ok(Basis::groebner(vec![h]));
            }
            let Some((_, lm, pos)) = h.leading_term() else {
                continue;
            };
            pairs.put(lm.clone(), pos);
            basis.push(h);
        }

        let stats = pairs.stats();
        log_info!(
            "Buchberger end with basis.len(): {}, pairs {} created, {} reduced, {} skipped, {:?}",
            basis.len(),
            stats.created,
            stats.selected,
            stats.coprime + stats.chain,
            start.elapsed()
        );
        Ok(Basis::groebner(minimal_basis(basis)?))
    }

    pub fn is_gb<E>(&self, basis: &[E]) -> bool
    where
        E: GbElement,
        X: Multiplier<E>,
    {
        is_groebner_basis(&self.mult, basis)
    }

    pub fn normal_form<E>(&self, p: &E, basis: &[E]) -> E
    where
        E: GbElement,
        X: Multiplier<E>,
    {
        normal_form(&self.mult, p, basis)
    }

    pub fn minimal_gb<E: GbElement>(&self, basis: &Basis<E>) -> GbResult<Basis<E>> {
        Ok(Basis::with_status(
            minimal_basis(basis.elements().to_vec())?,
            basis.is_gb(),
        ))
    }

    pub fn reduced_gb<E>(&self, basis: &Basis<E>) -> GbResult<Basis<E>>
    where
        E: GbElement,
        X: Multiplier<E>,
    {
        Ok(Basis::with_status(
            interreduce(&self.mult, basis.elements().to_vec())?,
            basis.is_gb(),
        ))
    }
}

/// Orders two reduced bases element by element.
pub fn compare_bases<E: GbElement>(lhs: &[E], rhs: &[E]) -> Ordering {
    lhs.len().cmp(&rhs.len()).then_with(|| {
        lhs.iter()
            .zip(rhs.iter())
            .map(|(f, g)| f.compare_leading(g))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        poly::{
            monomial::{DegRevLexOrder, LexOrder},
            ring::{Poly, PolynomialRing},
        },
        GF,
    };
    use num_bigint::BigInt;
    use num_rational::BigRational;

    #[test]
    fn test_two_generator_fixture() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let f = vec![
            ring.poly(&[(1, &[2]), (1, &[0, 1])]),
            ring.poly(&[(1, &[1, 1]), (-1, &[])]),
        ];
        let seq = GroebnerBaseSeq::new();
        let gb = seq.gb(&f).unwrap();
        assert!(gb.is_gb());
        assert!(seq.is_gb(gb.elements()));
        assert!(!seq.is_gb(&f));
        for p in &f {
            assert!(seq.normal_form(p, gb.elements()).is_zero());
        }

        let reduced = seq.reduced_gb(&gb).unwrap();
        assert_eq!(
            reduced.elements(),
            &[
                ring.poly(&[(1, &[0, 3]), (1, &[])]),
                ring.poly(&[(1, &[1]), (1, &[0, 2])]),
            ]
        );
        // a generator in y alone, of degree 3
        let univariate = &reduced.elements()[0];
        assert!(!univariate.involves(0, 1));
        assert_eq!(univariate.degree_in(1), 3);
    }

    #[test]
    fn test_normal_form_independent_of_divisor_order() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let f = vec![
            ring.poly(&[(1, &[2]), (1, &[0, 1])]),
            ring.poly(&[(1, &[1, 1]), (-1, &[])]),
        ];
        let seq = GroebnerBaseSeq::new();
        let reduced = seq.reduced_gb(&seq.gb(&f).unwrap()).unwrap();
        let mut reversed = reduced.elements().to_vec();
        reversed.reverse();
        let p = ring.poly(&[(1, &[3, 1]), (1, &[1, 1]), (7, &[])]);
        assert_eq!(
            seq.normal_form(&p, reduced.elements()),
            seq.normal_form(&p, &reversed)
        );
    }

    #[test]
    fn test_cyclic3_over_prime_field() {
        let ring = PolynomialRing::<GF, DegRevLexOrder>::new(&["x", "y", "z"]);
        let f = vec![
            ring.poly(&[(1, &[1]), (1, &[0, 1]), (1, &[0, 0, 1])]),
            ring.poly(&[(1, &[1, 1]), (1, &[0, 1, 1]), (1, &[1, 0, 1])]),
            ring.poly(&[(1, &[1, 1, 1]), (-1, &[])]),
        ];
        let seq = GroebnerBaseSeq::new();
        let gb = seq.gb(&f).unwrap();
        assert!(seq.is_gb(gb.elements()));
        let reduced = seq.reduced_gb(&gb).unwrap();
        assert_eq!(
            reduced.elements(),
            &[
                ring.poly(&[(1, &[1]), (1, &[0, 1]), (1, &[0, 0, 1])]),
                ring.poly(&[(1, &[0, 2]), (1, &[0, 1, 1]), (1, &[0, 0, 2])]),
                ring.poly(&[(1, &[0, 0, 3]), (-1, &[])]),
            ]
        );
    }

    #[test]
    fn test_integer_coefficients_stay_primitive() {
        let ring = PolynomialRing::<BigInt, LexOrder>::new(&["x", "y"]);
        let f = vec![
            ring.poly(&[(2, &[2]), (2, &[0, 1])]),
            ring.poly(&[(3, &[1, 1]), (-3, &[])]),
        ];
        let seq = GroebnerBaseSeq::new();
        let gb = seq.gb(&f).unwrap();
        assert!(seq.is_gb(gb.elements()));
        let reduced = seq.reduced_gb(&gb).unwrap();
        assert_eq!(
            reduced.elements(),
            &[
                ring.poly(&[(1, &[0, 3]), (1, &[])]),
                ring.poly(&[(1, &[1]), (1, &[0, 2])]),
            ]
        );
    }

    #[test]
    fn test_unit_collapses_basis() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let f = vec![ring.poly(&[(1, &[1])]), ring.poly(&[(1, &[1]), (-1, &[])])];
        let gb = GroebnerBaseSeq::new().gb(&f).unwrap();
        assert_eq!(gb.elements(), &[ring.one()]);
        assert!(GroebnerBaseSeq::new().gb::<crate::poly::ring::Poly<BigRational, LexOrder>>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_minimal_gb_drops_multiples() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let basis = Basis::groebner(vec![
            ring.poly(&[(2, &[2])]),
            ring.poly(&[(1, &[1])]),
            ring.poly(&[(3, &[0, 1])]),
        ]);
        let minimal = GroebnerBaseSeq::new().minimal_gb(&basis).unwrap();
        assert!(minimal.is_gb());
        assert_eq!(minimal.elements(), &[ring.poly(&[(1, &[0, 1])]), ring.poly(&[(1, &[1])])]);
        assert_eq!(compare_bases(minimal.elements(), minimal.elements()), Ordering::Equal);
    }

    #[test]
    fn test_minimal_basis_respects_positions() {
        use crate::module::{ModuleElement, PositionOverTerm};
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let (x, y, zero) = (ring.variable(0), ring.variable(1), ring.zero());
        let xy = &x * &y;
        let v = |a: &Poly<BigRational, LexOrder>, b: &Poly<BigRational, LexOrder>| {
            ModuleElement::<_, _, PositionOverTerm>::new(vec![a.clone(), b.clone()])
        };
        // x y e_0 is a multiple of x e_0, x y e_1 is not
        let minimal = minimal_basis(vec![v(&xy, &zero), v(&x, &zero), v(&zero, &xy)]).unwrap();
        assert_eq!(minimal.len(), 2);
        assert!(minimal.contains(&v(&x, &zero)));
        assert!(minimal.contains(&v(&zero, &xy)));
        assert!(!minimal.contains(&v(&xy, &zero)));
    }
}
