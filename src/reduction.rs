use std::{cmp::Ordering, fmt::Debug};

use crate::{
    error::{GbError, GbResult},
    poly::{coefficient::Coefficient, monomial::Monomial, polynomial::SparsePolynomial},
};

/// Shape of an element the Buchberger machinery can work on: a polynomial or
/// a vector of polynomials. Terms carry a position, which is always zero for
/// polynomials and the component index for module elements.
pub trait GbElement: Clone + Debug + PartialEq + Send + Sync + 'static {
    type Coeff: Coefficient;
    type Mono: Monomial;

    /// Whether coprime leading monomials may skip a pair.
    const PRODUCT_CRITERION: bool = true;

    fn is_zero(&self) -> bool;

    fn leading_term(&self) -> Option<(&Self::Coeff, &Self::Mono, usize)>;

    fn pop_leading(&mut self) -> Option<(Self::Coeff, Self::Mono, usize)>;

    /// Adds terms given in descending order, all smaller than every stored
    /// term.
    fn append_trailing(&mut self, tail: Vec<(Self::Coeff, Self::Mono, usize)>);

    /// Zero of the same shape.
    fn zero_like(&self) -> Self;

    fn scale(&mut self, c: &Self::Coeff);

    /// `self -= c * other`
    fn sub_scaled(&mut self, c: &Self::Coeff, other: &Self);

    /// Applies `f` to every polynomial the element is made of.
    fn map_polys(
        &self,
        f: impl Fn(&SparsePolynomial<Self::Coeff, Self::Mono>) -> SparsePolynomial<Self::Coeff, Self::Mono>,
    ) -> Self;

    fn monic(&self) -> Option<Self>;

    fn primitive(&self) -> Self;

    /// Generates the whole ring.
    fn is_unit(&self) -> bool;

    /// Compares leading terms under the element's own order.
    fn compare_leading(&self, other: &Self) -> Ordering;

    fn leading_monomial(&self) -> Option<&Self::Mono> {
        self.leading_term().map(|(_, m, _)| m)
    }

    fn leading_coefficient(&self) -> Option<&Self::Coeff> {
        self.leading_term().map(|(c, _, _)| c)
    }

    fn leading_position(&self) -> Option<usize> {
        self.leading_term().map(|(_, _, pos)| pos)
    }
}

impl<C: Coefficient, M: Monomial> GbElement for SparsePolynomial<C, M> {
    type Coeff = C;
    type Mono = M;

    fn is_zero(&self) -> bool {
        SparsePolynomial::is_zero(self)
    }

    fn leading_term(&self) -> Option<(&C, &M, usize)> {
        self.terms.last().map(|(c, m)| (c, m, 0))
    }

    fn pop_leading(&mut self) -> Option<(C, M, usize)> {
        self.terms.pop().map(|(c, m)| (c, m, 0))
    }

    fn append_trailing(&mut self, tail: Vec<(C, M, usize)>) {
        SparsePolynomial::append_trailing(self, tail.into_iter().map(|(c, m, _)| (c, m)).collect());
    }

    fn zero_like(&self) -> Self {
        SparsePolynomial::zero().with_num_of_vars(self.num_of_vars)
    }

    fn scale(&mut self, c: &C) {
        SparsePolynomial::scale(self, c);
    }

    fn sub_scaled(&mut self, c: &C, other: &Self) {
        if c.is_one() {
            *self -= other;
        } else {
            *self -= &other.scaled(c);
        }
    }

    fn map_polys(&self, f: impl Fn(&SparsePolynomial<C, M>) -> SparsePolynomial<C, M>) -> Self {
        f(self)
    }

    fn monic(&self) -> Option<Self> {
        SparsePolynomial::monic(self)
    }

    fn primitive(&self) -> Self {
        SparsePolynomial::primitive(self)
    }

    fn is_unit(&self) -> bool {
        match self.terms.as_slice() {
            [(c, m)] => m.is_constant() && c.is_unit(),
            _ => false,
        }
    }

    fn compare_leading(&self, other: &Self) -> Ordering {
        self.leading_monomial().cmp(&other.leading_monomial())
    }
}

/// How a cofactor term multiplies a basis element during reduction and
/// S-polynomial construction.
pub trait Multiplier<E: GbElement>: Send + Sync {
    /// `t * g` on the side this multiplier works on.
    fn multiply(&self, t: &E::Mono, g: &E) -> E;

    fn is_commutative(&self) -> bool {
        false
    }
}

/// Ordinary commutative multiplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commutative;

impl<E: GbElement> Multiplier<E> for Commutative {
    fn multiply(&self, t: &E::Mono, g: &E) -> E {
        if t.is_constant() {
            return g.clone();
        }
        g.map_polys(|p| p * t)
    }

    fn is_commutative(&self) -> bool {
        true
    }
}

/// `b / gcd(a, b)` and `a / gcd(a, b)`, the fraction-free cofactors that
/// cancel `a` against `b`.
pub(crate) fn cofactors<C: Coefficient>(a: &C, b: &C) -> (C, C) {
    let g = a.gcd(b);
    match (b.checked_div(&g), a.checked_div(&g)) {
        (Some(bg), Some(ag)) if !g.is_zero() => (bg, ag),
        _ => (b.clone(), a.clone()),
    }
}

fn first_reducer<'a, E, I>(lm: &E::Mono, pos: usize, basis: I) -> Option<(&'a E, E::Mono)>
where
    E: GbElement,
    I: Iterator<Item = &'a E>,
{
    basis.filter(|g| !g.is_zero()).find_map(|g| {
        let (_, g_lm, g_pos) = g.leading_term()?;
        if g_pos != pos {
            return None;
        }
        (lm.clone() / g_lm).map(|t| (g, t))
    })
}

/// Normal form of `p` modulo `basis`, cancelling every reducible term. Over a
/// field the remainder differs from `p` by an ideal element; over a domain
/// by an ideal element after multiplication with a nonzero constant.
pub fn normal_form<'a, E, X, I>(mult: &X, p: &E, basis: I) -> E
where
    E: GbElement,
    X: Multiplier<E> + ?Sized,
    I: IntoIterator<Item = &'a E>,
    I::IntoIter: Clone,
{
    let basis = basis.into_iter();
    let mut work = p.clone();
    // irreducible terms in the order they leave `work`, largest first
    let mut tail: Vec<(E::Coeff, E::Mono, usize)> = Vec::new();

    while let Some((a, lm, pos)) = work.leading_term().map(|(c, m, pos)| (c.clone(), m.clone(), pos)) {
        let Some((g, t)) = first_reducer(&lm, pos, basis.clone()) else {
            tail.extend(work.pop_leading());
            continue;
        };
        let h = mult.multiply(&t, g);
        let Some(b) = h.leading_coefficient().cloned() else {
            tail.extend(work.pop_leading());
            continue;
        };
        match a.checked_div(&b) {
            Some(q) => work.sub_scaled(&q, &h),
            None => {
                let (bg, ag) = cofactors(&a, &b);
                work.scale(&bg);
                tail.iter_mut().for_each(|(c, _, _)| *c *= &bg);
                tail.retain(|(c, _, _)| !c.is_zero());
                work.sub_scaled(&ag, &h);
            },
        }
    }
    let mut remainder = p.zero_like();
    remainder.append_trailing(tail);
    remainder
}

/// Reduces only leading terms and stops at the first irreducible one.
pub fn top_normal_form<'a, E, X, I>(mult: &X, p: &E, basis: I) -> E
where
    E: GbElement,
    X: Multiplier<E> + ?Sized,
    I: IntoIterator<Item = &'a E>,
    I::IntoIter: Clone,
{
    let basis = basis.into_iter();
    let mut work = p.clone();
    while let Some((a, lm, pos)) = work.leading_term().map(|(c, m, pos)| (c.clone(), m.clone(), pos)) {
        let Some((g, t)) = first_reducer(&lm, pos, basis.clone()) else {
            break;
        };
        let h = mult.multiply(&t, g);
        let Some(b) = h.leading_coefficient().cloned() else {
            break;
        };
        match a.checked_div(&b) {
            Some(q) => work.sub_scaled(&q, &h),
            None => {
                let (bg, ag) = cofactors(&a, &b);
                work.scale(&bg);
                work.sub_scaled(&ag, &h);
            },
        }
    }
    work
}

/// Normal forms of every element of `ps`, zeros included.
pub fn normal_form_list<E, X>(mult: &X, ps: &[E], basis: &[E]) -> Vec<E>
where
    E: GbElement,
    X: Multiplier<E> + ?Sized,
{
    ps.iter().map(|p| normal_form(mult, p, basis)).collect()
}

/// Whether the leading term of `p` is divisible by some leading term of `basis`.
pub fn is_top_reducible<E: GbElement>(p: &E, basis: &[E]) -> bool {
    match p.leading_term() {
        Some((_, lm, pos)) => first_reducer(lm, pos, basis.iter()).is_some(),
        None => false,
    }
}

/// Whether any term of `p` is divisible by some leading term of `basis`.
pub fn is_reducible<E: GbElement>(p: &E, basis: &[E]) -> bool {
    let mut work = p.clone();
    while let Some((_, lm, pos)) = work.pop_leading() {
        if first_reducer(&lm, pos, basis.iter()).is_some() {
            return true;
        }
    }
    false
}

/// S-polynomial of `f` and `g`, `None` when their leading positions differ.
pub fn s_polynomial<E, X>(mult: &X, f: &E, g: &E) -> Option<E>
where
    E: GbElement,
    X: Multiplier<E> + ?Sized,
{
    let (_, f_lm, f_pos) = f.leading_term()?;
    let (_, g_lm, g_pos) = g.leading_term()?;
    if f_pos != g_pos {
        return None;
    }
    let lcm = f_lm.lcm(g_lm);
    let hf = mult.multiply(&(lcm.clone() / f_lm)?, f);
    let hg = mult.multiply(&(lcm / g_lm)?, g);
    let a = hf.leading_coefficient()?;
    let b = hg.leading_coefficient()?;
    let (bg, ag) = cofactors(a, b);
    let mut s = hf.clone();
    s.scale(&bg);
    s.sub_scaled(&ag, &hg);
    Some(s)
}

/// Monic over fields, primitive over domains.
pub fn normalize<E: GbElement>(p: &E) -> GbResult<E> {
    if E::Coeff::is_field() {
        p.monic().ok_or_else(|| {
            GbError::Division(format!(
                "leading coefficient {:?} is not invertible",
                p.leading_coefficient()
            ))
        })
    } else {
        Ok(p.primitive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly::{
        coefficient::rational,
        monomial::{DegRevLexOrder, DenseMonomial, LexOrder},
        ring::PolynomialRing,
    };
    use num_bigint::BigInt;
    use num_rational::BigRational;

    #[test]
    fn test_normal_form_over_rationals() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        // x^2*y + x*y^2 + y^2 by [x*y - 1, y^2 - 1]
        let f = ring.poly(&[(1, &[2, 1]), (1, &[1, 2]), (1, &[0, 2])]);
        let g = vec![
            ring.poly(&[(1, &[1, 1]), (-1, &[])]),
            ring.poly(&[(1, &[0, 2]), (-1, &[])]),
        ];
        let r = normal_form(&Commutative, &f, &g);
        assert_eq!(r, ring.poly(&[(1, &[1]), (1, &[0, 1]), (1, &[])]));
        assert!(!is_reducible(&r, &g));
        assert!(is_reducible(&f, &g));
        assert!(is_top_reducible(&f, &g));
        assert!(!is_top_reducible(&ring.poly(&[(1, &[1]), (1, &[0, 2])]), &g));
    }

    #[test]
    fn test_pseudo_division_over_integers() {
        let ring = PolynomialRing::<BigInt, DegRevLexOrder>::new(&["x", "y"]);
        let f = ring.poly(&[(3, &[1, 1]), (1, &[])]);
        let g = vec![ring.poly(&[(2, &[1]), (1, &[0, 1])])];
        let r = normal_form(&Commutative, &f, &g);
        // 2*(3xy + 1) - 3y*(2x + y) = -3y^2 + 2
        assert_eq!(r, ring.poly(&[(-3, &[0, 2]), (2, &[])]));
    }

    #[test]
    fn test_long_remainder_keeps_term_order() {
        let ring = PolynomialRing::<BigInt, LexOrder>::new(&["x", "y"]);
        // x + x^2 + ... + x^3000 + y by 3 y - 1; the x^k all land in the
        // remainder before y forces a pseudo-division step
        let powers = (1..=3000u16).fold(ring.zero(), |acc, k| acc + &ring.poly(&[(1, &[k])]));
        let f = &powers + &ring.variable(1);
        let g = vec![ring.poly(&[(3, &[0, 1]), (-1, &[])])];
        let r = normal_form(&Commutative, &f, &g);
        assert_eq!(r, powers.scaled(&BigInt::from(3)) + &ring.one());
        assert_eq!(r.len(), 3001);
        assert!(r.terms().windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[test]
    fn test_s_polynomial_cancels_leading_terms() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let f = ring.poly(&[(1, &[2]), (1, &[0, 1])]);
        let g = ring.poly(&[(1, &[1, 1]), (-1, &[])]);
        let s = s_polynomial(&Commutative, &f, &g).unwrap();
        // y*f - x*g = y^2 + x
        assert_eq!(s, ring.poly(&[(1, &[1]), (1, &[0, 2])]));
        let lcm = DenseMonomial::from_exponents(&[2, 1]);
        assert!(s.leading_monomial().unwrap() < &lcm);
    }

    #[test]
    fn test_normalize() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x"]);
        let p = ring.poly(&[(4, &[1]), (2, &[])]);
        let n = normalize(&p).unwrap();
        assert_eq!(n.leading_coefficient(), Some(&rational(1, 1)));
        assert_eq!(n, ring.poly(&[(2, &[1]), (1, &[])]).scaled(&rational(1, 2)));

        let zring = PolynomialRing::<BigInt, LexOrder>::new(&["x"]);
        let p = zring.poly(&[(4, &[1]), (2, &[])]);
        assert_eq!(normalize(&p).unwrap(), zring.poly(&[(2, &[1]), (1, &[])]));
        assert!(GbElement::is_unit(&zring.one()));
        assert!(!GbElement::is_unit(&zring.from_i64(2)));
    }

    #[test]
    fn test_normal_form_list() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let g = vec![ring.poly(&[(1, &[1]), (-1, &[0, 1])])];
        let ps = vec![ring.poly(&[(1, &[2])]), ring.poly(&[(1, &[0, 1])])];
        let nfs = normal_form_list(&Commutative, &ps, &g);
        assert_eq!(nfs, vec![ring.poly(&[(1, &[0, 2])]), ring.poly(&[(1, &[0, 1])])]);
    }
}
