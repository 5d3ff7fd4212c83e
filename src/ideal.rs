use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use std::{fmt, sync::Arc};

use crate::{
    distributed::{ClusterConfig, GroebnerBaseDistributed},
    error::GbResult,
    groebner::GroebnerBaseSeq,
    log_info,
    parallel::GroebnerBaseParallel,
    poly::{
        coefficient::{from_bigint, Coefficient},
        monomial::{BlockOrder, DenseMonomial, LexOrder, Monomial, MonomialOrd},
        ring::{Basis, Poly, PolynomialRing},
    },
    reduction::{normal_form_list, Commutative},
    squarefree::squarefree_part,
};

/// An ideal of a shared polynomial ring, given by generators that may or may
/// not form a Groebner basis.
#[derive(Debug, Clone)]
pub struct Ideal<C, O> {
    ring: Arc<PolynomialRing<C, O>>,
    basis: Basis<Poly<C, O>>,
}

/// `p` with its first `k` variables removed, as a polynomial in `num`
/// variables. Only meaningful if `p` does not involve them.
pub(crate) fn drop_front<C: Coefficient, O: MonomialOrd>(p: &Poly<C, O>, k: usize, num: usize) -> Poly<C, O> {
    Poly::from_terms(
        num,
        p.terms()
            .iter()
            .map(|(c, m)| (c.clone(), m.block(k, usize::MAX)))
            .collect(),
    )
}

/// Multiplies `p` by the lcm of its denominators and takes the primitive part.
fn clear_denominators<O: MonomialOrd>(p: &Poly<BigRational, O>) -> Poly<BigInt, O> {
    let lcm = p
        .terms()
        .iter()
        .fold(BigInt::from(1), |acc, (c, _)| acc.lcm(c.denom()));
    Poly::from_terms(
        p.num_of_vars(),
        p.terms()
            .iter()
            .map(|(c, m)| (c.numer() * (&lcm / c.denom()), m.clone()))
            .collect(),
    )
    .primitive()
}

impl<C: Coefficient, O: MonomialOrd> Ideal<C, O> {
    pub fn new(ring: Arc<PolynomialRing<C, O>>, generators: Vec<Poly<C, O>>) -> Self {
        Self {
            ring,
            basis: Basis::new(generators),
        }
    }

    fn with_basis(&self, basis: Basis<Poly<C, O>>) -> Self {
        Self {
            ring: self.ring.clone(),
            basis,
        }
    }

    pub fn ring(&self) -> &Arc<PolynomialRing<C, O>> {
        &self.ring
    }

    pub fn generators(&self) -> &[Poly<C, O>] {
        self.basis.elements()
    }

    /// Whether the generators are known to form a Groebner basis.
    pub fn is_known_gb(&self) -> bool {
        self.basis.is_gb()
    }

    /// The ideal generated by its reduced Groebner basis.
    pub fn gb(&self) -> GbResult<Self> {
        if self.basis.is_gb() {
            return Ok(self.clone());
        }
        let seq = GroebnerBaseSeq::new();
        let gb = seq.reduced_gb(&seq.gb(self.generators())?)?;
        Ok(self.with_basis(gb))
    }

    /// Whether the generators form a Groebner basis, checked from scratch.
    pub fn is_gb(&self) -> bool {
        GroebnerBaseSeq::new().is_gb(self.generators())
    }

    pub fn par_gb(&self, threads: usize) -> GbResult<Self> {
        let par = GroebnerBaseParallel::new(threads)?;
        let gb = par.reduced_gb(&par.gb(self.generators())?)?;
        Ok(self.with_basis(gb))
    }

    pub fn dist_gb(&self, config: &ClusterConfig) -> GbResult<Self> {
        let gb = GroebnerBaseDistributed::new(config.clone()).gb(self.generators())?;
        let gb = GroebnerBaseSeq::new().reduced_gb(&gb)?;
        Ok(self.with_basis(gb))
    }

    fn groebner(&self) -> GbResult<Vec<Poly<C, O>>> {
        Ok(self.gb()?.basis.into_elements())
    }

    /// Normal forms of `ps` modulo the reduced Groebner basis.
    pub fn normal_form(&self, ps: &[Poly<C, O>]) -> GbResult<Vec<Poly<C, O>>> {
        Ok(normal_form_list(&Commutative, ps, &self.groebner()?))
    }

    pub fn contains(&self, p: &Poly<C, O>) -> GbResult<bool> {
        Ok(self.normal_form(std::slice::from_ref(p))?.iter().all(|r| r.is_zero()))
    }

    /// Whether every generator of `other` lies in this ideal.
    pub fn contains_ideal(&self, other: &Self) -> GbResult<bool> {
        let gb = self.groebner()?;
        Ok(normal_form_list(&Commutative, other.generators(), &gb)
            .iter()
            .all(|r| r.is_zero()))
    }

    pub fn sum(&self, other: &Self) -> Self {
        let mut generators = self.generators().to_vec();
        generators.extend_from_slice(other.generators());
        Self::new(self.ring.clone(), generators)
    }

    pub fn product(&self, other: &Self) -> Self {
        let generators = self
            .generators()
            .iter()
            .flat_map(|f| other.generators().iter().map(move |g| f * g))
            .collect();
        Self::new(self.ring.clone(), generators)
    }

    /// `(t * I + (1 - t) * J)` with `t` eliminated.
    pub fn intersect(&self, other: &Self) -> GbResult<Self> {
        let n = self.ring.num_of_vars();
        let t = Poly::<C, O>::variable(n + 1, 0);
        let one_minus_t = Poly::one(n + 1) - &t;
        let generators: Vec<Poly<C, BlockOrder<1, LexOrder, O>>> = self
            .generators()
            .iter()
            .map(|f| &t * &f.shift_vars(1))
            .chain(other.generators().iter().map(|g| &one_minus_t * &g.shift_vars(1)))
            .map(|p| p.transform_order())
            .collect();
        let gb = GroebnerBaseSeq::new().gb(&generators)?;
        let eliminated: Vec<Poly<C, O>> = gb
            .iter()
            .filter(|p| !p.involves(0, 1))
            .map(|p| drop_front(&p.transform_order(), 1, n))
            .collect();
        log_info!(
            "Intersection of {} and {} generators has {} generators",
            self.generators().len(),
            other.generators().len(),
            eliminated.len()
        );
        Self::new(self.ring.clone(), eliminated).gb()
    }

    /// Intersection with the subring in all but the first `k` variables.
    /// `OE` has to eliminate those variables, e.g. `LexOrder` or a
    /// `BlockOrder<K, _, _>` with `K == k`.
    pub fn eliminate<OE: MonomialOrd>(&self, k: usize) -> GbResult<Self> {
        let generators: Vec<Poly<C, OE>> = self.generators().iter().map(|p| p.transform_order()).collect();
        let gb = GroebnerBaseSeq::new().gb(&generators)?;
        let eliminated: Vec<Poly<C, O>> = gb
            .iter()
            .filter(|p| !p.involves(0, k))
            .map(|p| p.transform_order())
            .collect();
        Self::new(self.ring.clone(), eliminated).gb()
    }

    /// The ideal generated by the images of the generators under `f`, over
    /// the same variables. Generators mapped to zero are dropped.
    pub fn map_coefficients<D: Coefficient>(&self, f: impl Fn(&C) -> D) -> Ideal<D, O> {
        let generators = self
            .generators()
            .iter()
            .map(|p| p.map_coefficients(&f))
            .filter(|p| !p.is_zero())
            .collect();
        Ideal::new(self.ring.with_coefficients(), generators)
    }

    /// Renames variables: variable `v` of the result is variable `perm[v]`
    /// of this ideal.
    pub fn permute_variables(&self, perm: &[usize]) -> Self {
        let names: Vec<&str> = perm.iter().map(|&v| self.ring.names()[v].as_str()).collect();
        let generators = self
            .generators()
            .iter()
            .map(|p| {
                Poly::from_terms(
                    perm.len(),
                    p.terms()
                        .iter()
                        .map(|(c, m)| {
                            let exponents: Vec<u16> = perm.iter().map(|&v| m.exponent(v)).collect();
                            (c.clone(), DenseMonomial::from_exponents(&exponents))
                        })
                        .collect(),
                )
            })
            .collect();
        Self::new(PolynomialRing::new(&names), generators)
    }

    /// Reorders the variables so that those of low degree in the generators
    /// become the greatest, which tends to shrink lexicographic bases.
    /// Ties go to the variable occurring in fewer terms. Also returns the
    /// permutation, in the form [`Self::permute_variables`] takes.
    pub fn optimize(&self) -> (Self, Vec<usize>) {
        let weight = |var: usize| {
            let degree = self.generators().iter().map(|p| p.degree_in(var)).max().unwrap_or(0);
            let occurrences = self
                .generators()
                .iter()
                .flat_map(|p| p.terms())
                .filter(|(_, m)| m.exponent(var) > 0)
                .count();
            (degree, occurrences, var)
        };
        let mut perm: Vec<usize> = (0..self.ring.num_of_vars()).collect();
        perm.sort_by_cached_key(|&var| weight(var));
        log_info!("Optimized variable order: {:?}", perm);
        (self.permute_variables(&perm), perm)
    }

    /// Square-free parts of the univariate elements of the Groebner basis.
    pub fn squarefree(&self) -> GbResult<Vec<Poly<C, O>>> {
        let n = self.ring.num_of_vars();
        self.groebner()?
            .iter()
            .filter_map(|p| {
                let var = (0..n).find(|&v| p.involves(v, v + 1))?;
                (!p.involves(var + 1, n)).then_some((p, var))
            })
            .map(|(p, var)| squarefree_part(p, var))
            .collect()
    }
}

impl<O: MonomialOrd> Ideal<BigRational, O> {
    /// The same ideal over the integers: every generator is cleared of
    /// denominators and made primitive.
    pub fn to_integer(&self) -> Ideal<BigInt, O> {
        let generators = self
            .generators()
            .iter()
            .filter(|p| !p.is_zero())
            .map(clear_denominators)
            .collect();
        Ideal::new(self.ring.with_coefficients(), generators)
    }
}

impl<O: MonomialOrd> Ideal<BigInt, O> {
    /// Generators reduced modulo the characteristic of `D`.
    pub fn to_modular<D: Coefficient>(&self) -> Ideal<D, O> {
        self.map_coefficients(from_bigint::<D>)
    }
}

impl<C: Coefficient, O: MonomialOrd> PartialEq for Ideal<C, O> {
    /// Equality of ideals, not of generator lists.
    fn eq(&self, other: &Self) -> bool {
        match (self.gb(), other.gb()) {
            (Ok(lhs), Ok(rhs)) => lhs.basis == rhs.basis,
            _ => false,
        }
    }
}

impl<C: Coefficient, O: MonomialOrd> fmt::Display for Ideal<C, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let generators: Vec<String> = self.generators().iter().map(|p| self.ring.format(p)).collect();
        write!(f, "({})", generators.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        poly::{coefficient::rational, monomial::DegRevLexOrder},
        GF,
    };

    #[test]
    fn test_membership_and_sum() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let ideal = Ideal::new(
            ring.clone(),
            vec![
                ring.poly(&[(1, &[2]), (1, &[0, 1])]),
                ring.poly(&[(1, &[1, 1]), (-1, &[])]),
            ],
        );
        assert!(!ideal.is_gb());
        let gb = ideal.gb().unwrap();
        assert!(gb.is_gb());
        assert!(gb.is_known_gb());
        // y^3 + 1 = x (x y - 1) * y - ... lies in the ideal
        assert!(ideal.contains(&ring.poly(&[(1, &[0, 3]), (1, &[])])).unwrap());
        assert!(!ideal.contains(&ring.variable(1)).unwrap());
        assert_eq!(ideal.par_gb(2).unwrap().generators(), gb.generators());
        assert_eq!(
            ideal.dist_gb(&ClusterConfig::local(2)).unwrap().generators(),
            gb.generators()
        );

        let whole = ideal.sum(&Ideal::new(ring.clone(), vec![ring.variable(1)]));
        assert_eq!(whole.gb().unwrap().generators(), &[ring.one()]);
        assert!(whole.contains_ideal(&ideal).unwrap());
        assert!(!ideal.contains_ideal(&whole).unwrap());
        assert_eq!(ideal, gb);
    }

    #[test]
    fn test_intersection() {
        let ring = PolynomialRing::<BigRational, DegRevLexOrder>::new(&["x", "y"]);
        let (x, y) = (ring.variable(0), ring.variable(1));
        let i = Ideal::new(ring.clone(), vec![x.clone()]);
        let j = Ideal::new(ring.clone(), vec![y.clone()]);
        let meet = i.intersect(&j).unwrap();
        assert_eq!(meet.generators(), &[&x * &y]);
        assert_eq!(i.product(&j), meet);

        // <x^2, y> and <x, y^2> meet in <x^2, x y, y^2>
        let i = Ideal::new(ring.clone(), vec![&x * &x, y.clone()]);
        let j = Ideal::new(ring.clone(), vec![x.clone(), &y * &y]);
        let meet = i.intersect(&j).unwrap();
        let expected = Ideal::new(ring.clone(), vec![&x * &x, &x * &y, &y * &y]);
        assert_eq!(meet, expected);
        assert!(i.contains_ideal(&meet).unwrap());
        assert!(j.contains_ideal(&meet).unwrap());
    }

    #[test]
    fn test_elimination_of_twisted_cubic_parameter() {
        let ring = PolynomialRing::<BigRational, DegRevLexOrder>::new(&["t", "x", "y"]);
        // x = t^2, y = t^3
        let ideal = Ideal::new(
            ring.clone(),
            vec![
                ring.poly(&[(1, &[0, 1]), (-1, &[2])]),
                ring.poly(&[(1, &[0, 0, 1]), (-1, &[3])]),
            ],
        );
        let implicit = ideal.eliminate::<BlockOrder<1, LexOrder, DegRevLexOrder>>(1).unwrap();
        assert_eq!(implicit.generators(), &[ring.poly(&[(1, &[0, 3]), (-1, &[0, 0, 2])])]);
        let by_lex = ideal.eliminate::<LexOrder>(1).unwrap();
        assert_eq!(by_lex, implicit);
    }

    #[test]
    fn test_squarefree_of_univariate_elements() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        // x^2 (x - 1)^2 and y^3
        let x = ring.variable(0);
        let x_minus_1 = &x - &ring.one();
        let f = (&x * &x) * &(&x_minus_1 * &x_minus_1);
        let g = ring.poly(&[(1, &[0, 3])]);
        let ideal = Ideal::new(ring.clone(), vec![f, g]);
        let mut parts = ideal.squarefree().unwrap();
        parts.sort_by(|a, b| a.leading_monomial().cmp(&b.leading_monomial()));
        assert_eq!(parts, vec![ring.variable(1), &x * &x_minus_1]);
        assert_eq!(format!("{}", Ideal::new(ring.clone(), vec![ring.variable(1)])), "(y)");
    }

    #[test]
    fn test_rational_ideal_over_integers_and_prime_field() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        // x/2 + y/3 and x^2 - 1/4
        let f = &ring.term(rational(1, 2), &[1]) + &ring.term(rational(1, 3), &[0, 1]);
        let g = &ring.poly(&[(1, &[2])]) - &ring.constant(rational(1, 4));
        let ideal = Ideal::new(ring.clone(), vec![f, g, ring.zero()]);

        let integral = ideal.to_integer();
        let zx = PolynomialRing::<BigInt, LexOrder>::new(&["x", "y"]);
        assert_eq!(
            integral.generators(),
            &[zx.poly(&[(3, &[1]), (2, &[0, 1])]), zx.poly(&[(4, &[2]), (-1, &[])])]
        );
        assert_eq!(integral.ring().names(), ring.names());
        let back = integral.map_coefficients(|c| BigRational::from_integer(c.clone()));
        assert_eq!(back, ideal);

        let modular = integral.to_modular::<GF>();
        let fp = PolynomialRing::<GF, LexOrder>::new(&["x", "y"]);
        assert_eq!(
            modular.generators(),
            &[fp.poly(&[(3, &[1]), (2, &[0, 1])]), fp.poly(&[(4, &[2]), (-1, &[])])]
        );
        assert!(modular.gb().unwrap().is_gb());
    }

    #[test]
    fn test_optimize_puts_low_degree_variables_first() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y", "z"]);
        // x^5 + y and y^2 z + x
        let ideal = Ideal::new(
            ring.clone(),
            vec![
                ring.poly(&[(1, &[5]), (1, &[0, 1])]),
                ring.poly(&[(1, &[0, 2, 1]), (1, &[1])]),
            ],
        );
        let (optimized, perm) = ideal.optimize();
        assert_eq!(perm, vec![2, 1, 0]);
        assert_eq!(optimized.ring().names(), &["z", "y", "x"]);
        let renamed = optimized.ring();
        assert_eq!(
            optimized.generators()[0],
            renamed.poly(&[(1, &[0, 0, 5]), (1, &[0, 1])])
        );
        // reversing the variables is its own inverse
        let restored = optimized.gb().unwrap().permute_variables(&perm);
        assert_eq!(restored, ideal);
    }
}
