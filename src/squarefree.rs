use num_bigint::BigUint;
use num_traits::Zero;

use crate::{
    error::{GbError, GbResult},
    poly::{coefficient::Coefficient, monomial::Monomial, polynomial::SparsePolynomial},
};

/// `p = unit * prod(factor^multiplicity)` with monic, square-free and
/// pairwise coprime factors.
#[derive(Debug, Clone, PartialEq)]
pub struct SquarefreeDecomposition<C, M> {
    pub unit: C,
    pub factors: Vec<(SparsePolynomial<C, M>, u32)>,
}

impl<C: Coefficient, M: Monomial> SquarefreeDecomposition<C, M> {
    /// Product of the factors, each taken once.
    pub fn squarefree_part(&self, num: usize) -> SparsePolynomial<C, M> {
        self.factors
            .iter()
            .fold(SparsePolynomial::one(num), |acc, (f, _)| acc * f)
    }

    pub fn expand(&self, num: usize) -> SparsePolynomial<C, M> {
        let product = self
            .factors
            .iter()
            .fold(SparsePolynomial::one(num), |acc, (f, e)| acc * &f.pow(*e));
        product.scaled(&self.unit)
    }
}

fn check_univariate<C: Coefficient, M: Monomial>(p: &SparsePolynomial<C, M>, var: usize) -> GbResult<()> {
    if !C::is_field() {
        return Err(GbError::Division(
            "square-free decomposition needs a coefficient field".to_string(),
        ));
    }
    if p.involves(0, var) || p.involves(var + 1, usize::MAX) {
        return Err(GbError::Division(format!("{p} is not univariate in variable {var}")));
    }
    let characteristic = C::characteristic();
    if !characteristic.is_zero() && characteristic <= BigUint::from(p.degree_in(var)) {
        return Err(GbError::Division(format!(
            "characteristic {characteristic} does not exceed the degree of {p}"
        )));
    }
    Ok(())
}

/// Quotient and remainder of univariate polynomials over a field.
pub fn div_rem<C: Coefficient, M: Monomial>(
    a: &SparsePolynomial<C, M>,
    b: &SparsePolynomial<C, M>,
) -> GbResult<(SparsePolynomial<C, M>, SparsePolynomial<C, M>)> {
    let Some((lc, lm)) = b.leading_term() else {
        return Err(GbError::Division("division by the zero polynomial".to_string()));
    };
    let inv = lc
        .inverse()
        .ok_or_else(|| GbError::Division(format!("leading coefficient {lc} is not invertible")))?;
    let mut quotient = SparsePolynomial::zero().with_num_of_vars(a.num_of_vars());
    let mut remainder = a.clone();
    while let Some((c, m)) = remainder.leading_term().cloned() {
        let Some(t) = m / lm else {
            break;
        };
        let term = (c * &inv, t);
        remainder -= &(b * &term);
        quotient += &term;
    }
    Ok((quotient, remainder))
}

fn exact_div<C: Coefficient, M: Monomial>(
    a: &SparsePolynomial<C, M>,
    b: &SparsePolynomial<C, M>,
) -> GbResult<SparsePolynomial<C, M>> {
    let (q, r) = div_rem(a, b)?;
    if !r.is_zero() {
        return Err(GbError::Division(format!("{b} does not divide {a}")));
    }
    Ok(q)
}

/// Monic greatest common divisor of univariate polynomials over a field.
pub fn gcd<C: Coefficient, M: Monomial>(
    a: &SparsePolynomial<C, M>,
    b: &SparsePolynomial<C, M>,
) -> GbResult<SparsePolynomial<C, M>> {
    let (mut a, mut b) = (a.clone(), b.clone());
    while !b.is_zero() {
        let (_, r) = div_rem(&a, &b)?;
        a = b;
        b = r;
    }
    a.monic()
        .ok_or_else(|| GbError::Division(format!("cannot make {a} monic")))
}

/// Yun's algorithm for a polynomial in the single variable `var`.
pub fn squarefree_decomposition<C: Coefficient, M: Monomial>(
    p: &SparsePolynomial<C, M>,
    var: usize,
) -> GbResult<SquarefreeDecomposition<C, M>> {
    check_univariate(p, var)?;
    let Some(unit) = p.leading_coefficient().cloned() else {
        return Ok(SquarefreeDecomposition {
            unit: C::zero(),
            factors: Vec::new(),
        });
    };
    let f = p
        .monic()
        .ok_or_else(|| GbError::Division(format!("cannot make {p} monic")))?;
    let mut factors = Vec::new();
    if f.is_constant() {
        return Ok(SquarefreeDecomposition { unit, factors });
    }

    let df = f.derivative(var);
    let a0 = gcd(&f, &df)?;
    let mut b = exact_div(&f, &a0)?;
    let c = exact_div(&df, &a0)?;
    let mut d = c - &b.derivative(var);
    let mut multiplicity = 1;
    while !b.is_constant() {
        let a = gcd(&b, &d)?;
        b = exact_div(&b, &a)?;
        let c = exact_div(&d, &a)?;
        d = c - &b.derivative(var);
        if !a.is_constant() {
            factors.push((a, multiplicity));
        }
        multiplicity += 1;
    }
    Ok(SquarefreeDecomposition { unit, factors })
}

pub fn squarefree_part<C: Coefficient, M: Monomial>(
    p: &SparsePolynomial<C, M>,
    var: usize,
) -> GbResult<SparsePolynomial<C, M>> {
    Ok(squarefree_decomposition(p, var)?.squarefree_part(p.num_of_vars()))
}

pub fn is_squarefree<C: Coefficient, M: Monomial>(p: &SparsePolynomial<C, M>, var: usize) -> GbResult<bool> {
    check_univariate(p, var)?;
    if p.is_zero() {
        return Ok(false);
    }
    Ok(gcd(p, &p.derivative(var))?.is_constant())
}
