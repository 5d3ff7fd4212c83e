use derivative::Derivative;
use hashbrown::HashMap;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    fmt::{Debug, Display},
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    vec::Vec,
};

use crate::poly::{
    coefficient::Coefficient,
    monomial::{DenseMonomial, Monomial, MonomialOrd},
};

/// Stores a sparse multivariate polynomial in coefficient form.
///
/// Terms are kept in ascending term order, so the leading term is the last
/// element. Zero coefficients are never stored and the empty vector is the
/// zero polynomial.
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Clone, PartialEq, Eq, Hash, Default(bound = ""))]
pub struct SparsePolynomial<C, M> {
    #[derivative(PartialEq = "ignore")]
    #[derivative(Hash = "ignore")]
    pub(crate) num_of_vars: usize,
    pub(crate) terms: Vec<(C, M)>,
}

impl<C: Coefficient, M: Monomial> SparsePolynomial<C, M> {
    pub fn new(num: usize, terms: &[(C, M)]) -> Self {
        Self::from_terms(num, terms.to_vec())
    }

    pub fn from_terms(num: usize, mut terms: Vec<(C, M)>) -> Self {
        terms.sort_unstable_by(|(_, m1), (_, m2)| m1.cmp(m2));
        let mut terms_dedup: Vec<(C, M)> = Vec::with_capacity(terms.len());
        for term in terms {
            if let Some(prev) = terms_dedup.last_mut() {
                if prev.1 == term.1 {
                    prev.0 += &term.0;
                    if prev.0.is_zero() {
                        terms_dedup.pop();
                    }
                    continue;
                }
            };
            if !term.0.is_zero() {
                terms_dedup.push(term);
            }
        }

        Self {
            num_of_vars: num,
            terms: terms_dedup,
        }
    }

    pub fn zero() -> Self {
        Self {
            num_of_vars: 0,
            terms: Vec::new(),
        }
    }

    pub fn constant(num: usize, c: C) -> Self {
        Self::monomial(num, c, M::one())
    }

    pub fn one(num: usize) -> Self {
        Self::constant(num, C::one())
    }

    pub fn monomial(num: usize, c: C, m: M) -> Self {
        Self {
            num_of_vars: num,
            terms: if c.is_zero() { vec![] } else { vec![(c, m)] },
        }
    }

    pub fn variable(num: usize, var: usize) -> Self {
        Self::monomial(num, C::one(), M::one() * var)
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_constant(&self) -> bool {
        self.terms.iter().all(|(_, m)| m.is_constant())
    }

    pub fn is_one(&self) -> bool {
        self.terms.len() == 1 && self.terms[0].1.is_constant() && self.terms[0].0.is_one()
    }

    /// Terms in ascending order.
    pub fn terms(&self) -> &[(C, M)] {
        self.terms.as_slice()
    }

    /// Terms from the leading term downwards.
    pub fn iter(&self) -> impl Iterator<Item = &(C, M)> + '_ {
        self.terms.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Total degree.
    pub fn degree(&self) -> u32 {
        self.terms.iter().map(|(_, m)| m.degree()).max().unwrap_or(0)
    }

    pub fn degree_in(&self, var: usize) -> u16 {
        self.terms
            .iter()
            .map(|(_, m)| m.exponent(var))
            .max()
            .unwrap_or(0)
    }

    pub fn num_of_vars(&self) -> usize {
        self.num_of_vars
    }

    pub fn with_num_of_vars(mut self, num: usize) -> Self {
        self.num_of_vars = num;
        self
    }

    pub fn leading_term(&self) -> Option<&(C, M)> {
        self.terms.last()
    }

    pub fn leading_monomial(&self) -> Option<&M> {
        self.terms.last().map(|(_, m)| m)
    }

    pub fn leading_coefficient(&self) -> Option<&C> {
        self.terms.last().map(|(c, _)| c)
    }

    pub fn trailing_terms(&self) -> &[(C, M)] {
        if self.terms.len() > 1 {
            &self.terms[..self.terms.len() - 1]
        } else {
            &[]
        }
    }

    pub fn pop_leading(&mut self) -> Option<(C, M)> {
        self.terms.pop()
    }

    /// Adds terms given in descending order, all smaller than every stored
    /// term.
    pub(crate) fn append_trailing(&mut self, mut tail: Vec<(C, M)>) {
        debug_assert!(tail.windows(2).all(|w| w[1].1 < w[0].1));
        debug_assert!(match (tail.first(), self.terms.first()) {
            (Some((_, m)), Some((_, n))) => m < n,
            _ => true,
        });
        tail.reverse();
        tail.append(&mut self.terms);
        self.terms = tail;
    }

    pub fn coefficient_of(&self, m: &M) -> Option<&C> {
        self.terms
            .binary_search_by(|(_, t)| t.cmp(m))
            .ok()
            .map(|i| &self.terms[i].0)
    }

    pub fn scale(&mut self, c: &C) {
        if c.is_zero() {
            self.terms.clear();
        } else if !c.is_one() {
            self.terms.iter_mut().for_each(|(coeff, _)| *coeff *= c);
            self.terms.retain(|(coeff, _)| !coeff.is_zero());
        }
    }

    pub fn scaled(&self, c: &C) -> Self {
        let mut result = self.clone();
        result.scale(c);
        result
    }

    /// Divides every coefficient exactly, `None` if one is not divisible.
    pub fn exact_div_scalar(&self, c: &C) -> Option<Self> {
        let terms = self
            .terms
            .iter()
            .map(|(coeff, m)| coeff.checked_div(c).map(|q| (q, m.clone())))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            num_of_vars: self.num_of_vars,
            terms,
        })
    }

    /// Leading coefficient one; `None` if it is not invertible.
    pub fn monic(&self) -> Option<Self> {
        match self.leading_coefficient() {
            None => Some(self.clone()),
            Some(lc) if lc.is_one() => Some(self.clone()),
            Some(lc) => lc.inverse().map(|inv| self.scaled(&inv)),
        }
    }

    /// Common divisor of all coefficients.
    pub fn content(&self) -> C {
        let mut iter = self.terms.iter().rev();
        let Some((first, _)) = iter.next() else {
            return C::zero();
        };
        let mut content = first.clone();
        for (c, _) in iter {
            if content.is_unit() {
                break;
            }
            content = content.gcd(c);
        }
        content
    }

    /// Divided by its content, with the leading coefficient's unit part
    /// removed as well.
    pub fn primitive(&self) -> Self {
        let Some(lc) = self.leading_coefficient() else {
            return self.clone();
        };
        let content = self.content();
        let content = content
            .checked_div(&content.unit_part())
            .unwrap_or(content);
        let divisor = content * &lc.unit_part();
        if divisor.is_zero() || divisor.is_one() {
            return self.clone();
        }
        self.exact_div_scalar(&divisor)
            .unwrap_or_else(|| self.clone())
    }

    pub fn map_coefficients<D: Coefficient>(&self, f: impl Fn(&C) -> D) -> SparsePolynomial<D, M> {
        SparsePolynomial::from_terms(
            self.num_of_vars,
            self.terms
                .iter()
                .map(|(c, m)| (f(c), m.clone()))
                .collect(),
        )
    }

    pub fn evaluate(&self, values: &[C]) -> C {
        self.terms.iter().fold(C::zero(), |acc, (c, m)| {
            let mut term = c.clone();
            for (var, &e) in m.exponents().iter().enumerate() {
                let value = values.get(var).cloned().unwrap_or_else(C::zero);
                for _ in 0..e {
                    term *= &value;
                }
            }
            acc + &term
        })
    }

    pub fn derivative(&self, var: usize) -> Self {
        Self::from_terms(
            self.num_of_vars,
            self.terms
                .iter()
                .filter_map(|(c, m)| {
                    let e = m.exponent(var);
                    (m.clone() / var).map(|m| (c.clone() * &C::from_i64(e as i64), m))
                })
                .collect(),
        )
    }

    pub fn pow(&self, exp: u32) -> Self {
        let mut result = Self::one(self.num_of_vars);
        for _ in 0..exp {
            result *= self;
        }
        result
    }

    /// Renumbers variables upwards by `offset`.
    pub fn shift_vars(&self, offset: usize) -> Self {
        Self {
            num_of_vars: self.num_of_vars + offset,
            terms: self
                .terms
                .iter()
                .map(|(c, m)| (c.clone(), m.shift(offset)))
                .collect(),
        }
    }

    /// Whether any of the variables `start..end` occurs.
    pub fn involves(&self, start: usize, end: usize) -> bool {
        self.terms
            .iter()
            .any(|(_, m)| !m.block(start, end).is_constant())
    }

    /// Division with quotients, by leading terms, first divisor first.
    pub fn div_mod_polys(&self, gs: &[Self]) -> (Vec<Self>, Self) {
        let mut qs: Vec<Self> = vec![Self::zero(); gs.len()];
        let mut tail = Vec::new();
        let mut work = self.clone();

        while let Some((r_coefficient, r_monomial)) = work.leading_term().cloned() {
            let mut division_occurred = false;

            for (i, divisor) in gs.iter().enumerate() {
                let Some((g_coefficient, g_monomial)) = divisor.leading_term() else {
                    continue;
                };
                if let (Some(t_coefficient), Some(t_monomial)) = (
                    r_coefficient.checked_div(g_coefficient),
                    r_monomial.clone() / g_monomial,
                ) {
                    let t = (t_coefficient, t_monomial);
                    work -= &(divisor * &t);
                    qs[i] += &t;
                    division_occurred = true;
                    break;
                }
            }

            if !division_occurred {
                tail.extend(work.pop_leading());
            }
        }
        let mut remainder = Self::zero().with_num_of_vars(self.num_of_vars);
        remainder.append_trailing(tail);

        (qs, remainder)
    }
}

impl<C: Coefficient, O: MonomialOrd> SparsePolynomial<C, DenseMonomial<O>> {
    pub fn transform_order<OT: MonomialOrd>(&self) -> SparsePolynomial<C, DenseMonomial<OT>> {
        SparsePolynomial::from_terms(
            self.num_of_vars,
            self.terms
                .iter()
                .map(|(c, m)| (c.clone(), m.clone().transform_order()))
                .collect(),
        )
    }
}

impl<C: Coefficient, M: Monomial> Add for SparsePolynomial<C, M> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.add(&rhs)
    }
}

impl<C: Coefficient, M: Monomial> Neg for SparsePolynomial<C, M> {
    type Output = Self;

    #[inline]
    fn neg(mut self) -> Self::Output {
        for coeff in &mut self.terms {
            coeff.0 = -coeff.0.clone();
        }
        self
    }
}

impl<C: Debug, M: Debug> Debug for SparsePolynomial<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for (coeff, term) in self.terms.iter() {
            write!(f, "\n{:?}{:?}", coeff, term)?;
        }
        Ok(())
    }
}

impl<C: Coefficient, M: Monomial> Display for SparsePolynomial<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        for (i, (coeff, term)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            let coeff = coeff.to_string();
            let coeff = if coeff.contains(' ') {
                format!("({coeff})")
            } else {
                coeff
            };
            write!(f, "{coeff}")?;
            for (var, &e) in term.exponents().iter().enumerate() {
                match e.cmp(&1) {
                    Ordering::Less => {},
                    Ordering::Equal => write!(f, "*x{var}")?,
                    Ordering::Greater => write!(f, "*x{var}^{e}")?,
                }
            }
        }
        Ok(())
    }
}

impl<'a, C: Coefficient, M: Monomial> AddAssign<&'a Self> for SparsePolynomial<C, M> {
    fn add_assign(&mut self, other: &'a Self) {
        self.merge(other, false);
    }
}

impl<'a, C: Coefficient, M: Monomial> SubAssign<&'a Self> for SparsePolynomial<C, M> {
    fn sub_assign(&mut self, other: &'a Self) {
        self.merge(other, true);
    }
}

impl<C: Coefficient, M: Monomial> SparsePolynomial<C, M> {
    fn merge(&mut self, other: &Self, negate: bool) {
        self.num_of_vars = self.num_of_vars.max(other.num_of_vars);
        let mut merged = Vec::with_capacity(self.terms.len() + other.terms.len());
        let mut lhs = std::mem::take(&mut self.terms).into_iter().peekable();
        let mut rhs = other.terms.iter().peekable();

        loop {
            let which = match (lhs.peek(), rhs.peek()) {
                (Some((_, cur)), Some((_, other))) => cur.cmp(other),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };

            match which {
                Ordering::Less => merged.extend(lhs.next()),
                Ordering::Equal => {
                    let (Some((mut cur, m)), Some((other, _))) = (lhs.next(), rhs.next()) else {
                        break;
                    };
                    if negate {
                        cur -= other;
                    } else {
                        cur += other;
                    }
                    if !cur.is_zero() {
                        merged.push((cur, m));
                    }
                },
                Ordering::Greater => {
                    if let Some((c, m)) = rhs.next() {
                        let c = if negate { -c.clone() } else { c.clone() };
                        merged.push((c, m.clone()));
                    }
                },
            };
        }
        self.terms = merged;
    }
}

impl<'a, C: Coefficient, M: Monomial> Add<&'a Self> for SparsePolynomial<C, M> {
    type Output = Self;

    fn add(self, rhs: &'a Self) -> Self::Output {
        let mut result = self;
        result.add_assign(rhs);
        result
    }
}

impl<'a, 'b, C: Coefficient, M: Monomial> Add<&'a SparsePolynomial<C, M>>
    for &'b SparsePolynomial<C, M>
{
    type Output = SparsePolynomial<C, M>;

    fn add(self, rhs: &'a SparsePolynomial<C, M>) -> Self::Output {
        let mut result = self.clone();
        result.add_assign(rhs);
        result
    }
}

impl<'a, C: Coefficient, M: Monomial> Sub<&'a Self> for SparsePolynomial<C, M> {
    type Output = Self;

    fn sub(self, rhs: &'a Self) -> Self::Output {
        let mut result = self;
        result.sub_assign(rhs);
        result
    }
}

impl<'a, 'b, C: Coefficient, M: Monomial> Sub<&'a SparsePolynomial<C, M>>
    for &'b SparsePolynomial<C, M>
{
    type Output = SparsePolynomial<C, M>;

    fn sub(self, rhs: &'a SparsePolynomial<C, M>) -> Self::Output {
        let mut result = self.clone();
        result.sub_assign(rhs);
        result
    }
}

impl<'a, C: Coefficient, M: Monomial> MulAssign<&'a Self> for SparsePolynomial<C, M> {
    fn mul_assign(&mut self, rhs: &'a Self) {
        let mut acc: HashMap<M, C> = HashMap::with_capacity(self.terms.len() * rhs.terms.len());
        for (c1, m1) in &self.terms {
            for (c2, m2) in &rhs.terms {
                let c = c1.clone() * c2;
                acc.entry(m1.clone() * m2)
                    .and_modify(|prev| *prev += &c)
                    .or_insert(c);
            }
        }
        *self = Self::from_terms(
            self.num_of_vars.max(rhs.num_of_vars),
            acc.into_iter().map(|(m, c)| (c, m)).collect(),
        );
    }
}

impl<'a, C: Coefficient, M: Monomial> Mul<&'a Self> for SparsePolynomial<C, M> {
    type Output = Self;

    fn mul(self, rhs: &'a Self) -> Self::Output {
        let mut result = self;
        result.mul_assign(rhs);
        result
    }
}

impl<'a, 'b, C: Coefficient, M: Monomial> Mul<&'a SparsePolynomial<C, M>>
    for &'b SparsePolynomial<C, M>
{
    type Output = SparsePolynomial<C, M>;

    fn mul(self, rhs: &'a SparsePolynomial<C, M>) -> Self::Output {
        let mut result = self.clone();
        result.mul_assign(rhs);
        result
    }
}

impl<'a, C: Coefficient, M: Monomial> AddAssign<&'a (C, M)> for SparsePolynomial<C, M> {
    fn add_assign(&mut self, rhs: &'a (C, M)) {
        if !rhs.0.is_zero() {
            match self.terms.binary_search_by(|(_, m)| m.cmp(&rhs.1)) {
                Ok(i) => {
                    self.terms[i].0 += &rhs.0;
                    if self.terms[i].0.is_zero() {
                        self.terms.remove(i);
                    }
                },
                Err(i) => self.terms.insert(i, rhs.clone()),
            }
        }
    }
}

impl<'a, C: Coefficient, M: Monomial> Add<&'a (C, M)> for SparsePolynomial<C, M> {
    type Output = Self;

    fn add(self, rhs: &'a (C, M)) -> Self::Output {
        let mut result = self;
        result.add_assign(rhs);
        result
    }
}

impl<'a, 'b, C: Coefficient, M: Monomial> Add<&'a (C, M)> for &'b SparsePolynomial<C, M> {
    type Output = SparsePolynomial<C, M>;

    fn add(self, rhs: &'a (C, M)) -> Self::Output {
        let mut result = self.clone();
        result.add_assign(rhs);
        result
    }
}

impl<'a, C: Coefficient, M: Monomial> SubAssign<&'a (C, M)> for SparsePolynomial<C, M> {
    fn sub_assign(&mut self, rhs: &'a (C, M)) {
        if !rhs.0.is_zero() {
            match self.terms.binary_search_by(|(_, m)| m.cmp(&rhs.1)) {
                Ok(i) => {
                    self.terms[i].0 -= &rhs.0;
                    if self.terms[i].0.is_zero() {
                        self.terms.remove(i);
                    }
                },
                Err(i) => self.terms.insert(i, (-rhs.0.clone(), rhs.1.clone())),
            }
        }
    }
}

impl<'a, C: Coefficient, M: Monomial> Sub<&'a (C, M)> for SparsePolynomial<C, M> {
    type Output = Self;

    fn sub(self, rhs: &'a (C, M)) -> Self::Output {
        let mut result = self;
        result.sub_assign(rhs);
        result
    }
}

impl<'a, 'b, C: Coefficient, M: Monomial> Sub<&'a (C, M)> for &'b SparsePolynomial<C, M> {
    type Output = SparsePolynomial<C, M>;

    fn sub(self, rhs: &'a (C, M)) -> Self::Output {
        let mut result = self.clone();
        result.sub_assign(rhs);
        result
    }
}

impl<'a, C: Coefficient, M: Monomial> MulAssign<&'a (C, M)> for SparsePolynomial<C, M> {
    fn mul_assign(&mut self, rhs: &'a (C, M)) {
        if rhs.0.is_zero() {
            self.terms = Vec::new();
        } else {
            self.terms.iter_mut().for_each(|(c, m)| {
                *c *= &rhs.0;
                *m *= &rhs.1;
            });
            self.terms.retain(|(c, _)| !c.is_zero());
        }
    }
}

impl<'a, C: Coefficient, M: Monomial> Mul<&'a (C, M)> for SparsePolynomial<C, M> {
    type Output = Self;

    fn mul(self, rhs: &'a (C, M)) -> Self::Output {
        let mut result = self;
        result.mul_assign(rhs);
        result
    }
}

impl<'a, 'b, C: Coefficient, M: Monomial> Mul<&'a (C, M)> for &'b SparsePolynomial<C, M> {
    type Output = SparsePolynomial<C, M>;

    fn mul(self, rhs: &'a (C, M)) -> Self::Output {
        let mut result = self.clone();
        result.mul_assign(rhs);
        result
    }
}

impl<'a, C: Coefficient, M: Monomial> MulAssign<&'a M> for SparsePolynomial<C, M> {
    fn mul_assign(&mut self, rhs: &'a M) {
        self.terms.iter_mut().for_each(|(_, m)| {
            *m *= rhs;
        });
    }
}

impl<'a, C: Coefficient, M: Monomial> Mul<&'a M> for SparsePolynomial<C, M> {
    type Output = Self;

    fn mul(self, rhs: &'a M) -> Self::Output {
        let mut result = self;
        result.mul_assign(rhs);
        result
    }
}

impl<'a, 'b, C: Coefficient, M: Monomial> Mul<&'a M> for &'b SparsePolynomial<C, M> {
    type Output = SparsePolynomial<C, M>;

    fn mul(self, rhs: &'a M) -> Self::Output {
        let mut result = self.clone();
        result.mul_assign(rhs);
        result
    }
}

/// Multivariate gcd by primitive remainder sequences in the highest
/// variable, with contents taken recursively in the lower ones.
impl<C: Coefficient, M: Monomial> SparsePolynomial<C, M> {
    fn main_var(&self) -> Option<usize> {
        self.terms
            .iter()
            .filter_map(|(_, m)| m.exponents().iter().rposition(|&e| e > 0))
            .max()
    }

    /// Coefficients as a polynomial in `var`, lowest degree first.
    fn coefficients_in(&self, var: usize) -> Vec<Self> {
        let mut coefficients = vec![Vec::new(); self.degree_in(var) as usize + 1];
        for (c, m) in &self.terms {
            let mut exponents = m.exponents().to_vec();
            let e = match exponents.get_mut(var) {
                Some(e) => std::mem::take(e),
                None => 0,
            };
            coefficients[e as usize].push((c.clone(), M::from_exponents(&exponents)));
        }
        coefficients
            .into_iter()
            .map(|terms| Self::from_terms(self.num_of_vars, terms))
            .collect()
    }

    fn lead_in(&self, var: usize) -> Self {
        self.coefficients_in(var).pop().unwrap_or_else(Self::zero)
    }

    fn content_in(&self, var: usize) -> Self {
        self.coefficients_in(var)
            .iter()
            .filter(|c| !c.is_zero())
            .fold(Self::zero(), |acc, c| acc.poly_gcd(c))
    }

    /// `lc^k * self mod divisor` in `var`; `divisor` must be nonzero.
    fn pseudo_rem(&self, divisor: &Self, var: usize) -> Self {
        let degree = divisor.degree_in(var);
        let lead = divisor.lead_in(var);
        let mut remainder = self.clone();
        while !remainder.is_zero() && remainder.degree_in(var) >= degree {
            let shift = M::new(&[(var, remainder.degree_in(var) - degree)]);
            let top = remainder.lead_in(var);
            remainder = remainder * &lead - &(&(divisor * &top) * &shift);
        }
        remainder
    }

    fn primitive_in(self, var: usize) -> Self {
        let content = self.content_in(var);
        Coefficient::checked_div(&self, &content).unwrap_or(self)
    }

    /// Monic over a field, otherwise with the leading unit removed.
    fn associate(self) -> Self {
        let unit = match self.leading_coefficient() {
            None => return self,
            Some(lc) if C::is_field() => lc.inverse(),
            Some(lc) => lc.unit_part().inverse(),
        };
        match unit {
            Some(unit) if !unit.is_one() => self.scaled(&unit),
            _ => self,
        }
    }

    fn poly_gcd(&self, other: &Self) -> Self {
        let num = self.num_of_vars.max(other.num_of_vars);
        if self.is_zero() {
            return other.clone().associate().with_num_of_vars(num);
        }
        if other.is_zero() {
            return self.clone().associate().with_num_of_vars(num);
        }
        let Some(var) = self.main_var().max(other.main_var()) else {
            return Self::constant(num, self.content().gcd(&other.content())).associate();
        };
        let (ca, cb) = (self.content_in(var), other.content_in(var));
        let content = ca.poly_gcd(&cb);
        let (Some(mut a), Some(mut b)) = (
            Coefficient::checked_div(self, &ca),
            Coefficient::checked_div(other, &cb),
        ) else {
            return content;
        };
        if a.degree_in(var) < b.degree_in(var) {
            std::mem::swap(&mut a, &mut b);
        }
        while !b.is_zero() {
            let r = a.pseudo_rem(&b, var);
            a = b;
            b = if r.is_zero() { r } else { r.primitive_in(var) };
        }
        if a.degree_in(var) == 0 {
            return content.with_num_of_vars(num);
        }
        (content * &a).associate().with_num_of_vars(num)
    }
}

/// Polynomials over a ring are themselves coefficients, which is how
/// parametric generators are represented.
impl<C: Coefficient, M: Monomial> Coefficient for SparsePolynomial<C, M> {
    fn zero() -> Self {
        SparsePolynomial::zero()
    }

    fn one() -> Self {
        SparsePolynomial::one(0)
    }

    fn is_zero(&self) -> bool {
        SparsePolynomial::is_zero(self)
    }

    fn is_one(&self) -> bool {
        SparsePolynomial::is_one(self)
    }

    fn inverse(&self) -> Option<Self> {
        match self.terms.as_slice() {
            [(c, m)] if m.is_constant() => c
                .inverse()
                .map(|inv| SparsePolynomial::constant(self.num_of_vars, inv)),
            _ => None,
        }
    }

    fn checked_div(&self, rhs: &Self) -> Option<Self> {
        let (d_coefficient, d_monomial) = rhs.leading_term()?;
        if let [(c, m)] = rhs.terms.as_slice() {
            if m.is_constant() {
                return self.exact_div_scalar(c);
            }
        }
        let mut quotient = SparsePolynomial::zero();
        let mut work = self.clone();
        while let Some((r_coefficient, r_monomial)) = work.leading_term() {
            let t = (
                r_coefficient.checked_div(d_coefficient)?,
                (r_monomial.clone() / d_monomial)?,
            );
            work -= &(rhs * &t);
            quotient += &t;
        }
        quotient.num_of_vars = self.num_of_vars.max(rhs.num_of_vars);
        Some(quotient)
    }

    fn gcd(&self, other: &Self) -> Self {
        self.poly_gcd(other)
    }

    fn is_field() -> bool {
        false
    }

    fn from_i64(n: i64) -> Self {
        SparsePolynomial::constant(0, C::from_i64(n))
    }

    fn characteristic() -> BigUint {
        C::characteristic()
    }
}

#[cfg(test)]
#[allow(clippy::all)]
mod tests {
    use ark_ff::UniformRand;
    use ark_std::test_rng;
    use ark_test_curves::bls12_381::Fr;
    use num_rational::BigRational;
    use rand::Rng;

    use crate::poly::{
        coefficient::rational,
        monomial::{DegRevLexOrder, DenseMonomial, LexOrder, MonomialOrd},
    };

    use super::*;

    /// Generate random `l`-variate polynomial of maximum individual degree `d`
    fn rand_poly<R: Rng, O: MonomialOrd>(
        l: usize,
        d: u16,
        rng: &mut R,
    ) -> SparsePolynomial<Fr, DenseMonomial<O>> {
        let mut random_terms = Vec::new();
        let num_terms = rng.gen_range(1..200);
        random_terms.push((Fr::rand(rng), DenseMonomial::new(&vec![])));
        for _ in 1..num_terms {
            random_terms.push((Fr::rand(rng), rand_monomial(l, d, rng)));
        }
        SparsePolynomial::new(l, &random_terms)
    }

    fn rand_monomial<R: Rng, O: MonomialOrd>(l: usize, d: u16, rng: &mut R) -> DenseMonomial<O> {
        let term: Vec<(usize, u16)> = (0..l)
            .filter_map(|i| {
                if rng.gen_bool(0.5) {
                    Some((i, rng.gen_range(1..(d + 1))))
                } else {
                    None
                }
            })
            .collect();
        DenseMonomial::new(&term)
    }

    fn poly_q(terms: &[(i64, &[u16])]) -> SparsePolynomial<BigRational, DenseMonomial<LexOrder>> {
        SparsePolynomial::from_terms(
            2,
            terms
                .iter()
                .map(|(c, e)| (rational(*c, 1), DenseMonomial::from_exponents(e)))
                .collect(),
        )
    }

    #[test]
    fn add_polynomials() {
        let rng = &mut test_rng();
        let max_degree = 10;
        for a_var_count in 1..8 {
            for b_var_count in 1..8 {
                let p1 = rand_poly::<_, LexOrder>(a_var_count, max_degree, rng);
                let p2 = rand_poly::<_, LexOrder>(b_var_count, max_degree, rng);
                let res1 = p1.to_owned() + &p2;
                let res2 = p2.to_owned() + &p1;
                assert_eq!(res1, res2);
                assert!((res2 - &res1).is_zero());
            }
        }
    }

    #[test]
    fn sub_polynomials() {
        let rng = &mut test_rng();
        let max_degree = 10;
        for a_var_count in 1..8 {
            for b_var_count in 1..8 {
                let p1 = rand_poly::<_, DegRevLexOrder>(a_var_count, max_degree, rng);
                let p2 = rand_poly::<_, DegRevLexOrder>(b_var_count, max_degree, rng);
                let res1 = p1.to_owned() - &p2;
                let res2 = p2.to_owned() - &p1;
                assert_eq!(res1, -res2);
                assert_eq!(res1.to_owned() + &p2, p1);
            }
        }
    }

    #[test]
    fn add_and_sub_tuple() {
        let rng = &mut test_rng();
        let max_degree = 10;
        for a_var_count in 1..8 {
            for _ in 1..8 {
                let p = rand_poly::<_, DegRevLexOrder>(a_var_count, max_degree, rng);
                let t = (Fr::rand(rng), rand_monomial(a_var_count, max_degree, rng));
                let res1 = &p + &t;
                let res2 = SparsePolynomial::new(p.num_of_vars, &[t.to_owned()]) + &p;
                assert_eq!(res1, res2);
                assert_eq!(res1 - &t, p);
                assert_eq!(&(&p - &t) + &t, p);
            }
        }
    }

    #[test]
    fn mul_tuple() {
        let rng = &mut test_rng();
        let max_degree = 10;
        for a_var_count in 1..8 {
            let p = rand_poly::<_, DegRevLexOrder>(a_var_count, max_degree, rng);
            let t = (Fr::rand(rng), rand_monomial(a_var_count, max_degree, rng));
            let res1 = &p * &t;
            let res2 = p
                .terms
                .iter()
                .map(|tt| SparsePolynomial::new(p.num_of_vars, &[tt.to_owned()]) * &t)
                .reduce(|a, b| a + &b)
                .unwrap();
            assert_eq!(res1, res2);
        }
    }

    #[test]
    fn mul_distributes_over_add() {
        let rng = &mut test_rng();
        for vars in 1..5 {
            let p = rand_poly::<_, LexOrder>(vars, 3, rng);
            let q = rand_poly::<_, LexOrder>(vars, 3, rng);
            let r = rand_poly::<_, LexOrder>(vars, 3, rng);
            assert_eq!(&p * &(&q + &r), &(&p * &q) + &(&p * &r));
            assert_eq!(&p * &q, &q * &p);
        }
    }

    #[test]
    fn leading_term_is_greatest() {
        let p = poly_q(&[(1, &[0, 3]), (2, &[1]), (-1, &[])]);
        assert_eq!(p.leading_monomial(), Some(&DenseMonomial::from_exponents(&[1])));
        assert_eq!(p.leading_coefficient(), Some(&rational(2, 1)));
        assert_eq!(p.iter().count(), 3);
        assert_eq!(p.degree(), 3);
        assert_eq!(p.to_string(), "2*x0 + 1*x1^3 + -1");
    }

    #[test]
    fn div_mod_polys_gives_quotients() {
        // x^5 + x divided by [x^2 - y^3, x*y^2 + x] in lex x > y
        let f = poly_q(&[(1, &[5]), (1, &[1])]);
        let gs = vec![
            poly_q(&[(1, &[2]), (-1, &[0, 3])]),
            poly_q(&[(1, &[1, 2]), (1, &[1])]),
        ];
        let (qs, r) = f.div_mod_polys(&gs);
        let recombined = qs
            .iter()
            .zip(gs.iter())
            .fold(r.clone(), |acc, (q, g)| acc + &(q * g));
        assert_eq!(recombined, f);
        assert!(r.terms().iter().all(|(_, m)| gs
            .iter()
            .all(|g| !g.leading_monomial().unwrap().divides(m))));
    }

    #[test]
    fn exact_division_and_gcd_of_parametric_coefficients() {
        let a = poly_q(&[(1, &[1]), (1, &[0, 1])]);
        let b = poly_q(&[(1, &[1]), (-1, &[0, 1])]);
        let prod = &a * &b;
        assert_eq!(Coefficient::checked_div(&prod, &a), Some(b.clone()));
        assert_eq!(Coefficient::checked_div(&a, &b), None);
        assert_eq!(Coefficient::gcd(&prod, &b), b);
        let two_x = poly_q(&[(2, &[1])]);
        let four_xy = poly_q(&[(4, &[1, 1])]);
        assert_eq!(Coefficient::gcd(&four_xy, &two_x), poly_q(&[(1, &[1])]));
    }

    #[test]
    fn gcd_of_coprime_looking_multivariate_polynomials() {
        // (x + y)(x - y + 1) and (x + y)(x y + 2) share only x + y
        let common = poly_q(&[(1, &[1]), (1, &[0, 1])]);
        let f = &common * &poly_q(&[(1, &[1]), (-1, &[0, 1]), (1, &[])]);
        let g = &common * &poly_q(&[(1, &[1, 1]), (2, &[])]);
        assert_eq!(Coefficient::gcd(&f, &g), common);
        let (gf, ff) = crate::reduction::cofactors(&f, &g);
        assert_eq!(&f * &gf, &g * &ff);
        assert_eq!(gf.degree(), 2);

        use num_bigint::BigInt;
        let z = |terms: &[(i64, &[u16])]| -> SparsePolynomial<BigInt, DenseMonomial<LexOrder>> {
            SparsePolynomial::new(
                2,
                &terms
                    .iter()
                    .map(|(c, e)| (BigInt::from(*c), DenseMonomial::from_exponents(e)))
                    .collect::<Vec<_>>(),
            )
        };
        // 6 x^2 y - 6 y and -4 x y - 4 y over Z: gcd 2 y (x + 1)
        let f = z(&[(6, &[2, 1]), (-6, &[0, 1])]);
        let g = z(&[(-4, &[1, 1]), (-4, &[0, 1])]);
        assert_eq!(Coefficient::gcd(&f, &g), z(&[(2, &[1, 1]), (2, &[0, 1])]));
    }

    #[test]
    fn primitive_part_over_integers() {
        use num_bigint::BigInt;
        let p: SparsePolynomial<BigInt, DenseMonomial<LexOrder>> = SparsePolynomial::new(
            1,
            &[
                (BigInt::from(6), DenseMonomial::from_exponents(&[2])),
                (BigInt::from(-4), DenseMonomial::from_exponents(&[])),
            ],
        );
        assert_eq!(p.content(), BigInt::from(2));
        assert_eq!(p.primitive().leading_coefficient(), Some(&BigInt::from(3)));
        let q = p.scaled(&BigInt::from(-1));
        assert_eq!(q.primitive(), p.primitive());
    }

    #[test]
    fn derivative_and_evaluate() {
        let p = poly_q(&[(3, &[2, 1]), (1, &[0, 2]), (5, &[])]);
        let dx = p.derivative(0);
        assert_eq!(dx, poly_q(&[(6, &[1, 1])]));
        let value = p.evaluate(&[rational(2, 1), rational(-1, 1)]);
        assert_eq!(value, rational(3 * 4 * -1 + 1 + 5, 1));
    }

    #[test]
    fn transform_order_keeps_terms() {
        let p = poly_q(&[(1, &[0, 3]), (2, &[1])]);
        let q = p.transform_order::<DegRevLexOrder>();
        assert_eq!(q.leading_monomial(), Some(&DenseMonomial::from_exponents(&[0, 3])));
        assert_eq!(q.transform_order::<LexOrder>(), p);
    }
}
