use std::fmt;

use crate::{
    error::GbResult,
    groebner::GroebnerBaseSeq,
    poly::{coefficient::Coefficient, monomial::MonomialOrd, ring::Poly},
    reduction::{normal_form, normalize, Commutative, GbElement},
};

/// What a condition says about a parameter polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Zero,
    NonZero,
    Undetermined,
}

/// A constructible set of parameter values: the common zeros of `zero`
/// where no polynomial of `nonzero` vanishes.
///
/// `zero` is always a reduced Groebner basis and `nonzero` holds normalised
/// polynomials without repetitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition<C, OP> {
    params: usize,
    zero: Vec<Poly<C, OP>>,
    nonzero: Vec<Poly<C, OP>>,
}

impl<C: Coefficient, OP: MonomialOrd> Condition<C, OP> {
    /// The condition every parameter value satisfies.
    pub fn new(params: usize) -> Self {
        Self {
            params,
            zero: Vec::new(),
            nonzero: Vec::new(),
        }
    }

    pub fn num_of_params(&self) -> usize {
        self.params
    }

    pub fn zero(&self) -> &[Poly<C, OP>] {
        &self.zero
    }

    pub fn nonzero(&self) -> &[Poly<C, OP>] {
        &self.nonzero
    }

    /// Normal form of a coefficient modulo the zero ideal.
    pub fn reduce(&self, c: &Poly<C, OP>) -> Poly<C, OP> {
        if self.zero.is_empty() {
            return c.clone();
        }
        normal_form(&Commutative, c, &self.zero)
    }

    /// Rabinowitsch test: `1` lies outside `zero + <1 - t * prod(nonzero)>`.
    pub fn is_consistent(&self) -> GbResult<bool> {
        if self.zero.iter().any(|z| GbElement::is_unit(z)) {
            return Ok(false);
        }
        let n = self.params + 1;
        let product = self
            .nonzero
            .iter()
            .fold(Poly::one(self.params), |acc, p| acc * p);
        let t = Poly::<C, OP>::variable(n, 0);
        let rabinowitsch = Poly::one(n) - &(t * &product.shift_vars(1));

        let mut generators: Vec<Poly<C, OP>> = self.zero.iter().map(|z| z.shift_vars(1)).collect();
        generators.push(rabinowitsch);
        let gb = GroebnerBaseSeq::new().gb(&generators)?;
        Ok(!gb.iter().any(|g| GbElement::is_unit(g)))
    }

    /// This condition with `c` added to the zero ideal.
    pub fn with_zero(&self, c: &Poly<C, OP>) -> GbResult<Self> {
        let mut generators = self.zero.clone();
        generators.push(c.clone().with_num_of_vars(self.params));
        let seq = GroebnerBaseSeq::new();
        let zero = seq.reduced_gb(&seq.gb(&generators)?)?.into_elements();
        Ok(Self {
            params: self.params,
            zero,
            nonzero: self.nonzero.clone(),
        })
    }

    /// This condition with `c` added to the non-zero list. A `c` inside the
    /// zero ideal makes the result inconsistent.
    pub fn with_nonzero(&self, c: &Poly<C, OP>) -> GbResult<Self> {
        let c = normalize(&self.reduce(c))?.with_num_of_vars(self.params);
        let mut nonzero = self.nonzero.clone();
        let trivial = c.is_constant() && !c.is_zero();
        if !trivial && !nonzero.contains(&c) {
            nonzero.push(c);
        }
        Ok(Self {
            params: self.params,
            zero: self.zero.clone(),
            nonzero,
        })
    }

    /// Both conditions at once.
    pub fn meet(&self, other: &Self) -> GbResult<Self> {
        let mut met = self.clone();
        for z in &other.zero {
            met = met.with_zero(z)?;
        }
        for n in &other.nonzero {
            met = met.with_nonzero(n)?;
        }
        Ok(met)
    }

    pub fn color(&self, c: &Poly<C, OP>) -> GbResult<Color> {
        let r = self.reduce(c);
        if r.is_zero() {
            return Ok(Color::Zero);
        }
        if r.is_constant() {
            return Ok(Color::NonZero);
        }
        if !self.with_nonzero(&r)?.is_consistent()? {
            return Ok(Color::Zero);
        }
        if !self.with_zero(&r)?.is_consistent()? {
            return Ok(Color::NonZero);
        }
        Ok(Color::Undetermined)
    }

    /// The consistent refinements by `c = 0` and `c != 0`, in that order.
    pub fn split(&self, c: &Poly<C, OP>) -> GbResult<Vec<Self>> {
        let mut children = Vec::with_capacity(2);
        for child in [self.with_zero(c)?, self.with_nonzero(c)?] {
            if child.is_consistent()? {
                children.push(child);
            }
        }
        Ok(children)
    }

    /// Whether the parameter values `point` satisfy the condition.
    pub fn holds_at(&self, point: &[C]) -> bool {
        self.zero.iter().all(|z| z.evaluate(point).is_zero())
            && self.nonzero.iter().all(|n| !n.evaluate(point).is_zero())
    }
}

impl<C: Coefficient, OP: MonomialOrd> fmt::Display for Condition<C, OP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zero: Vec<String> = self.zero.iter().map(|p| format!("{p} = 0")).collect();
        let nonzero: Vec<String> = self.nonzero.iter().map(|p| format!("{p} != 0")).collect();
        let all = [zero, nonzero].concat();
        if all.is_empty() {
            write!(f, "true")
        } else {
            write!(f, "{}", all.join(", "))
        }
    }
}
