use hashbrown::HashMap;
use std::{
    fmt,
    sync::{PoisonError, RwLock},
};

use crate::{
    error::{GbError, GbResult},
    log_info,
    poly::{coefficient::Coefficient, monomial::Monomial, polynomial::SparsePolynomial},
};

/// Products `x_j * x_i` for `j > i` that differ from the commutative one.
#[derive(Debug, Clone, Default)]
pub struct RelationTable<C, M> {
    relations: HashMap<(usize, usize), SparsePolynomial<C, M>>,
}

impl<C: Coefficient, M: Monomial> RelationTable<C, M> {
    pub fn new() -> Self {
        Self {
            relations: HashMap::new(),
        }
    }

    /// Sets `x_j * x_i = product`. The pair is stored with the larger index
    /// first whichever way it is given.
    pub fn update(&mut self, j: usize, i: usize, product: SparsePolynomial<C, M>) {
        self.relations.insert((j.max(i), j.min(i)), product);
    }

    pub fn lookup(&self, j: usize, i: usize) -> Option<&SparsePolynomial<C, M>> {
        self.relations.get(&(j, i))
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Relations as `((j, i), x_j * x_i)` in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &SparsePolynomial<C, M>)> {
        self.relations.iter().map(|(&key, product)| (key, product))
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Weyl algebra in `x_0..x_{n-1}` and `d_0..d_{n-1}` stored as variables
    /// `0..n` and `n..2n`, with `d_i * x_i = x_i * d_i + 1`.
    pub fn weyl(n: usize) -> Self {
        let vars = 2 * n;
        let mut table = Self::new();
        for i in 0..n {
            let xd = M::one() * i * (n + i);
            let product = SparsePolynomial::from_terms(vars, vec![(C::one(), xd), (C::one(), M::one())]);
            table.update(n + i, i, product);
        }
        table
    }
}

/// Outcome of the associativity check run when a ring is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Triples `(i, j, k)` with `(x_k * x_j) * x_i != x_k * (x_j * x_i)`.
    pub failures: Vec<(usize, usize, usize)>,
}

impl ValidationReport {
    pub fn is_associative(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_associative() {
            return write!(f, "associative");
        }
        let triples: Vec<String> = self
            .failures
            .iter()
            .map(|(i, j, k)| format!("({i}, {j}, {k})"))
            .collect();
        write!(f, "not associative at {}", triples.join(", "))
    }
}

/// Polynomial ring whose variables multiply through a [`RelationTable`].
///
/// Monomials are read as ordered products `x_0^e_0 * x_1^e_1 * ...`, so a
/// product only needs rewriting where a variable meets a smaller one.
pub struct SolvableRing<C, M> {
    vars: usize,
    table: RelationTable<C, M>,
    report: ValidationReport,
    cache: RwLock<HashMap<(M, M), SparsePolynomial<C, M>>>,
}

impl<C, M> fmt::Debug for SolvableRing<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolvableRing")
            .field("vars", &self.vars)
            .field("relations", &self.table.relations.len())
            .field("report", &self.report)
            .finish()
    }
}

impl<C: Coefficient, M: Monomial> SolvableRing<C, M> {
    /// Builds the ring and reports whether its multiplication is associative.
    /// A failing ring is still returned; Groebner bases over it may be wrong.
    pub fn new(vars: usize, table: RelationTable<C, M>) -> (Self, ValidationReport) {
        let mut ring = Self {
            vars,
            table,
            report: ValidationReport::default(),
            cache: RwLock::new(HashMap::new()),
        };
        ring.report = ring.check_associativity();
        if !ring.report.is_associative() {
            log_info!("Solvable ring with {} variables is {}", vars, ring.report);
        }
        let report = ring.report.clone();
        (ring, report)
    }

    /// Like [`Self::new`] but rejects a non-associative table.
    pub fn new_checked(vars: usize, table: RelationTable<C, M>) -> GbResult<Self> {
        let (ring, report) = Self::new(vars, table);
        if report.is_associative() {
            Ok(ring)
        } else {
            Err(GbError::Construction(report.to_string()))
        }
    }

    /// Commutative ring in `vars` variables.
    pub fn commutative(vars: usize) -> Self {
        Self::new(vars, RelationTable::new()).0
    }

    pub fn num_of_vars(&self) -> usize {
        self.vars
    }

    pub fn table(&self) -> &RelationTable<C, M> {
        &self.table
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn is_associative(&self) -> bool {
        self.report.is_associative()
    }

    pub fn variable(&self, var: usize) -> SparsePolynomial<C, M> {
        SparsePolynomial::variable(self.vars, var)
    }

    fn check_associativity(&self) -> ValidationReport {
        let mut failures = Vec::new();
        for k in 0..self.vars {
            for j in 0..=k {
                for i in 0..=j {
                    let (xi, xj, xk) = (self.variable(i), self.variable(j), self.variable(k));
                    let lhs = self.multiply(&self.multiply(&xk, &xj), &xi);
                    let rhs = self.multiply(&xk, &self.multiply(&xj, &xi));
                    if lhs != rhs {
                        failures.push((i, j, k));
                    }
                }
            }
        }
        ValidationReport { failures }
    }

    /// Noncommutative product `p * q`.
    pub fn multiply(&self, p: &SparsePolynomial<C, M>, q: &SparsePolynomial<C, M>) -> SparsePolynomial<C, M> {
        let mut product = SparsePolynomial::zero().with_num_of_vars(self.vars);
        for (a, u) in p.terms() {
            for (b, v) in q.terms() {
                let mut uv = self.multiply_monomials(u, v);
                uv.scale(&(a.clone() * b));
                product += &uv;
            }
        }
        product
    }

    /// `t * p` for a monomial `t`.
    pub fn multiply_left(&self, t: &M, p: &SparsePolynomial<C, M>) -> SparsePolynomial<C, M> {
        self.multiply(&SparsePolynomial::monomial(self.vars, C::one(), t.clone()), p)
    }

    /// `p * t` for a monomial `t`.
    pub fn multiply_right(&self, p: &SparsePolynomial<C, M>, t: &M) -> SparsePolynomial<C, M> {
        self.multiply(p, &SparsePolynomial::monomial(self.vars, C::one(), t.clone()))
    }

    pub fn multiply_monomials(&self, u: &M, v: &M) -> SparsePolynomial<C, M> {
        let monomial = |m: M| SparsePolynomial::monomial(self.vars, C::one(), m);
        let (Some(j), Some(i)) = (
            u.exponents().len().checked_sub(1),
            v.exponents().iter().position(|&e| e > 0),
        ) else {
            return monomial(u.clone() * v);
        };
        if j <= i {
            return monomial(u.clone() * v);
        }

        let key = (u.clone(), v.clone());
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return hit.clone();
        }

        // u = u' x_j, v = x_i v'
        let (Some(u1), Some(v1)) = (u.clone() / j, v.clone() / i) else {
            return monomial(u.clone() * v);
        };
        let swapped = match self.table.lookup(j, i) {
            Some(relation) => relation.clone(),
            None => monomial(M::one() * i * j),
        };
        let mut product = SparsePolynomial::zero().with_num_of_vars(self.vars);
        for (c, w) in swapped.terms() {
            for (d, z) in self.multiply_monomials(&u1, w).terms() {
                let mut term = self.multiply_monomials(z, &v1);
                term.scale(&(c.clone() * d));
                product += &term;
            }
        }

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, product.clone());
        product
    }
}
