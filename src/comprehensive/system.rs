use rayon::prelude::*;
use std::{collections::VecDeque, time::Instant};

use crate::{
    comprehensive::condition::{Color, Condition},
    error::GbResult,
    log_info,
    poly::{
        coefficient::Coefficient,
        monomial::{DenseMonomial, Monomial, MonomialOrd},
        polynomial::SparsePolynomial,
        ring::Poly,
    },
    reduction::cofactors,
};

/// Polynomial in the main variables whose coefficients are polynomials in
/// the parameters.
pub type ParamPoly<C, OP, O> = SparsePolynomial<Poly<C, OP>, DenseMonomial<O>>;

/// Effective leading term of a polynomial under a condition.
enum Lead<C, OP, O> {
    Term(Poly<C, OP>, DenseMonomial<O>),
    /// Every coefficient vanishes.
    Vanishes,
    /// The condition cannot tell whether this coefficient vanishes.
    Undetermined(Poly<C, OP>),
}

enum Reduced<C, OP, O> {
    Zero,
    Irreducible(ParamPoly<C, OP, O>, Poly<C, OP>, DenseMonomial<O>),
    Undetermined(Poly<C, OP>),
}

/// Basis element with its effective leading term under the branch.
#[derive(Debug, Clone)]
struct Determined<C, OP, O> {
    poly: ParamPoly<C, OP, O>,
    lc: Poly<C, OP>,
    lm: DenseMonomial<O>,
}

fn effective_lead<C: Coefficient, OP: MonomialOrd, O: MonomialOrd>(
    cond: &Condition<C, OP>,
    p: &ParamPoly<C, OP, O>,
) -> GbResult<Lead<C, OP, O>> {
    for (c, m) in p.terms().iter().rev() {
        match cond.color(c)? {
            Color::Zero => continue,
            Color::NonZero => return Ok(Lead::Term(c.clone(), m.clone())),
            Color::Undetermined => return Ok(Lead::Undetermined(c.clone())),
        }
    }
    Ok(Lead::Vanishes)
}

/// Coefficients reduced modulo the zero ideal of `cond`, leading terms that
/// vanish under it dropped and a content that does not vanish divided out.
/// Only the specialisations under `cond` survive this, not ideal membership.
fn reduce_modulo<C: Coefficient, OP: MonomialOrd, O: MonomialOrd>(
    cond: &Condition<C, OP>,
    p: &ParamPoly<C, OP, O>,
) -> GbResult<ParamPoly<C, OP, O>> {
    let mut reduced = p.map_coefficients(|c| cond.reduce(c));
    while let Some((c, _)) = reduced.leading_term() {
        if cond.color(c)? != Color::Zero {
            break;
        }
        reduced.pop_leading();
    }
    let content = reduced.content();
    if reduced.is_zero() || content.is_one() || cond.color(&content)? != Color::NonZero {
        return Ok(reduced);
    }
    Ok(reduced.exact_div_scalar(&content).unwrap_or(reduced))
}

/// Fraction-free top reduction under `cond`. Unless `modulo_condition` is
/// set, coefficients are never reduced modulo the condition, so every
/// intermediate stays in the ideal.
fn top_reduce<C: Coefficient, OP: MonomialOrd, O: MonomialOrd>(
    cond: &Condition<C, OP>,
    p: &ParamPoly<C, OP, O>,
    basis: &[Determined<C, OP, O>],
    modulo_condition: bool,
) -> GbResult<Reduced<C, OP, O>> {
    let mut work = p.clone();
    loop {
        if modulo_condition {
            work = reduce_modulo(cond, &work)?;
        }
        let (a, m) = match effective_lead(cond, &work)? {
            Lead::Vanishes => return Ok(Reduced::Zero),
            Lead::Undetermined(c) => return Ok(Reduced::Undetermined(c)),
            Lead::Term(a, m) => (a, m),
        };
        let Some((g, t)) = basis
            .iter()
            .find_map(|g| (m.clone() / &g.lm).map(|t| (g, t)))
        else {
            return Ok(Reduced::Irreducible(work, a, m));
        };
        let (bg, ag) = cofactors(&a, &g.lc);
        work.scale(&bg);
        work -= &(&g.poly * &(ag, t));
    }
}

fn s_polynomial<C: Coefficient, OP: MonomialOrd, O: MonomialOrd>(
    f: &Determined<C, OP, O>,
    g: &Determined<C, OP, O>,
) -> Option<ParamPoly<C, OP, O>> {
    let lcm = f.lm.lcm(&g.lm);
    let tf = lcm.clone() / &f.lm;
    let tg = lcm / &g.lm;
    let (Some(tf), Some(tg)) = (tf, tg) else {
        return None;
    };
    let (bg, ag) = cofactors(&f.lc, &g.lc);
    Some(&f.poly * &(bg, tf) - &(&g.poly * &(ag, tg)))
}

/// One branch of a Groebner system: a condition on the parameters and a
/// basis whose effective leading coefficients are non-zero under it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColoredSystem<C, OP, O> {
    pub condition: Condition<C, OP>,
    pub basis: Vec<ParamPoly<C, OP, O>>,
}

impl<C: Coefficient, OP: MonomialOrd, O: MonomialOrd> ColoredSystem<C, OP, O> {
    /// The basis with the parameters replaced by `point`, zeros dropped.
    pub fn specialize(&self, point: &[C]) -> Vec<Poly<C, O>> {
        specialize(&self.basis, point)
    }
}

pub fn specialize<C: Coefficient, OP: MonomialOrd, O: MonomialOrd>(
    ps: &[ParamPoly<C, OP, O>],
    point: &[C],
) -> Vec<Poly<C, O>> {
    ps.iter()
        .map(|p| p.map_coefficients(|c| c.evaluate(point)))
        .filter(|p| !p.is_zero())
        .collect()
}

/// Branches covering the whole parameter space, pairwise disjoint.
#[derive(Debug, Clone, PartialEq)]
pub struct GroebnerSystem<C, OP, O> {
    branches: Vec<ColoredSystem<C, OP, O>>,
}

impl<C: Coefficient, OP: MonomialOrd, O: MonomialOrd> GroebnerSystem<C, OP, O> {
    pub fn branches(&self) -> &[ColoredSystem<C, OP, O>] {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// The branch whose condition `point` satisfies.
    pub fn branch_at(&self, point: &[C]) -> Option<&ColoredSystem<C, OP, O>> {
        self.branches.iter().find(|b| b.condition.holds_at(point))
    }

    /// Comprehensive Groebner basis: the union of all branch bases.
    pub fn cgb(&self) -> Vec<ParamPoly<C, OP, O>> {
        let mut union: Vec<ParamPoly<C, OP, O>> = Vec::new();
        for p in self.branches.iter().flat_map(|b| b.basis.iter()) {
            if !union.contains(p) {
                union.push(p.clone());
            }
        }
        union
    }
}

struct Branch<C, OP, O> {
    cond: Condition<C, OP>,
    basis: Vec<Determined<C, OP, O>>,
    todo: VecDeque<ParamPoly<C, OP, O>>,
    pairs: VecDeque<(usize, usize)>,
}

impl<C: Coefficient, OP: MonomialOrd, O: MonomialOrd> Branch<C, OP, O> {
    fn refined(&self, cond: Condition<C, OP>, p: ParamPoly<C, OP, O>) -> Self {
        let mut todo = self.todo.clone();
        todo.push_front(p);
        Self {
            cond,
            basis: self.basis.clone(),
            todo,
            pairs: self.pairs.clone(),
        }
    }

    fn insert(&mut self, poly: ParamPoly<C, OP, O>, lc: Poly<C, OP>, lm: DenseMonomial<O>) {
        if lm.is_constant() {
            self.basis = vec![Determined { poly, lc, lm }];
            self.todo.clear();
            self.pairs.clear();
            return;
        }
        let j = self.basis.len();
        for (i, g) in self.basis.iter().enumerate() {
            if !g.lm.is_coprime(&lm) {
                self.pairs.push_back((i, j));
            }
        }
        self.basis.push(Determined { poly, lc, lm });
    }

    /// Runs until done or until a coefficient forces a split.
    fn run(mut self) -> GbResult<Result<ColoredSystem<C, OP, O>, Vec<Self>>> {
        loop {
            let p = match self.todo.pop_front() {
                Some(p) => p,
                None => {
                    let Some((i, j)) = self.pairs.pop_front() else {
                        return Ok(Ok(self.finish()));
                    };
                    match s_polynomial(&self.basis[i], &self.basis[j]) {
                        Some(s) => s,
                        None => continue,
                    }
                },
            };
            match top_reduce(&self.cond, &p, &self.basis, false)? {
                Reduced::Zero => {},
                Reduced::Irreducible(h, lc, lm) => self.insert(h, lc, lm),
                Reduced::Undetermined(c) => {
                    let children = self
                        .cond
                        .split(&c)?
                        .into_iter()
                        .map(|cond| self.refined(cond, p.clone()))
                        .collect();
                    return Ok(Err(children));
                },
            }
        }
    }

    fn finish(self) -> ColoredSystem<C, OP, O> {
        let mut basis = self.basis;
        basis.sort_by(|f, g| f.lm.cmp(&g.lm));
        let mut minimal: Vec<Determined<C, OP, O>> = Vec::with_capacity(basis.len());
        for f in basis {
            if !minimal.iter().any(|g| g.lm.divides(&f.lm)) {
                minimal.push(f);
            }
        }
        ColoredSystem {
            condition: self.cond,
            basis: minimal.into_iter().map(|d| d.poly).collect(),
        }
    }
}

/// Groebner system of `generators`: a list of branches such that under every
/// parameter value the branch it falls into specialises to a Groebner basis.
pub fn gb_system<C, OP, O>(params: usize, generators: &[ParamPoly<C, OP, O>]) -> GbResult<GroebnerSystem<C, OP, O>>
where
    C: Coefficient,
    OP: MonomialOrd,
    O: MonomialOrd,
{
    let start = Instant::now();
    let mut stack = vec![Branch {
        cond: Condition::new(params),
        basis: Vec::new(),
        todo: generators.iter().filter(|p| !p.is_zero()).cloned().collect(),
        pairs: VecDeque::new(),
    }];
    let mut branches = Vec::new();
    let mut splits = 0usize;
    while let Some(branch) = stack.pop() {
        match branch.run()? {
            Ok(done) => branches.push(done),
            Err(children) => {
                splits += 1;
                // keep the zero branch first in the output
                stack.extend(children.into_iter().rev());
            },
        }
    }
    log_info!(
        "Comprehensive GB end with {} branches after {} splits, {:?}",
        branches.len(),
        splits,
        start.elapsed()
    );
    Ok(GroebnerSystem { branches })
}

enum Verdict<C, OP> {
    Holds,
    Fails,
    Split(Poly<C, OP>),
}

/// Checks `basis` against `generators` under one condition without splitting.
fn verify_branch<C, OP, O>(
    cond: &Condition<C, OP>,
    basis: &[ParamPoly<C, OP, O>],
    generators: &[ParamPoly<C, OP, O>],
) -> GbResult<Verdict<C, OP>>
where
    C: Coefficient,
    OP: MonomialOrd,
    O: MonomialOrd,
{
    let mut determined = Vec::with_capacity(basis.len());
    for p in basis {
        let p = &reduce_modulo(cond, p)?;
        match effective_lead(cond, p)? {
            Lead::Vanishes => {},
            Lead::Undetermined(c) => return Ok(Verdict::Split(c)),
            Lead::Term(lc, lm) => determined.push(Determined {
                poly: p.clone(),
                lc,
                lm,
            }),
        }
    }
    let s_polys = (0..determined.len())
        .flat_map(|j| (0..j).map(move |i| (i, j)))
        .filter_map(|(i, j)| s_polynomial(&determined[i], &determined[j]));
    for p in generators.iter().cloned().chain(s_polys) {
        match top_reduce(cond, &p, &determined, true)? {
            Reduced::Zero => {},
            Reduced::Irreducible(..) => return Ok(Verdict::Fails),
            Reduced::Undetermined(c) => return Ok(Verdict::Split(c)),
        }
    }
    Ok(Verdict::Holds)
}

/// Whether `target` holds on all of `cell`: `Holds`, `Fails` when the two are
/// disjoint, otherwise a polynomial to split `cell` on.
fn implies<C: Coefficient, OP: MonomialOrd>(cell: &Condition<C, OP>, target: &Condition<C, OP>) -> GbResult<Verdict<C, OP>> {
    let wanted = target
        .zero()
        .iter()
        .map(|z| (z, Color::Zero))
        .chain(target.nonzero().iter().map(|n| (n, Color::NonZero)));
    let mut undetermined = None;
    for (p, color) in wanted {
        match cell.color(p)? {
            Color::Undetermined => {
                undetermined.get_or_insert_with(|| p.clone());
            },
            found if found == color => {},
            _ => return Ok(Verdict::Fails),
        }
    }
    Ok(undetermined.map_or(Verdict::Holds, Verdict::Split))
}

/// Splits the whole parameter space until every cell lies inside one of the
/// branch conditions; `false` once a cell meets none of them.
fn covers_parameter_space<C, OP, O>(branches: &[ColoredSystem<C, OP, O>]) -> GbResult<bool>
where
    C: Coefficient,
    OP: MonomialOrd,
    O: MonomialOrd,
{
    let Some(first) = branches.first() else {
        return Ok(false);
    };
    let mut cells = vec![Condition::new(first.condition.num_of_params())];
    'cells: while let Some(cell) = cells.pop() {
        let mut split_on = None;
        for branch in branches {
            match implies(&cell, &branch.condition)? {
                Verdict::Holds => continue 'cells,
                Verdict::Fails => {},
                Verdict::Split(c) => {
                    split_on.get_or_insert(c);
                },
            }
        }
        match split_on {
            Some(c) => cells.extend(cell.split(&c)?),
            None => return Ok(false),
        }
    }
    Ok(true)
}

/// Whether `system` is a Groebner system of `generators`: every branch basis
/// has determined leading coefficients, its S-polynomials and the generators
/// reduce to zero under the branch, no two conditions overlap and together
/// they cover the parameter space.
pub fn is_cgb_system<C, OP, O>(generators: &[ParamPoly<C, OP, O>], system: &GroebnerSystem<C, OP, O>) -> GbResult<bool>
where
    C: Coefficient,
    OP: MonomialOrd,
    O: MonomialOrd,
{
    let branches = system.branches();
    let bases_ok = branches
        .par_iter()
        .map(|b| {
            verify_branch(&b.condition, &b.basis, generators)
                .map(|verdict| matches!(verdict, Verdict::Holds))
        })
        .collect::<GbResult<Vec<bool>>>()?
        .into_iter()
        .all(|ok| ok);
    if !bases_ok {
        return Ok(false);
    }
    let disjoint = (0..branches.len())
        .flat_map(|j| (0..j).map(move |i| (i, j)))
        .collect::<Vec<_>>()
        .par_iter()
        .map(|&(i, j)| {
            branches[i]
                .condition
                .meet(&branches[j].condition)
                .and_then(|met| met.is_consistent())
                .map(|consistent| !consistent)
        })
        .collect::<GbResult<Vec<bool>>>()?;
    if !disjoint.into_iter().all(|ok| ok) {
        return Ok(false);
    }
    covers_parameter_space(branches)
}

/// Checks `basis` under `cond`, splitting only that condition.
fn holds_under<C, OP, O>(cond: Condition<C, OP>, basis: &[ParamPoly<C, OP, O>]) -> GbResult<bool>
where
    C: Coefficient,
    OP: MonomialOrd,
    O: MonomialOrd,
{
    let mut stack = vec![cond];
    while let Some(cond) = stack.pop() {
        match verify_branch(&cond, basis, &[])? {
            Verdict::Holds => {},
            Verdict::Fails => return Ok(false),
            Verdict::Split(c) => stack.extend(cond.split(&c)?),
        }
    }
    Ok(true)
}

/// Whether `basis` is a Groebner basis under every branch of its own
/// Groebner system, hence under every parameter value.
pub fn is_gb_everywhere<C, OP, O>(params: usize, basis: &[ParamPoly<C, OP, O>]) -> GbResult<bool>
where
    C: Coefficient,
    OP: MonomialOrd,
    O: MonomialOrd,
{
    let system = gb_system(params, basis)?;
    let verdicts = system
        .branches
        .into_par_iter()
        .map(|branch| holds_under(branch.condition, basis))
        .collect::<GbResult<Vec<bool>>>()?;
    Ok(verdicts.into_iter().all(|ok| ok))
}

/// Comprehensive Groebner bases over a parameter ring with `params`
/// variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComprehensiveGroebnerBase {
    params: usize,
}

impl ComprehensiveGroebnerBase {
    pub fn new(params: usize) -> Self {
        Self { params }
    }

    pub fn num_of_params(&self) -> usize {
        self.params
    }

    pub fn gb_system<C: Coefficient, OP: MonomialOrd, O: MonomialOrd>(
        &self,
        generators: &[ParamPoly<C, OP, O>],
    ) -> GbResult<GroebnerSystem<C, OP, O>> {
        gb_system(self.params, generators)
    }

    pub fn is_cgb_system<C: Coefficient, OP: MonomialOrd, O: MonomialOrd>(
        &self,
        generators: &[ParamPoly<C, OP, O>],
        system: &GroebnerSystem<C, OP, O>,
    ) -> GbResult<bool> {
        is_cgb_system(generators, system)
    }

    pub fn cgb<C: Coefficient, OP: MonomialOrd, O: MonomialOrd>(
        &self,
        generators: &[ParamPoly<C, OP, O>],
    ) -> GbResult<Vec<ParamPoly<C, OP, O>>> {
        Ok(self.gb_system(generators)?.cgb())
    }

    /// Whether `generators` already form a comprehensive Groebner basis.
    pub fn is_cgb<C: Coefficient, OP: MonomialOrd, O: MonomialOrd>(
        &self,
        generators: &[ParamPoly<C, OP, O>],
    ) -> GbResult<bool> {
        is_gb_everywhere(self.params, generators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        groebner::GroebnerBaseSeq,
        poly::{coefficient::rational, monomial::LexOrder, ring::PolynomialRing},
    };
    use num_rational::BigRational;
    use std::sync::Arc;

    type P = Poly<BigRational, LexOrder>;
    type R = Arc<PolynomialRing<P, LexOrder>>;

    fn rings() -> (Arc<PolynomialRing<BigRational, LexOrder>>, R) {
        (
            PolynomialRing::new(&["a", "b"]),
            PolynomialRing::new(&["x", "y"]),
        )
    }

    fn check_specializations(
        f: &[ParamPoly<BigRational, LexOrder, LexOrder>],
        system: &GroebnerSystem<BigRational, LexOrder, LexOrder>,
        points: &[[i64; 2]],
    ) {
        let seq = GroebnerBaseSeq::new();
        for [a, b] in points {
            let point = [rational(*a, 1), rational(*b, 1)];
            let matching = system
                .branches()
                .iter()
                .filter(|br| br.condition.holds_at(&point))
                .count();
            assert_eq!(matching, 1, "point ({a}, {b})");
            let branch = system.branch_at(&point).unwrap();
            let expected = seq.reduced_gb(&seq.gb(&specialize(f, &point)).unwrap()).unwrap();
            let special = branch.specialize(&point);
            assert!(seq.is_gb(&special), "point ({a}, {b})");
            let got = seq.reduced_gb(&seq.gb(&special).unwrap()).unwrap();
            assert_eq!(got.elements(), expected.elements(), "point ({a}, {b})");
        }
    }

    #[test]
    fn test_single_parameter_splits_once() {
        let (params, ring) = rings();
        let a = params.variable(0);
        let f = vec![&ring.term(a.clone(), &[1]) - &ring.term(params.one(), &[])];
        let system = gb_system(2, &f).unwrap();
        assert_eq!(system.len(), 2);
        assert!(is_cgb_system(&f, &system).unwrap());
        assert_eq!(system.cgb(), f);
        check_specializations(&f, &system, &[[0, 0], [2, 0], [-1, 3]]);
        let engine = ComprehensiveGroebnerBase::new(2);
        assert!(engine.is_cgb(&f).unwrap());
    }

    /// a x^4 y + x y^2 + b x,  x^3 + 2 x y,  b x^2 + x^2 y
    fn three_generators() -> Vec<ParamPoly<BigRational, LexOrder, LexOrder>> {
        let (params, ring) = rings();
        let a = params.variable(0);
        let b = params.variable(1);
        let one = params.one();
        let two = params.from_i64(2);
        vec![
            ring.term(a.clone(), &[4, 1]) + &ring.term(one.clone(), &[1, 2]) + &ring.term(b.clone(), &[1]),
            ring.term(one.clone(), &[3]) + &ring.term(two, &[1, 1]),
            ring.term(b.clone(), &[2]) + &ring.term(one, &[2, 1]),
        ]
    }

    #[test]
    fn test_parametric_three_generator_system() {
        let f = three_generators();
        let engine = ComprehensiveGroebnerBase::new(2);
        let system = engine.gb_system(&f).unwrap();
        assert!(system.len() > 1);
        assert!(engine.is_cgb_system(&f, &system).unwrap());
        check_specializations(
            &f,
            &system,
            &[[0, 0], [1, 0], [0, 1], [1, 1], [2, -3], [0, -2], [1, 2]],
        );
    }

    #[test]
    fn test_cgb_verifies_under_its_own_branches() {
        let f = three_generators();
        let engine = ComprehensiveGroebnerBase::new(2);
        let cgb = engine.cgb(&f).unwrap();
        let start = Instant::now();
        assert!(engine.is_cgb(&cgb).unwrap());
        assert!(start.elapsed() < std::time::Duration::from_secs(60));
        // the generators alone are no Groebner basis at a = 1, b = 0
        assert!(!engine.is_cgb(&f).unwrap());
    }

    #[test]
    fn test_system_missing_a_branch_is_rejected() {
        let (params, ring) = rings();
        let a = params.variable(0);
        let f = vec![&ring.term(a, &[1]) - &ring.term(params.one(), &[])];
        let system = gb_system(2, &f).unwrap();
        assert!(is_cgb_system(&f, &system).unwrap());
        for kept in system.branches() {
            let partial = GroebnerSystem {
                branches: vec![kept.clone()],
            };
            assert!(!is_cgb_system(&f, &partial).unwrap());
        }
        let empty = GroebnerSystem { branches: Vec::new() };
        assert!(!is_cgb_system(&f, &empty).unwrap());
    }

    #[test]
    fn test_input_that_is_not_a_gb() {
        let (params, ring) = rings();
        let a = params.variable(0);
        let one = params.one();
        // x^2 + a y, x y - 1 is a GB under no parameter value
        let f = vec![
            ring.term(one.clone(), &[2]) + &ring.term(a, &[0, 1]),
            ring.term(one.clone(), &[1, 1]) - &ring.term(one, &[]),
        ];
        let engine = ComprehensiveGroebnerBase::new(2);
        assert!(!engine.is_cgb(&f).unwrap());
        let system = engine.gb_system(&f).unwrap();
        assert!(engine.is_cgb_system(&f, &system).unwrap());
        let bogus = GroebnerSystem {
            branches: vec![ColoredSystem {
                condition: Condition::new(2),
                basis: f.clone(),
            }],
        };
        assert!(!engine.is_cgb_system(&f, &bogus).unwrap());
        check_specializations(&f, &system, &[[0, 0], [1, 5], [-2, 0]]);
    }
}
