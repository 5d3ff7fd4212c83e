use std::sync::Arc;

use crate::{
    error::GbResult,
    ideal::drop_front,
    log_info,
    poly::{
        coefficient::Coefficient,
        monomial::{BlockOrder, DenseMonomial, LexOrder, MonomialOrd},
        ring::{Basis, Poly},
    },
    solvable::{
        engine::SolvableGroebnerBase,
        relation::{RelationTable, SolvableRing},
    },
};

/// A left ideal of a solvable polynomial ring, given by generators.
#[derive(Debug, Clone)]
pub struct SolvableIdeal<C, O> {
    ring: Arc<SolvableRing<C, DenseMonomial<O>>>,
    basis: Basis<Poly<C, O>>,
}

/// `table` with its variables moved up by `offset` and read under `OT`.
fn move_table<C, O, OT>(table: &RelationTable<C, DenseMonomial<O>>, offset: usize) -> RelationTable<C, DenseMonomial<OT>>
where
    C: Coefficient,
    O: MonomialOrd,
    OT: MonomialOrd,
{
    let mut moved = RelationTable::new();
    for ((j, i), product) in table.iter() {
        moved.update(j + offset, i + offset, product.shift_vars(offset).transform_order());
    }
    moved
}

impl<C: Coefficient, O: MonomialOrd> SolvableIdeal<C, O> {
    pub fn new(ring: Arc<SolvableRing<C, DenseMonomial<O>>>, generators: Vec<Poly<C, O>>) -> Self {
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

    pub fn ring(&self) -> &Arc<SolvableRing<C, DenseMonomial<O>>> {
        &self.ring
    }

    pub fn generators(&self) -> &[Poly<C, O>] {
        self.basis.elements()
    }

    fn engine(&self) -> SolvableGroebnerBase<C, DenseMonomial<O>> {
        SolvableGroebnerBase::new(self.ring.clone())
    }

    /// The ideal generated by its reduced left Groebner basis.
    pub fn left_gb(&self) -> GbResult<Self> {
        if self.basis.is_gb() {
            return Ok(self.clone());
        }
        let engine = self.engine();
        let gb = engine.left_reduced_gb(&engine.left_gb(self.generators())?)?;
        Ok(self.with_basis(gb))
    }

    pub fn is_left_gb(&self) -> bool {
        self.engine().is_left_gb(self.generators())
    }

    /// The two-sided ideal generated by the generators, as a left ideal.
    pub fn twosided_gb(&self) -> GbResult<Self> {
        let engine = self.engine();
        let gb = engine.left_reduced_gb(&engine.twosided_gb(self.generators())?)?;
        Ok(self.with_basis(gb))
    }

    pub fn is_twosided_gb(&self) -> GbResult<bool> {
        self.engine().is_twosided_gb(self.generators())
    }

    pub fn contains(&self, p: &Poly<C, O>) -> GbResult<bool> {
        let gb = self.left_gb()?;
        Ok(self.engine().left_normal_form(p, gb.generators()).is_zero())
    }

    pub fn sum(&self, other: &Self) -> Self {
        let mut generators = self.generators().to_vec();
        generators.extend_from_slice(other.generators());
        Self::new(self.ring.clone(), generators)
    }

    /// `(t * I + (1 - t) * J)` with `t` eliminated, for a new central
    /// variable `t` in front of the others.
    pub fn intersect(&self, other: &Self) -> GbResult<Self> {
        let n = self.ring.num_of_vars();
        let (extended, _) = SolvableRing::<C, DenseMonomial<BlockOrder<1, LexOrder, O>>>::new(
            n + 1,
            move_table(self.ring.table(), 1),
        );
        let t = Poly::<C, O>::variable(n + 1, 0);
        let one_minus_t = Poly::one(n + 1) - &t;
        let generators: Vec<Poly<C, BlockOrder<1, LexOrder, O>>> = self
            .generators()
            .iter()
            .map(|f| &t * &f.shift_vars(1))
            .chain(other.generators().iter().map(|g| &one_minus_t * &g.shift_vars(1)))
            .map(|p| p.transform_order())
            .collect();
        let gb = SolvableGroebnerBase::new(Arc::new(extended)).left_gb(&generators)?;
        let eliminated: Vec<Poly<C, O>> = gb
            .iter()
            .filter(|p| !p.involves(0, 1))
            .map(|p| drop_front(&p.transform_order(), 1, n))
            .collect();
        log_info!(
            "Left intersection of {} and {} generators has {} generators",
            self.generators().len(),
            other.generators().len(),
            eliminated.len()
        );
        Self::new(self.ring.clone(), eliminated).left_gb()
    }

    /// Contraction to the subring in all but the first `k` variables. `OE`
    /// has to eliminate those variables and keep the relations' leading
    /// terms, e.g. `LexOrder` for a Weyl algebra.
    pub fn eliminate<OE: MonomialOrd>(&self, k: usize) -> GbResult<Self> {
        let n = self.ring.num_of_vars();
        let (ring, _) = SolvableRing::<C, DenseMonomial<OE>>::new(n, move_table(self.ring.table(), 0));
        let generators: Vec<Poly<C, OE>> = self.generators().iter().map(|p| p.transform_order()).collect();
        let gb = SolvableGroebnerBase::new(Arc::new(ring)).left_gb(&generators)?;
        let eliminated: Vec<Poly<C, O>> = gb
            .iter()
            .filter(|p| !p.involves(0, k))
            .map(|p| p.transform_order())
            .collect();
        Self::new(self.ring.clone(), eliminated).left_gb()
    }
}
