use rayon::prelude::*;
use std::{marker::PhantomData, sync::Arc};

use crate::{
    error::GbResult,
    groebner::GroebnerBaseSeq,
    log_info,
    module::element::{ModuleElement, ModuleOrd, PositionOverTerm},
    poly::{coefficient::Coefficient, monomial::Monomial, polynomial::SparsePolynomial, ring::Basis},
    reduction::{normal_form, Commutative, GbElement},
    solvable::{engine::SolvableGroebnerBase, relation::SolvableRing},
};

/// Groebner bases of submodules of a free module over a commutative ring.
#[derive(Debug, Clone, Default)]
pub struct ModuleGroebnerBase<P> {
    seq: GroebnerBaseSeq<Commutative>,
    order: PhantomData<P>,
}

impl<P: ModuleOrd> ModuleGroebnerBase<P> {
    pub fn new() -> Self {
        Self {
            seq: GroebnerBaseSeq::new(),
            order: PhantomData,
        }
    }

    pub fn gb<C: Coefficient, M: Monomial>(
        &self,
        generators: &[ModuleElement<C, M, P>],
    ) -> GbResult<Basis<ModuleElement<C, M, P>>> {
        self.seq.gb(generators)
    }

    pub fn is_gb<C: Coefficient, M: Monomial>(&self, basis: &[ModuleElement<C, M, P>]) -> bool {
        self.seq.is_gb(basis)
    }

    pub fn normal_form<C: Coefficient, M: Monomial>(
        &self,
        v: &ModuleElement<C, M, P>,
        basis: &[ModuleElement<C, M, P>],
    ) -> ModuleElement<C, M, P> {
        self.seq.normal_form(v, basis)
    }

    pub fn reduced_gb<C: Coefficient, M: Monomial>(
        &self,
        basis: &Basis<ModuleElement<C, M, P>>,
    ) -> GbResult<Basis<ModuleElement<C, M, P>>> {
        self.seq.reduced_gb(basis)
    }
}

/// Generators of the syzygies `s` with `sum_i s_i * f_i = 0`.
///
/// The module spanned by `(f_i, e_i)` is eliminated in position `0`: under
/// position over term the basis elements with a vanishing first component
/// form a Groebner basis of the syzygy module.
pub fn syzygies<C: Coefficient, M: Monomial>(
    fs: &[SparsePolynomial<C, M>],
) -> GbResult<Vec<ModuleElement<C, M, PositionOverTerm>>> {
    let rank = fs.len() + 1;
    let generators: Vec<ModuleElement<C, M, PositionOverTerm>> = fs
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let mut components = vec![f.zero_like(); rank];
            components[0] = f.clone();
            components[i + 1] = SparsePolynomial::one(f.num_of_vars());
            ModuleElement::new(components)
        })
        .collect();
    let gb = ModuleGroebnerBase::<PositionOverTerm>::new().gb(&generators)?;
    let syz: Vec<_> = gb
        .into_elements()
        .into_iter()
        .filter(|v| v.component(0).is_zero())
        .map(|v| ModuleElement::new(v.into_components().split_off(1)))
        .collect();
    log_info!("Syzygies of {} polynomials: {} generators", fs.len(), syz.len());
    Ok(syz)
}

/// Whether `sum_i s_i * f_i` vanishes.
pub fn is_syzygy<C: Coefficient, M: Monomial, P: ModuleOrd>(
    fs: &[SparsePolynomial<C, M>],
    s: &ModuleElement<C, M, P>,
) -> bool {
    s.rank() == fs.len() && s.dot(fs).is_zero()
}

/// Whether every element of `syz` is a syzygy of `fs`.
pub fn is_syzygy_list<C: Coefficient, M: Monomial, P: ModuleOrd>(
    fs: &[SparsePolynomial<C, M>],
    syz: &[ModuleElement<C, M, P>],
) -> bool {
    syz.par_iter().all(|s| is_syzygy(fs, s))
}

/// Left, right and two-sided Groebner bases of submodules over a solvable
/// ring.
#[derive(Debug, Clone)]
pub struct SolvableModuleGroebnerBase<C, M, P> {
    engine: SolvableGroebnerBase<C, M>,
    order: PhantomData<P>,
}

impl<C: Coefficient, M: Monomial, P: ModuleOrd> SolvableModuleGroebnerBase<C, M, P> {
    pub fn new(ring: Arc<SolvableRing<C, M>>) -> Self {
        Self {
            engine: SolvableGroebnerBase::new(ring),
            order: PhantomData,
        }
    }

    pub fn left_gb(&self, generators: &[ModuleElement<C, M, P>]) -> GbResult<Basis<ModuleElement<C, M, P>>> {
        self.engine.left_gb(generators)
    }

    pub fn right_gb(&self, generators: &[ModuleElement<C, M, P>]) -> GbResult<Basis<ModuleElement<C, M, P>>> {
        self.engine.right_gb(generators)
    }

    pub fn twosided_gb(&self, generators: &[ModuleElement<C, M, P>]) -> GbResult<Basis<ModuleElement<C, M, P>>> {
        self.engine.twosided_gb(generators)
    }

    pub fn is_left_gb(&self, basis: &[ModuleElement<C, M, P>]) -> bool {
        self.engine.is_left_gb(basis)
    }

    pub fn is_right_gb(&self, basis: &[ModuleElement<C, M, P>]) -> bool {
        self.engine.is_right_gb(basis)
    }

    pub fn is_twosided_gb(&self, basis: &[ModuleElement<C, M, P>]) -> GbResult<bool> {
        self.engine.is_twosided_gb(basis)
    }

    pub fn left_normal_form(
        &self,
        v: &ModuleElement<C, M, P>,
        basis: &[ModuleElement<C, M, P>],
    ) -> ModuleElement<C, M, P> {
        self.engine.left_normal_form(v, basis)
    }
}

/// Whether `v` lies in the submodule whose Groebner basis is `basis`.
pub fn contains<C: Coefficient, M: Monomial, P: ModuleOrd>(
    basis: &[ModuleElement<C, M, P>],
    v: &ModuleElement<C, M, P>,
) -> bool {
    normal_form(&Commutative, v, basis).is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        module::element::TermOverPosition,
        poly::{
            monomial::{DegRevLexOrder, DenseMonomial, LexOrder},
            ring::PolynomialRing,
        },
        solvable::relation::RelationTable,
    };
    use num_rational::BigRational;

    type M = DenseMonomial<LexOrder>;

    fn leading(basis: &[ModuleElement<BigRational, M, PositionOverTerm>]) -> Vec<(Vec<u16>, usize)> {
        let mut terms: Vec<_> = basis
            .iter()
            .filter_map(|v| v.leading_term().map(|(_, m, pos)| (m.exponents().to_vec(), pos)))
            .collect();
        terms.sort();
        terms
    }

    #[test]
    fn test_submodule_of_two_generators() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let (x, y, one) = (ring.variable(0), ring.variable(1), ring.one());
        let f = vec![
            ModuleElement::<_, _, PositionOverTerm>::new(vec![x.clone(), one]),
            ModuleElement::new(vec![y, x]),
        ];
        let engine = ModuleGroebnerBase::new();
        let gb = engine.gb(&f).unwrap();
        assert!(engine.is_gb(gb.elements()));
        assert!(!engine.is_gb(&f));
        // leading submodule <x e_0, y e_0, x^2 e_1>
        assert_eq!(
            leading(gb.elements()),
            vec![(vec![0, 1], 0), (vec![1], 0), (vec![2], 1)]
        );
        let x2_minus_y = ModuleElement::new(vec![ring.zero(), ring.poly(&[(1, &[2]), (-1, &[0, 1])])]);
        assert!(gb.iter().any(|v| *v == x2_minus_y));
        for v in &f {
            assert!(contains(gb.elements(), v));
        }
        assert!(!contains(gb.elements(), &ModuleElement::new(vec![ring.zero(), ring.variable(0)])));
    }

    #[test]
    fn test_term_over_position_agrees_on_membership() {
        let ring = PolynomialRing::<BigRational, DegRevLexOrder>::new(&["x", "y"]);
        let (x, y, one) = (ring.variable(0), ring.variable(1), ring.one());
        let top = vec![
            ModuleElement::<_, _, TermOverPosition>::new(vec![x.clone(), one.clone()]),
            ModuleElement::new(vec![y.clone(), x.clone()]),
        ];
        let engine = ModuleGroebnerBase::new();
        let gb = engine.reduced_gb(&engine.gb(&top).unwrap()).unwrap();
        assert!(engine.is_gb(gb.elements()));
        // y (x, 1) - x (y, x) = (0, y - x^2)
        let v = ModuleElement::new(vec![ring.zero(), &y - &(&x * &x)]);
        assert!(engine.normal_form(&v, gb.elements()).is_zero());
        assert!(!engine.normal_form(&ModuleElement::new(vec![one, ring.zero()]), gb.elements()).is_zero());
    }

    #[test]
    fn test_syzygies() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let (x, y) = (ring.variable(0), ring.variable(1));
        let syz = syzygies(&[x.clone(), y.clone()]).unwrap();
        assert_eq!(syz.len(), 1);
        assert_eq!(syz[0], ModuleElement::new(vec![y.clone(), -x.clone()]));
        assert!(is_syzygy(&[x.clone(), y.clone()], &syz[0]));
        assert!(!is_syzygy(
            &[x.clone(), y.clone()],
            &ModuleElement::<_, _, PositionOverTerm>::new(vec![ring.one(), ring.zero()])
        ));

        let fs = vec![
            ring.poly(&[(1, &[2]), (1, &[0, 1])]),
            ring.poly(&[(1, &[1, 1]), (-1, &[])]),
        ];
        let syz = syzygies(&fs).unwrap();
        assert!(!syz.is_empty());
        assert!(is_syzygy_list(&fs, &syz));
        let koszul = ModuleElement::new(vec![fs[1].clone(), -fs[0].clone()]);
        assert!(contains(&syz, &koszul));
    }

    #[test]
    fn test_weyl_module() {
        let (ring, _) = SolvableRing::<BigRational, DenseMonomial<DegRevLexOrder>>::new(2, RelationTable::weyl(1));
        let poly = PolynomialRing::<BigRational, DegRevLexOrder>::new(&["x", "d"]);
        let (x, d, zero) = (poly.variable(0), poly.variable(1), poly.zero());
        let engine = SolvableModuleGroebnerBase::<_, _, PositionOverTerm>::new(Arc::new(ring));
        let e0 = ModuleElement::new(vec![poly.one(), zero.clone()]);

        let f = vec![ModuleElement::new(vec![x.clone(), zero.clone()]), ModuleElement::new(vec![d, zero.clone()])];
        let left = engine.left_gb(&f).unwrap();
        assert_eq!(left.elements(), &[e0.clone()]);
        assert!(engine.is_left_gb(left.elements()));
        assert!(engine.is_right_gb(engine.right_gb(&f).unwrap().elements()));

        let g = vec![ModuleElement::new(vec![x, zero])];
        assert!(!engine.is_twosided_gb(&g).unwrap());
        let two = engine.twosided_gb(&g).unwrap();
        assert_eq!(two.elements(), &[e0.clone()]);
        assert!(engine.left_normal_form(&e0, two.elements()).is_zero());
    }
}
