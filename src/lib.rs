#![allow(non_snake_case)]
#![allow(clippy::new_ret_no_self)]
#![allow(clippy::needless_return)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::upper_case_acronyms)]

pub mod comprehensive;
pub mod distributed;
pub mod error;
pub mod groebner;
pub mod ideal;
pub mod log;
pub mod module;
pub mod pairs;
pub mod parallel;
pub mod poly;
pub mod reduction;
pub mod solvable;
pub mod squarefree;

use crate::poly::{monomial::*, ring::Poly};
use ark_ff::fields::{Fp64, MontBackend, MontConfig};
use std::cmp;

pub use crate::error::{GbError, GbResult};

/// Heap entry ordered by its key `.0` only.
#[derive(Debug, Clone)]
pub struct Entry<L, R>(pub L, pub R);
impl<L: PartialEq, R> PartialEq for Entry<L, R> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<L: Eq, R> Eq for Entry<L, R> {}
impl<L: PartialOrd, R> PartialOrd for Entry<L, R> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl<L: Ord, R> Ord for Entry<L, R> {
    #[inline]
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

#[derive(MontConfig)]
#[modulus = "18446744073709551557"]
#[generator = "2"]
pub struct FqConfig18446744073709551557;

/// The largest 64-bit prime field.
pub type GF = Fp64<MontBackend<FqConfig18446744073709551557, 1>>;

pub type LexPolynomial = Poly<GF, LexOrder>;
pub type DegRevLexPolynomial = Poly<GF, DegRevLexOrder>;

#[cfg(test)]
#[allow(clippy::all)]
mod tests {
    use super::*;
    use crate::poly::polynomial::SparsePolynomial;
    use std::{cmp::Reverse, collections::BinaryHeap};

    #[test]
    fn test_div_mod_polys() {
        let f: LexPolynomial = SparsePolynomial::new(
            2,
            &vec![
                ((1).into(), DenseMonomial::new(&vec![(0, 5)])),
                ((1).into(), DenseMonomial::new(&vec![(0, 1)])),
            ],
        );

        let polys: Vec<LexPolynomial> = vec![
            SparsePolynomial::new(
                2,
                &vec![
                    ((1).into(), DenseMonomial::new(&vec![(0, 2)])),
                    ((-1).into(), DenseMonomial::new(&vec![(1, 3)])),
                ],
            ),
            SparsePolynomial::new(
                2,
                &vec![
                    ((1).into(), DenseMonomial::new(&vec![(0, 1), (1, 2)])),
                    ((1).into(), DenseMonomial::new(&vec![(0, 1)])),
                ],
            ),
        ];

        let (qs, r) = f.div_mod_polys(&polys);

        let recombined = qs
            .iter()
            .zip(polys.iter())
            .fold(r.clone(), |acc, (q, g)| acc + &(q * g));
        assert_eq!(recombined, f);
        assert!(r.terms().iter().all(|(_, m)| polys
            .iter()
            .all(|g| !g.leading_monomial().unwrap().divides(m))));
    }

    #[test]
    fn test_lex_order() {
        let m1: DenseMonomial<LexOrder> = DenseMonomial::new(&vec![
            (0, 3),
            (1, 0),
            (2, 2),
            (3, 0),
            (4, 1),
            (5, 2),
            (6, 0),
            (7, 1),
        ]);
        let m18: DenseMonomial<LexOrder> = DenseMonomial::new(&vec![
            (0, 1),
            (1, 2),
            (2, 0),
            (3, 1),
            (4, 1),
            (5, 1),
            (6, 0),
            (7, 2),
        ]);
        assert!(m1 > m18);
        let test: LexPolynomial = SparsePolynomial::new(
            8,
            &vec![
                (GF::from(1), DenseMonomial::from_exponents(&[3, 0, 2, 0, 1, 2, 0, 1])),
                (GF::from(2), DenseMonomial::from_exponents(&[1, 1, 1, 0, 0, 0, 1, 1])),
                (GF::from(3), DenseMonomial::from_exponents(&[2, 0, 3, 0, 1, 1, 2, 0])),
                (GF::from(4), DenseMonomial::from_exponents(&[1, 2, 0, 1, 1, 1, 0, 0])),
                (GF::from(5), DenseMonomial::from_exponents(&[0, 3, 2, 1, 0, 0, 1, 1])),
                (GF::from(6), DenseMonomial::from_exponents(&[1, 1, 1, 2, 1, 1, 0, 0])),
                (GF::from(7), DenseMonomial::from_exponents(&[0, 0, 2, 1, 0, 1, 1, 1])),
                (GF::from(8), DenseMonomial::from_exponents(&[2, 1, 0, 0, 2, 1, 1, 0])),
            ],
        );
        let want: Vec<u64> = vec![1, 8, 3, 4, 6, 2, 5, 7];
        assert_eq!(
            test.terms()
                .iter()
                .rev()
                .map(|(coeff, _)| *coeff)
                .collect::<Vec<GF>>(),
            want.iter().map(|x| GF::from(*x)).collect::<Vec<GF>>()
        );
    }

    #[test]
    fn test_entry_orders_by_key_only() {
        let mut heap = BinaryHeap::new();
        heap.push(Entry(Reverse(3), "c"));
        heap.push(Entry(Reverse(1), "a"));
        heap.push(Entry(Reverse(2), "b"));
        assert_eq!(heap.pop().map(|e| e.1), Some("a"));
        assert_eq!(Entry(1, "x"), Entry(1, "y"));
    }
}
