use hashbrown::HashSet;
use std::{cmp::Reverse, collections::BinaryHeap};

use crate::{poly::monomial::Monomial, Entry};

/// Critical pair `i < j` of basis elements with the lcm of their leading
/// monomials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair<M> {
    pub i: usize,
    pub j: usize,
    pub lcm: M,
}

/// Counters reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairStats {
    pub created: usize,
    pub coprime: usize,
    pub chain: usize,
    pub selected: usize,
}

/// Pair queue with Buchberger's criteria.
///
/// Pairs come out by lcm degree, then by the higher index, then by the lower
/// index. A pair counts as pending from `put` until `remove_next` hands it
/// out or discards it.
#[derive(Debug, Clone)]
pub struct PairList<M> {
    heap: BinaryHeap<Entry<Reverse<(u32, usize, usize)>, Pair<M>>>,
    leading: Vec<(M, usize)>,
    pending: HashSet<(usize, usize)>,
    product_criterion: bool,
    stats: PairStats,
}

impl<M: Monomial> PairList<M> {
    pub fn new(product_criterion: bool) -> Self {
        Self {
            heap: BinaryHeap::new(),
            leading: Vec::new(),
            pending: HashSet::new(),
            product_criterion,
            stats: PairStats::default(),
        }
    }

    /// Registers the next basis element by its leading monomial and position
    /// and pairs it with every earlier element of the same position.
    pub fn put(&mut self, lm: M, pos: usize) -> usize {
        let j = self.leading.len();
        for (i, (lm_i, pos_i)) in self.leading.iter().enumerate() {
            if *pos_i != pos {
                continue;
            }
            let lcm = lm_i.lcm(&lm);
            self.heap
                .push(Entry(Reverse((lcm.degree(), j, i)), Pair { i, j, lcm }));
            self.pending.insert((i, j));
            self.stats.created += 1;
        }
        self.leading.push((lm, pos));
        j
    }

    /// Next pair that survives both criteria.
    pub fn remove_next(&mut self) -> Option<Pair<M>> {
        while let Some(Entry(_, pair)) = self.heap.pop() {
            self.pending.remove(&(pair.i, pair.j));
            if self.product_criterion && self.coprime(&pair) {
                self.stats.coprime += 1;
                continue;
            }
            if self.chain(&pair) {
                self.stats.chain += 1;
                continue;
            }
            self.stats.selected += 1;
            return Some(pair);
        }
        None
    }

    fn coprime(&self, pair: &Pair<M>) -> bool {
        self.leading[pair.i].0.is_coprime(&self.leading[pair.j].0)
    }

    fn is_pending(&self, a: usize, b: usize) -> bool {
        self.pending.contains(&(a.min(b), a.max(b)))
    }

    /// Some `k` divides the lcm and neither `(i, k)` nor `(j, k)` is pending.
    fn chain(&self, pair: &Pair<M>) -> bool {
        let pos = self.leading[pair.i].1;
        self.leading.iter().enumerate().any(|(k, (lm_k, pos_k))| {
            k != pair.i
                && k != pair.j
                && *pos_k == pos
                && !self.is_pending(pair.i, k)
                && !self.is_pending(pair.j, k)
                && lm_k.divides(&pair.lcm)
        })
    }

    pub fn has_next(&self) -> bool {
        !self.heap.is_empty()
    }

    /// Pairs still queued, including those a criterion will discard.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of registered basis elements.
    pub fn size(&self) -> usize {
        self.leading.len()
    }

    pub fn stats(&self) -> PairStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly::monomial::{DenseMonomial, LexOrder};

    type M = DenseMonomial<LexOrder>;

    #[test]
    fn test_pairs_by_degree_then_index() {
        let mut pairs = PairList::new(false);
        pairs.put(M::from_exponents(&[2]), 0);
        pairs.put(M::from_exponents(&[1, 1]), 0);
        pairs.put(M::from_exponents(&[0, 3]), 0);
        assert_eq!(pairs.len(), 3);
        // lcms: (0,1) x^2y deg 3, (0,2) x^2y^3 deg 5, (1,2) xy^3 deg 4
        let first = pairs.remove_next().unwrap();
        assert_eq!((first.i, first.j), (0, 1));
        assert_eq!(first.lcm, M::from_exponents(&[2, 1]));
        let second = pairs.remove_next().unwrap();
        assert_eq!((second.i, second.j), (1, 2));
        // x*y divides x^2*y^3 and both its pairs are gone
        assert!(pairs.remove_next().is_none());
        assert_eq!(pairs.stats().chain, 1);
        assert_eq!(pairs.size(), 3);
    }

    #[test]
    fn test_coprime_pairs_skipped() {
        let mut pairs = PairList::new(true);
        pairs.put(M::from_exponents(&[2]), 0);
        pairs.put(M::from_exponents(&[0, 3]), 0);
        assert!(pairs.has_next());
        assert!(pairs.remove_next().is_none());
        assert_eq!(pairs.stats().coprime, 1);

        let mut pairs = PairList::new(false);
        pairs.put(M::from_exponents(&[2]), 0);
        pairs.put(M::from_exponents(&[0, 3]), 0);
        assert!(pairs.remove_next().is_some());
    }

    #[test]
    fn test_positions_never_mix() {
        let mut pairs = PairList::new(false);
        pairs.put(M::from_exponents(&[1]), 0);
        pairs.put(M::from_exponents(&[1]), 1);
        assert!(pairs.is_empty());
        pairs.put(M::from_exponents(&[0, 1]), 1);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_pending_pair_blocks_chain() {
        let mut pairs = PairList::new(false);
        pairs.put(M::from_exponents(&[1]), 0);
        pairs.put(M::from_exponents(&[0, 1]), 0);
        pairs.put(M::from_exponents(&[1, 1]), 0);
        // (0,1) lcm xy deg 2, (0,2) xy deg 2, (1,2) xy deg 2: order by j then i
        let p = pairs.remove_next().unwrap();
        assert_eq!((p.i, p.j), (0, 1));
        let p = pairs.remove_next().unwrap();
        assert_eq!((p.i, p.j), (0, 2));
        // k = 0 divides xy and (0,1), (0,2) are both done
        assert!(pairs.remove_next().is_none());
    }
}
