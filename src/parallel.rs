use append_only_vec::AppendOnlyVec;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    sync::{Condvar, Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::{
    error::{GbError, GbResult},
    groebner::{interreduce, is_groebner_basis, minimal_basis},
    log_info,
    pairs::{Pair, PairList},
    poly::ring::Basis,
    reduction::{normal_form, normalize, s_polynomial, Commutative, GbElement, Multiplier},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelConfig {
    pub threads: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            threads: rayon::current_num_threads(),
        }
    }
}

struct State<M> {
    pairs: PairList<M>,
    idle: usize,
    done: bool,
    error: Option<GbError>,
}

/// Buchberger's algorithm on a fixed pool of worker threads.
///
/// The basis lives in an append-only arena so workers reduce against a
/// prefix of it without locking. A remainder is only committed if no other
/// worker appended in the meantime; otherwise it is reduced again against
/// the longer basis first.
pub struct GroebnerBaseParallel<X = Commutative> {
    threads: usize,
    pool: Option<ThreadPool>,
    mult: X,
}

impl GroebnerBaseParallel<Commutative> {
    pub fn new(threads: usize) -> GbResult<Self> {
        Self::with_multiplier(threads, Commutative)
    }

    pub fn from_config(config: &ParallelConfig) -> GbResult<Self> {
        Self::new(config.threads)
    }
}

impl<X> GroebnerBaseParallel<X> {
    pub fn with_multiplier(threads: usize, mult: X) -> GbResult<Self> {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("groebner-worker-{i}"))
            .build()
            .map_err(|e| GbError::Concurrency(e.to_string()))?;
        Ok(Self {
            threads,
            pool: Some(pool),
            mult,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn multiplier(&self) -> &X {
        &self.mult
    }

    pub fn is_shut_down(&self) -> bool {
        self.pool.is_none()
    }

    /// Releases the worker threads. Calling it again does nothing.
    pub fn shutdown(&mut self) {
        if self.pool.take().is_some() {
            log_info!("Parallel pool with {} threads shut down", self.threads);
        }
    }

    fn pool(&self) -> GbResult<&ThreadPool> {
        self.pool.as_ref().ok_or(GbError::ShutDown)
    }

    pub fn gb<E>(&self, generators: &[E]) -> GbResult<Basis<E>>
    where
        E: GbElement,
        X: Multiplier<E>,
    {
        self.gb_timed(generators).map(|(basis, _)| basis)
    }

    /// Like [`Self::gb`], also returning the elapsed wall-clock time.
    pub fn gb_timed<E>(&self, generators: &[E]) -> GbResult<(Basis<E>, Duration)>
    where
        E: GbElement,
        X: Multiplier<E>,
    {
        let pool = self.pool()?;
        let start = Instant::now();

        let arena: AppendOnlyVec<E> = AppendOnlyVec::new();
        let mut pairs = PairList::new(E::PRODUCT_CRITERION && self.mult.is_commutative());
        for p in generators.iter().filter(|p| !p.is_zero()) {
            let p = normalize(p)?;
            if p.is_unit() {
                return Ok((Basis::groebner(vec![p]), start.elapsed()));
            }
            let Some((_, lm, pos)) = p.leading_term() else {
                continue;
            };
            pairs.put(lm.clone(), pos);
            arena.push(p);
        }

        let shared = (
            Mutex::new(State {
                pairs,
                idle: 0,
                done: false,
                error: None,
            }),
            Condvar::new(),
        );
        pool.scope(|s| {
            for _ in 0..self.threads {
                s.spawn(|_| self.worker(&arena, &shared));
            }
        });

        let state = shared.0.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(error) = state.error {
            return Err(error);
        }
        let stats = state.pairs.stats();
        let basis = pool.install(|| minimal_basis(arena.iter().cloned().collect()))?;
        let elapsed = start.elapsed();
        log_info!(
            "Parallel Buchberger end with basis.len(): {}, threads {}, pairs {} reduced, {:?}",
            basis.len(),
            self.threads,
            stats.selected,
            elapsed
        );
        Ok((Basis::groebner(basis), elapsed))
    }

    fn worker<E>(&self, arena: &AppendOnlyVec<E>, shared: &(Mutex<State<E::Mono>>, Condvar))
    where
        E: GbElement,
        X: Multiplier<E>,
    {
        let (lock, cvar) = shared;
        loop {
            let Some((pair, snapshot)) = self.next_pair(arena, shared) else {
                return;
            };
            let Some(s) = s_polynomial(&self.mult, &arena[pair.i], &arena[pair.j]) else {
                continue;
            };
            let mut snapshot = snapshot;
            let mut h = normal_form(&self.mult, &s, (0..snapshot).map(move |k| &arena[k]));

            // commit only if nobody appended since the snapshot
            while !h.is_zero() {
                let mut state = lock.lock().unwrap_or_else(PoisonError::into_inner);
                if state.done || state.error.is_some() {
                    return;
                }
                let len = arena.len();
                if len != snapshot {
                    drop(state);
                    h = normal_form(&self.mult, &h, (0..len).map(move |k| &arena[k]));
                    snapshot = len;
                    continue;
                }
                if let Err(error) = Self::commit(arena, &mut state, &h) {
                    state.error = Some(error);
                }
                cvar.notify_all();
                break;
            }
        }
    }

    /// Pops the next pair with the current basis length, or `None` once the
    /// queue is drained and every worker waits.
    fn next_pair<E: GbElement>(
        &self,
        arena: &AppendOnlyVec<E>,
        (lock, cvar): &(Mutex<State<E::Mono>>, Condvar),
    ) -> Option<(Pair<E::Mono>, usize)> {
        let mut state = lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if state.done || state.error.is_some() {
                return None;
            }
            if let Some(pair) = state.pairs.remove_next() {
                return Some((pair, arena.len()));
            }
            state.idle += 1;
            if state.idle == self.threads {
                state.done = true;
                cvar.notify_all();
                return None;
            }
            state = cvar.wait(state).unwrap_or_else(PoisonError::into_inner);
            state.idle -= 1;
        }
    }

    fn commit<E: GbElement>(
        arena: &AppendOnlyVec<E>,
        state: &mut State<E::Mono>,
        h: &E,
    ) -> GbResult<()> {
        let h = normalize(h)?;
        let unit = h.is_unit();
        let Some((_, lm, pos)) = h.leading_term() else {
            return Ok(());
        };
        let (lm, pos) = (lm.clone(), pos);
        let expected = state.pairs.size();
        let index = arena.push(h);
        if index != expected {
            return Err(GbError::Concurrency(format!(
                "basis element stored at {index}, pair list expected {expected}"
            )));
        }
        state.pairs.put(lm, pos);
        if unit {
            state.done = true;
        }
        Ok(())
    }

    pub fn is_gb<E>(&self, basis: &[E]) -> GbResult<bool>
    where
        E: GbElement,
        X: Multiplier<E>,
    {
        Ok(self.pool()?.install(|| is_groebner_basis(&self.mult, basis)))
    }

    pub fn minimal_gb<E: GbElement>(&self, basis: &Basis<E>) -> GbResult<Basis<E>> {
        let elements = basis.elements().to_vec();
        let minimal = self.pool()?.install(|| minimal_basis(elements))?;
        Ok(Basis::with_status(minimal, basis.is_gb()))
    }

    /// Interreduction with the pool's threads.
    pub fn reduced_gb<E>(&self, basis: &Basis<E>) -> GbResult<Basis<E>>
    where
        E: GbElement,
        X: Multiplier<E>,
    {
        let elements = basis.elements().to_vec();
        let reduced = self
            .pool()?
            .install(|| interreduce(&self.mult, elements))?;
        Ok(Basis::with_status(reduced, basis.is_gb()))
    }
}

impl<X> Drop for GroebnerBaseParallel<X> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        groebner::GroebnerBaseSeq,
        poly::{
            monomial::{DegRevLexOrder, LexOrder},
            ring::{Poly, PolynomialRing},
        },
        GF,
    };
    use num_rational::BigRational;

    fn cyclic4() -> Vec<Poly<GF, DegRevLexOrder>> {
        let ring = PolynomialRing::<GF, DegRevLexOrder>::new(&["a", "b", "c", "d"]);
        vec![
            ring.poly(&[(1, &[1]), (1, &[0, 1]), (1, &[0, 0, 1]), (1, &[0, 0, 0, 1])]),
            ring.poly(&[
                (1, &[1, 1]),
                (1, &[0, 1, 1]),
                (1, &[0, 0, 1, 1]),
                (1, &[1, 0, 0, 1]),
            ]),
            ring.poly(&[
                (1, &[1, 1, 1]),
                (1, &[0, 1, 1, 1]),
                (1, &[1, 0, 1, 1]),
                (1, &[1, 1, 0, 1]),
            ]),
            ring.poly(&[(1, &[1, 1, 1, 1]), (-1, &[])]),
        ]
    }

    #[test]
    fn test_thread_counts_agree_with_sequential() {
        let f = cyclic4();
        let seq = GroebnerBaseSeq::new();
        let expected = seq.reduced_gb(&seq.gb(&f).unwrap()).unwrap();
        for threads in [1, 2, 4, 8] {
            let par = GroebnerBaseParallel::new(threads).unwrap();
            let gb = par.gb(&f).unwrap();
            assert!(gb.is_gb());
            assert!(par.is_gb(gb.elements()).unwrap());
            let reduced = par.reduced_gb(&gb).unwrap();
            assert_eq!(reduced, expected, "threads = {threads}");
        }
    }

    #[test]
    fn test_rational_fixture_in_parallel() {
        let ring = PolynomialRing::<BigRational, LexOrder>::new(&["x", "y"]);
        let f = vec![
            ring.poly(&[(1, &[2]), (1, &[0, 1])]),
            ring.poly(&[(1, &[1, 1]), (-1, &[])]),
        ];
        let par = GroebnerBaseParallel::from_config(&ParallelConfig { threads: 4 }).unwrap();
        let (gb, _elapsed) = par.gb_timed(&f).unwrap();
        let reduced = par.reduced_gb(&gb).unwrap();
        assert_eq!(
            reduced.elements(),
            &[
                ring.poly(&[(1, &[0, 3]), (1, &[])]),
                ring.poly(&[(1, &[1]), (1, &[0, 2])]),
            ]
        );
        let unit = vec![ring.poly(&[(1, &[1])]), ring.poly(&[(2, &[1]), (1, &[])])];
        assert_eq!(par.gb(&unit).unwrap().elements(), &[ring.one()]);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut par = GroebnerBaseParallel::new(2).unwrap();
        assert_eq!(par.threads(), 2);
        par.shutdown();
        par.shutdown();
        assert!(par.is_shut_down());
        let f = cyclic4();
        assert_eq!(par.gb(&f), Err(GbError::ShutDown));
        assert_eq!(par.is_gb(&f), Err(GbError::ShutDown));
    }
}
