//! Master/worker Buchberger over a message-passing boundary.
//!
//! The master owns the canonical basis and the pair queue. Workers keep a
//! copy of the basis that the master tops up with every task, reduce one
//! S-polynomial per task and send the remainder back. The master checks the
//! remainder again against elements that appeared in the meantime before it
//! commits it.
//!
//! A task that outlives `task_timeout` is requeued for the next idle worker.
//! The late worker is not dropped: its answer is still accepted if the pair
//! has not been committed yet, and it rejoins as soon as it speaks again.
//! Only a failed send removes a worker for good.
//!
//! Only the in-process [`LocalCluster`] transport is provided; anything that
//! can carry the serde-serialisable messages can implement [`Transport`] and
//! [`Endpoint`].

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{
    error::{GbError, GbResult},
    groebner::minimal_basis,
    log_info,
    pairs::{Pair, PairList},
    poly::ring::Basis,
    reduction::{normal_form, normalize, s_polynomial, Commutative, GbElement, Multiplier},
};

pub const DEFAULT_PORT: u16 = 4711;

/// Where the workers run and how long the master waits for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub machines: Vec<String>,
    pub port: u16,
    pub workers: usize,
    pub task_timeout: Duration,
    pub poll_interval: Duration,
    /// Give up when work remains, every worker is late and none has said
    /// anything for this long.
    pub stall_timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            machines: vec!["localhost".to_string()],
            port: DEFAULT_PORT,
            workers: 2,
            task_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(10),
            stall_timeout: Duration::from_secs(300),
        }
    }
}

impl ClusterConfig {
    pub fn local(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// `host:port` of every machine.
    pub fn addresses(&self) -> Vec<String> {
        self.machines
            .iter()
            .map(|m| format!("{m}:{}", self.port))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributedStats {
    pub startup: Duration,
    pub compute: Duration,
    pub tasks_sent: usize,
    pub reassigned: usize,
    /// Results accepted after their task had timed out.
    pub late_results: usize,
    pub duplicates: usize,
    pub workers_lost: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MasterMessage<E> {
    Task {
        id: u64,
        pair: (usize, usize),
        basis_version: usize,
        /// Basis elements the worker has not seen, with their indices.
        update: Vec<(usize, E)>,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerMessage<E> {
    Ready {
        worker: usize,
    },
    TaskResult {
        id: u64,
        worker: usize,
        outcome: Result<E, String>,
    },
}

/// Master side of the boundary.
pub trait Transport<E> {
    fn workers(&self) -> usize;

    fn send(&mut self, worker: usize, msg: MasterMessage<E>) -> GbResult<()>;

    /// `Ok(None)` when nothing arrived within `timeout`.
    fn recv_timeout(&mut self, timeout: Duration) -> GbResult<Option<WorkerMessage<E>>>;
}

/// Worker side of the boundary.
pub trait Endpoint<E> {
    fn send(&mut self, msg: WorkerMessage<E>) -> GbResult<()>;

    fn recv(&mut self) -> GbResult<MasterMessage<E>>;
}

pub struct ChannelEndpoint<E> {
    to_master: Sender<WorkerMessage<E>>,
    from_master: Receiver<MasterMessage<E>>,
}

impl<E> Endpoint<E> for ChannelEndpoint<E> {
    fn send(&mut self, msg: WorkerMessage<E>) -> GbResult<()> {
        self.to_master
            .send(msg)
            .map_err(|_| GbError::Distributed("master hung up".to_string()))
    }

    fn recv(&mut self) -> GbResult<MasterMessage<E>> {
        self.from_master
            .recv()
            .map_err(|_| GbError::Distributed("master hung up".to_string()))
    }
}

/// Workers on local threads connected by channels.
pub struct LocalCluster<E> {
    to_workers: Vec<Sender<MasterMessage<E>>>,
    from_workers: Receiver<WorkerMessage<E>>,
    handles: Vec<JoinHandle<GbResult<()>>>,
}

impl<E: GbElement> LocalCluster<E> {
    pub fn start<X>(workers: usize, mult: &X) -> GbResult<Self>
    where
        X: Multiplier<E> + Clone + 'static,
    {
        let (to_master, from_workers) = channel();
        let mut to_workers = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let (tx, rx) = channel();
            let mut endpoint = ChannelEndpoint {
                to_master: to_master.clone(),
                from_master: rx,
            };
            let mult = mult.clone();
            let handle = thread::Builder::new()
                .name(format!("groebner-node-{worker}"))
                .spawn(move || run_worker(worker, &mut endpoint, &mult))
                .map_err(|e| GbError::Distributed(e.to_string()))?;
            to_workers.push(tx);
            handles.push(handle);
        }
        Ok(Self {
            to_workers,
            from_workers,
            handles,
        })
    }

    /// Waits for every worker thread to finish.
    pub fn join(self) -> GbResult<()> {
        drop(self.to_workers);
        for handle in self.handles {
            handle
                .join()
                .map_err(|_| GbError::Distributed("worker thread panicked".to_string()))??;
        }
        Ok(())
    }
}

impl<E> Transport<E> for LocalCluster<E> {
    fn workers(&self) -> usize {
        self.to_workers.len()
    }

    fn send(&mut self, worker: usize, msg: MasterMessage<E>) -> GbResult<()> {
        let tx = self
            .to_workers
            .get(worker)
            .ok_or_else(|| GbError::Distributed(format!("no worker {worker}")))?;
        tx.send(msg)
            .map_err(|_| GbError::Distributed(format!("worker {worker} hung up")))
    }

    fn recv_timeout(&mut self, timeout: Duration) -> GbResult<Option<WorkerMessage<E>>> {
        match self.from_workers.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(GbError::Distributed("every worker hung up".to_string()))
            },
        }
    }
}

/// Worker loop: announce readiness, take a task, answer it, until shut down.
pub fn run_worker<E, X, P>(worker: usize, endpoint: &mut P, mult: &X) -> GbResult<()>
where
    E: GbElement,
    X: Multiplier<E>,
    P: Endpoint<E>,
{
    let mut basis: Vec<E> = Vec::new();
    loop {
        endpoint.send(WorkerMessage::Ready { worker })?;
        match endpoint.recv()? {
            MasterMessage::Shutdown => return Ok(()),
            MasterMessage::Task {
                id,
                pair,
                basis_version,
                update,
            } => {
                let outcome = apply_update(&mut basis, update)
                    .and_then(|()| reduce_task(mult, &basis, pair, basis_version));
                endpoint.send(WorkerMessage::TaskResult {
                    id,
                    worker,
                    outcome,
                })?;
            },
        }
    }
}

fn apply_update<E>(basis: &mut Vec<E>, update: Vec<(usize, E)>) -> Result<(), String> {
    for (index, element) in update {
        match index.cmp(&basis.len()) {
            std::cmp::Ordering::Less => basis[index] = element,
            std::cmp::Ordering::Equal => basis.push(element),
            std::cmp::Ordering::Greater => {
                return Err(format!(
                    "update skips from {} to {index}",
                    basis.len()
                ))
            },
        }
    }
    Ok(())
}

fn reduce_task<E, X>(mult: &X, basis: &[E], (i, j): (usize, usize), version: usize) -> Result<E, String>
where
    E: GbElement,
    X: Multiplier<E>,
{
    if version > basis.len() {
        return Err(format!("basis version {version} ahead of local copy {}", basis.len()));
    }
    let (Some(f), Some(g)) = (basis.get(i), basis.get(j)) else {
        return Err(format!("pair ({i}, {j}) outside basis of {}", basis.len()));
    };
    Ok(match s_polynomial(mult, f, g) {
        Some(s) => normal_form(mult, &s, &basis[..version]),
        None => f.zero_like(),
    })
}

struct InFlight<M> {
    worker: usize,
    pair: Pair<M>,
    version: usize,
    deadline: Instant,
}

struct Master<'a, E: GbElement, X> {
    mult: &'a X,
    config: &'a ClusterConfig,
    basis: Vec<E>,
    pairs: PairList<E::Mono>,
    retry: VecDeque<Pair<E::Mono>>,
    done: HashSet<(usize, usize)>,
    known: Vec<usize>,
    idle: VecDeque<usize>,
    late: HashSet<usize>,
    lost: HashSet<usize>,
    in_flight: HashMap<u64, InFlight<E::Mono>>,
    expired: HashMap<u64, InFlight<E::Mono>>,
    last_heard: Instant,
    next_id: u64,
    stats: DistributedStats,
}

impl<'a, E, X> Master<'a, E, X>
where
    E: GbElement,
    X: Multiplier<E>,
{
    fn next_pair(&mut self) -> Option<Pair<E::Mono>> {
        while let Some(pair) = self.retry.pop_front() {
            if !self.done.contains(&(pair.i, pair.j)) {
                return Some(pair);
            }
        }
        self.pairs.remove_next()
    }

    fn dispatch<T: Transport<E>>(&mut self, transport: &mut T) {
        while let Some(worker) = self.idle.pop_front() {
            let Some(pair) = self.next_pair() else {
                self.idle.push_front(worker);
                return;
            };
            let version = self.basis.len();
            let update = (self.known[worker]..version)
                .map(|k| (k, self.basis[k].clone()))
                .collect();
            let id = self.next_id;
            self.next_id += 1;
            let task = MasterMessage::Task {
                id,
                pair: (pair.i, pair.j),
                basis_version: version,
                update,
            };
            if transport.send(worker, task).is_err() {
                self.lose(worker);
                self.retry.push_back(pair);
                continue;
            }
            self.known[worker] = version;
            self.stats.tasks_sent += 1;
            self.in_flight.insert(
                id,
                InFlight {
                    worker,
                    pair,
                    version,
                    deadline: Instant::now() + self.config.task_timeout,
                },
            );
        }
    }

    fn lose(&mut self, worker: usize) {
        if self.lost.insert(worker) {
            self.stats.workers_lost += 1;
            self.idle.retain(|w| *w != worker);
            log_info!("Worker {worker} lost");
        }
    }

    /// Any message proves the worker is alive again.
    fn heard_from(&mut self, worker: usize) {
        self.last_heard = Instant::now();
        if self.late.remove(&worker) | self.lost.remove(&worker) {
            log_info!("Worker {worker} answered again");
        }
    }

    fn expire(&mut self) {
        let now = Instant::now();
        let expired: Vec<u64> = self
            .in_flight
            .iter()
            .filter(|(_, task)| task.deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(task) = self.in_flight.remove(&id) {
                log_info!("Task {id} on worker {} timed out, requeued", task.worker);
                self.late.insert(task.worker);
                self.retry.push_back(task.pair.clone());
                self.stats.reassigned += 1;
                self.expired.insert(id, task);
            }
        }
    }

    /// `Ok(true)` once a unit has been committed.
    fn commit(&mut self, task: InFlight<E::Mono>, h: E) -> GbResult<bool> {
        let mut h = h;
        if !h.is_zero() && task.version < self.basis.len() {
            h = normal_form(self.mult, &h, &self.basis);
        }
        if h.is_zero() {
            return Ok(false);
        }
        let h = normalize(&h)?;
        let Some((_, lm, pos)) = h.leading_term() else {
            return Ok(false);
        };
        let (lm, pos) = (lm.clone(), pos);
        let unit = h.is_unit();
        if self.pairs.size() != self.basis.len() {
            return Err(GbError::Concurrency(format!(
                "pair list tracks {} elements, basis has {}",
                self.pairs.size(),
                self.basis.len()
            )));
        }
        self.pairs.put(lm, pos);
        self.basis.push(h);
        Ok(unit)
    }

    fn live_workers(&self) -> usize {
        self.known.len() - self.lost.len()
    }

    fn run<T: Transport<E>>(&mut self, transport: &mut T) -> GbResult<()> {
        loop {
            self.dispatch(transport);
            if self.in_flight.is_empty() && self.retry.is_empty() && !self.pairs.has_next() {
                return Ok(());
            }
            if self.live_workers() == 0 {
                return Err(GbError::Distributed(
                    "all workers lost with work remaining".to_string(),
                ));
            }
            if self.in_flight.is_empty()
                && self.idle.is_empty()
                && self.last_heard.elapsed() >= self.config.stall_timeout
            {
                return Err(GbError::Distributed(format!(
                    "no worker answered for {:?} with work remaining",
                    self.config.stall_timeout
                )));
            }
            match transport.recv_timeout(self.config.poll_interval)? {
                None => {},
                Some(WorkerMessage::Ready { worker }) => {
                    if worker < self.known.len() {
                        self.heard_from(worker);
                        if !self.idle.contains(&worker) {
                            self.idle.push_back(worker);
                        }
                    }
                },
                Some(WorkerMessage::TaskResult {
                    id,
                    worker,
                    outcome,
                }) => {
                    if worker < self.known.len() {
                        self.heard_from(worker);
                    }
                    let (task, late) = match self.in_flight.remove(&id) {
                        Some(task) => (task, false),
                        None => match self.expired.remove(&id) {
                            Some(task) => (task, true),
                            None => {
                                self.stats.duplicates += 1;
                                log_info!("Discarded stale result of task {id} from worker {worker}");
                                continue;
                            },
                        },
                    };
                    if !self.done.insert((task.pair.i, task.pair.j)) {
                        self.stats.duplicates += 1;
                        log_info!("Pair ({}, {}) already committed, result of task {id} dropped", task.pair.i, task.pair.j);
                        continue;
                    }
                    let h = outcome.map_err(|msg| {
                        GbError::Distributed(format!("worker {worker} failed task {id}: {msg}"))
                    })?;
                    if late {
                        self.stats.late_results += 1;
                    }
                    if self.commit(task, h)? {
                        return Ok(());
                    }
                },
            }
            self.expire();
        }
    }
}

/// Distributed Buchberger with a fixed number of workers.
#[derive(Debug, Clone)]
pub struct GroebnerBaseDistributed<X = Commutative> {
    config: ClusterConfig,
    mult: X,
}

impl GroebnerBaseDistributed<Commutative> {
    pub fn new(config: ClusterConfig) -> Self {
        Self::with_multiplier(config, Commutative)
    }
}

impl<X> GroebnerBaseDistributed<X> {
    pub fn with_multiplier(config: ClusterConfig, mult: X) -> Self {
        Self { config, mult }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Runs on a [`LocalCluster`] started for this call.
    pub fn gb<E>(&self, generators: &[E]) -> GbResult<Basis<E>>
    where
        E: GbElement,
        X: Multiplier<E> + Clone + 'static,
    {
        self.gb_with_stats(generators).map(|(basis, _)| basis)
    }

    pub fn gb_with_stats<E>(&self, generators: &[E]) -> GbResult<(Basis<E>, DistributedStats)>
    where
        E: GbElement,
        X: Multiplier<E> + Clone + 'static,
    {
        let start = Instant::now();
        let mut cluster = LocalCluster::start(self.config.workers, &self.mult)?;
        let startup = start.elapsed();
        let result = self.gb_over(&mut cluster, generators);
        cluster.join()?;
        let (basis, mut stats) = result?;
        stats.startup = startup;
        Ok((basis, stats))
    }

    /// Master side only; the workers behind `transport` are already running.
    pub fn gb_over<E, T>(&self, transport: &mut T, generators: &[E]) -> GbResult<(Basis<E>, DistributedStats)>
    where
        E: GbElement,
        X: Multiplier<E>,
        T: Transport<E>,
    {
        let start = Instant::now();
        let workers = transport.workers();
        let mut master = Master {
            mult: &self.mult,
            config: &self.config,
            basis: Vec::with_capacity(generators.len()),
            pairs: PairList::new(E::PRODUCT_CRITERION && self.mult.is_commutative()),
            retry: VecDeque::new(),
            done: HashSet::new(),
            known: vec![0; workers],
            idle: VecDeque::new(),
            late: HashSet::new(),
            lost: HashSet::new(),
            in_flight: HashMap::new(),
            expired: HashMap::new(),
            last_heard: Instant::now(),
            next_id: 0,
            stats: DistributedStats::default(),
        };

        let mut result = Ok(());
        for p in generators.iter().filter(|p| !p.is_zero()) {
            let p = normalize(p)?;
            if p.is_unit() {
                master.basis = vec![p];
                master.pairs = PairList::new(false);
                break;
            }
            let Some((_, lm, pos)) = p.leading_term() else {
                continue;
            };
            master.pairs.put(lm.clone(), pos);
            master.basis.push(p);
        }
        if workers == 0 && master.pairs.has_next() {
            result = Err(GbError::Distributed("cluster has no workers".to_string()));
        }
        if result.is_ok() {
            result = master.run(transport);
        }

        for worker in 0..workers {
            // lost workers may be gone for good
            let _ = transport.send(worker, MasterMessage::Shutdown);
        }
        result?;

        let mut stats = master.stats;
        stats.compute = start.elapsed();
        let basis = minimal_basis(master.basis)?;
        log_info!(
            "Distributed Buchberger end with basis.len(): {}, {} tasks, {} reassigned, {} late, {} duplicates, {:?}",
            basis.len(),
            stats.tasks_sent,
            stats.reassigned,
            stats.late_results,
            stats.duplicates,
            stats.compute
        );
        Ok((Basis::groebner(basis), stats))
    }
}
