// tests/common/mod.rs
//! Mocks shared by the integration tests
#![allow(dead_code)]

use aqua_miner_rs::miner::{
    HashParameters, HashSearch, HeapAllocator, KeyedHasher, MemoryAllocator, Seed, Target,
    WorkerContext, WorkingMemory,
};
use aqua_miner_rs::network::submit::Connector;
use aqua_miner_rs::network::{JobDescription, RequestIds, RpcTransport, SharedJobFeed, SubmissionChannel};
use aqua_miner_rs::stats::GlobalCounters;
use aqua_miner_rs::{MinerError, MiningMode};
use futures::future::BoxFuture;
use std::collections::{HashSet, VecDeque};
use rand::RngCore;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const ACCEPT: &str = r#"{"jsonrpc":"2.0","id":1,"result":true}"#;
pub const REJECT: &str = r#"{"jsonrpc":"2.0","id":1,"result":false}"#;

pub fn job_hash(byte: u8) -> String {
    format!("0x{}", hex::encode([byte; 32]))
}

pub fn easy_job(byte: u8) -> JobDescription {
    JobDescription::new(job_hash(byte), Target::max())
}

/// Node double answering from a script, then accepting everything
#[derive(Default)]
pub struct ScriptedNode {
    script: Mutex<VecDeque<Result<String, MinerError>>>,
    pub bodies: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedNode {
    pub fn new(script: Vec<Result<String, MinerError>>) -> Arc<Self> {
        Arc::new(ScriptedNode {
            script: Mutex::new(script.into()),
            bodies: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn connector(self: &Arc<Self>) -> Connector {
        let node = Arc::clone(self);
        Box::new(move || Ok(Box::new(NodeHandle(Arc::clone(&node))) as Box<dyn RpcTransport>))
    }
}

pub struct NodeHandle(pub Arc<ScriptedNode>);

impl RpcTransport for NodeHandle {
    fn post<'a>(&'a self, _url: &'a str, body: String) -> BoxFuture<'a, Result<String, MinerError>> {
        self.0
            .bodies
            .lock()
            .unwrap()
            .push(serde_json::from_str(&body).unwrap());
        let reply = self
            .0
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ACCEPT.to_string()));
        Box::pin(async move { reply })
    }
}

/// Node double that holds every request for a while and records how many
/// were in flight at once
#[derive(Default)]
pub struct SlowNode {
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub served: AtomicUsize,
}

impl SlowNode {
    pub fn connector(self: &Arc<Self>) -> Connector {
        let node = Arc::clone(self);
        Box::new(move || Ok(Box::new(SlowHandle(Arc::clone(&node))) as Box<dyn RpcTransport>))
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct SlowHandle(pub Arc<SlowNode>);

impl RpcTransport for SlowHandle {
    fn post<'a>(&'a self, _url: &'a str, _body: String) -> BoxFuture<'a, Result<String, MinerError>> {
        Box::pin(async move {
            let node = &self.0;
            let now = node.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            node.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            node.in_flight.fetch_sub(1, Ordering::SeqCst);
            node.served.fetch_add(1, Ordering::SeqCst);
            Ok(ACCEPT.to_string())
        })
    }
}

/// Random source replaying fixed values, then counting up from the last one
pub struct SequenceRng {
    values: VecDeque<u64>,
    last: u64,
}

impl SequenceRng {
    pub fn new(values: &[u64]) -> Self {
        SequenceRng {
            values: values.iter().copied().collect(),
            last: 0,
        }
    }
}

impl RngCore for SequenceRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        let next = self.last.wrapping_add(1);
        self.last = self.values.pop_front().unwrap_or(next);
        self.last
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Device double recording every batch and winning on chosen calls
pub struct ScriptedSearch {
    pub calls: Arc<Mutex<Vec<(u64, u64)>>>,
    win_on: HashSet<usize>,
    fixed_winner: Option<u64>,
}

impl ScriptedSearch {
    pub fn new(win_on: &[usize]) -> (Self, Arc<Mutex<Vec<(u64, u64)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            ScriptedSearch {
                calls: calls.clone(),
                win_on: win_on.iter().copied().collect(),
                fixed_winner: None,
            },
            calls,
        )
    }

    /// Reports `nonce` as the winner of the first batch
    pub fn winning_nonce(nonce: u64) -> (Self, Arc<Mutex<Vec<(u64, u64)>>>) {
        let (mut search, calls) = Self::new(&[0]);
        search.fixed_winner = Some(nonce);
        (search, calls)
    }
}

impl HashSearch for ScriptedSearch {
    fn search(
        &mut self,
        _seed: &Seed,
        nonce_start: u64,
        batch_size: u64,
        _target: &Target,
    ) -> Result<Option<u64>, MinerError> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push((nonce_start, batch_size));
        if self.win_on.contains(&index) {
            Ok(Some(self.fixed_winner.unwrap_or(nonce_start)))
        } else {
            Ok(None)
        }
    }

    fn name(&self) -> String {
        "scripted".into()
    }
}

/// Hasher returning all zeros, which beats every non-zero target
pub struct ZeroHasher;

impl KeyedHasher for ZeroHasher {
    fn hash(&self, _seed: &Seed, _memory: &mut WorkingMemory, out: &mut [u8; 32]) -> Result<(), MinerError> {
        out.fill(0);
        Ok(())
    }

    fn memory_blocks(&self) -> usize {
        8
    }

    fn name(&self) -> &'static str {
        "zero"
    }

    fn network_exact(&self) -> bool {
        true
    }
}

/// Hasher whose primitive always fails
pub struct BrokenHasher;

impl KeyedHasher for BrokenHasher {
    fn hash(&self, _seed: &Seed, _memory: &mut WorkingMemory, _out: &mut [u8; 32]) -> Result<(), MinerError> {
        Err(MinerError::HashComputationError("memory fill failed".into()))
    }

    fn memory_blocks(&self) -> usize {
        8
    }

    fn name(&self) -> &'static str {
        "broken"
    }

    fn network_exact(&self) -> bool {
        true
    }
}

/// Heap allocator that counts allocate/release calls
#[derive(Default)]
pub struct CountingAllocator {
    pub allocations: AtomicUsize,
    pub releases: AtomicUsize,
}

impl MemoryAllocator for CountingAllocator {
    fn allocate(&self, block_count: usize) -> WorkingMemory {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        HeapAllocator.allocate(block_count)
    }

    fn release(&self, memory: WorkingMemory) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        HeapAllocator.release(memory);
    }
}

/// Everything a worker test needs, wired together
pub struct Rig {
    pub runtime: tokio::runtime::Runtime,
    pub feed: Arc<SharedJobFeed>,
    pub counters: Arc<GlobalCounters>,
    pub node: Arc<ScriptedNode>,
    pub ctx: Arc<WorkerContext>,
}

pub struct RigOptions {
    pub mode: MiningMode,
    pub batch_size: u64,
    pub script: Vec<Result<String, MinerError>>,
    pub verifier: Option<Arc<dyn KeyedHasher>>,
    pub allocator: Arc<dyn MemoryAllocator>,
    pub reject_wait: Duration,
}

impl Default for RigOptions {
    fn default() -> Self {
        RigOptions {
            mode: MiningMode::Pool,
            batch_size: 1024,
            script: Vec::new(),
            verifier: None,
            allocator: Arc::new(HeapAllocator),
            reject_wait: Duration::from_millis(1),
        }
    }
}

impl Rig {
    pub fn new(opts: RigOptions) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let feed = Arc::new(SharedJobFeed::new());
        let counters = Arc::new(GlobalCounters::new());
        let node = ScriptedNode::new(opts.script);
        let submissions = Arc::new(SubmissionChannel::new(
            "http://node.test",
            opts.mode,
            Arc::new(HashParameters::new()),
            counters.clone(),
            Arc::new(RequestIds::new()),
            node.connector(),
            runtime.handle().clone(),
        ));
        let ctx = Arc::new(WorkerContext {
            mode: opts.mode,
            batch_size: opts.batch_size,
            poll_interval: Duration::from_millis(1),
            reject_wait: opts.reject_wait,
            run: Arc::new(AtomicBool::new(true)),
            feed: feed.clone(),
            counters: counters.clone(),
            submissions,
            verifier: opts.verifier,
            allocator: opts.allocator,
        });
        Rig {
            runtime,
            feed,
            counters,
            node,
            ctx,
        }
    }
}

/// Polls `cond` until it holds or five seconds pass
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
