// src/network/submit.rs
//! Serialized submission of winning nonces
//!
//! All submissions go through one lazily opened connection guarded by an
//! async mutex, so at most one request is in flight. Solo submissions run
//! on the finding worker's thread and block it; pool submissions are
//! detached tasks whose errors are logged and dropped.

use crate::miner::params::HashParameters;
use crate::miner::seed::nonce_to_hex;
use crate::miner::worker::RejectFlag;
use crate::network::node::{RequestIds, RpcTransport, rpc_request};
use crate::stats::counters::GlobalCounters;
use crate::types::MiningMode;
use crate::utils::error::MinerError;
use crate::utils::logging::hash_prefix;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, Semaphore};

/// Placeholder for the mix digest field the node ignores
pub const ZERO_MIX_DIGEST: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Upper bound on detached pool submissions waiting for the connection
const MAX_PENDING_SUBMISSIONS: usize = 64;

/// Opens the shared connection on first use
pub type Connector = Box<dyn Fn() -> Result<Box<dyn RpcTransport>, MinerError> + Send + Sync>;

/// A winning candidate on its way to the node
#[derive(Clone)]
pub struct Submission {
    /// Winning nonce
    pub nonce: u64,
    /// Job hash in wire form
    pub job_hash: String,
    /// `MINER_NN` tag of the finding worker
    pub worker_tag: String,
    /// Reject flag of the finding worker
    pub reject: Arc<RejectFlag>,
}

/// What happened to a submission that did not fail in transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The node accepted it
    Accepted,
    /// The node said no; the worker's reject flag is now set
    Rejected,
    /// Not sent because the hash parameters are not the protocol ones
    Suppressed,
}

/// Reads the node's verdict
///
/// `result` may be a JSON boolean or the string `"true"`; anything else,
/// unparseable bodies included, counts as a reject.
pub fn parse_submit_result(response: &str) -> bool {
    let Ok(doc) = serde_json::from_str::<Value>(response) else {
        return false;
    };
    match doc.get("result") {
        Some(Value::Bool(accepted)) => *accepted,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

/// Builds the `aqua_submitWork` request body
pub fn submit_request(id: u64, nonce: u64, job_hash: &str) -> Value {
    rpc_request(
        id,
        "aqua_submitWork",
        json!([nonce_to_hex(nonce), job_hash, ZERO_MIX_DIGEST]),
    )
}

/// The shared submission pipeline
pub struct SubmissionChannel {
    url: String,
    mode: MiningMode,
    params: Arc<HashParameters>,
    counters: Arc<GlobalCounters>,
    ids: Arc<RequestIds>,
    connector: Connector,
    connection: Mutex<Option<Box<dyn RpcTransport>>>,
    pending: Arc<Semaphore>,
    runtime: Handle,
}

impl SubmissionChannel {
    /// Creates a channel; no connection is opened until the first submit
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        url: impl Into<String>,
        mode: MiningMode,
        params: Arc<HashParameters>,
        counters: Arc<GlobalCounters>,
        ids: Arc<RequestIds>,
        connector: Connector,
        runtime: Handle,
    ) -> Self {
        SubmissionChannel {
            url: url.into(),
            mode,
            params,
            counters,
            ids,
            connector,
            connection: Mutex::new(None),
            pending: Arc::new(Semaphore::new(MAX_PENDING_SUBMISSIONS)),
            runtime,
        }
    }

    /// Mining mode this channel dispatches for
    pub fn mode(&self) -> MiningMode {
        self.mode
    }

    /// Sends one submission and books the result
    ///
    /// # Errors
    /// `NetworkError` when the transport fails; accept/reject counters are
    /// left untouched and nothing is retried.
    pub async fn submit(&self, submission: &Submission) -> Result<SubmitOutcome, MinerError> {
        let noun = self.mode.found_noun();
        let nonce_hex = nonce_to_hex(submission.nonce);

        if !self.params.submit_enabled() {
            log::info!(
                "[{}] Found {} ! (not submitted, use --force-submit to force), nonce = {}",
                submission.worker_tag,
                noun,
                nonce_hex
            );
            return Ok(SubmitOutcome::Suppressed);
        }

        let body = submit_request(self.ids.next(), submission.nonce, &submission.job_hash).to_string();

        let sent = async {
            let mut connection = self.connection.lock().await;
            if connection.is_none() {
                *connection = Some((self.connector)()?);
            }
            match connection.as_ref() {
                Some(transport) => transport.post(&self.url, body).await,
                None => Err(MinerError::NetworkError("no submission connection".into())),
            }
        }
        .await;
        self.counters.record_sent();

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                log::error!(
                    "[{}] submitting nonce {} for job {} failed: {}",
                    submission.worker_tag,
                    nonce_hex,
                    hash_prefix(&submission.job_hash),
                    e
                );
                return Err(match e {
                    MinerError::NetworkError(_) => e,
                    other => MinerError::NetworkError(other.to_string()),
                });
            }
        };

        if parse_submit_result(&response) {
            self.counters.record_accepted();
            log::info!("[{}] Found {} !, nonce = {}", submission.worker_tag, noun, nonce_hex);
            Ok(SubmitOutcome::Accepted)
        } else {
            log::warn!(
                "[{}] Rejected {}, nonce = {}, job = {}, server response: {}",
                submission.worker_tag,
                noun,
                nonce_hex,
                hash_prefix(&submission.job_hash),
                response.trim()
            );
            submission.reject.set();
            Ok(SubmitOutcome::Rejected)
        }
    }

    /// Hands a winner over according to the mining mode
    ///
    /// Solo blocks the calling worker thread until the node answers. Pool
    /// spawns a detached task and yields so the request can start before
    /// the next hash batch.
    pub fn dispatch(self: &Arc<Self>, submission: Submission) {
        match self.mode {
            MiningMode::Solo => {
                if let Err(e) = self.runtime.block_on(self.submit(&submission)) {
                    log::debug!("[{}] solo submission dropped: {}", submission.worker_tag, e);
                }
            }
            MiningMode::Pool => {
                let channel = Arc::clone(self);
                let pending = Arc::clone(&self.pending);
                self.runtime.spawn(async move {
                    let Ok(_permit) = pending.acquire_owned().await else {
                        return;
                    };
                    if let Err(e) = channel.submit(&submission).await {
                        log::debug!("[{}] pool submission dropped: {}", submission.worker_tag, e);
                    }
                });
                std::thread::yield_now();
            }
        }
    }

    /// Drops the shared connection; a later submit reopens it
    pub async fn close(&self) {
        self.connection.lock().await.take();
    }

    /// Blocking variant of [`close`](Self::close) for non-async callers
    pub fn close_blocking(&self) {
        self.runtime.block_on(self.close());
    }
}
