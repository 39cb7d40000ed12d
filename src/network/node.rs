// src/network/node.rs
//! Aquachain node JSON-RPC client
//!
//! Provides the transport seam shared by the getWork updater and the
//! submission channel, plus the updater loop that keeps the job feed fresh.

use crate::miner::target::Target;
use crate::network::job::{JobDescription, JobFeed, SharedJobFeed};
use crate::utils::error::MinerError;
use crate::utils::logging::hash_prefix;
use futures::future::BoxFuture;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// One outbound JSON-RPC connection
pub trait RpcTransport: Send + Sync {
    /// POSTs `body` to `url` and returns the raw response text
    ///
    /// # Errors
    /// `NetworkError` on any transport failure or non-2xx status.
    fn post<'a>(&'a self, url: &'a str, body: String) -> BoxFuture<'a, Result<String, MinerError>>;
}

/// HTTP transport keeping a single pooled connection alive
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a client that keeps at most one idle connection per host
    pub fn new(timeout: Duration) -> Result<Self, MinerError> {
        let client = Client::builder()
            .pool_max_idle_per_host(1)
            .timeout(timeout)
            .build()?;
        Ok(HttpTransport { client })
    }
}

impl RpcTransport for HttpTransport {
    fn post<'a>(&'a self, url: &'a str, body: String) -> BoxFuture<'a, Result<String, MinerError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| MinerError::NetworkError(format!("POST {} failed: {}", url, e)))?;

            response
                .text()
                .await
                .map_err(|e| MinerError::NetworkError(format!("reading {} response: {}", url, e)))
        })
    }
}

/// Process-wide JSON-RPC request id sequence
///
/// Shared between getWork polling and submissions.
#[derive(Debug, Default)]
pub struct RequestIds(AtomicU64);

impl RequestIds {
    /// Creates a sequence whose first id is 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Builds a JSON-RPC 2.0 request body
pub fn rpc_request(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

/// Client for the node's getWork interface
pub struct NodeClient {
    url: String,
    transport: Arc<dyn RpcTransport>,
    ids: Arc<RequestIds>,
}

impl NodeClient {
    /// Creates a client for `url`
    pub fn new(url: impl Into<String>, transport: Arc<dyn RpcTransport>, ids: Arc<RequestIds>) -> Self {
        NodeClient {
            url: url.into(),
            transport,
            ids,
        }
    }

    /// Makes an RPC call and returns the parsed response
    pub async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, MinerError> {
        let body = rpc_request(self.ids.next(), method, params).to_string();
        let text = self.transport.post(&self.url, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Requests the current job
    ///
    /// The node answers `[jobHash, seedHash, target]` as hex strings; the
    /// job hash is validated here so a malformed one never reaches workers.
    pub async fn get_work(&self) -> Result<JobDescription, MinerError> {
        let response = self.rpc_call("aqua_getWork", json!([])).await?;
        if let Some(err) = response.get("error").filter(|e| !e.is_null()) {
            return Err(MinerError::ProtocolError(format!("aqua_getWork error: {}", err)));
        }

        let work = response["result"]
            .as_array()
            .ok_or_else(|| MinerError::ProtocolError("Missing result array".to_string()))?;
        let job_hash = work
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| MinerError::ProtocolError("Missing job hash".to_string()))?;
        let target = work
            .get(2)
            .and_then(Value::as_str)
            .ok_or_else(|| MinerError::ProtocolError("Missing target".to_string()))?;

        let job = JobDescription::new(job_hash, Target::from_hex(target)?);
        job.job_hash_bytes()?;
        Ok(job)
    }
}

/// Background task republishing the node's work into a [`SharedJobFeed`]
pub struct WorkUpdater {
    node: NodeClient,
    feed: Arc<SharedJobFeed>,
    refresh: Duration,
}

impl WorkUpdater {
    /// Creates an updater polling every `refresh`
    pub fn new(node: NodeClient, feed: Arc<SharedJobFeed>, refresh: Duration) -> Self {
        WorkUpdater { node, feed, refresh }
    }

    /// Fetches work once; on failure the previous job stays current
    pub async fn poll_once(&self) -> Result<(), MinerError> {
        let job = self.node.get_work().await?;
        let previous = self.feed.current_job();
        if previous.as_ref().map(|j| &j.job_hash) != Some(&job.job_hash) {
            log::info!(
                "new work {} target {}",
                hash_prefix(&job.job_hash),
                job.target
            );
        }
        self.feed.publish(job);
        Ok(())
    }

    /// Polls until `run` is cleared
    pub async fn run(self, run: Arc<AtomicBool>) {
        let mut interval = tokio::time::interval(self.refresh);
        while run.load(Ordering::Relaxed) {
            interval.tick().await;
            if let Err(e) = self.poll_once().await {
                match e {
                    MinerError::InvalidJobHash(_) => {
                        log::warn!("discarding work update: {}", e)
                    }
                    _ => log::warn!("getWork failed: {}", e),
                }
            }
        }
    }
}
