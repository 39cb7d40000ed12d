// src/network/mod.rs
//! Network communication components
//!
//! Everything that talks to the Aquachain node (or a pool speaking the same
//! JSON-RPC dialect):
//! - `job`: the current-job feed read by workers
//! - `node`: JSON-RPC transport, client and getWork updater
//! - `submit`: the serialized submission channel

/// Current-job feed
pub mod job;

/// Node JSON-RPC client and work updater
///
/// Uses `aqua_getWork` to fetch jobs over a single reusable HTTP connection.
pub mod node;

/// Winning nonce submission
pub mod submit;

// Re-export main components for cleaner imports
pub use job::{JobDescription, JobFeed, SharedJobFeed};
pub use node::{HttpTransport, NodeClient, RequestIds, RpcTransport, WorkUpdater};
pub use submit::{Submission, SubmissionChannel, SubmitOutcome};
