//! Request and metrics types for the queued command writer
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::serial::protocol::Command;
use crate::serial::Result;

#[derive(Debug)]
pub enum WriterRequest {
    /// Written back to back under one transport lock. `responder` is None for
    /// fire-and-forget sends.
    Send {
        commands: Vec<Command>,
        responder: Option<oneshot::Sender<Result<()>>>,
    },
    Shutdown { done: oneshot::Sender<()> },
}

/// Writer counters. All counts are in commands, not requests.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WriterMetrics {
    pub commands_sent: u64,
    pub write_failures: u64,
    /// Commands refused before any I/O (not connected, invalid values)
    pub rejected: u64,
    pub last_latency_ms: Option<u64>,
    pub max_latency_ms: Option<u64>,
    pub last_error: Option<String>,
}
