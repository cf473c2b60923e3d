//! Non-blocking front end for the transport: callers enqueue commands and a
//! single tokio task performs the blocking writes in order.
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::sync::mpsc::error::TrySendError;

use crate::hand::HandPose;
use crate::serial::interface::Connector;
use crate::serial::protocol::Command;
use crate::serial::transport::SerialCommandTransport;
use crate::serial::{Result, TransportError};
use super::types::*;

const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct QueuedWriterHandle {
    request_tx: mpsc::Sender<WriterRequest>,
    metrics_rx: watch::Receiver<WriterMetrics>,
}

impl QueuedWriterHandle {
    pub fn metrics(&self) -> WriterMetrics {
        self.metrics_rx.borrow().clone()
    }

    pub fn metrics_receiver(&self) -> watch::Receiver<WriterMetrics> {
        self.metrics_rx.clone()
    }

    /// Queue one command and wait for the transport's result
    pub async fn send(&self, command: Command) -> Result<()> {
        self.send_all(vec![command]).await
    }

    pub async fn send_pose(&self, pose: &HandPose) -> Result<()> {
        self.send_all(pose.commands().to_vec()).await
    }

    pub async fn send_all(&self, commands: Vec<Command>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request_tx
            .send(WriterRequest::Send {
                commands,
                responder: Some(tx),
            })
            .await
            .map_err(|_| TransportError::QueueClosed)?;
        rx.await.map_err(|_| TransportError::QueueClosed)?
    }

    /// Queue without waiting. Fails with `QueueFull` instead of blocking when
    /// the writer has fallen behind; write errors only show up in the metrics.
    pub fn try_send(&self, command: Command) -> Result<()> {
        let request = WriterRequest::Send {
            commands: vec![command],
            responder: None,
        };
        match self.request_tx.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(TransportError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(TransportError::QueueClosed),
        }
    }

    /// Stop the writer after everything queued ahead of this call is written
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.request_tx
            .send(WriterRequest::Shutdown { done: tx })
            .await
            .map_err(|_| TransportError::QueueClosed)?;
        rx.await.map_err(|_| TransportError::QueueClosed)
    }
}

pub struct QueuedWriterBuilder<C: Connector> {
    transport: Arc<SerialCommandTransport<C>>,
    queue_capacity: usize,
}

impl<C: Connector + 'static> QueuedWriterBuilder<C> {
    pub fn new(transport: Arc<SerialCommandTransport<C>>) -> Self {
        Self {
            transport,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Spawn the writer task. Must be called from within a tokio runtime.
    /// A queue capacity of zero is treated as one.
    pub fn build(self) -> QueuedWriterHandle {
        let (request_tx, request_rx) = mpsc::channel(self.queue_capacity.max(1));
        let (metrics_tx, metrics_rx) = watch::channel(WriterMetrics::default());

        tokio::spawn(writer_task(self.transport, request_rx, metrics_tx));

        QueuedWriterHandle {
            request_tx,
            metrics_rx,
        }
    }
}

pub(crate) async fn writer_task<C: Connector + 'static>(
    transport: Arc<SerialCommandTransport<C>>,
    mut request_rx: mpsc::Receiver<WriterRequest>,
    metrics_tx: watch::Sender<WriterMetrics>,
) {
    let mut metrics = WriterMetrics::default();
    log::debug!("Queued writer started");

    while let Some(request) = request_rx.recv().await {
        match request {
            WriterRequest::Send {
                commands,
                responder,
            } => {
                let started = Instant::now();
                let link = transport.clone();
                let batch = tokio::task::spawn_blocking(move || link.send_batch(&commands)).await;
                let (sent, result) = match batch {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let reason = format!("writer panicked: {}", e);
                        (0, Err(TransportError::WriteFailed(reason)))
                    }
                };

                record(&mut metrics, sent as u64, &result, started.elapsed());
                let _ = metrics_tx.send(metrics.clone());

                match responder {
                    Some(responder) => {
                        let _ = responder.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            log::warn!("Queued command not written: {}", e);
                        }
                    }
                }
            }
            WriterRequest::Shutdown { done } => {
                request_rx.close();
                let _ = done.send(());
                break;
            }
        }
    }

    log::debug!("Queued writer stopped");
}

// Counts are per command. A failed batch adds the commands written before
// the failure to `commands_sent` and the failing command to its error bucket.
fn record(metrics: &mut WriterMetrics, sent: u64, result: &Result<()>, elapsed: Duration) {
    metrics.commands_sent += sent;

    match result {
        Ok(()) => {
            let latency_ms = elapsed.as_millis() as u64;
            metrics.last_latency_ms = Some(latency_ms);
            metrics.max_latency_ms = Some(match metrics.max_latency_ms {
                Some(m) => m.max(latency_ms),
                None => latency_ms,
            });
        }
        Err(e @ (TransportError::NotConnected | TransportError::InvalidCommand(_))) => {
            metrics.rejected += 1;
            metrics.last_error = Some(e.to_string());
        }
        Err(e) => {
            metrics.write_failures += 1;
            metrics.last_error = Some(e.to_string());
        }
    }
}
