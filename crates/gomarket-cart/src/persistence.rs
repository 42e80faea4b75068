//! # Persistence Worker
//!
//! Writes cart snapshots to the key-value store in the background so that
//! mutations never wait on storage.
//!
//! ## Write Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Persistence Pipeline                              │
//! │                                                                         │
//! │  CartStore mutation (holding state lock)                               │
//! │       │  handle.persist(snapshot)                                      │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────┐                          │
//! │  │  unbounded mpsc: Persist(cart) | Flush   │  enqueue order =         │
//! │  └──────────────────┬───────────────────────┘  mutation order          │
//! │                     ▼                                                   │
//! │  PersistenceWorker::run                                                │
//! │    1. recv one request, drain the rest with try_recv                   │
//! │    2. keep only the newest snapshot (older ones are superseded)        │
//! │    3. storage.set(key, json), retrying transient errors with backoff;  │
//! │       snapshots queued during a retry replace the one being retried    │
//! │    4. on final failure: warn! + PersistenceFailure on broadcast        │
//! │    5. ack every Flush waiter collected along the way                   │
//! │                                                                         │
//! │  The loop ends when every CartStore handle (and so every sender)       │
//! │  has been dropped.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

use gomarket_core::Cart;
use gomarket_db::KeyValueStore;

use crate::config::PersistenceSettings;
use crate::error::{CartError, CartResult};

// =============================================================================
// Failure Reports
// =============================================================================

/// A cart write that could not be completed.
///
/// Published on [`crate::CartStore::persistence_errors`]. The in-memory cart
/// is unaffected; the next successful write brings storage back in line.
#[derive(Debug, Clone)]
pub struct PersistenceFailure {
    /// Storage key the write targeted.
    pub key: String,

    /// Rendered error from the last attempt.
    pub error: String,

    /// When the write was given up on.
    pub occurred_at: DateTime<Utc>,
}

// =============================================================================
// Handle
// =============================================================================

enum WriteRequest {
    Persist(Cart),
    Flush(oneshot::Sender<()>),
}

/// Sending side of the worker. Owned by the store.
#[derive(Debug, Clone)]
pub(crate) struct PersistenceHandle {
    tx: mpsc::UnboundedSender<WriteRequest>,
}

impl std::fmt::Debug for WriteRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteRequest::Persist(cart) => write!(f, "Persist({} items)", cart.len()),
            WriteRequest::Flush(_) => write!(f, "Flush"),
        }
    }
}

impl PersistenceHandle {
    /// Queues a snapshot for writing. Never blocks.
    pub(crate) fn persist(&self, cart: Cart) {
        if self.tx.send(WriteRequest::Persist(cart)).is_err() {
            warn!("Persistence worker is gone, cart snapshot dropped");
        }
    }

    /// Resolves once every snapshot queued before this call has been written
    /// or reported as failed.
    pub(crate) async fn flush(&self) -> CartResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WriteRequest::Flush(ack_tx))
            .map_err(|_| CartError::WorkerStopped)?;
        ack_rx.await.map_err(|_| CartError::WorkerStopped)
    }
}

/// Requests collected in one pass over the channel.
#[derive(Default)]
struct Batch {
    latest: Option<Cart>,
    waiters: Vec<oneshot::Sender<()>>,
    coalesced: usize,
}

impl Batch {
    fn absorb(&mut self, request: WriteRequest) {
        match request {
            WriteRequest::Persist(cart) => {
                if self.latest.replace(cart).is_some() {
                    self.coalesced += 1;
                }
            }
            WriteRequest::Flush(ack) => self.waiters.push(ack),
        }
    }

    fn ack(self) {
        for ack in self.waiters {
            // Waiter may have given up
            let _ = ack.send(());
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Background task that owns the write side of the storage key.
pub(crate) struct PersistenceWorker {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    settings: PersistenceSettings,
    rx: mpsc::UnboundedReceiver<WriteRequest>,
    errors: broadcast::Sender<PersistenceFailure>,
}

impl PersistenceWorker {
    /// Spawns the worker on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub(crate) fn spawn(
        storage: Arc<dyn KeyValueStore>,
        key: String,
        settings: PersistenceSettings,
        errors: broadcast::Sender<PersistenceFailure>,
    ) -> PersistenceHandle {
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = PersistenceWorker {
            storage,
            key,
            settings,
            rx,
            errors,
        };
        tokio::spawn(worker.run());

        PersistenceHandle { tx }
    }

    async fn run(mut self) {
        debug!(key = %self.key, "Persistence worker started");

        while let Some(first) = self.rx.recv().await {
            let mut batch = Batch::default();
            batch.absorb(first);
            self.drain(&mut batch);

            if batch.coalesced > 0 {
                debug!(coalesced = batch.coalesced, "Superseded cart snapshots skipped");
            }

            self.write(&mut batch).await;
            batch.ack();
        }

        debug!(key = %self.key, "Persistence worker stopped");
    }

    /// Moves everything already queued into `batch` without waiting.
    fn drain(&mut self, batch: &mut Batch) {
        while let Ok(request) = self.rx.try_recv() {
            batch.absorb(request);
        }
    }

    /// Writes the newest snapshot in `batch`. While a transient failure is
    /// being retried, snapshots queued in the meantime replace the one being
    /// retried.
    async fn write(&mut self, batch: &mut Batch) {
        let mut backoff = self.create_backoff();
        let mut attempt = 1u32;

        while let Some(cart) = batch.latest.take() {
            let json = match cart.to_json() {
                Ok(json) => json,
                Err(e) => {
                    self.report(e.to_string());
                    return;
                }
            };

            let err = match self.storage.set(&self.key, &json).await {
                Ok(()) => {
                    debug!(key = %self.key, items = cart.len(), attempt, "Cart persisted");
                    return;
                }
                Err(e) => e,
            };

            if !err.is_transient() {
                self.report(err.to_string());
                return;
            }

            let Some(delay) = backoff.as_mut().and_then(|b| b.next_backoff()) else {
                self.report(err.to_string());
                return;
            };

            debug!(attempt, ?delay, error = %err, "Cart write failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;

            self.drain(batch);
            if batch.latest.is_none() {
                batch.latest = Some(cart);
            }
        }
    }

    fn create_backoff(&self) -> Option<ExponentialBackoff> {
        let window = self.settings.retry_window()?;
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(50),
            max_interval: Duration::from_secs(1),
            multiplier: 2.0,
            max_elapsed_time: Some(window),
            ..Default::default()
        };
        // Start from initial_interval and restart the elapsed clock
        backoff.reset();
        Some(backoff)
    }

    fn report(&self, error: String) {
        warn!(key = %self.key, error = %error, "Failed to persist cart");

        let failure = PersistenceFailure {
            key: self.key.clone(),
            error,
            occurred_at: Utc::now(),
        };
        // No subscribers is fine
        let _ = self.errors.send(failure);
    }
}
