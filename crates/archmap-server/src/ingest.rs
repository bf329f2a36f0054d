// crates/archmap-server/src/ingest.rs
// ============================================================================
// Module: Archmap Ingestion Front
// Description: Validation and bounded per-tenant queueing ahead of the store.
// Purpose: Absorb bursts without blocking request threads; shed on overflow.
// Dependencies: archmap-core, tokio, tracing
// ============================================================================

//! ## Overview
//! The ingestion front validates spans and hands them to a bounded per-tenant
//! queue drained by a background writer into the span store. Request threads
//! never block on the durable flush: a saturated queue sheds the new span
//! with a retryable rejection. Correlation is by identifier, so ingestion
//! imposes no ordering across spans. A write failure is fatal to that span
//! only; it is logged and the writer continues.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use archmap_core::Span;
use archmap_core::SpanStore;
use archmap_core::TenantId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::ApiError;

// ============================================================================
// SECTION: Queue
// ============================================================================

/// Callback invoked after each durable write, keyed by tenant.
type WriteListener = Arc<dyn Fn(&TenantId) + Send + Sync>;

/// Bounded per-tenant ingest queue with a background writer per tenant.
///
/// # Invariants
/// - Queue capacity is fixed per tenant; overflow drops the newest span with
///   a retryable rejection.
/// - A runaway tenant saturates only its own queue.
pub struct IngestQueue {
    /// Destination store for durable writes.
    store: Arc<dyn SpanStore>,
    /// Per-tenant queue capacity.
    capacity: usize,
    /// Live senders keyed by tenant.
    senders: Mutex<HashMap<TenantId, mpsc::Sender<Span>>>,
    /// Listener notified after each durable write.
    write_listener: WriteListener,
}

impl IngestQueue {
    /// Creates the queue over a store with a per-tenant capacity.
    ///
    /// `write_listener` runs after every durable write (used for cache
    /// invalidation once the span is visible to queries).
    #[must_use]
    pub fn new(store: Arc<dyn SpanStore>, capacity: usize, write_listener: WriteListener) -> Self {
        Self {
            store,
            capacity,
            senders: Mutex::new(HashMap::new()),
            write_listener,
        }
    }

    /// Enqueues one validated span for durable write.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::QueueSaturated`] when the tenant queue is full and
    /// [`ApiError::Internal`] when the writer task is gone.
    pub fn enqueue(&self, tenant: &TenantId, span: Span) -> Result<(), ApiError> {
        let sender = self.sender_for(tenant)?;
        match sender.try_send(span) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ApiError::QueueSaturated),
            Err(TrySendError::Closed(_)) => {
                Err(ApiError::Internal("ingest writer stopped".to_string()))
            }
        }
    }

    /// Returns the tenant's sender, spawning its writer on first use.
    fn sender_for(&self, tenant: &TenantId) -> Result<mpsc::Sender<Span>, ApiError> {
        let mut senders = self
            .senders
            .lock()
            .map_err(|_| ApiError::Internal("ingest sender registry poisoned".to_string()))?;
        if let Some(sender) = senders.get(tenant) {
            return Ok(sender.clone());
        }
        let (sender, receiver) = mpsc::channel(self.capacity);
        tokio::spawn(drain_tenant_queue(
            Arc::clone(&self.store),
            tenant.clone(),
            receiver,
            Arc::clone(&self.write_listener),
        ));
        senders.insert(tenant.clone(), sender.clone());
        Ok(sender)
    }
}

/// Drains one tenant's queue into the store.
async fn drain_tenant_queue(
    store: Arc<dyn SpanStore>,
    tenant: TenantId,
    mut receiver: mpsc::Receiver<Span>,
    write_listener: WriteListener,
) {
    while let Some(span) = receiver.recv().await {
        let write_store = Arc::clone(&store);
        let write_tenant = tenant.clone();
        let span_id = span.span_id.clone();
        let written = tokio::task::spawn_blocking(move || {
            write_store.put(&write_tenant, &span)
        })
        .await;
        match written {
            Ok(Ok(_)) => write_listener(&tenant),
            Ok(Err(error)) => {
                tracing::error!(
                    tenant = %tenant,
                    span_id = %span_id,
                    error = %error,
                    "durable span write failed"
                );
            }
            Err(join_error) => {
                tracing::error!(
                    tenant = %tenant,
                    span_id = %span_id,
                    error = %join_error,
                    "ingest writer task failed"
                );
            }
        }
    }
}
