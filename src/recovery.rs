//! Pending-message drain and hang recovery.
//!
//! Two paths converge here:
//!
//! - **Disconnect**: the endpoint goes inactive, then after a settle delay
//!   the stale connection's queue is drained — each pending entry is decoded
//!   and resubmitted to the transport in FIFO order.
//! - **Hang**: the detector (or the transport) flagged a connection that is
//!   nominally open but making no progress. The queue is drained
//!   immediately, the connection is forcibly closed, its record discarded,
//!   and a single reconnect issued. The next `connected` signal rebuilds the
//!   record with fresh statistics.
//!
//! Both sequences are fire-and-forget: the caller is never blocked, and
//! failures degrade to warnings — the transport's own signaling owns retry
//! semantics beyond the one reconnect request.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, warn};

use crate::identifiers::EndpointUrl;
use crate::pool::ClientPool;

// ============================================================================
// ClientPool - Drainer
// ============================================================================

impl ClientPool {
    /// Drains an endpoint's pending queue, resubmitting each entry to the
    /// transport in FIFO order.
    ///
    /// Order matters: later entries may depend on earlier ones having been
    /// sent first on the same logical stream. Entries that fail to decode or
    /// send are logged and skipped; the pass never aborts. Entries enqueued
    /// concurrently with the pass are left for a later drain trigger — a
    /// non-empty queue after the pass is reported as a warning, nothing
    /// more.
    pub async fn drain(&self, url: &EndpointUrl) {
        let entries = self.transport().take_queue(url);
        if entries.is_empty() {
            return;
        }

        debug!(url = %url, pending = entries.len(), "Draining pending queue");

        for entry in entries {
            let data = match self.transport().parse_queue_entry(entry) {
                Ok(data) => data,
                Err(e) => {
                    warn!(url = %url, error = %e, "Skipping undecodable queue entry");
                    continue;
                }
            };

            if let Err(e) = self.transport().send(data).await {
                warn!(url = %url, error = %e, "Resubmission failed");
            }
        }

        let remaining = self.transport().queue_len(url);
        if remaining > 0 {
            warn!(url = %url, remaining, "Queue not empty after drain pass");
        }
    }

    /// Schedules a drain after the settle delay.
    ///
    /// Deferred, not blocking: the caller returns immediately and other
    /// endpoints' events keep flowing during the delay.
    pub(crate) fn schedule_drain(&self, url: EndpointUrl) {
        let Some(pool) = self.shared() else {
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(pool.settle_delay()).await;
            pool.drain(&url).await;
        });
    }
}

// ============================================================================
// ClientPool - Recovery Controller
// ============================================================================

impl ClientPool {
    /// Spawns the fire-and-forget recovery sequence for an endpoint.
    pub(crate) fn spawn_recovery(&self, url: EndpointUrl) {
        let Some(pool) = self.shared() else {
            return;
        };
        tokio::spawn(async move {
            pool.recover(&url).await;
        });
    }

    /// Recovers a hanging connection: drain, close, discard, reconnect.
    ///
    /// The connection record is discarded entirely — statistics are not
    /// carried forward. Exactly one reconnect is requested; if that attempt
    /// fails, the transport reports it through its own failure signaling.
    pub async fn recover(&self, url: &EndpointUrl) {
        info!(url = %url, "Recovering hanging connection");

        self.set_active(url, false);

        self.drain(url).await;

        if let Err(e) = self.transport().close(url).await {
            warn!(url = %url, error = %e, "Close failed during recovery");
        }

        self.discard_record(url);

        if let Err(e) = self.transport().connect(url).await {
            warn!(url = %url, error = %e, "Reconnect request failed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::message::{OutboundData, QueueEntry};
    use crate::signal::Signal;
    use crate::transport::{MockTransport, Transport};

    fn url(n: u16) -> EndpointUrl {
        EndpointUrl::parse(format!("tcp://host-{n}:9000")).unwrap()
    }

    fn pool_with_mock() -> (Arc<ClientPool>, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let pool = ClientPool::builder(transport.clone())
            .build()
            .expect("pool build");
        (pool, transport)
    }

    #[tokio::test]
    async fn test_drain_empty_queue_is_noop() {
        let (pool, transport) = pool_with_mock();
        let a = url(1);

        pool.drain(&a).await;

        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_drain_sends_fifo() {
        let (pool, transport) = pool_with_mock();
        let a = url(1);

        for i in 0..4 {
            transport.push_entry(&a, QueueEntry::new(json!(i)));
        }

        pool.drain(&a).await;

        let sent = transport.sent();
        assert_eq!(
            sent,
            (0..4).map(|i| OutboundData::new(json!(i))).collect::<Vec<_>>()
        );
        assert_eq!(transport.queue_len(&a), 0);
    }

    #[tokio::test]
    async fn test_drain_skips_undecodable_entries() {
        let (pool, transport) = pool_with_mock();
        let a = url(1);

        transport.push_entry(&a, QueueEntry::new(json!("garbled")));
        transport.fail_parse(true);

        pool.drain(&a).await;

        assert!(transport.sent().is_empty());
        assert_eq!(transport.queue_len(&a), 0);
    }

    #[tokio::test]
    async fn test_drain_tolerates_concurrent_enqueue() {
        let (pool, transport) = pool_with_mock();
        let a = url(1);

        transport.push_entry(&a, QueueEntry::new(json!("old")));
        transport.refill_after_take(&a, vec![QueueEntry::new(json!("late"))]);

        pool.drain(&a).await;

        // The late entry is left for the next drain pass.
        assert_eq!(transport.sent(), vec![OutboundData::new(json!("old"))]);
        assert_eq!(transport.queue_len(&a), 1);

        pool.drain(&a).await;
        assert_eq!(transport.queue_len(&a), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_drains_after_settle_delay() {
        let (pool, transport) = pool_with_mock();
        let b = url(2);

        pool.dispatch(Signal::Connected(b.clone()));
        transport.push_entry(&b, QueueEntry::new(json!("m1")));
        transport.push_entry(&b, QueueEntry::new(json!("m2")));

        pool.dispatch(Signal::Disconnected(b.clone()));

        // Nothing is drained before the settle delay elapses.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(transport.sent().is_empty());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(transport.sent().len(), 2);
        assert_eq!(transport.queue_len(&b), 0);
    }

    #[tokio::test]
    async fn test_recover_sequence() {
        let (pool, transport) = pool_with_mock();
        let c = url(3);

        pool.dispatch(Signal::Connected(c.clone()));
        transport.push_entry(&c, QueueEntry::new(json!("pending")));

        pool.recover(&c).await;

        assert!(!pool.is_active(&c));
        assert_eq!(pool.record_count(), 0);
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.closes(), vec![c.clone()]);
        assert_eq!(transport.connects(), vec![c]);
    }

    #[tokio::test]
    async fn test_transport_hanging_signal_triggers_recovery() {
        let (pool, transport) = pool_with_mock();
        let c = url(3);

        pool.dispatch(Signal::Connected(c.clone()));
        pool.dispatch(Signal::Hanging(c.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!pool.is_active(&c));
        assert_eq!(pool.record_count(), 0);
        assert_eq!(transport.connects(), vec![c]);
    }

    #[tokio::test]
    async fn test_recovery_survives_send_failures() {
        let (pool, transport) = pool_with_mock();
        let c = url(3);

        pool.dispatch(Signal::Connected(c.clone()));
        transport.push_entry(&c, QueueEntry::new(json!("doomed")));
        transport.fail_send(true);

        pool.recover(&c).await;

        // Failures degrade to warnings; the sequence still completes.
        assert_eq!(transport.connects(), vec![c]);
        assert_eq!(pool.record_count(), 0);
    }
}
