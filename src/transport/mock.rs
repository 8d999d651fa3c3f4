//! Scriptable in-memory transport for tests.
//!
//! Records every call the pool makes and exposes per-endpoint queues that
//! tests fill by hand. Enabled for the crate's own tests and, behind the
//! `testkit` feature, for downstream integration tests.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::identifiers::EndpointUrl;
use crate::message::{OutboundData, QueueEntry};
use crate::transport::Transport;

// ============================================================================
// MockTransport
// ============================================================================

/// In-memory [`Transport`] double.
///
/// Queue entries decode to themselves (`parse_queue_entry` is the identity)
/// unless parse failures are scripted. Connect/close/send calls are recorded
/// in order.
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    queues: FxHashMap<EndpointUrl, VecDeque<QueueEntry>>,
    sent: Vec<OutboundData>,
    connects: Vec<EndpointUrl>,
    closes: Vec<EndpointUrl>,
    fail_parse: bool,
    fail_send: bool,
    /// Entries appended to an endpoint's queue right after `take_queue`,
    /// simulating a concurrent enqueue during a drain pass.
    refill_after_take: FxHashMap<EndpointUrl, Vec<QueueEntry>>,
}

impl MockTransport {
    /// Creates an empty mock transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry to an endpoint's outgoing queue.
    pub fn push_entry(&self, url: &EndpointUrl, entry: QueueEntry) {
        self.state
            .lock()
            .queues
            .entry(url.clone())
            .or_default()
            .push_back(entry);
    }

    /// Scripts entries to appear right after the next `take_queue`,
    /// simulating concurrent enqueue during a drain.
    pub fn refill_after_take(&self, url: &EndpointUrl, entries: Vec<QueueEntry>) {
        self.state
            .lock()
            .refill_after_take
            .insert(url.clone(), entries);
    }

    /// Makes every `parse_queue_entry` call fail.
    pub fn fail_parse(&self, fail: bool) {
        self.state.lock().fail_parse = fail;
    }

    /// Makes every `send` call fail.
    pub fn fail_send(&self, fail: bool) {
        self.state.lock().fail_send = fail;
    }

    /// Returns all data submitted through `send`, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundData> {
        self.state.lock().sent.clone()
    }

    /// Returns all endpoints `connect` was issued for, in order.
    #[must_use]
    pub fn connects(&self) -> Vec<EndpointUrl> {
        self.state.lock().connects.clone()
    }

    /// Returns all endpoints `close` was issued for, in order.
    #[must_use]
    pub fn closes(&self) -> Vec<EndpointUrl> {
        self.state.lock().closes.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, url: &EndpointUrl) -> Result<()> {
        self.state.lock().connects.push(url.clone());
        Ok(())
    }

    async fn close(&self, url: &EndpointUrl) -> Result<()> {
        self.state.lock().closes.push(url.clone());
        Ok(())
    }

    async fn send(&self, data: OutboundData) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_send {
            return Err(Error::transport("scripted send failure"));
        }
        state.sent.push(data);
        Ok(())
    }

    fn take_queue(&self, url: &EndpointUrl) -> Vec<QueueEntry> {
        let mut state = self.state.lock();
        let taken = state
            .queues
            .get_mut(url)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default();

        if let Some(refill) = state.refill_after_take.remove(url) {
            state.queues.entry(url.clone()).or_default().extend(refill);
        }

        taken
    }

    fn queue_len(&self, url: &EndpointUrl) -> usize {
        self.state
            .lock()
            .queues
            .get(url)
            .map_or(0, VecDeque::len)
    }

    fn parse_queue_entry(&self, entry: QueueEntry) -> Result<OutboundData> {
        if self.state.lock().fail_parse {
            return Err(Error::queue_entry_parse("scripted parse failure"));
        }
        Ok(OutboundData::new(entry.into_value()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let transport = MockTransport::new();
        let url = EndpointUrl::parse("tcp://host:1").unwrap();

        transport.connect(&url).await.unwrap();
        transport.close(&url).await.unwrap();
        transport
            .send(OutboundData::new(json!("payload")))
            .await
            .unwrap();

        assert_eq!(transport.connects(), vec![url.clone()]);
        assert_eq!(transport.closes(), vec![url]);
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn test_take_queue_empties_in_fifo_order() {
        let transport = MockTransport::new();
        let url = EndpointUrl::parse("tcp://host:1").unwrap();

        transport.push_entry(&url, QueueEntry::new(json!(1)));
        transport.push_entry(&url, QueueEntry::new(json!(2)));
        assert_eq!(transport.queue_len(&url), 2);

        let taken = transport.take_queue(&url);
        assert_eq!(taken, vec![QueueEntry::new(json!(1)), QueueEntry::new(json!(2))]);
        assert_eq!(transport.queue_len(&url), 0);
    }

    #[test]
    fn test_refill_simulates_concurrent_enqueue() {
        let transport = MockTransport::new();
        let url = EndpointUrl::parse("tcp://host:1").unwrap();

        transport.push_entry(&url, QueueEntry::new(json!("old")));
        transport.refill_after_take(&url, vec![QueueEntry::new(json!("late"))]);

        let taken = transport.take_queue(&url);
        assert_eq!(taken.len(), 1);
        assert_eq!(transport.queue_len(&url), 1);
    }
}
