//! Opaque message payload wrappers.
//!
//! Queue-entry encoding belongs to the transport collaborator; this crate
//! only moves payloads between the queue and the wire. The wrappers keep the
//! two directions from being confused:
//!
//! - [`QueueEntry`] — an entry as it sits in a connection's outgoing queue.
//! - [`OutboundData`] — transport-ready data produced by
//!   [`Transport::parse_queue_entry`](crate::transport::Transport::parse_queue_entry).

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// QueueEntry
// ============================================================================

/// A single entry in a connection's outgoing queue.
///
/// Treated as opaque by the pool; only the transport knows how to decode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueEntry(Value);

impl QueueEntry {
    /// Wraps a raw queue entry value.
    #[inline]
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the raw entry value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consumes the entry, returning the raw value.
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for QueueEntry {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// ============================================================================
// OutboundData
// ============================================================================

/// Transport-ready data decoded from a [`QueueEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutboundData(Value);

impl OutboundData {
    /// Wraps decoded transport-ready data.
    #[inline]
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the raw data value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consumes the wrapper, returning the raw value.
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for OutboundData {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_queue_entry_roundtrip() {
        let entry = QueueEntry::new(json!({"seq": 7, "body": "ping"}));
        let encoded = serde_json::to_string(&entry).expect("serialize");
        assert_eq!(encoded, r#"{"body":"ping","seq":7}"#);
    }

    #[test]
    fn test_outbound_data_preserves_value() {
        let data = OutboundData::new(json!([1, 2, 3]));
        assert_eq!(data.into_value(), json!([1, 2, 3]));
    }
}
