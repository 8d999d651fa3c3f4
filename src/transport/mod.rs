//! Transport capability seam.
//!
//! The pool never touches sockets itself. Establishing and closing
//! connections, framing, queue-entry encoding, and the actual byte I/O all
//! belong to the transport collaborator, consumed through the [`Transport`]
//! trait. Any conforming implementation is accepted.
//!
//! # Contract
//!
//! ```text
//! ┌──────────────┐   connect/close/send    ┌──────────────┐
//! │  ClientPool  │────────────────────────►│  Transport   │
//! │              │◄────────────────────────│  (sockets,   │
//! │              │   lifecycle signals      │   queues)    │
//! └──────────────┘   via dispatch()        └──────────────┘
//! ```
//!
//! The transport owns each connection's outgoing queue. [`take_queue`]
//! removes and returns all currently queued entries (the drain snapshot);
//! [`queue_len`] observes depth without mutating, for the statistics engine
//! and the post-drain completeness check.
//!
//! [`take_queue`]: Transport::take_queue
//! [`queue_len`]: Transport::queue_len

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::EndpointUrl;
use crate::message::{OutboundData, QueueEntry};

// ============================================================================
// Submodules
// ============================================================================

/// Scriptable in-memory transport for tests.
#[cfg(any(test, feature = "testkit"))]
pub mod mock;

#[cfg(any(test, feature = "testkit"))]
pub use mock::MockTransport;

// ============================================================================
// Transport
// ============================================================================

/// Capability set consumed from the transport collaborator.
///
/// All methods are best-effort from the pool's point of view: failures are
/// logged and surfaced through the transport's own error signaling, never
/// escalated into pool panics.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Requests a new connection to the endpoint.
    ///
    /// Completion is reported through a later `connected` signal; a failed
    /// attempt is reported through the transport's own failure signaling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the request
    /// itself cannot be issued.
    async fn connect(&self, url: &EndpointUrl) -> Result<()>;

    /// Forcibly closes the connection to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the close
    /// cannot be issued.
    async fn close(&self, url: &EndpointUrl) -> Result<()>;

    /// Submits transport-ready data for sending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the data
    /// cannot be submitted.
    async fn send(&self, data: OutboundData) -> Result<()>;

    /// Removes and returns all entries currently queued for the endpoint,
    /// oldest first.
    ///
    /// Entries enqueued concurrently with the call may be missed; they are
    /// picked up by a later drain pass.
    fn take_queue(&self, url: &EndpointUrl) -> Vec<QueueEntry>;

    /// Returns the current depth of the endpoint's outgoing queue.
    fn queue_len(&self, url: &EndpointUrl) -> usize;

    /// Decodes a queue entry into transport-ready data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueEntryParse`](crate::Error::QueueEntryParse) if
    /// the entry cannot be decoded.
    fn parse_queue_entry(&self, entry: QueueEntry) -> Result<OutboundData>;
}
