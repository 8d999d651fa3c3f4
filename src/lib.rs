//! socket-warden - Self-healing health tracking for socket connection pools.
//!
//! One logical client fans out to multiple remote endpoints over a transport
//! it does not own. This library watches the traffic, decides from observed
//! throughput alone when a connection has silently stalled despite being
//! nominally open, and recovers from that state without losing in-flight
//! work.
//!
//! # Architecture
//!
//! ```text
//!  traffic ──► Health Statistics Engine ──► hanging? ──► Recovery
//!     ▲                                                    │
//!     │            drain → close → discard → reconnect     │
//!     └────────────────── new traffic ◄────────────────────┘
//! ```
//!
//! A closed feedback loop: every completed unit of work updates a
//! per-connection statistics record; a backlog-weighted pending rate is
//! compared against a smoothed throughput baseline; sustained, growing
//! overflow past a latched cycle threshold emits a `hanging` signal; the
//! recovery controller drains the pending queue, tears the connection down,
//! and requests a reconnect.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use socket_warden::{ClientPool, EndpointUrl, Signal};
//!
//! let pool = ClientPool::builder(transport).build()?;
//! let url = EndpointUrl::parse("tcp://10.0.0.7:9300")?;
//!
//! // Wire transport lifecycle signals into the pool.
//! pool.dispatch(Signal::Connected(url.clone()));
//!
//! // Report each completed unit of outbound work.
//! pool.record_unit_of_work(&url, payload);
//!
//! // Observe hang emissions alongside the built-in recovery.
//! pool.set_hanging_handler(Box::new(|url| eprintln!("hanging: {url}")));
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | [`EndpointUrl`] endpoint key |
//! | [`message`] | Opaque queue-entry / outbound-data wrappers |
//! | [`pool`] | [`ClientPool`], membership, connection records |
//! | [`recovery`] | Pending-message drain and hang recovery |
//! | [`signal`] | Lifecycle signals and callback seams |
//! | [`stats`] | Health statistics engine and snapshots |
//! | [`transport`] | [`Transport`] capability seam |
//!
//! # Scope
//!
//! The transport itself — sockets, framing, queue-entry encoding, reconnect
//! failure reporting — is an external collaborator behind the [`Transport`]
//! trait. This crate owns no wire or disk format, keeps no statistics across
//! process restarts, and diagnoses *that* a connection hangs, never *why*.

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for pool entities.
pub mod identifiers;

/// Opaque message payload wrappers.
pub mod message;

/// Connection pool ownership and lifecycle intake.
pub mod pool;

/// Pending-message drain and hang recovery.
pub mod recovery;

/// Lifecycle signals and callback seams.
pub mod signal;

/// Per-connection health statistics and hang detection.
pub mod stats;

/// Transport capability seam.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::EndpointUrl;

// Message types
pub use message::{OutboundData, QueueEntry};

// Pool types
pub use pool::{ClientPool, ClientPoolBuilder, ConnectionSnapshot, PoolSnapshot};

// Signal types
pub use signal::{HangingHandler, Signal};

// Stats types
pub use stats::{ClientSnapshot, DetectionTuning, HealthStats, StatsSnapshot};

// Transport seam
pub use transport::Transport;

#[cfg(feature = "testkit")]
pub use transport::MockTransport;
