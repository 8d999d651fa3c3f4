//! Lifecycle signals and callback seams.
//!
//! The transport collaborator delivers three lifecycle signals to the core:
//! `connected`, `disconnected`, and `hanging`. They arrive here as a typed
//! [`Signal`] handed to [`ClientPool::dispatch`], decoupled from any specific
//! event-loop implementation.
//!
//! The core emits its own `hanging` signal when the detector fires; hosts
//! observe it through a [`HangingHandler`] registered on the pool.
//!
//! [`ClientPool::dispatch`]: crate::pool::ClientPool::dispatch

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::EndpointUrl;

// ============================================================================
// Types
// ============================================================================

/// Hanging-signal callback type.
///
/// Called once per hang emission with the affected endpoint. Emissions can
/// repeat while the hang condition persists, so handlers must be idempotent
/// or rate-limit themselves.
pub type HangingHandler = Box<dyn Fn(&EndpointUrl) + Send + Sync>;

// ============================================================================
// Signal
// ============================================================================

/// A transport lifecycle signal delivered to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A connection to the endpoint was established.
    Connected(EndpointUrl),
    /// The connection to the endpoint was lost.
    Disconnected(EndpointUrl),
    /// The transport itself believes the connection is hanging.
    Hanging(EndpointUrl),
}

impl Signal {
    /// Returns the endpoint the signal refers to.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &EndpointUrl {
        match self {
            Self::Connected(url) | Self::Disconnected(url) | Self::Hanging(url) => url,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_url() {
        let url = EndpointUrl::parse("tcp://host:9000").unwrap();
        assert_eq!(Signal::Connected(url.clone()).url(), &url);
        assert_eq!(Signal::Disconnected(url.clone()).url(), &url);
        assert_eq!(Signal::Hanging(url.clone()).url(), &url);
    }
}
