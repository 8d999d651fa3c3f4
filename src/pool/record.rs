//! Per-endpoint connection record.

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::EndpointUrl;
use crate::stats::{HealthStats, StatsSnapshot};

// ============================================================================
// ConnectionRecord
// ============================================================================

/// Per-endpoint state owned exclusively by the pool.
///
/// Created when the endpoint's `connected` signal arrives; discarded when
/// the recovery controller tears the connection down or the endpoint is
/// permanently removed. The outgoing queue lives in the transport, not here.
#[derive(Debug)]
pub struct ConnectionRecord {
    url: EndpointUrl,
    stats: HealthStats,
}

impl ConnectionRecord {
    /// Creates a record with freshly initialized stats.
    #[must_use]
    pub fn new(url: EndpointUrl) -> Self {
        Self {
            url,
            stats: HealthStats::new(),
        }
    }

    /// Returns the endpoint this record tracks.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &EndpointUrl {
        &self.url
    }

    /// Returns the record's health statistics.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &HealthStats {
        &self.stats
    }

    /// Returns the record's health statistics for mutation.
    ///
    /// Only the statistics engine goes through this.
    #[inline]
    pub(crate) fn stats_mut(&mut self) -> &mut HealthStats {
        &mut self.stats
    }

    /// Takes a serializable snapshot of the record's stats.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

// ============================================================================
// Tests
// ============================================================================
