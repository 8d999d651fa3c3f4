//! Connection pool ownership and lifecycle intake.
//!
//! [`ClientPool`] owns every piece of shared state in the crate: the
//! per-endpoint connection records, the active-membership set, and the
//! process-lifetime aggregate counters. The transport capability set is
//! injected at construction; nothing here is a shared mutable template.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ClientPool                   │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ url A → ConnectionRecord (HealthStats) │  │
//! │  │ url B → ConnectionRecord (HealthStats) │  │
//! │  └────────────────────────────────────────┘  │
//! │  Membership: [A, B]     ClientStats (global) │
//! └──────────────────────────────────────────────┘
//!          ▲ dispatch(signal)    ▲ record_unit_of_work
//! ```
//!
//! Traffic drives the statistics engine, which may emit a `hanging` signal;
//! the recovery controller (see [`crate::recovery`]) consumes it and issues
//! a reconnect, closing the feedback loop.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::EndpointUrl;
use crate::signal::{HangingHandler, Signal};
use crate::stats::{ClientSnapshot, ClientStats, DetectionTuning, StatsSnapshot};
use crate::transport::Transport;

// ============================================================================
// Submodules
// ============================================================================

/// Active-endpoint membership tracking.
pub mod membership;

/// Per-endpoint connection record.
pub mod record;

pub use membership::Membership;
pub use record::ConnectionRecord;

// ============================================================================
// Constants
// ============================================================================

/// Default settle delay between a disconnect and the deferred drain.
///
/// Gives in-flight operations time to land before their entries are
/// resubmitted.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

// ============================================================================
// ClientPoolBuilder
// ============================================================================

/// Builder for configuring a [`ClientPool`].
///
/// Use [`ClientPool::builder()`] to create one.
///
/// # Example
///
/// ```ignore
/// let pool = ClientPool::builder(transport)
///     .settle_delay(Duration::from_millis(500))
///     .overflow_factor(3.0)
///     .build()?;
/// ```
pub struct ClientPoolBuilder {
    transport: Arc<dyn Transport>,
    settle_delay: Duration,
    tuning: DetectionTuning,
}

impl ClientPoolBuilder {
    /// Creates a builder with default tuning.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            settle_delay: DEFAULT_SETTLE_DELAY,
            tuning: DetectionTuning::default(),
        }
    }

    /// Sets the settle delay between disconnect and deferred drain.
    #[inline]
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the overflow threshold as a multiple of smoothed throughput.
    #[inline]
    #[must_use]
    pub fn overflow_factor(mut self, factor: f64) -> Self {
        self.tuning.overflow_factor = factor;
        self
    }

    /// Sets the weight applied to queued entries in the pending rate.
    #[inline]
    #[must_use]
    pub fn queue_weight(mut self, weight: f64) -> Self {
        self.tuning.queue_weight = weight;
        self
    }

    /// Sets the cycles added to the queue depth when latching the hang
    /// threshold.
    #[inline]
    #[must_use]
    pub fn hang_cycle_margin(mut self, margin: u32) -> Self {
        self.tuning.hang_cycle_margin = margin;
        self
    }

    /// Builds the pool with validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a tuning value is non-finite or
    /// non-positive where a positive value is required.
    pub fn build(self) -> Result<Arc<ClientPool>> {
        if !self.tuning.overflow_factor.is_finite() || self.tuning.overflow_factor <= 0.0 {
            return Err(Error::config("overflow_factor must be finite and > 0"));
        }
        if !self.tuning.queue_weight.is_finite() || self.tuning.queue_weight < 0.0 {
            return Err(Error::config("queue_weight must be finite and >= 0"));
        }

        let pool = Arc::new_cyclic(|self_ref| ClientPool {
            self_ref: self_ref.clone(),
            transport: self.transport,
            records: RwLock::new(FxHashMap::default()),
            membership: Mutex::new(Membership::new()),
            aggregate: Mutex::new(ClientStats::new()),
            hanging_handler: Mutex::new(None),
            settle_delay: self.settle_delay,
            tuning: self.tuning,
        });

        info!(
            settle_delay_ms = pool.settle_delay.as_millis() as u64,
            "ClientPool created"
        );

        Ok(pool)
    }
}

// ============================================================================
// ClientPool
// ============================================================================

/// Pool of outbound connections with health tracking and self-healing.
///
/// Constructed as `Arc<Self>` so deferred drains and recovery sequences can
/// run as spawned tasks holding the pool.
///
/// # Thread Safety
///
/// `ClientPool` is `Send + Sync`. Per-connection state is serialized by the
/// pool's locks; handlers run to completion without preemption. Records for
/// different endpoints are independent.
pub struct ClientPool {
    /// Back-reference for spawned drain and recovery tasks.
    self_ref: Weak<ClientPool>,

    /// Injected transport capability set.
    transport: Arc<dyn Transport>,

    /// Connection records by endpoint URL.
    records: RwLock<FxHashMap<EndpointUrl, ConnectionRecord>>,

    /// Ordered set of active endpoints.
    membership: Mutex<Membership>,

    /// Process-lifetime aggregate counters.
    aggregate: Mutex<ClientStats>,

    /// Host-registered hang observer.
    hanging_handler: Mutex<Option<HangingHandler>>,

    /// Delay between disconnect and deferred drain.
    settle_delay: Duration,

    /// Hang-detection constants.
    tuning: DetectionTuning,
}

impl ClientPool {
    /// Creates a builder for a pool over the given transport.
    #[must_use]
    pub fn builder(transport: Arc<dyn Transport>) -> ClientPoolBuilder {
        ClientPoolBuilder::new(transport)
    }

    /// Returns the configured settle delay.
    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    #[inline]
    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Upgrades the self-reference for a spawned task.
    ///
    /// `None` only during teardown, once every external handle is gone.
    pub(crate) fn shared(&self) -> Option<Arc<ClientPool>> {
        self.self_ref.upgrade()
    }
}

// ============================================================================
// ClientPool - Signal Intake
// ============================================================================

impl ClientPool {
    /// Routes a transport lifecycle signal to its handler.
    ///
    /// `Connected` and `Disconnected` complete synchronously apart from the
    /// deferred drain; `Hanging` spawns the fire-and-forget recovery
    /// sequence and returns immediately.
    pub fn dispatch(&self, signal: Signal) {
        match signal {
            Signal::Connected(url) => self.handle_connected(url),
            Signal::Disconnected(url) => self.handle_disconnected(url),
            Signal::Hanging(url) => self.spawn_recovery(url),
        }
    }

    /// Registers a host observer for hang emissions.
    ///
    /// Emissions can repeat while a hang condition persists; the handler
    /// must be idempotent or rate-limit itself.
    pub fn set_hanging_handler(&self, handler: HangingHandler) {
        let mut guard = self.hanging_handler.lock();
        *guard = Some(handler);
    }

    /// Clears the hang observer.
    pub fn clear_hanging_handler(&self) {
        let mut guard = self.hanging_handler.lock();
        *guard = None;
    }

    /// Handles a `connected` signal: marks the endpoint active and creates
    /// a fresh record if none exists. Idempotent.
    fn handle_connected(&self, url: EndpointUrl) {
        self.membership.lock().set_active(&url, true);

        let mut records = self.records.write();
        if !records.contains_key(&url) {
            debug!(url = %url, "Connection record created");
            records.insert(url.clone(), ConnectionRecord::new(url));
        }
    }

    /// Handles a `disconnected` signal: marks the endpoint inactive and
    /// schedules the settle-delayed drain. The record survives so a
    /// reconnect resumes its history.
    fn handle_disconnected(&self, url: EndpointUrl) {
        self.membership.lock().set_active(&url, false);
        debug!(url = %url, "Endpoint marked inactive");

        self.schedule_drain(url);
    }

    /// Emits a `hanging` signal: notifies the host observer, then spawns
    /// the recovery sequence.
    pub(crate) fn emit_hanging(&self, url: &EndpointUrl) {
        warn!(url = %url, "Hanging connection detected");

        let handler = self.hanging_handler.lock();
        if let Some(ref handler) = *handler {
            handler(url);
        }
        drop(handler);

        self.spawn_recovery(url.clone());
    }
}

// ============================================================================
// ClientPool - Work Accounting
// ============================================================================

impl ClientPool {
    /// Records one completed unit of outbound work for an endpoint.
    ///
    /// Call once per unit of work. Updates the global aggregate and the
    /// endpoint's health statistics, and emits a `hanging` signal when the
    /// detector fires. Work for an endpoint without a record (not yet
    /// connected, or torn down by recovery) updates only the aggregate.
    pub fn record_unit_of_work(&self, url: &EndpointUrl, payload: Value) {
        let now = Instant::now();

        self.aggregate.lock().record(now);

        let queue_len = self.transport.queue_len(url);
        let hang = {
            let mut records = self.records.write();
            match records.get_mut(url) {
                Some(record) => record
                    .stats_mut()
                    .observe(now, queue_len, payload, &self.tuning),
                None => {
                    debug!(url = %url, "Work observed for endpoint without a record");
                    false
                }
            }
        };

        if hang {
            self.emit_hanging(url);
        }
    }
}

// ============================================================================
// ClientPool - Accessors
// ============================================================================

impl ClientPool {
    /// Returns the active endpoints in insertion order.
    #[must_use]
    pub fn active_endpoints(&self) -> Vec<EndpointUrl> {
        self.membership.lock().as_slice().to_vec()
    }

    /// Returns whether the endpoint is currently active.
    #[must_use]
    pub fn is_active(&self, url: &EndpointUrl) -> bool {
        self.membership.lock().contains(url)
    }

    /// Returns the number of connection records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }

    /// Returns a snapshot of one endpoint's health statistics.
    #[must_use]
    pub fn stats(&self, url: &EndpointUrl) -> Option<StatsSnapshot> {
        self.records.read().get(url).map(ConnectionRecord::snapshot)
    }

    /// Returns a snapshot of the process-lifetime aggregate.
    #[must_use]
    pub fn client_stats(&self) -> ClientSnapshot {
        self.aggregate.lock().snapshot()
    }

    /// Takes a full diagnostic snapshot of the pool.
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        let connections = {
            let records = self.records.read();
            let mut connections: Vec<_> = records
                .values()
                .map(|record| ConnectionSnapshot {
                    url: record.url().clone(),
                    stats: record.snapshot(),
                })
                .collect();
            connections.sort_by(|a, b| a.url.cmp(&b.url));
            connections
        };

        PoolSnapshot {
            client: self.client_stats(),
            active: self.active_endpoints(),
            connections,
        }
    }
}

// ============================================================================
// ClientPool - Internal State Access
// ============================================================================

impl ClientPool {
    /// Marks an endpoint active or inactive in the membership set.
    pub(crate) fn set_active(&self, url: &EndpointUrl, active: bool) {
        self.membership.lock().set_active(url, active);
    }

    /// Discards an endpoint's connection record, if any.
    ///
    /// Stats are not carried forward; the next `connected` signal creates a
    /// fresh record.
    pub(crate) fn discard_record(&self, url: &EndpointUrl) -> bool {
        let removed = self.records.write().remove(url);
        if removed.is_some() {
            debug!(url = %url, "Connection record discarded");
        }
        removed.is_some()
    }
}

// ============================================================================
// Snapshots
// ============================================================================

/// One endpoint's entry in a [`PoolSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSnapshot {
    /// The endpoint.
    pub url: EndpointUrl,
    /// Its health statistics.
    pub stats: StatsSnapshot,
}

/// Full diagnostic snapshot of the pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    /// Process-lifetime aggregate.
    pub client: ClientSnapshot,
    /// Active endpoints in insertion order.
    pub active: Vec<EndpointUrl>,
    /// Per-endpoint statistics, ordered by URL.
    pub connections: Vec<ConnectionSnapshot>,
}

// ============================================================================
// Tests
// ============================================================================
