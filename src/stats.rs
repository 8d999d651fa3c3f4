//! Per-connection health statistics and hang detection.
//!
//! This module is the heart of the crate: it turns a stream of observed
//! units of work into a verdict about whether a connection has silently
//! stalled while remaining nominally open.
//!
//! # Detection Model
//!
//! A pure throughput threshold misfires under bursty-but-healthy load.
//! Instead, every sample compares a *backlog-weighted* pending rate against
//! a *smoothed* historical throughput baseline:
//!
//! ```text
//! pending_rate   = (request_count + queue_len * queue_weight) / uptime_ms
//! throughput     = request_count / uptime_ms
//! throughput_avg = (throughput_avg + throughput) / 2
//! overflow       = pending_rate > throughput_avg * overflow_factor
//! ```
//!
//! A connection is flagged hanging only when the overflow is *sustained*
//! (consecutive overflow samples exceed a cycle threshold latched from the
//! queue depth at the first overflow) *and* the pending rate is still
//! growing. Transient bursts clear the overflow and reset all counters.

// ============================================================================
// Imports
// ============================================================================

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

// ============================================================================
// Constants
// ============================================================================

/// Weight applied to queued entries in the pending rate.
///
/// One queued entry counts as ten completed requests: backlog is a much
/// stronger stall indicator than slow throughput.
pub const DEFAULT_QUEUE_WEIGHT: f64 = 10.0;

/// Overflow threshold as a multiple of the smoothed throughput.
pub const DEFAULT_OVERFLOW_FACTOR: f64 = 2.0;

/// Cycles added to the queue depth when latching the hang threshold.
pub const DEFAULT_HANG_CYCLE_MARGIN: u32 = 10;

/// Minimum uptime used in rate divisions.
///
/// Guards against zero (or clock-skewed negative) uptime on the very first
/// samples after a connection is created.
const MIN_UPTIME_MS: f64 = 1.0;

// ============================================================================
// DetectionTuning
// ============================================================================

/// Tunable constants for the hang-detection heuristic.
///
/// Defaults reproduce the canonical behavior; override through
/// [`ClientPoolBuilder`](crate::pool::ClientPoolBuilder) only when the
/// workload's burst profile demands it.
#[derive(Debug, Clone, Copy)]
pub struct DetectionTuning {
    /// Weight applied to queued entries in the pending rate.
    pub queue_weight: f64,
    /// Overflow threshold as a multiple of the smoothed throughput.
    pub overflow_factor: f64,
    /// Cycles added to the queue depth when latching the hang threshold.
    pub hang_cycle_margin: u32,
}

impl Default for DetectionTuning {
    fn default() -> Self {
        Self {
            queue_weight: DEFAULT_QUEUE_WEIGHT,
            overflow_factor: DEFAULT_OVERFLOW_FACTOR,
            hang_cycle_margin: DEFAULT_HANG_CYCLE_MARGIN,
        }
    }
}

// ============================================================================
// HealthStats
// ============================================================================

/// Per-connection throughput and overflow metrics.
///
/// Owned by a connection record and mutated only through [`observe`], once
/// per completed unit of outbound work. Discarded (never carried forward)
/// when the connection is torn down by recovery.
///
/// [`observe`]: HealthStats::observe
#[derive(Debug, Clone)]
pub struct HealthStats {
    /// When tracking began for this connection.
    start_time: Instant,
    /// Units of work observed.
    request_count: u64,
    /// Exponentially smoothed requests per millisecond.
    throughput_avg: f64,
    /// Backlog growth rate currently exceeds the smoothed baseline.
    pending_overflow: bool,
    /// Overflow rate strictly kept rising since the previous sample.
    pending_overflow_growing: bool,
    /// Consecutive overflow samples.
    hanging_cycles: u32,
    /// Cycle threshold latched at the first overflow sample; 0 when clear.
    max_hanging_cycles: u32,
    /// Previous sample's pending rate, for the growth comparison.
    old_pending_rate: f64,
    /// Most recently observed payload (diagnostic only).
    last_request: Option<Value>,
}

impl HealthStats {
    /// Creates fresh stats with tracking starting now.
    #[must_use]
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    /// Creates fresh stats with an explicit tracking start.
    ///
    /// Back-dating the start lets tests replay uptime-sensitive scenarios.
    #[must_use]
    pub fn started_at(start_time: Instant) -> Self {
        Self {
            start_time,
            request_count: 0,
            throughput_avg: 0.0,
            pending_overflow: false,
            pending_overflow_growing: false,
            hanging_cycles: 0,
            max_hanging_cycles: 0,
            old_pending_rate: 0.0,
            last_request: None,
        }
    }

    /// Records one completed unit of work and re-evaluates the hang heuristic.
    ///
    /// Returns `true` when the hang condition holds for this sample:
    /// sustained overflow past the latched cycle threshold with a still-rising
    /// pending rate. The condition is re-evaluated on every call and will
    /// keep returning `true` while it persists; consumers must be idempotent.
    ///
    /// # Arguments
    ///
    /// * `now` - Sample timestamp
    /// * `queue_len` - Current depth of the connection's outgoing queue
    /// * `payload` - The observed unit of work (kept as a diagnostic)
    /// * `tuning` - Detection constants
    pub fn observe(
        &mut self,
        now: Instant,
        queue_len: usize,
        payload: Value,
        tuning: &DetectionTuning,
    ) -> bool {
        self.request_count += 1;

        let uptime_ms = now
            .saturating_duration_since(self.start_time)
            .as_secs_f64()
            * 1000.0;
        let uptime_ms = uptime_ms.max(MIN_UPTIME_MS);

        let pending_rate =
            (self.request_count as f64 + queue_len as f64 * tuning.queue_weight) / uptime_ms;
        let throughput = self.request_count as f64 / uptime_ms;

        if self.throughput_avg == 0.0 {
            self.throughput_avg = throughput;
        }
        self.throughput_avg = (self.throughput_avg + throughput) / 2.0;

        self.pending_overflow = pending_rate > self.throughput_avg * tuning.overflow_factor;

        if self.pending_overflow {
            self.hanging_cycles += 1;
            if self.max_hanging_cycles == 0 {
                self.max_hanging_cycles = queue_len as u32 + tuning.hang_cycle_margin;
            }
            self.pending_overflow_growing = self.old_pending_rate <= pending_rate;
            self.old_pending_rate = pending_rate;
        } else {
            self.hanging_cycles = 0;
            self.max_hanging_cycles = 0;
            self.old_pending_rate = 0.0;
            self.pending_overflow_growing = false;
        }

        self.last_request = Some(payload);

        trace!(
            request_count = self.request_count,
            pending_rate,
            throughput_avg = self.throughput_avg,
            pending_overflow = self.pending_overflow,
            hanging_cycles = self.hanging_cycles,
            "Health sample recorded"
        );

        self.pending_overflow
            && self.pending_overflow_growing
            && self.hanging_cycles > self.max_hanging_cycles
    }

    /// Returns the number of units of work observed.
    #[inline]
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Returns the smoothed throughput in requests per millisecond.
    #[inline]
    #[must_use]
    pub fn throughput_avg(&self) -> f64 {
        self.throughput_avg
    }

    /// Returns whether the last sample was in overflow.
    #[inline]
    #[must_use]
    pub fn pending_overflow(&self) -> bool {
        self.pending_overflow
    }

    /// Returns the consecutive overflow sample count.
    #[inline]
    #[must_use]
    pub fn hanging_cycles(&self) -> u32 {
        self.hanging_cycles
    }

    /// Returns the latched cycle threshold (0 while overflow is clear).
    #[inline]
    #[must_use]
    pub fn max_hanging_cycles(&self) -> u32 {
        self.max_hanging_cycles
    }

    /// Takes a serializable snapshot of the current metrics.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_ms: self.start_time.elapsed().as_millis() as u64,
            request_count: self.request_count,
            throughput_avg: self.throughput_avg,
            pending_overflow: self.pending_overflow,
            pending_overflow_growing: self.pending_overflow_growing,
            hanging_cycles: self.hanging_cycles,
            max_hanging_cycles: self.max_hanging_cycles,
            last_request: self.last_request.clone(),
        }
    }
}

impl Default for HealthStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// StatsSnapshot
// ============================================================================

/// Serializable copy of one connection's [`HealthStats`].
///
/// Produced by the pool's read-only accessors for monitoring and
/// diagnostics consumers.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Milliseconds since tracking began.
    pub uptime_ms: u64,
    /// Units of work observed.
    pub request_count: u64,
    /// Smoothed requests per millisecond.
    pub throughput_avg: f64,
    /// Overflow state of the latest sample.
    pub pending_overflow: bool,
    /// Growth state of the latest sample.
    pub pending_overflow_growing: bool,
    /// Consecutive overflow samples.
    pub hanging_cycles: u32,
    /// Latched cycle threshold.
    pub max_hanging_cycles: u32,
    /// Most recently observed payload.
    pub last_request: Option<Value>,
}

// ============================================================================
// ClientStats
// ============================================================================

/// Process-lifetime aggregate across all connections.
///
/// Initialized once when the pool is constructed and never torn down. The
/// counters are simple and monotonic; they tolerate eventual consistency.
#[derive(Debug, Clone)]
pub struct ClientStats {
    /// When the client itself started.
    start_time: Instant,
    /// Units of work observed across all connections.
    request_count: u64,
    /// Aggregate requests per millisecond.
    throughput: f64,
}

impl ClientStats {
    /// Creates aggregate stats starting now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            request_count: 0,
            throughput: 0.0,
        }
    }

    /// Records one unit of work against the aggregate.
    pub fn record(&mut self, now: Instant) {
        self.request_count += 1;

        let uptime_ms = now
            .saturating_duration_since(self.start_time)
            .as_secs_f64()
            * 1000.0;
        self.throughput = self.request_count as f64 / uptime_ms.max(MIN_UPTIME_MS);
    }

    /// Returns the total units of work observed.
    #[inline]
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Returns the aggregate throughput in requests per millisecond.
    #[inline]
    #[must_use]
    pub fn throughput(&self) -> f64 {
        self.throughput
    }

    /// Takes a serializable snapshot of the aggregate.
    #[must_use]
    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            uptime_ms: self.start_time.elapsed().as_millis() as u64,
            request_count: self.request_count,
            throughput: self.throughput,
        }
    }
}

impl Default for ClientStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable copy of the process-lifetime aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSnapshot {
    /// Milliseconds since the client started.
    pub uptime_ms: u64,
    /// Total units of work observed.
    pub request_count: u64,
    /// Aggregate requests per millisecond.
    pub throughput: f64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn tuning() -> DetectionTuning {
        DetectionTuning::default()
    }

    #[test]
    fn test_first_sample_with_backlog_overflows_and_latches() {
        // Uptime 100ms, queue depth 3: pending_rate = (1 + 30) / 100 = 0.31,
        // throughput_avg seeds to 0.01, overflow since 0.31 > 0.02.
        let start = Instant::now();
        let mut stats = HealthStats::started_at(start);
        let now = start + Duration::from_millis(100);

        let hang = stats.observe(now, 3, json!("req"), &tuning());

        assert!(!hang);
        assert!(stats.pending_overflow());
        assert_eq!(stats.hanging_cycles(), 1);
        assert_eq!(stats.max_hanging_cycles(), 13);
    }

    #[test]
    fn test_steady_throughput_empty_queue_never_overflows() {
        let start = Instant::now();
        let mut stats = HealthStats::started_at(start);

        // One request every 10ms, nothing queued.
        for i in 1..=500u64 {
            let now = start + Duration::from_millis(10 * i);
            let hang = stats.observe(now, 0, json!(i), &tuning());
            assert!(!hang);
            assert!(!stats.pending_overflow(), "overflow at sample {i}");
        }

        assert_eq!(stats.request_count(), 500);
        assert_eq!(stats.hanging_cycles(), 0);
    }

    #[test]
    fn test_growing_backlog_eventually_hangs() {
        let start = Instant::now();
        let mut stats = HealthStats::started_at(start);
        // Time frozen 1s in: requests trickle while the queue keeps growing,
        // so the pending rate rises every sample.
        let now = start + Duration::from_secs(1);

        let mut fired_at = None;
        for i in 0..40u32 {
            let queue_len = 2 + 5 * i as usize;
            if stats.observe(now, queue_len, json!(i), &tuning()) {
                fired_at = Some(i);
                break;
            }
        }

        // First overflow latched max_hanging_cycles = 2 + 10 = 12, so the
        // 13th consecutive overflow sample crosses the threshold.
        assert_eq!(fired_at, Some(12));
        assert_eq!(stats.max_hanging_cycles(), 12);
        assert_eq!(stats.hanging_cycles(), 13);
    }

    #[test]
    fn test_hang_refires_while_condition_persists() {
        let start = Instant::now();
        let mut stats = HealthStats::started_at(start);
        let now = start + Duration::from_secs(1);

        let mut fired = 0;
        for i in 0..20u32 {
            if stats.observe(now, 2 + 5 * i as usize, json!(i), &tuning()) {
                fired += 1;
            }
        }

        // Fires on every qualifying sample past the threshold, not just once.
        assert!(fired > 1);
    }

    #[test]
    fn test_overflow_clear_resets_counters() {
        let start = Instant::now();
        let mut stats = HealthStats::started_at(start);
        let now = start + Duration::from_secs(1);

        // Push into overflow with a deep queue.
        for i in 0..5u32 {
            stats.observe(now, 50, json!(i), &tuning());
        }
        assert!(stats.pending_overflow());
        assert!(stats.hanging_cycles() > 0);

        // Backlog clears and time moves on: healthy samples reset everything.
        let mut later = now;
        for i in 0..50u64 {
            later += Duration::from_millis(10);
            stats.observe(later, 0, json!(i), &tuning());
        }

        assert!(!stats.pending_overflow());
        assert_eq!(stats.hanging_cycles(), 0);
        assert_eq!(stats.max_hanging_cycles(), 0);
    }

    #[test]
    fn test_zero_uptime_guard() {
        let start = Instant::now();
        let mut stats = HealthStats::started_at(start);

        // Sample at (or before) the start instant must not divide by zero.
        let hang = stats.observe(start, 0, json!("early"), &tuning());
        assert!(!hang);
        assert!(stats.throughput_avg().is_finite());
    }

    #[test]
    fn test_snapshot_serializes() {
        let start = Instant::now();
        let mut stats = HealthStats::started_at(start);
        stats.observe(start + Duration::from_millis(50), 1, json!("x"), &tuning());

        let snapshot = stats.snapshot();
        let encoded = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(encoded["request_count"], 1);
        assert_eq!(encoded["last_request"], json!("x"));
    }

    #[test]
    fn test_client_stats_aggregate() {
        let mut client = ClientStats::new();
        let now = Instant::now() + Duration::from_millis(100);

        client.record(now);
        client.record(now);

        assert_eq!(client.request_count(), 2);
        assert!(client.throughput() > 0.0);
    }

    proptest! {
        // Constant inter-arrival spacing with an empty queue must never
        // trip the overflow flag, whatever the spacing.
        #[test]
        fn prop_steady_empty_queue_stays_healthy(
            interval_ms in 1u64..200,
            samples in 1usize..300,
        ) {
            let start = Instant::now();
            let mut stats = HealthStats::started_at(start);

            for i in 1..=samples {
                let now = start + Duration::from_millis(interval_ms * i as u64);
                let hang = stats.observe(now, 0, json!(i), &tuning());
                prop_assert!(!hang);
                prop_assert!(!stats.pending_overflow());
            }
        }
    }
}
