// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns a static reference to the configured error metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn error_metrics() -> &'static dyn MetricsSink {
    match SINK.get() {
        Some(sink) => *sink,
        None => &NOP_SINK,
    }
}

/// Returns a static reference to the configured witnessing metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn witness_metrics() -> &'static dyn MetricsSink {
    match SINK.get() {
        Some(sink) => *sink,
        None => &NOP_SINK,
    }
}

// --- Trait Definitions ---

/// A sink for metrics related to the witnessing cycle.
pub trait WitnessMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the counter of chain-update signals received.
    fn inc_signals_received(&self);
    /// Increments the counter of signals dropped because a cycle was underway.
    fn inc_signals_dropped(&self);
    /// Increments a counter of finished cycles, labeled by outcome.
    fn inc_cycle_outcome(&self, outcome: &'static str);
    /// Sets the gauge for the last observed main-chain lag of the address.
    fn set_chain_distance(&self, distance: i64);
    /// Sets the gauge for the number of witnessings the inventory can fund.
    fn set_available_witnessings(&self, count: u64);
    /// Increments the counter of planned output splits.
    fn inc_output_splits(&self);
    /// Observes the duration of a composition and broadcast.
    fn observe_submission_duration(&self, duration_secs: f64);
}
impl WitnessMetricsSink for NopSink {
    fn inc_signals_received(&self) {}
    fn inc_signals_dropped(&self) {}
    fn inc_cycle_outcome(&self, _outcome: &'static str) {}
    fn set_chain_distance(&self, _distance: i64) {}
    fn set_available_witnessings(&self, _count: u64) {}
    fn inc_output_splits(&self) {}
    fn observe_submission_duration(&self, _duration_secs: f64) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and variant.
    fn inc_error(&self, kind: &'static str, variant: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _variant: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink: WitnessMetricsSink + ErrorMetricsSink {}

// Blanket implementation to allow any type that implements all sub-traits
// to be used as a `MetricsSink`.
impl<T> MetricsSink for T where T: WitnessMetricsSink + ErrorMetricsSink {}
