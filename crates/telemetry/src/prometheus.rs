// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
};

// --- Metric Statics ---
// We use OnceCell to hold the metric collectors. They will be initialized
// exactly once by the `install` function.

static WITNESS_SIGNALS_RECEIVED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static WITNESS_SIGNALS_DROPPED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static WITNESS_CYCLES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static WITNESS_CHAIN_DISTANCE: OnceCell<IntGauge> = OnceCell::new();
static WITNESS_AVAILABLE_WITNESSINGS: OnceCell<IntGauge> = OnceCell::new();
static WITNESS_OUTPUT_SPLITS_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static WITNESS_SUBMISSION_DURATION_SECONDS: OnceCell<Histogram> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

/// The Prometheus-backed metrics sink.
#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

// A sink method called before `install()` is a setup error; the sample is dropped.
macro_rules! with_metric {
    ($metric:ident, |$m:ident| $body:expr) => {
        if let Some($m) = $metric.get() {
            $body;
        }
    };
}

impl WitnessMetricsSink for PrometheusSink {
    fn inc_signals_received(&self) {
        with_metric!(WITNESS_SIGNALS_RECEIVED_TOTAL, |m| m.inc());
    }
    fn inc_signals_dropped(&self) {
        with_metric!(WITNESS_SIGNALS_DROPPED_TOTAL, |m| m.inc());
    }
    fn inc_cycle_outcome(&self, outcome: &'static str) {
        with_metric!(WITNESS_CYCLES_TOTAL, |m| m.with_label_values(&[outcome]).inc());
    }
    fn set_chain_distance(&self, distance: i64) {
        with_metric!(WITNESS_CHAIN_DISTANCE, |m| m.set(distance));
    }
    fn set_available_witnessings(&self, count: u64) {
        with_metric!(WITNESS_AVAILABLE_WITNESSINGS, |m| m
            .set(i64::try_from(count).unwrap_or(i64::MAX)));
    }
    fn inc_output_splits(&self) {
        with_metric!(WITNESS_OUTPUT_SPLITS_TOTAL, |m| m.inc());
    }
    fn observe_submission_duration(&self, duration_secs: f64) {
        with_metric!(WITNESS_SUBMISSION_DURATION_SECONDS, |m| m
            .observe(duration_secs));
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        with_metric!(ERRORS_TOTAL, |m| m.with_label_values(&[kind, variant]).inc());
    }
}

/// Registers all collectors with the default registry and returns the sink.
///
/// Must be called at most once per process.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    fn already() -> prometheus::Error {
        prometheus::Error::Msg("prometheus sink already installed".into())
    }

    WITNESS_SIGNALS_RECEIVED_TOTAL
        .set(register_int_counter!(
            "witness_signals_received_total",
            "Total chain-update signals received."
        )?)
        .map_err(|_| already())?;
    WITNESS_SIGNALS_DROPPED_TOTAL
        .set(register_int_counter!(
            "witness_signals_dropped_total",
            "Chain-update signals dropped because a witnessing cycle was underway."
        )?)
        .map_err(|_| already())?;
    WITNESS_CYCLES_TOTAL
        .set(register_int_counter_vec!(
            "witness_cycles_total",
            "Finished witnessing cycles, by outcome.",
            &["outcome"]
        )?)
        .map_err(|_| already())?;
    WITNESS_CHAIN_DISTANCE
        .set(register_int_gauge!(
            "witness_chain_distance",
            "Last observed main-chain lag of the witnessing address."
        )?)
        .map_err(|_| already())?;
    WITNESS_AVAILABLE_WITNESSINGS
        .set(register_int_gauge!(
            "witness_available_witnessings",
            "Number of witnessings the current output inventory can fund."
        )?)
        .map_err(|_| already())?;
    WITNESS_OUTPUT_SPLITS_TOTAL
        .set(register_int_counter!(
            "witness_output_splits_total",
            "Total output splits planned to replenish the inventory."
        )?)
        .map_err(|_| already())?;
    WITNESS_SUBMISSION_DURATION_SECONDS
        .set(register_histogram!(
            "witness_submission_duration_seconds",
            "Latency of composing, signing and broadcasting a witnessing unit.",
            exponential_buckets(0.005, 2.0, 14)?
        )?)
        .map_err(|_| already())?;
    ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "witness_errors_total",
            "Total number of errors, categorized by type and variant.",
            &["kind", "variant"]
        )?)
        .map_err(|_| already())?;

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}
