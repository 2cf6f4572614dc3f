// Path: crates/telemetry/src/time.rs
use crate::sinks::MetricsSink;
use std::time::Instant;

/// Reports the elapsed time of its scope as a submission duration on drop.
pub struct Timer<'a> {
    sink: &'a dyn MetricsSink,
    start: Instant,
}

impl<'a> Timer<'a> {
    /// Starts timing against `sink`.
    pub fn new(sink: &'a dyn MetricsSink) -> Self {
        Self {
            sink,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_submission_duration(self.start.elapsed().as_secs_f64());
    }
}
