//! Monotonic progress reporting for a single video job

use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::rules::progress_percent;
use crate::ports::ProgressSink;

/// Forwards whole-percent progress to a sink.
///
/// Emissions never decrease and repeated values are suppressed; `complete`
/// guarantees the last emission is exactly 100.
pub struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    last: Option<u8>,
    frames: u64,
    start_time: Instant,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            last: None,
            frames: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one sampled frame at `timestamp` of `duration`
    pub fn frame_done(&mut self, timestamp: f64, duration: f64) {
        self.frames += 1;
        self.emit(progress_percent(timestamp, duration));
    }

    /// Force the terminal 100
    pub fn complete(&mut self) {
        self.emit(100);
        debug!(
            "Processed {} frames in {:.2}s ({:.1} fps)",
            self.frames,
            self.elapsed().as_secs_f64(),
            self.throughput().unwrap_or(0.0)
        );
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Frames per second of wall-clock time
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.elapsed().as_secs_f64();
        (secs > 0.0).then(|| self.frames as f64 / secs)
    }

    fn emit(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        self.sink.report(percent);
    }
}
