//! Frame and message counters, with an optional periodic log summary.

use log::info;
use serde::{Deserialize, Serialize};

/// Cumulative dispatch counters since kernel start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmStatistics {
    pub frames: u64,
    pub messages_processed: u64,
    pub network_messages_sent: u64,
}

/// Tracks totals and writes a window summary to the log when an interval is
/// configured. A zero interval disables output.
#[derive(Default)]
pub(crate) struct StatsTracker {
    pub totals: GmStatistics,
    interval_secs: f64,
    window_start_real: f64,
    window_start: GmStatistics,
}

impl StatsTracker {
    pub fn set_interval(&mut self, seconds: f64) {
        self.interval_secs = seconds.max(0.0);
    }

    pub fn interval(&self) -> f64 {
        self.interval_secs
    }

    /// Call once per frame with the real clock.
    pub fn frame_complete(&mut self, real_time: f64) {
        self.totals.frames += 1;

        if self.interval_secs <= 0.0 {
            return;
        }
        let elapsed = real_time - self.window_start_real;
        if elapsed < self.interval_secs {
            return;
        }

        let frames = self.totals.frames - self.window_start.frames;
        let messages = self.totals.messages_processed - self.window_start.messages_processed;
        let network =
            self.totals.network_messages_sent - self.window_start.network_messages_sent;
        info!(
            "GM statistics: {frames} frames, {messages} messages processed, \
             {network} network sends over {elapsed:.1}s"
        );
        self.window_start_real = real_time;
        self.window_start = self.totals;
    }
}
