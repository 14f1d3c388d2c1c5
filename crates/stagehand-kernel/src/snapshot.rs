//! Serializable view of kernel state, rebuilt on demand.

use serde::{Deserialize, Serialize};

use crate::statistics::GmStatistics;

/// Observable kernel state at one point in time.
///
/// The shell publishes one of these per frame for polling; tests compare
/// serialized snapshots to check determinism.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KernelSnapshot {
    pub sim_time: f64,
    pub real_time: f64,
    pub time_scale: f64,
    pub paused: bool,
    /// Actors this peer owns.
    pub local_actors: usize,
    /// Mirrors of actors owned elsewhere.
    pub remote_actors: usize,
    /// Actors awaiting end-of-frame removal.
    pub pending_removal: usize,
    /// Component names in delivery order.
    pub components: Vec<String>,
    pub queued_messages: usize,
    pub pending_timers: usize,
    pub statistics: GmStatistics,
}
