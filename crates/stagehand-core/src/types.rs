//! Clock and frame-timing types.

use serde::{Deserialize, Serialize};

/// Timing information carried by every tick message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInfo {
    /// Simulation seconds elapsed since the previous frame.
    pub delta_sim_time: f64,
    /// Real seconds elapsed since the previous frame.
    pub delta_real_time: f64,
    /// Simulation time scale in effect for this frame.
    pub time_scale: f64,
    /// Simulation seconds since kernel start.
    pub sim_time: f64,
}

/// The kernel clock pair: simulation time (scaled, pausable) and real time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameClock {
    /// Simulation seconds since start.
    pub sim_time: f64,
    /// Real seconds since start.
    pub real_time: f64,
    /// Factor applied to real time when advancing simulation time.
    pub time_scale: f64,
    /// While paused, simulation time does not advance.
    pub paused: bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            sim_time: 0.0,
            real_time: 0.0,
            time_scale: 1.0,
            paused: false,
        }
    }
}

impl GameClock {
    /// Advance both clocks by one frame of real time.
    ///
    /// Returns the tick info for the frame. While paused the simulation
    /// delta is zero; real time always advances.
    pub fn advance(&mut self, delta_real: f64) -> TickInfo {
        let delta_sim = if self.paused {
            0.0
        } else {
            delta_real * self.time_scale
        };
        self.sim_time += delta_sim;
        self.real_time += delta_real;
        TickInfo {
            delta_sim_time: delta_sim,
            delta_real_time: delta_real,
            time_scale: self.time_scale,
            sim_time: self.sim_time,
        }
    }

    /// Simulation time in microseconds. Timer deadline precision.
    pub fn sim_micros(&self) -> u64 {
        (self.sim_time * 1e6) as u64
    }

    /// Real time in microseconds.
    pub fn real_micros(&self) -> u64 {
        (self.real_time * 1e6) as u64
    }
}
