//! Headless shell around the Stagehand kernel: a fixed-rate loop thread fed
//! by an mpsc command channel, plus a small seeded demo scenario.
//!
//! Background work never shares state with the kernel. Worker threads hold a
//! command sender and post messages; the loop drains them at each frame
//! boundary.

pub mod runner;
pub mod scenario;
