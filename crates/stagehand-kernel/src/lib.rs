//! The Stagehand game manager: an actor registry, a priority-ordered
//! component list, synchronous message dispatch, and a cooperative
//! single-threaded frame loop.
//!
//! A frame runs pre-frame (tick local, timers, tick remote, deferred actor
//! removal, end-of-frame tick), frame, and post-frame phases; each phase
//! broadcasts its message to every component in priority order and to every
//! registered actor listener. All dispatch is synchronous; handlers queue
//! registry mutations on the [`context::GmContext`] they receive, and the
//! manager applies them when the handler returns.

pub mod actor;
pub mod component;
pub mod context;
pub mod factory;
pub mod manager;
pub mod snapshot;
pub mod statistics;

mod listeners;
mod timers;
