//! Core types and definitions for the Stagehand actor kernel.
//!
//! This crate defines the vocabulary shared across all other crates:
//! identifiers, message types, the message envelope, component priorities,
//! actor lifecycle states, errors, and constants. It has no dependency on
//! the kernel runtime.

pub mod constants;
pub mod enums;
pub mod error;
pub mod ids;
pub mod message;
pub mod types;

#[cfg(test)]
mod tests;
