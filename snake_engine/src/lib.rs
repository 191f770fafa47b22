#![forbid(unsafe_code)]

/// Engine v1. Bump when the canonical serialization or rules change.
pub const ENGINE_VERSION: u32 = 1;

pub mod cadence;
pub mod commands;
pub mod domain;
pub mod engine;
pub mod hashing;
pub mod invariants;
pub mod occupancy;
pub mod state;
pub mod transitions;
