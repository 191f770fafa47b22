#![deny(unsafe_code)]

//! Snake Duo runtime
//!
//! Runs the snake engine across two cooperating processes that share a
//! memory-mapped region. One process is Active and simulates; the other
//! stays Dormant and takes over on heartbeat silence, clean exit, or an
//! explicit handoff.
//!
//! The region handle is passed explicitly to every component that
//! touches it. Game rules live in `snake_engine`.

pub mod arbiter;
pub mod config;
pub mod display;
pub mod error;
pub mod heartbeat;
pub mod input;
pub mod layout;
pub mod process_loop;
pub mod region;

pub use error::{Result, RuntimeError};
