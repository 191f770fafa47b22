//! SnakeEngine: Command Definitions
//!
//! Commands are pure data. They carry intent only and contain no
//! transition logic. Role changes (relinquish, quit) are not simulation
//! commands and never reach this layer.

use serde::{Deserialize, Serialize};

use crate::domain::Heading;

/// Simulation-level command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// One movement step, issued when the move cadence elapses.
    Advance,
    Turn(Heading),
    TogglePause,
    /// Start a new game. Honoured only once the current game is over.
    Reset,
}
