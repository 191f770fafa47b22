//! SnakeEngine: Engine
//!
//! Stateful wrapper around the pure transition layer. Owns the current
//! state, the rule constants and the food generator, and validates
//! invariants after every transition.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::cadence::move_interval;
use crate::commands::Command;
use crate::domain::{GameConstants, GameState, StepOutcome};
use crate::invariants::{check_resumable, validate_invariants, InvalidResumeState};
use crate::state::{create_initial_state, reset_state};
use crate::transitions::apply_command;

/// How a state handed over from another process was taken on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Continued exactly where the previous holder left off.
    Resumed,
    /// The handed-over state could not be continued; a new game started.
    Reset(InvalidResumeState),
}

pub struct SnakeEngine {
    state: GameState,
    constants: GameConstants,
    rng: SmallRng,
}

impl SnakeEngine {
    /// New engine with default rules and a fresh game.
    pub fn new(seed: u64) -> Self {
        Self::with_constants(seed, GameConstants::default())
    }

    pub fn with_constants(seed: u64, constants: GameConstants) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let state = create_initial_state(&mut rng);
        Self {
            state,
            constants,
            rng,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Apply one command; returns what happened.
    pub fn apply(&mut self, command: Command) -> StepOutcome {
        let (new_state, outcome) =
            apply_command(&self.state, command, &self.constants, &mut self.rng);
        validate_invariants(&new_state);
        self.state = new_state;
        outcome
    }

    /// Replace the current state without checks. Caller vouches for it.
    pub fn load(&mut self, state: GameState) {
        self.state = state;
    }

    /// Start a new game regardless of phase, keeping monotone fields.
    pub fn reset(&mut self) {
        self.state = reset_state(&self.state, &mut self.rng);
    }

    /// Continue from `state` if it is resumable, otherwise reset on top
    /// of it so high score and counters still carry over.
    pub fn resume_or_reset(&mut self, state: GameState) -> ResumeOutcome {
        match check_resumable(&state) {
            Ok(()) => {
                self.state = state;
                ResumeOutcome::Resumed
            }
            Err(reason) => {
                self.state = reset_state(&state, &mut self.rng);
                ResumeOutcome::Reset(reason)
            }
        }
    }

    /// Current interval between movement steps.
    pub fn move_interval(&self) -> Duration {
        move_interval(self.state.score, &self.constants)
    }
}
