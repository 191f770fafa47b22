//! SnakeEngine: Invariant Checks
//!
//! `validate_invariants` panics and guards the engine's own transitions.
//! `try_validate_invariants` and `check_resumable` are the non-panicking
//! forms used on state read back from shared memory, which may be torn
//! or garbage.

use thiserror::Error;

use crate::domain::{Board, GameState, Phase, Point, MAX_BODY_LEN};
use crate::occupancy::{first_duplicate, is_occupied};

/// A structural rule broken by a `GameState`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("body length {len} exceeds maximum {max}")]
    BodyTooLong { len: usize, max: usize },
    #[error("body segment {index} at ({x}, {y}) is off the board", x = .cell.x, y = .cell.y)]
    BodyOutOfBounds { index: usize, cell: Point },
    #[error("body cell ({x}, {y}) is occupied twice", x = .cell.x, y = .cell.y)]
    BodyOverlap { cell: Point },
    #[error("food at ({x}, {y}) is off the board", x = .cell.x, y = .cell.y)]
    FoodOutOfBounds { cell: Point },
    #[error("food at ({x}, {y}) lies on the body", x = .cell.x, y = .cell.y)]
    FoodOnBody { cell: Point },
    #[error("longest_body {longest} is shorter than current body {len}")]
    LongestBodyBehind { longest: u32, len: usize },
    #[error("game over with high_score {high_score} below score {score}")]
    HighScoreBehind { high_score: u32, score: u32 },
}

/// Why a snapshot cannot be resumed as-is and needs a reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidResumeState {
    #[error("game already over")]
    GameOver,
    #[error("body is empty")]
    EmptyBody,
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run all checks. Panics on the first failure.
pub fn validate_invariants(state: &GameState) {
    if let Err(violation) = try_validate_invariants(state) {
        panic!("Invariant violation: {violation}");
    }
}

/// Non-panicking variant of `validate_invariants`.
pub fn try_validate_invariants(state: &GameState) -> Result<(), InvariantViolation> {
    check_body_length(state)?;
    check_body_in_bounds(state)?;
    check_body_overlap(state)?;
    check_food(state)?;
    check_counters(state)?;
    check_high_score(state)?;
    Ok(())
}

/// A state another process may continue playing from.
pub fn check_resumable(state: &GameState) -> Result<(), InvalidResumeState> {
    if state.phase == Phase::Over {
        return Err(InvalidResumeState::GameOver);
    }
    if state.body.is_empty() {
        return Err(InvalidResumeState::EmptyBody);
    }
    try_validate_invariants(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_body_length(state: &GameState) -> Result<(), InvariantViolation> {
    if state.body.len() > MAX_BODY_LEN {
        return Err(InvariantViolation::BodyTooLong {
            len: state.body.len(),
            max: MAX_BODY_LEN,
        });
    }
    Ok(())
}

fn check_body_in_bounds(state: &GameState) -> Result<(), InvariantViolation> {
    match state.body.iter().position(|p| !Board::contains(*p)) {
        Some(index) => Err(InvariantViolation::BodyOutOfBounds {
            index,
            cell: state.body[index],
        }),
        None => Ok(()),
    }
}

fn check_body_overlap(state: &GameState) -> Result<(), InvariantViolation> {
    match first_duplicate(&state.body) {
        Some(cell) => Err(InvariantViolation::BodyOverlap { cell }),
        None => Ok(()),
    }
}

/// Only meaningful once a game exists; the empty state has no food yet.
fn check_food(state: &GameState) -> Result<(), InvariantViolation> {
    if state.body.is_empty() {
        return Ok(());
    }
    if !Board::contains(state.food) {
        return Err(InvariantViolation::FoodOutOfBounds { cell: state.food });
    }
    if is_occupied(&state.body, state.food) {
        return Err(InvariantViolation::FoodOnBody { cell: state.food });
    }
    Ok(())
}

fn check_counters(state: &GameState) -> Result<(), InvariantViolation> {
    if (state.counters.longest_body as usize) < state.body.len() {
        return Err(InvariantViolation::LongestBodyBehind {
            longest: state.counters.longest_body,
            len: state.body.len(),
        });
    }
    Ok(())
}

fn check_high_score(state: &GameState) -> Result<(), InvariantViolation> {
    if state.phase == Phase::Over && state.high_score < state.score {
        return Err(InvariantViolation::HighScoreBehind {
            high_score: state.high_score,
            score: state.score,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Counters, Heading};

    fn valid() -> GameState {
        GameState {
            phase: Phase::Running,
            heading: Heading::Right,
            score: 20,
            high_score: 50,
            body: vec![Point::new(10, 4), Point::new(9, 4), Point::new(8, 4)],
            food: Point::new(30, 12),
            counters: Counters {
                games_played: 2,
                food_eaten: 7,
                longest_body: 5,
            },
        }
    }

    #[test]
    fn valid_state_passes() {
        assert_eq!(try_validate_invariants(&valid()), Ok(()));
        assert_eq!(check_resumable(&valid()), Ok(()));
    }

    #[test]
    fn out_of_bounds_segment_rejected() {
        let mut s = valid();
        s.body[2] = Point::new(-1, 4);
        assert_eq!(
            try_validate_invariants(&s),
            Err(InvariantViolation::BodyOutOfBounds {
                index: 2,
                cell: Point::new(-1, 4)
            })
        );
    }

    #[test]
    fn food_on_body_rejected() {
        let mut s = valid();
        s.food = s.body[1];
        assert!(matches!(
            try_validate_invariants(&s),
            Err(InvariantViolation::FoodOnBody { .. })
        ));
    }

    #[test]
    fn empty_or_over_is_not_resumable() {
        let mut s = valid();
        s.body.clear();
        assert_eq!(check_resumable(&s), Err(InvalidResumeState::EmptyBody));

        let mut s = valid();
        s.phase = Phase::Over;
        assert_eq!(check_resumable(&s), Err(InvalidResumeState::GameOver));
    }

    #[test]
    fn canonical_empty_state_is_structurally_valid() {
        assert_eq!(try_validate_invariants(&GameState::default()), Ok(()));
    }

    #[test]
    #[should_panic(expected = "Invariant violation")]
    fn validate_panics_on_overlap() {
        let mut s = valid();
        s.body[2] = s.body[0];
        validate_invariants(&s);
    }
}
