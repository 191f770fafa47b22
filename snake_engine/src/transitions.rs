//! SnakeEngine: Centralized Transition Logic
//!
//! ALL state-mutation logic lives here. The input state is never
//! mutated; every handler works on a clone. Randomness (food placement)
//! comes only from the injected generator.

use rand::Rng;

use crate::commands::Command;
use crate::domain::{Board, GameConstants, GameState, Heading, Phase, StepOutcome, MAX_BODY_LEN};
use crate::occupancy::{draw_free_cell, head_overlaps_body};
use crate::state::reset_state;

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `command` to `state` and return `(new_state, outcome)`.
pub fn apply_command<R: Rng + ?Sized>(
    state: &GameState,
    command: Command,
    constants: &GameConstants,
    rng: &mut R,
) -> (GameState, StepOutcome) {
    let mut new_state = state.clone();

    let outcome = match command {
        Command::Advance => apply_advance(&mut new_state, constants, rng),
        Command::Turn(heading) => apply_turn(&mut new_state, heading),
        Command::TogglePause => apply_toggle_pause(&mut new_state),
        Command::Reset => apply_reset(&mut new_state, rng),
    };

    (new_state, outcome)
}

// ---------------------------------------------------------------------------
// Individual transition handlers (private)
// ---------------------------------------------------------------------------

fn apply_advance<R: Rng + ?Sized>(
    state: &mut GameState,
    constants: &GameConstants,
    rng: &mut R,
) -> StepOutcome {
    if state.phase != Phase::Running {
        return StepOutcome::Idle;
    }
    let Some(head) = state.head() else {
        return StepOutcome::Idle;
    };

    let candidate = head.step(state.heading);

    if !Board::contains(candidate) {
        finish_game(state);
        return StepOutcome::HitWall;
    }

    let ate = candidate == state.food;
    let grow = ate && state.body.len() < MAX_BODY_LEN;

    let mut moved = Vec::with_capacity(state.body.len() + 1);
    moved.push(candidate);
    let keep = if grow {
        state.body.len()
    } else {
        state.body.len() - 1
    };
    moved.extend_from_slice(&state.body[..keep]);

    // Checked after the tail moved: stepping into the vacated cell is legal.
    if head_overlaps_body(&moved) {
        finish_game(state);
        return StepOutcome::HitSelf;
    }

    state.body = moved;

    if !ate {
        return StepOutcome::Moved;
    }

    state.score = state.score.saturating_add(constants.food_reward);
    state.counters.food_eaten = state.counters.food_eaten.saturating_add(1);
    state.counters.longest_body = state.counters.longest_body.max(state.body.len() as u32);
    state.food = draw_free_cell(&state.body, rng);

    StepOutcome::Ate { score: state.score }
}

/// Collision: freeze the body where it was and commit the high score.
fn finish_game(state: &mut GameState) {
    state.phase = Phase::Over;
    state.high_score = state.high_score.max(state.score);
}

fn apply_turn(state: &mut GameState, heading: Heading) -> StepOutcome {
    if state.phase != Phase::Running {
        return StepOutcome::Ignored;
    }
    if heading == state.heading.opposite() {
        return StepOutcome::TurnRejected;
    }
    if heading == state.heading {
        return StepOutcome::Ignored;
    }
    state.heading = heading;
    StepOutcome::Turned { heading }
}

fn apply_toggle_pause(state: &mut GameState) -> StepOutcome {
    match state.phase {
        Phase::Running => {
            state.phase = Phase::Paused;
            StepOutcome::Paused
        }
        Phase::Paused => {
            state.phase = Phase::Running;
            StepOutcome::Resumed
        }
        Phase::Over => StepOutcome::Ignored,
    }
}

fn apply_reset<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) -> StepOutcome {
    if state.phase != Phase::Over {
        return StepOutcome::Ignored;
    }
    *state = reset_state(state, rng);
    StepOutcome::Reset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Counters, Point};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn running(body: Vec<Point>, heading: Heading, food: Point) -> GameState {
        GameState {
            phase: Phase::Running,
            heading,
            score: 0,
            high_score: 0,
            body,
            food,
            counters: Counters {
                games_played: 1,
                food_eaten: 0,
                longest_body: 3,
            },
        }
    }

    fn apply(state: &GameState, command: Command) -> (GameState, StepOutcome) {
        let mut rng = SmallRng::seed_from_u64(1);
        apply_command(state, command, &GameConstants::default(), &mut rng)
    }

    #[test]
    fn advance_moves_head_and_drops_tail() {
        let s = running(
            vec![Point::new(5, 5), Point::new(4, 5), Point::new(3, 5)],
            Heading::Right,
            Point::new(20, 10),
        );
        let (next, outcome) = apply(&s, Command::Advance);
        assert_eq!(outcome, StepOutcome::Moved);
        assert_eq!(
            next.body,
            vec![Point::new(6, 5), Point::new(5, 5), Point::new(4, 5)]
        );
        // Input state untouched.
        assert_eq!(s.body[0], Point::new(5, 5));
    }

    #[test]
    fn tail_cell_may_be_entered() {
        // Square loop: head moves into the cell the tail vacates.
        let s = running(
            vec![
                Point::new(5, 5),
                Point::new(5, 6),
                Point::new(4, 6),
                Point::new(4, 5),
            ],
            Heading::Left,
            Point::new(20, 10),
        );
        let (next, outcome) = apply(&s, Command::Advance);
        assert_eq!(outcome, StepOutcome::Moved);
        assert_eq!(next.head(), Some(Point::new(4, 5)));
    }

    #[test]
    fn self_collision_keeps_body() {
        let body = vec![
            Point::new(5, 5),
            Point::new(5, 6),
            Point::new(4, 6),
            Point::new(4, 5),
            Point::new(3, 5),
        ];
        let mut s = running(body.clone(), Heading::Left, Point::new(20, 10));
        s.score = 30;
        let (next, outcome) = apply(&s, Command::Advance);
        assert_eq!(outcome, StepOutcome::HitSelf);
        assert_eq!(next.phase, Phase::Over);
        assert_eq!(next.high_score, 30);
        assert_eq!(next.body, body);
    }

    #[test]
    fn reverse_turn_rejected() {
        let s = running(
            vec![Point::new(5, 5), Point::new(4, 5)],
            Heading::Right,
            Point::new(20, 10),
        );
        let (next, outcome) = apply(&s, Command::Turn(Heading::Left));
        assert_eq!(outcome, StepOutcome::TurnRejected);
        assert_eq!(next.heading, Heading::Right);

        let (next, outcome) = apply(&s, Command::Turn(Heading::Up));
        assert_eq!(outcome, StepOutcome::Turned { heading: Heading::Up });
        assert_eq!(next.heading, Heading::Up);
    }

    #[test]
    fn turn_ignored_while_paused() {
        let mut s = running(
            vec![Point::new(5, 5), Point::new(4, 5)],
            Heading::Right,
            Point::new(20, 10),
        );
        s.phase = Phase::Paused;
        let (next, outcome) = apply(&s, Command::Turn(Heading::Up));
        assert_eq!(outcome, StepOutcome::Ignored);
        assert_eq!(next, s);
    }

    #[test]
    fn pause_toggles_but_not_when_over() {
        let s = running(vec![Point::new(5, 5)], Heading::Right, Point::new(9, 9));
        let (paused, o1) = apply(&s, Command::TogglePause);
        assert_eq!(o1, StepOutcome::Paused);
        let (resumed, o2) = apply(&paused, Command::TogglePause);
        assert_eq!(o2, StepOutcome::Resumed);
        assert_eq!(resumed.phase, Phase::Running);

        let mut over = s.clone();
        over.phase = Phase::Over;
        let (still_over, o3) = apply(&over, Command::TogglePause);
        assert_eq!(o3, StepOutcome::Ignored);
        assert_eq!(still_over.phase, Phase::Over);
    }

    #[test]
    fn reset_ignored_while_running() {
        let s = running(vec![Point::new(5, 5)], Heading::Right, Point::new(9, 9));
        let (next, outcome) = apply(&s, Command::Reset);
        assert_eq!(outcome, StepOutcome::Ignored);
        assert_eq!(next, s);
    }

    #[test]
    fn eating_at_max_length_moves_without_growth() {
        // Rows filled left to right; head is the last cell laid down.
        let mut body: Vec<Point> = (0..MAX_BODY_LEN as i32)
            .map(|i| Point::new(i % Board::WIDTH, i / Board::WIDTH))
            .collect();
        body.reverse();
        let head = body[0];
        let food = head.step(Heading::Down);
        assert!(!body.contains(&food));
        let s = running(body.clone(), Heading::Down, food);
        let (next, outcome) = apply(&s, Command::Advance);
        assert_eq!(outcome, StepOutcome::Ate { score: 10 });
        assert_eq!(next.body.len(), MAX_BODY_LEN);
        assert_eq!(next.head(), Some(food));
    }
}
