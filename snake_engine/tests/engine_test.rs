//! Engine-level behaviour: rule scenarios, determinism, and properties
//! over random command streams.

use proptest::prelude::*;

use snake_engine::commands::Command;
use snake_engine::domain::{Board, GameState, Heading, Phase, Point, StepOutcome};
use snake_engine::engine::{ResumeOutcome, SnakeEngine};
use snake_engine::hashing::canonical_hash;
use snake_engine::invariants::{try_validate_invariants, InvalidResumeState};
use snake_engine::occupancy::is_occupied;
use snake_engine::ENGINE_VERSION;

fn run(seed: u64, commands: &[Command]) -> SnakeEngine {
    let mut engine = SnakeEngine::new(seed);
    for c in commands {
        engine.apply(*c);
    }
    engine
}

#[test]
fn fresh_game_matches_reset_rules() {
    let engine = SnakeEngine::new(42);
    let s = engine.state();
    assert_eq!(s.phase, Phase::Running);
    assert_eq!(s.heading, Heading::Right);
    assert_eq!(s.score, 0);
    assert_eq!(
        s.body,
        vec![Point::new(39, 9), Point::new(38, 9), Point::new(37, 9)]
    );
    assert!(!is_occupied(&s.body, s.food));
    assert_eq!(s.counters.games_played, 1);
    assert_eq!(s.counters.longest_body, 3);
}

#[test]
fn eating_food_grows_and_scores() {
    let mut engine = SnakeEngine::new(3);
    let mut state = engine.state().clone();
    state.food = Point::new(40, 9);
    engine.load(state);

    let outcome = engine.apply(Command::Advance);
    let s = engine.state();
    assert_eq!(outcome, StepOutcome::Ate { score: 10 });
    assert_eq!(s.body.len(), 4);
    assert_eq!(s.head(), Some(Point::new(40, 9)));
    assert!(!is_occupied(&s.body, s.food));
    assert!(Board::contains(s.food));
    assert_eq!(s.counters.food_eaten, 1);
    assert_eq!(s.counters.longest_body, 4);
}

#[test]
fn wall_ends_game_and_freezes_body() {
    let mut engine = SnakeEngine::new(5);
    let mut state = engine.state().clone();
    state.body = vec![Point::new(77, 2), Point::new(76, 2), Point::new(75, 2)];
    state.food = Point::new(1, 1);
    state.score = 120;
    state.high_score = 90;
    engine.load(state);

    assert_eq!(engine.apply(Command::Advance), StepOutcome::HitWall);
    let over = engine.state().clone();
    assert_eq!(over.phase, Phase::Over);
    assert_eq!(over.high_score, 120);

    // Idle ticks after the game ended change nothing.
    for _ in 0..5 {
        assert_eq!(engine.apply(Command::Advance), StepOutcome::Idle);
    }
    assert_eq!(engine.state(), &over);
}

#[test]
fn high_score_survives_reset() {
    let mut engine = SnakeEngine::new(9);
    let mut state = engine.state().clone();
    state.body = vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)];
    state.heading = Heading::Left;
    state.food = Point::new(5, 5);
    state.score = 70;
    engine.load(state);

    engine.apply(Command::Advance);
    assert_eq!(engine.apply(Command::Reset), StepOutcome::Reset);
    let s = engine.state();
    assert_eq!(s.score, 0);
    assert_eq!(s.high_score, 70);
    assert_eq!(s.phase, Phase::Running);
    assert_eq!(s.counters.games_played, 2);
}

#[test]
fn same_seed_same_hash() {
    let script = [
        Command::Advance,
        Command::Turn(Heading::Up),
        Command::Advance,
        Command::Advance,
        Command::Turn(Heading::Left),
        Command::Advance,
        Command::TogglePause,
        Command::Advance,
        Command::TogglePause,
        Command::Advance,
    ];
    let a = run(1234, &script);
    let b = run(1234, &script);
    assert_eq!(canonical_hash(a.state()), canonical_hash(b.state()));
    assert_eq!(ENGINE_VERSION, 1);
}

#[test]
fn resume_or_reset_handles_bad_handover() {
    let mut engine = SnakeEngine::new(11);
    let good = engine.state().clone();
    assert_eq!(engine.resume_or_reset(good.clone()), ResumeOutcome::Resumed);
    assert_eq!(engine.state(), &good);

    let empty = GameState::default();
    assert_eq!(
        engine.resume_or_reset(empty),
        ResumeOutcome::Reset(InvalidResumeState::EmptyBody)
    );
    assert_eq!(engine.state().body.len(), 3);

    let mut over = good;
    over.phase = Phase::Over;
    over.score = 40;
    over.high_score = 40;
    assert_eq!(
        engine.resume_or_reset(over),
        ResumeOutcome::Reset(InvalidResumeState::GameOver)
    );
    assert_eq!(engine.state().high_score, 40);
    assert_eq!(engine.state().phase, Phase::Running);
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        6 => Just(Command::Advance),
        1 => Just(Command::Turn(Heading::Up)),
        1 => Just(Command::Turn(Heading::Down)),
        1 => Just(Command::Turn(Heading::Left)),
        1 => Just(Command::Turn(Heading::Right)),
        1 => Just(Command::TogglePause),
        1 => Just(Command::Reset),
    ]
}

proptest! {
    #[test]
    fn step_never_shrinks_body(seed in any::<u64>(), commands in prop::collection::vec(command_strategy(), 1..300)) {
        let mut engine = SnakeEngine::new(seed);
        for c in commands {
            let before = engine.state().clone();
            let outcome = engine.apply(c);
            let after = engine.state();
            prop_assert!(try_validate_invariants(after).is_ok());

            if c == Command::Advance && before.phase == Phase::Running {
                let grown = after.body.len() as i64 - before.body.len() as i64;
                prop_assert!(grown == 0 || grown == 1);
                prop_assert_eq!(grown == 1, matches!(outcome, StepOutcome::Ate { .. }));
            }
            if after.phase == Phase::Over {
                prop_assert!(after.high_score >= after.score);
            }
            prop_assert!(after.high_score >= before.high_score);
            prop_assert!(after.counters.games_played >= before.counters.games_played);
            prop_assert!(after.counters.food_eaten >= before.counters.food_eaten);
            prop_assert!(after.counters.longest_body >= before.counters.longest_body);
        }
    }

    #[test]
    fn reverse_turn_always_rejected(seed in any::<u64>(), heading in prop_oneof![
        Just(Heading::Up), Just(Heading::Down), Just(Heading::Left), Just(Heading::Right)
    ]) {
        let mut engine = SnakeEngine::new(seed);
        let mut state = engine.state().clone();
        state.heading = heading;
        engine.load(state);
        prop_assert_eq!(engine.apply(Command::Turn(heading.opposite())), StepOutcome::TurnRejected);
        prop_assert_eq!(engine.state().heading, heading);
    }
}
