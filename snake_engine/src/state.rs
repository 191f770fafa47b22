//! SnakeEngine: State Construction

use rand::Rng;

use crate::domain::{Board, Counters, GameState, Heading, Phase, Point, INITIAL_BODY_LEN};
use crate::occupancy::draw_free_cell;

/// Body of a freshly reset game: horizontal, centred, head facing right.
pub fn initial_body() -> Vec<Point> {
    let centre = Board::centre();
    (0..INITIAL_BODY_LEN as i32)
        .map(|i| Point::new(centre.x - i, centre.y))
        .collect()
}

/// Start a new game on top of `previous`.
///
/// Score, body, heading and phase are reinitialised and a fresh food
/// cell is drawn. `high_score` and the lifetime counters carry over;
/// `games_played` is incremented.
pub fn reset_state<R: Rng + ?Sized>(previous: &GameState, rng: &mut R) -> GameState {
    let body = initial_body();
    let food = draw_free_cell(&body, rng);
    let counters = Counters {
        games_played: previous.counters.games_played.saturating_add(1),
        food_eaten: previous.counters.food_eaten,
        longest_body: previous.counters.longest_body.max(body.len() as u32),
    };

    GameState {
        phase: Phase::Running,
        heading: Heading::Right,
        score: 0,
        high_score: previous.high_score.max(previous.score),
        body,
        food,
        counters,
    }
}

/// First game from nothing.
pub fn create_initial_state<R: Rng + ?Sized>(rng: &mut R) -> GameState {
    reset_state(&GameState::default(), rng)
}
