//! SnakeEngine: Core Domain Types
//!
//! Pure data. No behaviour beyond small conversions.
//! Wire codes on `Heading` and `Phase` are part of the shared layout
//! and must never be renumbered.

use serde::{Deserialize, Serialize};

// ── Board ──────────────────────────────────────────────────────────

/// Fixed playing field. Cells are addressed `0..WIDTH` x `0..HEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board;

impl Board {
    pub const WIDTH: i32 = 78;
    pub const HEIGHT: i32 = 18;

    /// Total number of cells on the board.
    pub const fn cell_count() -> usize {
        (Self::WIDTH * Self::HEIGHT) as usize
    }

    pub const fn contains(p: Point) -> bool {
        p.x >= 0 && p.x < Self::WIDTH && p.y >= 0 && p.y < Self::HEIGHT
    }

    /// Starting cell of the head after a reset.
    pub const fn centre() -> Point {
        Point::new(Self::WIDTH / 2, Self::HEIGHT / 2)
    }
}

/// Hard upper bound on body length; sized into the shared layout.
pub const MAX_BODY_LEN: usize = 1000;

/// Body length after a reset.
pub const INITIAL_BODY_LEN: usize = 3;

// The rejection sampler for food relies on free cells always existing.
const _: () = assert!(MAX_BODY_LEN < Board::cell_count());

// ── Geometry ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Unit displacement one cell along `heading`.
    pub const fn step(self, heading: Heading) -> Self {
        match heading {
            Heading::Up => Self::new(self.x, self.y - 1),
            Heading::Down => Self::new(self.x, self.y + 1),
            Heading::Left => Self::new(self.x - 1, self.y),
            Heading::Right => Self::new(self.x + 1, self.y),
        }
    }
}

/// Movement direction. Discriminants are the shared-layout codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Heading {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Heading {
    pub const fn opposite(self) -> Self {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }

    pub const fn code(self) -> u32 {
        self as u32
    }

    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Heading::Up),
            1 => Some(Heading::Down),
            2 => Some(Heading::Left),
            3 => Some(Heading::Right),
            _ => None,
        }
    }
}

/// Run phase of the current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Phase {
    Running = 0,
    Paused = 1,
    Over = 2,
}

impl Phase {
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Phase::Running),
            1 => Some(Phase::Paused),
            2 => Some(Phase::Over),
            _ => None,
        }
    }
}

// ── Rules ──────────────────────────────────────────────────────────

/// Tunable rule constants. Defaults are the classic game's values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameConstants {
    pub food_reward: u32,
    pub base_move_interval_ms: u64,
    pub min_move_interval_ms: u64,
    /// Every `speedup_every_score` points shave `speedup_step_ms` off the interval.
    pub speedup_every_score: u32,
    pub speedup_step_ms: u64,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            food_reward: 10,
            base_move_interval_ms: 200,
            min_move_interval_ms: 50,
            speedup_every_score: 50,
            speedup_step_ms: 10,
        }
    }
}

// ── State ──────────────────────────────────────────────────────────

/// Lifetime statistics. Never decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Counters {
    pub games_played: u32,
    pub food_eaten: u64,
    pub longest_body: u32,
}

/// Complete simulation snapshot; enough to resume play in another process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameState {
    pub phase: Phase,
    pub heading: Heading,
    pub score: u32,
    pub high_score: u32,
    /// Occupied cells, head first.
    pub body: Vec<Point>,
    pub food: Point,
    pub counters: Counters,
}

impl GameState {
    pub fn head(&self) -> Option<Point> {
        self.body.first().copied()
    }
}

impl Default for GameState {
    /// The canonical empty state: what a freshly stamped region decodes to.
    fn default() -> Self {
        Self {
            phase: Phase::Running,
            heading: Heading::Up,
            score: 0,
            high_score: 0,
            body: Vec::new(),
            food: Point::default(),
            counters: Counters::default(),
        }
    }
}

/// Structured outcome of a single command, for callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Advance requested while not Running.
    Idle,
    Moved,
    Ate { score: u32 },
    HitWall,
    HitSelf,
    Turned { heading: Heading },
    TurnRejected,
    Paused,
    Resumed,
    Reset,
    /// Command has no meaning in the current phase.
    Ignored,
}

impl StepOutcome {
    /// True when the command changed the state.
    pub fn mutated(self) -> bool {
        !matches!(self, StepOutcome::Idle | StepOutcome::TurnRejected | StepOutcome::Ignored)
    }

    pub fn ended_game(self) -> bool {
        matches!(self, StepOutcome::HitWall | StepOutcome::HitSelf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_codes_are_stable() {
        for h in [Heading::Up, Heading::Down, Heading::Left, Heading::Right] {
            assert_eq!(Heading::from_code(h.code()), Some(h));
            assert_eq!(h.opposite().opposite(), h);
        }
        assert_eq!(Heading::from_code(4), None);
    }

    #[test]
    fn phase_codes_are_stable() {
        assert_eq!(Phase::Running.code(), 0);
        assert_eq!(Phase::Paused.code(), 1);
        assert_eq!(Phase::Over.code(), 2);
        assert_eq!(Phase::from_code(7), None);
    }

    #[test]
    fn board_bounds() {
        assert!(Board::contains(Point::new(0, 0)));
        assert!(Board::contains(Point::new(77, 17)));
        assert!(!Board::contains(Point::new(78, 0)));
        assert!(!Board::contains(Point::new(0, -1)));
        assert_eq!(Board::centre(), Point::new(39, 9));
    }
}
