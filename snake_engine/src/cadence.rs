//! SnakeEngine: Movement Cadence
//!
//! Integer millisecond arithmetic only. The interval shrinks with score
//! and never drops below the configured floor.

use std::time::Duration;

use crate::domain::GameConstants;

/// Interval between two `Advance` steps at the given score.
pub fn move_interval(score: u32, constants: &GameConstants) -> Duration {
    let steps = if constants.speedup_every_score == 0 {
        0
    } else {
        u64::from(score / constants.speedup_every_score)
    };
    let reduction = steps.saturating_mul(constants.speedup_step_ms);
    let ms = constants
        .base_move_interval_ms
        .saturating_sub(reduction)
        .max(constants.min_move_interval_ms);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_interval_at_zero() {
        let c = GameConstants::default();
        assert_eq!(move_interval(0, &c), Duration::from_millis(200));
        assert_eq!(move_interval(49, &c), Duration::from_millis(200));
    }

    #[test]
    fn interval_ramps_with_score() {
        let c = GameConstants::default();
        assert_eq!(move_interval(50, &c), Duration::from_millis(190));
        assert_eq!(move_interval(500, &c), Duration::from_millis(100));
    }

    #[test]
    fn interval_clamped_to_floor() {
        let c = GameConstants::default();
        assert_eq!(move_interval(750, &c), Duration::from_millis(50));
        assert_eq!(move_interval(u32::MAX, &c), Duration::from_millis(50));
    }

    #[test]
    fn zero_divisor_disables_ramp() {
        let c = GameConstants {
            speedup_every_score: 0,
            ..GameConstants::default()
        };
        assert_eq!(move_interval(10_000, &c), Duration::from_millis(200));
    }
}
