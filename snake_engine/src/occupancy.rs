//! SnakeEngine: Occupancy Utilities
//!
//! Pure queries over the body's occupied cells.

use std::collections::BTreeSet;

use rand::Rng;

use crate::domain::{Board, Point};

/// True if `cell` is one of `body`'s cells.
pub fn is_occupied(body: &[Point], cell: Point) -> bool {
    body.iter().any(|p| *p == cell)
}

/// True if the head (index 0) shares a cell with any other segment.
pub fn head_overlaps_body(body: &[Point]) -> bool {
    match body.split_first() {
        Some((head, rest)) => rest.contains(head),
        None => false,
    }
}

/// First cell that appears twice in `body`, if any.
pub fn first_duplicate(body: &[Point]) -> Option<Point> {
    let mut seen: BTreeSet<(i32, i32)> = BTreeSet::new();
    body.iter().copied().find(|p| !seen.insert((p.x, p.y)))
}

/// Draw a uniformly random board cell not covered by `body`.
///
/// Rejection sampling. Terminates because the body is bounded well
/// below the board's cell count.
pub fn draw_free_cell<R: Rng + ?Sized>(body: &[Point], rng: &mut R) -> Point {
    loop {
        let candidate = Point::new(
            rng.random_range(0..Board::WIDTH),
            rng.random_range(0..Board::HEIGHT),
        );
        if !is_occupied(body, candidate) {
            return candidate;
        }
    }
}
