//! Integer grid coordinates and the two distance metrics the rules use.
//!
//! All simulation math is integer math, so there is no platform-dependent
//! rounding anywhere in the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell coordinate on the board.
///
/// Coordinates are signed so that off-board requests (e.g. `(-1, 4)`) can be
/// represented and rejected instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance `|dx| + |dy|`, the movement cost metric.
    ///
    /// ```
    /// use skirmish_core::grid::Position;
    ///
    /// let a = Position::new(10, 10);
    /// assert_eq!(a.manhattan_distance(Position::new(12, 11)), 3);
    /// ```
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev distance `max(|dx|, |dy|)`, the targeting metric.
    #[must_use]
    pub const fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy {
            dx
        } else {
            dy
        }
    }

    /// Offset this position by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The eight surrounding cells, row-major, without bounds filtering.
    #[must_use]
    pub fn neighbors8(self) -> [Self; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = Position::new(10, 10);
        assert_eq!(a.manhattan_distance(Position::new(12, 10)), 2);
        assert_eq!(a.manhattan_distance(Position::new(12, 11)), 3);
        assert_eq!(a.manhattan_distance(Position::new(7, 14)), 7);
        assert_eq!(a.manhattan_distance(a), 0);
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = Position::new(3, 3);
        assert_eq!(a.chebyshev_distance(Position::new(4, 4)), 1);
        assert_eq!(a.chebyshev_distance(Position::new(2, 4)), 1);
        assert_eq!(a.chebyshev_distance(Position::new(5, 4)), 2);
    }

    #[test]
    fn test_neighbors8_are_all_adjacent() {
        let center = Position::new(0, 0);
        let neighbors = center.neighbors8();
        assert!(neighbors.iter().all(|n| center.chebyshev_distance(*n) == 1));
        assert!(!neighbors.contains(&center));
    }
}
