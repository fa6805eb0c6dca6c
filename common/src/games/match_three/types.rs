use serde::{Deserialize, Serialize};
use std::fmt;

pub type GemId = u64;

/// Shortest run that counts as a match.
pub const MIN_MATCH: usize = 3;

/// Largest distance between a reported settle position and the logical cell
/// for the gem to count as settled.
pub const SETTLE_EPSILON: f32 = 0.001;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum GemType {
    Blue,
    Green,
    Orange,
    Purple,
    Red,
    Teal,
}

impl GemType {
    pub const ALL: [GemType; 6] = [
        GemType::Blue,
        GemType::Green,
        GemType::Orange,
        GemType::Purple,
        GemType::Red,
        GemType::Teal,
    ];

    pub fn symbol(self) -> char {
        match self {
            GemType::Blue => 'B',
            GemType::Green => 'G',
            GemType::Orange => 'O',
            GemType::Purple => 'P',
            GemType::Red => 'R',
            GemType::Teal => 'T',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'B' => Some(GemType::Blue),
            'G' => Some(GemType::Green),
            'O' => Some(GemType::Orange),
            'P' => Some(GemType::Purple),
            'R' => Some(GemType::Red),
            'T' => Some(GemType::Teal),
            _ => None,
        }
    }
}

impl fmt::Display for GemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Cell coordinate; `y == 0` is the bottom row, gems fall towards it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Step by `(dx, dy)`; `None` when the result would be negative.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Position> {
        let x = self.x as i64 + dx as i64;
        let y = self.y as i64 + dy as i64;
        if x < 0 || y < 0 {
            return None;
        }
        Some(Position::new(x as usize, y as usize))
    }

    /// True iff the cells differ by exactly one step along exactly one axis.
    pub fn is_adjacent(self, other: Position) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    /// The two opposite unit steps along this axis, negative first.
    pub fn directions(self) -> [(i32, i32); 2] {
        match self {
            Axis::Horizontal => [(-1, 0), (1, 0)],
            Axis::Vertical => [(0, -1), (0, 1)],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SwapRequest {
    pub from: Position,
    pub to: Position,
}

impl SwapRequest {
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_round_trip_covers_palette() {
        for gem_type in GemType::ALL {
            assert_eq!(GemType::from_symbol(gem_type.symbol()), Some(gem_type));
        }
        assert_eq!(GemType::from_symbol('r'), Some(GemType::Red));
        assert_eq!(GemType::from_symbol('.'), None);
    }

    #[test]
    fn test_adjacency_is_manhattan_one() {
        let origin = Position::new(2, 2);
        assert!(origin.is_adjacent(Position::new(3, 2)));
        assert!(origin.is_adjacent(Position::new(2, 1)));
        assert!(!origin.is_adjacent(Position::new(3, 3)));
        assert!(!origin.is_adjacent(Position::new(4, 2)));
        assert!(!origin.is_adjacent(origin));
    }

    #[test]
    fn test_offset_refuses_negative() {
        assert_eq!(Position::new(0, 3).offset(-1, 0), None);
        assert_eq!(Position::new(0, 3).offset(0, -1), Some(Position::new(0, 2)));
    }
}
