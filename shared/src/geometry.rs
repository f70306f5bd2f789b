use serde::{Deserialize, Serialize};

/// A cell on the board. Rows and columns are 1-based; row 1 and column 1
/// belong to the outer wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub y: u16,
    pub x: u16,
}

impl Position {
    pub const fn new(y: u16, x: u16) -> Self {
        Self { y, x }
    }

    /// Returns the neighbouring cell in `direction`.
    ///
    /// Coordinates saturate at the numeric bounds; the outer wall keeps a
    /// live snake away from row/column 0, so saturation never shows up in play.
    pub fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::North => Self::new(self.y.saturating_sub(1), self.x),
            Direction::South => Self::new(self.y.saturating_add(1), self.x),
            Direction::East => Self::new(self.y, self.x.saturating_add(1)),
            Direction::West => Self::new(self.y, self.x.saturating_sub(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Direction::North, Position::new(4, 4), Position::new(3, 4))]
    #[case(Direction::South, Position::new(4, 4), Position::new(5, 4))]
    #[case(Direction::East, Position::new(4, 4), Position::new(4, 5))]
    #[case(Direction::West, Position::new(4, 4), Position::new(4, 3))]
    #[case(Direction::North, Position::new(0, 4), Position::new(0, 4))]
    #[case(Direction::West, Position::new(4, 0), Position::new(4, 0))]
    fn test_position_step(
        #[case] direction: Direction,
        #[case] from: Position,
        #[case] expected: Position,
    ) {
        assert_eq!(from.step(direction), expected);
    }

    #[rstest]
    #[case(Direction::North, Direction::South)]
    #[case(Direction::South, Direction::North)]
    #[case(Direction::East, Direction::West)]
    #[case(Direction::West, Direction::East)]
    fn test_direction_opposite(#[case] direction: Direction, #[case] opposite: Direction) {
        assert_eq!(direction.opposite(), opposite);
        assert_eq!(direction.opposite().opposite(), direction);
    }
}
