//! The per-player view of a game that travels server to client.

use crate::candy::{Candy, CandyKind};
use crate::geometry::{Direction, Position};
use crate::snake::{PerkKind, Perks, Snake};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Paused,
    Ongoing,
    RoundFinished,
    GameFinished,
}

/// What occupies a cell, from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Wall,
    Candy(CandyKind),
    OwnSnake,
    Opponent,
    Empty,
}

/// What a client learns about one snake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeView {
    pub perks: Perks,
    pub lives: u8,
    /// Occupied cells, tail first, head last.
    pub body: Vec<Position>,
    pub direction: Direction,
    pub score: u16,
}

impl SnakeView {
    pub fn head(&self) -> Option<Position> {
        self.body.last().copied()
    }

    pub fn used(&self, kind: PerkKind) -> u16 {
        self.perks.used(kind)
    }
}

impl Default for SnakeView {
    fn default() -> Self {
        Self {
            perks: Perks::default(),
            lives: 0,
            body: Vec::new(),
            direction: Direction::East,
            score: 0,
        }
    }
}

impl From<&Snake> for SnakeView {
    fn from(snake: &Snake) -> Self {
        Self {
            perks: snake.perks.clone(),
            lives: snake.lives,
            body: snake.occupied().iter().copied().collect(),
            direction: snake.direction(),
            score: snake.score,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub map_level: u16,
    pub state: GameState,
    pub candies: Vec<Candy>,
    pub player: SnakeView,
    pub opponents: Vec<SnakeView>,
}

impl Payload {
    /// The recipient's own snake followed by its opponents.
    pub fn snakes(&self) -> impl Iterator<Item = &SnakeView> {
        std::iter::once(&self.player).chain(self.opponents.iter())
    }
}

/// Everyone in `all` except the entry at `index`, order preserved.
pub fn opponents<T: Clone>(all: &[T], index: usize) -> Vec<T> {
    if index >= all.len() {
        return all.to_vec();
    }
    let mut rest = Vec::with_capacity(all.len() - 1);
    rest.extend_from_slice(&all[..index]);
    rest.extend_from_slice(&all[index + 1..]);
    rest
}
