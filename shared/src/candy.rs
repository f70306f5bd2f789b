use crate::geometry::Position;
use crate::snake::PerkKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandyKind {
    Grow,
    WallWalk,
    Dash,
}

impl CandyKind {
    /// The perk a candy recharges, if any.
    pub fn perk(self) -> Option<PerkKind> {
        match self {
            CandyKind::Grow => None,
            CandyKind::WallWalk => Some(PerkKind::WallWalk),
            CandyKind::Dash => Some(PerkKind::Dash),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candy {
    pub kind: CandyKind,
    pub position: Position,
}

impl Candy {
    pub fn new(kind: CandyKind, position: Position) -> Self {
        Self { kind, position }
    }

    pub fn grow(position: Position) -> Self {
        Self::new(CandyKind::Grow, position)
    }
}
