use crate::geometry::{Direction, Position};
use crate::{GROW_AMOUNT, START_LIVES, START_PERK_CHARGES};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerkKind {
    WallWalk,
    Dash,
}

impl PerkKind {
    pub const ALL: [PerkKind; 2] = [PerkKind::WallWalk, PerkKind::Dash];
}

/// Counters for one perk kind.
///
/// `charges` is what the snake can still spend; `used` only ever grows while
/// the snake lives and is what clients diff to notice a fresh use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perk {
    pub charges: u16,
    pub used: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perks(BTreeMap<PerkKind, Perk>);

impl Perks {
    /// Every perk kind with `charges` charges and nothing used yet.
    pub fn full(charges: u16) -> Self {
        Self(
            PerkKind::ALL
                .iter()
                .map(|kind| (*kind, Perk { charges, used: 0 }))
                .collect(),
        )
    }

    pub fn get(&self, kind: PerkKind) -> Perk {
        self.0.get(&kind).copied().unwrap_or_default()
    }

    pub fn charges(&self, kind: PerkKind) -> u16 {
        self.get(kind).charges
    }

    pub fn used(&self, kind: PerkKind) -> u16 {
        self.get(kind).used
    }

    /// Spends one charge. Returns false, changing nothing, when none is left.
    pub fn use_perk(&mut self, kind: PerkKind) -> bool {
        let perk = self.0.entry(kind).or_default();
        if perk.charges == 0 {
            return false;
        }
        perk.charges -= 1;
        perk.used = perk.used.saturating_add(1);
        true
    }

    /// Gives back a charge spent by `use_perk` that turned out not to be needed.
    pub fn refund(&mut self, kind: PerkKind) {
        let perk = self.0.entry(kind).or_default();
        perk.charges = perk.charges.saturating_add(1);
        perk.used = perk.used.saturating_sub(1);
    }

    pub fn reload(&mut self, kind: PerkKind, charges: u16) {
        let perk = self.0.entry(kind).or_default();
        perk.charges = perk.charges.saturating_add(charges);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    /// Occupied cells, tail first, head last.
    occupied: VecDeque<Position>,
    direction: Direction,
    next_direction: Direction,
    pub lives: u8,
    pub score: u16,
    pub perks: Perks,
    grows: u16,
}

impl Snake {
    pub fn new(head: Position, direction: Direction) -> Self {
        Self {
            occupied: VecDeque::from([head]),
            direction,
            next_direction: direction,
            lives: START_LIVES,
            score: 0,
            perks: Perks::full(START_PERK_CHARGES),
            grows: 0,
        }
    }

    /// Puts the snake back to a single cell for a new round, keeping lives
    /// and score.
    pub fn respawn(&mut self, head: Position, direction: Direction) {
        self.occupied = VecDeque::from([head]);
        self.direction = direction;
        self.next_direction = direction;
        self.perks = Perks::full(START_PERK_CHARGES);
        self.grows = 0;
    }

    pub fn head(&self) -> Position {
        *self
            .occupied
            .back()
            .expect("snake body must never be empty")
    }

    pub fn occupied(&self) -> &VecDeque<Position> {
        &self.occupied
    }

    /// Occupied cells without the head.
    pub fn body(&self) -> impl Iterator<Item = &Position> {
        let len = self.occupied.len();
        assert!(len > 0, "snake body must never be empty");
        self.occupied.iter().take(len - 1)
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.occupied.contains(&pos)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn next_direction(&self) -> Direction {
        self.next_direction
    }

    pub fn grows(&self) -> u16 {
        self.grows
    }

    /// Occupied length plus growth still owed.
    pub fn growth_mass(&self) -> usize {
        self.occupied.len() + usize::from(self.grows)
    }

    /// Queues a turn for the next move, replacing any turn already queued.
    /// Reversing into the current direction is refused.
    pub fn change_direction(&mut self, direction: Direction) -> bool {
        if direction == self.direction.opposite() {
            return false;
        }
        self.next_direction = direction;
        true
    }

    /// Advances one cell. Keeps the tail while growth is owed.
    pub fn advance(&mut self) {
        self.direction = self.next_direction;
        let new_head = self.head().step(self.direction);
        self.occupied.push_back(new_head);

        if self.grows > 0 {
            self.grows -= 1;
        } else {
            self.occupied.pop_front();
        }
    }

    /// Moves the head to `pos` without touching the rest of the body.
    pub fn relocate_head(&mut self, pos: Position) {
        if let Some(head) = self.occupied.back_mut() {
            *head = pos;
        }
    }

    /// Grow candy: owe `GROW_AMOUNT` cells and score a point.
    pub fn eat(&mut self) {
        self.grows = GROW_AMOUNT;
        self.score = self.score.saturating_add(1);
    }

    /// Loses a life; returns true when none are left.
    pub fn crash(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives == 0
    }

    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }

    #[doc(hidden)]
    pub fn from_cells(cells: &[Position], direction: Direction) -> Self {
        assert!(!cells.is_empty(), "snake body must never be empty");
        let mut snake = Self::new(cells[cells.len() - 1], direction);
        snake.occupied = cells.iter().copied().collect();
        snake
    }

    #[doc(hidden)]
    pub fn set_grows(&mut self, grows: u16) {
        self.grows = grows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_snake() -> Snake {
        Snake::from_cells(
            &[
                Position::new(10, 5),
                Position::new(10, 6),
                Position::new(10, 7),
            ],
            Direction::East,
        )
    }

    #[test]
    fn test_new_snake() {
        let snake = Snake::new(Position::new(5, 5), Direction::East);

        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Position::new(5, 5));
        assert_eq!(snake.lives, START_LIVES);
        assert_eq!(snake.score, 0);
        assert_eq!(snake.perks.charges(PerkKind::Dash), START_PERK_CHARGES);
        assert_eq!(snake.perks.charges(PerkKind::WallWalk), START_PERK_CHARGES);
        assert_eq!(snake.perks.used(PerkKind::Dash), 0);
    }

    #[test]
    fn test_advance_keeps_length_without_growth() {
        let mut snake = straight_snake();

        snake.advance();

        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(10, 8));
        assert!(!snake.contains(Position::new(10, 5)));
    }

    #[test]
    fn test_advance_grows_while_owed() {
        let mut snake = straight_snake();
        snake.eat();
        assert_eq!(snake.grows(), GROW_AMOUNT);
        assert_eq!(snake.score, 1);

        for step in 1..=GROW_AMOUNT {
            snake.advance();
            assert_eq!(snake.len(), 3 + usize::from(step));
            assert_eq!(snake.grows(), GROW_AMOUNT - step);
        }

        snake.advance();
        assert_eq!(snake.len(), 3 + usize::from(GROW_AMOUNT));
    }

    #[test]
    fn test_reverse_turn_is_rejected() {
        let mut snake = straight_snake();

        assert!(!snake.change_direction(Direction::West));
        assert_eq!(snake.next_direction(), Direction::East);

        assert!(snake.change_direction(Direction::North));
        assert!(!snake.change_direction(Direction::West));
        assert_eq!(snake.next_direction(), Direction::North);
    }

    #[test]
    fn test_queued_turn_can_be_replaced() {
        let mut snake = straight_snake();

        assert!(snake.change_direction(Direction::North));
        assert!(snake.change_direction(Direction::South));
        assert_eq!(snake.next_direction(), Direction::South);

        snake.advance();
        assert_eq!(snake.direction(), Direction::South);
        assert!(!snake.change_direction(Direction::North));
    }

    #[test]
    fn test_turn_applies_on_next_advance() {
        let mut snake = straight_snake();
        snake.change_direction(Direction::North);

        assert_eq!(snake.direction(), Direction::East);
        snake.advance();
        assert_eq!(snake.direction(), Direction::North);
        assert_eq!(snake.head(), Position::new(9, 7));
    }

    #[test]
    fn test_body_excludes_head() {
        let snake = straight_snake();
        let body: Vec<Position> = snake.body().copied().collect();

        assert_eq!(body, vec![Position::new(10, 5), Position::new(10, 6)]);
    }

    #[test]
    fn test_crash_counts_down_lives() {
        let mut snake = straight_snake();
        snake.lives = 2;

        assert!(!snake.crash());
        assert!(snake.is_alive());
        assert!(snake.crash());
        assert!(!snake.is_alive());
        assert!(snake.crash());
        assert_eq!(snake.lives, 0);
    }

    #[test]
    fn test_respawn_keeps_lives_and_score() {
        let mut snake = straight_snake();
        snake.lives = 4;
        snake.score = 7;
        snake.perks.use_perk(PerkKind::Dash);
        snake.eat();

        snake.respawn(Position::new(3, 3), Direction::South);

        assert_eq!(snake.len(), 1);
        assert_eq!(snake.lives, 4);
        assert_eq!(snake.score, 8);
        assert_eq!(snake.grows(), 0);
        assert_eq!(snake.perks, Perks::full(START_PERK_CHARGES));
    }

    #[test]
    fn test_perk_use_and_refund() {
        let mut perks = Perks::full(1);

        assert!(perks.use_perk(PerkKind::WallWalk));
        assert_eq!(perks.get(PerkKind::WallWalk), Perk { charges: 0, used: 1 });
        assert!(!perks.use_perk(PerkKind::WallWalk));
        assert_eq!(perks.get(PerkKind::WallWalk), Perk { charges: 0, used: 1 });

        perks.refund(PerkKind::WallWalk);
        assert_eq!(perks.get(PerkKind::WallWalk), Perk { charges: 1, used: 0 });
    }

    #[test]
    fn test_perk_reload_and_missing_kind() {
        let mut perks = Perks::default();

        assert_eq!(perks.charges(PerkKind::Dash), 0);
        assert!(!perks.use_perk(PerkKind::Dash));

        perks.reload(PerkKind::Dash, 2);
        assert_eq!(perks.charges(PerkKind::Dash), 2);
        assert_eq!(perks.used(PerkKind::Dash), 0);
    }
}
