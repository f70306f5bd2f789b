//! Deterministic wall layouts.
//!
//! A [`Map`] is a pure function of `(level, width, height)`: the server uses
//! it for collision checks and the client rebuilds the same layout locally
//! whenever the level in a received payload changes, so walls never have to
//! travel over the wire.

use crate::geometry::Position;
use std::collections::HashSet;

/// Wall layout drawn on top of the outer border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallPattern {
    /// Border only.
    Open,
    /// One horizontal wall across the middle row.
    Corridor,
    /// Two tall vertical walls left and right of the centre.
    Columns,
    /// Four offset segments forming a pinwheel of chambers.
    Chambers,
    /// Four diagonal arms forming an open cross.
    Diagonals,
}

impl WallPattern {
    pub fn for_level(level: u16) -> Self {
        match level {
            0 | 1 => WallPattern::Open,
            2 => WallPattern::Corridor,
            3 => WallPattern::Columns,
            4 => WallPattern::Chambers,
            _ => WallPattern::Diagonals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    level: u16,
    width: u16,
    height: u16,
    walls: HashSet<Position>,
}

impl Map {
    pub fn new(level: u16, width: u16, height: u16) -> Self {
        let mut map = Self {
            level,
            width,
            height,
            walls: HashSet::new(),
        };
        map.draw_border();
        map.draw_pattern(WallPattern::for_level(level));
        map
    }

    pub fn level(&self) -> u16 {
        self.level
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.walls.contains(&pos)
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    /// True for cells strictly inside the outer border.
    pub fn is_inside(&self, pos: Position) -> bool {
        pos.x > 1 && pos.x < self.width && pos.y > 1 && pos.y < self.height
    }

    /// Number of interior cells that are not walls.
    pub fn free_cells(&self) -> usize {
        let interior =
            usize::from(self.width.saturating_sub(2)) * usize::from(self.height.saturating_sub(2));
        let inner_walls = self.walls.iter().filter(|w| self.is_inside(**w)).count();
        interior - inner_walls
    }

    fn draw_border(&mut self) {
        for x in 1..=self.width {
            self.walls.insert(Position::new(1, x));
            self.walls.insert(Position::new(self.height, x));
        }
        for y in 1..=self.height {
            self.walls.insert(Position::new(y, 1));
            self.walls.insert(Position::new(y, self.width));
        }
    }

    fn draw_pattern(&mut self, pattern: WallPattern) {
        let (w, h) = (self.width, self.height);

        match pattern {
            WallPattern::Open => {}
            WallPattern::Corridor => {
                self.hline(h / 2, w / 5, w - w / 5);
            }
            WallPattern::Columns => {
                self.vline(w / 4, h / 6, h - h / 6);
                self.vline(w - w / 4 + 1, h / 6, h - h / 6);
            }
            WallPattern::Chambers => {
                self.hline(h / 4, 2, w / 2);
                self.hline(h - h / 4 + 1, w / 2 + 1, w.saturating_sub(1));
                self.vline(w - w / 3, 2, h / 2);
                self.vline(w / 3, h / 2 + 1, h.saturating_sub(1));
            }
            WallPattern::Diagonals => {
                let arm = w.min(h) / 4;
                let (top, left) = (h / 5, w / 5);
                let (bottom, right) = (h - h / 5, w - w / 5);
                for i in 0..arm {
                    self.insert_inside(Position::new(top + i, left + i));
                    self.insert_inside(Position::new(top + i, right.saturating_sub(i)));
                    self.insert_inside(Position::new(bottom.saturating_sub(i), left + i));
                    self.insert_inside(Position::new(
                        bottom.saturating_sub(i),
                        right.saturating_sub(i),
                    ));
                }
            }
        }
    }

    fn hline(&mut self, y: u16, from_x: u16, to_x: u16) {
        for x in from_x..=to_x {
            self.insert_inside(Position::new(y, x));
        }
    }

    fn vline(&mut self, x: u16, from_y: u16, to_y: u16) {
        for y in from_y..=to_y {
            self.insert_inside(Position::new(y, x));
        }
    }

    // Pattern walls never touch the border rows/columns.
    fn insert_inside(&mut self, pos: Position) {
        if self.is_inside(pos) {
            self.walls.insert(pos);
        }
    }
}
