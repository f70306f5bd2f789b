use crate::geometry::Direction;

pub const KEY_NORTH: char = 'w';
pub const KEY_WEST: char = 'a';
pub const KEY_SOUTH: char = 's';
pub const KEY_EAST: char = 'd';
pub const KEY_DASH: char = ' ';
pub const KEY_CONFIRM: char = '↵';

/// A player input, sent over the wire as a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    Dash,
    /// Start, resume, or begin the next round, depending on game state.
    Confirm,
}

impl Command {
    /// Keys outside the alphabet map to `None` and are ignored.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            KEY_NORTH => Some(Command::Turn(Direction::North)),
            KEY_WEST => Some(Command::Turn(Direction::West)),
            KEY_SOUTH => Some(Command::Turn(Direction::South)),
            KEY_EAST => Some(Command::Turn(Direction::East)),
            KEY_DASH => Some(Command::Dash),
            KEY_CONFIRM | '\n' | '\r' => Some(Command::Confirm),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            Command::Turn(Direction::North) => KEY_NORTH,
            Command::Turn(Direction::West) => KEY_WEST,
            Command::Turn(Direction::South) => KEY_SOUTH,
            Command::Turn(Direction::East) => KEY_EAST,
            Command::Dash => KEY_DASH,
            Command::Confirm => KEY_CONFIRM,
        }
    }

    /// Decodes the first UTF-8 code point of a datagram.
    pub fn from_datagram(data: &[u8]) -> Option<Self> {
        first_char(data).and_then(Self::from_key)
    }
}

/// The first code point of `data`, if it starts with valid UTF-8.
pub fn first_char(data: &[u8]) -> Option<char> {
    let prefix = &data[..data.len().min(4)];
    let text = match std::str::from_utf8(prefix) {
        Ok(text) => text,
        Err(e) => std::str::from_utf8(&prefix[..e.valid_up_to()]).ok()?,
    };
    text.chars().next()
}
