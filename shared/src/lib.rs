use std::time::Duration;

pub mod candy;
pub mod codec;
pub mod command;
pub mod geometry;
pub mod map;
pub mod payload;
pub mod queue;
pub mod snake;

pub use candy::{Candy, CandyKind};
pub use command::Command;
pub use geometry::{Direction, Position};
pub use map::Map;
pub use payload::{Field, GameState, Payload, SnakeView};
pub use queue::LatestQueue;
pub use snake::{Perk, PerkKind, Perks, Snake};

pub const DEFAULT_BOARD_WIDTH: u16 = 40;
pub const DEFAULT_BOARD_HEIGHT: u16 = 40;

pub const START_LIVES: u8 = 10;
pub const START_PERK_CHARGES: u16 = 3;
/// Cells owed to a snake after eating a grow candy.
pub const GROW_AMOUNT: u16 = 5;
/// Moves performed by one dash.
pub const DASH_STEPS: usize = 5;
/// Grow candies eaten (summed over all snakes) before the level advances.
pub const CANDIES_PER_LEVEL: usize = 8;
pub const MAX_LEVEL: u16 = 5;
/// One in this many ongoing ticks spawns a perk candy.
pub const PERK_CANDY_CHANCE: u32 = 40;
pub const MAX_PERK_CANDIES: usize = 2;

pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
/// Unchanged state is re-sent this many times per tick to cover lost datagrams.
pub const RESENDS_PER_TICK: u32 = 3;

pub const HANDSHAKE_REQUEST: u8 = b'?';
pub const HANDSHAKE_RESPONSE: u8 = b'!';

pub const SERVER_COMMAND_QUEUE: usize = 3;
pub const SERVER_STATE_QUEUE: usize = 1;
pub const CLIENT_STATE_QUEUE: usize = 5;
pub const CLIENT_COMMAND_QUEUE: usize = 3;

pub const CONNECT_ATTEMPTS: u32 = 10;
pub const CONNECT_BACKOFF: Duration = Duration::from_millis(200);
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

pub const MAX_FRAME_SIZE: usize = 64 * 1024;
