//! # Snake Arena Server Library
//!
//! The authoritative side of the arena. It owns the only real copy of the
//! game, applies player keys once per tick, and sends each player its own
//! view of the result.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The simulation engine:
//! - Snake movement, growth and the wall-walk perk
//! - Collision resolution after all snakes have moved
//! - Candy placement, level progression and the round/game state machine
//!
//! ### Client Manager Module (`client_manager`)
//! The registry of peers in the current session:
//! - Handshake registration while the lobby is open
//! - Per-peer command and update queues that drop the oldest entry
//! - Silence detection for lost connections
//!
//! ### Network Module (`network`)
//! UDP plumbing and the session loop:
//! - A reader task routing datagrams by their first key
//! - One writer task per peer draining its update queue
//! - A timeout task that ends the session when a peer goes silent
//! - The tick loop, which re-sends the last state between ticks
//!
//! ## Session Lifecycle
//!
//! A session starts by listening until every player slot is filled. The game
//! then waits paused for a confirm key and runs until any peer is lost, at
//! which point every peer is dropped and the lobby opens again.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         addr: "0.0.0.0:8080".to_string(),
//!         players: 2,
//!         ..ServerConfig::default()
//!     };
//!     let mut server = Server::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
