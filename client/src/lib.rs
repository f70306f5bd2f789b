//! # Snake Arena Client Library
//!
//! A thin client for the arena server. It renders nothing itself: it keeps
//! the latest authoritative payload, rebuilds the map locally, and turns
//! each new payload into discrete events for whoever wants to react to
//! them (sound, animation, a status line).
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! UDP transport with a bounded handshake, a reader task that unframes
//! datagrams, and a writer task that sends keys or keep-alive pings.
//!
//! ### Game Module (`game`)
//! The client view: payload decoding, map regeneration on level change,
//! field queries and event derivation by diffing consecutive payloads.
//!
//! ### Events Module (`events`)
//! Event kinds and a listener registry, dispatched from their own task so a
//! slow listener never delays the next payload.
//!
//! ### Input Module (`input`)
//! Maps lines of terminal input to command keys.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::events::GameEvent;
//! use client::game::GameClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = GameClient::connect("127.0.0.1:8080", 40, 40).await?;
//!     client.add_listener(GameEvent::PlayerAte, |event| println!("{}", event));
//!
//!     client.press_key('↵');
//!     loop {
//!         client.update_payload();
//!         tokio::time::sleep(std::time::Duration::from_millis(30)).await;
//!     }
//! }
//! ```

pub mod events;
pub mod game;
pub mod input;
pub mod network;
