//! Performance benchmarks for critical game systems

use client::game::derive_events;
use server::game::Game;
use shared::codec::{decode_payload, encode_payload, frame, unframe};
use shared::map::Map;
use shared::queue::LatestQueue;
use shared::{Direction, GameState, PerkKind, Position, Snake, SnakeView};
use std::time::Instant;

/// Benchmarks engine ticks with a full four player arena
#[test]
fn benchmark_engine_tick() {
    let mut game = Game::with_seed(4, 40, 40, 42);
    game.toggle_paused();

    let iterations = 1000;
    let start = Instant::now();

    for _ in 0..iterations {
        if game.state() != GameState::Ongoing {
            game.reset();
        }
        game.tick();
    }

    let duration = start.elapsed();
    println!(
        "Engine tick: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // A tick must stay far below the 100ms tick interval
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks the full wire path for one payload
#[test]
fn benchmark_payload_codec() {
    let mut game = Game::with_seed(4, 40, 40, 42);
    game.toggle_paused();
    for _ in 0..20 {
        game.tick();
    }
    let payload = game.payload_for(0).unwrap();

    let iterations = 1000;
    let start = Instant::now();

    for _ in 0..iterations {
        let datagram = frame(&encode_payload(&payload).unwrap()).unwrap();
        let decoded = decode_payload(&unframe(&datagram).unwrap()).unwrap();
        assert_eq!(decoded.map_level, payload.map_level);
    }

    let duration = start.elapsed();
    println!(
        "Payload codec: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks map generation across every level
#[test]
fn benchmark_map_generation() {
    let iterations = 1000;
    let start = Instant::now();

    for i in 0..iterations {
        let map = Map::new((i % 5 + 1) as u16, 40, 40);
        assert!(map.wall_count() > 0);
    }

    let duration = start.elapsed();
    println!(
        "Map generation: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks event derivation between two payloads
#[test]
fn benchmark_event_derivation() {
    let mut game = Game::with_seed(4, 40, 40, 42);
    let old = game.payload_for(0).unwrap();
    game.toggle_paused();
    let mut new = game.payload_for(0).unwrap();
    new.player.score += 1;
    new.player.perks.use_perk(PerkKind::Dash);

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let events = derive_events(&old, &new);
        assert!(!events.is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Event derivation: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks overwrite-on-full queue pushes
#[test]
fn benchmark_latest_queue() {
    let queue = LatestQueue::new(3);
    let view = SnakeView::from(&Snake::new(Position::new(5, 5), Direction::East));

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        queue.push(view.clone());
    }

    let duration = start.elapsed();
    println!(
        "Queue push: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(queue.len(), 3);
    assert!(duration.as_millis() < 1000);
}
