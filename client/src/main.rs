use clap::Parser;
use client::events::GameEvent;
use client::game::GameClient;
use client::input::{controls, keys_from_line};
use log::info;
use shared::{GameState, PerkKind, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::interval;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Board width the server was started with
    #[arg(short = 'w', long, default_value_t = DEFAULT_BOARD_WIDTH)]
    width: u16,

    /// Board height (no short flag to avoid conflict with --help)
    #[arg(long, default_value_t = DEFAULT_BOARD_HEIGHT)]
    height: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut client = GameClient::connect(&args.server, args.width, args.height).await?;
    for event in GameEvent::ALL {
        client.add_listener(event, |event| println!("* {}", event));
    }
    println!("{}", controls());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = interval(Duration::from_millis(30));
    let mut last_state: Option<GameState> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        for key in keys_from_line(&line) {
                            client.press_key(key);
                        }
                    }
                    None => break,
                }
            },

            _ = poll.tick() => {
                client.update_payload();
                let payload = client.payload();
                if last_state != Some(payload.state) {
                    last_state = Some(payload.state);
                    println!(
                        "{:?} | level {} | lives {} | score {} | dash {} | wall-walk {}",
                        payload.state,
                        payload.map_level,
                        payload.player.lives,
                        payload.player.score,
                        payload.player.perks.charges(PerkKind::Dash),
                        payload.player.perks.charges(PerkKind::WallWalk),
                    );
                }
            },

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    client.disconnect();
    Ok(())
}
