use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerConfig};
use shared::{CLIENT_TIMEOUT, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Snake arena game server")]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    /// Players needed before a session starts
    #[arg(short = 'n', long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(1..=16))]
    players: u16,
    /// Milliseconds per simulation tick
    #[arg(short, long, default_value_t = 100)]
    tick_ms: u64,
    /// Board width in cells, border included
    #[arg(long, default_value_t = DEFAULT_BOARD_WIDTH, value_parser = clap::value_parser!(u16).range(8..))]
    width: u16,
    /// Board height in cells, border included
    #[arg(long, default_value_t = DEFAULT_BOARD_HEIGHT, value_parser = clap::value_parser!(u16).range(8..))]
    height: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Some(hint) = logging_hint(std::env::var_os("RUST_LOG").is_some()) {
        eprintln!("{}", hint);
    }

    let args = Args::parse();

    let config = ServerConfig {
        addr: format!("{}:{}", args.host, args.port),
        players: usize::from(args.players),
        tick: Duration::from_millis(args.tick_ms.max(1)),
        width: args.width,
        height: args.height,
        client_timeout: CLIENT_TIMEOUT,
    };

    info!(
        "Starting server on {} ({}x{} board, {} ms ticks)",
        config.addr,
        config.width,
        config.height,
        config.tick.as_millis()
    );

    let mut server = Server::new(config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

/// Shown on stderr when `RUST_LOG` is unset and the default filter applies.
fn logging_hint(rust_log_set: bool) -> Option<&'static str> {
    if rust_log_set {
        None
    } else {
        Some("RUST_LOG not set, logging at info. Set RUST_LOG=debug for more detail")
    }
}
