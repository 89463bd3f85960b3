//! Multi-room sequence-memory game server using the async actor model.
//!
//! The server spawns a `RoomActor` per game room, managed by the
//! `RoomRegistry`, and bridges clients to rooms over WebSocket.

mod api;
mod config;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use sequence_recall::RoomRegistry;

use crate::{api::AppState, config::ServerConfig};

const HELP: &str = "\
Run a multi-room sequence-memory game server

USAGE:
  sr_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8008]
  --capacity   N           Players per room            [default: env ROOM_CAPACITY or 2]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  ROOM_CAPACITY            Players per room
  COUNTDOWN_SECS           Countdown length before the first round
";

struct Args {
    bind: Option<SocketAddr>,
    capacity: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists.
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        capacity: pargs.opt_value_from_str("--capacity")?,
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(args.bind, args.capacity)?;
    info!("starting sequence-recall server at {}", config.bind);

    let registry = Arc::new(RoomRegistry::new(config.room.clone()));
    let state = AppState { registry };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("listening on {}", config.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
