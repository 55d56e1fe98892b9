//! Clockwall - clock servers and a wall that watches several of them.
//!
//! This binary module is intentionally small: it parses CLI arguments,
//! sets up logging and delegates to the `server` or `client` modules.
//! Helper modules contain the wire format, the shared reading table and
//! the entry sorting used to order the wall.
//!
//! ```text
//! TZ=US/Eastern clockwall server --port 8010 &
//! TZ=Asia/Tokyo clockwall server --port 8020 &
//! clockwall wall NewYork=8010 Tokyo=localhost:8020
//! ```

mod client;
mod clock;
mod demo;
mod error;
mod mapsort;
mod server;
mod types;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use client::Source;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the local time to every client that connects.
    Server {
    /// Host or address to listen on
    #[arg(long, default_value = "localhost")]
    host: String,
    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,
    },
    /// Watch clock servers and print their times every second.
    Wall {
    /// Sources as NAME=HOST:PORT or NAME=PORT
    #[arg(value_name = "NAME=ENDPOINT", required = true)]
    sources: Vec<Source>,
    },
    /// Show key and value sorting on two sample maps.
    Demo {},
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    let result = match cli.command {
        Commands::Server { host, port } => server::run_server(&host, port, shutdown).await,
        Commands::Wall { sources } => client::run_wall(sources, shutdown).await,
        Commands::Demo {} => demo::run_demo(),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("clockwall: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupted, shutting down");
        shutdown.cancel();
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
