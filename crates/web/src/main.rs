//! Web form for turning documents and text into speech.

mod page;
mod routes;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use state::AppState;
use std::sync::Arc;

/// Serve the text-to-speech form over HTTP.
#[derive(Parser, Debug)]
#[command(name = "speak-web")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "SPEAK_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    // The blocking HTTP clients must not be built on a runtime thread.
    let state = tokio::task::spawn_blocking(AppState::edge)
        .await
        .context("Service setup task failed")?
        .context("Failed to initialize services")?;
    let state = Arc::new(state);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    log::info!("Listening on http://{}", args.bind);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
