use std::net::SocketAddr;
use std::path::PathBuf;

use adabra::{build_router, spawn_tick_sweep, AppState};
use adabra_room::spawn_reaper;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// ADABRA -- real-time server-authoritative buzzer coordinator for live
/// Brain-Ring-style quiz games.
#[derive(Parser, Debug)]
#[command(name = "adabra")]
#[command(about = "Buzzer coordinator server for live quiz games")]
#[command(version)]
struct Cli {
    /// Address to bind the HTTP + WebSocket server to.
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Directory of static pages served at `/`, `/host`, `/play`, `/screen`.
    #[arg(long, default_value = "public")]
    web_root: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let state = AppState::new();

    spawn_tick_sweep(state.clone());
    spawn_reaper(state.rooms.clone());

    let app = build_router(state, &cli.web_root);

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!(bind = %cli.bind, web_root = %cli.web_root.display(), "adabra listening");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn default_bind_address() {
        let cli = Cli::try_parse_from(["adabra"]).unwrap();
        assert_eq!(cli.bind.to_string(), "0.0.0.0:3000");
        assert_eq!(cli.web_root, std::path::PathBuf::from("public"));
    }

    #[test]
    fn custom_bind_address() {
        let cli = Cli::try_parse_from(["adabra", "--bind", "127.0.0.1:8080"]).unwrap();
        assert_eq!(cli.bind.to_string(), "127.0.0.1:8080");
    }
}
