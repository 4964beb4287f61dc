use carmine::config::Config;
use carmine::{server, DEFAULT_PORT};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> carmine::Result<()> {
    set_up_logging()?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_path(path).await?,
        None => Config::default(),
    };

    // Command line switches win over the config file.
    let address = if cli.listen_addr.is_some() || cli.port.is_some() {
        format!(
            "{}:{}",
            cli.listen_addr.as_deref().unwrap_or("0.0.0.0"),
            cli.port.as_deref().unwrap_or(DEFAULT_PORT)
        )
    } else {
        config.address_or_default()
    };

    // Bind a TCP listener
    let listener = TcpListener::bind(&address).await?;
    info!(%address, "listening");

    server::run(listener, config, shutdown_signal()).await?;

    Ok(())
}

fn set_up_logging() -> carmine::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()?;
    Ok(())
}

/// Completes on the first of SIGHUP, SIGQUIT, SIGTERM or SIGINT, each of
/// which means "stop accepting and drain".
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");
    let mut quit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");
    let mut terminate = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut interrupt = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = hangup.recv() => {},
        _ = quit.recv() => {},
        _ = terminate.recv() => {},
        _ = interrupt.recv() => {},
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[derive(Parser, Debug)]
#[clap(
    name = "carmine-server",
    version,
    author,
    about = "An in-memory Redis-compatible server"
)]
struct Cli {
    #[clap(name = "listen", long)]
    listen_addr: Option<String>,

    #[clap(name = "port", long)]
    port: Option<String>,

    #[clap(name = "config", long)]
    config: Option<String>,
}
