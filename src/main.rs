//! arenad - shared 2D virtual space server daemon

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use arenad::{Config, Server};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "arenad", version, about = "Shared 2D virtual space server")]
struct Args {
    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// SQLite database file; in-memory when neither this nor the config sets one
    #[arg(long)]
    database: Option<String>,

    /// Configuration file
    #[arg(long, default_value = "arenad.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "arenad=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let mut config = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = args.database {
        config.db_path = Some(database);
    }
    info!(
        bind = %config.bind_addr,
        database = config.db_path.as_deref().unwrap_or(":memory:"),
        step_rule = ?config.session.step_rule,
        "starting arenad"
    );

    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
