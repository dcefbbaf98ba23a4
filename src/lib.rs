//! arenad - shared 2D virtual space server daemon
//!
//! Users sign up, build spaces from an admin-curated catalog, and meet in
//! them over a WebSocket presence protocol.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod db;
pub mod directory;
pub mod engine;
pub mod spaces;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use api::AppState;
use db::Database;
use engine::{RoomRegistry, RoomSettings, SpawnStrategy, StepRule};

/// Presence engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Bounded outbound queue per connection
    pub outbox_capacity: usize,
    pub spawn: SpawnStrategy,
    pub step_rule: StepRule,
    /// Treat static elements as walls for spawning and movement
    pub block_static_elements: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: 64,
            spawn: SpawnStrategy::default(),
            step_rule: StepRule::default(),
            block_static_elements: false,
        }
    }
}

impl SessionConfig {
    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            step_rule: self.step_rule,
            block_static_elements: self.block_static_elements,
            spawn: self.spawn.policy(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// None = in-memory database
    pub db_path: Option<String>,
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: None,
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Layer defaults, then the TOML file (if it exists), then `ARENAD_*`
    /// environment variables. Nested keys use `__`, e.g.
    /// `ARENAD_SESSION__STEP_RULE=diagonal`.
    pub fn load(file: &Path) -> Result<Self, figment::Error> {
        Self::figment(file).extract()
    }

    fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("ARENAD_").split("__"))
    }
}

/// The arenad server instance
pub struct Server {
    config: Config,
    db: Arc<Database>,
    registry: RoomRegistry,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::new(config.db_path.as_deref()).await?;
        let registry = RoomRegistry::new(config.session.room_settings());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            db: Arc::new(db),
            registry,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get the database handle
    pub fn db(&self) -> Arc<Database> {
        self.db.clone()
    }

    /// Live rooms
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(AppState::new(
            self.db.clone(),
            self.registry.clone(),
            self.config.session.outbox_capacity,
        ))
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "arenad listening");

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("arenad shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
