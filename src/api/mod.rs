//! HTTP API module - REST endpoints and WebSocket

mod admin;
mod auth;
mod error;
mod extract;
mod spaces;
mod user;
mod websocket;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::directory::DbDirectory;
use crate::engine::{IdentityLookup, RoomRegistry, SpaceLookup};

pub use error::{ApiError, ErrorResponse};
pub use extract::{AdminUser, AuthUser};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub registry: RoomRegistry,
    pub identity: Arc<dyn IdentityLookup>,
    pub spaces: Arc<dyn SpaceLookup>,
    /// Per-connection outbound queue size
    pub outbox_capacity: usize,
}

impl AppState {
    /// State backed by `db` for both the REST API and the join lookups
    pub fn new(db: Arc<Database>, registry: RoomRegistry, outbox_capacity: usize) -> Self {
        let directory = Arc::new(DbDirectory::new(db.pool().clone()));
        Self {
            db,
            registry,
            identity: directory.clone(),
            spaces: directory,
            outbox_capacity,
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(user::router())
        .merge(admin::router())
        .merge(spaces::router());

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/ws", get(websocket::ws_handler))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "arenad",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
                rooms: state.registry.len(),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
                rooms: state.registry.len(),
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    rooms: usize,
}
