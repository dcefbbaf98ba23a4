//! Authentication API endpoints

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{error::ApiError, AppState};
use crate::auth::accounts::UserService;
use crate::auth::Role;

/// Build auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

/// Signup request
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    #[serde(default, rename = "type")]
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Register a new account
async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<SignupResponse>, ApiError> {
    let Json(req) = payload?;
    let service = UserService::new(state.db.pool().clone());

    let user = service.signup(&req.username, &req.password, req.role).await?;
    info!(user = %user.id, username = %user.username, role = %user.role, "account created");

    Ok(Json(SignupResponse { user_id: user.id }))
}

/// Signin request
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub token: String,
}

/// Exchange username and password for a bearer token
async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<Json<SigninResponse>, ApiError> {
    let Json(req) = payload?;
    let service = UserService::new(state.db.pool().clone());

    let (_, token) = service.signin(&req.username, &req.password).await?;
    Ok(Json(SigninResponse { token }))
}
