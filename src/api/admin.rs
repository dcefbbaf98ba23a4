//! Admin catalog endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{error::ApiError, extract::AdminUser, user::Ack, AppState};
use crate::catalog::{CatalogStore, MapPlacement};
use crate::spaces::Dimensions;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/element", post(create_element))
        .route("/admin/element/{id}", put(update_element))
        .route("/admin/avatar", post(create_avatar))
        .route("/admin/map", post(create_map))
}

#[derive(Debug, Serialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreateElementRequest {
    #[serde(rename = "imageUrl")]
    image_url: String,
    width: u32,
    height: u32,
    #[serde(rename = "static", default)]
    is_static: bool,
}

async fn create_element(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    payload: Result<Json<CreateElementRequest>, JsonRejection>,
) -> Result<Json<IdResponse>, ApiError> {
    let Json(req) = payload?;
    let element = CatalogStore::new(state.db.pool().clone())
        .create_element(&req.image_url, req.width, req.height, req.is_static)
        .await?;
    Ok(Json(IdResponse { id: element.id }))
}

#[derive(Debug, Deserialize)]
struct UpdateElementRequest {
    #[serde(rename = "imageUrl")]
    image_url: String,
}

async fn update_element(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateElementRequest>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(req) = payload?;
    CatalogStore::new(state.db.pool().clone())
        .update_element_image(&id, &req.image_url)
        .await?;
    Ok(Json(Ack {}))
}

#[derive(Debug, Deserialize)]
struct CreateAvatarRequest {
    #[serde(rename = "imageUrl")]
    image_url: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct AvatarResponse {
    #[serde(rename = "avatarId")]
    avatar_id: String,
}

async fn create_avatar(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    payload: Result<Json<CreateAvatarRequest>, JsonRejection>,
) -> Result<Json<AvatarResponse>, ApiError> {
    let Json(req) = payload?;
    let avatar = CatalogStore::new(state.db.pool().clone())
        .create_avatar(&req.name, &req.image_url)
        .await?;
    Ok(Json(AvatarResponse {
        avatar_id: avatar.id,
    }))
}

#[derive(Debug, Deserialize)]
struct DefaultElement {
    #[serde(rename = "elementId")]
    element_id: String,
    x: i32,
    y: i32,
}

#[derive(Debug, Deserialize)]
struct CreateMapRequest {
    thumbnail: String,
    dimensions: String,
    name: String,
    #[serde(rename = "defaultElements", default)]
    default_elements: Vec<DefaultElement>,
}

async fn create_map(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    payload: Result<Json<CreateMapRequest>, JsonRejection>,
) -> Result<Json<IdResponse>, ApiError> {
    let Json(req) = payload?;
    let dimensions: Dimensions = req.dimensions.parse()?;
    let placements: Vec<MapPlacement<'_>> = req
        .default_elements
        .iter()
        .map(|e| MapPlacement {
            element_id: &e.element_id,
            x: e.x,
            y: e.y,
        })
        .collect();

    let map = CatalogStore::new(state.db.pool().clone())
        .create_map(&req.name, &req.thumbnail, dimensions, &placements)
        .await?;
    Ok(Json(IdResponse { id: map.id }))
}
