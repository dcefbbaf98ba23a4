//! Space management endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{
    error::ApiError,
    extract::AuthUser,
    user::{Ack, ElementView},
    AppState,
};
use crate::spaces::{Dimensions, SpaceStore};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/space", post(create_space))
        .route("/space/all", get(list_spaces))
        .route("/space/element", post(add_element).delete(remove_element))
        .route("/space/{id}", get(get_space).delete(delete_space))
}

#[derive(Debug, Deserialize)]
struct CreateSpaceRequest {
    name: String,
    dimensions: Option<String>,
    #[serde(rename = "mapId")]
    map_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateSpaceResponse {
    #[serde(rename = "spaceId")]
    space_id: String,
}

async fn create_space(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateSpaceRequest>, JsonRejection>,
) -> Result<Json<CreateSpaceResponse>, ApiError> {
    let Json(req) = payload?;
    let dimensions = req
        .dimensions
        .as_deref()
        .map(str::parse::<Dimensions>)
        .transpose()?;

    let space = SpaceStore::new(state.db.pool().clone())
        .create(&user.id, &req.name, dimensions, req.map_id.as_deref())
        .await?;
    Ok(Json(CreateSpaceResponse { space_id: space.id }))
}

async fn delete_space(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    SpaceStore::new(state.db.pool().clone())
        .delete(&user.id, &id)
        .await?;
    Ok(Json(Ack {}))
}

#[derive(Debug, Serialize)]
struct SpaceSummary {
    id: String,
    name: String,
    dimensions: String,
    thumbnail: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpaceList {
    spaces: Vec<SpaceSummary>,
}

async fn list_spaces(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<SpaceList>, ApiError> {
    let spaces = SpaceStore::new(state.db.pool().clone())
        .list_for_owner(&user.id)
        .await?
        .into_iter()
        .map(|s| SpaceSummary {
            id: s.id,
            name: s.name,
            dimensions: s.dimensions.to_string(),
            thumbnail: s.thumbnail,
        })
        .collect();
    Ok(Json(SpaceList { spaces }))
}

#[derive(Debug, Serialize)]
struct PlacementView {
    id: String,
    element: ElementView,
    x: i32,
    y: i32,
}

#[derive(Debug, Serialize)]
struct SpaceDetail {
    dimensions: String,
    elements: Vec<PlacementView>,
}

async fn get_space(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SpaceDetail>, ApiError> {
    let store = SpaceStore::new(state.db.pool().clone());
    let space = store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("space not found".into()))?;
    let elements = store
        .placements(&id)
        .await?
        .into_iter()
        .map(|p| PlacementView {
            id: p.id,
            element: p.element.into(),
            x: p.x,
            y: p.y,
        })
        .collect();

    Ok(Json(SpaceDetail {
        dimensions: space.dimensions.to_string(),
        elements,
    }))
}

#[derive(Debug, Deserialize)]
struct AddElementRequest {
    #[serde(rename = "elementId")]
    element_id: String,
    #[serde(rename = "spaceId")]
    space_id: String,
    x: i32,
    y: i32,
}

#[derive(Debug, Serialize)]
struct AddElementResponse {
    id: String,
}

async fn add_element(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<AddElementRequest>, JsonRejection>,
) -> Result<Json<AddElementResponse>, ApiError> {
    let Json(req) = payload?;
    let placement = SpaceStore::new(state.db.pool().clone())
        .add_element(&user.id, &req.space_id, &req.element_id, req.x, req.y)
        .await?;
    Ok(Json(AddElementResponse { id: placement.id }))
}

#[derive(Debug, Deserialize)]
struct RemoveElementRequest {
    id: String,
}

async fn remove_element(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<RemoveElementRequest>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(req) = payload?;
    SpaceStore::new(state.db.pool().clone())
        .remove_element(&user.id, &req.id)
        .await?;
    Ok(Json(Ack {}))
}
