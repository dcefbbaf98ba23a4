//! User metadata and public catalog listings

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{error::ApiError, extract::AuthUser, AppState};
use crate::auth::accounts::UserService;
use crate::catalog::CatalogStore;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/metadata", post(set_metadata))
        .route("/user/metadata/bulk", get(bulk_metadata))
        .route("/avatars", get(list_avatars))
        .route("/elements", get(list_elements))
}

#[derive(Debug, Deserialize)]
struct MetadataRequest {
    #[serde(rename = "avatarId")]
    avatar_id: String,
}

#[derive(Debug, Serialize)]
pub(super) struct Ack {}

async fn set_metadata(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<MetadataRequest>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(req) = payload?;
    UserService::new(state.db.pool().clone())
        .set_avatar(&user.id, &req.avatar_id)
        .await?;
    Ok(Json(Ack {}))
}

#[derive(Debug, Deserialize)]
struct BulkQuery {
    ids: String,
}

/// `ids` arrives as `[a,b,c]`; brackets are optional
fn parse_id_list(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|id| id.trim().trim_matches('"'))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Serialize)]
struct AvatarEntry {
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "avatarId")]
    avatar_id: Option<String>,
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct BulkResponse {
    avatars: Vec<AvatarEntry>,
}

async fn bulk_metadata(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    query: Result<Query<BulkQuery>, QueryRejection>,
) -> Result<Json<BulkResponse>, ApiError> {
    let Query(query) = query?;
    let ids = parse_id_list(&query.ids);
    let avatars = UserService::new(state.db.pool().clone())
        .avatars_for(&ids)
        .await?
        .into_iter()
        .map(|a| AvatarEntry {
            user_id: a.user_id,
            avatar_id: a.avatar_id,
            image_url: a.image_url,
        })
        .collect();
    Ok(Json(BulkResponse { avatars }))
}

#[derive(Debug, Serialize)]
struct AvatarView {
    id: String,
    #[serde(rename = "imageUrl")]
    image_url: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct AvatarList {
    avatars: Vec<AvatarView>,
}

async fn list_avatars(State(state): State<AppState>) -> Result<Json<AvatarList>, ApiError> {
    let avatars = CatalogStore::new(state.db.pool().clone())
        .list_avatars()
        .await?
        .into_iter()
        .map(|a| AvatarView {
            id: a.id,
            image_url: a.image_url,
            name: a.name,
        })
        .collect();
    Ok(Json(AvatarList { avatars }))
}

#[derive(Debug, Serialize)]
pub(super) struct ElementView {
    pub id: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "static")]
    pub is_static: bool,
}

impl From<crate::catalog::Element> for ElementView {
    fn from(e: crate::catalog::Element) -> Self {
        Self {
            id: e.id,
            image_url: e.image_url,
            width: e.width,
            height: e.height,
            is_static: e.is_static,
        }
    }
}

#[derive(Debug, Serialize)]
struct ElementList {
    elements: Vec<ElementView>,
}

async fn list_elements(State(state): State<AppState>) -> Result<Json<ElementList>, ApiError> {
    let elements = CatalogStore::new(state.db.pool().clone())
        .list_elements()
        .await?
        .into_iter()
        .map(ElementView::from)
        .collect();
    Ok(Json(ElementList { elements }))
}
