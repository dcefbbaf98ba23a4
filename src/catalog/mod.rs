//! Admin-managed catalog: elements, avatars and map templates

use sqlx::sqlite::SqlitePool;
use tracing::info;

use crate::db::StoreError;
use crate::spaces::Dimensions;

/// Largest width or height of a single element, in cells
pub const MAX_ELEMENT_SIDE: u32 = 1024;

/// A placeable element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: String,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

/// An element position inside a map template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapPlacement<'a> {
    pub element_id: &'a str,
    pub x: i32,
    pub y: i32,
}

/// Template a space can be created from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTemplate {
    pub id: String,
    pub name: String,
    pub thumbnail: String,
    pub dimensions: Dimensions,
    /// (element id, x, y)
    pub elements: Vec<(String, i32, i32)>,
}

pub(crate) fn to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub(crate) fn to_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(0)
}

type ElementRow = (String, String, i64, i64, bool);

pub(crate) fn element_from_row((id, image_url, width, height, is_static): ElementRow) -> Element {
    Element {
        id,
        image_url,
        width: to_u32(width),
        height: to_u32(height),
        is_static,
    }
}

pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_element(
        &self,
        image_url: &str,
        width: u32,
        height: u32,
        is_static: bool,
    ) -> Result<Element, StoreError> {
        if width == 0 || height == 0 {
            return Err(StoreError::Invalid("element size must be non-zero".into()));
        }
        if width > MAX_ELEMENT_SIDE || height > MAX_ELEMENT_SIDE {
            return Err(StoreError::Invalid(format!(
                "element sides are limited to {MAX_ELEMENT_SIDE}"
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO elements (id, image_url, width, height, is_static) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(image_url)
        .bind(i64::from(width))
        .bind(i64::from(height))
        .bind(is_static)
        .execute(&self.pool)
        .await?;

        info!(element = %id, "element created");
        Ok(Element {
            id,
            image_url: image_url.to_string(),
            width,
            height,
            is_static,
        })
    }

    pub async fn update_element_image(&self, id: &str, image_url: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE elements SET image_url = ? WHERE id = ?")
            .bind(image_url)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("element"));
        }
        Ok(())
    }

    pub async fn get_element(&self, id: &str) -> Result<Option<Element>, StoreError> {
        let row: Option<ElementRow> = sqlx::query_as(
            "SELECT id, image_url, width, height, is_static FROM elements WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(element_from_row))
    }

    pub async fn list_elements(&self) -> Result<Vec<Element>, StoreError> {
        let rows: Vec<ElementRow> = sqlx::query_as(
            "SELECT id, image_url, width, height, is_static FROM elements ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(element_from_row).collect())
    }

    pub async fn create_avatar(&self, name: &str, image_url: &str) -> Result<Avatar, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO avatars (id, name, image_url) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(image_url)
            .execute(&self.pool)
            .await?;

        Ok(Avatar {
            id,
            name: name.to_string(),
            image_url: image_url.to_string(),
        })
    }

    pub async fn list_avatars(&self) -> Result<Vec<Avatar>, StoreError> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, name, image_url FROM avatars ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, image_url)| Avatar {
                id,
                name,
                image_url,
            })
            .collect())
    }

    /// Create a map template. Every placement must reference a known element
    /// and lie inside the map.
    pub async fn create_map(
        &self,
        name: &str,
        thumbnail: &str,
        dimensions: Dimensions,
        placements: &[MapPlacement<'_>],
    ) -> Result<MapTemplate, StoreError> {
        let bounds = dimensions.bounds();
        let id = uuid::Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO maps (id, name, thumbnail, width, height) VALUES (?, ?, ?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(thumbnail)
            .bind(i64::from(dimensions.width))
            .bind(i64::from(dimensions.height))
            .execute(&mut *tx)
            .await?;

        for placement in placements {
            if !bounds.contains(crate::engine::Position::new(placement.x, placement.y)) {
                return Err(StoreError::Invalid(format!(
                    "element at ({}, {}) lies outside {}",
                    placement.x, placement.y, dimensions
                )));
            }
            let known: Option<(String,)> = sqlx::query_as("SELECT id FROM elements WHERE id = ?")
                .bind(placement.element_id)
                .fetch_optional(&mut *tx)
                .await?;
            if known.is_none() {
                return Err(StoreError::NotFound("element"));
            }

            sqlx::query(
                "INSERT INTO map_elements (id, map_id, element_id, x, y) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&id)
            .bind(placement.element_id)
            .bind(placement.x)
            .bind(placement.y)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(map = %id, elements = placements.len(), "map created");

        Ok(MapTemplate {
            id,
            name: name.to_string(),
            thumbnail: thumbnail.to_string(),
            dimensions,
            elements: placements
                .iter()
                .map(|p| (p.element_id.to_string(), p.x, p.y))
                .collect(),
        })
    }

    pub async fn get_map(&self, id: &str) -> Result<Option<MapTemplate>, StoreError> {
        let row: Option<(String, String, String, i64, i64)> =
            sqlx::query_as("SELECT id, name, thumbnail, width, height FROM maps WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let Some((id, name, thumbnail, width, height)) = row else {
            return Ok(None);
        };

        let elements: Vec<(String, i64, i64)> =
            sqlx::query_as("SELECT element_id, x, y FROM map_elements WHERE map_id = ?")
                .bind(&id)
                .fetch_all(&self.pool)
                .await?;

        let dimensions = Dimensions::new(to_u32(width), to_u32(height))
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        Ok(Some(MapTemplate {
            id,
            name,
            thumbnail,
            dimensions,
            elements: elements
                .into_iter()
                .map(|(element_id, x, y)| (element_id, to_i32(x), to_i32(y)))
                .collect(),
        }))
    }
}
