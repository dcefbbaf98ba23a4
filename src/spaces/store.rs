//! Space persistence

use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use super::Dimensions;
use crate::catalog::{element_from_row, to_i32, to_u32, CatalogStore, Element};
use crate::db::StoreError;
use crate::engine::{PlacedElement, Position, SpaceInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub id: String,
    pub name: String,
    pub dimensions: Dimensions,
    pub thumbnail: Option<String>,
    pub owner_id: String,
}

/// An element instance inside a space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacePlacement {
    pub id: String,
    pub element: Element,
    pub x: i32,
    pub y: i32,
}

type SpaceRow = (String, String, i64, i64, Option<String>, String);

fn space_from_row((id, name, width, height, thumbnail, owner_id): SpaceRow) -> Result<Space, StoreError> {
    let dimensions = Dimensions::new(to_u32(width), to_u32(height))
        .map_err(|e| StoreError::Invalid(e.to_string()))?;
    Ok(Space {
        id,
        name,
        dimensions,
        thumbnail,
        owner_id,
    })
}

pub struct SpaceStore {
    pool: SqlitePool,
}

impl SpaceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a space. With `map_id` the map's dimensions and default
    /// elements are copied; otherwise `dimensions` is required.
    pub async fn create(
        &self,
        owner_id: &str,
        name: &str,
        dimensions: Option<Dimensions>,
        map_id: Option<&str>,
    ) -> Result<Space, StoreError> {
        let (dimensions, thumbnail, defaults) = match (map_id, dimensions) {
            (Some(map_id), _) => {
                let map = CatalogStore::new(self.pool.clone())
                    .get_map(map_id)
                    .await?
                    .ok_or(StoreError::NotFound("map"))?;
                (map.dimensions, Some(map.thumbnail), map.elements)
            }
            (None, Some(dimensions)) => (dimensions, None, Vec::new()),
            (None, None) => {
                return Err(StoreError::Invalid(
                    "either dimensions or mapId is required".into(),
                ))
            }
        };

        let id = uuid::Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO spaces (id, name, width, height, thumbnail, owner_id) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(i64::from(dimensions.width))
        .bind(i64::from(dimensions.height))
        .bind(&thumbnail)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        for (element_id, x, y) in &defaults {
            sqlx::query(
                "INSERT INTO space_elements (id, space_id, element_id, x, y) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&id)
            .bind(element_id)
            .bind(x)
            .bind(y)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(space = %id, owner = %owner_id, %dimensions, elements = defaults.len(), "space created");

        Ok(Space {
            id,
            name: name.to_string(),
            dimensions,
            thumbnail,
            owner_id: owner_id.to_string(),
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<Space>, StoreError> {
        let row: Option<SpaceRow> = sqlx::query_as(
            "SELECT id, name, width, height, thumbnail, owner_id FROM spaces WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(space_from_row).transpose()
    }

    async fn owned(&self, owner_id: &str, space_id: &str) -> Result<Space, StoreError> {
        let space = self.get(space_id).await?.ok_or(StoreError::NotFound("space"))?;
        if space.owner_id != owner_id {
            return Err(StoreError::Forbidden);
        }
        Ok(space)
    }

    pub async fn delete(&self, owner_id: &str, space_id: &str) -> Result<(), StoreError> {
        self.owned(owner_id, space_id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM space_elements WHERE space_id = ?")
            .bind(space_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM spaces WHERE id = ?")
            .bind(space_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(space = %space_id, "space deleted");
        Ok(())
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Space>, StoreError> {
        let rows: Vec<SpaceRow> = sqlx::query_as(
            "SELECT id, name, width, height, thumbnail, owner_id FROM spaces
             WHERE owner_id = ? ORDER BY created_at, id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(space_from_row).collect()
    }

    /// Elements placed in a space, with their catalog data
    pub async fn placements(&self, space_id: &str) -> Result<Vec<SpacePlacement>, StoreError> {
        let rows: Vec<(String, i64, i64, String, String, i64, i64, bool)> = sqlx::query_as(
            "SELECT se.id, se.x, se.y, e.id, e.image_url, e.width, e.height, e.is_static
             FROM space_elements se JOIN elements e ON e.id = se.element_id
             WHERE se.space_id = ?
             ORDER BY se.rowid",
        )
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, x, y, element_id, image_url, width, height, is_static)| SpacePlacement {
                    id,
                    element: element_from_row((element_id, image_url, width, height, is_static)),
                    x: to_i32(x),
                    y: to_i32(y),
                },
            )
            .collect())
    }

    /// Place a catalog element in a space owned by `owner_id`
    pub async fn add_element(
        &self,
        owner_id: &str,
        space_id: &str,
        element_id: &str,
        x: i32,
        y: i32,
    ) -> Result<SpacePlacement, StoreError> {
        let space = self.owned(owner_id, space_id).await?;
        if !space.dimensions.bounds().contains(Position::new(x, y)) {
            return Err(StoreError::Invalid(format!(
                "point ({x}, {y}) lies outside {}",
                space.dimensions
            )));
        }

        let element = CatalogStore::new(self.pool.clone())
            .get_element(element_id)
            .await?
            .ok_or(StoreError::NotFound("element"))?;

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO space_elements (id, space_id, element_id, x, y) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(space_id)
        .bind(element_id)
        .bind(x)
        .bind(y)
        .execute(&self.pool)
        .await?;

        debug!(space = %space_id, element = %element_id, x, y, "element placed");
        Ok(SpacePlacement { id, element, x, y })
    }

    /// Remove a placement; the caller must own the space it belongs to
    pub async fn remove_element(&self, owner_id: &str, placement_id: &str) -> Result<(), StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT space_id FROM space_elements WHERE id = ?")
                .bind(placement_id)
                .fetch_optional(&self.pool)
                .await?;
        let (space_id,) = row.ok_or(StoreError::NotFound("space element"))?;
        self.owned(owner_id, &space_id).await?;

        sqlx::query("DELETE FROM space_elements WHERE id = ?")
            .bind(placement_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Space metadata in the form the session engine consumes
    pub async fn space_info(&self, space_id: &str) -> Result<Option<SpaceInfo>, StoreError> {
        let Some(space) = self.get(space_id).await? else {
            return Ok(None);
        };
        let elements = self
            .placements(space_id)
            .await?
            .into_iter()
            .map(|p| PlacedElement {
                element_id: p.element.id,
                position: Position::new(p.x, p.y),
                width: p.element.width,
                height: p.element.height,
                is_static: p.element.is_static,
            })
            .collect();

        Ok(Some(SpaceInfo {
            id: space.id,
            bounds: space.dimensions.bounds(),
            elements,
        }))
    }
}
