//! Identity and space lookups consumed by the join handshake
//!
//! The session engine never reads the database directly; it resolves join
//! tokens and space metadata through these traits.

use async_trait::async_trait;
use thiserror::Error;

use super::geometry::{Bounds, Footprint, Grid, Position};
use super::session::UserId;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("backend error: {0}")]
    Backend(String),
}

/// An element placed in a space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedElement {
    pub element_id: String,
    pub position: Position,
    pub width: u32,
    pub height: u32,
    pub is_static: bool,
}

impl PlacedElement {
    pub fn footprint(&self) -> Footprint {
        Footprint {
            origin: self.position,
            width: self.width,
            height: self.height,
        }
    }
}

/// Space metadata fetched once when a room is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceInfo {
    pub id: String,
    pub bounds: Bounds,
    pub elements: Vec<PlacedElement>,
}

impl SpaceInfo {
    /// Build the walkable grid, optionally treating static elements as walls
    pub fn grid(&self, block_static_elements: bool) -> Grid {
        let mut grid = Grid::new(self.bounds);
        if block_static_elements {
            for element in self.elements.iter().filter(|e| e.is_static) {
                grid.block(element.footprint());
            }
        }
        grid
    }
}

/// Resolves join tokens to user ids
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<UserId, LookupError>;
}

/// Resolves space ids to space metadata
#[async_trait]
pub trait SpaceLookup: Send + Sync {
    async fn get_space(&self, space_id: &str) -> Result<SpaceInfo, LookupError>;
}
