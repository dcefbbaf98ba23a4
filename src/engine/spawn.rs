//! Spawn point selection
//!
//! A spawn cell must be walkable and not occupied by another session.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{Grid, Position};

/// Random probes before falling back to a full scan
const RANDOM_ATTEMPTS: usize = 64;

/// Chooses where a joining session appears
pub trait SpawnPolicy: Send + Sync + std::fmt::Debug {
    /// Pick a free cell, or `None` if the grid has none
    fn choose(&self, grid: &Grid, occupied: &HashSet<Position>) -> Option<Position>;
}

fn is_free(grid: &Grid, occupied: &HashSet<Position>, pos: Position) -> bool {
    grid.is_walkable(pos) && !occupied.contains(&pos)
}

fn first_free(grid: &Grid, occupied: &HashSet<Position>) -> Option<Position> {
    grid.bounds()
        .cells()
        .find(|pos| is_free(grid, occupied, *pos))
}

/// Uniformly random free cell
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomFree;

impl SpawnPolicy for RandomFree {
    fn choose(&self, grid: &Grid, occupied: &HashSet<Position>) -> Option<Position> {
        let bounds = grid.bounds();
        if bounds.area() == 0 {
            return None;
        }

        let width = i32::try_from(bounds.width).unwrap_or(i32::MAX);
        let height = i32::try_from(bounds.height).unwrap_or(i32::MAX);
        let mut rng = rand::rng();
        for _ in 0..RANDOM_ATTEMPTS {
            let pos = Position::new(rng.random_range(0..width), rng.random_range(0..height));
            if is_free(grid, occupied, pos) {
                return Some(pos);
            }
        }

        first_free(grid, occupied)
    }
}

/// A preferred cell, falling back to the first free cell in row-major order
#[derive(Debug, Clone, Copy)]
pub struct Fixed {
    pub preferred: Position,
}

impl SpawnPolicy for Fixed {
    fn choose(&self, grid: &Grid, occupied: &HashSet<Position>) -> Option<Position> {
        if is_free(grid, occupied, self.preferred) {
            return Some(self.preferred);
        }
        first_free(grid, occupied)
    }
}

/// Configurable spawn strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SpawnStrategy {
    #[default]
    Random,
    Fixed { x: i32, y: i32 },
}

impl SpawnStrategy {
    pub fn policy(&self) -> Arc<dyn SpawnPolicy> {
        match *self {
            SpawnStrategy::Random => Arc::new(RandomFree),
            SpawnStrategy::Fixed { x, y } => Arc::new(Fixed {
                preferred: Position::new(x, y),
            }),
        }
    }
}
