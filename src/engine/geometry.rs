//! Grid geometry and movement legality
//!
//! Positions are integer cells. A space of `width x height` covers
//! `0 <= x < width` and `0 <= y < height`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A cell on the space grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Sum of absolute axis deltas
    pub fn manhattan(&self, other: Position) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        dx + dy
    }

    /// Largest absolute axis delta
    pub fn chebyshev(&self, other: Position) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        dx.max(dy)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && i64::from(pos.x) < i64::from(self.width)
            && i64::from(pos.y) < i64::from(self.height)
    }

    /// Number of cells in the space
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }
}

/// Rectangle covered by a placed element, anchored at its top-left cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub origin: Position,
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    /// Cells of the footprint that fall inside `bounds`, row-major. The
    /// rectangle is clipped before iterating.
    pub fn cells_within(&self, bounds: Bounds) -> impl Iterator<Item = Position> {
        let clip = |origin: i32, len: u32, limit: u32| {
            let start = i64::from(origin).max(0);
            let end = (i64::from(origin) + i64::from(len)).min(i64::from(limit));
            let to_i32 = |v: i64| i32::try_from(v).unwrap_or(i32::MAX);
            to_i32(start)..to_i32(end.max(start))
        };
        let xs = clip(self.origin.x, self.width, bounds.width);
        let ys = clip(self.origin.y, self.height, bounds.height);
        ys.flat_map(move |y| xs.clone().map(move |x| Position::new(x, y)))
    }
}

/// Which single steps count as adjacent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepRule {
    /// Exactly one cell along one axis (Manhattan distance 1)
    #[default]
    Cardinal,
    /// One cell along either or both axes (Chebyshev distance 1)
    Diagonal,
}

impl StepRule {
    pub fn is_single_step(&self, from: Position, to: Position) -> bool {
        match self {
            StepRule::Cardinal => from.manhattan(to) == 1,
            StepRule::Diagonal => from.chebyshev(to) == 1,
        }
    }
}

/// Why a move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveViolation {
    NotAdjacent,
    OutOfBounds,
    Blocked,
}

impl std::fmt::Display for MoveViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveViolation::NotAdjacent => write!(f, "not a single step"),
            MoveViolation::OutOfBounds => write!(f, "outside space bounds"),
            MoveViolation::Blocked => write!(f, "blocked by a static element"),
        }
    }
}

/// Walkable area of a space: its bounds minus any blocked cells.
///
/// Blocked cells only exist when static-element collision is enabled;
/// otherwise the grid is the bare rectangle.
#[derive(Debug, Clone)]
pub struct Grid {
    bounds: Bounds,
    blocked: HashSet<Position>,
}

impl Grid {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            blocked: HashSet::new(),
        }
    }

    /// Mark every in-bounds cell of `footprint` as blocked
    pub fn block(&mut self, footprint: Footprint) {
        self.blocked.extend(footprint.cells_within(self.bounds));
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        self.bounds.contains(pos) && !self.blocked.contains(&pos)
    }

    /// Validate a move from `from` to `to` under `rule`
    pub fn check_move(
        &self,
        rule: StepRule,
        from: Position,
        to: Position,
    ) -> Result<(), MoveViolation> {
        if !rule.is_single_step(from, to) {
            return Err(MoveViolation::NotAdjacent);
        }
        if !self.bounds.contains(to) {
            return Err(MoveViolation::OutOfBounds);
        }
        if self.blocked.contains(&to) {
            return Err(MoveViolation::Blocked);
        }
        Ok(())
    }
}
