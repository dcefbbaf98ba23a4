//! Spaces: user-owned areas with placed elements
//!
//! Dimensions travel as `"<width>x<height>"` strings, e.g. `"100x200"`:
//! - both parts positive decimal integers
//! - at most 9 digits each

pub mod store;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::engine::Bounds;

pub use store::{Space, SpacePlacement, SpaceStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimensionsError {
    #[error("dimensions must look like 100x200, got {0:?}")]
    InvalidFormat(String),

    #[error("dimensions must be non-zero")]
    Zero,
}

static DIMENSIONS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,9})x(\d{1,9})$").expect("dimensions pattern"));

/// Width and height of a space or map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self, DimensionsError> {
        if width == 0 || height == 0 {
            return Err(DimensionsError::Zero);
        }
        Ok(Self { width, height })
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = DimensionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DIMENSIONS_REGEX
            .captures(s.trim())
            .ok_or_else(|| DimensionsError::InvalidFormat(s.to_string()))?;
        // Nine digits always fit in a u32
        let width = caps[1]
            .parse()
            .map_err(|_| DimensionsError::InvalidFormat(s.to_string()))?;
        let height = caps[2]
            .parse()
            .map_err(|_| DimensionsError::InvalidFormat(s.to_string()))?;
        Self::new(width, height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
