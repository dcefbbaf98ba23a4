//! Real-time space session engine
//!
//! Tracks which connections occupy which space, validates movement and
//! broadcasts presence changes.

pub mod error;
pub mod geometry;
pub mod lookup;
pub mod protocol;
pub mod registry;
pub mod room;
pub mod session;
pub mod spawn;

pub use error::SessionError;
pub use geometry::{Bounds, Grid, MoveViolation, Position, StepRule};
pub use lookup::{IdentityLookup, LookupError, PlacedElement, SpaceInfo, SpaceLookup};
pub use protocol::{
    ClientMessage, JoinRequest, LeaveRequest, MoveRequest, Occupant, ServerMessage,
};
pub use registry::RoomRegistry;
pub use room::{Admission, MoveOutcome, Room, RoomSettings};
pub use session::{ConnectionId, Outbox, UserId};
pub use spawn::{SpawnPolicy, SpawnStrategy};
