//! Wire protocol for the presence socket
//!
//! Every frame is a JSON envelope `{"type": ..., "payload": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::SessionError;
use super::geometry::Position;
use super::session::UserId;

/// Payload of a `join` request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub space_id: String,
    pub token: String,
}

/// Payload of a `movement` request. Unknown fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MoveRequest {
    pub x: i32,
    pub y: i32,
}

impl MoveRequest {
    pub fn target(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Payload of a `leave` request. Carries nothing; any fields are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LeaveRequest {}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join(JoinRequest),
    Movement(MoveRequest),
    Leave(LeaveRequest),
}

impl ClientMessage {
    /// Parse a text frame. A missing or null payload reads as `{}`.
    pub fn parse(text: &str) -> Result<Self, SessionError> {
        let malformed = |e: serde_json::Error| SessionError::MalformedMessage(e.to_string());
        let mut frame: Value = serde_json::from_str(text).map_err(malformed)?;
        if let Some(envelope) = frame.as_object_mut() {
            let payload = envelope.entry("payload").or_insert(Value::Null);
            if payload.is_null() {
                *payload = Value::Object(Map::new());
            }
        }
        serde_json::from_value(frame).map_err(malformed)
    }
}

/// Another session present in a space
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occupant {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub x: i32,
    pub y: i32,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Reply to the joining connection
    SpaceJoined {
        spawn: Position,
        users: Vec<Occupant>,
    },
    /// Sent to members already present when someone joins
    UserJoined {
        #[serde(rename = "userId")]
        user_id: UserId,
        x: i32,
        y: i32,
    },
    /// Accepted move, sent to every member including the mover
    Movement {
        x: i32,
        y: i32,
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    /// Refused move; carries the mover's unchanged position
    MovementRejected { x: i32, y: i32 },
    UserLeft {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
