//! Session engine errors

use thiserror::Error;

use super::lookup::LookupError;

/// Errors raised while handling a presence connection
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("space not found")]
    SpaceNotFound,

    #[error("space full")]
    SpaceFull,

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("connection lost")]
    ConnectionLost,

    #[error("lookup failed: {0}")]
    Lookup(String),
}

impl SessionError {
    /// WebSocket close code sent when this error ends a connection
    pub fn close_code(&self) -> u16 {
        match self {
            SessionError::Unauthorized => 4001,
            SessionError::SpaceNotFound => 4004,
            SessionError::SpaceFull => 4009,
            SessionError::MalformedMessage(_) => 1003,
            SessionError::ConnectionLost => 1006,
            SessionError::Lookup(_) => 1011,
        }
    }
}

impl From<LookupError> for SessionError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Unauthorized => SessionError::Unauthorized,
            LookupError::NotFound => SessionError::SpaceNotFound,
            LookupError::Backend(msg) => SessionError::Lookup(msg),
        }
    }
}
