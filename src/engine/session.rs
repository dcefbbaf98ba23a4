//! Per-connection session records

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::geometry::Position;
use super::protocol::{Occupant, ServerMessage};

/// Opaque user identifier issued by the identity lookup
pub type UserId = String;

/// Identifies one transport connection for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why an outbound message could not be queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The connection task is gone
    Closed,
    /// The connection is not draining its queue
    Full,
}

/// Outbound queue of one connection
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<ServerMessage>,
}

impl Outbox {
    /// Create an outbox and the receiver the connection task drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue a message without waiting
    pub fn deliver(&self, msg: ServerMessage) -> Result<(), DeliveryFailure> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Closed(_) => DeliveryFailure::Closed,
            TrySendError::Full(_) => DeliveryFailure::Full,
        })
    }
}

/// A joined participant in a room
#[derive(Debug)]
pub struct Session {
    pub conn: ConnectionId,
    pub user_id: UserId,
    pub position: Position,
    pub outbox: Outbox,
}

impl Session {
    pub fn occupant(&self) -> Occupant {
        Occupant {
            user_id: self.user_id.clone(),
            x: self.position.x,
            y: self.position.y,
        }
    }
}
