//! Live occupancy of one space
//!
//! All membership and position changes for a room go through its state
//! mutex. The lock is held for the state transition and the non-blocking
//! enqueue of the resulting messages, never across an await, so every member
//! observes broadcasts from a room in the same order.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::geometry::{Grid, MoveViolation, Position, StepRule};
use super::lookup::SpaceInfo;
use super::protocol::{Occupant, ServerMessage};
use super::registry::RegistryInner;
use super::session::{ConnectionId, Outbox, Session, UserId};
use super::spawn::{RandomFree, SpawnPolicy};

/// Behaviour shared by every room in a registry
#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub step_rule: StepRule,
    pub block_static_elements: bool,
    pub spawn: Arc<dyn SpawnPolicy>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            step_rule: StepRule::Cardinal,
            block_static_elements: false,
            spawn: Arc::new(RandomFree),
        }
    }
}

/// Result of asking a room to admit a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Joined(Position),
    /// The room emptied and is being evicted; find or create a new one
    Closed,
    /// No free spawn cell
    Full,
}

/// Result of a movement request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted(Position),
    Rejected {
        current: Position,
        violation: MoveViolation,
    },
}

#[derive(Debug, Default)]
struct RoomState {
    members: HashMap<ConnectionId, Session>,
    closed: bool,
}

impl RoomState {
    /// Queue `msg` for every member except `skip`; returns members whose
    /// outbox refused it
    fn broadcast(&self, msg: &ServerMessage, skip: Option<ConnectionId>) -> Vec<ConnectionId> {
        self.members
            .values()
            .filter(|session| Some(session.conn) != skip)
            .filter_map(|session| match session.outbox.deliver(msg.clone()) {
                Ok(()) => None,
                Err(failure) => {
                    debug!(conn = %session.conn, ?failure, "outbound delivery failed");
                    Some(session.conn)
                }
            })
            .collect()
    }
}

/// Authoritative live state of one space
#[derive(Debug)]
pub struct Room {
    space_id: String,
    grid: Grid,
    step_rule: StepRule,
    spawn: Arc<dyn SpawnPolicy>,
    registry: Weak<RegistryInner>,
    state: Mutex<RoomState>,
}

impl Room {
    pub(super) fn new(
        space: &SpaceInfo,
        settings: &RoomSettings,
        registry: Weak<RegistryInner>,
    ) -> Self {
        Self {
            space_id: space.id.clone(),
            grid: space.grid(settings.block_static_elements),
            step_rule: settings.step_rule,
            spawn: Arc::clone(&settings.spawn),
            registry,
            state: Mutex::new(RoomState::default()),
        }
    }

    pub fn space_id(&self) -> &str {
        &self.space_id
    }

    pub fn len(&self) -> usize {
        self.state.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Snapshot of everyone currently in the room
    pub fn occupants(&self) -> Vec<Occupant> {
        self.state
            .lock()
            .members
            .values()
            .map(Session::occupant)
            .collect()
    }

    pub fn position_of(&self, conn: ConnectionId) -> Option<Position> {
        self.state.lock().members.get(&conn).map(|s| s.position)
    }

    /// Admit a connection, replying `space-joined` to it and announcing it to
    /// the members already present.
    pub fn admit(self: &Arc<Self>, conn: ConnectionId, user_id: UserId, outbox: Outbox) -> Admission {
        let (spawn, failed) = {
            let mut state = self.state.lock();
            if state.closed {
                return Admission::Closed;
            }
            if let Some(existing) = state.members.get(&conn) {
                return Admission::Joined(existing.position);
            }

            let occupied: HashSet<Position> =
                state.members.values().map(|s| s.position).collect();
            let Some(spawn) = self.spawn.choose(&self.grid, &occupied) else {
                return Admission::Full;
            };

            let users = state.members.values().map(Session::occupant).collect();
            let mut failed = Vec::new();
            if outbox
                .deliver(ServerMessage::SpaceJoined { spawn, users })
                .is_err()
            {
                failed.push(conn);
            }

            failed.extend(state.broadcast(
                &ServerMessage::UserJoined {
                    user_id: user_id.clone(),
                    x: spawn.x,
                    y: spawn.y,
                },
                None,
            ));

            state.members.insert(
                conn,
                Session {
                    conn,
                    user_id: user_id.clone(),
                    position: spawn,
                    outbox,
                },
            );
            (spawn, failed)
        };

        info!(space = %self.space_id, %conn, user = %user_id, %spawn, "session joined");
        self.evict_failed(failed);
        Admission::Joined(spawn)
    }

    /// Apply a movement request. Returns `None` if `conn` is not a member.
    pub fn move_session(self: &Arc<Self>, conn: ConnectionId, target: Position) -> Option<MoveOutcome> {
        let (outcome, failed) = {
            let mut state = self.state.lock();
            let session = state.members.get_mut(&conn)?;
            let current = session.position;

            match self.grid.check_move(self.step_rule, current, target) {
                Ok(()) => {
                    session.position = target;
                    let user_id = session.user_id.clone();
                    let failed = state.broadcast(
                        &ServerMessage::Movement {
                            x: target.x,
                            y: target.y,
                            user_id,
                        },
                        None,
                    );
                    (MoveOutcome::Accepted(target), failed)
                }
                Err(violation) => {
                    let failed = match session.outbox.deliver(ServerMessage::MovementRejected {
                        x: current.x,
                        y: current.y,
                    }) {
                        Ok(()) => Vec::new(),
                        Err(_) => vec![conn],
                    };
                    (MoveOutcome::Rejected { current, violation }, failed)
                }
            }
        };

        match outcome {
            MoveOutcome::Accepted(pos) => {
                debug!(space = %self.space_id, %conn, %pos, "move accepted")
            }
            MoveOutcome::Rejected { current, violation } => {
                debug!(space = %self.space_id, %conn, %current, %target, %violation, "move rejected")
            }
        }
        self.evict_failed(failed);
        Some(outcome)
    }

    /// Remove a connection and tell the remaining members. Returns false if
    /// it was not a member. An emptied room closes and leaves the registry.
    pub fn leave(self: &Arc<Self>, conn: ConnectionId) -> bool {
        let (session, failed, emptied) = {
            let mut state = self.state.lock();
            let Some(session) = state.members.remove(&conn) else {
                return false;
            };
            let failed = state.broadcast(
                &ServerMessage::UserLeft {
                    user_id: session.user_id.clone(),
                },
                None,
            );
            let emptied = state.members.is_empty();
            if emptied {
                state.closed = true;
            }
            (session, failed, emptied)
        };

        info!(space = %self.space_id, %conn, user = %session.user_id, "session left");
        drop(session);

        if emptied {
            if let Some(registry) = self.registry.upgrade() {
                registry.evict(self);
            }
        }
        self.evict_failed(failed);
        true
    }

    /// Run the leave path for members whose delivery failed, off the
    /// caller's path
    fn evict_failed(self: &Arc<Self>, conns: Vec<ConnectionId>) {
        if conns.is_empty() {
            return;
        }

        let room = Arc::clone(self);
        let evict = move || {
            for conn in conns {
                if room.leave(conn) {
                    warn!(space = %room.space_id, %conn, "dropped unreachable session");
                }
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { evict() });
            }
            Err(_) => evict(),
        }
    }
}
