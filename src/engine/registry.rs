//! Process-wide map from space id to live room

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::error::SessionError;
use super::geometry::Position;
use super::lookup::SpaceInfo;
use super::room::{Admission, Room, RoomSettings};
use super::session::{ConnectionId, Outbox, UserId};

#[derive(Debug)]
pub(super) struct RegistryInner {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    settings: RoomSettings,
}

impl RegistryInner {
    /// Drop `room` from the map if it is still the registered room for its
    /// space
    pub(super) fn evict(&self, room: &Arc<Room>) {
        let mut rooms = self.rooms.lock();
        if rooms
            .get(room.space_id())
            .is_some_and(|current| Arc::ptr_eq(current, room))
        {
            rooms.remove(room.space_id());
            info!(space = %room.space_id(), "room evicted");
        }
    }
}

/// Registry of live rooms.
///
/// Lock order is registry then room; a room never holds its own lock while
/// taking the registry lock.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomSettings::default())
    }
}

impl RoomRegistry {
    pub fn new(settings: RoomSettings) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                rooms: Mutex::new(HashMap::new()),
                settings,
            }),
        }
    }

    fn open_room(&self, space_id: &str) -> Option<Arc<Room>> {
        self.inner
            .rooms
            .lock()
            .get(space_id)
            .filter(|room| !room.is_closed())
            .cloned()
    }

    /// Return the open room for `space`, creating it if needed.
    ///
    /// A new room's grid is built before the registry lock is taken; if
    /// another join installed an open room meanwhile, that room wins.
    fn find_or_create(&self, space: &SpaceInfo) -> Arc<Room> {
        if let Some(room) = self.open_room(&space.id) {
            return room;
        }

        let built = Arc::new(Room::new(
            space,
            &self.inner.settings,
            Arc::downgrade(&self.inner),
        ));

        let mut rooms = self.inner.rooms.lock();
        if let Some(room) = rooms.get(&space.id) {
            if !room.is_closed() {
                return Arc::clone(room);
            }
        }
        rooms.insert(space.id.clone(), Arc::clone(&built));
        debug!(space = %space.id, "room created");
        built
    }

    /// Admit a connection into the room for `space`
    pub fn join(
        &self,
        space: &SpaceInfo,
        conn: ConnectionId,
        user_id: UserId,
        outbox: Outbox,
    ) -> Result<(Arc<Room>, Position), SessionError> {
        loop {
            let room = self.find_or_create(space);
            match room.admit(conn, user_id.clone(), outbox.clone()) {
                Admission::Joined(spawn) => return Ok((room, spawn)),
                // Lost a race with the last member leaving; the next lookup
                // replaces the closed room
                Admission::Closed => continue,
                Admission::Full => return Err(SessionError::SpaceFull),
            }
        }
    }

    pub fn get(&self, space_id: &str) -> Option<Arc<Room>> {
        self.inner.rooms.lock().get(space_id).cloned()
    }

    /// Number of live rooms
    pub fn len(&self) -> usize {
        self.inner.rooms.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
