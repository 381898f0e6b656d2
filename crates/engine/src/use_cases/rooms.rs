//! Private rooms: caller-named parties of up to two participants.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gambit_domain::{ConnectionId, RoomId, SessionId};

use super::matchmaking::Pairing;

/// Maximum number of members in a room
pub const ROOM_CAPACITY: usize = 2;

/// Errors surfaced to the requester of a room operation.
///
/// The `Display` text is sent verbatim in the `error` field of the response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room already exists")]
    AlreadyExists,
    #[error("Room not found")]
    NotFound,
    #[error("Room is full")]
    Full,
    #[error("Already in this room")]
    AlreadyMember,
    #[error("Already in a game")]
    InGame,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    /// Members in join order; the first one plays white
    pub members: Vec<ConnectionId>,
    /// Session spawned when the room filled up
    pub session: Option<SessionId>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY || self.session.is_some()
    }
}

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub room_id: RoomId,
    /// Set when this join filled the room
    pub pairing: Option<Pairing>,
}

/// A membership removed because its connection went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDeparture {
    pub room_id: RoomId,
    /// The room became empty and was deleted
    pub deleted: bool,
    pub session: Option<SessionId>,
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with `requester` as its only member.
    pub fn create_room(
        &mut self,
        room_id: RoomId,
        requester: ConnectionId,
        now: DateTime<Utc>,
    ) -> Result<(), RoomError> {
        if self.rooms.contains_key(&room_id) {
            return Err(RoomError::AlreadyExists);
        }
        tracing::info!(room_id = %room_id, connection_id = %requester, "Room created");
        self.rooms.insert(
            room_id.clone(),
            Room {
                id: room_id,
                members: vec![requester],
                session: None,
                created_at: now,
            },
        );
        Ok(())
    }

    /// Add `requester` to a room. Filling the room yields the pairing.
    pub fn join_room(
        &mut self,
        room_id: &RoomId,
        requester: ConnectionId,
    ) -> Result<Joined, RoomError> {
        let room = self.rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
        if room.members.contains(&requester) {
            return Err(RoomError::AlreadyMember);
        }
        if room.is_full() {
            return Err(RoomError::Full);
        }

        room.members.push(requester);
        tracing::info!(
            room_id = %room_id,
            connection_id = %requester,
            members = room.members.len(),
            "Room joined"
        );

        let pairing = match room.members.as_slice() {
            [white, black] => Some(Pairing {
                white: *white,
                black: *black,
            }),
            _ => None,
        };
        Ok(Joined {
            room_id: room_id.clone(),
            pairing,
        })
    }

    /// Record the session started for a full room.
    pub fn attach_session(&mut self, room_id: &RoomId, session_id: SessionId) {
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.session = Some(session_id);
        }
    }

    /// Remove `connection_id` from every room; delete rooms left empty.
    pub fn handle_disconnect(&mut self, connection_id: ConnectionId) -> Vec<RoomDeparture> {
        let mut departures = Vec::new();
        for room in self.rooms.values_mut() {
            if !room.members.contains(&connection_id) {
                continue;
            }
            room.members.retain(|member| *member != connection_id);
            departures.push(RoomDeparture {
                room_id: room.id.clone(),
                deleted: room.members.is_empty(),
                session: room.session,
            });
        }
        self.rooms.retain(|_, room| !room.members.is_empty());

        for departure in departures.iter().filter(|d| d.deleted) {
            tracing::info!(room_id = %departure.room_id, "Empty room deleted");
        }
        departures
    }

    /// Delete rooms where `connection_id` still waits alone, except `keep`.
    ///
    /// Called when the connection starts a session elsewhere.
    pub fn withdraw_waiting(
        &mut self,
        connection_id: ConnectionId,
        keep: Option<&RoomId>,
    ) -> Vec<RoomId> {
        let withdrawn: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| Some(&room.id) != keep)
            .filter(|room| room.session.is_none() && room.members == [connection_id])
            .map(|room| room.id.clone())
            .collect();
        for room_id in &withdrawn {
            self.rooms.remove(room_id);
            tracing::info!(room_id = %room_id, connection_id = %connection_id, "Waiting room withdrawn");
        }
        withdrawn
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
