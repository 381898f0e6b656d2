//! The lobby owns every registry and turns inbound messages into effects.
//!
//! There is exactly one `Lobby` per process, kept behind a single mutex in
//! [`App`](crate::app::App). Each handler runs to completion under that lock,
//! so pairing, room joins and disconnect cleanup never interleave.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use gambit_domain::{ConnectionId, Move, RoomId, SessionId};
use gambit_protocol::{ClientMessage, RoomResponse, ServerMessage};

use super::game_session::{GameSession, MoveOutcome, SessionOrigin};
use super::matchmaking::{MatchmakingQueue, Pairing};
use super::rooms::{RoomError, RoomRegistry};
use crate::api::connections::ConnectionManager;
use crate::infrastructure::ports::{ClockPort, RulesFactory};

/// Point-in-time counters served by `/api/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyStats {
    pub connections: usize,
    pub waiting: usize,
    pub rooms: usize,
    pub active_sessions: usize,
}

pub struct Lobby {
    connections: ConnectionManager,
    queue: MatchmakingQueue,
    rooms: RoomRegistry,
    sessions: HashMap<SessionId, GameSession>,
    /// Which live session each participant belongs to
    session_index: HashMap<ConnectionId, SessionId>,
    rules: RulesFactory,
    clock: Arc<dyn ClockPort>,
}

impl Lobby {
    pub fn new(rules: RulesFactory, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            connections: ConnectionManager::new(),
            queue: MatchmakingQueue::new(),
            rooms: RoomRegistry::new(),
            sessions: HashMap::new(),
            session_index: HashMap::new(),
            rules,
            clock,
        }
    }

    pub fn connect(&mut self, connection_id: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        self.connections
            .register(connection_id, sender, self.clock.now());
        tracing::info!(
            connection_id = %connection_id,
            connections = self.connections.len(),
            "Client connected"
        );
    }

    /// Remove every trace of a connection.
    ///
    /// Clears the waiting slot, ends its session (the opponent wins by
    /// abandonment) and drops it from every room. Safe to call twice.
    pub fn disconnect(&mut self, connection_id: ConnectionId) {
        let connected_at = self.connections.get(connection_id).map(|c| c.connected_at);
        if !self.connections.unregister(connection_id) {
            return;
        }

        if self.queue.remove(connection_id) {
            tracing::debug!(connection_id = %connection_id, "Removed from matchmaking queue");
        }

        if let Some(session_id) = self.session_index.remove(&connection_id) {
            if let Some(mut session) = self.sessions.remove(&session_id) {
                session.abandon(&self.connections, connection_id);
                self.release(&session);
            }
        }

        for departure in self.rooms.handle_disconnect(connection_id) {
            tracing::debug!(
                connection_id = %connection_id,
                room_id = %departure.room_id,
                deleted = departure.deleted,
                "Left room"
            );
        }

        let duration = connected_at.map(|at| (self.clock.now() - at).num_seconds());
        tracing::info!(
            connection_id = %connection_id,
            duration_secs = ?duration,
            connections = self.connections.len(),
            "Client disconnected"
        );
    }

    /// Route one decoded client message.
    pub fn handle_message(&mut self, connection_id: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::InitGame => self.request_random_match(connection_id),
            ClientMessage::Move { chess_move } => self.submit_move(connection_id, chess_move),
            ClientMessage::CreateRoom { room_id } => self.create_room(connection_id, room_id),
            ClientMessage::JoinRoom { room_id } => self.join_room(connection_id, room_id),
        }
    }

    pub fn request_random_match(&mut self, connection_id: ConnectionId) {
        if !self.connections.contains(connection_id) {
            return;
        }
        if self.session_index.contains_key(&connection_id) {
            tracing::debug!(connection_id = %connection_id, "Match request ignored while in a game");
            return;
        }

        match self.queue.enqueue_or_pair(connection_id) {
            Some(pairing) => {
                self.start_session(pairing, SessionOrigin::Random);
            }
            None => {
                tracing::debug!(connection_id = %connection_id, "Waiting for an opponent");
            }
        }
    }

    pub fn create_room(&mut self, connection_id: ConnectionId, room_id: RoomId) {
        if !self.connections.contains(connection_id) {
            return;
        }
        let result = if self.session_index.contains_key(&connection_id) {
            Err(RoomError::InGame)
        } else {
            self.rooms
                .create_room(room_id.clone(), connection_id, self.clock.now())
        };

        let response = match result {
            Ok(()) => RoomResponse::ok(room_id),
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, room_id = %room_id, error = %e, "Create room failed");
                RoomResponse::failed(room_id, e.to_string())
            }
        };
        self.connections
            .send(connection_id, ServerMessage::CreateRoom(response));
    }

    pub fn join_room(&mut self, connection_id: ConnectionId, room_id: RoomId) {
        if !self.connections.contains(connection_id) {
            return;
        }
        let result = if self.session_index.contains_key(&connection_id) {
            Err(RoomError::InGame)
        } else {
            self.rooms.join_room(&room_id, connection_id)
        };

        match result {
            Ok(joined) => {
                self.connections.send(
                    connection_id,
                    ServerMessage::JoinRoom(RoomResponse::ok(joined.room_id.clone())),
                );
                if let Some(pairing) = joined.pairing {
                    self.start_session(pairing, SessionOrigin::Room(joined.room_id));
                }
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, room_id = %room_id, error = %e, "Join room failed");
                self.connections.send(
                    connection_id,
                    ServerMessage::JoinRoom(RoomResponse::failed(room_id, e.to_string())),
                );
            }
        }
    }

    pub fn submit_move(&mut self, connection_id: ConnectionId, chess_move: Move) {
        let Some(session_id) = self.session_index.get(&connection_id).copied() else {
            tracing::debug!(connection_id = %connection_id, "Move from connection without a game");
            return;
        };
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return;
        };

        let outcome = session.handle_move(&self.connections, connection_id, chess_move);
        if matches!(outcome, MoveOutcome::GameOver { .. }) {
            if let Some(session) = self.sessions.remove(&session_id) {
                self.release(&session);
            }
        }
    }

    pub fn stats(&self) -> LobbyStats {
        LobbyStats {
            connections: self.connections.len(),
            waiting: usize::from(self.queue.waiting().is_some()),
            rooms: self.rooms.len(),
            active_sessions: self.sessions.len(),
        }
    }

    pub fn session_of(&self, connection_id: ConnectionId) -> Option<&GameSession> {
        self.session_index
            .get(&connection_id)
            .and_then(|id| self.sessions.get(id))
    }

    fn start_session(&mut self, pairing: Pairing, origin: SessionOrigin) -> SessionId {
        let keep = match &origin {
            SessionOrigin::Room(room_id) => Some(room_id.clone()),
            SessionOrigin::Random => None,
        };
        for participant in [pairing.white, pairing.black] {
            self.queue.remove(participant);
            self.rooms.withdraw_waiting(participant, keep.as_ref());
        }

        let session_id = SessionId::new();
        let session = GameSession::start(
            session_id,
            pairing,
            (self.rules)(),
            origin,
            self.clock.now(),
            &self.connections,
        );
        if let Some(room_id) = keep {
            self.rooms.attach_session(&room_id, session_id);
        }
        self.session_index.insert(pairing.white, session_id);
        self.session_index.insert(pairing.black, session_id);
        self.sessions.insert(session_id, session);
        session_id
    }

    /// Free the participants of a finished session.
    fn release(&mut self, session: &GameSession) {
        for participant in session.participants() {
            if self.session_index.get(&participant) == Some(&session.id()) {
                self.session_index.remove(&participant);
            }
        }
        tracing::info!(
            session_id = %session.id(),
            moves = session.move_count(),
            duration_secs = (self.clock.now() - session.started_at()).num_seconds(),
            "Game session closed"
        );
    }
}
