//! Connection management for WebSocket clients.
//!
//! Tracks connected clients and the outbound channel of each one. The manager
//! is owned by the [`Lobby`](crate::use_cases::lobby::Lobby) and only mutated
//! under its lock, so it needs no locking of its own.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use gambit_domain::ConnectionId;
use gambit_protocol::ServerMessage;

/// Information about a connected client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Unique ID for this connection
    pub connection_id: ConnectionId,
    /// When the socket was registered
    pub connected_at: DateTime<Utc>,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    /// Map of connection_id -> (ConnectionInfo, sender channel)
    connections: HashMap<ConnectionId, (ConnectionInfo, mpsc::Sender<ServerMessage>)>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Register a new connection.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        sender: mpsc::Sender<ServerMessage>,
        connected_at: DateTime<Utc>,
    ) {
        let info = ConnectionInfo {
            connection_id,
            connected_at,
        };
        self.connections.insert(connection_id, (info, sender));
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    /// Unregister a connection. Returns false if it was not registered.
    pub fn unregister(&mut self, connection_id: ConnectionId) -> bool {
        if self.connections.remove(&connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
            true
        } else {
            false
        }
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }

    /// Get connection info by ID.
    pub fn get(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        self.connections
            .get(&connection_id)
            .map(|(info, _)| info.clone())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Send a message to one connection without waiting.
    ///
    /// Unknown connections and full or closed channels are logged and skipped.
    pub fn send(&self, connection_id: ConnectionId, message: ServerMessage) {
        match self.connections.get(&connection_id) {
            Some((_, sender)) => {
                if let Err(e) = sender.try_send(message) {
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to send message"
                    );
                }
            }
            None => {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Dropping message for unknown connection"
                );
            }
        }
    }

    /// Send the same message to every listed connection.
    pub fn broadcast(&self, connection_ids: &[ConnectionId], message: ServerMessage) {
        for connection_id in connection_ids {
            self.send(*connection_id, message.clone());
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
