//! Anonymous random pairing.

use gambit_domain::ConnectionId;

/// Two participants ready to start a session. `white` moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub white: ConnectionId,
    pub black: ConnectionId,
}

/// Holds at most one participant waiting for an opponent.
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    waiting: Option<ConnectionId>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `connection_id`, or pair it with whoever is already waiting.
    ///
    /// The participant that waited plays white. Requeueing the waiting
    /// participant is a no-op.
    pub fn enqueue_or_pair(&mut self, connection_id: ConnectionId) -> Option<Pairing> {
        match self.waiting {
            Some(waiting) if waiting == connection_id => None,
            Some(waiting) => {
                self.waiting = None;
                Some(Pairing {
                    white: waiting,
                    black: connection_id,
                })
            }
            None => {
                self.waiting = Some(connection_id);
                None
            }
        }
    }

    /// Clear the slot if `connection_id` holds it.
    pub fn remove(&mut self, connection_id: ConnectionId) -> bool {
        if self.waiting == Some(connection_id) {
            self.waiting = None;
            true
        } else {
            false
        }
    }

    pub fn waiting(&self) -> Option<ConnectionId> {
        self.waiting
    }
}
