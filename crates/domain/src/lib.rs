//! Gambit Domain - identifiers and chess vocabulary shared across the workspace.
//!
//! Everything here is plain data: validated value objects and the ids used to
//! address connections and sessions. No I/O and no chess rules.

pub mod error;
pub mod ids;
pub mod value_objects;

pub use error::DomainError;
pub use ids::{ConnectionId, SessionId};
pub use value_objects::{GameOutcome, Move, PromotionPiece, RoomId, Side, Square};
