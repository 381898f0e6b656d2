//! Gambit Protocol - Shared types for the relay server and its clients
//!
//! This crate contains the WebSocket message types exchanged over `/ws`:
//! - [`ClientMessage`]: requests from a participant
//! - [`ServerMessage`]: notifications and responses from the relay
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde and the domain vocabulary
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Closed decoding** - anything that does not match a known shape fails to parse

pub mod messages;

pub use messages::{
    ClientMessage, ColorCode, GameOverReason, PlayerColor, RoomResponse, ServerMessage, Winner,
};
