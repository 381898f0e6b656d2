//! Use cases - the relay's user stories.
//!
//! - `matchmaking` - anonymous random pairing
//! - `rooms` - private rooms with join/capacity rules
//! - `game_session` - turn relay for one pairing
//! - `lobby` - owns the registries and routes client messages

pub mod game_session;
pub mod lobby;
pub mod matchmaking;
pub mod rooms;

pub use lobby::{Lobby, LobbyStats};
