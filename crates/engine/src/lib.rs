//! Gambit Engine library.
//!
//! Pairs chess players over WebSocket and relays their moves.
//!
//! ## Structure
//!
//! - `use_cases/` - Matchmaking, rooms, game sessions and the lobby that owns them
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
