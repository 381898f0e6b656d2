//! Application state and composition.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::ports::{ClockPort, RulesFactory};
use crate::use_cases::Lobby;

/// Main application state.
///
/// Passed to HTTP/WebSocket handlers via Axum state. All mutable relay state
/// lives in the lobby; handlers lock it once per message.
pub struct App {
    pub lobby: Mutex<Lobby>,
    pub config: ServerConfig,
}

impl App {
    pub fn new(config: ServerConfig, rules: RulesFactory, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            lobby: Mutex::new(Lobby::new(rules, clock)),
            config,
        }
    }
}
