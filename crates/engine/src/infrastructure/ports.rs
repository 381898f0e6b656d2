//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Chess rules (could swap the `chess` crate for another move generator)
//! - Clock (for testing)

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gambit_domain::{GameOutcome, Move, Side, Square};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

// =============================================================================
// Rules Types
// =============================================================================

/// A legal move as reported by the rules engine.
///
/// Promotion moves are reported once per origin/destination pair with
/// `promotion` set, regardless of how many pieces the pawn may become.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegalMove {
    pub from: Square,
    pub to: Square,
    pub promotion: bool,
}

// =============================================================================
// Rules Port
// =============================================================================

/// One board under the control of a rules engine.
///
/// Each game session owns its own instance; the engine owns the board state.
#[cfg_attr(test, mockall::automock)]
pub trait RulesEngine: Send {
    /// Legal moves in the current position, optionally only those from `from`.
    fn legal_moves(&self, from: Option<Square>) -> Vec<LegalMove>;

    /// Validate and apply a move for the side to move.
    fn apply_move(&mut self, chess_move: &Move) -> Result<(), RulesError>;

    /// Terminal condition of the current position, if any.
    fn outcome(&self) -> Option<GameOutcome>;

    fn side_to_move(&self) -> Side;

    /// Whether the side to move is in check.
    fn in_check(&self) -> bool;
}

/// Creates a fresh board for every new session.
pub type RulesFactory = Arc<dyn Fn() -> Box<dyn RulesEngine> + Send + Sync>;

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
