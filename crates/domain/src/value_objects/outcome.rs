use std::fmt;

/// Terminal condition reported by the rules engine.
///
/// The engine does not name a winner; on checkmate the winner is the side
/// that is *not* to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    /// Threefold repetition or the fifty-move rule.
    DrawByRule,
}

impl GameOutcome {
    pub fn is_decisive(self) -> bool {
        matches!(self, GameOutcome::Checkmate)
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameOutcome::Checkmate => "checkmate",
            GameOutcome::Stalemate => "stalemate",
            GameOutcome::InsufficientMaterial => "insufficient_material",
            GameOutcome::DrawByRule => "draw_by_rule",
        };
        write!(f, "{}", label)
    }
}
