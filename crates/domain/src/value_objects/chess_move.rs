use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PromotionPiece, Square};

/// A move request: origin, destination and an optional promotion choice.
///
/// Only used transiently to talk to the rules engine and to build broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPiece>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, piece: PromotionPiece) -> Self {
        self.promotion = Some(piece);
        self
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.promotion {
            Some(piece) => write!(f, "{}{}{}", self.from, self.to, piece),
            None => write!(f, "{}{}", self.from, self.to),
        }
    }
}
