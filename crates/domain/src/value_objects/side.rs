//! Sides and piece kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// One of the two sides of a game. White always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// The side that owns the turn after `move_count` accepted moves.
    pub fn for_move_count(move_count: u32) -> Self {
        if move_count % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

/// Piece a pawn may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PromotionPiece {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PromotionPiece {
    /// Lowercase letter used on the wire (`q`, `r`, `b`, `n`).
    pub fn as_char(self) -> char {
        match self {
            PromotionPiece::Queen => 'q',
            PromotionPiece::Rook => 'r',
            PromotionPiece::Bishop => 'b',
            PromotionPiece::Knight => 'n',
        }
    }
}

impl FromStr for PromotionPiece {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "q" => Ok(PromotionPiece::Queen),
            "r" => Ok(PromotionPiece::Rook),
            "b" => Ok(PromotionPiece::Bishop),
            "n" => Ok(PromotionPiece::Knight),
            _ => Err(DomainError::parse(format!("Unknown promotion piece: {}", s))),
        }
    }
}

impl fmt::Display for PromotionPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<String> for PromotionPiece {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PromotionPiece> for String {
    fn from(piece: PromotionPiece) -> String {
        piece.to_string()
    }
}
