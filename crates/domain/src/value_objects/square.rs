//! Board squares in algebraic notation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// A validated board square, `a1` through `h8`.
///
/// Files and ranks are stored zero-based: `a1` is `(0, 0)`, `h8` is `(7, 7)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Create a square from zero-based file and rank indices.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if either index is 8 or more.
    pub fn new(file: u8, rank: u8) -> Result<Self, DomainError> {
        if file > 7 || rank > 7 {
            return Err(DomainError::validation(format!(
                "Square indices out of range: file {}, rank {}",
                file, rank
            )));
        }
        Ok(Self { file, rank })
    }

    /// Zero-based file index (`a` = 0).
    pub fn file(&self) -> u8 {
        self.file
    }

    /// Zero-based rank index (`1` = 0).
    pub fn rank(&self) -> u8 {
        self.rank
    }
}

impl FromStr for Square {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(DomainError::parse(format!("Invalid square: {}", s)));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(DomainError::parse(format!("Invalid square: {}", s)));
        }
        Ok(Self {
            file: file - b'a',
            rank: rank - b'1',
        })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, (b'1' + self.rank) as char)
    }
}

impl TryFrom<String> for Square {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> String {
        square.to_string()
    }
}
