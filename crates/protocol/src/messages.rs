//! WebSocket message types for relay/participant communication
//!
//! Every frame is a JSON envelope `{ "type": ..., "payload": ... }`. The
//! payload is absent for `init_game` requests.

use serde::{Deserialize, Serialize};

use gambit_domain::{GameOutcome, Move, PromotionPiece, RoomId, Side, Square};

// =============================================================================
// Client Messages (participant → relay)
// =============================================================================

/// Messages from a participant to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask to be paired with the next anonymous participant
    InitGame,
    /// Submit a move (or resubmit one with the promotion piece chosen)
    Move {
        #[serde(rename = "move")]
        chess_move: Move,
    },
    /// Open a private room under a caller-chosen id
    CreateRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
    /// Join an existing private room
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
}

// =============================================================================
// Server Messages (relay → participant)
// =============================================================================

/// Messages from the relay to a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A session started; tells the participant which side they play
    InitGame { color: PlayerColor },
    /// A move was accepted (sent to both participants)
    Move {
        from: Square,
        to: Square,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promotion: Option<PromotionPiece>,
        color: ColorCode,
        /// The side to move is now in check
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        check: bool,
    },
    /// The mover must pick a promotion piece and resend the move
    PromotionRequest { from: Square, to: Square },
    /// Response to a create_room request
    CreateRoom(RoomResponse),
    /// Response to a join_room request
    JoinRoom(RoomResponse),
    /// The session ended; `winner` is null for draws
    GameOver {
        winner: Option<Winner>,
        reason: GameOverReason,
    },
}

/// Payload of create_room / join_room responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub success: bool,
    pub room_id: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RoomResponse {
    pub fn ok(room_id: RoomId) -> Self {
        Self {
            success: true,
            room_id,
            error: None,
        }
    }

    pub fn failed(room_id: RoomId, error: impl Into<String>) -> Self {
        Self {
            success: false,
            room_id,
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// Shared enums
// =============================================================================

/// Side assignment announced in `init_game`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

/// Short side code carried by move broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorCode {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

/// Winner named in `game_over`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    White,
    Black,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    DrawByRule,
    /// The opponent disconnected
    Abandoned,
}

impl From<Side> for PlayerColor {
    fn from(side: Side) -> Self {
        match side {
            Side::White => PlayerColor::White,
            Side::Black => PlayerColor::Black,
        }
    }
}

impl From<Side> for ColorCode {
    fn from(side: Side) -> Self {
        match side {
            Side::White => ColorCode::White,
            Side::Black => ColorCode::Black,
        }
    }
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Winner::White,
            Side::Black => Winner::Black,
        }
    }
}

impl From<GameOutcome> for GameOverReason {
    fn from(outcome: GameOutcome) -> Self {
        match outcome {
            GameOutcome::Checkmate => GameOverReason::Checkmate,
            GameOutcome::Stalemate => GameOverReason::Stalemate,
            GameOutcome::InsufficientMaterial => GameOverReason::InsufficientMaterial,
            GameOutcome::DrawByRule => GameOverReason::DrawByRule,
        }
    }
}
