//! Value objects shared by the protocol and the engine.

mod chess_move;
mod outcome;
mod room_id;
mod side;
mod square;

pub use chess_move::Move;
pub use outcome::GameOutcome;
pub use room_id::RoomId;
pub use side::{PromotionPiece, Side};
pub use square::Square;
