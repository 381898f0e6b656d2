//! Rules engine backed by the `chess` crate.

use std::str::FromStr;
use std::sync::Arc;

use chess::{Board, BoardStatus, ChessMove, Color, File, Game, MoveGen, Piece, Rank, EMPTY};
use gambit_domain::{GameOutcome, Move, PromotionPiece, Side, Square};

use crate::infrastructure::ports::{LegalMove, RulesEngine, RulesError, RulesFactory};

/// Standard chess for one board, including move history for draw detection.
pub struct ChessRules {
    game: Game,
}

impl ChessRules {
    /// Board in the standard starting position.
    pub fn new() -> Self {
        Self { game: Game::new() }
    }

    /// Board set up from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let board =
            Board::from_str(fen).map_err(|_| RulesError::InvalidPosition(fen.to_string()))?;
        Ok(Self {
            game: Game::new_with_board(board),
        })
    }

    /// Factory handing a fresh starting position to every session.
    pub fn factory() -> RulesFactory {
        Arc::new(|| Box::new(ChessRules::new()) as Box<dyn RulesEngine>)
    }

    fn position(&self) -> Board {
        self.game.current_position()
    }
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesEngine for ChessRules {
    fn legal_moves(&self, from: Option<Square>) -> Vec<LegalMove> {
        let board = self.position();
        MoveGen::new_legal(&board)
            .filter(|m| from.is_none_or(|sq| m.get_source() == to_chess_square(sq)))
            // Promotions come once per piece kind; keep one entry per square pair
            .filter(|m| matches!(m.get_promotion(), None | Some(Piece::Queen)))
            .map(|m| LegalMove {
                from: from_chess_square(m.get_source()),
                to: from_chess_square(m.get_dest()),
                promotion: m.get_promotion().is_some(),
            })
            .collect()
    }

    fn apply_move(&mut self, chess_move: &Move) -> Result<(), RulesError> {
        let source = to_chess_square(chess_move.from);
        let dest = to_chess_square(chess_move.to);
        // A piece named on a move that does not promote is ignored
        let promotion = chess_move
            .promotion
            .filter(|_| promotes(&self.position(), source, dest))
            .map(to_chess_piece);
        let candidate = ChessMove::new(source, dest, promotion);
        if !self.position().legal(candidate) || !self.game.make_move(candidate) {
            return Err(RulesError::IllegalMove(chess_move.to_string()));
        }
        Ok(())
    }

    fn outcome(&self) -> Option<GameOutcome> {
        let board = self.position();
        match board.status() {
            BoardStatus::Checkmate => Some(GameOutcome::Checkmate),
            BoardStatus::Stalemate => Some(GameOutcome::Stalemate),
            BoardStatus::Ongoing if insufficient_material(&board) => {
                Some(GameOutcome::InsufficientMaterial)
            }
            BoardStatus::Ongoing if self.game.can_declare_draw() => Some(GameOutcome::DrawByRule),
            BoardStatus::Ongoing => None,
        }
    }

    fn side_to_move(&self) -> Side {
        match self.game.side_to_move() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }

    fn in_check(&self) -> bool {
        *self.position().checkers() != EMPTY
    }
}

/// Whether moving from `source` to `dest` is a pawn reaching the last rank.
fn promotes(board: &Board, source: chess::Square, dest: chess::Square) -> bool {
    board.piece_on(source) == Some(Piece::Pawn)
        && matches!(dest.get_rank(), Rank::First | Rank::Eighth)
}

/// Bare kings, kings plus a single minor piece, or only bishops that all
/// stand on squares of one colour.
fn insufficient_material(board: &Board) -> bool {
    let heavy =
        *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy != EMPTY {
        return false;
    }
    let knights = *board.pieces(Piece::Knight);
    let bishops = *board.pieces(Piece::Bishop);
    if (knights | bishops).popcnt() <= 1 {
        return true;
    }
    if knights != EMPTY {
        return false;
    }

    let mut shades = bishops.map(|sq| (sq.get_file().to_index() + sq.get_rank().to_index()) % 2);
    match shades.next() {
        Some(first) => shades.all(|shade| shade == first),
        None => true,
    }
}

fn to_chess_square(square: Square) -> chess::Square {
    chess::Square::make_square(
        Rank::from_index(square.rank() as usize),
        File::from_index(square.file() as usize),
    )
}

fn from_chess_square(square: chess::Square) -> Square {
    let file = square.get_file().to_index() as u8;
    let rank = square.get_rank().to_index() as u8;
    // chess::Square is always on the board
    Square::new(file, rank).unwrap_or_else(|_| unreachable!("square off the board"))
}

fn to_chess_piece(piece: PromotionPiece) -> Piece {
    match piece {
        PromotionPiece::Queen => Piece::Queen,
        PromotionPiece::Rook => Piece::Rook,
        PromotionPiece::Bishop => Piece::Bishop,
        PromotionPiece::Knight => Piece::Knight,
    }
}
