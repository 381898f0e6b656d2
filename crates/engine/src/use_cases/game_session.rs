//! One active pairing: turn enforcement, promotion handshake, move relay and
//! game-over detection.
//!
//! A session is built the same way whether the pairing came from random
//! matchmaking or from a full room. It owns its board through the
//! [`RulesEngine`] port and talks to participants only through the
//! [`ConnectionManager`].

use chrono::{DateTime, Utc};

use gambit_domain::{
    ConnectionId, GameOutcome, Move, PromotionPiece, RoomId, SessionId, Side, Square,
};
use gambit_protocol::{GameOverReason, ServerMessage};

use super::matchmaking::Pairing;
use crate::api::connections::ConnectionManager;
use crate::infrastructure::ports::RulesEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The turn owner may submit a move
    AwaitingMove,
    /// The turn owner must choose a piece for a pawn reaching the last rank
    AwaitingPromotion { from: Square, to: Square },
    /// Game over; nothing is accepted any more
    Terminated,
}

/// How the two participants were brought together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOrigin {
    Random,
    Room(RoomId),
}

/// Why a submission was dropped. Never reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    NotParticipant,
    NotYourTurn,
    Terminated,
    Illegal,
    NoPendingPromotion,
}

/// Result of handing a move to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Ignored(Ignored),
    /// The mover was asked to pick a promotion piece
    PromotionRequested,
    Applied,
    /// The move ended the game; `winner` is `None` for draws
    GameOver {
        winner: Option<Side>,
        outcome: GameOutcome,
    },
}

pub struct GameSession {
    id: SessionId,
    white: ConnectionId,
    black: ConnectionId,
    rules: Box<dyn RulesEngine>,
    move_count: u32,
    started_at: DateTime<Utc>,
    state: SessionState,
    origin: SessionOrigin,
}

impl GameSession {
    /// Start a session and tell both participants which side they play.
    pub fn start(
        id: SessionId,
        pairing: Pairing,
        rules: Box<dyn RulesEngine>,
        origin: SessionOrigin,
        started_at: DateTime<Utc>,
        out: &ConnectionManager,
    ) -> Self {
        let session = Self {
            id,
            white: pairing.white,
            black: pairing.black,
            rules,
            move_count: 0,
            started_at,
            state: SessionState::AwaitingMove,
            origin,
        };

        out.send(
            session.white,
            ServerMessage::InitGame {
                color: Side::White.into(),
            },
        );
        out.send(
            session.black,
            ServerMessage::InitGame {
                color: Side::Black.into(),
            },
        );
        tracing::info!(
            session_id = %id,
            white = %session.white,
            black = %session.black,
            origin = ?session.origin,
            "Game session started"
        );
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn participants(&self) -> [ConnectionId; 2] {
        [self.white, self.black]
    }

    pub fn participant(&self, side: Side) -> ConnectionId {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }

    pub fn side_of(&self, connection_id: ConnectionId) -> Option<Side> {
        if connection_id == self.white {
            Some(Side::White)
        } else if connection_id == self.black {
            Some(Side::Black)
        } else {
            None
        }
    }

    /// Side whose turn it is, by move-count parity.
    pub fn turn(&self) -> Side {
        Side::for_move_count(self.move_count)
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn origin(&self) -> &SessionOrigin {
        &self.origin
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Entry point for a `move` message.
    ///
    /// A move that repeats the squares of a pending promotion and names a
    /// piece completes the handshake; anything else is a fresh submission.
    pub fn handle_move(
        &mut self,
        out: &ConnectionManager,
        connection_id: ConnectionId,
        chess_move: Move,
    ) -> MoveOutcome {
        match (self.state, chess_move.promotion) {
            (SessionState::AwaitingPromotion { from, to }, Some(piece))
                if from == chess_move.from && to == chess_move.to =>
            {
                self.resume_promotion(out, connection_id, piece)
            }
            _ => self.submit_move(out, connection_id, chess_move),
        }
    }

    pub fn submit_move(
        &mut self,
        out: &ConnectionManager,
        connection_id: ConnectionId,
        chess_move: Move,
    ) -> MoveOutcome {
        if let Err(reason) = self.check_turn(connection_id) {
            return self.ignore(connection_id, reason);
        }

        // A pending promotion choice is only replaced once this submission
        // is accepted or asks for a promotion itself
        let promotes = self.is_promotion(chess_move.from, chess_move.to);
        if !promotes {
            // A piece named on an ordinary move is ignored
            let chess_move = Move::new(chess_move.from, chess_move.to);
            return self.accept(out, connection_id, chess_move);
        }

        if chess_move.promotion.is_none() {
            self.state = SessionState::AwaitingPromotion {
                from: chess_move.from,
                to: chess_move.to,
            };
            out.send(
                connection_id,
                ServerMessage::PromotionRequest {
                    from: chess_move.from,
                    to: chess_move.to,
                },
            );
            tracing::debug!(
                session_id = %self.id,
                connection_id = %connection_id,
                chess_move = %chess_move,
                "Promotion choice requested"
            );
            return MoveOutcome::PromotionRequested;
        }

        self.accept(out, connection_id, chess_move)
    }

    /// Complete a pending promotion with the chosen piece.
    pub fn resume_promotion(
        &mut self,
        out: &ConnectionManager,
        connection_id: ConnectionId,
        piece: PromotionPiece,
    ) -> MoveOutcome {
        if let Err(reason) = self.check_turn(connection_id) {
            return self.ignore(connection_id, reason);
        }
        let SessionState::AwaitingPromotion { from, to } = self.state else {
            return self.ignore(connection_id, Ignored::NoPendingPromotion);
        };

        self.accept(out, connection_id, Move::new(from, to).with_promotion(piece))
    }

    /// End the session because `leaver` disconnected.
    ///
    /// The remaining participant is told they won. Returns their side, or
    /// `None` if the session was already over or `leaver` is not part of it.
    pub fn abandon(&mut self, out: &ConnectionManager, leaver: ConnectionId) -> Option<Side> {
        if self.is_terminated() {
            return None;
        }
        let remaining = self.side_of(leaver)?.opposite();
        self.state = SessionState::Terminated;

        out.send(
            self.participant(remaining),
            ServerMessage::GameOver {
                winner: Some(remaining.into()),
                reason: GameOverReason::Abandoned,
            },
        );
        tracing::info!(
            session_id = %self.id,
            leaver = %leaver,
            winner = %remaining,
            moves = self.move_count,
            "Game session abandoned"
        );
        Some(remaining)
    }

    fn check_turn(&self, connection_id: ConnectionId) -> Result<(), Ignored> {
        if self.is_terminated() {
            return Err(Ignored::Terminated);
        }
        match self.side_of(connection_id) {
            None => Err(Ignored::NotParticipant),
            Some(side) if side != self.turn() => Err(Ignored::NotYourTurn),
            Some(_) => Ok(()),
        }
    }

    fn is_promotion(&self, from: Square, to: Square) -> bool {
        self.rules
            .legal_moves(Some(from))
            .iter()
            .any(|m| m.to == to && m.promotion)
    }

    fn accept(
        &mut self,
        out: &ConnectionManager,
        connection_id: ConnectionId,
        chess_move: Move,
    ) -> MoveOutcome {
        let mover = self.turn();
        if let Err(e) = self.rules.apply_move(&chess_move) {
            tracing::debug!(session_id = %self.id, error = %e, "Move rejected by rules engine");
            return self.ignore(connection_id, Ignored::Illegal);
        }

        out.broadcast(
            &self.participants(),
            ServerMessage::Move {
                from: chess_move.from,
                to: chess_move.to,
                promotion: chess_move.promotion,
                color: mover.into(),
                check: self.rules.in_check(),
            },
        );
        self.move_count += 1;
        self.state = SessionState::AwaitingMove;

        let Some(outcome) = self.rules.outcome() else {
            return MoveOutcome::Applied;
        };

        // The side left to move has been mated
        let winner = outcome
            .is_decisive()
            .then(|| self.rules.side_to_move().opposite());
        out.broadcast(
            &self.participants(),
            ServerMessage::GameOver {
                winner: winner.map(Into::into),
                reason: outcome.into(),
            },
        );
        self.state = SessionState::Terminated;
        tracing::info!(
            session_id = %self.id,
            %outcome,
            winner = ?winner,
            moves = self.move_count,
            "Game over"
        );
        MoveOutcome::GameOver { winner, outcome }
    }

    fn ignore(&self, connection_id: ConnectionId, reason: Ignored) -> MoveOutcome {
        tracing::debug!(
            session_id = %self.id,
            connection_id = %connection_id,
            ?reason,
            "Move ignored"
        );
        MoveOutcome::Ignored(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::chess_rules::ChessRules;
    use crate::infrastructure::ports::{LegalMove, MockRulesEngine, RulesError};
    use gambit_protocol::{ColorCode, PlayerColor, Winner};
    use tokio::sync::mpsc;

    struct Harness {
        out: ConnectionManager,
        white: ConnectionId,
        black: ConnectionId,
        white_rx: mpsc::Receiver<ServerMessage>,
        black_rx: mpsc::Receiver<ServerMessage>,
    }

    impl Harness {
        fn new() -> Self {
            let mut out = ConnectionManager::new();
            let (white, black) = (ConnectionId::new(), ConnectionId::new());
            let (white_tx, white_rx) = mpsc::channel(16);
            let (black_tx, black_rx) = mpsc::channel(16);
            out.register(white, white_tx, Utc::now());
            out.register(black, black_tx, Utc::now());
            Self {
                out,
                white,
                black,
                white_rx,
                black_rx,
            }
        }

        fn start(&mut self, rules: Box<dyn RulesEngine>) -> GameSession {
            let session = GameSession::start(
                SessionId::new(),
                Pairing {
                    white: self.white,
                    black: self.black,
                },
                rules,
                SessionOrigin::Random,
                Utc::now(),
                &self.out,
            );
            self.drain();
            session
        }

        fn drain(&mut self) -> (Vec<ServerMessage>, Vec<ServerMessage>) {
            (drain(&mut self.white_rx), drain(&mut self.black_rx))
        }
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn mv(from: &str, to: &str) -> Move {
        Move::new(sq(from), sq(to))
    }

    /// A rules mock that flags `a7`→`a8` as a promotion and accepts any move.
    fn promotion_mock() -> MockRulesEngine {
        let mut rules = MockRulesEngine::new();
        rules.expect_legal_moves().returning(|from| {
            if from == Some(sq("a7")) {
                vec![LegalMove {
                    from: sq("a7"),
                    to: sq("a8"),
                    promotion: true,
                }]
            } else {
                Vec::new()
            }
        });
        rules.expect_in_check().returning(|| false);
        rules.expect_outcome().returning(|| None);
        rules
    }

    #[test]
    fn start_announces_sides() {
        let mut h = Harness::new();
        let session = GameSession::start(
            SessionId::new(),
            Pairing {
                white: h.white,
                black: h.black,
            },
            Box::new(ChessRules::new()),
            SessionOrigin::Random,
            Utc::now(),
            &h.out,
        );

        let (white_msgs, black_msgs) = h.drain();
        assert_eq!(
            white_msgs,
            vec![ServerMessage::InitGame {
                color: PlayerColor::White
            }]
        );
        assert_eq!(
            black_msgs,
            vec![ServerMessage::InitGame {
                color: PlayerColor::Black
            }]
        );
        assert_eq!(session.move_count(), 0);
        assert_eq!(session.turn(), Side::White);
        assert_eq!(session.state(), SessionState::AwaitingMove);
    }

    #[test]
    fn out_of_turn_submission_changes_nothing() {
        let mut h = Harness::new();
        let mut rules = MockRulesEngine::new();
        rules.expect_apply_move().never();
        rules.expect_legal_moves().never();
        let mut session = h.start(Box::new(rules));

        let outcome = session.submit_move(&h.out, h.black, mv("e7", "e5"));

        assert_eq!(outcome, MoveOutcome::Ignored(Ignored::NotYourTurn));
        assert_eq!(session.move_count(), 0);
        assert_eq!(h.drain(), (vec![], vec![]));
    }

    #[test]
    fn outsider_submission_is_ignored() {
        let mut h = Harness::new();
        let mut session = h.start(Box::new(ChessRules::new()));

        let outcome = session.submit_move(&h.out, ConnectionId::new(), mv("e2", "e4"));

        assert_eq!(outcome, MoveOutcome::Ignored(Ignored::NotParticipant));
        assert_eq!(session.move_count(), 0);
    }

    #[test]
    fn opening_move_is_broadcast_and_turn_passes() {
        let mut h = Harness::new();
        let mut session = h.start(Box::new(ChessRules::new()));

        let outcome = session.submit_move(&h.out, h.white, mv("e2", "e4"));

        assert_eq!(outcome, MoveOutcome::Applied);
        let expected = ServerMessage::Move {
            from: sq("e2"),
            to: sq("e4"),
            promotion: None,
            color: ColorCode::White,
            check: false,
        };
        assert_eq!(h.drain(), (vec![expected.clone()], vec![expected]));
        assert_eq!(session.move_count(), 1);
        assert_eq!(session.turn(), Side::Black);

        // White may not move twice in a row
        let outcome = session.submit_move(&h.out, h.white, mv("d2", "d4"));
        assert_eq!(outcome, MoveOutcome::Ignored(Ignored::NotYourTurn));
        assert_eq!(session.move_count(), 1);
    }

    #[test]
    fn illegal_move_is_dropped_silently() {
        let mut h = Harness::new();
        let mut session = h.start(Box::new(ChessRules::new()));

        let outcome = session.submit_move(&h.out, h.white, mv("e2", "e5"));

        assert_eq!(outcome, MoveOutcome::Ignored(Ignored::Illegal));
        assert_eq!(session.move_count(), 0);
        assert_eq!(session.turn(), Side::White);
        assert_eq!(h.drain(), (vec![], vec![]));
    }

    #[test]
    fn promotion_without_piece_asks_mover_only_and_leaves_board() {
        let mut h = Harness::new();
        let mut rules = promotion_mock();
        rules.expect_apply_move().never();
        let mut session = h.start(Box::new(rules));

        let outcome = session.submit_move(&h.out, h.white, mv("a7", "a8"));

        assert_eq!(outcome, MoveOutcome::PromotionRequested);
        assert_eq!(
            session.state(),
            SessionState::AwaitingPromotion {
                from: sq("a7"),
                to: sq("a8")
            }
        );
        assert_eq!(session.move_count(), 0);
        let (white_msgs, black_msgs) = h.drain();
        assert_eq!(
            white_msgs,
            vec![ServerMessage::PromotionRequest {
                from: sq("a7"),
                to: sq("a8")
            }]
        );
        assert!(black_msgs.is_empty());
    }

    #[test]
    fn promotion_handshake_completes_with_real_rules() {
        let mut h = Harness::new();
        let rules = ChessRules::from_fen("8/P6k/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut session = h.start(Box::new(rules));

        assert_eq!(
            session.handle_move(&h.out, h.white, mv("a7", "a8")),
            MoveOutcome::PromotionRequested
        );
        h.drain();

        let outcome = session.handle_move(
            &h.out,
            h.white,
            mv("a7", "a8").with_promotion(PromotionPiece::Queen),
        );

        assert_eq!(outcome, MoveOutcome::Applied);
        let expected = ServerMessage::Move {
            from: sq("a7"),
            to: sq("a8"),
            promotion: Some(PromotionPiece::Queen),
            color: ColorCode::White,
            check: false,
        };
        assert_eq!(h.drain(), (vec![expected.clone()], vec![expected]));
        assert_eq!(session.move_count(), 1);
        assert_eq!(session.state(), SessionState::AwaitingMove);
    }

    #[test]
    fn only_the_mover_can_resume_promotion() {
        let mut h = Harness::new();
        let mut rules = promotion_mock();
        rules.expect_apply_move().never();
        let mut session = h.start(Box::new(rules));
        session.submit_move(&h.out, h.white, mv("a7", "a8"));
        h.drain();

        let outcome = session.resume_promotion(&h.out, h.black, PromotionPiece::Queen);

        assert_eq!(outcome, MoveOutcome::Ignored(Ignored::NotYourTurn));
        assert!(matches!(
            session.state(),
            SessionState::AwaitingPromotion { .. }
        ));
        assert_eq!(h.drain(), (vec![], vec![]));
    }

    #[test]
    fn resume_without_pending_promotion_is_ignored() {
        let mut h = Harness::new();
        let mut session = h.start(Box::new(ChessRules::new()));

        let outcome = session.resume_promotion(&h.out, h.white, PromotionPiece::Queen);

        assert_eq!(outcome, MoveOutcome::Ignored(Ignored::NoPendingPromotion));
        assert_eq!(session.move_count(), 0);
    }

    #[test]
    fn different_move_cancels_pending_promotion() {
        let mut h = Harness::new();
        let mut rules = promotion_mock();
        rules
            .expect_apply_move()
            .withf(|m| m.to_string() == "e1e2")
            .times(1)
            .returning(|_| Ok(()));
        let mut session = h.start(Box::new(rules));
        session.submit_move(&h.out, h.white, mv("a7", "a8"));

        let outcome = session.handle_move(&h.out, h.white, mv("e1", "e2"));

        assert_eq!(outcome, MoveOutcome::Applied);
        assert_eq!(session.state(), SessionState::AwaitingMove);
        assert_eq!(session.move_count(), 1);
    }

    #[test]
    fn illegal_move_keeps_pending_promotion() {
        let mut h = Harness::new();
        let mut rules = promotion_mock();
        rules
            .expect_apply_move()
            .times(1)
            .returning(|m| Err(RulesError::IllegalMove(m.to_string())));
        let mut session = h.start(Box::new(rules));
        session.submit_move(&h.out, h.white, mv("a7", "a8"));
        h.drain();

        let outcome = session.handle_move(&h.out, h.white, mv("e1", "e5"));

        assert_eq!(outcome, MoveOutcome::Ignored(Ignored::Illegal));
        assert_eq!(
            session.state(),
            SessionState::AwaitingPromotion {
                from: sq("a7"),
                to: sq("a8")
            }
        );
        assert_eq!(session.move_count(), 0);
        assert_eq!(h.drain(), (vec![], vec![]));
    }

    #[test]
    fn piece_named_on_an_ordinary_move_is_dropped() {
        let mut h = Harness::new();
        let mut session = h.start(Box::new(ChessRules::new()));

        let outcome = session.handle_move(
            &h.out,
            h.white,
            mv("e2", "e4").with_promotion(PromotionPiece::Queen),
        );

        assert_eq!(outcome, MoveOutcome::Applied);
        assert_eq!(session.move_count(), 1);
        let expected = ServerMessage::Move {
            from: sq("e2"),
            to: sq("e4"),
            promotion: None,
            color: ColorCode::White,
            check: false,
        };
        assert_eq!(h.drain(), (vec![expected.clone()], vec![expected]));
    }

    #[test]
    fn checkmate_names_the_mover_and_freezes_the_session() {
        let mut h = Harness::new();
        let mut session = h.start(Box::new(ChessRules::new()));

        let moves = [
            (h.white, "f2", "f3"),
            (h.black, "e7", "e5"),
            (h.white, "g2", "g4"),
        ];
        for (who, from, to) in moves {
            assert_eq!(
                session.submit_move(&h.out, who, mv(from, to)),
                MoveOutcome::Applied
            );
        }
        h.drain();

        let outcome = session.submit_move(&h.out, h.black, mv("d8", "h4"));

        assert_eq!(
            outcome,
            MoveOutcome::GameOver {
                winner: Some(Side::Black),
                outcome: GameOutcome::Checkmate
            }
        );
        let game_over = ServerMessage::GameOver {
            winner: Some(Winner::Black),
            reason: GameOverReason::Checkmate,
        };
        let (white_msgs, black_msgs) = h.drain();
        assert_eq!(white_msgs.len(), 2);
        assert!(matches!(
            white_msgs[0],
            ServerMessage::Move {
                color: ColorCode::Black,
                check: true,
                ..
            }
        ));
        assert_eq!(white_msgs[1], game_over);
        assert_eq!(black_msgs[1], game_over);
        assert!(session.is_terminated());
        assert_eq!(session.move_count(), 4);

        let outcome = session.submit_move(&h.out, h.white, mv("e2", "e4"));
        assert_eq!(outcome, MoveOutcome::Ignored(Ignored::Terminated));
        assert_eq!(session.move_count(), 4);
        assert_eq!(h.drain(), (vec![], vec![]));
    }

    #[test]
    fn draw_reports_null_winner() {
        let mut h = Harness::new();
        let mut rules = MockRulesEngine::new();
        rules.expect_legal_moves().returning(|_| Vec::new());
        rules.expect_apply_move().returning(|_| Ok(()));
        rules.expect_in_check().returning(|| false);
        rules
            .expect_outcome()
            .returning(|| Some(GameOutcome::Stalemate));
        rules.expect_side_to_move().never();
        let mut session = h.start(Box::new(rules));

        let outcome = session.submit_move(&h.out, h.white, mv("f7", "f8"));

        assert_eq!(
            outcome,
            MoveOutcome::GameOver {
                winner: None,
                outcome: GameOutcome::Stalemate
            }
        );
        let (white_msgs, _) = h.drain();
        assert_eq!(
            white_msgs.last(),
            Some(&ServerMessage::GameOver {
                winner: None,
                reason: GameOverReason::Stalemate
            })
        );
    }

    #[test]
    fn abandon_awards_the_remaining_participant() {
        let mut h = Harness::new();
        let mut session = h.start(Box::new(ChessRules::new()));

        assert_eq!(session.abandon(&h.out, h.white), Some(Side::Black));

        let (white_msgs, black_msgs) = h.drain();
        assert!(white_msgs.is_empty());
        assert_eq!(
            black_msgs,
            vec![ServerMessage::GameOver {
                winner: Some(Winner::Black),
                reason: GameOverReason::Abandoned
            }]
        );
        assert!(session.is_terminated());

        // A second abandon is a no-op
        assert_eq!(session.abandon(&h.out, h.black), None);
        assert_eq!(h.drain(), (vec![], vec![]));
    }

    #[test]
    fn abandon_by_outsider_is_ignored() {
        let mut h = Harness::new();
        let mut session = h.start(Box::new(ChessRules::new()));

        assert_eq!(session.abandon(&h.out, ConnectionId::new()), None);
        assert!(!session.is_terminated());
    }
}
