/*
  Pellet, a chess move generation core.
  Copyright (C) 2022 The Pellet Authors (see AUTHORS.md file)

  Pellet is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Pellet is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! Board state: piece positions, side to move, castling rights, and the
//! en passant target. Carries no history and no repetition bookkeeping.
//! `apply`/`unapply` are the sole ways to mutate a board after construction.

use super::{Bitboard, CastleRights, Color, Move, Piece, Square};

use std::{
    convert::TryFrom,
    default::Default,
    fmt::{Display, Formatter},
    ops::Index,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// A chess position. Does not track repetition history or a game clock
/// beyond the halfmove/fullmove counters required to reconstruct a FEN.
pub struct Board {
    /// The squares occupied by White and Black, respectively.
    sides: [Bitboard; 2],
    /// The squares occupied by (in order) knights, bishops, rooks, queens,
    /// pawns, and kings, regardless of color.
    pieces: [Bitboard; Piece::NUM_TYPES],
    /// The color of the player to move.
    pub player: Color,
    /// The square a pawn can move to via en passant. `None` unless the
    /// previous move was a pawn double push.
    pub en_passant_square: Option<Square>,
    /// The rights each side retains for castling.
    pub castle_rights: CastleRights,
    /// Number of halfmoves since the last pawn move or capture.
    pub halfmove_clock: u32,
    /// The number of the full move currently being played, starting at 1.
    pub fullmove_number: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Data needed to reverse one `Board::apply` call via `Board::unapply`.
pub struct UndoRecord {
    /// The piece captured by the move, if any. For en passant this is
    /// always `Piece::Pawn`, even though the captured pawn did not stand
    /// on the move's destination square.
    captured: Option<Piece>,
    /// Whether the move was an en passant capture.
    is_en_passant: bool,
    /// Whether the move was a castle.
    is_castle: bool,
    /// `castle_rights` before the move was applied.
    prior_castle_rights: CastleRights,
    /// `en_passant_square` before the move was applied.
    prior_en_passant_square: Option<Square>,
    /// `halfmove_clock` before the move was applied.
    prior_halfmove_clock: u32,
}

impl Board {
    /// Construct a `Board` from the standard chess starting position.
    pub fn new() -> Board {
        Board {
            sides: [
                Bitboard::new(0x0000_0000_0000_FFFF), // white
                Bitboard::new(0xFFFF_0000_0000_0000), // black
            ],
            pieces: [
                Bitboard::new(0x4200_0000_0000_0042), // knight
                Bitboard::new(0x2400_0000_0000_0024), // bishop
                Bitboard::new(0x8100_0000_0000_0081), // rook
                Bitboard::new(0x0800_0000_0000_0008), // queen
                Bitboard::new(0x00FF_0000_0000_FF00), // pawn
                Bitboard::new(0x1000_0000_0000_0010), // king
            ],
            player: Color::White,
            en_passant_square: None,
            castle_rights: CastleRights::ALL_RIGHTS,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    #[inline(always)]
    #[must_use]
    /// Get the squares occupied by all pieces.
    pub fn occupancy(&self) -> Bitboard {
        self[Color::White] | self[Color::Black]
    }

    #[inline(always)]
    #[must_use]
    /// Get the type of the piece occupying a given square, if any.
    pub fn type_at_square(&self, sq: Square) -> Option<Piece> {
        for pt in Piece::ALL_TYPES {
            if self[pt].contains(sq) {
                return Some(pt);
            }
        }
        None
    }

    #[inline(always)]
    #[must_use]
    /// Get the color of the piece occupying a given square, if any.
    pub fn color_at_square(&self, sq: Square) -> Option<Color> {
        let bb = Bitboard::from(sq);
        if !(self[Color::Black] & bb).is_empty() {
            return Some(Color::Black);
        }
        if !(self[Color::White] & bb).is_empty() {
            return Some(Color::White);
        }
        None
    }

    #[inline(always)]
    #[must_use]
    /// Is `m` a capture in the current position, including en passant?
    /// Requires `m` to be at least pseudo-legal.
    pub fn is_move_capture(&self, m: Move) -> bool {
        self.occupancy().contains(m.to_square())
            || (self.type_at_square(m.from_square()) == Some(Piece::Pawn)
                && Some(m.to_square()) == self.en_passant_square)
    }

    #[must_use]
    /// Check the §3 structural invariants of this board: the two
    /// half-boards don't overlap, the six piece-kind sets are pairwise
    /// disjoint and union exactly to the occupancy, and each side has
    /// exactly one king.
    pub fn is_valid(&self) -> bool {
        if !(self.sides[0] & self.sides[1]).is_empty() {
            return false;
        }

        let mut pieces_checksum = Bitboard::EMPTY;
        let mut pieces_checkor = Bitboard::EMPTY;
        for bb in self.pieces {
            pieces_checksum += bb;
            pieces_checkor |= bb;
        }
        if pieces_checksum != pieces_checkor {
            return false;
        }
        if pieces_checkor != self.occupancy() {
            return false;
        }

        (self[Piece::King] & self[Color::White]).has_single_bit()
            && (self[Piece::King] & self[Color::Black]).has_single_bit()
    }

    /// Apply `m` to the board, mutating it in place, and return the record
    /// needed to reverse it with `unapply`. Assumes `m` is at least
    /// pseudo-legal on this board.
    pub fn apply(&mut self, m: Move) -> UndoRecord {
        let from_sq = m.from_square();
        let to_sq = m.to_square();
        let player = self.player;
        let opponent = !player;

        let mover_type = self
            .type_at_square(from_sq)
            .expect("apply: no piece on move's from-square");
        let is_king_move = mover_type == Piece::King;
        let is_pawn_move = mover_type == Piece::Pawn;
        let is_long_move = from_sq.chebyshev_to(to_sq) > 1;
        let is_castle = is_king_move && is_long_move;
        let is_en_passant = is_pawn_move
            && !is_long_move
            && Some(to_sq) == self.en_passant_square
            && !self.occupancy().contains(to_sq);

        let undo = UndoRecord {
            captured: if is_en_passant {
                Some(Piece::Pawn)
            } else {
                self.type_at_square(to_sq)
            },
            is_en_passant,
            is_castle,
            prior_castle_rights: self.castle_rights,
            prior_en_passant_square: self.en_passant_square,
            prior_halfmove_clock: self.halfmove_clock,
        };

        // Resolve the capture before the mover's own bits change.
        if is_en_passant {
            let captured_sq = Square::new(from_sq.rank(), to_sq.file()).unwrap();
            self.remove_known_piece(captured_sq, Piece::Pawn, opponent);
        } else if let Some(c) = undo.captured {
            self.remove_known_piece(to_sq, c, opponent);
        }

        self.remove_known_piece(from_sq, mover_type, player);
        match m.promote_type() {
            Some(p) => self.add_piece(to_sq, p, player),
            None => self.add_piece(to_sq, mover_type, player),
        }

        if is_castle {
            let is_kingside = to_sq.file() == 6;
            let rook_from_file = if is_kingside { 7 } else { 0 };
            let rook_to_file = if is_kingside { 5 } else { 3 };
            let rook_from_sq = Square::new(from_sq.rank(), rook_from_file).unwrap();
            let rook_to_sq = Square::new(from_sq.rank(), rook_to_file).unwrap();
            self.remove_known_piece(rook_from_sq, Piece::Rook, player);
            self.add_piece(rook_to_sq, Piece::Rook, player);
        }

        let mut rights_to_remove = if is_king_move {
            CastleRights::color_rights(player)
        } else {
            CastleRights::NO_RIGHTS
        };
        rights_to_remove |= Board::corner_rights(from_sq);
        rights_to_remove |= Board::corner_rights(to_sq);
        self.castle_rights &= !rights_to_remove;

        self.en_passant_square = if is_pawn_move && is_long_move {
            Square::new((from_sq.rank() + to_sq.rank()) / 2, from_sq.file())
        } else {
            None
        };

        self.halfmove_clock = if is_pawn_move || undo.captured.is_some() {
            0
        } else {
            self.halfmove_clock + 1
        };
        if player == Color::Black {
            self.fullmove_number += 1;
        }
        self.player = opponent;

        undo
    }

    /// Reverse a previous `apply(m)` call using the `UndoRecord` it
    /// produced. `self` must be exactly the board that call returned,
    /// unmodified since.
    pub fn unapply(&mut self, m: Move, undo: UndoRecord) {
        let from_sq = m.from_square();
        let to_sq = m.to_square();

        self.player = !self.player;
        let player = self.player;
        let opponent = !player;
        if player == Color::Black {
            self.fullmove_number -= 1;
        }

        if undo.is_castle {
            let is_kingside = to_sq.file() == 6;
            let rook_from_file = if is_kingside { 7 } else { 0 };
            let rook_to_file = if is_kingside { 5 } else { 3 };
            let rook_from_sq = Square::new(from_sq.rank(), rook_from_file).unwrap();
            let rook_to_sq = Square::new(from_sq.rank(), rook_to_file).unwrap();
            self.remove_known_piece(rook_to_sq, Piece::Rook, player);
            self.add_piece(rook_from_sq, Piece::Rook, player);
        }

        let moved_piece_type = self
            .type_at_square(to_sq)
            .expect("unapply: no piece on move's to-square");
        let original_type = if m.is_promotion() {
            Piece::Pawn
        } else {
            moved_piece_type
        };
        self.remove_known_piece(to_sq, moved_piece_type, player);
        self.add_piece(from_sq, original_type, player);

        if undo.is_en_passant {
            let captured_sq = Square::new(from_sq.rank(), to_sq.file()).unwrap();
            self.add_piece(captured_sq, Piece::Pawn, opponent);
        } else if let Some(c) = undo.captured {
            self.add_piece(to_sq, c, opponent);
        }

        self.castle_rights = undo.prior_castle_rights;
        self.en_passant_square = undo.prior_en_passant_square;
        self.halfmove_clock = undo.prior_halfmove_clock;
    }

    #[inline(always)]
    /// Remove a piece of a known type and color from a square. Breaks board
    /// validity if no such piece stands there.
    fn remove_known_piece(&mut self, sq: Square, pt: Piece, color: Color) {
        let removal_mask = !Bitboard::from(sq);
        self.pieces[pt as usize] &= removal_mask;
        self.sides[color as usize] &= removal_mask;
    }

    #[inline(always)]
    /// Add a piece to a square. Should only be called when the square is
    /// currently empty; otherwise it corrupts the board representation.
    fn add_piece(&mut self, sq: Square, pt: Piece, color: Color) {
        let mask = Bitboard::from(sq);
        self.pieces[pt as usize] |= mask;
        self.sides[color as usize] |= mask;
    }

    /// The castling rights forfeited when a king or rook leaves (or is
    /// captured on) one of the four corner squares.
    fn corner_rights(sq: Square) -> CastleRights {
        match sq {
            Square::A1 => CastleRights::queen_castle(Color::White),
            Square::H1 => CastleRights::king_castle(Color::White),
            Square::A8 => CastleRights::queen_castle(Color::Black),
            Square::H8 => CastleRights::king_castle(Color::Black),
            _ => CastleRights::NO_RIGHTS,
        }
    }

    #[cfg(test)]
    /// Build a `Board` from a FEN string. Not part of the public API: this
    /// crate consumes parsed boards from an external collaborator (see
    /// SPEC_FULL.md §1), so this exists only to let the crate's own tests
    /// build positions without depending on one.
    pub(crate) fn from_fen(fen: &str) -> Result<Board, &'static str> {
        let mut board = Board {
            sides: [Bitboard::EMPTY; 2],
            pieces: [Bitboard::EMPTY; Piece::NUM_TYPES],
            player: Color::White,
            en_passant_square: None,
            castle_rights: CastleRights::NO_RIGHTS,
            halfmove_clock: 0,
            fullmove_number: 1,
        };
        let mut chrs = fen.chars();
        let mut r = 7;
        let mut c = 0;

        loop {
            if (r, c) == (0, 8) {
                break;
            }
            let chr = chrs
                .next()
                .ok_or("reached end of FEN before board was fully parsed")?;
            let is_white = chr.is_uppercase();
            let pt = chr.to_uppercase().next().and_then(|u| match u {
                'N' => Some(Piece::Knight),
                'B' => Some(Piece::Bishop),
                'R' => Some(Piece::Rook),
                'Q' => Some(Piece::Queen),
                'P' => Some(Piece::Pawn),
                'K' => Some(Piece::King),
                _ => None,
            });
            let color = if is_white { Color::White } else { Color::Black };
            if let Some(p) = pt {
                board.add_piece(Square::new(r, c).ok_or("rank/file out of range")?, p, color);
                c += 1;
            } else if chr == '/' {
                r -= 1;
                c = 0;
            } else {
                let num_blanks = chr.to_digit(10).ok_or("expected number of blanks")?;
                c += num_blanks as usize;
            }
        }

        if chrs.next() != Some(' ') {
            return Err("expected space after board section of FEN");
        }

        let player_chr = chrs
            .next()
            .ok_or("reached end of string while parsing player to move")?;
        board.player = match player_chr {
            'w' => Color::White,
            'b' => Color::Black,
            _ => return Err("unrecognized player to move"),
        };

        if chrs.next() != Some(' ') {
            return Err("expected space after player-to-move section of FEN");
        }

        let mut castle_chr = chrs
            .next()
            .ok_or("reached end of string while parsing castle rights")?;
        while castle_chr != ' ' {
            board.castle_rights |= match castle_chr {
                'K' => CastleRights::king_castle(Color::White),
                'Q' => CastleRights::queen_castle(Color::White),
                'k' => CastleRights::king_castle(Color::Black),
                'q' => CastleRights::queen_castle(Color::Black),
                '-' => CastleRights::NO_RIGHTS,
                _ => return Err("unrecognized castle rights character"),
            };
            castle_chr = chrs
                .next()
                .ok_or("reached end of string while parsing castle rights")?;
        }

        let ep_file_chr = chrs
            .next()
            .ok_or("reached end of string while parsing en passant square")?;
        if ep_file_chr != '-' {
            let ep_rank_chr = chrs
                .next()
                .ok_or("reached end of string while parsing en passant rank")?;
            let file = (ep_file_chr as u8).wrapping_sub(b'a') as usize;
            let rank = (ep_rank_chr as u8).wrapping_sub(b'1') as usize;
            board.en_passant_square =
                Some(Square::new(rank, file).ok_or("en passant square out of range")?);
        }

        // Ignore halfmove/fullmove counters if absent; keep defaults otherwise.
        if chrs.next() == Some(' ') {
            let rest: String = chrs.collect();
            let mut fields = rest.split_whitespace();
            if let Some(hm) = fields.next().and_then(|s| s.parse().ok()) {
                board.halfmove_clock = hm;
            }
            if let Some(fm) = fields.next().and_then(|s| s.parse().ok()) {
                board.fullmove_number = fm;
            }
        }

        if !board.is_valid() {
            return Err("board state after loading was illegal");
        }
        Ok(board)
    }
}

impl Display for Board {
    /// Render the board as 8 ranks, 8th rank first, White pieces
    /// uppercase, Black lowercase, empty squares as `.`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for r in 0..8 {
            for c in 0..8 {
                let i = 64 - (r + 1) * 8 + c;
                let sq = Square::try_from(i).unwrap();
                match self.type_at_square(sq) {
                    Some(p) => match self.color_at_square(sq).unwrap() {
                        Color::White => write!(f, "{}", p.debug_letter())?,
                        Color::Black => write!(f, "{}", p.debug_letter().to_lowercase())?,
                    },
                    None => write!(f, ".")?,
                }
                write!(f, " ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Index<Piece> for Board {
    type Output = Bitboard;

    #[inline(always)]
    fn index(&self, index: Piece) -> &Self::Output {
        // SAFETY: `pieces` has exactly `Piece::NUM_TYPES` entries.
        unsafe { self.pieces.get_unchecked(index as usize) }
    }
}

impl Index<Color> for Board {
    type Output = Bitboard;

    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        // SAFETY: `sides` has exactly two entries.
        unsafe { self.sides.get_unchecked(index as usize) }
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_fen_matches_default() {
        let result = Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(result, Ok(Board::default()));
    }

    #[test]
    fn two_kings_fen_is_valid() {
        let board = Board::from_fen("7k/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(board.type_at_square(Square::A1), Some(Piece::King));
        assert_eq!(board.type_at_square(Square::H8), Some(Piece::King));
        assert_eq!(board.color_at_square(Square::A1), Some(Color::White));
        assert!(board.is_valid());
    }

    #[test]
    fn play_e4_updates_pawn_and_en_passant_square() {
        let mut board = Board::default();
        board.apply(Move::normal(Square::E2, Square::E4));
        assert_eq!(board.type_at_square(Square::E4), Some(Piece::Pawn));
        assert_eq!(board.type_at_square(Square::E2), None);
        assert_eq!(board.en_passant_square, Some(Square::E3));
        assert_eq!(board.player, Color::Black);
    }

    #[test]
    fn apply_then_unapply_restores_board() {
        let board = Board::default();
        let mut mutated = board;
        let undo = mutated.apply(Move::normal(Square::E2, Square::E4));
        mutated.unapply(Move::normal(Square::E2, Square::E4), undo);
        assert_eq!(mutated, board);
    }

    #[test]
    fn is_move_capture_recognizes_normal_and_en_passant() {
        let board =
            Board::from_fen("rnbqkb1r/ppppp1pp/7n/4Pp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        assert!(board.is_move_capture(Move::normal(Square::E5, Square::F6)));
        assert!(!board.is_move_capture(Move::normal(Square::E5, Square::E6)));
        assert!(!board.is_move_capture(Move::normal(Square::A2, Square::A3)));
    }

    #[test]
    fn en_passant_capture_removes_captured_pawn() {
        let mut board =
            Board::from_fen("rnbqkb1r/ppppp1pp/7n/4Pp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let before = board;
        let m = Move::normal(Square::E5, Square::F6);
        let undo = board.apply(m);
        assert_eq!(board.type_at_square(Square::F6), Some(Piece::Pawn));
        assert_eq!(board.type_at_square(Square::F5), None);
        assert_eq!(board.color_at_square(Square::F6), Some(Color::White));
        board.unapply(m, undo);
        assert_eq!(board, before);
    }

    #[test]
    fn kingside_castle_moves_rook_too() {
        let mut board =
            Board::from_fen("r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4")
                .unwrap();
        let before = board;
        let m = Move::normal(Square::E1, Square::G1);
        let undo = board.apply(m);
        assert_eq!(board.type_at_square(Square::G1), Some(Piece::King));
        assert_eq!(board.type_at_square(Square::F1), Some(Piece::Rook));
        assert_eq!(board.type_at_square(Square::H1), None);
        assert!(!board.castle_rights.is_kingside_castle_legal(Color::White));
        assert!(!board.castle_rights.is_queenside_castle_legal(Color::White));
        board.unapply(m, undo);
        assert_eq!(board, before);
    }

    #[test]
    fn promotion_replaces_pawn_with_chosen_piece() {
        let mut board = Board::from_fen("8/5P2/2k5/4K3/8/8/8/8 w - - 0 1").unwrap();
        let before = board;
        let m = Move::promoting(Square::F7, Square::F8, Piece::Queen);
        let undo = board.apply(m);
        assert_eq!(board.type_at_square(Square::F8), Some(Piece::Queen));
        board.unapply(m, undo);
        assert_eq!(board, before);
    }

    #[test]
    fn capturing_rook_removes_opponent_castle_rights() {
        let mut board =
            Board::from_fen("rnbqk2r/ppppnp1p/4p1pb/8/4P3/1P1P4/PBP2PPP/RN1QKBNR w KQkq - 1 5")
                .unwrap();
        board.apply(Move::normal(Square::B2, Square::H8));
        assert!(!board.castle_rights.is_kingside_castle_legal(Color::Black));
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_move_and_capture() {
        let mut board = Board::default();
        board.apply(Move::normal(Square::B1, Square::C3));
        assert_eq!(board.halfmove_clock, 1);
        board.apply(Move::normal(Square::E7, Square::E5));
        assert_eq!(board.halfmove_clock, 0);
    }
}
