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

//! Pseudo-legal move generation, the attack query, and the legality layer
//! that filters pseudo-legal moves down to strictly legal ones.
//!
//! The per-piece generators here filter by pins (a pinned piece's
//! destinations are restricted to the line through its king) but not by
//! check: that filtering happens once, centrally, in
//! [`generate_legal_moves`].

use super::{magic::MAGIC, tables, Bitboard, Board, Color, Move, Piece, Square};

use std::convert::TryFrom;

#[must_use]
/// Get the set of squares on which a piece of `attacker_color` attacks
/// `sq`, given the board's actual occupancy.
pub(crate) fn square_attackers(board: &Board, sq: Square, attacker_color: Color) -> Bitboard {
    square_attackers_with_occupancy(board, sq, attacker_color, board.occupancy())
}

#[must_use]
/// As [`square_attackers`], but against a caller-supplied occupancy rather
/// than the board's own. Used to answer "would this square still be
/// attacked if these pieces weren't here": the king-removed king-move
/// check and the en passant discovered-check check both need this.
pub(crate) fn square_attackers_with_occupancy(
    board: &Board,
    sq: Square,
    attacker_color: Color,
    occupancy: Bitboard,
) -> Bitboard {
    let mut attackers = Bitboard::EMPTY;
    attackers |= tables::PAWN_ATTACKS[!attacker_color as usize][sq as usize] & board[Piece::Pawn];
    attackers |= tables::KNIGHT_MOVES[sq as usize] & board[Piece::Knight];
    attackers |= tables::KING_MOVES[sq as usize] & board[Piece::King];
    attackers |= MAGIC.bishop_attacks(occupancy, sq) & (board[Piece::Bishop] | board[Piece::Queen]);
    attackers |= MAGIC.rook_attacks(occupancy, sq) & (board[Piece::Rook] | board[Piece::Queen]);
    attackers & board[attacker_color]
}

#[must_use]
/// Is `sq` attacked by any piece of `attacker_color` in the current
/// position?
pub fn under_direct_attack(board: &Board, attacker_color: Color, sq: Square) -> bool {
    !square_attackers(board, sq, attacker_color).is_empty()
}

#[must_use]
/// Find the square of `color`'s king. Panics if the board violates its
/// one-king-per-side invariant.
fn king_square(board: &Board, color: Color) -> Square {
    Square::try_from(board[Piece::King] & board[color]).expect("board has no king for this color")
}

/// For each piece of the mover pinned against its king, the square it
/// stands on and the line (through the king and the pinning slider) its
/// moves are restricted to.
fn compute_pins(board: &Board, color: Color) -> Vec<(Square, Bitboard)> {
    let king_sq = king_square(board, color);
    let occupancy = board.occupancy();
    let rook_reach = MAGIC.rook_attacks(Bitboard::EMPTY, king_sq);
    let bishop_reach = MAGIC.bishop_attacks(Bitboard::EMPTY, king_sq);

    let snipers = board[!color]
        & ((rook_reach & (board[Piece::Rook] | board[Piece::Queen]))
            | (bishop_reach & (board[Piece::Bishop] | board[Piece::Queen])));

    let mut pins = Vec::new();
    for sniper_sq in snipers {
        let between_bb = tables::between(king_sq, sniper_sq);
        let blockers = between_bb & occupancy;
        if blockers.has_single_bit() && !(blockers & board[color]).is_empty() {
            let pinned_sq = Square::try_from(blockers).unwrap();
            pins.push((pinned_sq, tables::line(king_sq, sniper_sq)));
        }
    }
    pins
}

#[must_use]
/// The mask a piece standing on `sq` must move within, given the pins
/// computed for its side. `Bitboard::ALL` if `sq` isn't pinned.
fn pin_mask_for(pins: &[(Square, Bitboard)], sq: Square) -> Bitboard {
    pins.iter()
        .find(|(pinned_sq, _)| *pinned_sq == sq)
        .map_or(Bitboard::ALL, |(_, mask)| *mask)
}

fn emit_pawn_move(
    from_sq: Square,
    to_sq: Square,
    color: Color,
    pins: &[(Square, Bitboard)],
    moves: &mut Vec<Move>,
) {
    if !pin_mask_for(pins, from_sq).contains(to_sq) {
        return;
    }
    if color.pawn_promote_rank().contains(to_sq) {
        for pt in Piece::PROMOTING {
            moves.push(Move::promoting(from_sq, to_sq, pt));
        }
    } else {
        moves.push(Move::normal(from_sq, to_sq));
    }
}

/// Generate single and double pawn pushes, including promotions, for the
/// side to move. Filtered by pins, not by check.
pub fn pawn_pushes(board: &Board, moves: &mut Vec<Move>) {
    let color = board.player;
    let pins = compute_pins(board, color);
    let empty = !board.occupancy();
    let direction = color.pawn_direction();

    for from_sq in board[Piece::Pawn] & board[color] {
        let single_to = from_sq + direction;
        if !empty.contains(single_to) {
            continue;
        }
        emit_pawn_move(from_sq, single_to, color, &pins, moves);

        if color.pawn_start_rank().contains(from_sq) {
            let double_to = single_to + direction;
            if empty.contains(double_to) {
                emit_pawn_move(from_sq, double_to, color, &pins, moves);
            }
        }
    }
}

/// Generate pawn captures, including promotions and en passant, for the
/// side to move. Filtered by pins, not by check.
pub fn pawn_captures(board: &Board, moves: &mut Vec<Move>) {
    let color = board.player;
    let pins = compute_pins(board, color);
    let enemy = board[!color];

    for from_sq in board[Piece::Pawn] & board[color] {
        let targets = tables::PAWN_ATTACKS[color as usize][from_sq as usize];
        for to_sq in targets & enemy {
            emit_pawn_move(from_sq, to_sq, color, &pins, moves);
        }
        if let Some(ep_sq) = board.en_passant_square {
            if targets.contains(ep_sq) && pin_mask_for(&pins, from_sq).contains(ep_sq) {
                moves.push(Move::normal(from_sq, ep_sq));
            }
        }
    }
}

/// Generate knight moves for the side to move. Filtered by pins (a pinned
/// knight, if not captured on the spot, always has zero legal moves).
pub fn knight_moves(board: &Board, moves: &mut Vec<Move>) {
    let color = board.player;
    let pins = compute_pins(board, color);
    let own = board[color];

    for from_sq in board[Piece::Knight] & own {
        let targets = tables::KNIGHT_MOVES[from_sq as usize] & !own & pin_mask_for(&pins, from_sq);
        for to_sq in targets {
            moves.push(Move::normal(from_sq, to_sq));
        }
    }
}

fn sliding_moves(
    board: &Board,
    piece: Piece,
    moves: &mut Vec<Move>,
    attacks_of: impl Fn(Bitboard, Square) -> Bitboard,
) {
    let color = board.player;
    let pins = compute_pins(board, color);
    let own = board[color];
    let occupancy = board.occupancy();

    for from_sq in board[piece] & own {
        let targets = attacks_of(occupancy, from_sq) & !own & pin_mask_for(&pins, from_sq);
        for to_sq in targets {
            moves.push(Move::normal(from_sq, to_sq));
        }
    }
}

/// Generate bishop moves for the side to move. Filtered by pins.
pub fn bishop_moves(board: &Board, moves: &mut Vec<Move>) {
    sliding_moves(board, Piece::Bishop, moves, |occ, sq| {
        MAGIC.bishop_attacks(occ, sq)
    });
}

/// Generate rook moves for the side to move. Filtered by pins.
pub fn rook_moves(board: &Board, moves: &mut Vec<Move>) {
    sliding_moves(board, Piece::Rook, moves, |occ, sq| MAGIC.rook_attacks(occ, sq));
}

/// Generate queen moves for the side to move. Filtered by pins.
pub fn queen_moves(board: &Board, moves: &mut Vec<Move>) {
    sliding_moves(board, Piece::Queen, moves, |occ, sq| {
        MAGIC.bishop_attacks(occ, sq) | MAGIC.rook_attacks(occ, sq)
    });
}

/// Generate king moves, including castling, for the side to move. Every
/// destination (including castling destinations) is verified safe against
/// the opponent with the king removed from occupancy, so this alone
/// already excludes moving into or castling through check.
pub fn king_moves(board: &Board, moves: &mut Vec<Move>) {
    let color = board.player;
    let own = board[color];
    let from_sq = king_square(board, color);
    let occupancy_sans_king = board.occupancy() & !Bitboard::from(from_sq);

    let targets = tables::KING_MOVES[from_sq as usize] & !own;
    for to_sq in targets {
        if square_attackers_with_occupancy(board, to_sq, !color, occupancy_sans_king).is_empty() {
            moves.push(Move::normal(from_sq, to_sq));
        }
    }

    append_castles(board, color, from_sq, moves);
}

/// Append legal castling moves, checked here directly rather than relying
/// on a call-site guard against castling while in check: the king's
/// current square is one of the squares verified unattacked below.
fn append_castles(board: &Board, color: Color, king_sq: Square, moves: &mut Vec<Move>) {
    let occupancy = board.occupancy();
    let rank = king_sq.rank();
    let opponent = !color;

    if board.castle_rights.is_kingside_castle_legal(color) {
        let f_sq = Square::new(rank, 5).unwrap();
        let g_sq = Square::new(rank, 6).unwrap();
        let path_clear = !occupancy.contains(f_sq) && !occupancy.contains(g_sq);
        let path_safe = [king_sq, f_sq, g_sq]
            .into_iter()
            .all(|sq| square_attackers(board, sq, opponent).is_empty());
        if path_clear && path_safe {
            moves.push(Move::normal(king_sq, g_sq));
        }
    }

    if board.castle_rights.is_queenside_castle_legal(color) {
        let b_sq = Square::new(rank, 1).unwrap();
        let c_sq = Square::new(rank, 2).unwrap();
        let d_sq = Square::new(rank, 3).unwrap();
        let path_clear =
            !occupancy.contains(b_sq) && !occupancy.contains(c_sq) && !occupancy.contains(d_sq);
        let path_safe = [king_sq, d_sq, c_sq]
            .into_iter()
            .all(|sq| square_attackers(board, sq, opponent).is_empty());
        if path_clear && path_safe {
            moves.push(Move::normal(king_sq, c_sq));
        }
    }
}

#[must_use]
/// Is `m` an en passant capture on `board`? True iff the mover is a pawn
/// moving diagonally onto a currently empty square.
fn is_en_passant(board: &Board, m: Move) -> bool {
    board.type_at_square(m.from_square()) == Some(Piece::Pawn)
        && m.from_square().file() != m.to_square().file()
        && !board.occupancy().contains(m.to_square())
}

#[must_use]
/// Verify an en passant capture does not expose the mover's king to a
/// discovered check, by removing both pawns from occupancy and checking
/// the king square again. Handles the rare same-rank "horizontal pin"
/// case that ordinary pin detection misses, since neither pawn alone is
/// pinned before the capture.
fn en_passant_is_legal(board: &Board, m: Move, king_sq: Square) -> bool {
    let color = board.player;
    let from_sq = m.from_square();
    let to_sq = m.to_square();
    let captured_sq = Square::new(from_sq.rank(), to_sq.file()).unwrap();

    let occupancy = (board.occupancy() & !Bitboard::from(from_sq) & !Bitboard::from(captured_sq))
        | Bitboard::from(to_sq);

    square_attackers_with_occupancy(board, king_sq, !color, occupancy).is_empty()
}

#[must_use]
/// Generate every legal move available to the side to move.
pub fn generate_legal_moves(board: &Board) -> Vec<Move> {
    let color = board.player;
    let opponent = !color;
    let king_sq = king_square(board, color);
    let checkers = square_attackers(board, king_sq, opponent);
    let num_checkers = checkers.len();

    let mut king_buf = Vec::with_capacity(8);
    king_moves(board, &mut king_buf);

    if num_checkers >= 2 {
        return king_buf;
    }

    let block_mask = if num_checkers == 1 {
        let checker_sq = Square::try_from(checkers).unwrap();
        tables::between(king_sq, checker_sq) | checkers
    } else {
        Bitboard::ALL
    };

    let mut pseudo = Vec::with_capacity(48);
    pawn_pushes(board, &mut pseudo);
    pawn_captures(board, &mut pseudo);
    knight_moves(board, &mut pseudo);
    bishop_moves(board, &mut pseudo);
    rook_moves(board, &mut pseudo);
    queen_moves(board, &mut pseudo);

    let mut legal = Vec::with_capacity(pseudo.len() + king_buf.len());
    for m in pseudo {
        if is_en_passant(board, m) {
            if !en_passant_is_legal(board, m, king_sq) {
                continue;
            }
            if num_checkers == 1 {
                let captured_sq =
                    Square::new(m.from_square().rank(), m.to_square().file()).unwrap();
                if !block_mask.contains(m.to_square()) && !checkers.contains(captured_sq) {
                    continue;
                }
            }
            legal.push(m);
            continue;
        }
        if num_checkers == 1 && !block_mask.contains(m.to_square()) {
            continue;
        }
        legal.push(m);
    }
    legal.extend(king_buf);

    legal
}

#[cfg(test)]
/// Count the leaf nodes of the legal-move tree rooted at `board` to a
/// fixed depth. Not part of the public API: a shipped perft driver is out
/// of scope, but perft-depth correctness is a property this crate's own
/// tests must check.
fn perft(board: &mut Board, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_legal_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut count = 0;
    for m in moves {
        let undo = board.apply(m);
        count += perft(board, depth - 1);
        board.unapply(m, undo);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legal_move_count(fen: &str) -> usize {
        let board = Board::from_fen(fen).unwrap();
        generate_legal_moves(&board).len()
    }

    #[test]
    fn start_position_has_twenty_legal_moves() {
        assert_eq!(
            legal_move_count("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            20
        );
    }

    #[test]
    fn kiwipete_has_forty_eight_legal_moves() {
        assert_eq!(
            legal_move_count(
                "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
            ),
            48
        );
    }

    #[test]
    fn en_passant_into_check_is_excluded() {
        let board =
            Board::from_fen("r1b1kbnr/pppp1ppp/8/1K2pP1q/8/1n6/PPPPP1PP/RNBQ1BNR w KQkq e6 0 1")
                .unwrap();
        let mut captures = Vec::new();
        pawn_captures(&board, &mut captures);
        assert_eq!(captures.len(), 2);
        let legal = generate_legal_moves(&board);
        let diagonal_pawn_moves = legal
            .iter()
            .filter(|m| {
                board.type_at_square(m.from_square()) == Some(Piece::Pawn)
                    && m.from_square().file() != m.to_square().file()
            })
            .count();
        assert_eq!(diagonal_pawn_moves, 0);
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        assert_eq!(legal_move_count("3k4/2P1P3/1P6/8/8/8/8/K7 b - - 0 1"), 4);
    }

    #[test]
    fn pinned_bishop_is_restricted_to_the_pin_ray() {
        let board = Board::from_fen("4k3/3b4/8/8/Q7/8/8/4K3 b - - 0 1").unwrap();
        let mut moves = Vec::new();
        bishop_moves(&board, &mut moves);
        assert_eq!(moves.len(), 3);
    }

    #[test]
    fn castling_blocked_by_attacked_transit_squares() {
        let board = Board::from_fen("r3k2r/7B/8/8/3q4/8/P6P/R3K2R w KQkq - 0 1").unwrap();
        let king_sq = king_square(&board, board.player);
        let king_move_count = generate_legal_moves(&board)
            .into_iter()
            .filter(|m| m.from_square() == king_sq)
            .count();
        assert_eq!(king_move_count, 2);
    }

    #[test]
    fn single_pawn_check_can_be_blocked_or_captured() {
        assert_eq!(legal_move_count("3k4/2P4r/1P6/8/8/8/8/K7 b - - 0 1"), 5);
    }

    #[test]
    fn en_passant_can_evade_check() {
        assert_eq!(legal_move_count("8/8/8/1k6/2Pp4/8/8/4K3 b - c3 0 1"), 9);
    }

    #[test]
    fn horizontal_en_passant_pin_is_rejected() {
        assert_eq!(legal_move_count("8/8/8/1k6/3Pp3/8/8/K4Q2 b - d3 0 1"), 6);
    }

    #[test]
    fn two_blockers_on_a_ray_pin_neither_piece() {
        // Both bishops (d7, c6) stand between the king and the queen, so
        // neither is the sole blocker a pin requires: both move freely.
        assert_eq!(legal_move_count("4k3/3b4/2b5/8/Q7/8/8/4K3 b - - 0 1"), 18);
    }

    #[test]
    fn applying_every_legal_move_never_leaves_the_mover_in_check() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let mover = board.player;
        let king_sq = king_square(&board, mover);
        for m in generate_legal_moves(&board) {
            let mut after = board;
            after.apply(m);
            assert!(!under_direct_attack(&after, !mover, king_sq));
        }
    }

    mod perft {
        use super::*;

        fn assert_perft(fen: &str, expected: &[u64]) {
            let mut board = Board::from_fen(fen).unwrap();
            for (depth, &expected_count) in expected.iter().enumerate() {
                assert_eq!(
                    perft(&mut board, depth as u8),
                    expected_count,
                    "perft({depth}) mismatch for {fen}"
                );
            }
        }

        #[test]
        fn start_position() {
            assert_perft(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                &[1, 20, 400, 8_902],
            );
        }

        #[test]
        fn kiwipete() {
            assert_perft(
                "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
                &[1, 48, 2039],
            );
        }

        #[test]
        fn endgame_rook_and_pawns() {
            assert_perft("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", &[1, 14, 191]);
        }

        #[test]
        fn unbalanced_material() {
            assert_perft(
                "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
                &[1, 6, 264],
            );
        }

        #[test]
        fn edwards_position() {
            assert_perft(
                "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
                &[1, 44, 1_486],
            );
        }

        #[test]
        fn edwards_position_two() {
            assert_perft(
                "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
                &[1, 46, 2_079],
            );
        }
    }
}
