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

//! Precomputed lookup tables for the non-sliding pieces and for the
//! inter-square relationships (`between`, `line`) used by pin detection
//! and check evasion. Built once, at first use, from the sliding-attack
//! tables in `magic.rs`.

use super::magic::MAGIC;
use super::{Bitboard, Direction, Square};

use once_cell::sync::Lazy;

use std::convert::TryFrom;

/// A bitboard of all the squares a knight can move to if its position is
/// the index of the list.
pub(crate) static KNIGHT_MOVES: Lazy<[Bitboard; 64]> =
    Lazy::new(|| create_step_attacks(&Direction::KNIGHT_STEPS, 2));

/// A bitboard of all the squares a king can move to (ignoring castling) if
/// its position is the index in the list.
pub(crate) static KING_MOVES: Lazy<[Bitboard; 64]> =
    Lazy::new(|| create_step_attacks(&Direction::KING_STEPS, 1));

/// A bitboard of all the squares a pawn on the given square can attack. The
/// first index is for White's pawn attacks, the second is for Black's.
pub(crate) static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    [
        create_step_attacks(&[Direction::NORTHEAST, Direction::NORTHWEST], 1),
        create_step_attacks(&[Direction::SOUTHEAST, Direction::SOUTHWEST], 1),
    ]
});

/// A lookup table for the full line (in both directions) running through two
/// squares, if the squares share a rank, file, or diagonal. `LINES[A1][B2]`
/// holds the entire A1-H8 diagonal. If the two squares do not share a line,
/// the entry is empty.
static LINES: Lazy<[[Bitboard; 64]; 64]> = Lazy::new(|| {
    let mut lines = [[Bitboard::EMPTY; 64]; 64];

    for sq1 in Bitboard::ALL {
        let bishop_1 = MAGIC.bishop_attacks(Bitboard::EMPTY, sq1);
        let rook_1 = MAGIC.rook_attacks(Bitboard::EMPTY, sq1);
        for sq2 in Bitboard::ALL {
            if bishop_1.contains(sq2) {
                let bishop_2 = MAGIC.bishop_attacks(Bitboard::EMPTY, sq2);
                lines[sq1 as usize][sq2 as usize] |= Bitboard::from(sq1) | Bitboard::from(sq2);
                lines[sq1 as usize][sq2 as usize] |= bishop_1 & bishop_2;
            }
            if rook_1.contains(sq2) {
                let rook_2 = MAGIC.rook_attacks(Bitboard::EMPTY, sq2);
                lines[sq1 as usize][sq2 as usize] |= Bitboard::from(sq1) | Bitboard::from(sq2);
                lines[sq1 as usize][sq2 as usize] |= rook_1 & rook_2;
            }
        }
    }

    lines
});

/// A lookup table for the squares strictly between two squares, along a
/// shared rank, file, or diagonal. `BETWEEN[A1][A3]` holds only A2.
static BETWEEN: Lazy<[[Bitboard; 64]; 64]> = Lazy::new(|| {
    let mut between = [[Bitboard::EMPTY; 64]; 64];

    for sq1 in Bitboard::ALL {
        for sq2 in Bitboard::ALL {
            if MAGIC.bishop_attacks(Bitboard::EMPTY, sq1).contains(sq2) {
                let bishop1 = MAGIC.bishop_attacks(Bitboard::from(sq2), sq1);
                let bishop2 = MAGIC.bishop_attacks(Bitboard::from(sq1), sq2);
                between[sq1 as usize][sq2 as usize] |= bishop1 & bishop2;
            }
            if MAGIC.rook_attacks(Bitboard::EMPTY, sq1).contains(sq2) {
                let rook1 = MAGIC.rook_attacks(Bitboard::from(sq2), sq1);
                let rook2 = MAGIC.rook_attacks(Bitboard::from(sq1), sq2);
                between[sq1 as usize][sq2 as usize] |= rook1 & rook2;
            }
        }
    }

    between
});

#[inline(always)]
#[must_use]
/// Get a bitboard of all the squares strictly between two squares, along the
/// line a bishop or rook could travel. Empty if the squares do not share a
/// rank, file, or diagonal.
pub fn between(sq1: Square, sq2: Square) -> Bitboard {
    BETWEEN[sq1 as usize][sq2 as usize]
}

#[inline(always)]
#[must_use]
/// Get the full line running through two squares, in both directions, if
/// they share a rank, file, or diagonal. Empty if they do not. A piece
/// pinned against its king may move anywhere on this line without
/// exposing the king, since the pinning slider and the king itself bound
/// how far along it the piece can actually travel.
pub fn line(sq1: Square, sq2: Square) -> Bitboard {
    LINES[sq1 as usize][sq2 as usize]
}

/// Get the step attacks that could be made by moving in `dirs` from each
/// square on the board. Steps that would travel more than `max_dist` are
/// excluded, which prevents wraparound around the edges of the board.
fn create_step_attacks(dirs: &[Direction], max_dist: u8) -> [Bitboard; 64] {
    let mut attacks = [Bitboard::EMPTY; 64];
    for (i, item) in attacks.iter_mut().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        for dir in dirs {
            let start_sq = Square::try_from(i as u8).unwrap();
            let target_sq = start_sq + *dir;
            if target_sq.chebyshev_to(start_sq) <= max_dist {
                item.insert(target_sq);
            }
        }
    }

    attacks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_moves_from_corner() {
        let attacks = KNIGHT_MOVES[Square::A1 as usize];
        assert_eq!(attacks.len(), 2);
        assert!(attacks.contains(Square::B3));
        assert!(attacks.contains(Square::C2));
    }

    #[test]
    fn king_moves_from_corner() {
        let attacks = KING_MOVES[Square::A1 as usize];
        assert_eq!(attacks.len(), 3);
        assert!(attacks.contains(Square::A2));
        assert!(attacks.contains(Square::B1));
        assert!(attacks.contains(Square::B2));
    }

    #[test]
    fn pawn_attacks_white() {
        let attacks = PAWN_ATTACKS[0][Square::E4 as usize];
        assert!(attacks.contains(Square::D5));
        assert!(attacks.contains(Square::F5));
        assert_eq!(attacks.len(), 2);
    }

    #[test]
    fn between_same_rank() {
        assert_eq!(between(Square::A1, Square::D1).len(), 2);
        assert!(between(Square::A1, Square::D1).contains(Square::B1));
        assert!(between(Square::A1, Square::D1).contains(Square::C1));
    }

    #[test]
    fn between_unaligned_is_empty() {
        assert_eq!(between(Square::A1, Square::B3), Bitboard::EMPTY);
    }

    #[test]
    fn line_covers_full_diagonal() {
        let diag = line(Square::A1, Square::D4);
        assert!(diag.contains(Square::A1));
        assert!(diag.contains(Square::H8));
        assert!(!diag.contains(Square::A2));
    }

    #[test]
    fn line_of_unaligned_squares_is_empty() {
        assert_eq!(line(Square::A1, Square::B3), Bitboard::EMPTY);
    }
}
