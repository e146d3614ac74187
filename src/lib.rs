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

//! A chess move generation core: bitboard position representation, magic
//! bitboard sliding attack tables, and a legality layer producing strictly
//! legal moves from a `Board`.
//!
//! This crate has no notion of a game, a clock, or an evaluation. It
//! consumes a `Board` built by its caller and hands back `Move`s; it does
//! not itself read FEN, PGN, or UCI, and it keeps no move history.

// Many module elements are re-exported to make names more ergonomic to access.

mod bitboard;
pub use crate::bitboard::Bitboard;

mod board;
pub use board::{Board, UndoRecord};

mod castling;
pub use castling::CastleRights;

mod color;
pub use color::Color;

mod direction;
use direction::Direction;

pub mod errors;

mod magic;
pub mod movegen;

mod moves;
pub use moves::Move;

mod piece;
pub use piece::Piece;

mod square;
pub use square::Square;

mod tables;
