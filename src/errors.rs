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

//! The one fallible operation in this crate: searching for a fresh set of
//! magic numbers. Position representation and move generation never fail
//! once a magic table is loaded, so this is the only error type the crate
//! needs.

use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// An error produced while searching for magic numbers.
pub enum MagicError {
    /// No magic number was found for the given square within the allotted
    /// number of tries.
    SearchExhausted {
        /// The square the search failed on.
        square: u8,
        /// Whether the search was for a rook (`true`) or a bishop (`false`).
        is_rook: bool,
    },
}

impl Display for MagicError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MagicError::SearchExhausted { square, is_rook } => write!(
                f,
                "failed to find a {} magic for square index {square}",
                if *is_rook { "rook" } else { "bishop" }
            ),
        }
    }
}

impl std::error::Error for MagicError {}
