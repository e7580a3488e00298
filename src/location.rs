// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

/// A position or a range in the pattern source text.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Location {
    pub index: usize,  // The character index in the text
    pub line: usize,   // The line number (0-based index)
    pub column: usize, // The column number (0-based index)
    pub length: usize, // The length of the text range; 0 for a single position
}

impl Location {
    /// Create a new `Location` representing a single position.
    pub fn new_position(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
            length: 0,
        }
    }

    /// Create a new `Location` representing a range of text.
    pub fn new_range(index: usize, line: usize, column: usize, length: usize) -> Self {
        Self {
            index,
            line,
            column,
            length,
        }
    }

    /// Create a range `Location` from a starting position and a length.
    pub fn from_position_and_length(position: &Location, length: usize) -> Self {
        Self::new_range(position.index, position.line, position.column, length)
    }

    /// Create a range `Location` from two positions: start and end (inclusive).
    pub fn from_position_pair_with_end_included(
        position_start: &Location,
        position_end_included: &Location,
    ) -> Self {
        Self::new_range(
            position_start.index,
            position_start.line,
            position_start.column,
            position_end_included.index - position_start.index + 1,
        )
    }

    /// Move the position forward by one character.
    pub fn move_position_forward(&self) -> Self {
        Self {
            index: self.index + 1,
            column: self.column + 1,
            length: 0,
            ..*self
        }
    }

    /// Get the starting position of a range as a `Location`.
    pub fn get_position_by_range_start(&self) -> Self {
        Self::new_position(self.index, self.line, self.column)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // lines and columns are displayed 1-based
        write!(f, "line {}, column {}", self.line + 1, self.column + 1)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Location;

    #[test]
    fn test_location_ranges() {
        let start = Location::new_position(3, 1, 2);
        let end = Location::new_position(7, 1, 6);

        assert_eq!(
            Location::from_position_pair_with_end_included(&start, &end),
            Location::new_range(3, 1, 2, 5)
        );
        assert_eq!(
            Location::from_position_and_length(&start, 2).get_position_by_range_start(),
            start
        );
        assert_eq!(start.to_string(), "line 2, column 3");
    }
}
