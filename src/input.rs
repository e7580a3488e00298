// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::borrow::Cow;

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use unicode_segmentation::UnicodeSegmentation;

use crate::{charset::preset_word, modifier::Granularity};

/// The subject text cut into units (bytes, code points or graphemes).
///
/// Positions and spans handed around by the engine are unit indices.
pub struct Input<'t> {
    text: &'t str,
    granularity: Granularity,

    // byte range of every unit
    units: Vec<(usize, usize)>,
}

/// How units are compared, set by `:ignorecase` and `:basechar`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct Folding {
    pub ignorecase: bool,
    pub basechar: bool,
}

pub fn segment(text: &str, granularity: Granularity) -> Vec<(usize, usize)> {
    match granularity {
        Granularity::Bytes => (0..text.len()).map(|idx| (idx, idx + 1)).collect(),
        Granularity::Codes => text
            .char_indices()
            .map(|(idx, c)| (idx, idx + c.len_utf8()))
            .collect(),
        Granularity::Graphemes => text
            .grapheme_indices(true)
            .map(|(idx, g)| (idx, idx + g.len()))
            .collect(),
    }
}

/// The comparison key of a piece of text.
pub fn fold(s: &str, folding: Folding) -> Cow<'_, str> {
    if !folding.ignorecase && !folding.basechar {
        return Cow::Borrowed(s);
    }

    let mut text: String = if folding.basechar {
        s.nfd().filter(|c| !is_combining_mark(*c)).collect()
    } else {
        s.to_owned()
    };

    if folding.ignorecase {
        text = text.to_lowercase();
    }

    Cow::Owned(text)
}

impl<'t> Input<'t> {
    pub fn new(text: &'t str, granularity: Granularity) -> Self {
        Self {
            text,
            granularity,
            units: segment(text, granularity),
        }
    }

    pub fn text(&self) -> &'t str {
        self.text
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit_bytes(&self, index: usize) -> &'t [u8] {
        let (start, end) = self.units[index];
        &self.text.as_bytes()[start..end]
    }

    /// Byte offset of a unit position, `len()` maps to the end of the text.
    pub fn byte_offset(&self, position: usize) -> usize {
        match self.units.get(position) {
            Some((start, _)) => *start,
            None => self.text.len(),
        }
    }

    /// The text of the units in `start..end`.
    ///
    /// With byte granularity a span can split a multi-byte character,
    /// the broken sequence is replaced with U+FFFD.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let bytes = &self.text.as_bytes()[self.byte_offset(start)..self.byte_offset(end)];
        String::from_utf8_lossy(bytes).into_owned()
    }

    /// Whether the unit at `index` equals the given unit text.
    pub fn unit_equals(&self, index: usize, other: &[u8], folding: Folding) -> bool {
        let unit = self.unit_bytes(index);
        if !folding.ignorecase && !folding.basechar {
            return unit == other;
        }

        match (std::str::from_utf8(unit), std::str::from_utf8(other)) {
            (Ok(left), Ok(right)) => fold(left, folding) == fold(right, folding),
            _ if folding.ignorecase => unit.eq_ignore_ascii_case(other),
            _ => unit == other,
        }
    }

    /// The character a class test looks at: the first code point of the
    /// unit, with its marks removed under `:basechar`. A byte stands for
    /// the code point of the same value.
    pub fn unit_char(&self, index: usize, basechar: bool) -> Option<char> {
        let unit = self.unit_bytes(index);
        if self.granularity == Granularity::Bytes {
            return unit.first().map(|b| *b as char);
        }

        let s = std::str::from_utf8(unit).ok()?;
        if basechar {
            s.nfd().find(|c| !is_combining_mark(*c))
        } else {
            s.chars().next()
        }
    }

    pub fn is_word_at(&self, index: usize) -> bool {
        index < self.len()
            && matches!(self.unit_char(index, false), Some(c) if preset_word().contains(c))
    }

    fn is_newline_at(&self, index: usize) -> bool {
        index < self.len() && {
            let unit = self.unit_bytes(index);
            unit.first() == Some(&b'\n') || unit.starts_with(b"\r\n")
        }
    }

    fn ends_line_at(&self, index: usize) -> bool {
        index < self.len() && self.unit_bytes(index).last() == Some(&b'\n')
    }

    pub fn is_line_start(&self, position: usize) -> bool {
        position == 0 || (position < self.len() && self.ends_line_at(position - 1))
    }

    pub fn is_line_end(&self, position: usize) -> bool {
        if position == self.len() {
            position == 0 || !self.ends_line_at(position - 1)
        } else {
            self.is_newline_at(position)
        }
    }

    pub fn is_word_left(&self, position: usize) -> bool {
        (position == 0 || !self.is_word_at(position - 1)) && self.is_word_at(position)
    }

    pub fn is_word_right(&self, position: usize) -> bool {
        position > 0 && self.is_word_at(position - 1) && !self.is_word_at(position)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::modifier::Granularity;

    use super::{fold, Folding, Input};

    #[test]
    fn test_segment_units() {
        let text = "e\u{301}a🌏";

        assert_eq!(Input::new(text, Granularity::Bytes).len(), 8);
        assert_eq!(Input::new(text, Granularity::Codes).len(), 4);
        assert_eq!(Input::new(text, Granularity::Graphemes).len(), 3);

        let input = Input::new(text, Granularity::Graphemes);
        assert_eq!(input.slice(0, 1), "e\u{301}");
        assert_eq!(input.slice(1, 3), "a🌏");
        assert_eq!(input.byte_offset(3), text.len());
    }

    #[test]
    fn test_fold_and_compare() {
        let both = Folding {
            ignorecase: true,
            basechar: true,
        };
        assert_eq!(fold("Ünïcode", both), "unicode");

        let input = Input::new("É", Granularity::Graphemes);
        assert!(!input.unit_equals(0, "e".as_bytes(), Folding::default()));
        assert!(input.unit_equals(0, "e".as_bytes(), both));
        assert!(!input.unit_equals(
            0,
            "e".as_bytes(),
            Folding {
                ignorecase: true,
                basechar: false
            }
        ));
        assert_eq!(input.unit_char(0, true), Some('E'));
    }

    #[test]
    fn test_line_and_word_positions() {
        let input = Input::new("ab c\nd\n", Granularity::Codes);

        assert!(input.is_line_start(0));
        assert!(input.is_line_start(5));
        assert!(!input.is_line_start(7)); // after the final newline
        assert!(input.is_line_end(4));
        assert!(input.is_line_end(6));
        assert!(!input.is_line_end(7));

        assert!(input.is_word_left(0));
        assert!(input.is_word_right(2));
        assert!(input.is_word_left(3));
        assert!(!input.is_word_left(1));
        assert!(!input.is_word_right(1));
    }
}
