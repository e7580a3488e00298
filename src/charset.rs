// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Character classes are kept as a normalized list of closed code point ranges
// (sorted, non-overlapping, non-adjacent) plus a polarity flag.
//
// Set algebra (`+` and `-` between bracket groups) always produces a positive
// class: a negative operand is first complemented over the whole code point
// space, then the operation runs on plain range lists.

const MAX_CODEPOINT: u32 = 0x10FFFF;
const SURROGATE_START: u32 = 0xD800;
const SURROGATE_END_INCLUDED: u32 = 0xDFFF;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CharRange {
    pub start: char,
    pub end_included: char,
}

impl CharRange {
    pub fn new(start: char, end_included: char) -> Self {
        CharRange {
            start,
            end_included,
        }
    }

    pub fn single(c: char) -> Self {
        CharRange::new(c, c)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CharClass {
    pub ranges: Vec<CharRange>,
    pub negative: bool,
}

impl CharClass {
    pub fn new(ranges: Vec<CharRange>, negative: bool) -> Self {
        let pairs = ranges
            .iter()
            .map(|r| (r.start as u32, r.end_included as u32))
            .collect();

        CharClass {
            ranges: pairs_to_ranges(normalize(pairs)),
            negative,
        }
    }

    pub fn from_chars(chars: &[char]) -> Self {
        CharClass::new(chars.iter().map(|c| CharRange::single(*c)).collect(), false)
    }

    pub fn negate(&self) -> Self {
        CharClass {
            ranges: self.ranges.clone(),
            negative: !self.negative,
        }
    }

    pub fn union(&self, other: &CharClass) -> Self {
        let mut pairs = self.positive_pairs();
        pairs.extend(other.positive_pairs());
        CharClass {
            ranges: pairs_to_ranges(normalize(pairs)),
            negative: false,
        }
    }

    pub fn difference(&self, other: &CharClass) -> Self {
        let pairs = intersect(&self.positive_pairs(), &complement(&other.positive_pairs()));
        CharClass {
            ranges: pairs_to_ranges(pairs),
            negative: false,
        }
    }

    pub fn contains(&self, c: char) -> bool {
        let code = c as u32;
        let found = self
            .ranges
            .binary_search_by(|r| {
                if (r.end_included as u32) < code {
                    std::cmp::Ordering::Less
                } else if (r.start as u32) > code {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok();
        found != self.negative
    }

    /// Membership test that also accepts the upper and lower case forms of `c`.
    pub fn contains_ignore_case(&self, c: char) -> bool {
        if self.negative {
            // an anti-class matches only when no case form is in the set
            let positive = self.negate();
            return !positive.contains_ignore_case(c);
        }

        self.contains(c)
            || c.to_lowercase().any(|lower| self.contains(lower))
            || c.to_uppercase().any(|upper| self.contains(upper))
    }

    fn positive_pairs(&self) -> Vec<(u32, u32)> {
        let pairs: Vec<(u32, u32)> = self
            .ranges
            .iter()
            .map(|r| (r.start as u32, r.end_included as u32))
            .collect();

        if self.negative {
            complement(&pairs)
        } else {
            pairs
        }
    }
}

fn normalize(mut pairs: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    pairs.retain(|(start, end)| start <= end);
    pairs.sort_unstable();

    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(pairs.len());
    for (start, end) in pairs {
        match merged.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => {
                last.1 = last.1.max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn complement(pairs: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut result = vec![];
    let mut next_start = 0u32;
    for (start, end) in pairs {
        if *start > next_start {
            result.push((next_start, start - 1));
        }
        next_start = end + 1;
    }
    if next_start <= MAX_CODEPOINT {
        result.push((next_start, MAX_CODEPOINT));
    }
    result
}

fn intersect(left: &[(u32, u32)], right: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut result = vec![];
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let start = left[i].0.max(right[j].0);
        let end = left[i].1.min(right[j].1);
        if start <= end {
            result.push((start, end));
        }
        if left[i].1 < right[j].1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    result
}

// Converts code point pairs back to char ranges, cutting out the surrogate block.
fn pairs_to_ranges(pairs: Vec<(u32, u32)>) -> Vec<CharRange> {
    let mut ranges = vec![];
    for (start, end) in pairs {
        let mut pieces = vec![];
        if start < SURROGATE_START && end > SURROGATE_END_INCLUDED {
            pieces.push((start, SURROGATE_START - 1));
            pieces.push((SURROGATE_END_INCLUDED + 1, end));
        } else if start >= SURROGATE_START && start <= SURROGATE_END_INCLUDED {
            if end > SURROGATE_END_INCLUDED {
                pieces.push((SURROGATE_END_INCLUDED + 1, end));
            }
        } else if end >= SURROGATE_START && end <= SURROGATE_END_INCLUDED {
            pieces.push((start, SURROGATE_START - 1));
        } else {
            pieces.push((start, end));
        }

        for (s, e) in pieces {
            if let (Some(s), Some(e)) = (char::from_u32(s), char::from_u32(e)) {
                ranges.push(CharRange::new(s, e));
            }
        }
    }
    ranges
}

/// The class behind a backslash shortcut, e.g. `\d` or `\W`.
///
/// Returns `None` for letters that are not class shortcuts.
pub fn shortcut_class(letter: char) -> Option<CharClass> {
    let positive = match letter.to_ascii_lowercase() {
        'w' => preset_word(),
        'd' => preset_digit(),
        's' => preset_space(),
        'h' => preset_horizontal_space(),
        'v' => preset_vertical_space(),
        't' => CharClass::from_chars(&['\t']),
        'n' => CharClass::from_chars(&['\n']),
        'r' => CharClass::from_chars(&['\r']),
        'f' => CharClass::from_chars(&['\u{0c}']),
        _ => return None,
    };

    if letter.is_ascii_uppercase() {
        Some(positive.negate())
    } else {
        Some(positive)
    }
}

/// Named classes usable inside class expressions, e.g. `<+alpha - [x]>`.
pub fn named_class(name: &str) -> Option<CharClass> {
    let class = match name {
        "alpha" => CharClass::new(
            vec![CharRange::new('A', 'Z'), CharRange::new('a', 'z')],
            false,
        ),
        "upper" => CharClass::new(vec![CharRange::new('A', 'Z')], false),
        "lower" => CharClass::new(vec![CharRange::new('a', 'z')], false),
        "digit" => preset_digit(),
        "xdigit" => CharClass::new(
            vec![
                CharRange::new('0', '9'),
                CharRange::new('A', 'F'),
                CharRange::new('a', 'f'),
            ],
            false,
        ),
        "alnum" => CharClass::new(
            vec![
                CharRange::new('0', '9'),
                CharRange::new('A', 'Z'),
                CharRange::new('a', 'z'),
            ],
            false,
        ),
        "space" => preset_space(),
        "punct" => CharClass::new(
            vec![
                CharRange::new('!', '/'),
                CharRange::new(':', '@'),
                CharRange::new('[', '`'),
                CharRange::new('{', '~'),
            ],
            false,
        ),
        _ => return None,
    };
    Some(class)
}

pub fn preset_word() -> CharClass {
    // [A-Za-z0-9_]
    CharClass::new(
        vec![
            CharRange::new('A', 'Z'),
            CharRange::new('a', 'z'),
            CharRange::new('0', '9'),
            CharRange::single('_'),
        ],
        false,
    )
}

pub fn preset_digit() -> CharClass {
    CharClass::new(vec![CharRange::new('0', '9')], false)
}

pub fn preset_space() -> CharClass {
    preset_horizontal_space().union(&preset_vertical_space())
}

pub fn preset_horizontal_space() -> CharClass {
    CharClass::from_chars(&[' ', '\t', '\u{a0}'])
}

pub fn preset_vertical_space() -> CharClass {
    CharClass::new(
        vec![
            CharRange::new('\n', '\r'), // \n, \v, \f, \r
            CharRange::single('\u{85}'),
            CharRange::new('\u{2028}', '\u{2029}'),
        ],
        false,
    )
}
