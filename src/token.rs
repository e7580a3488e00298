// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{ast::CutScope, charset::CharClass, location::Location};

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    // A run of whitespace. Only significant under `:sigspace`.
    Space,

    // `# ...` up to the end of the line, the newline excluded.
    Comment(String),

    // A bare alphanumeric char, or any char escaped with a backslash.
    Char(char),

    // `'...'` or `"..."`
    String(String),

    // A backslash shortcut (`\d`, `\W`, ...) or a class expression `<[...]>`.
    CharClass(CharClass),

    // `.`
    Dot,

    // `^`, `$`, `^^`, `$$`, `<<` (or `«`) and `>>` (or `»`)
    StartAssertion,
    EndAssertion,
    LineStartAssertion,
    LineEndAssertion,
    WordLeftAssertion,
    WordRightAssertion,

    // `<before` and `<after`, optionally prefixed with `?` or `!`
    LookAround { after: bool, negative: bool },

    // `>` closing a lookaround
    AngleEnd,

    // `<name>`, `<.name>`, `<Grammar.name>` and `<alias=name>`
    RuleRef {
        grammar: Option<String>,
        name: String,
        alias: Option<String>,
        capture: bool,
    },

    // `$<name>=` or `$<name>:=`
    NamedCapture(String),

    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,

    // `|`, `||`, `&` and `&&`
    Alternation,
    OrderedAlternation,
    Conjunction,
    OrderedConjunction,

    //
    // Quantifiers and quantifier suffixes
    //

    // `*`
    Asterisk,

    // `+`
    Plus,

    // `?`, also the non-greedy suffix
    Question,

    // `!`, the explicit greedy suffix
    Exclamation,

    // `%`, separator of a repetition
    Percent,

    // `** N`, `** N..M` and `** N..*`
    Repetition { min: usize, max: Option<usize> },

    // `:`, `::` and `:::`
    Cut(CutScope),

    // `:i`, `:!sigspace`, ...
    Modifier { name: String, negated: bool },
}

#[derive(Debug, PartialEq, Clone)]
pub struct TokenWithRange {
    pub token: Token,
    pub range: Location,
}

impl TokenWithRange {
    pub fn new(token: Token, range: Location) -> Self {
        Self { token, range }
    }

    pub fn from_position_and_length(token: Token, position: &Location, length: usize) -> Self {
        Self {
            token,
            range: Location::from_position_and_length(position, length),
        }
    }
}
