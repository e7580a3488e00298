// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::{self, Display};

use crate::location::Location;

/// Raised while turning pattern or grammar source into a compiled form.
/// No partially compiled pattern is ever returned alongside it.
#[derive(Debug, PartialEq, Clone)]
pub enum CompileError {
    /// A `[`, `(`, `<` or `{` without its partner, or a stray closer.
    UnbalancedGroup(Location),

    /// A `<[ ...` character class that never closes.
    UnterminatedClass(Location),

    InvalidQuantifierRange {
        min: usize,
        max: usize,
        location: Location,
    },

    DuplicateRuleName {
        grammar: String,
        rule: String,
    },

    /// Still unresolved once the grammar was finalized.
    UnknownRule {
        grammar: Option<String>,
        rule: String,
    },

    UnknownGrammar(String),
    DuplicateGrammarName(String),

    /// A grammar that (indirectly) inherits from itself.
    InheritanceCycle(String),

    UnknownModifier(String),

    MessageWithLocation(String, Location),
    UnexpectedEndOfDocument(String),
}

impl Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnbalancedGroup(location) => {
                write!(f, "Unbalanced group at {}.", location)
            }
            CompileError::UnterminatedClass(location) => {
                write!(f, "Unterminated character class at {}.", location)
            }
            CompileError::InvalidQuantifierRange { min, max, location } => write!(
                f,
                "Invalid quantifier range {}..{} at {}, the minimum exceeds the maximum.",
                min, max, location
            ),
            CompileError::DuplicateRuleName { grammar, rule } => {
                write!(f, "Rule \"{}\" is defined twice in grammar \"{}\".", rule, grammar)
            }
            CompileError::UnknownRule { grammar, rule } => match grammar {
                Some(grammar) => write!(f, "Unknown rule \"{}.{}\".", grammar, rule),
                None => write!(f, "Unknown rule \"{}\".", rule),
            },
            CompileError::UnknownGrammar(name) => write!(f, "Unknown grammar \"{}\".", name),
            CompileError::DuplicateGrammarName(name) => {
                write!(f, "Grammar \"{}\" is defined twice.", name)
            }
            CompileError::InheritanceCycle(name) => {
                write!(f, "Grammar \"{}\" inherits from itself.", name)
            }
            CompileError::UnknownModifier(name) => write!(f, "Unknown modifier \":{}\".", name),
            CompileError::MessageWithLocation(message, location) => {
                write!(f, "{} ({})", message, location)
            }
            CompileError::UnexpectedEndOfDocument(message) => {
                write!(f, "Unexpected end of pattern. {}", message)
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// An attempt that ended without an answer.
///
/// An ordinary non-match is not an error; it is reported as `Ok(None)`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum MatchError {
    /// Every path failed and at least one was cut short by the rule recursion limit.
    RecursionLimitExceeded { limit: usize },

    /// The host raised the cancel flag before an answer was known.
    Cancelled,
}

impl Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::RecursionLimitExceeded { limit } => {
                write!(f, "Rule recursion exceeded the limit of {} levels.", limit)
            }
            MatchError::Cancelled => f.write_str("The match attempt was cancelled."),
        }
    }
}

impl std::error::Error for MatchError {}

/// Either kind of failure, for the entry points that compile and match
/// in one call, e.g. parsing text with a grammar built from source.
#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    Compile(CompileError),
    Match(MatchError),
}

impl From<CompileError> for Error {
    fn from(error: CompileError) -> Self {
        Error::Compile(error)
    }
}

impl From<MatchError> for Error {
    fn from(error: MatchError) -> Self {
        Error::Match(error)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Compile(error) => write!(f, "{}", error),
            Error::Match(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for Error {}
