// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::error::CompileError;

pub const DEFAULT_RECURSION_LIMIT: usize = 512;

/// What one `.` step consumes.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Granularity {
    Bytes,

    /// Unicode scalar values.
    #[default]
    Codes,

    /// Extended grapheme clusters, `:graphs` and `:chars` both select it.
    Graphemes,
}

/// A flag the host raises to abort a running match attempt.
///
/// Clones share the flag, so one can be handed to the engine while
/// another stays with the caller (e.g. on a timer thread).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl PartialEq for CancelToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.flag, &other.flag)
    }
}

/// Match configuration.
///
/// `ignorecase`, `basechar`, `sigspace` and `ratchet` are also available as
/// inline modifiers inside a pattern; `sigspace` only has an effect when
/// the pattern is compiled.
#[derive(Debug, PartialEq, Clone)]
pub struct Modifiers {
    pub ignorecase: bool,
    pub basechar: bool,
    pub sigspace: bool,
    pub ratchet: bool,
    pub granularity: Granularity,

    pub global: bool,
    pub continue_at: Option<usize>, // search forward from this position
    pub pos: Option<usize>,         // match only at this position
    pub nth: Option<usize>,         // 1-based
    pub x: Option<usize>,

    pub recursion_limit: usize,
    pub cancel: Option<CancelToken>,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            ignorecase: false,
            basechar: false,
            sigspace: false,
            ratchet: false,
            granularity: Granularity::default(),
            global: false,
            continue_at: None,
            pos: None,
            nth: None,
            x: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            cancel: None,
        }
    }
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignorecase(mut self, on: bool) -> Self {
        self.ignorecase = on;
        self
    }

    pub fn with_basechar(mut self, on: bool) -> Self {
        self.basechar = on;
        self
    }

    pub fn with_sigspace(mut self, on: bool) -> Self {
        self.sigspace = on;
        self
    }

    pub fn with_ratchet(mut self, on: bool) -> Self {
        self.ratchet = on;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_global(mut self, on: bool) -> Self {
        self.global = on;
        self
    }

    pub fn with_continue(mut self, position: usize) -> Self {
        self.continue_at = Some(position);
        self
    }

    pub fn with_pos(mut self, position: usize) -> Self {
        self.pos = Some(position);
        self
    }

    pub fn with_nth(mut self, nth: usize) -> Self {
        self.nth = Some(nth);
        self
    }

    pub fn with_x(mut self, count: usize) -> Self {
        self.x = Some(count);
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn apply(&mut self, adverb: &str) -> Result<(), CompileError> {
        let unknown = || CompileError::UnknownModifier(adverb.to_owned());

        let (negated, body) = match adverb.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, adverb),
        };

        // `name(N)`
        let (name, argument) = match body.split_once('(') {
            Some((name, rest)) => {
                let digits = rest.strip_suffix(')').ok_or_else(unknown)?;
                let value = digits.trim().parse::<usize>().map_err(|_| unknown())?;
                (name, Some(value))
            }
            None => (body, None),
        };

        let switch = !negated;

        match (name, argument) {
            ("i" | "ignorecase", None) => self.ignorecase = switch,
            ("m" | "ignoremark" | "basechar", None) => self.basechar = switch,
            ("s" | "sigspace", None) => self.sigspace = switch,
            ("r" | "ratchet", None) => self.ratchet = switch,
            ("g" | "global", None) => self.global = switch,
            ("bytes", None) => self.granularity = Granularity::Bytes,
            ("codes", None) => self.granularity = Granularity::Codes,
            ("graphs" | "chars", None) => self.granularity = Granularity::Graphemes,
            ("c" | "continue", argument) if !negated => {
                self.continue_at = Some(argument.unwrap_or(0))
            }
            ("p" | "pos", argument) if !negated => self.pos = Some(argument.unwrap_or(0)),
            ("nth", Some(n)) if !negated && n > 0 => self.nth = Some(n),
            ("x", Some(n)) if !negated => self.x = Some(n),
            (ordinal, None) if !negated => self.nth = Some(parse_ordinal(ordinal).ok_or_else(unknown)?),
            _ => return Err(unknown()),
        }

        Ok(())
    }
}

// `1st`, `2nd`, `3rd`, `4th`, `11th`, ...
fn parse_ordinal(s: &str) -> Option<usize> {
    let split = s.find(|c: char| !c.is_ascii_digit())?;
    let (digits, suffix) = s.split_at(split);
    let n = digits.parse::<usize>().ok()?;

    let expected = if (11..=13).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };

    if n > 0 && (suffix == expected || suffix == "th") {
        Some(n)
    } else {
        None
    }
}

/// Parses adverb text such as `":i :g :nth(2)"` or `":2nd:!s"`.
impl FromStr for Modifiers {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::default();

        let s = s.trim();
        if s.is_empty() {
            return Ok(modifiers);
        }

        let body = s
            .strip_prefix(':')
            .ok_or_else(|| CompileError::UnknownModifier(s.to_owned()))?;

        for adverb in body.split(':') {
            let adverb = adverb.trim();
            if adverb.is_empty() {
                return Err(CompileError::UnknownModifier(s.to_owned()));
            }
            modifiers.apply(adverb)?;
        }

        Ok(modifiers)
    }
}
