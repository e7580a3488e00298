// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{collections::BTreeMap, ops::Index};

use crate::input::Input;

/// A half-open range `[start, end)` of input positions.
///
/// Positions count units of the granularity the match ran with,
/// i.e. code points by default.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// What a capture name or index holds.
///
/// A capture that sits inside a repeating quantifier, or that matched
/// more than once, holds a list.
#[derive(Debug, PartialEq, Clone)]
pub enum Capture {
    Single(MatchResult),
    List(Vec<MatchResult>),
}

impl Capture {
    /// The last (or only) result.
    pub fn last(&self) -> Option<&MatchResult> {
        match self {
            Capture::Single(result) => Some(result),
            Capture::List(results) => results.last(),
        }
    }

    pub fn results(&self) -> &[MatchResult] {
        match self {
            Capture::Single(result) => std::slice::from_ref(result),
            Capture::List(results) => results,
        }
    }

    pub fn spans(&self) -> Vec<Span> {
        self.results().iter().map(|r| r.span).collect()
    }
}

/// The outcome of a successful match.
///
/// It owns its text and is independent of the input and of the engine
/// state that produced it.
#[derive(Debug, PartialEq, Clone)]
pub struct MatchResult {
    span: Span,
    text: String,
    positional: Vec<Option<Capture>>,
    named: BTreeMap<String, Capture>,
}

impl MatchResult {
    pub fn new(
        span: Span,
        text: String,
        positional: Vec<Option<Capture>>,
        named: BTreeMap<String, Capture>,
    ) -> Self {
        Self {
            span,
            text,
            positional,
            named,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The number of positional capture slots, matched or not.
    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    pub fn positional(&self, index: usize) -> Option<&Capture> {
        self.positional.get(index).and_then(|c| c.as_ref())
    }

    pub fn positional_span(&self, index: usize) -> Option<Span> {
        self.positional(index).and_then(|c| c.last()).map(|r| r.span)
    }

    pub fn named(&self, name: &str) -> Option<&Capture> {
        self.named.get(name)
    }

    pub fn named_span(&self, name: &str) -> Option<Span> {
        self.named(name).and_then(|c| c.last()).map(|r| r.span)
    }

    /// Every span recorded under `name`, in input order.
    pub fn named_spans(&self, name: &str) -> Option<Vec<Span>> {
        self.named(name).map(|c| c.spans())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(|k| k.as_str())
    }

    /// The sub-match of positional capture `index`, for reaching into
    /// its own nested captures.
    pub fn nested(&self, index: usize) -> Option<&MatchResult> {
        self.positional(index).and_then(|c| c.last())
    }
}

impl Index<usize> for MatchResult {
    type Output = Capture;

    fn index(&self, index: usize) -> &Self::Output {
        match self.positional(index) {
            Some(capture) => capture,
            None => panic!("No capture at index {}.", index),
        }
    }
}

impl Index<&str> for MatchResult {
    type Output = Capture;

    fn index(&self, name: &str) -> &Self::Output {
        match self.named(name) {
            Some(capture) => capture,
            None => panic!("No capture named \"{}\".", name),
        }
    }
}

/// The key an opened capture is recorded under.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CaptureKey<'a> {
    Index(usize),
    Name(&'a str),

    // a non-capturing rule call, whatever it captures inside is dropped
    Discard,
}

/// The engine records captures as a flat, well nested event sequence.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CaptureEvent<'a> {
    Open {
        key: CaptureKey<'a>,
        position: usize,
        repeated: bool,
        slots: usize,
    },
    Close {
        position: usize,
    },
}

pub fn build_match_result(
    events: &[CaptureEvent],
    span: Span,
    slots: usize,
    input: &Input,
) -> MatchResult {
    let mut index = 0;
    let (positional, named) = collect_captures(events, &mut index, slots, input);
    MatchResult::new(span, input.slice(span.start, span.end), positional, named)
}

// consumes events up to (not including) the Close of the enclosing capture
fn collect_captures(
    events: &[CaptureEvent],
    index: &mut usize,
    slots: usize,
    input: &Input,
) -> (Vec<Option<Capture>>, BTreeMap<String, Capture>) {
    let mut positional: Vec<Option<Capture>> = vec![None; slots];
    let mut named: BTreeMap<String, Capture> = BTreeMap::new();

    while let Some(CaptureEvent::Open {
        key,
        position: start,
        repeated,
        slots,
    }) = events.get(*index)
    {
        *index += 1;
        let (child_positional, child_named) = collect_captures(events, index, *slots, input);

        let end = match events.get(*index) {
            Some(CaptureEvent::Close { position }) => *position,
            _ => *start,
        };
        *index += 1; // consume the Close

        let result = MatchResult::new(
            Span::new(*start, end),
            input.slice(*start, end),
            child_positional,
            child_named,
        );

        match key {
            CaptureKey::Index(i) => {
                if positional.len() <= *i {
                    positional.resize(*i + 1, None);
                }
                add_capture(&mut positional[*i], result, *repeated);
            }
            CaptureKey::Name(name) => {
                let mut slot = named.remove(*name);
                add_capture(&mut slot, result, *repeated);
                if let Some(capture) = slot {
                    named.insert((*name).to_owned(), capture);
                }
            }
            CaptureKey::Discard => {}
        }
    }

    (positional, named)
}

fn add_capture(slot: &mut Option<Capture>, result: MatchResult, repeated: bool) {
    *slot = Some(match slot.take() {
        None if repeated => Capture::List(vec![result]),
        None => Capture::Single(result),
        Some(Capture::Single(first)) => Capture::List(vec![first, result]),
        Some(Capture::List(mut results)) => {
            results.push(result);
            Capture::List(results)
        }
    });
}
