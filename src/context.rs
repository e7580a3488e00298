// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use crate::{
    error::MatchError,
    grammar::GrammarRegistry,
    input::{Folding, Input},
    modifier::{CancelToken, Modifiers},
};

/// State shared by every thread of one match attempt, including the
/// isolated threads run for lookarounds, conjunctions and longest-token
/// measurement.
pub struct Context<'a> {
    pub input: &'a Input<'a>,
    pub registry: Option<&'a GrammarRegistry>,

    // the grammar unqualified rule calls are looked up in
    pub grammar: Option<&'a str>,

    pub folding: Folding,
    pub ratchet: bool,
    pub recursion_limit: usize,
    pub cancel: Option<&'a CancelToken>,

    // set when some path failed because it went too deep
    pub recursion_limit_hit: Cell<bool>,

    // branch order of longest-token alternations already measured
    pub rankings: RefCell<HashMap<RankKey<'a>, Rc<[usize]>>>,
}

/// Identifies one measurement of a longest-token alternation: the
/// alternation node, the position and the parts of the scope that
/// change how its branches match.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RankKey<'a> {
    pub alternation: usize, // address of the branch list
    pub position: usize,
    pub grammar: Option<&'a str>,
    pub folding: Folding,
    pub ratchet: bool,
    pub depth: usize,
}

impl<'a> Context<'a> {
    pub fn new(
        input: &'a Input<'a>,
        modifiers: &'a Modifiers,
        registry: Option<&'a GrammarRegistry>,
        grammar: Option<&'a str>,
    ) -> Self {
        Self {
            input,
            registry,
            grammar,
            folding: Folding {
                ignorecase: modifiers.ignorecase,
                basechar: modifiers.basechar,
            },
            ratchet: modifiers.ratchet,
            recursion_limit: modifiers.recursion_limit,
            cancel: modifiers.cancel.as_ref(),
            recursion_limit_hit: Cell::new(false),
            rankings: RefCell::new(HashMap::new()),
        }
    }

    pub fn check_cancel(&self) -> Result<(), MatchError> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(MatchError::Cancelled),
            _ => Ok(()),
        }
    }
}
