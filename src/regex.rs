// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::sync::Arc;

use crate::{
    ast::Node,
    context::Context,
    error::{CompileError, MatchError},
    grammar::{builtin_rule, GrammarRegistry},
    input::Input,
    matchresult::MatchResult,
    modifier::{Granularity, Modifiers, DEFAULT_RECURSION_LIMIT},
    parser::parse_from_str,
    process::start_process,
};

/// Compiles a pattern. Rule calls may only reach the builtin rules,
/// see `Regex::with_grammar` for patterns calling grammar rules.
pub fn compile(pattern: &str, modifiers: &Modifiers) -> Result<Regex, CompileError> {
    let root = parse_from_str(pattern, modifiers.sigspace)?;

    for rule_ref in root.rule_refs() {
        if let Some(grammar) = &rule_ref.grammar {
            return Err(CompileError::UnknownGrammar(grammar.clone()));
        }
        if builtin_rule(&rule_ref.name).is_none() {
            return Err(CompileError::UnknownRule {
                grammar: None,
                rule: rule_ref.name.clone(),
            });
        }
    }

    Ok(Regex::from_parts(root, modifiers.clone(), None, None))
}

#[derive(Debug, Clone)]
pub struct Regex {
    root: Node,
    modifiers: Modifiers,
    registry: Option<Arc<GrammarRegistry>>,

    // unqualified rule calls resolve in this grammar
    grammar: Option<String>,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, CompileError> {
        compile(pattern, &Modifiers::default())
    }

    /// Compiles a pattern whose rule calls resolve in `grammar` (and its
    /// parents), then among the builtin rules.
    pub fn with_grammar(
        pattern: &str,
        registry: &Arc<GrammarRegistry>,
        grammar: &str,
        modifiers: &Modifiers,
    ) -> Result<Self, CompileError> {
        if registry.grammar(grammar).is_none() {
            return Err(CompileError::UnknownGrammar(grammar.to_owned()));
        }

        let root = parse_from_str(pattern, modifiers.sigspace)?;
        for rule_ref in root.rule_refs() {
            let target = rule_ref.grammar.as_deref().unwrap_or(grammar);
            registry.resolve(Some(target), &rule_ref.name)?;
        }

        Ok(Regex::from_parts(
            root,
            modifiers.clone(),
            Some(Arc::clone(registry)),
            Some(grammar.to_owned()),
        ))
    }

    pub(crate) fn from_parts(
        root: Node,
        modifiers: Modifiers,
        registry: Option<Arc<GrammarRegistry>>,
        grammar: Option<String>,
    ) -> Self {
        Regex {
            root,
            modifiers,
            registry,
            grammar,
        }
    }

    pub fn node(&self) -> &Node {
        &self.root
    }

    /// The modifiers given at compile time.
    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    /// The compiled pattern in canonical syntax, compiling it again
    /// yields the same tree.
    pub fn get_debug_text(&self) -> String {
        self.root.to_source(self.modifiers.sigspace)
    }

    /// Compile-time modifiers stay on, match-time ones are added.
    fn effective_modifiers(&self, modifiers: &Modifiers) -> Modifiers {
        let compiled = &self.modifiers;
        let mut merged = modifiers.clone();

        merged.ignorecase |= compiled.ignorecase;
        merged.basechar |= compiled.basechar;
        merged.ratchet |= compiled.ratchet;
        merged.global |= compiled.global;

        if merged.granularity == Granularity::default() {
            merged.granularity = compiled.granularity;
        }
        if merged.recursion_limit == DEFAULT_RECURSION_LIMIT {
            merged.recursion_limit = compiled.recursion_limit;
        }

        merged.continue_at = merged.continue_at.or(compiled.continue_at);
        merged.pos = merged.pos.or(compiled.pos);
        merged.nth = merged.nth.or(compiled.nth);
        merged.x = merged.x.or(compiled.x);

        if merged.cancel.is_none() {
            merged.cancel = compiled.cancel.clone();
        }

        merged
    }

    fn search(
        &self,
        input: &Input,
        start: usize,
        anchored: bool,
        modifiers: &Modifiers,
    ) -> Result<Option<MatchResult>, MatchError> {
        let context = Context::new(
            input,
            modifiers,
            self.registry.as_deref(),
            self.grammar.as_deref(),
        );
        start_process(&context, &self.root, start, anchored)
    }

    /// The first match at or after `start` (a unit position).
    ///
    /// `:continue(N)` moves the start to `N`, `:pos(N)` moves it to `N`
    /// and allows a match only there.
    pub fn match_at(
        &self,
        text: &str,
        start: usize,
        modifiers: &Modifiers,
    ) -> Result<Option<MatchResult>, MatchError> {
        let modifiers = self.effective_modifiers(modifiers);
        let input = Input::new(text, modifiers.granularity);

        let (start, anchored) = match modifiers.pos {
            Some(position) => (position, true),
            None => (modifiers.continue_at.unwrap_or(start), false),
        };
        self.search(&input, start, anchored, &modifiers)
    }

    pub fn find(&self, text: &str) -> Result<Option<MatchResult>, MatchError> {
        self.match_at(text, 0, &Modifiers::default())
    }

    /// Whether the pattern matches anywhere, an aborted attempt counts
    /// as no match.
    pub fn is_match(&self, text: &str) -> bool {
        matches!(self.find(text), Ok(Some(_)))
    }

    /// Successive non-overlapping matches.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        self.find_iter_with(text, &Modifiers::default())
    }

    pub fn find_iter_with<'r, 't>(&'r self, text: &'t str, modifiers: &Modifiers) -> Matches<'r, 't> {
        Matches::new(self, text, self.effective_modifiers(modifiers))
    }

    /// Applies the selecting adverbs: `:x(N)` requires N successive matches
    /// and gives the Nth (none when there are fewer), `:nth(N)` the Nth one,
    /// `:global` all of them, otherwise the first match only.
    pub fn find_with(
        &self,
        text: &str,
        modifiers: &Modifiers,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let modifiers = self.effective_modifiers(modifiers);
        let matches = Matches::new(self, text, modifiers.clone());

        if let Some(count) = modifiers.x {
            let mut results = matches.take(count).collect::<Result<Vec<_>, _>>()?;
            return Ok(match results.pop() {
                Some(last) if results.len() + 1 == count => vec![last],
                _ => vec![],
            });
        }

        if let Some(nth) = modifiers.nth {
            for (idx, item) in matches.enumerate() {
                let result = item?;
                if idx + 1 == nth {
                    return Ok(vec![result]);
                }
            }
            return Ok(vec![]);
        }

        if modifiers.global {
            return matches.collect();
        }

        matches.take(1).collect()
    }
}

/// Iterator over successive matches.
///
/// A match ending where it started is followed by a search one unit
/// further on, so the iteration always makes progress. It stops after the
/// first error.
pub struct Matches<'r, 't> {
    regex: &'r Regex,
    input: Input<'t>,
    modifiers: Modifiers,
    next_start: Option<usize>,
    anchored: bool,
}

impl<'r, 't> Matches<'r, 't> {
    fn new(regex: &'r Regex, text: &'t str, modifiers: Modifiers) -> Self {
        let (start, anchored) = match modifiers.pos {
            Some(position) => (position, true),
            None => (modifiers.continue_at.unwrap_or(0), false),
        };

        Matches {
            regex,
            input: Input::new(text, modifiers.granularity),
            modifiers,
            next_start: Some(start),
            anchored,
        }
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = Result<MatchResult, MatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;

        match self
            .regex
            .search(&self.input, start, self.anchored, &self.modifiers)
        {
            Ok(Some(result)) => {
                let end = result.end();
                self.next_start = Some(if end > result.start() { end } else { end + 1 });
                Some(Ok(result))
            }
            Ok(None) => {
                self.next_start = None;
                None
            }
            Err(error) => {
                self.next_start = None;
                Some(Err(error))
            }
        }
    }
}
