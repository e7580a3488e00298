// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// The backtracking interpreter.
//
// A thread walks the node tree with an explicit continuation (the goals
// still to be done) and an explicit stack of choice points. A choice point
// saves everything needed to resume: position, continuation, capture log
// and scope. Continuations and capture logs are persistent lists, so a
// choice point shares them with the running thread instead of copying.
//
// Choice points carry increasing serial numbers. A scope remembers the next
// serial at the time it is entered (its barrier), and a cut drops every
// choice point at or above a barrier:
//
// - `atom :`    the barrier taken just before the atom
// - `atom ::`   the barrier of the enclosing alternation, conjunction, capture or rule
// - `atom :::`  the barrier of the enclosing rule, at the top level it also
//               stops the scan for later start positions
//
// Under ratchet every alternation, quantifier, conjunction and rule call
// behaves as if followed by `:`.
//
// Lookarounds, conjunction branches and the longest-token measurement run
// in isolated threads that share the attempt's context. The branch order a
// measurement produces is kept in the context, so an alternation is
// measured once per position and scope.

use std::rc::Rc;

use crate::{
    ast::{Assertion, CaptureName, CutScope, InlineModifier, Node, Quantified, RuleRef},
    context::{Context, RankKey},
    error::MatchError,
    grammar::{builtin_rule, Rule},
    input::{segment, Folding},
    matchresult::{build_match_result, CaptureEvent, CaptureKey, MatchResult, Span},
};

/// Searches for a match of `root` starting at `start` and then at every
/// following position, unless `anchored`.
pub fn start_process<'a>(
    context: &'a Context<'a>,
    root: &'a Node,
    start: usize,
    anchored: bool,
) -> Result<Option<MatchResult>, MatchError> {
    let length = context.input.len();
    let mut position = start;

    while position <= length {
        let mut thread = Thread::new(context, position, new_root_env(context));
        thread.cont = push_goal(Goal::Match(root), None);

        if let Some(end) = thread.run()? {
            let events = collect_events(&thread.log);
            let result = build_match_result(
                &events,
                Span::new(position, end),
                root.capture_slots(),
                context.input,
            );
            return Ok(Some(result));
        }

        if anchored || thread.committed {
            break;
        }

        // move forward one unit and try again
        position += 1;
    }

    // a path that went too deep only matters when nothing else matched
    if context.recursion_limit_hit.get() {
        return Err(MatchError::RecursionLimitExceeded {
            limit: context.recursion_limit,
        });
    }

    Ok(None)
}

#[derive(Debug, Clone)]
struct Env<'a> {
    folding: Folding,
    ratchet: bool,
    grammar: Option<&'a str>,
    group_barrier: usize,
    rule_barrier: usize,
    depth: usize, // rule call depth
}

fn new_root_env<'a>(context: &Context<'a>) -> Env<'a> {
    Env {
        folding: context.folding,
        ratchet: context.ratchet,
        grammar: context.grammar,
        group_barrier: 0,
        rule_barrier: 0,
        depth: 0,
    }
}

#[derive(Clone)]
enum Goal<'a> {
    // match a node, wrapped in an atom cut under ratchet
    Match(&'a Node),

    // match a node as it is
    Expand(&'a Node),

    Repeat {
        quantified: &'a Quantified,
        count: usize,
        last: usize, // position before the latest iteration
    },

    CloseCapture,
    CutTo(usize),
    Commit,
    Restore(Rc<Env<'a>>),

    // the remaining branches of a conjunction, each has to cover `start..`
    // up to the current position
    ConjRest {
        branches: &'a [Node],
        start: usize,
    },

    AssertAt(usize),
}

struct Frame<'a> {
    goal: Goal<'a>,
    next: Cont<'a>,
}

type Cont<'a> = Option<Rc<Frame<'a>>>;

fn push_goal<'a>(goal: Goal<'a>, next: Cont<'a>) -> Cont<'a> {
    Some(Rc::new(Frame { goal, next }))
}

// long lists are released iteratively instead of recursively
impl Drop for Frame<'_> {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(frame) = next {
            match Rc::try_unwrap(frame) {
                Ok(mut frame) => next = frame.next.take(),
                Err(_) => break,
            }
        }
    }
}

struct LogEntry<'a> {
    event: CaptureEvent<'a>,
    prev: Log<'a>,
}

type Log<'a> = Option<Rc<LogEntry<'a>>>;

impl Drop for LogEntry<'_> {
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(entry) = prev {
            match Rc::try_unwrap(entry) {
                Ok(mut entry) => prev = entry.prev.take(),
                Err(_) => break,
            }
        }
    }
}

// oldest first
fn collect_events<'a>(log: &Log<'a>) -> Vec<CaptureEvent<'a>> {
    let mut events = vec![];
    let mut entry = log.as_ref();
    while let Some(current) = entry {
        events.push(current.event);
        entry = current.prev.as_ref();
    }
    events.reverse();
    events
}

struct ChoicePoint<'a> {
    serial: usize,
    position: usize,
    cont: Cont<'a>,
    log: Log<'a>,
    env: Rc<Env<'a>>,
}

struct Thread<'a> {
    context: &'a Context<'a>,
    position: usize,
    cont: Cont<'a>,
    log: Log<'a>,
    env: Rc<Env<'a>>,
    stack: Vec<ChoicePoint<'a>>,
    next_serial: usize,
    committed: bool,
}

fn can_backtrack(node: &Node) -> bool {
    matches!(
        node,
        Node::Quantified(_)
            | Node::Alternation { .. }
            | Node::Conjunction { .. }
            | Node::RuleRef(_)
    )
}

impl<'a> Thread<'a> {
    fn new(context: &'a Context<'a>, position: usize, env: Env<'a>) -> Self {
        Self {
            context,
            position,
            cont: None,
            log: None,
            env: Rc::new(env),
            stack: vec![],
            next_serial: 0,
            committed: false,
        }
    }

    /// Runs until the continuation is empty (returns the end position)
    /// or every choice point is exhausted.
    fn run(&mut self) -> Result<Option<usize>, MatchError> {
        loop {
            let succeeded = match self.cont.take() {
                None => return Ok(Some(self.position)),
                Some(frame) => {
                    self.cont = frame.next.clone();
                    self.step(&frame.goal)?
                }
            };

            if !succeeded && !self.backtrack()? {
                return Ok(None);
            }
        }
    }

    fn backtrack(&mut self) -> Result<bool, MatchError> {
        self.context.check_cancel()?;

        match self.stack.pop() {
            Some(choice_point) => {
                self.position = choice_point.position;
                self.cont = choice_point.cont;
                self.log = choice_point.log;
                self.env = choice_point.env;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn push_choice(&mut self, position: usize, cont: Cont<'a>) -> Result<(), MatchError> {
        self.context.check_cancel()?;

        self.stack.push(ChoicePoint {
            serial: self.next_serial,
            position,
            cont,
            log: self.log.clone(),
            env: self.env.clone(),
        });
        self.next_serial += 1;
        Ok(())
    }

    fn record(&mut self, event: CaptureEvent<'a>) {
        self.log = Some(Rc::new(LogEntry {
            event,
            prev: self.log.take(),
        }));
    }

    // Enters a nested scope, returns the continuation that restores the
    // current scope and then goes on with the current continuation.
    fn enter_scope(&mut self, new_group: bool, update: impl FnOnce(&mut Env<'a>)) -> Cont<'a> {
        let saved = self.env.clone();
        let mut env = (*saved).clone();
        if new_group {
            env.group_barrier = self.next_serial;
        }
        update(&mut env);
        self.env = Rc::new(env);

        push_goal(Goal::Restore(saved), self.cont.take())
    }

    // a thread with its own choice point stack, starting from the current scope
    fn run_isolated(
        &self,
        cont: Cont<'a>,
        position: usize,
    ) -> Result<Option<(usize, Log<'a>)>, MatchError> {
        let mut env = (*self.env).clone();
        env.group_barrier = 0;
        env.rule_barrier = 0;

        let mut thread = Thread::new(self.context, position, env);
        thread.cont = cont;

        match thread.run()? {
            Some(end) => Ok(Some((end, thread.log.take()))),
            None => Ok(None),
        }
    }

    fn step(&mut self, goal: &Goal<'a>) -> Result<bool, MatchError> {
        match goal {
            Goal::Match(node) => {
                let node = *node;
                if self.env.ratchet && can_backtrack(node) {
                    let barrier = self.next_serial;
                    let rest = push_goal(Goal::CutTo(barrier), self.cont.take());
                    self.cont = push_goal(Goal::Expand(node), rest);
                    Ok(true)
                } else {
                    self.expand(node)
                }
            }
            Goal::Expand(node) => self.expand(*node),
            Goal::Repeat {
                quantified,
                count,
                last,
            } => self.repeat(*quantified, *count, *last),
            Goal::CloseCapture => {
                self.record(CaptureEvent::Close {
                    position: self.position,
                });
                Ok(true)
            }
            Goal::CutTo(barrier) => {
                let keep = self.stack.partition_point(|c| c.serial < *barrier);
                self.stack.truncate(keep);
                Ok(true)
            }
            Goal::Commit => {
                self.committed = true;
                Ok(true)
            }
            Goal::Restore(env) => {
                self.env = env.clone();
                Ok(true)
            }
            Goal::ConjRest { branches, start } => self.match_conjuncts(*branches, *start),
            Goal::AssertAt(position) => Ok(self.position == *position),
        }
    }

    fn expand(&mut self, node: &'a Node) -> Result<bool, MatchError> {
        match node {
            Node::Literal(text) => Ok(self.match_literal(text)),
            Node::AnyChar => {
                if self.position < self.context.input.len() {
                    self.position += 1;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Node::CharClass(class) => {
                let input = self.context.input;
                if self.position >= input.len() {
                    return Ok(false);
                }

                let folding = self.env.folding;
                let found = match input.unit_char(self.position, folding.basechar) {
                    Some(c) if folding.ignorecase => class.contains_ignore_case(c),
                    Some(c) => class.contains(c),
                    None => false,
                };

                if found {
                    self.position += 1;
                }
                Ok(found)
            }
            Node::Quantified(quantified) => {
                self.cont = push_goal(
                    Goal::Repeat {
                        quantified: &**quantified,
                        count: 0,
                        last: self.position,
                    },
                    self.cont.take(),
                );
                Ok(true)
            }
            Node::Sequence(nodes) => {
                for child in nodes.iter().rev() {
                    self.cont = push_goal(Goal::Match(child), self.cont.take());
                }
                Ok(true)
            }
            Node::Alternation { branches, ordered } => self.match_alternation(branches, *ordered),
            Node::Conjunction { branches, .. } => {
                let (first, others) = match branches.split_first() {
                    Some(pair) => pair,
                    None => return Ok(true),
                };

                let start = self.position;
                let tail = self.enter_scope(true, |_| {});
                let rest = push_goal(
                    Goal::ConjRest {
                        branches: others,
                        start,
                    },
                    tail,
                );
                self.cont = push_goal(Goal::Match(first), rest);
                Ok(true)
            }
            Node::Capture(capture) => {
                let key = match &capture.name {
                    CaptureName::Index(index) => CaptureKey::Index(*index),
                    CaptureName::Name(name) => CaptureKey::Name(name),
                };

                self.record(CaptureEvent::Open {
                    key,
                    position: self.position,
                    repeated: capture.repeated,
                    slots: capture.child.capture_slots(),
                });

                let tail = self.enter_scope(true, |_| {});
                self.cont = push_goal(
                    Goal::Match(&capture.child),
                    push_goal(Goal::CloseCapture, tail),
                );
                Ok(true)
            }
            Node::RuleRef(rule_ref) => self.call_rule(rule_ref),
            Node::Assertion(assertion) => self.check_assertion(assertion),
            Node::Cut(cut) => {
                let barrier = match cut.scope {
                    CutScope::Atom => self.next_serial,
                    CutScope::Group => self.env.group_barrier,
                    CutScope::Whole => self.env.rule_barrier,
                };

                let mut rest = self.cont.take();
                if cut.scope == CutScope::Whole && self.env.depth == 0 {
                    rest = push_goal(Goal::Commit, rest);
                }

                self.cont = push_goal(Goal::Match(&cut.child), push_goal(Goal::CutTo(barrier), rest));
                Ok(true)
            }
            Node::Modified(modified) => {
                let tail = self.enter_scope(false, |env| {
                    for (modifier, on) in &modified.modifiers {
                        match modifier {
                            InlineModifier::IgnoreCase => env.folding.ignorecase = *on,
                            InlineModifier::BaseChar => env.folding.basechar = *on,
                            InlineModifier::Ratchet => env.ratchet = *on,
                            // whitespace is resolved when the pattern is parsed
                            InlineModifier::SigSpace => {}
                        }
                    }
                });
                self.cont = push_goal(Goal::Match(&modified.child), tail);
                Ok(true)
            }
        }
    }

    fn match_literal(&mut self, text: &str) -> bool {
        let input = self.context.input;
        let folding = self.env.folding;
        let mut position = self.position;

        for (start, end) in segment(text, input.granularity()) {
            if position >= input.len()
                || !input.unit_equals(position, &text.as_bytes()[start..end], folding)
            {
                return false;
            }
            position += 1;
        }

        self.position = position;
        true
    }

    fn repeat(
        &mut self,
        quantified: &'a Quantified,
        count: usize,
        last: usize,
    ) -> Result<bool, MatchError> {
        let position = self.position;

        // an iteration that consumed nothing would repeat forever
        if count > 0 && position == last && count >= quantified.min {
            return Ok(true);
        }

        let next_iteration = push_goal(
            Goal::Match(&quantified.child),
            push_goal(
                Goal::Repeat {
                    quantified,
                    count: count + 1,
                    last: position,
                },
                self.cont.clone(),
            ),
        );

        if count < quantified.min {
            self.cont = next_iteration;
            return Ok(true);
        }

        if matches!(quantified.max, Some(max) if count >= max) {
            return Ok(true);
        }

        if quantified.greedy {
            let rest = self.cont.clone();
            self.push_choice(position, rest)?;
            self.cont = next_iteration;
        } else {
            self.push_choice(position, next_iteration)?;
        }

        Ok(true)
    }

    fn match_alternation(&mut self, branches: &'a [Node], ordered: bool) -> Result<bool, MatchError> {
        let candidates: Vec<&'a Node> = if ordered {
            branches.iter().collect()
        } else {
            self.rank_by_length(branches)?
                .iter()
                .map(|index| &branches[*index])
                .collect()
        };

        let (first, others) = match candidates.split_first() {
            Some(pair) => pair,
            None => return Ok(false),
        };

        let tail = self.enter_scope(true, |_| {});
        let position = self.position;

        // the next candidate ends up on the top of the stack
        for branch in others.iter().rev() {
            let cont = push_goal(Goal::Match(*branch), tail.clone());
            self.push_choice(position, cont)?;
        }

        self.cont = push_goal(Goal::Match(*first), tail);
        Ok(true)
    }

    // Longest token first. Every branch is measured by the end of its first
    // successful match on its own, with nested `|` ranked the same way.
    // Branches that cannot match are dropped, equal lengths keep the
    // declaration order. Returns branch indices.
    fn rank_by_length(&self, branches: &'a [Node]) -> Result<Rc<[usize]>, MatchError> {
        let env = &self.env;
        let key = RankKey {
            alternation: branches.as_ptr() as usize,
            position: self.position,
            grammar: env.grammar,
            folding: env.folding,
            ratchet: env.ratchet,
            depth: env.depth,
        };

        if let Some(order) = self.context.rankings.borrow().get(&key) {
            return Ok(order.clone());
        }

        let mut measured = vec![];
        for (index, branch) in branches.iter().enumerate() {
            let cont = push_goal(Goal::Match(branch), None);
            if let Some((end, _)) = self.run_isolated(cont, self.position)? {
                measured.push((end - self.position, index));
            }
        }

        measured.sort_by(|left, right| right.0.cmp(&left.0));
        let order: Rc<[usize]> = measured.into_iter().map(|(_, index)| index).collect();

        self.context.rankings.borrow_mut().insert(key, order.clone());
        Ok(order)
    }

    fn match_conjuncts(&mut self, branches: &'a [Node], start: usize) -> Result<bool, MatchError> {
        let end = self.position;

        for branch in branches {
            let cont = push_goal(Goal::Match(branch), push_goal(Goal::AssertAt(end), None));
            match self.run_isolated(cont, start)? {
                Some((_, log)) => {
                    for event in collect_events(&log) {
                        self.record(event);
                    }
                }
                None => return Ok(false),
            }
        }

        Ok(true)
    }

    fn find_rule(&self, grammar: Option<&'a str>, name: &str) -> Option<&'a Rule> {
        if let (Some(registry), Some(grammar)) = (self.context.registry, grammar) {
            if let Some(rule) = registry.lookup(grammar, name) {
                return Some(rule);
            }
        }
        builtin_rule(name)
    }

    fn call_rule(&mut self, rule_ref: &'a RuleRef) -> Result<bool, MatchError> {
        // unqualified calls dispatch on the grammar being matched, so a
        // derived grammar overrides the rules its parent calls
        let grammar = rule_ref.grammar.as_deref().or(self.env.grammar);

        let rule = match self.find_rule(grammar, &rule_ref.name) {
            Some(rule) => rule,
            None => return Ok(false),
        };

        if self.env.depth >= self.context.recursion_limit {
            self.context.recursion_limit_hit.set(true);
            return Ok(false);
        }

        let key = if rule_ref.capture {
            CaptureKey::Name(rule_ref.capture_name())
        } else {
            CaptureKey::Discard
        };

        self.record(CaptureEvent::Open {
            key,
            position: self.position,
            repeated: rule_ref.repeated,
            slots: rule.body.capture_slots(),
        });

        // a rule body runs with the modifiers of its kind, not the caller's
        let folding = self.context.folding;
        let barrier = self.next_serial;
        let tail = self.enter_scope(true, |env| {
            env.folding = folding;
            env.ratchet = rule.kind.ratchet();
            env.grammar = grammar;
            env.rule_barrier = barrier;
            env.depth += 1;
        });

        self.cont = push_goal(Goal::Match(&rule.body), push_goal(Goal::CloseCapture, tail));
        Ok(true)
    }

    fn check_assertion(&mut self, assertion: &'a Assertion) -> Result<bool, MatchError> {
        let input = self.context.input;
        let position = self.position;

        let passed = match assertion {
            Assertion::Start => position == 0,
            Assertion::End => position == input.len(),
            Assertion::LineStart => input.is_line_start(position),
            Assertion::LineEnd => input.is_line_end(position),
            Assertion::WordLeft => input.is_word_left(position),
            Assertion::WordRight => input.is_word_right(position),
            Assertion::Before { pattern, negative } => {
                let cont = push_goal(Goal::Match(&**pattern), None);
                let found = self
                    .run_isolated(cont, position)?
                    .is_some();
                found != *negative
            }
            Assertion::After { pattern, negative } => {
                // a match of the payload that ends exactly here
                let mut found = false;
                for start in (0..=position).rev() {
                    let cont = push_goal(
                        Goal::Match(&**pattern),
                        push_goal(Goal::AssertAt(position), None),
                    );
                    if self.run_isolated(cont, start)?.is_some() {
                        found = true;
                        break;
                    }
                }
                found != *negative
            }
        };

        Ok(passed)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        context::Context,
        error::MatchError,
        input::Input,
        matchresult::{MatchResult, Span},
        modifier::{CancelToken, Granularity, Modifiers},
        parser::parse_from_str,
    };

    use super::start_process;

    fn find_with(
        pattern: &str,
        text: &str,
        modifiers: &Modifiers,
    ) -> Result<Option<MatchResult>, MatchError> {
        let node = parse_from_str(pattern, modifiers.sigspace).unwrap();
        let input = Input::new(text, modifiers.granularity);
        let context = Context::new(&input, modifiers, None, None);
        start_process(&context, &node, 0, false)
    }

    fn find(pattern: &str, text: &str) -> Option<(usize, usize)> {
        find_with(pattern, text, &Modifiers::default())
            .unwrap()
            .map(|m| (m.start(), m.end()))
    }

    #[test]
    fn test_process_literals() {
        assert_eq!(find("abc", "abc"), Some((0, 3)));
        assert_eq!(find("'a b'", "xxa b"), Some((2, 5)));
        assert_eq!(find("文字", "中文字符"), Some((1, 3)));
        assert_eq!(find("abc", "ab"), None);
        assert_eq!(find("", ""), Some((0, 0)));
        assert_eq!(find("$", "abc"), Some((3, 3)));
    }

    #[test]
    fn test_process_greedy_and_lazy() {
        assert_eq!(find("fo*", ""), None);
        assert_eq!(find("fo*", "f"), Some((0, 1)));
        assert_eq!(find("fo*", "foo"), Some((0, 3)));
        assert_eq!(find("fo*", "fooo"), Some((0, 4)));

        assert_eq!(find(".+? abc", "xxabcxx"), Some((0, 5)));
        assert_eq!(find(".+ x", "axbxc"), Some((0, 4)));
        assert_eq!(find("a+?", "aaa"), Some((0, 1)));

        assert_eq!(find("\\d ** 2..3", "12345"), Some((0, 3)));
        assert_eq!(find("\\d ** 2..3?", "12345"), Some((0, 2)));
        assert_eq!(find("\\d ** 2", "1a23"), Some((2, 4)));
        assert_eq!(find("\\d+ % ','", "x1,2,3,"), Some((1, 6)));

        // zero-width iterations stop
        assert_eq!(find("[a?]*b", "aab"), Some((0, 3)));
    }

    #[test]
    fn test_process_char_classes() {
        assert_eq!(find("<[a..z] - [aeiou]>", "b"), Some((0, 1)));
        assert_eq!(find("<[a..z] - [aeiou]>", "a"), None);
        assert_eq!(find("<[asdfg] + [hjkl;]>", "s"), Some((0, 1)));
        assert_eq!(find("<[asdfg] + [hjkl;]>", "k"), Some((0, 1)));
        assert_eq!(find("<-[a..z]>+", "abC1d"), Some((2, 4)));
        assert_eq!(find("\\W", "ab-c"), Some((2, 3)));
        assert_eq!(find("\\N+", "ab\ncd"), Some((0, 2)));
    }

    #[test]
    fn test_process_alternation() {
        assert_eq!(find("f | fo | foo", "football"), Some((0, 3)));
        assert_eq!(find("f || fo || foo", "football"), Some((0, 1)));

        // the longest alternative that fails later gives way to a shorter one
        assert_eq!(find("[a | ab] c", "abc"), Some((0, 3)));
        assert_eq!(find("[a | ab] bc", "abc"), Some((0, 3)));
        assert_eq!(find("[ab || a] bc", "abc"), Some((0, 3)));

        // failing alternatives are dropped
        assert_eq!(find("x | y", "zzy"), Some((2, 3)));

        // nested alternatives are ranked by their own longest branch
        assert_eq!(find("[a | abc] | ab", "abc"), Some((0, 3)));
        assert_eq!(find("ab | [a | [x | abcd]]", "abcd"), Some((0, 4)));
        assert_eq!(find("[[a | abc] | ab] d", "abd"), Some((0, 3)));
    }

    #[test]
    fn test_process_cuts() {
        assert_eq!(find("[ foot || base || hand ] : ball", "footbag"), None);
        assert_eq!(find("[ foot || base || hand ] : ball", "football"), Some((0, 8)));

        assert_eq!(find("[ foo || foot ] ball", "football"), Some((0, 8)));
        assert_eq!(find("[ foo || foot ] : ball", "football"), None);

        assert_eq!(find("a* : a", "aaa"), None);
        assert_eq!(find("a* a", "aaa"), Some((0, 3)));

        // group cut
        assert_eq!(find("[ a :: b || a c ]", "ac"), None);
        assert_eq!(find("[ a b || a c ]", "ac"), Some((0, 2)));

        // whole cut stops the scan
        assert_eq!(find("a ::: c", "abac"), None);
        assert_eq!(find("a c", "abac"), Some((2, 4)));
        assert_eq!(find("a ::: b", "xab"), Some((1, 3)));
    }

    #[test]
    fn test_process_ratchet() {
        assert_eq!(find(":r a* a", "aaa"), None);
        assert_eq!(find(":r a* b", "aab"), Some((0, 3)));
        assert_eq!(find("[:r a*] a | aa", "aa"), Some((0, 2)));

        let ratchet = Modifiers::new().with_ratchet(true);
        assert_eq!(find_with("\\w+ b", "aab", &ratchet), Ok(None));
    }

    #[test]
    fn test_process_assertions() {
        // lookahead consumes nothing
        assert_eq!(find("foo <before \\d+>", "foo123"), Some((0, 3)));
        assert_eq!(find("foo <!before \\d>", "foo1 foox"), Some((5, 8)));
        assert_eq!(find("<after \\d> x", "ax1x"), Some((3, 4)));
        assert_eq!(find("<!after a> x", "axbx"), Some((3, 4)));

        assert_eq!(find("<< \\w+ >>", "  hello "), Some((2, 7)));
        assert_eq!(find(">> b", "ab b"), None);
        assert_eq!(find("^^ b", "ab\nb"), Some((3, 4)));
        assert_eq!(find("a $$", "ab\na\n"), Some((3, 4)));
        assert_eq!(find("^ b", "ab"), None);
    }

    #[test]
    fn test_process_conjunction() {
        assert_eq!(find("\\w+ && <[a..c]>+", "abcd"), Some((0, 3)));
        assert_eq!(find("\\d+ & <-[5]>+", "1235"), Some((0, 3)));
        assert_eq!(find("a && b", "ab"), None);
    }

    #[test]
    fn test_process_captures() {
        let result = find_with("a(bc*d)?", "abccd", &Modifiers::default())
            .unwrap()
            .unwrap();
        assert_eq!(result.positional_span(0), Some(Span::new(1, 5)));
        assert_eq!(result.nested(0).unwrap().as_str(), "bccd");

        let result = find_with("a(bc*d)?", "ax", &Modifiers::default())
            .unwrap()
            .unwrap();
        assert_eq!(result.positional_len(), 1);
        assert_eq!(result.positional(0), None);

        let result = find_with("$<y>=\\d+ '-' $<m>=\\d+", "on 2024-10", &Modifiers::default())
            .unwrap()
            .unwrap();
        assert_eq!(result.named_span("y"), Some(Span::new(3, 7)));
        assert_eq!(result.named("m").unwrap().last().unwrap().as_str(), "10");

        // repeated captures are collected, backtracked ones are forgotten
        let result = find_with("[(\\d) ',']* (\\d)", "1,2,3", &Modifiers::default())
            .unwrap()
            .unwrap();
        assert_eq!(
            result.positional(0).unwrap().spans(),
            vec![Span::new(0, 1), Span::new(2, 3)]
        );
        assert_eq!(result.positional_span(1), Some(Span::new(4, 5)));

        // nested numbering restarts
        let result = find_with("((a)(b))", "ab", &Modifiers::default())
            .unwrap()
            .unwrap();
        let outer = result.nested(0).unwrap();
        assert_eq!(outer.positional_span(1), Some(Span::new(1, 2)));

        // builtin rules capture under their name, `<.name>` does not
        let result = find_with("<alpha> <.digit>", "x1", &Modifiers::default())
            .unwrap()
            .unwrap();
        assert_eq!(result.named_span("alpha"), Some(Span::new(0, 1)));
        assert_eq!(result.named("digit"), None);
    }

    #[test]
    fn test_process_modifiers() {
        assert_eq!(find(":i foo", "xFOo"), Some((1, 4)));
        assert_eq!(find("f [:i OO] X", "fooX"), Some((0, 4)));
        assert_eq!(find("f [:i OO] X", "foox"), None);
        assert_eq!(find(":i <[a..c]>+", "xABc"), Some((1, 4)));
        assert_eq!(find(":m cafe", "café"), Some((0, 4)));
        assert_eq!(find(":s a b", "a   b"), Some((0, 5)));
        assert_eq!(find(":s a b", "ab"), Some((0, 2)));

        let ignorecase = Modifiers::new().with_ignorecase(true);
        assert_eq!(
            find_with("abc", "ABC", &ignorecase).unwrap().map(|m| m.span()),
            Some(Span::new(0, 3))
        );
    }

    #[test]
    fn test_process_granularity() {
        let text = "e\u{301}x";

        let graphemes = Modifiers::new().with_granularity(Granularity::Graphemes);
        let result = find_with(".", text, &graphemes).unwrap().unwrap();
        assert_eq!(result.as_str(), "e\u{301}");

        let codes = Modifiers::new();
        let result = find_with(".", text, &codes).unwrap().unwrap();
        assert_eq!(result.as_str(), "e");

        let bytes = Modifiers::new().with_granularity(Granularity::Bytes);
        let result = find_with(". x", text, &bytes).unwrap().unwrap();
        assert_eq!(result.span(), Span::new(2, 4));
    }

    #[test]
    fn test_process_cancel() {
        let token = CancelToken::new();
        token.cancel();

        let modifiers = Modifiers::new().with_cancel(token);
        assert_eq!(find_with("a* b", "aaa", &modifiers), Err(MatchError::Cancelled));
    }
}
