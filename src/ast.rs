// Copyright (c) 2024 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

use crate::{charset::CharClass, location::Location};

/// A compiled pattern tree. Nodes are never mutated after the parser
/// hands them out.
#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Literal(String),

    /// `.`, one unit of the configured granularity, newlines included.
    AnyChar,

    CharClass(CharClass),
    Quantified(Box<Quantified>),

    /// Matches each child in turn. An empty sequence matches the empty string.
    Sequence(Vec<Node>),

    /// `|` (longest token) when `ordered` is false, `||` (first wins) when true.
    Alternation { branches: Vec<Node>, ordered: bool },

    /// `&` when `ordered` is false, `&&` when true.
    /// Every branch has to match the very same span.
    Conjunction { branches: Vec<Node>, ordered: bool },

    Capture(Box<Capture>),
    RuleRef(RuleRef),
    Assertion(Assertion),

    /// An atom followed by `:`, `::` or `:::`.
    Cut(Box<Cut>),

    /// Inline modifiers (`:i`, `:s`, ...) governing `child`.
    Modified(Box<Modified>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Quantified {
    pub child: Node,
    pub min: usize,
    pub max: Option<usize>, // `None` for unbounded
    pub greedy: bool,
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, PartialOrd, Ord)]
pub enum CaptureName {
    Index(usize),
    Name(String),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Capture {
    pub child: Node,
    pub name: CaptureName,

    // set by the parser when the capture sits inside a repeating quantifier
    // of its own scope, so the results accumulate into a list
    pub repeated: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct RuleRef {
    pub grammar: Option<String>,
    pub name: String,

    // `<alias=name>` records the capture under `alias`
    pub alias: Option<String>,

    // `<.name>` calls the rule without capturing
    pub capture: bool,
    pub repeated: bool,
}

impl RuleRef {
    pub fn capture_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Assertion {
    Start,     // ^
    End,       // $
    LineStart, // ^^
    LineEnd,   // $$
    WordLeft,  // <<
    WordRight, // >>
    Before { pattern: Box<Node>, negative: bool },
    After { pattern: Box<Node>, negative: bool },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CutScope {
    Atom,  // :
    Group, // ::

    /// `:::` drops the choice points of the innermost rule call, the ones
    /// of its callers survive. At the top level it drops all of them and
    /// no later start position is tried.
    Whole,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Cut {
    pub child: Node,
    pub scope: CutScope,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InlineModifier {
    IgnoreCase,
    BaseChar,
    SigSpace,
    Ratchet,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Modified {
    pub modifiers: Vec<(InlineModifier, bool)>,
    pub child: Node,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RuleKind {
    Regex,
    Token, // ratchet
    Rule,  // ratchet and sigspace
}

impl RuleKind {
    pub fn ratchet(&self) -> bool {
        !matches!(self, RuleKind::Regex)
    }

    pub fn sigspace(&self) -> bool {
        matches!(self, RuleKind::Rule)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct RuleDecl {
    pub kind: RuleKind,
    pub name: String,
    pub body: Node,
    pub location: Location,
}

#[derive(Debug, PartialEq, Clone)]
pub struct GrammarDecl {
    pub name: String,
    pub parent: Option<String>,
    pub rules: Vec<RuleDecl>,
}

impl Node {
    pub fn empty() -> Self {
        Node::Sequence(vec![])
    }

    /// Walks the tree and collects every rule reference, including
    /// those inside lookaround payloads.
    pub fn rule_refs(&self) -> Vec<&RuleRef> {
        let mut refs = vec![];
        self.collect_rule_refs(&mut refs);
        refs
    }

    /// The number of positional captures numbered in this node's own scope.
    ///
    /// Captures nested in a capture, a rule or a lookaround payload are
    /// numbered separately and not counted.
    pub fn capture_slots(&self) -> usize {
        match self {
            Node::Capture(c) => match c.name {
                CaptureName::Index(index) => index + 1,
                CaptureName::Name(_) => 0,
            },
            Node::Quantified(q) => q.child.capture_slots(),
            Node::Sequence(nodes)
            | Node::Alternation {
                branches: nodes, ..
            }
            | Node::Conjunction {
                branches: nodes, ..
            } => nodes.iter().map(|n| n.capture_slots()).max().unwrap_or(0),
            Node::Cut(c) => c.child.capture_slots(),
            Node::Modified(m) => m.child.capture_slots(),
            Node::Literal(_)
            | Node::AnyChar
            | Node::CharClass(_)
            | Node::RuleRef(_)
            | Node::Assertion(_) => 0,
        }
    }

    fn collect_rule_refs<'a>(&'a self, refs: &mut Vec<&'a RuleRef>) {
        match self {
            Node::Literal(_) | Node::AnyChar | Node::CharClass(_) => {}
            Node::Quantified(q) => q.child.collect_rule_refs(refs),
            Node::Sequence(nodes)
            | Node::Alternation {
                branches: nodes, ..
            }
            | Node::Conjunction {
                branches: nodes, ..
            } => {
                for node in nodes {
                    node.collect_rule_refs(refs);
                }
            }
            Node::Capture(c) => c.child.collect_rule_refs(refs),
            Node::RuleRef(r) => refs.push(r),
            Node::Assertion(Assertion::Before { pattern, .. })
            | Node::Assertion(Assertion::After { pattern, .. }) => {
                pattern.collect_rule_refs(refs)
            }
            Node::Assertion(_) => {}
            Node::Cut(c) => c.child.collect_rule_refs(refs),
            Node::Modified(m) => m.child.collect_rule_refs(refs),
        }
    }
}
