// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

pub const PARSER_PEEK_TOKEN_MAX_COUNT: usize = 2;

use crate::{
    ast::{
        Assertion, Capture, CaptureName, Cut, InlineModifier, Modified, Node, Quantified, RuleRef,
    },
    commentremover::clean,
    error::CompileError,
    lexer::lex_from_str,
    location::Location,
    peekableiter::PeekableIter,
    token::{Token, TokenWithRange},
};

/// Parses pattern source into a node tree.
///
/// `sigspace` turns whitespace between atoms into `<.ws>` calls from the start.
pub fn parse_from_str(s: &str, sigspace: bool) -> Result<Node, CompileError> {
    let tokens = clean(lex_from_str(s)?);
    let mut token_iter = tokens.into_iter();
    let mut peekable_token_iter = PeekableIter::new(&mut token_iter, PARSER_PEEK_TOKEN_MAX_COUNT);
    let mut parser = Parser::new(&mut peekable_token_iter, sigspace);

    let mut node = parser.parse_pattern()?;
    mark_repetitions(&mut node, false);
    Ok(node)
}

pub struct Parser<'a> {
    upstream: &'a mut PeekableIter<'a, TokenWithRange>,
    last_range: Location,
    sigspace: bool,

    // the next positional index of the current capture scope
    next_index: usize,
}

impl<'a> Parser<'a> {
    fn new(upstream: &'a mut PeekableIter<'a, TokenWithRange>, sigspace: bool) -> Self {
        Self {
            upstream,
            last_range: Location::new_range(0, 0, 0, 0),
            sigspace,
            next_index: 0,
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        match self.upstream.next() {
            Some(TokenWithRange { token, range }) => {
                self.last_range = range;
                Some(token)
            }
            None => None,
        }
    }

    fn peek_token(&self, offset: usize) -> Option<&Token> {
        match self.upstream.peek(offset) {
            Some(TokenWithRange { token, .. }) => Some(token),
            None => None,
        }
    }

    fn peek_range(&self, offset: usize) -> Location {
        match self.upstream.peek(offset) {
            Some(TokenWithRange { range, .. }) => *range,
            None => self.last_range,
        }
    }

    // peek the next token that is not a space
    fn peek_token_skip_space(&self) -> Option<&Token> {
        match self.peek_token(0) {
            Some(Token::Space) => self.peek_token(1),
            other => other,
        }
    }

    fn consume_space_if_exist(&mut self) {
        if let Some(Token::Space) = self.peek_token(0) {
            self.next_token();
        }
    }

    fn consume_token(
        &mut self,
        expected_token: &Token,
        opening: Location,
    ) -> Result<(), CompileError> {
        self.consume_space_if_exist();
        match self.next_token() {
            Some(token) if &token == expected_token => Ok(()),
            _ => Err(CompileError::UnbalancedGroup(opening)),
        }
    }
}

fn is_terminator(token: &Token) -> bool {
    matches!(
        token,
        Token::RightBracket
            | Token::RightParen
            | Token::AngleEnd
            | Token::Alternation
            | Token::OrderedAlternation
            | Token::Conjunction
            | Token::OrderedConjunction
    )
}

fn is_postfix(token: &Token) -> bool {
    matches!(
        token,
        Token::Asterisk
            | Token::Plus
            | Token::Question
            | Token::Repetition { .. }
            | Token::Cut(_)
            | Token::Percent
    )
}

impl Parser<'_> {
    fn parse_pattern(&mut self) -> Result<Node, CompileError> {
        let node = self.parse_group_content()?;

        self.consume_space_if_exist();
        match self.peek_token(0) {
            None => Ok(node),
            Some(_) => Err(CompileError::UnbalancedGroup(self.peek_range(0))),
        }
    }

    // the content of `[...]`, `(...)`, `<before ...>` and the whole pattern
    fn parse_group_content(&mut self) -> Result<Node, CompileError> {
        let saved_sigspace = self.sigspace;

        self.consume_space_if_exist();
        let modifiers = self.parse_modifiers()?;

        let node = self.parse_ordered_alternation()?;
        self.sigspace = saved_sigspace;

        if modifiers.is_empty() {
            Ok(node)
        } else {
            Ok(Node::Modified(Box::new(Modified {
                modifiers,
                child: node,
            })))
        }
    }

    fn parse_modifiers(&mut self) -> Result<Vec<(InlineModifier, bool)>, CompileError> {
        let mut modifiers = vec![];

        while let Some(Token::Modifier { .. }) = self.peek_token_skip_space() {
            self.consume_space_if_exist();
            if let Some(Token::Modifier { name, negated }) = self.next_token() {
                let modifier = match name.as_str() {
                    "i" | "ignorecase" => InlineModifier::IgnoreCase,
                    "m" | "ignoremark" | "basechar" => InlineModifier::BaseChar,
                    "s" | "sigspace" => InlineModifier::SigSpace,
                    "r" | "ratchet" => InlineModifier::Ratchet,
                    _ => return Err(CompileError::UnknownModifier(name)),
                };

                if modifier == InlineModifier::SigSpace {
                    self.sigspace = !negated;
                }
                modifiers.push((modifier, !negated));
            }
        }

        self.consume_space_if_exist();
        Ok(modifiers)
    }

    // a || b
    fn parse_ordered_alternation(&mut self) -> Result<Node, CompileError> {
        self.parse_branches(Token::OrderedAlternation, true, |parser| {
            parser.parse_ordered_conjunction()
        })
    }

    // a && b
    fn parse_ordered_conjunction(&mut self) -> Result<Node, CompileError> {
        self.parse_branches(Token::OrderedConjunction, false, |parser| {
            parser.parse_alternation()
        })
    }

    // a | b
    fn parse_alternation(&mut self) -> Result<Node, CompileError> {
        self.parse_branches(Token::Alternation, true, |parser| parser.parse_conjunction())
    }

    // a & b
    fn parse_conjunction(&mut self) -> Result<Node, CompileError> {
        self.parse_branches(Token::Conjunction, false, |parser| parser.parse_sequence())
    }

    // Operators of one precedence level, left to right.
    //
    // Alternation branches each restart the positional numbering, so that
    // `(a) | (b)` stores either one as capture 0.
    fn parse_branches(
        &mut self,
        separator: Token,
        reset_numbering: bool,
        parse_operand: fn(&mut Self) -> Result<Node, CompileError>,
    ) -> Result<Node, CompileError> {
        // a leading separator is allowed, e.g. `[ || a || b ]`
        if self.peek_token_skip_space() == Some(&separator) {
            self.consume_space_if_exist();
            self.next_token();
        }

        let start_index = self.next_index;
        let mut max_index = start_index;
        let mut branches = vec![];

        loop {
            if reset_numbering {
                self.next_index = start_index;
            }

            branches.push(parse_operand(self)?);
            max_index = max_index.max(self.next_index);

            if self.peek_token_skip_space() == Some(&separator) {
                self.consume_space_if_exist();
                self.next_token(); // consume the separator
            } else {
                break;
            }
        }

        self.next_index = max_index;

        if branches.len() == 1 {
            return Ok(branches.remove(0));
        }

        let node = match separator {
            Token::OrderedAlternation => Node::Alternation {
                branches,
                ordered: true,
            },
            Token::Alternation => Node::Alternation {
                branches,
                ordered: false,
            },
            Token::OrderedConjunction => Node::Conjunction {
                branches,
                ordered: true,
            },
            _ => Node::Conjunction {
                branches,
                ordered: false,
            },
        };

        Ok(node)
    }

    fn parse_sequence(&mut self) -> Result<Node, CompileError> {
        let mut nodes = vec![];

        loop {
            match self.peek_token(0) {
                None => break,
                Some(token) if is_terminator(token) => break,
                Some(Token::Space) => {
                    self.next_token(); // consume the space

                    // under sigspace, whitespace between two atoms is significant
                    let followed_by_atom = matches!(
                        self.peek_token(0),
                        Some(token) if !is_terminator(token) && !is_postfix(token)
                    );
                    if self.sigspace && !nodes.is_empty() && followed_by_atom {
                        nodes.push(new_whitespace_node());
                    }
                }
                Some(Token::Modifier { .. }) => {
                    // the modifiers govern the rest of the sequence
                    let saved_sigspace = self.sigspace;
                    let modifiers = self.parse_modifiers()?;
                    let rest = self.parse_sequence()?;
                    self.sigspace = saved_sigspace;

                    nodes.push(Node::Modified(Box::new(Modified {
                        modifiers,
                        child: rest,
                    })));
                    break;
                }
                Some(_) => {
                    let node = self.parse_quantified_atom()?;
                    nodes.push(node);
                }
            }
        }

        Ok(new_sequence(nodes))
    }

    fn parse_quantified_atom(&mut self) -> Result<Node, CompileError> {
        // atom postfix...
        // ^
        // |__ current

        let mut node = self.parse_atom()?;
        let mut quantified = false;

        while let Some(token) = self.peek_token_skip_space() {
            if !is_postfix(token) {
                break;
            }

            self.consume_space_if_exist();
            let range = self.peek_range(0);

            match self.next_token() {
                Some(Token::Cut(scope)) => {
                    node = Node::Cut(Box::new(Cut { child: node, scope }));
                }
                Some(Token::Percent) => {
                    return Err(CompileError::MessageWithLocation(
                        "A separator \"%\" must follow a quantifier.".to_owned(),
                        range,
                    ));
                }
                Some(token) => {
                    if quantified {
                        return Err(CompileError::MessageWithLocation(
                            "A quantifier cannot follow another quantifier.".to_owned(),
                            range,
                        ));
                    }

                    let (min, max) = match token {
                        Token::Asterisk => (0, None),
                        Token::Plus => (1, None),
                        Token::Question => (0, Some(1)),
                        Token::Repetition { min, max } => (min, max),
                        _ => unreachable!(),
                    };

                    // the suffix has to touch the quantifier
                    let greedy = match self.peek_token(0) {
                        Some(Token::Question) => {
                            self.next_token();
                            false
                        }
                        Some(Token::Exclamation) => {
                            self.next_token();
                            true
                        }
                        _ => true,
                    };

                    node = if self.peek_token_skip_space() == Some(&Token::Percent) {
                        self.consume_space_if_exist();
                        self.next_token(); // consume '%'
                        self.consume_space_if_exist();
                        let separator = self.parse_atom()?;
                        new_separated_repetition(node, separator, min, max, greedy)
                    } else {
                        Node::Quantified(Box::new(Quantified {
                            child: node,
                            min,
                            max,
                            greedy,
                        }))
                    };

                    quantified = true;
                }
                None => unreachable!(),
            }
        }

        Ok(node)
    }

    fn parse_atom(&mut self) -> Result<Node, CompileError> {
        let range = self.peek_range(0);

        let node = match self.next_token() {
            Some(Token::Char(c)) => Node::Literal(c.to_string()),
            Some(Token::String(s)) => Node::Literal(s),
            Some(Token::CharClass(class)) => Node::CharClass(class),
            Some(Token::Dot) => Node::AnyChar,
            Some(Token::StartAssertion) => Node::Assertion(Assertion::Start),
            Some(Token::EndAssertion) => Node::Assertion(Assertion::End),
            Some(Token::LineStartAssertion) => Node::Assertion(Assertion::LineStart),
            Some(Token::LineEndAssertion) => Node::Assertion(Assertion::LineEnd),
            Some(Token::WordLeftAssertion) => Node::Assertion(Assertion::WordLeft),
            Some(Token::WordRightAssertion) => Node::Assertion(Assertion::WordRight),
            Some(Token::LookAround { after, negative }) => {
                // the payload is tested in isolation, its captures are dropped
                let saved_index = self.next_index;
                self.next_index = 0;
                let pattern = Box::new(self.parse_group_content()?);
                self.next_index = saved_index;

                self.consume_token(&Token::AngleEnd, range)?;

                if after {
                    Node::Assertion(Assertion::After { pattern, negative })
                } else {
                    Node::Assertion(Assertion::Before { pattern, negative })
                }
            }
            Some(Token::RuleRef {
                grammar,
                name,
                alias,
                capture,
            }) => Node::RuleRef(RuleRef {
                grammar,
                name,
                alias,
                capture,
                repeated: false,
            }),
            Some(Token::LeftBracket) => {
                let node = self.parse_group_content()?;
                self.consume_token(&Token::RightBracket, range)?;
                node
            }
            Some(Token::LeftParen) => {
                let index = self.next_index;
                self.next_index += 1;

                let child = self.parse_capture_scope(Token::RightParen, range)?;
                Node::Capture(Box::new(Capture {
                    child,
                    name: CaptureName::Index(index),
                    repeated: false,
                }))
            }
            Some(Token::NamedCapture(name)) => {
                self.consume_space_if_exist();
                let child = match self.peek_token(0) {
                    Some(Token::LeftParen) => {
                        // `$<name>=(...)` does not take a positional slot
                        let range = self.peek_range(0);
                        self.next_token();
                        self.parse_capture_scope(Token::RightParen, range)?
                    }
                    Some(Token::LeftBracket) => {
                        let range = self.peek_range(0);
                        self.next_token();
                        self.parse_capture_scope(Token::RightBracket, range)?
                    }
                    _ => {
                        let saved_index = self.next_index;
                        self.next_index = 0;
                        let child = self.parse_quantified_atom()?;
                        self.next_index = saved_index;
                        child
                    }
                };

                Node::Capture(Box::new(Capture {
                    child,
                    name: CaptureName::Name(name),
                    repeated: false,
                }))
            }
            Some(Token::RightBracket | Token::RightParen | Token::AngleEnd) => {
                return Err(CompileError::UnbalancedGroup(range));
            }
            Some(Token::Modifier { name, .. }) => {
                return Err(CompileError::MessageWithLocation(
                    format!("Unexpected modifier \":{}\".", name),
                    range,
                ));
            }
            Some(_) => {
                return Err(CompileError::MessageWithLocation(
                    "Expect an atom, a quantifier or cut needs something to apply to.".to_owned(),
                    range,
                ));
            }
            None => {
                return Err(CompileError::UnexpectedEndOfDocument(
                    "Expect an atom.".to_owned(),
                ));
            }
        };

        Ok(node)
    }

    // captures inside a capture group are numbered from 0 again
    fn parse_capture_scope(&mut self, closer: Token, opening: Location) -> Result<Node, CompileError> {
        let saved_index = self.next_index;
        self.next_index = 0;
        let child = self.parse_group_content()?;
        self.next_index = saved_index;

        self.consume_token(&closer, opening)?;
        Ok(child)
    }
}

pub fn new_whitespace_node() -> Node {
    Node::RuleRef(RuleRef {
        grammar: None,
        name: "ws".to_owned(),
        alias: None,
        capture: false,
        repeated: false,
    })
}

// Adjacent literals become one literal, e.g. `f`, `o`, `o` -> `foo`.
fn merge_literals(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match (merged.last_mut(), node) {
            (Some(Node::Literal(last)), Node::Literal(text)) => last.push_str(&text),
            (_, node) => merged.push(node),
        }
    }
    merged
}

fn new_sequence(nodes: Vec<Node>) -> Node {
    let mut nodes = merge_literals(nodes);
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        Node::Sequence(nodes)
    }
}

// `atom ** min..max % sep` is rewritten into plain repetitions:
//
// - min >= 1: `atom [sep atom] ** (min-1)..(max-1)`
// - min == 0: `[atom [sep atom] ** 0..(max-1)]?`
fn new_separated_repetition(
    atom: Node,
    separator: Node,
    min: usize,
    max: Option<usize>,
    greedy: bool,
) -> Node {
    if max == Some(0) {
        return Node::empty();
    }

    let tail = Node::Quantified(Box::new(Quantified {
        child: new_sequence(vec![separator, atom.clone()]),
        min: min.saturating_sub(1),
        max: max.map(|m| m - 1),
        greedy,
    }));

    let body = Node::Sequence(vec![atom, tail]);

    if min == 0 {
        Node::Quantified(Box::new(Quantified {
            child: body,
            min: 0,
            max: Some(1),
            greedy,
        }))
    } else {
        body
    }
}

// Flags captures and rule calls that can occur more than once within
// their scope, their results are collected into lists.
fn mark_repetitions(node: &mut Node, repeated: bool) {
    match node {
        Node::Literal(_) | Node::AnyChar | Node::CharClass(_) => {}
        Node::Quantified(q) => {
            let repeats = q.max != Some(1) && q.max != Some(0);
            mark_repetitions(&mut q.child, repeated || repeats);
        }
        Node::Sequence(nodes)
        | Node::Alternation {
            branches: nodes, ..
        }
        | Node::Conjunction {
            branches: nodes, ..
        } => {
            for node in nodes {
                mark_repetitions(node, repeated);
            }
        }
        Node::Capture(c) => {
            c.repeated = repeated;
            mark_repetitions(&mut c.child, false);
        }
        Node::RuleRef(r) => r.repeated = repeated,
        Node::Assertion(Assertion::Before { pattern, .. })
        | Node::Assertion(Assertion::After { pattern, .. }) => {
            mark_repetitions(pattern, false);
        }
        Node::Assertion(_) => {}
        Node::Cut(c) => mark_repetitions(&mut c.child, repeated),
        Node::Modified(m) => mark_repetitions(&mut m.child, repeated),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        ast::{
            Assertion, Capture, CaptureName, Cut, CutScope, InlineModifier, Modified, Node,
            Quantified, RuleRef,
        },
        charset::{shortcut_class, CharClass, CharRange},
        error::CompileError,
    };

    use super::{new_whitespace_node, parse_from_str};

    fn literal(s: &str) -> Node {
        Node::Literal(s.to_owned())
    }

    fn quantified(child: Node, min: usize, max: Option<usize>, greedy: bool) -> Node {
        Node::Quantified(Box::new(Quantified {
            child,
            min,
            max,
            greedy,
        }))
    }

    fn capture(child: Node, name: CaptureName, repeated: bool) -> Node {
        Node::Capture(Box::new(Capture {
            child,
            name,
            repeated,
        }))
    }

    fn rule_ref(name: &str) -> Node {
        Node::RuleRef(RuleRef {
            grammar: None,
            name: name.to_owned(),
            alias: None,
            capture: true,
            repeated: false,
        })
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_from_str("foo", false).unwrap(), literal("foo"));

        // whitespace is insignificant, quotes keep it
        assert_eq!(
            parse_from_str("f o 'o b' ar", false).unwrap(),
            literal("foo bar")
        );

        assert_eq!(parse_from_str("", false).unwrap(), Node::Sequence(vec![]));
    }

    #[test]
    fn test_parse_quantifiers() {
        assert_eq!(
            parse_from_str("fo*", false).unwrap(),
            Node::Sequence(vec![literal("f"), quantified(literal("o"), 0, None, true)])
        );

        assert_eq!(
            parse_from_str("a+? b? c**2..3 d ** 4 e**1..*!", false).unwrap(),
            Node::Sequence(vec![
                quantified(literal("a"), 1, None, false),
                quantified(literal("b"), 0, Some(1), true),
                quantified(literal("c"), 2, Some(3), true),
                quantified(literal("d"), 4, Some(4), true),
                quantified(literal("e"), 1, None, true),
            ])
        );

        assert!(matches!(
            parse_from_str("a**3..1", false),
            Err(CompileError::InvalidQuantifierRange { min: 3, max: 1, .. })
        ));

        assert!(matches!(
            parse_from_str("a+*", false),
            Err(CompileError::MessageWithLocation(_, _))
        ));

        assert!(matches!(
            parse_from_str("*a", false),
            Err(CompileError::MessageWithLocation(_, _))
        ));
    }

    #[test]
    fn test_parse_separator() {
        assert_eq!(
            parse_from_str("\\d+ % ','", false).unwrap(),
            Node::Sequence(vec![
                Node::CharClass(shortcut_class('d').unwrap()),
                quantified(
                    Node::Sequence(vec![
                        literal(","),
                        Node::CharClass(shortcut_class('d').unwrap())
                    ]),
                    0,
                    None,
                    true
                ),
            ])
        );
    }

    #[test]
    fn test_parse_groups_and_captures() {
        assert_eq!(
            parse_from_str("a(bc*d)?", false).unwrap(),
            Node::Sequence(vec![
                literal("a"),
                quantified(
                    capture(
                        Node::Sequence(vec![
                            literal("b"),
                            quantified(literal("c"), 0, None, true),
                            literal("d"),
                        ]),
                        CaptureName::Index(0),
                        false
                    ),
                    0,
                    Some(1),
                    true
                ),
            ])
        );

        // numbering restarts inside a capture
        assert_eq!(
            parse_from_str("(a(b))(c)", false).unwrap(),
            Node::Sequence(vec![
                capture(
                    Node::Sequence(vec![
                        literal("a"),
                        capture(literal("b"), CaptureName::Index(0), false)
                    ]),
                    CaptureName::Index(0),
                    false
                ),
                capture(literal("c"), CaptureName::Index(1), false),
            ])
        );

        // named captures take no positional slot
        assert_eq!(
            parse_from_str("$<x>:=[a] (b) $<y>=\\d+", false).unwrap(),
            Node::Sequence(vec![
                capture(literal("a"), CaptureName::Name("x".to_owned()), false),
                capture(literal("b"), CaptureName::Index(0), false),
                capture(
                    quantified(Node::CharClass(shortcut_class('d').unwrap()), 1, None, true),
                    CaptureName::Name("y".to_owned()),
                    false
                ),
            ])
        );

        // repeated captures
        assert_eq!(
            parse_from_str("[(a) <b>]*", false).unwrap(),
            quantified(
                Node::Sequence(vec![
                    capture(literal("a"), CaptureName::Index(0), true),
                    Node::RuleRef(RuleRef {
                        grammar: None,
                        name: "b".to_owned(),
                        alias: None,
                        capture: true,
                        repeated: true,
                    }),
                ]),
                0,
                None,
                true
            )
        );

        assert!(matches!(
            parse_from_str("(ab", false),
            Err(CompileError::UnbalancedGroup(_))
        ));
        assert!(matches!(
            parse_from_str("ab]", false),
            Err(CompileError::UnbalancedGroup(_))
        ));
        assert!(matches!(
            parse_from_str("[a)", false),
            Err(CompileError::UnbalancedGroup(_))
        ));
    }

    #[test]
    fn test_parse_alternation_and_conjunction() {
        assert_eq!(
            parse_from_str("f | fo | foo", false).unwrap(),
            Node::Alternation {
                branches: vec![literal("f"), literal("fo"), literal("foo")],
                ordered: false
            }
        );

        // || binds looser than &&, which binds looser than |, then &
        assert_eq!(
            parse_from_str("a & b | c && d || e", false).unwrap(),
            Node::Alternation {
                branches: vec![
                    Node::Conjunction {
                        branches: vec![
                            Node::Alternation {
                                branches: vec![
                                    Node::Conjunction {
                                        branches: vec![literal("a"), literal("b")],
                                        ordered: false
                                    },
                                    literal("c")
                                ],
                                ordered: false
                            },
                            literal("d")
                        ],
                        ordered: true
                    },
                    literal("e")
                ],
                ordered: true
            }
        );

        // leading separator and branch numbering
        assert_eq!(
            parse_from_str("[ || (a) || (b) ] (c)", false).unwrap(),
            Node::Sequence(vec![
                Node::Alternation {
                    branches: vec![
                        capture(literal("a"), CaptureName::Index(0), false),
                        capture(literal("b"), CaptureName::Index(0), false),
                    ],
                    ordered: true
                },
                capture(literal("c"), CaptureName::Index(1), false),
            ])
        );
    }

    #[test]
    fn test_parse_cuts() {
        assert_eq!(
            parse_from_str("[ foot || base || hand ] : ball", false).unwrap(),
            Node::Sequence(vec![
                Node::Cut(Box::new(Cut {
                    child: Node::Alternation {
                        branches: vec![literal("foot"), literal("base"), literal("hand")],
                        ordered: true
                    },
                    scope: CutScope::Atom
                })),
                literal("ball"),
            ])
        );

        assert_eq!(
            parse_from_str("a*:: b:::", false).unwrap(),
            Node::Sequence(vec![
                Node::Cut(Box::new(Cut {
                    child: quantified(literal("a"), 0, None, true),
                    scope: CutScope::Group
                })),
                Node::Cut(Box::new(Cut {
                    child: literal("b"),
                    scope: CutScope::Whole
                })),
            ])
        );
    }

    #[test]
    fn test_parse_assertions() {
        assert_eq!(
            parse_from_str("^^ << a >> $$ ^ $", false).unwrap(),
            Node::Sequence(vec![
                Node::Assertion(Assertion::LineStart),
                Node::Assertion(Assertion::WordLeft),
                literal("a"),
                Node::Assertion(Assertion::WordRight),
                Node::Assertion(Assertion::LineEnd),
                Node::Assertion(Assertion::Start),
                Node::Assertion(Assertion::End),
            ])
        );

        assert_eq!(
            parse_from_str("a <before \\d+> <!after x>", false).unwrap(),
            Node::Sequence(vec![
                literal("a"),
                Node::Assertion(Assertion::Before {
                    pattern: Box::new(quantified(
                        Node::CharClass(shortcut_class('d').unwrap()),
                        1,
                        None,
                        true
                    )),
                    negative: false
                }),
                Node::Assertion(Assertion::After {
                    pattern: Box::new(literal("x")),
                    negative: true
                }),
            ])
        );

        assert!(matches!(
            parse_from_str("<before a", false),
            Err(CompileError::UnbalancedGroup(_))
        ));
    }

    #[test]
    fn test_parse_char_classes() {
        assert_eq!(
            parse_from_str("<[a..z] - [aeiou]>", false).unwrap(),
            Node::CharClass(
                CharClass::new(vec![CharRange::new('a', 'z')], false)
                    .difference(&CharClass::from_chars(&['a', 'e', 'i', 'o', 'u']))
            )
        );
    }

    #[test]
    fn test_parse_modifiers() {
        assert_eq!(
            parse_from_str(":i ab | c", false).unwrap(),
            Node::Modified(Box::new(Modified {
                modifiers: vec![(InlineModifier::IgnoreCase, true)],
                child: Node::Alternation {
                    branches: vec![literal("ab"), literal("c")],
                    ordered: false
                }
            }))
        );

        assert_eq!(
            parse_from_str("a :!r b c", false).unwrap(),
            Node::Sequence(vec![
                literal("a"),
                Node::Modified(Box::new(Modified {
                    modifiers: vec![(InlineModifier::Ratchet, false)],
                    child: literal("bc")
                })),
            ])
        );

        assert!(matches!(
            parse_from_str(":frobnicate a", false),
            Err(CompileError::UnknownModifier(_))
        ));
    }

    #[test]
    fn test_parse_sigspace() {
        assert_eq!(
            parse_from_str("<term> '+' <term>*", true).unwrap(),
            Node::Sequence(vec![
                rule_ref("term"),
                new_whitespace_node(),
                literal("+"),
                new_whitespace_node(),
                Node::Quantified(Box::new(Quantified {
                    child: Node::RuleRef(RuleRef {
                        grammar: None,
                        name: "term".to_owned(),
                        alias: None,
                        capture: true,
                        repeated: true,
                    }),
                    min: 0,
                    max: None,
                    greedy: true
                })),
            ])
        );

        // the modifier is scoped to its group
        assert_eq!(
            parse_from_str("[:s a b] c d", false).unwrap(),
            Node::Sequence(vec![
                Node::Modified(Box::new(Modified {
                    modifiers: vec![(InlineModifier::SigSpace, true)],
                    child: Node::Sequence(vec![literal("a"), new_whitespace_node(), literal("b")])
                })),
                literal("cd"),
            ])
        );
    }
}
