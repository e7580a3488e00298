// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Renders node trees back into pattern source. The output compiles to the
// same tree again, provided it is compiled with the same `sigspace` setting.
//
// - literals are always single-quoted
// - classes always use the bracket form, e.g. `<-[a..z \x[2d]]>`
// - `<<` and `>>` are written as `«` and `»`, since a bare `>` closes a lookaround
// - whitespace calls are explicit (`<.ws>`), sigspace regions are printed without gaps

use std::fmt::{Display, Write};

use crate::{
    ast::{Assertion, CaptureName, CutScope, InlineModifier, Node, RuleRef},
    charset::CharClass,
};

// binding strength, higher binds tighter
const LEVEL_ORDERED_ALTERNATION: u8 = 1;
const LEVEL_ORDERED_CONJUNCTION: u8 = 2;
const LEVEL_ALTERNATION: u8 = 3;
const LEVEL_CONJUNCTION: u8 = 4;
const LEVEL_SEQUENCE: u8 = 5;
const LEVEL_POSTFIX: u8 = 6;
const LEVEL_ATOM: u8 = 7;

impl Node {
    /// Renders the node as pattern source.
    ///
    /// `sigspace` tells whether the text will be compiled with `:sigspace`
    /// in effect, which decides how sequence items are separated.
    pub fn to_source(&self, sigspace: bool) -> String {
        let mut printer = Printer {
            text: String::new(),
            sigspace,
        };
        printer.print(self, 0);
        printer.text
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_source(false))
    }
}

impl Display for CharClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items: Vec<String> = self
            .ranges
            .iter()
            .map(|range| {
                if range.start == range.end_included {
                    class_char(range.start)
                } else {
                    format!(
                        "{}..{}",
                        class_char(range.start),
                        class_char(range.end_included)
                    )
                }
            })
            .collect();

        if self.negative {
            write!(f, "<-[{}]>", items.join(" "))
        } else {
            write!(f, "<[{}]>", items.join(" "))
        }
    }
}

impl Display for RuleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('<')?;
        if !self.capture {
            f.write_char('.')?;
        }
        if let Some(alias) = &self.alias {
            write!(f, "{}=", alias)?;
        }
        if let Some(grammar) = &self.grammar {
            write!(f, "{}.", grammar)?;
        }
        write!(f, "{}>", self.name)
    }
}

impl Display for InlineModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InlineModifier::IgnoreCase => f.write_str("i"),
            InlineModifier::BaseChar => f.write_str("m"),
            InlineModifier::SigSpace => f.write_str("s"),
            InlineModifier::Ratchet => f.write_str("r"),
        }
    }
}

fn class_char(c: char) -> String {
    if c.is_alphanumeric() {
        c.to_string()
    } else {
        format!("\\x[{:x}]", c as u32)
    }
}

fn quote_literal(s: &str) -> String {
    let mut text = String::with_capacity(s.len() + 2);
    text.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            text.push('\\');
        }
        text.push(c);
    }
    text.push('\'');
    text
}

fn level_of(node: &Node) -> u8 {
    match node {
        Node::Alternation { ordered: true, .. } => LEVEL_ORDERED_ALTERNATION,
        Node::Conjunction { ordered: true, .. } => LEVEL_ORDERED_CONJUNCTION,
        Node::Alternation { ordered: false, .. } => LEVEL_ALTERNATION,
        Node::Conjunction { ordered: false, .. } => LEVEL_CONJUNCTION,
        Node::Sequence(_) => LEVEL_SEQUENCE,
        Node::Quantified(_) | Node::Cut(_) => LEVEL_POSTFIX,
        _ => LEVEL_ATOM,
    }
}

struct Printer {
    text: String,
    sigspace: bool,
}

impl Printer {
    // prints `node`, bracketed when it does not bind tighter than `outer_level`
    fn print(&mut self, node: &Node, outer_level: u8) {
        if level_of(node) <= outer_level {
            self.text.push('[');
            self.print_bare(node);
            self.text.push(']');
        } else {
            self.print_bare(node);
        }
    }

    fn print_bare(&mut self, node: &Node) {
        match node {
            Node::Literal(s) => self.text.push_str(&quote_literal(s)),
            Node::AnyChar => self.text.push('.'),
            Node::CharClass(class) => self.text.push_str(&class.to_string()),
            Node::Quantified(q) => {
                self.print(&q.child, LEVEL_POSTFIX);

                let quantifier = match (q.min, q.max) {
                    (0, None) => "*".to_owned(),
                    (1, None) => "+".to_owned(),
                    (0, Some(1)) => "?".to_owned(),
                    (min, None) => format!("**{}..*", min),
                    // `**2..` would read a following `..` as part of the range
                    (min, Some(max)) if min == max && !self.sigspace => format!("**{}", min),
                    (min, Some(max)) => format!("**{}..{}", min, max),
                };
                self.text.push_str(&quantifier);

                if !q.greedy {
                    self.text.push('?');
                }
            }
            Node::Sequence(nodes) => {
                for (idx, child) in nodes.iter().enumerate() {
                    if idx > 0 && !self.sigspace {
                        self.text.push(' ');
                    }

                    let is_anchor = matches!(
                        child,
                        Node::Assertion(
                            Assertion::Start
                                | Assertion::End
                                | Assertion::LineStart
                                | Assertion::LineEnd
                        )
                    );

                    if self.sigspace && is_anchor && nodes.len() > 1 {
                        // `$` directly followed by `$` or `<` reads differently
                        self.text.push('[');
                        self.print_bare(child);
                        self.text.push(']');
                    } else {
                        self.print(child, LEVEL_SEQUENCE);
                    }
                }
            }
            Node::Alternation { branches, ordered } => {
                let (separator, level) = if *ordered {
                    (" || ", LEVEL_ORDERED_ALTERNATION)
                } else {
                    (" | ", LEVEL_ALTERNATION)
                };
                self.print_branches(branches, separator, level);
            }
            Node::Conjunction { branches, ordered } => {
                let (separator, level) = if *ordered {
                    (" && ", LEVEL_ORDERED_CONJUNCTION)
                } else {
                    (" & ", LEVEL_CONJUNCTION)
                };
                self.print_branches(branches, separator, level);
            }
            Node::Capture(c) => match &c.name {
                CaptureName::Index(_) => {
                    self.text.push('(');
                    self.print(&c.child, 0);
                    self.text.push(')');
                }
                CaptureName::Name(name) => {
                    write!(self.text, "$<{}>=[", name).ok();
                    self.print(&c.child, 0);
                    self.text.push(']');
                }
            },
            Node::RuleRef(r) => self.text.push_str(&r.to_string()),
            Node::Assertion(assertion) => match assertion {
                Assertion::Start => self.text.push('^'),
                Assertion::End => self.text.push('$'),
                Assertion::LineStart => self.text.push_str("^^"),
                Assertion::LineEnd => self.text.push_str("$$"),
                Assertion::WordLeft => self.text.push('«'),
                Assertion::WordRight => self.text.push('»'),
                Assertion::Before { pattern, negative } => {
                    self.print_lookaround("before", pattern, *negative)
                }
                Assertion::After { pattern, negative } => {
                    self.print_lookaround("after", pattern, *negative)
                }
            },
            Node::Cut(c) => {
                self.print(&c.child, LEVEL_SEQUENCE);
                self.text.push_str(match c.scope {
                    CutScope::Atom => " :",
                    CutScope::Group => " ::",
                    CutScope::Whole => " :::",
                });
            }
            Node::Modified(m) => {
                let saved_sigspace = self.sigspace;

                self.text.push('[');
                for (modifier, on) in &m.modifiers {
                    if *on {
                        write!(self.text, ":{} ", modifier).ok();
                    } else {
                        write!(self.text, ":!{} ", modifier).ok();
                    }

                    if *modifier == InlineModifier::SigSpace {
                        self.sigspace = *on;
                    }
                }
                self.print(&m.child, 0);
                self.text.push(']');

                self.sigspace = saved_sigspace;
            }
        }
    }

    fn print_branches(&mut self, branches: &[Node], separator: &str, level: u8) {
        for (idx, branch) in branches.iter().enumerate() {
            if idx > 0 {
                self.text.push_str(separator);
            }
            self.print(branch, level);
        }
    }

    fn print_lookaround(&mut self, name: &str, pattern: &Node, negative: bool) {
        if negative {
            self.text.push_str("<!");
        } else {
            self.text.push('<');
        }
        self.text.push_str(name);
        self.text.push(' ');
        self.print(pattern, 0);
        self.text.push('>');
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::parser::parse_from_str;

    fn reprint(s: &str, sigspace: bool) -> String {
        let node = parse_from_str(s, sigspace).unwrap();
        let text = node.to_source(sigspace);

        // the printed text compiles to the same tree
        assert_eq!(parse_from_str(&text, sigspace).unwrap(), node);
        text
    }

    #[test]
    fn test_print_literals_and_quantifiers() {
        assert_eq!(reprint("fo*", false), "'f' 'o'*");
        assert_eq!(reprint("'it\\'s' \\\\", false), "'it\\'s\\\\'");
        assert_eq!(reprint("a+? b**2 c**1..3 d**2..*", false), "'a'+? 'b'**2 'c'**1..3 'd'**2..*");
        assert_eq!(reprint("[ab]*", false), "'ab'*");
        assert_eq!(reprint("[a b*]*", false), "['a' 'b'*]*");
        assert_eq!(reprint("", false), "");
    }

    #[test]
    fn test_print_operators() {
        assert_eq!(reprint("f | fo | foo", false), "'f' | 'fo' | 'foo'");
        assert_eq!(
            reprint("[a || b] c && d", false),
            "['a' || 'b'] 'c' && 'd'"
        );
        assert_eq!(reprint("[a | b] | c", false), "['a' | 'b'] | 'c'");
        assert_eq!(reprint("a & [b || c]", false), "'a' & ['b' || 'c']");
    }

    #[test]
    fn test_print_captures_and_rules() {
        assert_eq!(
            reprint("a(bc*d)? $<x>=\\d+", false),
            "'a' ('b' 'c'* 'd')? $<x>=[<[0..9]>+]"
        );
        assert_eq!(
            reprint("<term> <.ws> <op=Calc.sign>", false),
            "<term> <.ws> <op=Calc.sign>"
        );
    }

    #[test]
    fn test_print_assertions_and_cuts() {
        assert_eq!(
            reprint("^ << a >> <!before \\d » > $", false),
            "^ « 'a' » <!before <[0..9]> »> $"
        );
        assert_eq!(
            reprint("[ foot || base || hand ] : ball", false),
            "['foot' || 'base' || 'hand'] : 'ball'"
        );
        assert_eq!(reprint("a*:: b: :", false), "'a'* :: 'b' : :");
    }

    #[test]
    fn test_print_classes_and_modifiers() {
        assert_eq!(reprint("<[a..c x] - [b]>", false), "<[a c x]>");
        assert_eq!(reprint("<-[\\-_]>", false), "<-[\\x[2d] \\x[5f]]>");
        assert_eq!(reprint(":i a | b", false), "[:i 'a' | 'b']");
        assert_eq!(reprint("x :!r y z", false), "'x' [:!r 'yz']");
    }

    #[test]
    fn test_print_sigspace() {
        assert_eq!(
            reprint("<term> '+' <term> $", true),
            "<term><.ws>'+'<.ws><term><.ws>[$]"
        );
        assert_eq!(reprint("a b [:!s c d] e", true), "'a'<.ws>'b'<.ws>[:!s 'cd']<.ws>'e'");
        assert_eq!(reprint("x ** 2 ..", true), "'x'**2..2<.ws>..");
    }
}
