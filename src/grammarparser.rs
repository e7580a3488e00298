// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Grammar source:
//
// ```
// grammar Calc {
//     rule TOP { <expr> }
//     rule expr { <term>+ % <op> }
//     token op { '+' | '-' }
//     ...
// }
//
// grammar Calc2 is Calc { ... }
// ```
//
// The scanner only finds the rule bodies (matching braces, while skipping
// quoted spans, escapes and comments), each body is handed to the pattern
// parser on its own.

use crate::{
    ast::{GrammarDecl, RuleDecl, RuleKind},
    charwithposition::{CharWithPosition, CharsWithPositionIter},
    error::CompileError,
    lexer::is_identifier_char,
    location::Location,
    parser::parse_from_str,
    peekableiter::PeekableIter,
};

pub const GRAMMAR_PEEK_CHAR_MAX_COUNT: usize = 2;

pub fn parse_grammars_from_str(s: &str) -> Result<Vec<GrammarDecl>, CompileError> {
    let mut chars = s.chars();
    let mut char_position_iter = CharsWithPositionIter::new(&mut chars);
    let mut peekable_char_position_iter =
        PeekableIter::new(&mut char_position_iter, GRAMMAR_PEEK_CHAR_MAX_COUNT);
    let mut scanner = GrammarScanner::new(&mut peekable_char_position_iter);
    scanner.scan()
}

struct GrammarScanner<'a> {
    upstream: &'a mut PeekableIter<'a, CharWithPosition>,
    last_position: Location,
}

impl<'a> GrammarScanner<'a> {
    fn new(upstream: &'a mut PeekableIter<'a, CharWithPosition>) -> Self {
        Self {
            upstream,
            last_position: Location::new_position(0, 0, 0),
        }
    }

    fn next_char(&mut self) -> Option<char> {
        match self.upstream.next() {
            Some(CharWithPosition {
                character,
                position,
            }) => {
                self.last_position = position;
                Some(character)
            }
            None => None,
        }
    }

    fn peek_char(&self, offset: usize) -> Option<&char> {
        match self.upstream.peek(offset) {
            Some(CharWithPosition { character, .. }) => Some(character),
            None => None,
        }
    }

    fn peek_char_and_equals(&self, offset: usize, expected_char: char) -> bool {
        matches!(
            self.upstream.peek(offset),
            Some(CharWithPosition { character, .. }) if character == &expected_char)
    }

    fn peek_position(&self, offset: usize) -> Location {
        match self.upstream.peek(offset) {
            Some(CharWithPosition { position, .. }) => *position,
            None => self.last_position.move_position_forward(),
        }
    }

    fn expect_char(
        &mut self,
        expected_char: char,
        char_description: &str,
    ) -> Result<(), CompileError> {
        match self.next_char() {
            Some(ch) if ch == expected_char => Ok(()),
            Some(_) => Err(CompileError::MessageWithLocation(
                format!("Expect char: {}.", char_description),
                self.last_position,
            )),
            None => Err(CompileError::UnexpectedEndOfDocument(format!(
                "Expect char: {}.",
                char_description
            ))),
        }
    }

    // whitespace and `#` comments
    fn consume_blanks(&mut self) {
        while let Some(c) = self.peek_char(0) {
            if c.is_whitespace() {
                self.next_char();
            } else if *c == '#' {
                while let Some(c) = self.next_char() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn scan_identifier(&mut self, description: &str) -> Result<String, CompileError> {
        let mut name = String::new();
        while let Some(c) = self.peek_char(0) {
            if is_identifier_char(*c) {
                name.push(*c);
                self.next_char();
            } else {
                break;
            }
        }

        if name.is_empty() {
            Err(CompileError::MessageWithLocation(
                format!("Expect {}.", description),
                self.peek_position(0),
            ))
        } else {
            Ok(name)
        }
    }
}

impl GrammarScanner<'_> {
    fn scan(&mut self) -> Result<Vec<GrammarDecl>, CompileError> {
        let mut grammars = vec![];

        loop {
            self.consume_blanks();
            if self.peek_char(0).is_none() {
                break;
            }

            grammars.push(self.scan_grammar()?);
        }

        Ok(grammars)
    }

    fn scan_grammar(&mut self) -> Result<GrammarDecl, CompileError> {
        // grammar Name [is Parent] { ... }
        // ^
        // |__ current char

        let keyword_position = self.peek_position(0);
        let keyword = self.scan_identifier("the keyword \"grammar\"")?;
        if keyword != "grammar" {
            return Err(CompileError::MessageWithLocation(
                format!("Expect the keyword \"grammar\", found \"{}\".", keyword),
                keyword_position,
            ));
        }

        self.consume_blanks();
        let name = self.scan_identifier("the grammar name")?;
        self.consume_blanks();

        let parent = if self.peek_char_and_equals(0, 'i') && self.peek_char_and_equals(1, 's') {
            self.next_char(); // consume 'i'
            self.next_char(); // consume 's'
            self.consume_blanks();
            let parent = self.scan_identifier("the parent grammar name")?;
            self.consume_blanks();
            Some(parent)
        } else {
            None
        };

        let opening = self.peek_position(0);
        self.expect_char('{', "\"{\" opening the grammar")?;

        let mut rules = vec![];
        loop {
            self.consume_blanks();
            match self.peek_char(0) {
                Some('}') => {
                    self.next_char(); // consume '}'
                    break;
                }
                Some(';') => {
                    self.next_char(); // consume ';'
                }
                Some(_) => rules.push(self.scan_rule()?),
                None => return Err(CompileError::UnbalancedGroup(opening)),
            }
        }

        Ok(GrammarDecl {
            name,
            parent,
            rules,
        })
    }

    fn scan_rule(&mut self) -> Result<RuleDecl, CompileError> {
        // token name { body }
        // ^
        // |__ current char

        let location = self.peek_position(0);
        let keyword = self.scan_identifier("a rule declaration")?;
        let kind = match keyword.as_str() {
            "regex" => RuleKind::Regex,
            "token" => RuleKind::Token,
            "rule" => RuleKind::Rule,
            _ => {
                return Err(CompileError::MessageWithLocation(
                    format!(
                        "Expect \"regex\", \"token\" or \"rule\", found \"{}\".",
                        keyword
                    ),
                    location,
                ))
            }
        };

        self.consume_blanks();
        let name = self.scan_identifier("the rule name")?;
        self.consume_blanks();

        let opening = self.peek_position(0);
        self.expect_char('{', "\"{\" opening the rule body")?;

        let body_position = self.peek_position(0);
        let body_text = self.scan_body(opening)?;

        let body = parse_from_str(&body_text, kind.sigspace())
            .map_err(|e| shift_error_location(e, &body_position))?;

        Ok(RuleDecl {
            kind,
            name,
            body,
            location,
        })
    }

    // collects the text up to the matching '}', which is consumed
    fn scan_body(&mut self, opening: Location) -> Result<String, CompileError> {
        let mut text = String::new();
        let mut depth = 0;

        loop {
            let c = match self.next_char() {
                Some(c) => c,
                None => return Err(CompileError::UnbalancedGroup(opening)),
            };

            match c {
                '}' if depth == 0 => break,
                '{' => depth += 1,
                '}' => depth -= 1,
                '\\' => {
                    text.push(c);
                    match self.next_char() {
                        Some(escaped) => text.push(escaped),
                        None => return Err(CompileError::UnbalancedGroup(opening)),
                    }
                    continue;
                }
                '\'' | '"' => {
                    text.push(c);
                    self.scan_quoted(c, &mut text)?;
                    continue;
                }
                '#' => {
                    // a comment may contain anything, braces included
                    text.push(c);
                    while let Some(next) = self.peek_char(0) {
                        if *next == '\n' {
                            break;
                        }
                        text.push(*next);
                        self.next_char();
                    }
                    continue;
                }
                _ => {}
            }

            text.push(c);
        }

        Ok(text)
    }

    fn scan_quoted(&mut self, quote: char, text: &mut String) -> Result<(), CompileError> {
        loop {
            match self.next_char() {
                Some('\\') => {
                    text.push('\\');
                    if let Some(escaped) = self.next_char() {
                        text.push(escaped);
                    }
                }
                Some(c) => {
                    text.push(c);
                    if c == quote {
                        return Ok(());
                    }
                }
                None => {
                    return Err(CompileError::UnexpectedEndOfDocument(
                        "Missing the closing quote of a literal.".to_owned(),
                    ))
                }
            }
        }
    }
}

// Locations reported by the pattern parser are relative to the rule body,
// this maps them back onto the grammar source.
fn shift_error_location(error: CompileError, base: &Location) -> CompileError {
    let shift = |location: Location| -> Location {
        Location {
            index: location.index + base.index,
            line: location.line + base.line,
            column: if location.line == 0 {
                location.column + base.column
            } else {
                location.column
            },
            length: location.length,
        }
    };

    match error {
        CompileError::UnbalancedGroup(location) => CompileError::UnbalancedGroup(shift(location)),
        CompileError::UnterminatedClass(location) => {
            CompileError::UnterminatedClass(shift(location))
        }
        CompileError::InvalidQuantifierRange { min, max, location } => {
            CompileError::InvalidQuantifierRange {
                min,
                max,
                location: shift(location),
            }
        }
        CompileError::MessageWithLocation(message, location) => {
            CompileError::MessageWithLocation(message, shift(location))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        ast::{GrammarDecl, RuleKind},
        error::CompileError,
        location::Location,
        parser::parse_from_str,
    };

    use super::parse_grammars_from_str;

    #[test]
    fn test_parse_grammars() {
        let source = r#"
            # arithmetic
            grammar Calc {
                rule TOP { <expr> }
                token num { \d+ }
                regex quoted { '{' <-[\}]>* '}' }   # braces in quotes
            }

            grammar Calc2 is Calc {
                token num { \d+ [ '.' \d+ ]? };
            }
        "#;

        let grammars = parse_grammars_from_str(source).unwrap();
        assert_eq!(grammars.len(), 2);

        let calc: &GrammarDecl = &grammars[0];
        assert_eq!(calc.name, "Calc");
        assert_eq!(calc.parent, None);
        assert_eq!(
            calc.rules
                .iter()
                .map(|r| (r.kind, r.name.as_str()))
                .collect::<Vec<_>>(),
            vec![
                (RuleKind::Rule, "TOP"),
                (RuleKind::Token, "num"),
                (RuleKind::Regex, "quoted"),
            ]
        );

        // `rule` bodies are parsed with sigspace
        assert_eq!(calc.rules[0].body, parse_from_str(" <expr> ", true).unwrap());
        assert_eq!(calc.rules[1].body, parse_from_str(" \\d+ ", false).unwrap());

        assert_eq!(grammars[1].name, "Calc2");
        assert_eq!(grammars[1].parent, Some("Calc".to_owned()));
        assert_eq!(grammars[1].rules.len(), 1);
    }

    #[test]
    fn test_parse_grammars_errors() {
        assert!(matches!(
            parse_grammars_from_str("grammar G { token a { x "),
            Err(CompileError::UnbalancedGroup(_))
        ));

        assert!(matches!(
            parse_grammars_from_str("grammar G { method a { x } }"),
            Err(CompileError::MessageWithLocation(_, _))
        ));

        assert!(matches!(
            parse_grammars_from_str("lexicon G { }"),
            Err(CompileError::MessageWithLocation(_, _))
        ));

        // the location points into the grammar source
        assert_eq!(
            parse_grammars_from_str("grammar G {\n  token a { x ) }\n}"),
            Err(CompileError::UnbalancedGroup(Location::new_range(26, 1, 14, 1)))
        );
    }
}
