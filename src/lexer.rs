// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Syntax Summary:
//
// Every alphanumeric character (and `_`) matches itself. Every other
// character is metasyntactic unless it is escaped with a backslash or
// appears inside a quoted span. Escaping an alphanumeric character does
// the opposite and turns it into a class shortcut.
//
// - 'abc' "abc"   Quoted literal spans, whitespace kept
// - .             Any character (newlines included)
// - [ ]           Non-capturing group
// - ( )           Capturing group
// - $<name>=[ ]   Named capture (also `:=`)
// - | ||          Longest-token and ordered alternation
// - & &&          Unordered and ordered conjunction
// - * + ?         Quantifiers, suffix `?` for non-greedy and `!` for greedy
// - ** N..M       Counted repetition, `** N`, `** N..*`
// - %             Separator of a repetition, e.g. `\d+ % ','`
// - : :: :::      Cut after an atom, its group, or the whole rule
// - :i :s ...     Inline modifiers, `:!i` to switch one off
// - ^ $ ^^ $$     Start/end of string and of line
// - << >>         Left and right word boundary (also « and »)
// - # ...         Comment to the end of the line
//
// Angle constructs:
//
// - <name> <.name> <Grammar.name> <alias=name>   Rule calls
// - <before P> <after P> <!before P> <!after P>  Lookaround
// - <[a..z]> <-[0..9]> <[a..z] - [aeiou]> <+alpha + [_]>   Character classes
//
// Backslash shortcuts:
//
// - \w \d \s \h \v \t \n \r \f   and the uppercase anti-classes
// - \x[41]                        Code point in hexadecimal

use crate::{
    ast::CutScope,
    charset::{named_class, shortcut_class, CharClass, CharRange},
    charwithposition::{CharWithPosition, CharsWithPositionIter},
    error::CompileError,
    location::Location,
    peekableiter::PeekableIter,
    token::{Token, TokenWithRange},
};

pub const LEXER_PEEK_CHAR_MAX_COUNT: usize = 3;

pub fn lex_from_str(s: &str) -> Result<Vec<TokenWithRange>, CompileError> {
    let mut chars = s.chars();
    let mut char_position_iter = CharsWithPositionIter::new(&mut chars);
    let mut peekable_char_position_iter =
        PeekableIter::new(&mut char_position_iter, LEXER_PEEK_CHAR_MAX_COUNT);
    let mut lexer = Lexer::new(&mut peekable_char_position_iter);
    lexer.lex()
}

pub fn is_literal_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

struct Lexer<'a> {
    upstream: &'a mut PeekableIter<'a, CharWithPosition>,
    last_position: Location, // last position consumed
    saved_positions: Vec<Location>,

    // inside `<before ...>` every `>` closes the construct
    angle_depth: usize,
}

impl<'a> Lexer<'a> {
    fn new(upstream: &'a mut PeekableIter<'a, CharWithPosition>) -> Self {
        Self {
            upstream,
            last_position: Location::new_position(0, 0, 0),
            saved_positions: vec![],
            angle_depth: 0,
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

    fn push_peek_position(&mut self) {
        let position = self.peek_position(0);
        self.saved_positions.push(position);
    }

    fn pop_saved_position(&mut self) -> Location {
        self.saved_positions
            .pop()
            .unwrap_or_else(|| self.last_position.get_position_by_range_start())
    }

    // a token that ends at the last consumed char
    fn token_since_saved_position(&mut self, token: Token) -> TokenWithRange {
        let start = self.pop_saved_position();
        TokenWithRange::new(
            token,
            Location::from_position_pair_with_end_included(&start, &self.last_position),
        )
    }

    fn expect_char(
        &mut self,
        expected_char: char,
        char_description: &str,
    ) -> Result<(), CompileError> {
        match self.next_char() {
            Some(ch) => {
                if ch == expected_char {
                    Ok(())
                } else {
                    Err(CompileError::MessageWithLocation(
                        format!("Expect char: {}.", char_description),
                        self.last_position,
                    ))
                }
            }
            None => Err(CompileError::UnexpectedEndOfDocument(format!(
                "Expect char: {}.",
                char_description
            ))),
        }
    }

    fn consume_spaces(&mut self) {
        while matches!(self.peek_char(0), Some(c) if c.is_whitespace()) {
            self.next_char();
        }
    }
}

impl Lexer<'_> {
    fn lex(&mut self) -> Result<Vec<TokenWithRange>, CompileError> {
        let mut token_with_ranges = vec![];

        while let Some(current_char) = self.peek_char(0) {
            let current_char = *current_char;
            self.push_peek_position();

            let token = match current_char {
                c if c.is_whitespace() => {
                    self.consume_spaces();
                    Token::Space
                }
                '#' => {
                    self.next_char(); // consume '#'
                    let mut comment = String::new();
                    while let Some(c) = self.peek_char(0) {
                        if *c == '\n' {
                            break;
                        }
                        comment.push(*c);
                        self.next_char();
                    }
                    Token::Comment(comment)
                }
                c if is_literal_char(c) => {
                    self.next_char();
                    Token::Char(c)
                }
                '\\' => self.lex_backslash()?,
                '\'' | '"' => self.lex_string(current_char)?,
                '.' => {
                    self.next_char();
                    Token::Dot
                }
                '^' => {
                    self.next_char();
                    if self.peek_char_and_equals(0, '^') {
                        self.next_char();
                        Token::LineStartAssertion
                    } else {
                        Token::StartAssertion
                    }
                }
                '$' if self.peek_char_and_equals(1, '<') => self.lex_named_capture()?,
                '$' => {
                    self.next_char();
                    if self.peek_char_and_equals(0, '$') {
                        self.next_char();
                        Token::LineEndAssertion
                    } else {
                        Token::EndAssertion
                    }
                }
                '«' => {
                    self.next_char();
                    Token::WordLeftAssertion
                }
                '»' => {
                    self.next_char();
                    Token::WordRightAssertion
                }
                '<' => self.lex_angle()?,
                '>' if self.angle_depth > 0 => {
                    self.next_char();
                    self.angle_depth -= 1;
                    Token::AngleEnd
                }
                '>' if self.peek_char_and_equals(1, '>') => {
                    self.next_char();
                    self.next_char();
                    Token::WordRightAssertion
                }
                '[' => {
                    self.next_char();
                    Token::LeftBracket
                }
                ']' => {
                    self.next_char();
                    Token::RightBracket
                }
                '(' => {
                    self.next_char();
                    Token::LeftParen
                }
                ')' => {
                    self.next_char();
                    Token::RightParen
                }
                '|' => {
                    self.next_char();
                    if self.peek_char_and_equals(0, '|') {
                        self.next_char();
                        Token::OrderedAlternation
                    } else {
                        Token::Alternation
                    }
                }
                '&' => {
                    self.next_char();
                    if self.peek_char_and_equals(0, '&') {
                        self.next_char();
                        Token::OrderedConjunction
                    } else {
                        Token::Conjunction
                    }
                }
                '*' if self.peek_char_and_equals(1, '*') => self.lex_repetition()?,
                '*' => {
                    self.next_char();
                    Token::Asterisk
                }
                '+' => {
                    self.next_char();
                    Token::Plus
                }
                '?' => {
                    self.next_char();
                    Token::Question
                }
                '!' => {
                    self.next_char();
                    Token::Exclamation
                }
                '%' => {
                    self.next_char();
                    Token::Percent
                }
                ':' => self.lex_colon(),
                '{' | '}' => {
                    return Err(CompileError::MessageWithLocation(
                        "Embedded code blocks are not supported.".to_owned(),
                        self.peek_position(0),
                    ));
                }
                _ => {
                    return Err(CompileError::MessageWithLocation(
                        format!(
                            "Unrecognized metacharacter '{}', escape it with a backslash or quote it.",
                            current_char
                        ),
                        self.peek_position(0),
                    ));
                }
            };

            token_with_ranges.push(self.token_since_saved_position(token));
        }

        Ok(token_with_ranges)
    }

    fn lex_backslash(&mut self) -> Result<Token, CompileError> {
        // \?.....
        // ^
        // |__ current char

        self.next_char(); // consume '\'

        match self.next_char() {
            Some('x') => {
                let c = self.lex_codepoint()?;
                Ok(Token::Char(c))
            }
            Some(c) if is_literal_char(c) => match shortcut_class(c) {
                Some(class) => Ok(Token::CharClass(class)),
                None => Err(CompileError::MessageWithLocation(
                    format!("Unrecognized backslash sequence \"\\{}\".", c),
                    self.last_position,
                )),
            },
            Some(c) => Ok(Token::Char(c)),
            None => Err(CompileError::UnexpectedEndOfDocument(
                "Incomplete backslash sequence.".to_owned(),
            )),
        }
    }

    fn lex_codepoint(&mut self) -> Result<char, CompileError> {
        // [41]
        // ^
        // |__ current char

        self.expect_char('[', "\"[\" for the code point")?;

        let mut digits = String::new();
        loop {
            match self.next_char() {
                Some(']') => break,
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                Some(_) => {
                    return Err(CompileError::MessageWithLocation(
                        "Code point escapes only accept hexadecimal digits.".to_owned(),
                        self.last_position,
                    ))
                }
                None => {
                    return Err(CompileError::UnexpectedEndOfDocument(
                        "Incomplete code point escape.".to_owned(),
                    ))
                }
            }
        }

        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| {
                CompileError::MessageWithLocation(
                    format!("Invalid code point \"{}\".", digits),
                    self.last_position,
                )
            })
    }

    fn lex_string(&mut self, quote: char) -> Result<Token, CompileError> {
        // '...'
        // ^
        // |__ current char

        self.next_char(); // consume the opening quote

        let mut text = String::new();
        loop {
            match self.next_char() {
                Some(c) if c == quote => break,
                Some('\\') => {
                    let c = match self.next_char() {
                        Some('n') if quote == '"' => '\n',
                        Some('t') if quote == '"' => '\t',
                        Some('r') if quote == '"' => '\r',
                        Some('x') if quote == '"' => self.lex_codepoint()?,
                        Some(c) if c == quote || c == '\\' => c,
                        Some(c) => {
                            // not an escape, keep the backslash
                            text.push('\\');
                            c
                        }
                        None => {
                            return Err(CompileError::UnexpectedEndOfDocument(
                                "Missing the closing quote of a literal.".to_owned(),
                            ))
                        }
                    };
                    text.push(c);
                }
                Some(c) => text.push(c),
                None => {
                    return Err(CompileError::UnexpectedEndOfDocument(
                        "Missing the closing quote of a literal.".to_owned(),
                    ))
                }
            }
        }

        Ok(Token::String(text))
    }

    fn lex_identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek_char(0) {
            if is_identifier_char(*c) {
                name.push(*c);
                self.next_char();
            } else {
                break;
            }
        }
        name
    }

    // a dotted name such as `Calc.expr`
    fn lex_qualified_identifier(&mut self) -> Result<(Option<String>, String), CompileError> {
        let first = self.lex_identifier();
        if first.is_empty() {
            return Err(CompileError::MessageWithLocation(
                "Expect a rule name.".to_owned(),
                self.peek_position(0),
            ));
        }

        if self.peek_char_and_equals(0, '.') {
            self.next_char(); // consume '.'
            let second = self.lex_identifier();
            if second.is_empty() {
                return Err(CompileError::MessageWithLocation(
                    "Expect a rule name after the grammar name.".to_owned(),
                    self.peek_position(0),
                ));
            }
            Ok((Some(first), second))
        } else {
            Ok((None, first))
        }
    }

    fn lex_named_capture(&mut self) -> Result<Token, CompileError> {
        // $<name>=...
        // ^
        // |__ current char

        self.next_char(); // consume '$'
        self.next_char(); // consume '<'

        let name = self.lex_identifier();
        if name.is_empty() {
            return Err(CompileError::MessageWithLocation(
                "Expect the name of the capture.".to_owned(),
                self.peek_position(0),
            ));
        }

        self.expect_char('>', "\">\" closing the capture name")?;
        self.consume_spaces();

        if self.peek_char_and_equals(0, ':') {
            self.next_char(); // consume ':'
        }
        self.expect_char('=', "\"=\" binding the capture")?;

        Ok(Token::NamedCapture(name))
    }

    fn lex_angle(&mut self) -> Result<Token, CompileError> {
        // <...>
        // ^
        // |__ current char

        match self.peek_char(1) {
            Some('<') => {
                self.next_char(); // consume '<'
                self.next_char(); // consume '<'
                Ok(Token::WordLeftAssertion)
            }
            Some('[') => self.lex_class_expression(),
            Some('-' | '+')
                if matches!(self.peek_char(2), Some(c) if *c == '[' || c.is_alphabetic()) =>
            {
                self.lex_class_expression()
            }
            Some('?' | '!') => {
                let negative = self.peek_char_and_equals(1, '!');
                self.next_char(); // consume '<'
                self.next_char(); // consume '?' or '!'
                self.lex_lookaround(negative)
            }
            Some('.') => {
                self.next_char(); // consume '<'
                self.next_char(); // consume '.'
                let (grammar, name) = self.lex_qualified_identifier()?;
                self.expect_char('>', "\">\" closing the rule call")?;
                Ok(Token::RuleRef {
                    grammar,
                    name,
                    alias: None,
                    capture: false,
                })
            }
            Some(c) if c.is_alphabetic() || *c == '_' => {
                self.next_char(); // consume '<'
                self.lex_rule_call_or_lookaround()
            }
            Some(_) => Err(CompileError::MessageWithLocation(
                "Unrecognized angle construct.".to_owned(),
                self.peek_position(0),
            )),
            None => Err(CompileError::UnbalancedGroup(self.peek_position(0))),
        }
    }

    fn lex_rule_call_or_lookaround(&mut self) -> Result<Token, CompileError> {
        // <name...
        //  ^
        //  |__ current char

        let (grammar, name) = self.lex_qualified_identifier()?;

        if grammar.is_none() && (name == "before" || name == "after") {
            if matches!(self.peek_char(0), Some(c) if c.is_whitespace()) {
                self.angle_depth += 1;
                return Ok(Token::LookAround {
                    after: name == "after",
                    negative: false,
                });
            }
        }

        if grammar.is_none() && self.peek_char_and_equals(0, '=') {
            // <alias=name>
            self.next_char(); // consume '='
            let (target_grammar, target_name) = self.lex_qualified_identifier()?;
            self.expect_char('>', "\">\" closing the rule call")?;
            return Ok(Token::RuleRef {
                grammar: target_grammar,
                name: target_name,
                alias: Some(name),
                capture: true,
            });
        }

        match self.next_char() {
            Some('>') => Ok(Token::RuleRef {
                grammar,
                name,
                alias: None,
                capture: true,
            }),
            Some(_) => Err(CompileError::MessageWithLocation(
                "Expect \">\" closing the rule call.".to_owned(),
                self.last_position,
            )),
            None => Err(CompileError::UnbalancedGroup(self.last_position)),
        }
    }

    fn lex_lookaround(&mut self, negative: bool) -> Result<Token, CompileError> {
        // <?before ...
        //   ^
        //   |__ current char

        let name = self.lex_identifier();
        let after = match name.as_str() {
            "before" => false,
            "after" => true,
            _ => {
                return Err(CompileError::MessageWithLocation(
                    format!("Expect \"before\" or \"after\", found \"{}\".", name),
                    self.last_position,
                ))
            }
        };

        self.angle_depth += 1;
        Ok(Token::LookAround { after, negative })
    }

    fn lex_class_expression(&mut self) -> Result<Token, CompileError> {
        // <[...] - [...]>
        // ^
        // |__ current char

        let start_position = self.peek_position(0);
        self.next_char(); // consume '<'

        let mut class: Option<CharClass> = None;
        let mut first = true;

        loop {
            self.consume_spaces();

            let sign = match self.peek_char(0) {
                Some('+') => {
                    self.next_char();
                    '+'
                }
                Some('-') => {
                    self.next_char();
                    '-'
                }
                Some('>') if !first => {
                    self.next_char();
                    break;
                }
                Some(_) if first => '+',
                Some(_) => {
                    return Err(CompileError::MessageWithLocation(
                        "Expect \"+\", \"-\" or \">\" in a character class.".to_owned(),
                        self.peek_position(0),
                    ))
                }
                None => return Err(CompileError::UnterminatedClass(start_position)),
            };

            self.consume_spaces();
            let term = match self.peek_char(0) {
                Some('[') => self.lex_class_brackets(&start_position)?,
                Some(c) if c.is_alphabetic() => {
                    let mut name = String::new();
                    while let Some(c) = self.peek_char(0) {
                        if !c.is_alphanumeric() {
                            break;
                        }
                        name.push(*c);
                        self.next_char();
                    }
                    named_class(&name).ok_or_else(|| {
                        CompileError::MessageWithLocation(
                            format!("Unknown character class \"{}\".", name),
                            self.last_position,
                        )
                    })?
                }
                Some('\\') => {
                    self.next_char(); // consume '\'
                    match self.next_char().and_then(shortcut_class) {
                        Some(c) => c,
                        None => {
                            return Err(CompileError::MessageWithLocation(
                                "Expect a class shortcut.".to_owned(),
                                self.last_position,
                            ))
                        }
                    }
                }
                Some(_) => {
                    return Err(CompileError::MessageWithLocation(
                        "Expect \"[\" or a class name in a character class.".to_owned(),
                        self.peek_position(0),
                    ))
                }
                None => return Err(CompileError::UnterminatedClass(start_position)),
            };

            class = Some(match (class, sign) {
                (None, '+') => term,
                (None, _) => term.negate(),
                (Some(current), '+') => current.union(&term),
                (Some(current), _) => current.difference(&term),
            });
            first = false;
        }

        match class {
            Some(class) => Ok(Token::CharClass(class)),
            None => Err(CompileError::UnterminatedClass(start_position)),
        }
    }

    fn lex_class_brackets(&mut self, start_position: &Location) -> Result<CharClass, CompileError> {
        // [a..z xyz \d]
        // ^
        // |__ current char

        self.next_char(); // consume '['

        let mut ranges: Vec<CharRange> = vec![];
        let mut extra: Vec<CharClass> = vec![];

        loop {
            let c = match self.next_char() {
                Some(']') => break,
                Some(c) if c.is_whitespace() => continue,
                Some('\\') => match self.next_char() {
                    Some('x') => self.lex_codepoint()?,
                    Some(c) if is_literal_char(c) => match shortcut_class(c) {
                        Some(class) => {
                            extra.push(class);
                            continue;
                        }
                        None => {
                            return Err(CompileError::MessageWithLocation(
                                format!("Unrecognized backslash sequence \"\\{}\".", c),
                                self.last_position,
                            ))
                        }
                    },
                    Some(c) => c,
                    None => return Err(CompileError::UnterminatedClass(*start_position)),
                },
                Some(c) => c,
                None => return Err(CompileError::UnterminatedClass(*start_position)),
            };

            // a..b
            if self.peek_char_and_equals(0, '.') && self.peek_char_and_equals(1, '.') {
                self.next_char(); // consume '.'
                self.next_char(); // consume '.'
                self.consume_spaces();

                let end = match self.next_char() {
                    Some('\\') => match self.next_char() {
                        Some('x') => self.lex_codepoint()?,
                        Some(c) => c,
                        None => return Err(CompileError::UnterminatedClass(*start_position)),
                    },
                    Some(']') | None => {
                        return Err(CompileError::UnterminatedClass(*start_position))
                    }
                    Some(c) => c,
                };

                if end < c {
                    return Err(CompileError::MessageWithLocation(
                        format!("Invalid character range {}..{}.", c, end),
                        self.last_position,
                    ));
                }
                ranges.push(CharRange::new(c, end));
            } else {
                ranges.push(CharRange::single(c));
            }
        }

        let mut class = CharClass::new(ranges, false);
        for other in extra {
            class = class.union(&other);
        }
        Ok(class)
    }

    fn lex_repetition(&mut self) -> Result<Token, CompileError> {
        // ** N..M
        // ^
        // |__ current char

        self.next_char(); // consume '*'
        self.next_char(); // consume '*'
        self.consume_spaces();

        let min = self.lex_number()?;

        let max = if self.peek_char_and_equals(0, '.') && self.peek_char_and_equals(1, '.') {
            self.next_char(); // consume '.'
            self.next_char(); // consume '.'
            if self.peek_char_and_equals(0, '*') {
                self.next_char(); // consume '*'
                None
            } else {
                let position = self.peek_position(0);
                let max = self.lex_number()?;
                if max < min {
                    return Err(CompileError::InvalidQuantifierRange {
                        min,
                        max,
                        location: position,
                    });
                }
                Some(max)
            }
        } else {
            Some(min)
        };

        Ok(Token::Repetition { min, max })
    }

    fn lex_number(&mut self) -> Result<usize, CompileError> {
        let mut digits = String::new();
        while let Some(c) = self.peek_char(0) {
            if c.is_ascii_digit() {
                digits.push(*c);
                self.next_char();
            } else {
                break;
            }
        }

        digits.parse::<usize>().map_err(|_| {
            CompileError::MessageWithLocation(
                "Expect a repetition count.".to_owned(),
                self.peek_position(0),
            )
        })
    }

    fn lex_colon(&mut self) -> Token {
        // :?
        // ^
        // |__ current char

        self.next_char(); // consume ':'

        if self.peek_char_and_equals(0, ':') {
            self.next_char(); // consume ':'
            if self.peek_char_and_equals(0, ':') {
                self.next_char(); // consume ':'
                return Token::Cut(CutScope::Whole);
            }
            return Token::Cut(CutScope::Group);
        }

        let negated = self.peek_char_and_equals(0, '!')
            && matches!(self.peek_char(1), Some(c) if c.is_alphabetic());
        if negated {
            self.next_char(); // consume '!'
        }

        if matches!(self.peek_char(0), Some(c) if c.is_alphabetic()) {
            let name = self.lex_identifier();
            Token::Modifier { name, negated }
        } else {
            Token::Cut(CutScope::Atom)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        ast::CutScope,
        charset::{shortcut_class, CharClass, CharRange},
        error::CompileError,
        location::Location,
        token::{Token, TokenWithRange},
    };

    use super::lex_from_str;

    fn lex_from_str_without_location(s: &str) -> Result<Vec<Token>, CompileError> {
        let tokens = lex_from_str(s)?
            .into_iter()
            .map(|e| e.token)
            .collect::<Vec<Token>>();
        Ok(tokens)
    }

    #[test]
    fn test_lex_literals_and_spaces() {
        assert_eq!(
            lex_from_str_without_location("ab 'c d' \\.").unwrap(),
            vec![
                Token::Char('a'),
                Token::Char('b'),
                Token::Space,
                Token::String("c d".to_owned()),
                Token::Space,
                Token::Char('.'),
            ]
        );

        assert_eq!(
            lex_from_str_without_location(r#""x\ty" '\''"#).unwrap(),
            vec![
                Token::String("x\ty".to_owned()),
                Token::Space,
                Token::String("'".to_owned()),
            ]
        );

        assert_eq!(
            lex_from_str_without_location("\\x[263A]").unwrap(),
            vec![Token::Char('☺')]
        );
    }

    #[test]
    fn test_lex_location() {
        assert_eq!(
            lex_from_str("a\n  'bc'").unwrap(),
            vec![
                TokenWithRange::new(Token::Char('a'), Location::new_range(0, 0, 0, 1)),
                TokenWithRange::new(Token::Space, Location::new_range(1, 0, 1, 3)),
                TokenWithRange::new(
                    Token::String("bc".to_owned()),
                    Location::new_range(4, 1, 2, 4)
                ),
            ]
        );
    }

    #[test]
    fn test_lex_metacharacters() {
        assert_eq!(
            lex_from_str_without_location("^^.$$|||&&&").unwrap(),
            vec![
                Token::LineStartAssertion,
                Token::Dot,
                Token::LineEndAssertion,
                Token::OrderedAlternation,
                Token::Alternation,
                Token::OrderedConjunction,
                Token::Conjunction,
            ]
        );

        assert_eq!(
            lex_from_str_without_location("<<a>>«»").unwrap(),
            vec![
                Token::WordLeftAssertion,
                Token::Char('a'),
                Token::WordRightAssertion,
                Token::WordLeftAssertion,
                Token::WordRightAssertion,
            ]
        );

        assert!(matches!(
            lex_from_str_without_location("a,b"),
            Err(CompileError::MessageWithLocation(_, _))
        ));

        assert!(matches!(
            lex_from_str_without_location("a { say 1 }"),
            Err(CompileError::MessageWithLocation(_, _))
        ));
    }

    #[test]
    fn test_lex_shortcuts() {
        assert_eq!(
            lex_from_str_without_location("\\d\\S").unwrap(),
            vec![
                Token::CharClass(shortcut_class('d').unwrap()),
                Token::CharClass(shortcut_class('S').unwrap()),
            ]
        );

        assert!(matches!(
            lex_from_str_without_location("\\q"),
            Err(CompileError::MessageWithLocation(_, _))
        ));
    }

    #[test]
    fn test_lex_quantifiers() {
        assert_eq!(
            lex_from_str_without_location("a*?b+!c** 2..5d**3e**1..*").unwrap(),
            vec![
                Token::Char('a'),
                Token::Asterisk,
                Token::Question,
                Token::Char('b'),
                Token::Plus,
                Token::Exclamation,
                Token::Char('c'),
                Token::Repetition {
                    min: 2,
                    max: Some(5)
                },
                Token::Char('d'),
                Token::Repetition {
                    min: 3,
                    max: Some(3)
                },
                Token::Char('e'),
                Token::Repetition { min: 1, max: None },
            ]
        );

        assert!(matches!(
            lex_from_str_without_location("a**5..2"),
            Err(CompileError::InvalidQuantifierRange { min: 5, max: 2, .. })
        ));
    }

    #[test]
    fn test_lex_char_classes() {
        assert_eq!(
            lex_from_str_without_location("<[a..c x]>").unwrap(),
            vec![Token::CharClass(CharClass::new(
                vec![CharRange::new('a', 'c'), CharRange::single('x')],
                false
            ))]
        );

        assert_eq!(
            lex_from_str_without_location("<-[0..9]>").unwrap(),
            vec![Token::CharClass(CharClass::new(
                vec![CharRange::new('0', '9')],
                true
            ))]
        );

        assert_eq!(
            lex_from_str_without_location("<[a..z] - [aeiou]>").unwrap(),
            vec![Token::CharClass(CharClass::new(
                vec![
                    CharRange::new('b', 'd'),
                    CharRange::new('f', 'h'),
                    CharRange::new('j', 'n'),
                    CharRange::new('p', 't'),
                    CharRange::new('v', 'z'),
                ],
                false
            ))]
        );

        assert_eq!(
            lex_from_str_without_location("<+digit + [_]>").unwrap(),
            vec![Token::CharClass(CharClass::new(
                vec![CharRange::new('0', '9'), CharRange::single('_')],
                false
            ))]
        );

        assert!(matches!(
            lex_from_str_without_location("<[abc"),
            Err(CompileError::UnterminatedClass(_))
        ));

        assert!(matches!(
            lex_from_str_without_location("<[a..z] - [aeiou]"),
            Err(CompileError::UnterminatedClass(_))
        ));
    }

    #[test]
    fn test_lex_angles() {
        assert_eq!(
            lex_from_str_without_location("<term><.ws><Calc.expr><num=digit>").unwrap(),
            vec![
                Token::RuleRef {
                    grammar: None,
                    name: "term".to_owned(),
                    alias: None,
                    capture: true
                },
                Token::RuleRef {
                    grammar: None,
                    name: "ws".to_owned(),
                    alias: None,
                    capture: false
                },
                Token::RuleRef {
                    grammar: Some("Calc".to_owned()),
                    name: "expr".to_owned(),
                    alias: None,
                    capture: true
                },
                Token::RuleRef {
                    grammar: None,
                    name: "digit".to_owned(),
                    alias: Some("num".to_owned()),
                    capture: true
                },
            ]
        );

        assert_eq!(
            lex_from_str_without_location("<before \\d>>><!after a>").unwrap(),
            vec![
                Token::LookAround {
                    after: false,
                    negative: false
                },
                Token::Space,
                Token::CharClass(shortcut_class('d').unwrap()),
                Token::AngleEnd,
                Token::WordRightAssertion,
                Token::LookAround {
                    after: true,
                    negative: true
                },
                Token::Space,
                Token::Char('a'),
                Token::AngleEnd,
            ]
        );

        assert_eq!(
            lex_from_str_without_location("$<year>=[\\d] $<m> := (x)").unwrap(),
            vec![
                Token::NamedCapture("year".to_owned()),
                Token::LeftBracket,
                Token::CharClass(shortcut_class('d').unwrap()),
                Token::RightBracket,
                Token::Space,
                Token::NamedCapture("m".to_owned()),
                Token::Space,
                Token::LeftParen,
                Token::Char('x'),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_lex_colons() {
        assert_eq!(
            lex_from_str_without_location("a: b:: c::: :i :!sigspace").unwrap(),
            vec![
                Token::Char('a'),
                Token::Cut(CutScope::Atom),
                Token::Space,
                Token::Char('b'),
                Token::Cut(CutScope::Group),
                Token::Space,
                Token::Char('c'),
                Token::Cut(CutScope::Whole),
                Token::Space,
                Token::Modifier {
                    name: "i".to_owned(),
                    negated: false
                },
                Token::Space,
                Token::Modifier {
                    name: "sigspace".to_owned(),
                    negated: true
                },
            ]
        );
    }

    #[test]
    fn test_lex_comments() {
        assert_eq!(
            lex_from_str_without_location("a # first\nb").unwrap(),
            vec![
                Token::Char('a'),
                Token::Space,
                Token::Comment(" first".to_owned()),
                Token::Space,
                Token::Char('b'),
            ]
        );
    }
}
