// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::token::{Token, TokenWithRange};

/// Drops comment tokens. A comment separates atoms just like whitespace
/// does, so the spaces around it collapse into a single `Space`.
pub fn clean(tokens: Vec<TokenWithRange>) -> Vec<TokenWithRange> {
    let mut clean_tokens: Vec<TokenWithRange> = Vec::with_capacity(tokens.len());

    for token_with_range in tokens {
        let token = match token_with_range.token {
            Token::Comment(_) => Token::Space,
            _ => token_with_range.token,
        };

        if token == Token::Space
            && matches!(clean_tokens.last(), Some(TokenWithRange { token: Token::Space, .. }))
        {
            continue;
        }

        clean_tokens.push(TokenWithRange::new(token, token_with_range.range));
    }

    clean_tokens
}
