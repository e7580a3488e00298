// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! Property-based tests for compiling and printing patterns.
//!
//! Printing a compiled pattern and compiling the text again has to give
//! the same tree, and printing is stable after the first pass.

use proptest::prelude::*;
use regex_grammar::{Regex, Span};

/// Generate single atoms
fn atom_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // bare literals
        "[a-z]{1,3}",
        // quoted literals
        "'[a-z0-9 .,+*]{1,4}'",
        Just("\\d".to_owned()),
        Just("\\W".to_owned()),
        Just(".".to_owned()),
        Just("<[a..f] - [c]>".to_owned()),
        Just("<-[0..9]>".to_owned()),
        Just("<alpha>".to_owned()),
        Just("<.ws>".to_owned()),
        Just("^^".to_owned()),
        Just("$$".to_owned()),
    ]
}

/// Generate nested patterns
fn pattern_strategy() -> impl Strategy<Value = String> {
    atom_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop::sample::select(vec!["*", "+", "?", "*?", "+!", " ** 2", " ** 1..3", " :"])
            )
                .prop_map(|(p, q)| format!("[{}]{}", p, q)),
            (inner.clone(), inner.clone()).prop_map(|(p, s)| format!("[{}]+ % [{}]", p, s)),
            prop::collection::vec(inner.clone(), 1..4).prop_map(|items| items.join(" ")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{} | {}", a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{} || {}", a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("[{} && {}]", a, b)),
            inner.clone().prop_map(|p| format!("({})", p)),
            inner.clone().prop_map(|p| format!("$<name>=[{}]", p)),
            inner.clone().prop_map(|p| format!("<!before {}>", p)),
            inner.clone().prop_map(|p| format!("[:i {}]", p)),
            inner.clone().prop_map(|p| format!("[:r {}] ::", p)),
        ]
    })
}

#[cfg(test)]
mod proptest_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_print_and_compile_again(pattern in pattern_strategy()) {
            let regex = Regex::new(&pattern);
            prop_assert!(regex.is_ok(), "Failed to compile: {}", pattern);
            let regex = regex.unwrap();

            let printed = regex.get_debug_text();
            let again = Regex::new(&printed);
            prop_assert!(again.is_ok(), "Failed to compile the printed form: {}", printed);
            let again = again.unwrap();

            prop_assert_eq!(again.node(), regex.node());
            prop_assert_eq!(again.get_debug_text(), printed);
        }

        #[test]
        fn test_literal_matches_itself(text in "[a-zA-Z0-9 ,.!?]{1,12}") {
            let regex = Regex::new(&format!("'{}'", text)).unwrap();
            let result = regex.find(&text).unwrap();

            prop_assert_eq!(
                result.map(|m| m.span()),
                Some(Span::new(0, text.chars().count()))
            );
        }
    }
}
