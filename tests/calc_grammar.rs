// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use pretty_assertions::assert_eq;
use regex_grammar::{GrammarRegistry, Modifiers, Regex, Span};

const CALC: &str = r#"
# arithmetic with the usual precedence
grammar Calc {
    rule TOP { <expr> }
    rule expr { <term>+ % [<.ws> <add_op> <.ws>] }
    rule term { <factor>+ % [<.ws> <mul_op> <.ws>] }
    rule factor { <number> | '(' <expr> ')' }
    token add_op { '+' | '-' }
    token mul_op { '*' | '/' }
    token number { \d+ }
}
"#;

#[test]
fn test_calc_accepts_expressions() {
    let registry = GrammarRegistry::from_source(CALC).unwrap();

    let result = registry.parse("Calc", "3+5*2").unwrap().unwrap();
    assert_eq!(result.span(), Span::new(0, 5));

    let expr = result["expr"].last().unwrap();
    assert_eq!(expr["term"].spans(), vec![Span::new(0, 1), Span::new(2, 5)]);
    assert_eq!(expr["add_op"].last().unwrap().as_str(), "+");

    let product = &expr["term"].results()[1];
    assert_eq!(
        product.named_spans("factor"),
        Some(vec![Span::new(2, 3), Span::new(4, 5)])
    );

    for text in ["42", "(1+2)*3", "((7))", "1 + 2 * (3 - 4) / 5"] {
        assert!(
            registry.parse("Calc", text).unwrap().is_some(),
            "rejected {}",
            text
        );
    }
}

#[test]
fn test_calc_rejects_malformed() {
    let registry = GrammarRegistry::from_source(CALC).unwrap();

    for text in ["3+*2", "", "(1+2", "1+2)", "3+", "*"] {
        assert_eq!(registry.parse("Calc", text), Ok(None), "accepted {}", text);
    }

    // a prefix is still an expression
    let result = registry.subparse("Calc", "3+5)").unwrap().unwrap();
    assert_eq!(result.span(), Span::new(0, 3));
}

#[test]
fn test_calc_rules_as_patterns() {
    let registry = GrammarRegistry::from_source(CALC).unwrap();

    let number = registry.regex("Calc", "number").unwrap();
    let found = number
        .find_with("x 12 y 345", &Modifiers::new().with_global(true))
        .unwrap();
    assert_eq!(
        found.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
        vec!["12", "345"]
    );

    let re = Regex::with_grammar(
        "'=' <.ws> <expr>",
        &registry,
        "Calc",
        &Modifiers::default(),
    )
    .unwrap();
    let result = re.find("x = (2+3)*4;").unwrap().unwrap();
    assert_eq!(result.named("expr").unwrap().last().unwrap().as_str(), "(2+3)*4");
}
