// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use regex_grammar::{GrammarRegistry, MatchResult};

const CALC: &str = r#"
grammar Calc {
    rule TOP { <expr> }
    rule expr { <term>+ % [<.ws> <add_op> <.ws>] }
    rule term { <factor>+ % [<.ws> <mul_op> <.ws>] }
    rule factor { <number> | '(' <expr> ')' }
    token add_op { '+' | '-' }
    token mul_op { '*' | '/' }
    token number { \d+ [ '.' \d+ ]? }
}
"#;

fn results<'a>(m: &'a MatchResult, name: &str) -> &'a [MatchResult] {
    m.named(name).map(|c| c.results()).unwrap_or(&[])
}

fn eval_expr(m: &MatchResult) -> f64 {
    let terms = results(m, "term");
    let ops = results(m, "add_op");

    let mut value = eval_term(&terms[0]);
    for (op, term) in ops.iter().zip(&terms[1..]) {
        match op.as_str() {
            "+" => value += eval_term(term),
            _ => value -= eval_term(term),
        }
    }
    value
}

fn eval_term(m: &MatchResult) -> f64 {
    let factors = results(m, "factor");
    let ops = results(m, "mul_op");

    let mut value = eval_factor(&factors[0]);
    for (op, factor) in ops.iter().zip(&factors[1..]) {
        match op.as_str() {
            "*" => value *= eval_factor(factor),
            _ => value /= eval_factor(factor),
        }
    }
    value
}

fn eval_factor(m: &MatchResult) -> f64 {
    match results(m, "number").first() {
        Some(number) => number.as_str().parse().unwrap(),
        None => eval_expr(&results(m, "expr")[0]),
    }
}

pub fn main() {
    let registry = GrammarRegistry::from_source(CALC).unwrap();

    for text in ["3+5*2", "(1 + 2) * 4 / 3", "3+*2"] {
        match registry.parse("Calc", text).unwrap() {
            Some(m) => println!("{} = {}", text, eval_expr(&results(&m, "expr")[0])),
            None => println!("{} is not an expression", text),
        }
    }
}
