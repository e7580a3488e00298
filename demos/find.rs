// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use regex_grammar::{Modifiers, Regex};

pub fn main() {
    let re = Regex::new(
        r"
        '#'
        $<red>=[<xdigit> ** 2]
        $<green>=[<.xdigit> ** 2]
        $<blue>=[<.xdigit> ** 2]
        ",
    )
    .unwrap();
    let text = "The color is #ffbb33 and the background is #bbdd99.";

    // find one
    match re.find(text).unwrap() {
        Some(m) => println!("Found match: {}", m.as_str()),
        None => println!("No match found"),
    }

    // find all
    for m in re.find_iter(text) {
        let m = m.unwrap();
        println!("Found match: {}", m.as_str());
        println!("Red: {}", m["red"].last().unwrap().as_str());
        println!("Green: {}", m["green"].last().unwrap().as_str());
        println!("Blue: {}", m["blue"].last().unwrap().as_str());
    }

    // the second one only
    let second: Modifiers = ":2nd".parse().unwrap();
    for m in re.find_with(text, &second).unwrap() {
        println!("Second match at {}..{}", m.start(), m.end());
    }

    println!("Compiled: {}", re.get_debug_text());
}
