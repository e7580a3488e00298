// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! Command-line front end.
//!
//! Usage:
//!   rgx find `<pattern>` [file] [--adverbs ":g :i"] [--debug]
//!   rgx parse `<grammar-file>` `<grammar>` [file] [--sub]

use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process,
};

use clap::{Parser, Subcommand};
use regex_grammar::{compile, GrammarRegistry, MatchResult, Modifiers};

#[derive(Parser)]
#[command(name = "rgx")]
#[command(version, about = "Match text against Perl 6 style patterns and grammars")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the text for a pattern
    Find {
        pattern: String,

        /// The text file, standard input when omitted
        file: Option<PathBuf>,

        /// Match adverbs, e.g. ":g :i" or ":2nd"
        #[arg(short, long, default_value = "")]
        adverbs: String,

        /// Print the compiled pattern before matching
        #[arg(long)]
        debug: bool,
    },

    /// Parse the text with the `TOP` rule of a grammar
    Parse {
        grammar_file: PathBuf,
        grammar: String,

        /// The text file, standard input when omitted
        file: Option<PathBuf>,

        /// Allow the match to end before the end of the text
        #[arg(long)]
        sub: bool,
    },
}

fn main() {
    let args = Args::parse();

    let found = match args.command {
        Commands::Find {
            pattern,
            file,
            adverbs,
            debug,
        } => handle_find_command(&pattern, file, &adverbs, debug),
        Commands::Parse {
            grammar_file,
            grammar,
            file,
            sub,
        } => handle_parse_command(&grammar_file, &grammar, file, sub),
    };

    match found {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(message) => {
            eprintln!("Error: {}", message);
            process::exit(2);
        }
    }
}

fn read_text(file: Option<PathBuf>) -> Result<String, String> {
    match file {
        Some(path) => fs::read_to_string(&path)
            .map_err(|e| format!("cannot read \"{}\": {}", path.display(), e)),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("cannot read the standard input: {}", e))?;
            Ok(text)
        }
    }
}

fn handle_find_command(
    pattern: &str,
    file: Option<PathBuf>,
    adverbs: &str,
    debug: bool,
) -> Result<bool, String> {
    let modifiers: Modifiers = adverbs.parse().map_err(|e| format!("{}", e))?;
    let regex = compile(pattern, &modifiers).map_err(|e| format!("{}", e))?;

    if debug {
        println!("{}", regex.get_debug_text());
    }

    let text = read_text(file)?;
    let results = regex
        .find_with(&text, &modifiers)
        .map_err(|e| format!("{}", e))?;

    for result in &results {
        print_result(result, 0);
    }
    Ok(!results.is_empty())
}

fn handle_parse_command(
    grammar_file: &PathBuf,
    grammar: &str,
    file: Option<PathBuf>,
    sub: bool,
) -> Result<bool, String> {
    let source = fs::read_to_string(grammar_file)
        .map_err(|e| format!("cannot read \"{}\": {}", grammar_file.display(), e))?;
    let registry = GrammarRegistry::from_source(&source).map_err(|e| format!("{}", e))?;

    let text = read_text(file)?;
    let parsed = if sub {
        registry.subparse(grammar, &text)
    } else {
        registry.parse(grammar, &text)
    };

    match parsed.map_err(|e| format!("{}", e))? {
        Some(result) => {
            print_result(&result, 0);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn print_result(result: &MatchResult, level: usize) {
    let indent = "  ".repeat(level);
    println!(
        "{}[{}, {}) {:?}",
        indent,
        result.start(),
        result.end(),
        result.as_str()
    );

    for index in 0..result.positional_len() {
        if let Some(capture) = result.positional(index) {
            for sub in capture.results() {
                println!("{}  {}:", indent, index);
                print_result(sub, level + 2);
            }
        }
    }

    for name in result.names() {
        if let Some(capture) = result.named(name) {
            for sub in capture.results() {
                println!("{}  <{}>:", indent, name);
                print_result(sub, level + 2);
            }
        }
    }
}
