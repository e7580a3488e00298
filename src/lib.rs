// Copyright (c) 2024 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

mod charwithposition;
mod commentremover;
mod context;
mod grammarparser;
mod input;
mod lexer;
mod parser;
mod peekableiter;
mod printer;
mod process;
mod token;

pub mod ast;
pub mod charset;
pub mod error;
pub mod grammar;
pub mod location;
pub mod matchresult;
pub mod modifier;
pub mod regex;

pub use error::{CompileError, Error, MatchError};
pub use grammar::{GrammarBuilder, GrammarRegistry};
pub use matchresult::{Capture, MatchResult, Span};
pub use modifier::{CancelToken, Granularity, Modifiers};
pub use regex::{compile, Matches, Regex};
