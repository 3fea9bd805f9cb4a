//! Interpreter for rtr, a small scripting language for issuing HTTP requests.
//!
//! A program is a sequence of `var`, `print` and `{ ... }` block statements.  Expressions are
//! string and number literals, variable references and request expressions:
//!
//! ```text
//! var base = 'http://localhost:8080/items'
//! var created = req POST base
//!     headers { 'X-Trace': 'abc' }
//!     json { name: 'widget', count: 3 }
//! print created
//! ```
//!
//! Source goes through [`scanner::tokenize`], [`parser::parse`], [`analyzer::analyze`] and is
//! then evaluated.  [`interpreter::Interpreter`] chains all of it.
//!
//! # Limitations
//!
//! - The scanner and parser do not attempt any error recovery.  They bail out on the first
//! encountered error.
//! - Requests are blocking and run one at a time.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod analyzer;
pub mod ast;
pub mod diag;
pub mod eval;
pub mod http;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod token;

pub use interpreter::{Interpreter, RtrError};
