use std::error::Error;
use std::fmt;

use crate::token::TokenKind;

/// Location of a character in the source.  Both fields start at one.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Malformed character stream.
#[derive(Debug, PartialEq)]
pub struct LexError {
    pub pos: Position,
    pub kind: LexErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum LexErrorKind {
    UnterminatedString,
    UnexpectedChar(char),
    /// Digit span rejected by `f64` parsing.  The scanner only hands over validated spans, so
    /// well-formed input never produces it.
    BadNumber(String),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lex error: {}: ", self.pos)?;
        match &self.kind {
            LexErrorKind::UnterminatedString => write!(f, "unterminated string"),
            LexErrorKind::UnexpectedChar(ch) => write!(f, "unexpected character: {}", ch),
            LexErrorKind::BadNumber(lit) => {
                write!(f, "cannot parse number literal: {}", lit)
            }
        }
    }
}

impl Error for LexError {}

/// Token stream that does not match the grammar.
#[derive(Debug, PartialEq)]
pub struct ParseError {
    /// Line of the offending token.
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken { expected: TokenKind, found: String },
    UnexpectedInStatement(String),
    UnexpectedInExpression(String),
    ExpectedMethod(String),
    ExpectedKey(String),
    DuplicateKey(String),
    UnterminatedBlock,
    /// Blocks or request expressions nested past the given depth.
    TooDeep(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: line {}: ", self.line)?;
        match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "expected '{}', got '{}'", expected, found)
            }
            ParseErrorKind::UnexpectedInStatement(found) => {
                write!(f, "unexpected token in statement position: '{}'", found)
            }
            ParseErrorKind::UnexpectedInExpression(found) => {
                write!(f, "unexpected token in expression position: '{}'", found)
            }
            ParseErrorKind::ExpectedMethod(found) => {
                write!(f, "expected HTTP method, got '{}'", found)
            }
            ParseErrorKind::ExpectedKey(found) => {
                write!(f, "expected identifier or string key, got '{}'", found)
            }
            ParseErrorKind::DuplicateKey(key) => write!(f, "duplicate key '{}' in block", key),
            ParseErrorKind::UnterminatedBlock => write!(f, "missing '}}' before end of input"),
            ParseErrorKind::TooDeep(limit) => {
                write!(f, "nesting deeper than {} levels", limit)
            }
        }
    }
}

impl Error for ParseError {}
