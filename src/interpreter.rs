//! API to control the interpreter.

use std::error::Error;
use std::fmt;
use std::io::prelude::*;

use tracing::debug_span;

use crate::analyzer::{Analyzer, NameError};
use crate::diag::{LexError, ParseError, ParseErrorKind};
use crate::eval::{Evaluator, RuntimeError};
use crate::http::{HttpConfig, RequestError};
use crate::parser::parse;
use crate::scanner::tokenize;

/// Tree-walk interpreter.
///
/// Each call to [`Interpreter::eval`] scans, parses, checks and runs a piece of source.  Names
/// bound by earlier calls stay visible to later ones.
///
/// # Example
///
/// ```
/// # use rtr::interpreter::{Interpreter, RtrError};
///
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// interp.eval("var greeting = 'hello'")?;
/// interp.eval("print greeting { var greeting = 'bye' print greeting }")?;
/// drop(interp);
///
/// assert_eq!(output, b"hello\nbye\n");
/// # Ok::<(), RtrError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    evaluator: Evaluator<'t, W>,
}

/// Errors the interpreter can raise.
#[derive(Debug)]
pub enum RtrError {
    /// Malformed character stream.
    Lex(LexError),

    /// Token stream not matching the grammar.
    Parse(ParseError),

    /// Redeclared or undefined name.
    Name(NameError),

    /// Network failure while evaluating a request expression.
    Request(RequestError),

    /// Any other error occurring during evaluation.
    Runtime(RuntimeError),
}

impl RtrError {
    /// True when the script itself is fine but the remote end could not be reached or read.
    pub fn is_request_failure(&self) -> bool {
        matches!(self, RtrError::Request(_))
    }

    /// True when the source ended inside a block, so more input could complete it.  Nothing
    /// has been evaluated in that case.
    pub fn is_incomplete_input(&self) -> bool {
        matches!(
            self,
            RtrError::Parse(ParseError {
                kind: ParseErrorKind::UnterminatedBlock,
                ..
            })
        )
    }
}

impl fmt::Display for RtrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtrError::Lex(e) => write!(f, "{}", e),
            RtrError::Parse(e) => write!(f, "{}", e),
            RtrError::Name(e) => write!(f, "{}", e),
            RtrError::Request(e) => write!(f, "{}", e),
            RtrError::Runtime(e) => write!(f, "runtime error: {}", e),
        }
    }
}

impl Error for RtrError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RtrError::Lex(e) => Some(e),
            RtrError::Parse(e) => Some(e),
            RtrError::Name(e) => Some(e),
            RtrError::Request(e) => Some(e),
            RtrError::Runtime(e) => Some(e),
        }
    }
}

impl From<LexError> for RtrError {
    fn from(e: LexError) -> RtrError {
        RtrError::Lex(e)
    }
}

impl From<ParseError> for RtrError {
    fn from(e: ParseError) -> RtrError {
        RtrError::Parse(e)
    }
}

impl From<NameError> for RtrError {
    fn from(e: NameError) -> RtrError {
        RtrError::Name(e)
    }
}

impl From<RuntimeError> for RtrError {
    fn from(e: RuntimeError) -> RtrError {
        match e {
            RuntimeError::Request(e) => RtrError::Request(e),
            e => RtrError::Runtime(e),
        }
    }
}

impl<W: Write> Interpreter<'_, W> {
    pub fn new(output: &mut W) -> Interpreter<'_, W> {
        Interpreter::with_config(output, HttpConfig::default())
    }

    pub fn with_config(output: &mut W, config: HttpConfig) -> Interpreter<'_, W> {
        Interpreter {
            evaluator: Evaluator::new(output, config),
        }
    }

    pub fn eval(&mut self, source: &str) -> Result<(), RtrError> {
        let _span = debug_span!("eval", bytes = source.len()).entered();
        let tokens = tokenize(source)?;
        let prg = parse(tokens)?;
        // Seed from what is actually bound so a failed run never leaves phantom declarations.
        Analyzer::with_globals(self.evaluator.global_names()).analyze_program(&prg)?;
        self.evaluator.eval_stmts_in_global_env(&prg.statements)?;
        Ok(())
    }
}
