//! Static name resolution.
//!
//! Runs once over the whole program before evaluation starts and bails out on the first
//! redeclared or undefined name.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use tracing::debug;

use crate::ast::{Expr, Program, Stmt};

#[derive(Debug, PartialEq)]
pub enum NameError {
    AlreadyDefined(String),
    Undefined(String),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::AlreadyDefined(name) => {
                write!(f, "name error: variable '{}' is already defined", name)
            }
            NameError::Undefined(name) => write!(f, "name error: undefined variable '{}'", name),
        }
    }
}

impl Error for NameError {}

/// Names visible at some point of the program.  The enclosing scope is borrowed, never owned.
#[derive(Debug, Default)]
pub struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    names: HashSet<String>,
}

impl<'p> Scope<'p> {
    pub fn new() -> Scope<'static> {
        Scope {
            parent: None,
            names: HashSet::new(),
        }
    }

    pub fn with_parent(parent: &'p Scope<'p>) -> Scope<'p> {
        Scope {
            parent: Some(parent),
            names: HashSet::new(),
        }
    }

    pub fn define(&mut self, name: &str) -> Result<(), NameError> {
        if self.names.insert(name.to_owned()) {
            Ok(())
        } else {
            Err(NameError::AlreadyDefined(name.to_owned()))
        }
    }

    pub fn resolve(&self, name: &str) -> bool {
        self.names.contains(name) || self.parent.map_or(false, |p| p.resolve(name))
    }
}

/// Check `program` against an empty top-level scope.
pub fn analyze(program: &Program) -> Result<(), NameError> {
    Analyzer::new().analyze_program(program)
}

#[derive(Debug, Default)]
pub struct Analyzer {
    globals: Scope<'static>,
}

impl Analyzer {
    pub fn new() -> Analyzer {
        Analyzer::default()
    }

    /// Creates an analyzer whose top-level scope already knows `names`.
    pub fn with_globals<I>(names: I) -> Analyzer
    where
        I: IntoIterator<Item = String>,
    {
        Analyzer {
            globals: Scope {
                parent: None,
                names: names.into_iter().collect(),
            },
        }
    }

    pub fn analyze_program(&mut self, program: &Program) -> Result<(), NameError> {
        analyze_stmts(&program.statements, &mut self.globals)?;
        debug!(globals = self.globals.names.len(), "name resolution done");
        Ok(())
    }
}

fn analyze_stmts(stmts: &[Stmt], scope: &mut Scope<'_>) -> Result<(), NameError> {
    for stmt in stmts {
        analyze_stmt(stmt, scope)?;
    }
    Ok(())
}

fn analyze_stmt(stmt: &Stmt, scope: &mut Scope<'_>) -> Result<(), NameError> {
    match stmt {
        Stmt::VarDecl(name, init) => {
            // Initializer first: `var x = x` must not see the new `x`.
            analyze_expr(init, scope)?;
            scope.define(name)
        }
        Stmt::Print(expr) => analyze_expr(expr, scope),
        Stmt::Block(stmts) => {
            let mut inner = Scope::with_parent(scope);
            analyze_stmts(stmts, &mut inner)
        }
    }
}

fn analyze_expr(expr: &Expr, scope: &Scope<'_>) -> Result<(), NameError> {
    match expr {
        Expr::Str(_) | Expr::Number(_) => Ok(()),
        Expr::Var(name) => {
            if scope.resolve(name) {
                Ok(())
            } else {
                Err(NameError::Undefined(name.clone()))
            }
        }
        Expr::Request(req) => {
            analyze_expr(&req.url, scope)?;
            for block in &req.blocks {
                for (_, value) in block.pairs() {
                    analyze_expr(value, scope)?;
                }
            }
            Ok(())
        }
    }
}
