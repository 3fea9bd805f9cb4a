use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::io;
use std::io::prelude::*;
use std::rc::Rc;

use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::ast::{Expr, RequestBlock, RequestExpr, Stmt};
use crate::http::{HttpClient, HttpConfig, HttpRequest, HttpResponse, RequestError};

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Str(String),
    Number(f64),
    Response(HttpResponse),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Number(_) => "number",
            Value::Response(_) => "response",
        }
    }

    /// JSON rendering used for request bodies and for printing responses.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Str(s) => JsonValue::String(s.clone()),
            // Integral numbers go out as JSON integers: `1`, not `1.0`.
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => JsonValue::from(*n as i64),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Response(resp) => json!({
                "status": resp.status,
                "headers": resp.headers,
                "body": resp.body,
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Response(_) => write!(f, "{}", self.to_json()),
        }
    }
}

#[derive(Debug)]
pub enum RuntimeError {
    UnknownVar(String),
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },
    Request(RequestError),
    Io(io::Error),
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RuntimeError::UnknownVar(_) | RuntimeError::TypeMismatch { .. } => None,
            RuntimeError::Request(e) => Some(e),
            RuntimeError::Io(e) => Some(e),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UnknownVar(v) => write!(f, "unknown variable: {}", v),
            RuntimeError::TypeMismatch {
                context,
                expected,
                found,
            } => write!(f, "type mismatch: {} expects {}, got {}", context, expected, found),
            RuntimeError::Request(e) => write!(f, "{}", e),
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> RuntimeError {
        RuntimeError::Io(e)
    }
}

impl From<RequestError> for RuntimeError {
    fn from(e: RequestError) -> RuntimeError {
        RuntimeError::Request(e)
    }
}

#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
    globals: Rc<Env>,
    http: HttpClient,
}

impl<'a, W: Write> Evaluator<'a, W> {
    pub fn new(output: &'a mut W, config: HttpConfig) -> Evaluator<'a, W> {
        Evaluator {
            output,
            globals: Env::new(),
            http: HttpClient::new(config),
        }
    }

    pub fn eval_stmts_in_global_env(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        self.eval_stmts(stmts, self.globals.clone())
    }

    /// Names bound in the global frame.
    pub fn global_names(&self) -> Vec<String> {
        self.globals.names()
    }

    fn eval_stmts(&mut self, stmts: &[Stmt], env: Rc<Env>) -> Result<(), RuntimeError> {
        for stmt in stmts {
            self.eval_stmt(stmt, env.clone())?
        }
        Ok(())
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: Rc<Env>) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::VarDecl(name, init) => {
                let val = self.eval_expr(init, env.clone())?;
                env.define(name, val);
            }
            Stmt::Print(e) => {
                let v = self.eval_expr(e, env)?;
                writeln!(self.output, "{}", v)?;
            }
            Stmt::Block(stmts) => {
                self.eval_stmts(stmts, Env::with_parent(Some(env)))?;
            }
        };
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr, env: Rc<Env>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Var(name) => env
                .get(name)
                .ok_or_else(|| RuntimeError::UnknownVar(name.clone())),
            Expr::Request(req) => self.eval_request(req, env),
        }
    }

    fn eval_request(&mut self, req: &RequestExpr, env: Rc<Env>) -> Result<Value, RuntimeError> {
        let url = match self.eval_expr(&req.url, env.clone())? {
            Value::Str(s) => s,
            other => {
                return Err(RuntimeError::TypeMismatch {
                    context: format!("{} url", req.method),
                    expected: "string",
                    found: other.type_name(),
                })
            }
        };

        let mut headers = vec![];
        let mut json: Option<JsonMap<String, JsonValue>> = None;
        for block in &req.blocks {
            match block {
                RequestBlock::Headers(pairs) => {
                    for (name, expr) in pairs {
                        let value = match self.eval_expr(expr, env.clone())? {
                            v @ (Value::Str(_) | Value::Number(_)) => v.to_string(),
                            other => {
                                return Err(RuntimeError::TypeMismatch {
                                    context: format!("header '{}'", name),
                                    expected: "string or number",
                                    found: other.type_name(),
                                })
                            }
                        };
                        headers.push((name.clone(), value));
                    }
                }
                RequestBlock::Json(pairs) => {
                    let fields = json.get_or_insert_with(JsonMap::new);
                    for (name, expr) in pairs {
                        let value = self.eval_expr(expr, env.clone())?;
                        fields.insert(name.clone(), value.to_json());
                    }
                }
            }
        }

        let body = json.map(|fields| JsonValue::Object(fields).to_string());
        if body.is_some()
            && !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        let resp = self.http.send(&HttpRequest {
            method: req.method,
            url,
            headers,
            body,
        })?;
        Ok(Value::Response(resp))
    }
}

/// Runtime frame.  Blocks get a child frame that is dropped when they end.
#[derive(Debug)]
struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<HashMap<String, Value>>,
}

impl Env {
    fn new() -> Rc<Env> {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Rc<Env>>) -> Rc<Env> {
        Rc::new(Env {
            parent,
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Bind `name` in this frame.  Last write wins.
    fn define(&self, name: &str, val: Value) {
        self.bindings.borrow_mut().insert(name.to_owned(), val);
    }

    fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.borrow().get(name) {
            Some(v) => Some(v.clone()),
            None => self.parent.as_ref().and_then(|p| p.get(name)),
        }
    }

    fn names(&self) -> Vec<String> {
        self.bindings.borrow().keys().cloned().collect()
    }
}
