use std::fmt;

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    VarDecl(String, Expr),
    Print(Expr),
    Block(Vec<Stmt>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Str(String),
    Number(f64),
    Var(String),
    Request(RequestExpr),
}

#[derive(Debug, PartialEq, Clone)]
pub struct RequestExpr {
    pub method: Method,
    pub url: Box<Expr>,
    pub blocks: Vec<RequestBlock>,
}

/// Key/value block trailing a request.  Pairs are kept in declaration order.
#[derive(Debug, PartialEq, Clone)]
pub enum RequestBlock {
    Headers(Vec<(String, Expr)>),
    Json(Vec<(String, Expr)>),
}

impl RequestBlock {
    pub fn pairs(&self) -> &[(String, Expr)] {
        match self {
            RequestBlock::Headers(pairs) | RequestBlock::Json(pairs) => pairs,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
