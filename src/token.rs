use std::fmt;

/// Kind of "word" produced by the scanner.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Eof,

    // Punctuation
    Equal,
    EqualEqual,
    LeftCurly,
    RightCurly,
    LeftParen,
    RightParen,
    Colon,
    Comma,

    // Literals
    String,
    Number,

    Identifier,

    // Keywords
    Var,
    Print,
    Req,
    Headers,
    Json,
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::Equal => write!(f, "="),
            TokenKind::EqualEqual => write!(f, "=="),
            TokenKind::LeftCurly => write!(f, "{{"),
            TokenKind::RightCurly => write!(f, "}}"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::String => write!(f, "string"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Print => write!(f, "print"),
            TokenKind::Req => write!(f, "req"),
            TokenKind::Headers => write!(f, "headers"),
            TokenKind::Json => write!(f, "json"),
            TokenKind::Get => write!(f, "GET"),
            TokenKind::Post => write!(f, "POST"),
            TokenKind::Put => write!(f, "PUT"),
            TokenKind::Delete => write!(f, "DELETE"),
            TokenKind::Patch => write!(f, "PATCH"),
        }
    }
}

/// Decoded value of a literal token.
#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Str(String),
    Number(f64),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    /// Line number (starting at one).
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: &str, line: usize) -> Token {
        Token {
            kind,
            lexeme: lexeme.to_owned(),
            literal: None,
            line,
        }
    }

    pub fn with_literal(kind: TokenKind, lexeme: &str, literal: Literal, line: usize) -> Token {
        Token {
            kind,
            lexeme: lexeme.to_owned(),
            literal: Some(literal),
            line,
        }
    }

    pub fn eof(line: usize) -> Token {
        Token::new(TokenKind::Eof, "", line)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "EOF"),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

/// Return the keyword token kind spelled by `text`, if any.  Keywords are case-sensitive.
pub fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "var" => TokenKind::Var,
        "print" => TokenKind::Print,
        "req" => TokenKind::Req,
        "headers" => TokenKind::Headers,
        "json" => TokenKind::Json,
        "GET" => TokenKind::Get,
        "POST" => TokenKind::Post,
        "PUT" => TokenKind::Put,
        "DELETE" => TokenKind::Delete,
        "PATCH" => TokenKind::Patch,
        _ => return None,
    };
    Some(kind)
}
