use tracing::debug;

use crate::ast::{Expr, Method, Program, RequestBlock, RequestExpr, Stmt};
use crate::diag::{ParseError, ParseErrorKind};
use crate::token::{Literal, Token, TokenKind};

/// Maximum nesting of blocks and expressions.  Analysis and evaluation recurse along the same
/// tree, so this bounds their stack use too.
pub const MAX_DEPTH: usize = 256;

/// Build the syntax tree of a whole program.
pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse_program()
}

/// Recursive descent parser with a single token of lookahead.
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Parser {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::eof(line));
        }
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = vec![];
        while self.current().kind != TokenKind::Eof {
            statements.push(self.parse_statement()?);
        }
        debug!(statements = statements.len(), "parsed program");
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current().kind {
            TokenKind::Var => self.parse_var_declaration(),
            TokenKind::Print => self.parse_print_statement(),
            TokenKind::LeftCurly => self.nested(Parser::parse_block_statement),
            _ => Err(self.error(ParseErrorKind::UnexpectedInStatement(
                self.current().to_string(),
            ))),
        }
    }

    /// Current token is `var`.
    fn parse_var_declaration(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let name = self.expect(TokenKind::Identifier)?.lexeme;
        self.expect(TokenKind::Equal)?;
        let value = self.parse_expression()?;
        Ok(Stmt::VarDecl(name, value))
    }

    fn parse_print_statement(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        Ok(Stmt::Print(self.parse_expression()?))
    }

    fn parse_block_statement(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LeftCurly)?;
        let mut stmts = vec![];
        loop {
            match self.current().kind {
                TokenKind::RightCurly => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => return Err(self.error(ParseErrorKind::UnterminatedBlock)),
                _ => stmts.push(self.parse_statement()?),
            }
        }
        Ok(Stmt::Block(stmts))
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().clone();
        match (token.kind, token.literal) {
            (TokenKind::String, Some(Literal::Str(s))) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            (TokenKind::Number, Some(Literal::Number(n))) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            (TokenKind::Identifier, _) => {
                self.advance();
                Ok(Expr::Var(token.lexeme))
            }
            (TokenKind::Req, _) => self.nested(Parser::parse_request_expression),
            _ => Err(self.error(ParseErrorKind::UnexpectedInExpression(
                self.current().to_string(),
            ))),
        }
    }

    /// Current token is `req`.
    fn parse_request_expression(&mut self) -> Result<Expr, ParseError> {
        self.advance();
        let method = match self.current().kind {
            TokenKind::Get => Method::Get,
            TokenKind::Post => Method::Post,
            TokenKind::Put => Method::Put,
            TokenKind::Delete => Method::Delete,
            TokenKind::Patch => Method::Patch,
            _ => {
                return Err(self.error(ParseErrorKind::ExpectedMethod(
                    self.current().to_string(),
                )))
            }
        };
        self.advance();
        let url = Box::new(self.parse_expression()?);

        let mut blocks = vec![];
        loop {
            match self.current().kind {
                TokenKind::Headers => {
                    self.advance();
                    blocks.push(RequestBlock::Headers(self.parse_pairs()?));
                }
                TokenKind::Json => {
                    self.advance();
                    blocks.push(RequestBlock::Json(self.parse_pairs()?));
                }
                _ => break,
            }
        }
        Ok(Expr::Request(RequestExpr {
            method,
            url,
            blocks,
        }))
    }

    /// Parse `{ key: expr, ... }`.  The comma after a pair is optional.
    fn parse_pairs(&mut self) -> Result<Vec<(String, Expr)>, ParseError> {
        self.expect(TokenKind::LeftCurly)?;
        let mut pairs: Vec<(String, Expr)> = vec![];
        loop {
            let token = self.current().clone();
            let key = match (token.kind, token.literal) {
                (TokenKind::RightCurly, _) => {
                    self.advance();
                    break;
                }
                (TokenKind::Eof, _) => return Err(self.error(ParseErrorKind::UnterminatedBlock)),
                (TokenKind::Identifier, _) => token.lexeme,
                (TokenKind::String, Some(Literal::Str(s))) => s,
                _ => return Err(self.error(ParseErrorKind::ExpectedKey(token.lexeme))),
            };
            if pairs.iter().any(|(k, _)| *k == key) {
                return Err(self.error(ParseErrorKind::DuplicateKey(key)));
            }
            self.advance();
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            pairs.push((key, value));
            if self.current().kind == TokenKind::Comma {
                self.advance();
            }
        }
        Ok(pairs)
    }

    fn nested<T>(
        &mut self,
        rule: fn(&mut Parser) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(ParseErrorKind::TooDeep(MAX_DEPTH)));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Move to the next token and return the one just passed.  Never moves past `Eof`.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        if self.current().kind == expected {
            Ok(self.advance())
        } else {
            Err(self.error(ParseErrorKind::UnexpectedToken {
                expected,
                found: self.current().to_string(),
            }))
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.current().line,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::tokenize;

    fn parse_prg(input: &str) -> Result<Vec<Stmt>, Box<dyn std::error::Error>> {
        Ok(parse(tokenize(input)?)?.statements)
    }

    fn parse_err(input: &str) -> ParseError {
        let tokens = tokenize(input).expect("input should scan");
        match parse(tokens) {
            Err(e) => e,
            Ok(p) => panic!("unexpected success: {:?}", p),
        }
    }

    fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    fn string(s: &str) -> Expr {
        Expr::Str(s.to_string())
    }

    #[test]
    fn var_decl() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            parse_prg("var x = 'hi'")?,
            vec![Stmt::VarDecl("x".to_string(), string("hi"))]
        );
        Ok(())
    }

    #[test]
    fn statements_need_no_separator() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            parse_prg("var x = 'a' var y = x print 3")?,
            vec![
                Stmt::VarDecl("x".to_string(), string("a")),
                Stmt::VarDecl("y".to_string(), var("x")),
                Stmt::Print(Expr::Number(3.0)),
            ]
        );
        Ok(())
    }

    #[test]
    fn nested_blocks() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            parse_prg("{ } { print x { } }")?,
            vec![
                Stmt::Block(vec![]),
                Stmt::Block(vec![Stmt::Print(var("x")), Stmt::Block(vec![])]),
            ]
        );
        Ok(())
    }

    #[test]
    fn unterminated_block() {
        let e = parse_err("{\n print x\n");
        assert_eq!(e.kind, ParseErrorKind::UnterminatedBlock);
        assert_eq!(e.line, 2);
    }

    #[test]
    fn missing_equal() {
        let e = parse_err("var x 'a'");
        assert_eq!(
            e.kind,
            ParseErrorKind::UnexpectedToken {
                expected: TokenKind::Equal,
                found: "'a'".to_string()
            }
        );
    }

    #[test]
    fn missing_name() {
        let e = parse_err("var = 'a'");
        assert!(matches!(
            e.kind,
            ParseErrorKind::UnexpectedToken {
                expected: TokenKind::Identifier,
                ..
            }
        ));
    }

    #[test]
    fn bad_statement_start() {
        assert_eq!(
            parse_err("x").kind,
            ParseErrorKind::UnexpectedInStatement("x".to_string())
        );
    }

    #[test]
    fn bad_expression_start() {
        assert_eq!(
            parse_err("print }").kind,
            ParseErrorKind::UnexpectedInExpression("}".to_string())
        );
        assert_eq!(
            parse_err("print").kind,
            ParseErrorKind::UnexpectedInExpression("EOF".to_string())
        );
    }

    #[test]
    fn simple_request() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            parse_prg("var r = req GET 'http://localhost/'")?,
            vec![Stmt::VarDecl(
                "r".to_string(),
                Expr::Request(RequestExpr {
                    method: Method::Get,
                    url: Box::new(string("http://localhost/")),
                    blocks: vec![],
                })
            )]
        );
        Ok(())
    }

    #[test]
    fn request_methods() -> Result<(), Box<dyn std::error::Error>> {
        for (src, method) in [
            ("GET", Method::Get),
            ("POST", Method::Post),
            ("PUT", Method::Put),
            ("DELETE", Method::Delete),
            ("PATCH", Method::Patch),
        ] {
            match parse_prg(&format!("print req {} url", src))?.as_slice() {
                [Stmt::Print(Expr::Request(r))] => assert_eq!(r.method, method),
                other => panic!("unexpected output: {:?}", other),
            }
        }
        Ok(())
    }

    #[test]
    fn request_without_method() {
        assert_eq!(
            parse_err("print req 'http://x'").kind,
            ParseErrorKind::ExpectedMethod("'http://x'".to_string())
        );
    }

    #[test]
    fn request_with_blocks_in_any_order() -> Result<(), Box<dyn std::error::Error>> {
        let src = r#"
            var r = req POST url
                json { name: 'rtr', 'count': 2, }
                headers { 'X-Token': token accept: 'application/json' }
        "#;
        assert_eq!(
            parse_prg(src)?,
            vec![Stmt::VarDecl(
                "r".to_string(),
                Expr::Request(RequestExpr {
                    method: Method::Post,
                    url: Box::new(var("url")),
                    blocks: vec![
                        RequestBlock::Json(vec![
                            ("name".to_string(), string("rtr")),
                            ("count".to_string(), Expr::Number(2.0)),
                        ]),
                        RequestBlock::Headers(vec![
                            ("X-Token".to_string(), var("token")),
                            ("accept".to_string(), string("application/json")),
                        ]),
                    ],
                })
            )]
        );
        Ok(())
    }

    #[test]
    fn request_value_can_be_a_request() -> Result<(), Box<dyn std::error::Error>> {
        match parse_prg("print req POST u json { inner: req GET v }")?.as_slice() {
            [Stmt::Print(Expr::Request(r))] => match r.blocks[0].pairs() {
                [(key, Expr::Request(inner))] => {
                    assert_eq!(key, "inner");
                    assert_eq!(inner.method, Method::Get);
                }
                other => panic!("unexpected output: {:?}", other),
            },
            other => panic!("unexpected output: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn duplicate_key_in_block() {
        assert_eq!(
            parse_err("print req GET u headers { a: 'x', a: 'y' }").kind,
            ParseErrorKind::DuplicateKey("a".to_string())
        );
    }

    #[test]
    fn unterminated_request_block() {
        assert_eq!(
            parse_err("print req GET u json { a: 'x'").kind,
            ParseErrorKind::UnterminatedBlock
        );
    }

    #[test]
    fn bad_block_key() {
        assert_eq!(
            parse_err("print req GET u json { 1: 'x' }").kind,
            ParseErrorKind::ExpectedKey("1".to_string())
        );
    }

    #[test]
    fn missing_colon_in_block() {
        assert!(matches!(
            parse_err("print req GET u json { a 'x' }").kind,
            ParseErrorKind::UnexpectedToken {
                expected: TokenKind::Colon,
                ..
            }
        ));
    }

    #[test]
    fn tokens_without_eof_still_parse() -> Result<(), ParseError> {
        let tokens = vec![
            Token::new(TokenKind::Print, "print", 1),
            Token::new(TokenKind::Identifier, "x", 1),
        ];
        assert_eq!(parse(tokens)?.statements, vec![Stmt::Print(var("x"))]);
        Ok(())
    }

    #[test]
    fn parsing_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
        let tokens = tokenize("var a = 'x' { print req PUT a headers { k: a } }")?;
        assert_eq!(parse(tokens.clone())?, parse(tokens)?);
        Ok(())
    }

    #[test]
    fn nesting_up_to_the_limit() -> Result<(), Box<dyn std::error::Error>> {
        let src = format!("{}{}", "{".repeat(MAX_DEPTH), "}".repeat(MAX_DEPTH));
        assert_eq!(parse_prg(&src)?.len(), 1);
        Ok(())
    }

    #[test]
    fn blocks_nested_too_deep() {
        let src = format!("{}{}", "{".repeat(2000), "}".repeat(2000));
        assert_eq!(parse_err(&src).kind, ParseErrorKind::TooDeep(MAX_DEPTH));
    }

    #[test]
    fn requests_nested_too_deep() {
        let src = format!("print {}'u'", "req GET ".repeat(MAX_DEPTH + 1));
        assert_eq!(parse_err(&src).kind, ParseErrorKind::TooDeep(MAX_DEPTH));
    }
}
