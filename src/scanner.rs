//! Lexical analyzer

use tracing::debug;

use crate::diag::{LexError, LexErrorKind, Position};
use crate::token::{keyword, Literal, Token, TokenKind};

/// Turn source text into a sequence of tokens terminated by exactly one `Eof` token.
///
/// The source is processed line by line.  Tokens never span lines.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = vec![];
    let mut last_line = 1;
    for (idx, text) in source.lines().enumerate() {
        let line = idx + 1;
        LineScanner::new(text, line).scan_into(&mut tokens)?;
        last_line = line;
    }
    tokens.push(Token::eof(last_line));
    debug!(count = tokens.len(), lines = last_line, "scanned source");
    Ok(tokens)
}

/// Scanning state for a single line.  A fresh one is created for every line so no cursor
/// leaks from one line to the next.
#[derive(Debug)]
struct LineScanner {
    chars: Vec<char>,
    line: usize,
    // Index of the first character of the token being scanned.
    start: usize,
    // Index of the next character to consume.
    current: usize,
}

impl LineScanner {
    fn new(text: &str, line: usize) -> LineScanner {
        LineScanner {
            chars: text.chars().collect(),
            line,
            start: 0,
            current: 0,
        }
    }

    /// Scan the whole line, appending tokens to `tokens`.
    fn scan_into(mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        while !self.at_end() {
            self.start = self.current;
            if let Some(token) = self.scan_token()? {
                tokens.push(token);
            }
        }
        Ok(())
    }

    fn scan_token(&mut self) -> Result<Option<Token>, LexError> {
        let ch = self.advance();
        let token = match ch {
            ' ' | '\t' | '\r' => return Ok(None),
            '{' => self.token(TokenKind::LeftCurly),
            '}' => self.token(TokenKind::RightCurly),
            '(' => self.token(TokenKind::LeftParen),
            ')' => self.token(TokenKind::RightParen),
            ':' => self.token(TokenKind::Colon),
            ',' => self.token(TokenKind::Comma),
            '=' => {
                if self.matches('=') {
                    self.token(TokenKind::EqualEqual)
                } else {
                    self.token(TokenKind::Equal)
                }
            }
            '/' if self.peek() == Some('/') => {
                // Comment runs to the end of the line.
                self.current = self.chars.len();
                return Ok(None);
            }
            '\'' => self.scan_string()?,
            '0'..='9' => self.scan_number()?,
            c if c.is_alphabetic() => self.scan_identifier(),
            c => return Err(self.error(LexErrorKind::UnexpectedChar(c))),
        };
        Ok(Some(token))
    }

    fn scan_string(&mut self) -> Result<Token, LexError> {
        while let Some(ch) = self.peek() {
            if ch == '\'' {
                break;
            }
            self.advance();
        }
        if self.at_end() {
            return Err(self.error(LexErrorKind::UnterminatedString));
        }
        self.advance();

        let value = self.chars[self.start + 1..self.current - 1]
            .iter()
            .collect::<String>();
        Ok(self.literal_token(TokenKind::String, Literal::Str(value)))
    }

    fn scan_number(&mut self) -> Result<Token, LexError> {
        self.skip_digits();
        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
            self.skip_digits();
        }

        let text = self.lexeme();
        let n = text
            .parse::<f64>()
            .map_err(|_| self.error(LexErrorKind::BadNumber(text.clone())))?;
        Ok(self.literal_token(TokenKind::Number, Literal::Number(n)))
    }

    fn scan_identifier(&mut self) -> Token {
        while self.peek().map_or(false, |c| c.is_alphanumeric()) {
            self.advance();
        }
        let kind = keyword(&self.lexeme()).unwrap_or(TokenKind::Identifier);
        self.token(kind)
    }

    fn skip_digits(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.current];
        self.current += 1;
        ch
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn lexeme(&self) -> String {
        self.chars[self.start..self.current].iter().collect()
    }

    fn token(&self, kind: TokenKind) -> Token {
        Token::new(kind, &self.lexeme(), self.line)
    }

    fn literal_token(&self, kind: TokenKind, literal: Literal) -> Token {
        Token::with_literal(kind, &self.lexeme(), literal, self.line)
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            pos: Position {
                line: self.line,
                column: self.start + 1,
            },
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Result<Vec<TokenKind>, LexError> {
        Ok(tokenize(input)?.into_iter().map(|t| t.kind).collect())
    }

    #[test]
    fn empty_input_yields_single_eof() -> Result<(), LexError> {
        assert_eq!(tokenize("")?, vec![Token::eof(1)]);
        Ok(())
    }

    #[test]
    fn fixed_tokens() -> Result<(), LexError> {
        assert_eq!(
            kinds("= == { } ( ) : ,")?,
            vec![
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::LeftCurly,
                TokenKind::RightCurly,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Eof,
            ]
        );
        Ok(())
    }

    #[test]
    fn keywords() -> Result<(), LexError> {
        assert_eq!(
            kinds("var print req headers json GET POST PUT DELETE PATCH")?,
            vec![
                TokenKind::Var,
                TokenKind::Print,
                TokenKind::Req,
                TokenKind::Headers,
                TokenKind::Json,
                TokenKind::Get,
                TokenKind::Post,
                TokenKind::Put,
                TokenKind::Delete,
                TokenKind::Patch,
                TokenKind::Eof,
            ]
        );
        Ok(())
    }

    #[test]
    fn identifier_with_digits() -> Result<(), LexError> {
        let tokens = tokenize("user42 get")?;
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "user42");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        Ok(())
    }

    #[test]
    fn string_literal() -> Result<(), LexError> {
        let tokens = tokenize("'hello world'")?;
        assert_eq!(
            tokens[0],
            Token::with_literal(
                TokenKind::String,
                "'hello world'",
                Literal::Str("hello world".to_string()),
                1
            )
        );
        Ok(())
    }

    #[test]
    fn unterminated_string() {
        match tokenize("'unterminated") {
            Err(LexError {
                pos: Position { line: 1, column: 1 },
                kind: LexErrorKind::UnterminatedString,
            }) => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn string_cannot_span_lines() {
        assert!(tokenize("'abc\ndef'").is_err());
    }

    #[test]
    fn numbers() -> Result<(), LexError> {
        let tokens = tokenize("42 4.2")?;
        assert_eq!(tokens[0].literal, Some(Literal::Number(42.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(4.2)));
        assert_eq!(tokens[1].lexeme, "4.2");
        Ok(())
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        match tokenize("1.") {
            Err(LexError {
                pos: Position { line: 1, column: 2 },
                kind: LexErrorKind::UnexpectedChar('.'),
            }) => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn comments_and_blanks_are_ignored() -> Result<(), LexError> {
        assert_eq!(
            kinds(" \tprint // var x = 'y'\r\n  // only a comment\n")?,
            vec![TokenKind::Print, TokenKind::Eof]
        );
        Ok(())
    }

    #[test]
    fn lone_slash_is_rejected() {
        assert!(matches!(
            tokenize("a / b"),
            Err(LexError {
                kind: LexErrorKind::UnexpectedChar('/'),
                ..
            })
        ));
    }

    #[test]
    fn unexpected_character_reports_line_and_column() {
        match tokenize("var x = 'a'\nprint #") {
            Err(LexError { pos, kind }) => {
                assert_eq!(pos, Position { line: 2, column: 7 });
                assert_eq!(kind, LexErrorKind::UnexpectedChar('#'));
            }
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn tokens_keep_track_of_lines() -> Result<(), LexError> {
        let lines = tokenize("var\n\nprint x\n")?
            .into_iter()
            .map(|t| t.line)
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 3, 3, 3]);
        Ok(())
    }

    #[test]
    fn lexemes_reconstruct_significant_content() -> Result<(), LexError> {
        let src = "var x = 'hi' // greeting\n{ print x }";
        let joined = tokenize(src)?
            .iter()
            .map(|t| t.lexeme.as_str())
            .collect::<String>();
        assert_eq!(joined, "varx='hi'{printx}");
        Ok(())
    }

    #[test]
    fn request_line() -> Result<(), LexError> {
        assert_eq!(
            kinds("var r = req POST url json { id: 1 }")?,
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Req,
                TokenKind::Post,
                TokenKind::Identifier,
                TokenKind::Json,
                TokenKind::LeftCurly,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::RightCurly,
                TokenKind::Eof,
            ]
        );
        Ok(())
    }
}
