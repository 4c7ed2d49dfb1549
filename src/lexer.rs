//! Lexical analysis for Q/Hermes.
//!
//! Contains [`Lexer`], a byte-oriented scanner over UTF-8 source text. [`Lexer`] implements
//! [`Iterator`], yielding [`Token`]s and yielding [`TokenKind::Eof`] forever once the source is
//! exhausted.
//!
//! # Example
//!
//! ```
//! use hermes::lexer::Lexer;
//! use hermes::token::TokenKind;
//!
//! let tokens: Vec<_> = Lexer::new("var x = 1 + 2;")
//!     .map(|tok| tok.kind)
//!     .take_while(|&kind| kind != TokenKind::Eof)
//!     .collect();
//!
//! use TokenKind::*;
//! assert_eq!(vec![Var, Ident, Assign, Int, Plus, Int, Semicolon], tokens);
//! ```

use crate::token::{lookup_ident, Token, TokenKind};

/// Scans Q/Hermes source code and iteratively yields [`Token`]s.
///
/// The lexer is byte-oriented: it never needs to look at more than one byte of lookahead, and
/// every token the grammar recognizes is ASCII, so indexing the source by byte offset is safe
/// even though the source is arbitrary UTF-8 text (non-ASCII bytes never appear inside a valid
/// token and are reported as `Illegal`).
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    /// Start scanning the given string of source code.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            input: source.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn current(&self) -> u8 {
        self.input.get(self.pos).copied().unwrap_or(0)
    }

    fn peek(&self) -> u8 {
        self.input.get(self.pos + 1).copied().unwrap_or(0)
    }

    fn advance(&mut self) {
        if self.current() == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r') {
            self.advance();
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while pred(self.current()) {
            self.advance();
        }
        std::str::from_utf8(&self.input[start..self.pos]).expect("ASCII identifier/digit run")
    }

    /// Scans and returns the next [`Token`]. Once the input is exhausted, returns
    /// `Token { kind: TokenKind::Eof, .. }` forever.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let line = self.line;
        let ch = self.current();

        if ch == 0 {
            return Token::new(TokenKind::Eof, "", line);
        }

        macro_rules! two_char {
            ($expected:expr, $two:expr, $lit2:expr, $one:expr, $lit1:expr) => {{
                if self.peek() == $expected {
                    self.advance();
                    self.advance();
                    Token::new($two, $lit2, line)
                } else {
                    self.advance();
                    Token::new($one, $lit1, line)
                }
            }};
        }

        let tok = match ch {
            b'=' => two_char!(b'=', TokenKind::Eq, "==", TokenKind::Assign, "="),
            b'!' => two_char!(b'=', TokenKind::NotEq, "!=", TokenKind::Bang, "!"),
            b'<' => two_char!(b'=', TokenKind::LtEq, "<=", TokenKind::Lt, "<"),
            b'>' => two_char!(b'=', TokenKind::GtEq, ">=", TokenKind::Gt, ">"),
            b'&' => {
                if self.peek() == b'&' {
                    self.advance();
                    self.advance();
                    Token::new(TokenKind::And, "&&", line)
                } else {
                    self.advance();
                    Token::new(TokenKind::Illegal, "&", line)
                }
            }
            b'|' => {
                if self.peek() == b'|' {
                    self.advance();
                    self.advance();
                    Token::new(TokenKind::Or, "||", line)
                } else {
                    self.advance();
                    Token::new(TokenKind::Illegal, "|", line)
                }
            }
            b'+' => {
                self.advance();
                Token::new(TokenKind::Plus, "+", line)
            }
            b'-' => {
                self.advance();
                Token::new(TokenKind::Minus, "-", line)
            }
            b'*' => {
                self.advance();
                Token::new(TokenKind::Star, "*", line)
            }
            b'/' => {
                self.advance();
                Token::new(TokenKind::Slash, "/", line)
            }
            b'%' => {
                self.advance();
                Token::new(TokenKind::Percent, "%", line)
            }
            b',' => {
                self.advance();
                Token::new(TokenKind::Comma, ",", line)
            }
            b';' => {
                self.advance();
                Token::new(TokenKind::Semicolon, ";", line)
            }
            b'(' => {
                self.advance();
                Token::new(TokenKind::LParen, "(", line)
            }
            b')' => {
                self.advance();
                Token::new(TokenKind::RParen, ")", line)
            }
            b'{' => {
                self.advance();
                Token::new(TokenKind::LBrace, "{", line)
            }
            b'}' => {
                self.advance();
                Token::new(TokenKind::RBrace, "}", line)
            }
            _ if is_letter(ch) => {
                let literal = self.read_while(is_letter);
                Token::new(lookup_ident(literal), literal, line)
            }
            _ if ch.is_ascii_digit() => {
                let literal = self.read_while(|b| b.is_ascii_digit());
                Token::new(TokenKind::Int, literal, line)
            }
            other => {
                self.advance();
                Token::new(TokenKind::Illegal, (other as char).to_string(), line)
            }
        };

        log::trace!("lexed {:?} {:?} at line {}", tok.kind, tok.literal, tok.line);
        tok
    }
}

fn is_letter(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        Some(self.next_token())
    }
}
