//! Tokenizer for constraint clauses (`ADD CONSTRAINT ... FOREIGN KEY` / `CHECK`).

use std::iter::Peekable;
use std::str::Chars;

/// Constraint clause tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Add,
    Constraint,
    Foreign,
    Key,
    References,
    Check,
    In,

    // Identifiers and literals
    Ident(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    Symbol(char),

    // End of input
    Eof,
}

impl Token {
    /// Text of a token usable as a name; keywords count as names too
    pub fn name_text(&self) -> Option<String> {
        match self {
            Token::Ident(s) => Some(s.clone()),
            Token::Add => Some("add".to_string()),
            Token::Constraint => Some("constraint".to_string()),
            Token::Foreign => Some("foreign".to_string()),
            Token::Key => Some("key".to_string()),
            Token::References => Some("references".to_string()),
            Token::Check => Some("check".to_string()),
            Token::In => Some("in".to_string()),
            _ => None,
        }
    }
}

/// Constraint clause lexer.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current_char: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current_char = chars.next();
        Self {
            chars,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.current_char = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    fn read_quoted(&mut self, close: char) -> String {
        self.advance(); // opening quote
        let mut text = String::new();
        while let Some(c) = self.current_char {
            if c == close {
                // Doubled quote is an escaped quote
                if self.peek() == Some(&close) {
                    text.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    break;
                }
            } else {
                text.push(c);
                self.advance();
            }
        }
        text
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        let mut has_dot = false;

        if self.current_char == Some('-') {
            num.push('-');
            self.advance();
        }

        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else if c == '.' && !has_dot {
                has_dot = true;
                num.push(c);
                self.advance();
            } else {
                break;
            }
        }
        num
    }

    fn keyword_or_ident(ident: String) -> Token {
        match ident.to_ascii_uppercase().as_str() {
            "ADD" => Token::Add,
            "CONSTRAINT" => Token::Constraint,
            "FOREIGN" => Token::Foreign,
            "KEY" => Token::Key,
            "REFERENCES" => Token::References,
            "CHECK" => Token::Check,
            "IN" => Token::In,
            _ => Token::Ident(ident),
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(c) = self.current_char else {
            return Token::Eof;
        };

        match c {
            '(' => {
                self.advance();
                Token::LParen
            }
            ')' => {
                self.advance();
                Token::RParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            ';' => {
                self.advance();
                Token::Semicolon
            }
            '.' => {
                self.advance();
                Token::Dot
            }
            '\'' => Token::Str(self.read_quoted('\'')),
            '"' => Token::Ident(self.read_quoted('"')),
            '`' => Token::Ident(self.read_quoted('`')),
            '[' => Token::Ident(self.read_quoted(']')),
            '-' if self.peek().is_some_and(|n| n.is_ascii_digit()) => {
                Token::Num(self.read_number())
            }
            c if c.is_ascii_digit() => Token::Num(self.read_number()),
            c if c.is_alphabetic() || c == '_' => Self::keyword_or_ident(self.read_identifier()),
            other => {
                self.advance();
                Token::Symbol(other)
            }
        }
    }

    /// Tokenize the whole input; the last token is always `Eof`
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }
}
