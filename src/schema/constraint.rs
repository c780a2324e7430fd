//! Recursive-descent parser for a single constraint clause.
//!
//! Recognizes:
//! - `[ADD] [CONSTRAINT name] FOREIGN KEY (col) REFERENCES table(col)`
//! - `[ADD] [CONSTRAINT name] CHECK (col IN (v1, v2, ...))`
//!
//! Anything else is reported as skipped rather than failing the document.

use super::lexer::{Lexer, Token};
use super::{EnumCheckConstraint, ForeignKeyConstraint};
use thiserror::Error;

/// A parsed constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    ForeignKey(ForeignKeyConstraint),
    EnumCheck(EnumCheckConstraint),
}

/// Outcome of parsing one constraint clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintLine {
    Parsed {
        name: Option<String>,
        constraint: Constraint,
    },
    Skipped(String),
}

#[derive(Debug, Error)]
enum ClauseError {
    #[error("expected {expected}, found {found:?}")]
    Expected { expected: &'static str, found: Token },
    #[error("composite foreign keys are not supported")]
    CompositeKey,
    #[error("empty value list")]
    EmptyValues,
    #[error("not a FOREIGN KEY or CHECK constraint")]
    Unsupported,
}

/// Parse one constraint clause
pub fn parse_clause(clause: &str) -> ConstraintLine {
    let tokens = Lexer::new(clause).tokenize();
    let mut parser = ClauseParser { tokens, pos: 0 };
    match parser.parse() {
        Ok((name, constraint)) => ConstraintLine::Parsed { name, constraint },
        Err(e) => ConstraintLine::Skipped(e.to_string()),
    }
}

struct ClauseParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ClauseParser {
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ClauseError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(ClauseError::Expected {
                expected,
                found: self.current().clone(),
            })
        }
    }

    fn expect_name(&mut self, expected: &'static str) -> Result<String, ClauseError> {
        match self.current().name_text() {
            Some(name) => {
                self.advance();
                Ok(name)
            }
            None => Err(ClauseError::Expected {
                expected,
                found: self.current().clone(),
            }),
        }
    }

    /// `name ('.' name)*`, returning the last segment
    fn qualified_name(&mut self, expected: &'static str) -> Result<String, ClauseError> {
        let mut name = self.expect_name(expected)?;
        while self.eat(&Token::Dot) {
            name = self.expect_name(expected)?;
        }
        Ok(name)
    }

    fn parse(&mut self) -> Result<(Option<String>, Constraint), ClauseError> {
        self.eat(&Token::Add);

        let name = if self.eat(&Token::Constraint) {
            Some(self.expect_name("constraint name")?)
        } else {
            None
        };

        let constraint = match self.current() {
            Token::Foreign => self.parse_foreign_key()?,
            Token::Check => self.parse_check()?,
            _ => return Err(ClauseError::Unsupported),
        };

        Ok((name, constraint))
    }

    fn parse_foreign_key(&mut self) -> Result<Constraint, ClauseError> {
        self.expect(Token::Foreign, "FOREIGN")?;
        self.expect(Token::Key, "KEY")?;
        let column = self.single_column_list()?;
        self.expect(Token::References, "REFERENCES")?;
        let referenced_table = self.qualified_name("referenced table")?;
        let referenced_column = self.single_column_list()?;

        // Trailing ON DELETE / ON UPDATE actions are accepted and ignored
        Ok(Constraint::ForeignKey(ForeignKeyConstraint {
            column,
            referenced_table,
            referenced_column,
        }))
    }

    fn single_column_list(&mut self) -> Result<String, ClauseError> {
        self.expect(Token::LParen, "'('")?;
        let column = self.qualified_name("column name")?;
        if self.current() == &Token::Comma {
            return Err(ClauseError::CompositeKey);
        }
        self.expect(Token::RParen, "')'")?;
        Ok(column)
    }

    fn parse_check(&mut self) -> Result<Constraint, ClauseError> {
        self.expect(Token::Check, "CHECK")?;
        let wrapped = self.eat(&Token::LParen);
        let column = self.qualified_name("checked column")?;
        self.expect(Token::In, "IN")?;
        let allowed_values = self.value_list()?;
        if wrapped {
            self.expect(Token::RParen, "')'")?;
        }
        Ok(Constraint::EnumCheck(EnumCheckConstraint {
            column,
            allowed_values,
        }))
    }

    fn value_list(&mut self) -> Result<Vec<String>, ClauseError> {
        self.expect(Token::LParen, "'('")?;
        let mut values = Vec::new();
        loop {
            let value = match self.current() {
                Token::Str(s) | Token::Num(s) | Token::Ident(s) => s.clone(),
                Token::RParen if values.is_empty() => return Err(ClauseError::EmptyValues),
                other => match other.name_text() {
                    Some(word) => word,
                    None => {
                        return Err(ClauseError::Expected {
                            expected: "literal value",
                            found: other.clone(),
                        })
                    }
                },
            };
            self.advance();
            values.push(value);

            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen, "')'")?;
        Ok(values)
    }
}
