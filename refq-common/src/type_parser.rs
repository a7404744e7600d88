// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Parser for the reference engine's textual type names
//!
//! Accepts what the engine reports in result column metadata, e.g.
//! `bigint`, `varchar(10)`, `decimal(12,2)`, `array(map(varchar,double))`,
//! `row("a" bigint, b row(c date))` or `interval day to second`.

use crate::error::{ReferenceError, Result};
use crate::types::{RowType, Type};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Number(u32),
    LParen,
    RParen,
    Comma,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '"' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            name.push('"');
                        }
                        Some('"') => break,
                        Some(other) => name.push(other),
                        None => {
                            return Err(ReferenceError::TypeParse(format!(
                                "unterminated quoted identifier in '{}'",
                                text
                            )))
                        }
                    }
                }
                tokens.push(Token::Quoted(name));
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                let number = digits.parse::<u32>().map_err(|e| {
                    ReferenceError::TypeParse(format!("invalid number '{}': {}", digits, e))
                })?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&w) = chars.peek() {
                    if !(w.is_alphanumeric() || w == '_') {
                        break;
                    }
                    word.push(w);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            other => {
                return Err(ReferenceError::TypeParse(format!(
                    "unexpected character '{}' in '{}'",
                    other, text
                )))
            }
        }
    }

    Ok(tokens)
}

struct TypeParser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn error(&self, message: impl Into<String>) -> ReferenceError {
        ReferenceError::TypeParse(format!("{} in '{}'", message.into(), self.text))
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(self.error(format!("expected {:?}, found {:?}", expected, other))),
        }
    }

    fn expect_word(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Word(word)) => Ok(word.to_lowercase()),
            other => Err(self.error(format!("expected a type name, found {:?}", other))),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        let word = self.expect_word()?;
        if word == keyword {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found '{}'", keyword, word)))
        }
    }

    fn expect_number(&mut self) -> Result<u32> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            other => Err(self.error(format!("expected a number, found {:?}", other))),
        }
    }

    /// Skips an optional `(n)` length suffix.
    fn skip_length(&mut self) -> Result<()> {
        if self.peek() == Some(&Token::LParen) {
            self.next();
            self.expect_number()?;
            self.expect(Token::RParen)?;
        }
        Ok(())
    }

    fn parse_type(&mut self) -> Result<Type> {
        let word = self.expect_word()?;
        let ty = match word.as_str() {
            "boolean" => Type::Boolean,
            "tinyint" => Type::TinyInt,
            "smallint" => Type::SmallInt,
            "integer" | "int" => Type::Integer,
            "bigint" => Type::BigInt,
            "hugeint" => Type::HugeInt,
            "real" => Type::Real,
            "double" => {
                if matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case("precision")) {
                    self.next();
                }
                Type::Double
            }
            "varchar" | "char" => {
                self.skip_length()?;
                Type::Varchar
            }
            "varbinary" => Type::Varbinary,
            "date" => Type::Date,
            "timestamp" => {
                if matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case("with")) {
                    return Err(self.error("timestamp with time zone is not supported"));
                }
                Type::Timestamp
            }
            "decimal" => {
                if self.peek() == Some(&Token::LParen) {
                    self.next();
                    let precision = self.expect_number()?;
                    let scale = if self.peek() == Some(&Token::Comma) {
                        self.next();
                        self.expect_number()?
                    } else {
                        0
                    };
                    self.expect(Token::RParen)?;
                    if precision == 0 || precision > 38 || scale > precision {
                        return Err(self.error(format!(
                            "invalid decimal precision/scale ({}, {})",
                            precision, scale
                        )));
                    }
                    Type::Decimal {
                        precision: precision as u8,
                        scale: scale as u8,
                    }
                } else {
                    Type::Decimal { precision: 38, scale: 0 }
                }
            }
            "interval" => {
                let from = self.expect_word()?;
                self.expect_keyword("to")?;
                let to = self.expect_word()?;
                match (from.as_str(), to.as_str()) {
                    ("day", "second") => Type::IntervalDayTime,
                    ("year", "month") => Type::IntervalYearMonth,
                    _ => return Err(self.error(format!("unknown interval {} to {}", from, to))),
                }
            }
            "json" => Type::Json,
            "uuid" => Type::Uuid,
            "ipaddress" => Type::IpAddress,
            "ipprefix" => Type::IpPrefix,
            "hyperloglog" => Type::HyperLogLog,
            "bingtile" => Type::BingTile,
            "unknown" => Type::Unknown,
            "tdigest" => {
                self.expect(Token::LParen)?;
                let element = self.parse_type()?;
                self.expect(Token::RParen)?;
                Type::TDigest(Box::new(element))
            }
            "array" => {
                self.expect(Token::LParen)?;
                let element = self.parse_type()?;
                self.expect(Token::RParen)?;
                Type::Array(Box::new(element))
            }
            "map" => {
                self.expect(Token::LParen)?;
                let key = self.parse_type()?;
                self.expect(Token::Comma)?;
                let value = self.parse_type()?;
                self.expect(Token::RParen)?;
                Type::Map(Box::new(key), Box::new(value))
            }
            "row" => Type::Row(self.parse_row_fields()?),
            other => return Err(self.error(format!("unknown type '{}'", other))),
        };
        Ok(ty)
    }

    fn parse_row_fields(&mut self) -> Result<RowType> {
        self.expect(Token::LParen)?;
        let mut names = Vec::new();
        let mut types = Vec::new();

        loop {
            let name = match (self.peek(), self.peek_at(1)) {
                (Some(Token::Quoted(_)), _) => match self.next() {
                    Some(Token::Quoted(name)) => name,
                    _ => unreachable!(),
                },
                // `interval day to second` starts with two words but has no field name
                (Some(Token::Word(first)), Some(Token::Word(second)))
                    if !(first.eq_ignore_ascii_case("interval")
                        && (second.eq_ignore_ascii_case("day") || second.eq_ignore_ascii_case("year"))) =>
                {
                    match self.next() {
                        Some(Token::Word(name)) => name,
                        _ => unreachable!(),
                    }
                }
                _ => String::new(),
            };
            names.push(name);
            types.push(self.parse_type()?);

            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                other => return Err(self.error(format!("expected ',' or ')', found {:?}", other))),
            }
        }

        Ok(RowType::new(names, types))
    }
}

/// Parses a textual type name into a native `Type`.
pub fn parse_type(text: &str) -> Result<Type> {
    let mut parser = TypeParser {
        text,
        tokens: tokenize(text)?,
        pos: 0,
    };
    let ty = parser.parse_type()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.error("trailing input after type"));
    }
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_type("bigint").unwrap(), Type::BigInt);
        assert_eq!(parse_type("VARCHAR").unwrap(), Type::Varchar);
        assert_eq!(parse_type("varchar(25)").unwrap(), Type::Varchar);
        assert_eq!(parse_type("double").unwrap(), Type::Double);
        assert_eq!(parse_type("timestamp").unwrap(), Type::Timestamp);
        assert_eq!(
            parse_type("decimal(12,2)").unwrap(),
            Type::Decimal { precision: 12, scale: 2 }
        );
        assert_eq!(parse_type("interval day to second").unwrap(), Type::IntervalDayTime);
        assert_eq!(parse_type("INTERVAL YEAR TO MONTH").unwrap(), Type::IntervalYearMonth);
    }

    #[test]
    fn test_parse_nested() {
        let ty = parse_type("array(map(varchar, row(a bigint, \"B c\" array(date))))").unwrap();
        let expected = Type::Array(Box::new(Type::Map(
            Box::new(Type::Varchar),
            Box::new(Type::Row(RowType::from_fields(vec![
                ("a", Type::BigInt),
                ("B c", Type::Array(Box::new(Type::Date))),
            ]))),
        )));
        assert_eq!(ty, expected);
    }

    #[test]
    fn test_parse_anonymous_row_fields() {
        let ty = parse_type("row(bigint, array(varchar), interval day to second)").unwrap();
        match ty {
            Type::Row(row) => {
                assert_eq!(row.names(), &["", "", ""]);
                assert_eq!(row.child_at(2), &Type::IntervalDayTime);
            }
            other => panic!("expected row, got {:?}", other),
        }
    }

    #[test]
    fn test_to_sql_parses_back() {
        let ty = Type::Row(RowType::from_fields(vec![
            ("c0", Type::Decimal { precision: 20, scale: 3 }),
            ("order", Type::Map(Box::new(Type::Integer), Box::new(Type::Varbinary))),
        ]));
        assert_eq!(parse_type(&ty.to_sql()).unwrap(), ty);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_type("").is_err());
        assert!(parse_type("array(bigint").is_err());
        assert!(parse_type("bigint bigint").is_err());
        assert!(parse_type("frobnicate").is_err());
        assert!(parse_type("timestamp with time zone").is_err());
        assert!(parse_type("decimal(50, 2)").is_err());
    }
}
