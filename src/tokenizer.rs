//! Lexical analysis: hands out classified tokens one at a time.
//!
//! The scanner holds nothing but a cursor into the source; the parser pulls
//! a token whenever it advances its single token of lookahead. Two-character
//! operators are matched before their one-character prefixes. Over-long
//! numbers are reported to the diagnostics sink and scanning carries on.

use std::fmt;

use crate::error::{Diagnostics, NumberTooLongSnafu};

/// Terminal categories of the language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
  Ident(String),
  Number(i64),
  Plus,
  Minus,
  Times,
  Slash,
  Becomes,
  Eql,
  Neq,
  Lss,
  Leq,
  Gtr,
  Geq,
  LParen,
  RParen,
  Comma,
  Semicolon,
  Program,
  Begin,
  End,
  If,
  Then,
  While,
  Do,
  Const,
  Var,
  Unknown(char),
  Eof,
}

impl TokenKind {
  fn keyword(word: &str) -> Option<Self> {
    Some(match word {
      "BEGIN" => Self::Begin,
      "CONST" => Self::Const,
      "DO" => Self::Do,
      "END" => Self::End,
      "IF" => Self::If,
      "PROGRAM" => Self::Program,
      "THEN" => Self::Then,
      "VAR" => Self::Var,
      "WHILE" => Self::While,
      _ => return None,
    })
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Self::Ident(name) => return write!(f, "identifier '{name}'"),
      Self::Number(value) => return write!(f, "number {value}"),
      Self::Unknown(c) => return write!(f, "unrecognised character '{c}'"),
      Self::Plus => "'+'",
      Self::Minus => "'-'",
      Self::Times => "'*'",
      Self::Slash => "'/'",
      Self::Becomes => "':='",
      Self::Eql => "'='",
      Self::Neq => "'<>'",
      Self::Lss => "'<'",
      Self::Leq => "'<='",
      Self::Gtr => "'>'",
      Self::Geq => "'>='",
      Self::LParen => "'('",
      Self::RParen => "')'",
      Self::Comma => "','",
      Self::Semicolon => "';'",
      Self::Program => "'PROGRAM'",
      Self::Begin => "'BEGIN'",
      Self::End => "'END'",
      Self::If => "'IF'",
      Self::Then => "'THEN'",
      Self::While => "'WHILE'",
      Self::Do => "'DO'",
      Self::Const => "'CONST'",
      Self::Var => "'VAR'",
      Self::Eof => "end of input",
    };
    f.write_str(text)
  }
}

/// A token together with the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub line: usize,
}

impl Token {
  pub fn new(kind: TokenKind, line: usize) -> Self {
    Self { kind, line }
  }
}

/// On-demand token source over a borrowed program text.
pub struct Scanner<'a> {
  source: &'a str,
  pos: usize,
  line: usize,
  max_digits: usize,
}

impl<'a> Scanner<'a> {
  pub fn new(source: &'a str, max_digits: usize) -> Self {
    Self {
      source,
      pos: 0,
      line: 1,
      max_digits,
    }
  }

  /// Produce the next token. Once the end is reached every call yields `Eof`.
  pub fn next_token(&mut self, diagnostics: &mut Diagnostics) -> Token {
    self.skip_whitespace();
    let line = self.line;

    let kind = match self.peek() {
      None => TokenKind::Eof,
      // '#' terminates the source text.
      Some(b'#') => {
        self.pos = self.source.len();
        TokenKind::Eof
      }
      Some(c) if c.is_ascii_alphabetic() => self.word(),
      Some(c) if c.is_ascii_digit() => self.number(line, diagnostics),
      Some(_) => self.operator(),
    };

    log::trace!("line {line}: {kind}");
    Token::new(kind, line)
  }

  fn peek(&self) -> Option<u8> {
    self.source.as_bytes().get(self.pos).copied()
  }

  fn eat(&mut self, expected: u8) -> bool {
    if self.peek() == Some(expected) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip_whitespace(&mut self) {
    while let Some(c) = self.peek()
      && c.is_ascii_whitespace()
    {
      if c == b'\n' {
        self.line += 1;
      }
      self.pos += 1;
    }
  }

  fn word(&mut self) -> TokenKind {
    let start = self.pos;
    while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
      self.pos += 1;
    }
    let word = &self.source[start..self.pos];
    TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()))
  }

  fn number(&mut self, line: usize, diagnostics: &mut Diagnostics) -> TokenKind {
    let start = self.pos;
    let mut value: i64 = 0;
    while let Some(c) = self.peek()
      && c.is_ascii_digit()
    {
      value = value
        .saturating_mul(10)
        .saturating_add(i64::from(c - b'0'));
      self.pos += 1;
    }

    let digits = &self.source[start..self.pos];
    if digits.len() > self.max_digits {
      diagnostics.report(
        line,
        NumberTooLongSnafu {
          digits,
          max: self.max_digits,
        }
        .build(),
      );
    }
    TokenKind::Number(value)
  }

  fn operator(&mut self) -> TokenKind {
    let Some(c) = self.source[self.pos..].chars().next() else {
      return TokenKind::Eof;
    };
    self.pos += c.len_utf8();

    match c {
      '+' => TokenKind::Plus,
      '-' => TokenKind::Minus,
      '*' => TokenKind::Times,
      '/' => TokenKind::Slash,
      '(' => TokenKind::LParen,
      ')' => TokenKind::RParen,
      ',' => TokenKind::Comma,
      ';' => TokenKind::Semicolon,
      '=' => TokenKind::Eql,
      ':' if self.eat(b'=') => TokenKind::Becomes,
      '<' if self.eat(b'=') => TokenKind::Leq,
      '<' if self.eat(b'>') => TokenKind::Neq,
      '<' => TokenKind::Lss,
      '>' if self.eat(b'=') => TokenKind::Geq,
      '>' => TokenKind::Gtr,
      other => TokenKind::Unknown(other),
    }
  }
}
