//! Recursive-descent, single-pass expression parser (spec §4.3).
//!
//! Precedence, lowest to highest, all left-associative:
//! `equality -> relational -> additive -> term -> primary`.

use smallvec::SmallVec;

use crate::error::{AgeRunError, AgeRunResult};
use crate::expr_ast::{BinaryOperator, ExprAst, MemoryBase};
use crate::log::LogSink;

pub struct ExprParser<'a> {
    source: &'a str,
    pos: usize,
    log: Option<&'a dyn LogSink>,
}

impl<'a> ExprParser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0, log: None }
    }

    /// Same as [`ExprParser::new`], but reports every syntax failure to
    /// `log` before returning it (spec §6: parsers receive a borrowed log
    /// handle and must not own or drop it).
    pub fn with_log(source: &'a str, log: Option<&'a dyn LogSink>) -> Self {
        Self { source, pos: 0, log }
    }

    fn fail(&self, message: impl Into<String>, offset: usize) -> AgeRunError {
        let message = message.into();
        if let Some(log) = self.log {
            log.error_at(&message, offset);
        }
        AgeRunError::syntax(message, offset)
    }

    /// Parse the whole input as one expression; fails if anything but
    /// whitespace remains afterward.
    pub fn parse_expression(&mut self) -> AgeRunResult<ExprAst> {
        self.skip_ws();
        let expr = self.parse_equality()?;
        self.skip_ws();
        if self.pos != self.source.len() {
            let offset = self.pos;
            return Err(self.fail("unexpected characters after expression", offset));
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> AgeRunResult<ExprAst> {
        let mut left = self.parse_relational()?;
        loop {
            self.skip_ws();
            if self.peek_char() == Some('=') {
                self.advance();
                self.skip_ws();
                let right = self.parse_relational()?;
                left = ExprAst::binary_op(BinaryOperator::Equal, left, right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> AgeRunResult<ExprAst> {
        let mut left = self.parse_additive()?;
        loop {
            self.skip_ws();
            let op = if self.starts_with("<>") {
                self.advance_n(2);
                Some(BinaryOperator::NotEqual)
            } else if self.starts_with("<=") {
                self.advance_n(2);
                Some(BinaryOperator::LessEqual)
            } else if self.starts_with(">=") {
                self.advance_n(2);
                Some(BinaryOperator::GreaterEqual)
            } else if self.peek_char() == Some('<') {
                self.advance();
                Some(BinaryOperator::Less)
            } else if self.peek_char() == Some('>') {
                self.advance();
                Some(BinaryOperator::Greater)
            } else {
                None
            };
            match op {
                Some(op) => {
                    self.skip_ws();
                    let right = self.parse_additive()?;
                    left = ExprAst::binary_op(op, left, right);
                }
                None => break,
            }
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> AgeRunResult<ExprAst> {
        let mut left = self.parse_term()?;
        loop {
            self.skip_ws();
            let op = match self.peek_char() {
                Some('+') => Some(BinaryOperator::Add),
                Some('-') => Some(BinaryOperator::Subtract),
                _ => None,
            };
            match op {
                Some(op) => {
                    self.advance();
                    self.skip_ws();
                    let right = self.parse_term()?;
                    left = ExprAst::binary_op(op, left, right);
                }
                None => break,
            }
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> AgeRunResult<ExprAst> {
        let mut left = self.parse_primary()?;
        loop {
            self.skip_ws();
            let op = match self.peek_char() {
                Some('*') => Some(BinaryOperator::Multiply),
                Some('/') => Some(BinaryOperator::Divide),
                _ => None,
            };
            match op {
                Some(op) => {
                    self.advance();
                    self.skip_ws();
                    let right = self.parse_primary()?;
                    left = ExprAst::binary_op(op, left, right);
                }
                None => break,
            }
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> AgeRunResult<ExprAst> {
        self.skip_ws();
        match self.peek_char() {
            Some('(') => {
                self.advance();
                self.skip_ws();
                let inner = self.parse_equality()?;
                self.skip_ws();
                if self.peek_char() != Some(')') {
                    { let offset = self.pos; return Err(self.fail("expected ')'", offset)); }
                }
                self.advance();
                Ok(inner)
            }
            Some('"') => Ok(ExprAst::LiteralString(self.parse_string_literal()?)),
            _ => {
                if self.match_base_keyword("memory") {
                    self.parse_memory_access(MemoryBase::Memory, "memory")
                } else if self.match_base_keyword("message") {
                    self.parse_memory_access(MemoryBase::Message, "message")
                } else if self.match_base_keyword("context") {
                    self.parse_memory_access(MemoryBase::Context, "context")
                } else {
                    self.parse_number()
                }
            }
        }
    }

    fn parse_memory_access(&mut self, base: MemoryBase, keyword: &str) -> AgeRunResult<ExprAst> {
        self.advance_n(keyword.len());
        let mut path: SmallVec<[String; 4]> = SmallVec::new();
        while self.peek_char() == Some('.') {
            self.advance();
            let start = self.pos;
            let identifier = self.parse_identifier()?;
            if identifier.is_empty() {
                return Err(self.fail("expected identifier after '.'", start));
            }
            path.push(identifier);
        }
        Ok(ExprAst::MemoryAccess { base, path })
    }

    fn parse_identifier(&mut self) -> AgeRunResult<String> {
        let mut identifier = String::new();
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                identifier.push(c);
                self.advance();
            }
            _ => return Ok(identifier),
        }
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                identifier.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Ok(identifier)
    }

    /// No escape handling beyond accepting any non-`"` byte: a `\"` suppresses
    /// the closing quote for a single preceding backslash (matching the
    /// reference implementation's raw-argument scanner, spec §4.3 resolution
    /// in SPEC_FULL.md §9), but the backslash itself is kept verbatim.
    fn parse_string_literal(&mut self) -> AgeRunResult<String> {
        let start = self.pos;
        self.advance(); // opening quote
        let mut content = String::new();
        let mut previous: Option<char> = None;
        loop {
            match self.peek_char() {
                None => return Err(self.fail("unterminated string literal", start)),
                Some('"') if previous != Some('\\') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    content.push(c);
                    previous = Some(c);
                    self.advance();
                }
            }
        }
        Ok(content)
    }

    fn parse_number(&mut self) -> AgeRunResult<ExprAst> {
        let start = self.pos;
        let mut text = String::new();
        if self.peek_char() == Some('-') {
            text.push('-');
            self.advance();
        }
        let digits_start = text.len();
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if text.len() == digits_start {
            return Err(self.fail("expected a number", start));
        }
        let mut is_double = false;
        if self.peek_char() == Some('.') {
            is_double = true;
            text.push('.');
            self.advance();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if is_double {
            let value: f64 = text
                .parse()
                .map_err(|_| self.fail("invalid double literal", start))?;
            Ok(ExprAst::LiteralDouble(value))
        } else {
            let value: i32 = text
                .parse()
                .map_err(|_| self.fail("invalid integer literal", start))?;
            Ok(ExprAst::LiteralInt(value))
        }
    }

    fn match_base_keyword(&self, keyword: &str) -> bool {
        if !self.starts_with(keyword) {
            return false;
        }
        match self.source[self.pos + keyword.len()..].chars().next() {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => false,
            _ => true,
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.source[self.pos..].starts_with(pattern)
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn advance_n(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Current byte offset, exposed so callers (the instruction parsers) can
    /// report argument-relative errors against the outer source.
    pub fn position(&self) -> usize {
        self.pos
    }
}
