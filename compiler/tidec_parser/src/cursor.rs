//! Token-stream navigation shared by every other parser module: one token
//! of lookahead, no backtracking (every `parse_*` function consumes
//! exactly the tokens it recognizes or reports an error and skips one).

use tidec_lexer::{Token, TokenKind};

use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    pub(crate) fn current_line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    pub(crate) fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    /// Consumes the current token if it matches `kind`, returning whether
    /// it did.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it matches `kind`; otherwise reports
    /// an error at the current line and leaves the cursor where it is so
    /// the caller's subsequent parsing has a chance to resynchronize.
    pub(crate) fn expect(&mut self, kind: &TokenKind, what: &str) {
        if !self.eat(kind) {
            let line = self.current_line();
            self.errors.error_report(line, &format!("expected {}", what));
        }
    }

    /// Consumes an identifier token, returning its name; on a mismatch,
    /// reports an error and still consumes the offending token so the
    /// caller always makes forward progress.
    pub(crate) fn expect_identifier(&mut self, what: &str) -> String {
        let line = self.current_line();
        match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.bump();
                name
            }
            _ => {
                self.errors.error_report(line, &format!("expected {}", what));
                if !self.at_eof() {
                    self.bump();
                }
                String::new()
            }
        }
    }
}
