//! Hand-written scanner: no regex, no generated DFA, one `char` of
//! lookahead beyond the current position (two for a handful of
//! three-character operators). Comments and whitespace are skipped
//! inline; there is no preprocessor pass, so `#include`/`#define` are not
//! recognized at all.

use tidec_log::error::ErrorSink;

use crate::token::{keyword_kind, Token, TokenKind};

pub struct Lexer<'a> {
    chars: Vec<char>,
    src: &'a str,
    pos: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { chars: src.chars().collect(), src, pos: 0, line: 1 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => break,
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn tok(&self, kind: TokenKind) -> Token {
        Token { kind, line: self.line }
    }

    /// Scans the full token stream up front, terminated by a single
    /// trailing `Eof` token, so the parser never has to special-case
    /// end-of-input lookahead.
    pub fn tokenize(src: &'a str, errors: &mut ErrorSink) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token(errors);
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self, errors: &mut ErrorSink) -> Token {
        self.skip_trivia();
        let line = self.line;
        let c = match self.peek() {
            None => return self.tok(TokenKind::Eof),
            Some(c) => c,
        };

        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.scan_number();
        }
        if c == '_' || c.is_alphabetic() {
            return self.scan_identifier_or_keyword();
        }
        if c == '"' {
            return self.scan_string(errors);
        }
        if c == '\'' {
            return self.scan_char(errors);
        }

        self.scan_operator(errors, line)
    }

    fn scan_identifier_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c == '_' || c.is_alphanumeric()) {
            self.advance();
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match keyword_kind(&word) {
            Some(kind) => self.tok(kind),
            None => self.tok(TokenKind::Identifier(word)),
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.advance();
            }
            let text: String = self.chars[start + 2..self.pos].iter().collect();
            let value = i64::from_str_radix(&text, 16).unwrap_or(0);
            return self.tok(TokenKind::IntConstant(value));
        }

        let mut is_float = false;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Integer/float suffixes (`L`, `U`, `f`, in any combination) are
        // accepted and ignored; this subset has no distinct suffixed type.
        while matches!(self.peek(), Some('l') | Some('L') | Some('u') | Some('U') | Some('f') | Some('F')) {
            is_float = is_float && matches!(self.peek(), Some('f') | Some('F'));
            self.advance();
        }

        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| !matches!(c, 'l' | 'L' | 'u' | 'U' | 'f' | 'F'))
            .collect();

        if is_float {
            self.tok(TokenKind::FloatConstant(text.parse().unwrap_or(0.0)))
        } else {
            self.tok(TokenKind::IntConstant(text.parse().unwrap_or(0)))
        }
    }

    fn scan_escape(&mut self, errors: &mut ErrorSink) -> i64 {
        match self.advance() {
            Some('n') => b'\n' as i64,
            Some('t') => b'\t' as i64,
            Some('r') => b'\r' as i64,
            Some('0') => 0,
            Some('\\') => b'\\' as i64,
            Some('\'') => b'\'' as i64,
            Some('"') => b'"' as i64,
            Some(other) => {
                errors.error_report(self.line, &format!("unrecognized escape sequence '\\{}'", other));
                other as i64
            }
            None => {
                errors.error_report(self.line, "unterminated escape sequence");
                0
            }
        }
    }

    fn scan_string(&mut self, errors: &mut ErrorSink) -> Token {
        self.advance();
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    errors.error_report(self.line, "unterminated string literal");
                    break;
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let byte = self.scan_escape(errors);
                    if let Some(ch) = char::from_u32(byte as u32) {
                        out.push(ch);
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.advance();
                }
            }
        }
        self.tok(TokenKind::StringLiteral(out))
    }

    fn scan_char(&mut self, errors: &mut ErrorSink) -> Token {
        self.advance();
        let value = match self.peek() {
            Some('\\') => {
                self.advance();
                self.scan_escape(errors)
            }
            Some(c) => {
                self.advance();
                c as i64
            }
            None => {
                errors.error_report(self.line, "unterminated character literal");
                0
            }
        };
        if self.peek() == Some('\'') {
            self.advance();
        } else {
            errors.error_report(self.line, "expected closing `'` in character literal");
        }
        self.tok(TokenKind::CharConstant(value))
    }

    fn scan_operator(&mut self, errors: &mut ErrorSink, line: u32) -> Token {
        use TokenKind::*;
        let c = self.advance().unwrap();
        let kind = match c {
            '+' => match self.peek() {
                Some('+') => {
                    self.advance();
                    PlusPlus
                }
                Some('=') => {
                    self.advance();
                    PlusAssign
                }
                _ => Plus,
            },
            '-' => match self.peek() {
                Some('-') => {
                    self.advance();
                    MinusMinus
                }
                Some('=') => {
                    self.advance();
                    MinusAssign
                }
                Some('>') => {
                    self.advance();
                    Arrow
                }
                _ => Minus,
            },
            '*' => match self.peek() {
                Some('=') => {
                    self.advance();
                    StarAssign
                }
                _ => Star,
            },
            '/' => match self.peek() {
                Some('=') => {
                    self.advance();
                    SlashAssign
                }
                _ => Slash,
            },
            '%' => match self.peek() {
                Some('=') => {
                    self.advance();
                    PercentAssign
                }
                _ => Percent,
            },
            '&' => match self.peek() {
                Some('&') => {
                    self.advance();
                    AmpAmp
                }
                Some('=') => {
                    self.advance();
                    AmpAssign
                }
                _ => Amp,
            },
            '|' => match self.peek() {
                Some('|') => {
                    self.advance();
                    PipePipe
                }
                Some('=') => {
                    self.advance();
                    PipeAssign
                }
                _ => Pipe,
            },
            '^' => match self.peek() {
                Some('=') => {
                    self.advance();
                    CaretAssign
                }
                _ => Caret,
            },
            '~' => Tilde,
            '!' => match self.peek() {
                Some('=') => {
                    self.advance();
                    Ne
                }
                _ => Bang,
            },
            '=' => match self.peek() {
                Some('=') => {
                    self.advance();
                    Eq
                }
                _ => Assign,
            },
            '<' => match self.peek() {
                Some('<') => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        ShlAssign
                    } else {
                        Shl
                    }
                }
                Some('=') => {
                    self.advance();
                    Le
                }
                _ => Lt,
            },
            '>' => match self.peek() {
                Some('>') => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        ShrAssign
                    } else {
                        Shr
                    }
                }
                Some('=') => {
                    self.advance();
                    Ge
                }
                _ => Gt,
            },
            '.' => {
                if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
                    self.advance();
                    self.advance();
                    Ellipsis
                } else {
                    Dot
                }
            }
            ',' => Comma,
            ';' => Semi,
            ':' => Colon,
            '?' => Question,
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            '[' => LBracket,
            ']' => RBracket,
            other => {
                errors.error_report(line, &format!("unexpected character '{}'", other));
                // Recover by treating it as if it weren't there; the
                // caller keeps scanning from the next character.
                return self.next_token(errors);
            }
        };
        Token { kind, line }
    }

    pub fn source(&self) -> &str {
        self.src
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut errors = ErrorSink::new();
        Lexer::tokenize(src, &mut errors).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_a_function_signature() {
        let toks = kinds("int add(int a, int b) {");
        assert_eq!(
            toks,
            vec![
                TokenKind::Int,
                TokenKind::Identifier("add".into()),
                TokenKind::LParen,
                TokenKind::Int,
                TokenKind::Identifier("a".into()),
                TokenKind::Comma,
                TokenKind::Int,
                TokenKind::Identifier("b".into()),
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_hex_and_decimal_integers() {
        assert_eq!(
            kinds("0x2A 42"),
            vec![TokenKind::IntConstant(42), TokenKind::IntConstant(42), TokenKind::Eof]
        );
    }

    #[test]
    fn scans_string_escapes() {
        let toks = kinds("\"hi\\n\"");
        assert_eq!(toks, vec![TokenKind::StringLiteral("hi\n".into()), TokenKind::Eof]);
    }

    #[test]
    fn scans_three_character_operators() {
        assert_eq!(
            kinds("<<= >>="),
            vec![TokenKind::ShlAssign, TokenKind::ShrAssign, TokenKind::Eof]
        );
    }

    #[test]
    fn skips_line_and_block_comments() {
        assert_eq!(
            kinds("1 // a comment\n/* block */ 2"),
            vec![TokenKind::IntConstant(1), TokenKind::IntConstant(2), TokenKind::Eof]
        );
    }

    #[test]
    fn reports_unterminated_string() {
        let mut errors = ErrorSink::new();
        Lexer::tokenize("\"oops", &mut errors);
        assert_eq!(errors.error_get_count(), 1);
    }
}
