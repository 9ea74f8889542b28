//! A hand-written recursive-descent parser (Pratt-style precedence
//! climbing for expressions) that turns a `tidec_lexer` token stream
//! directly into a type-checked `tidec_lir::TranslationUnit`: there is no
//! separate semantic-analysis pass, every expression's `AstNode::ty` is
//! filled in as it is built, and typedef names are recognized by
//! consulting the symbol table while still parsing (lexical feedback).

pub mod cursor;
pub mod decl;
pub mod expr;
pub mod stmt;
pub mod ty;

use tidec_lexer::{Lexer, Token, TokenKind};
use tidec_lir::TranslationUnit;
use tidec_log::error::ErrorSink;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    pub tu: TranslationUnit,
    errors: &'a mut ErrorSink,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, errors: &'a mut ErrorSink) -> Self {
        let tokens = if tokens.is_empty() {
            vec![Token { kind: TokenKind::Eof, line: 1 }]
        } else {
            tokens
        };
        Parser { tokens, pos: 0, tu: TranslationUnit::new(), errors }
    }
}

/// Lexes and parses a whole translation unit, returning the populated
/// `TranslationUnit` with `root` set to the top-level statement list.
/// Lexical and syntactic errors are both reported through `errors`; the
/// caller decides whether to still attempt code generation (it
/// shouldn't, if `errors.error_get_count()` is nonzero).
pub fn parse_translation_unit(source: &str, errors: &mut ErrorSink) -> TranslationUnit {
    let tokens = Lexer::tokenize(source, errors);
    let mut parser = Parser::new(tokens, errors);
    parser.parse_program();
    parser.tu
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidec_lir::ast::AstKind;

    #[test]
    fn parses_a_trivial_function() {
        let mut errors = ErrorSink::new();
        let tu = parse_translation_unit("int add(int a, int b) { return a + b; }", &mut errors);
        assert_eq!(errors.error_get_count(), 0);
        let root = tu.root.expect("root set");
        match &tu.ast.get(root).kind {
            AstKind::StatementList(items) => assert_eq!(items.len(), 1),
            other => panic!("expected a statement list, found {:?}", other),
        }
    }
}
