//! Statement parsing. Declarations are recognized by lookahead on
//! `at_type_start` so an expression statement beginning with an
//! identifier (`x = 1;`) isn't mistaken for one.

use tidec_lir::ast::NodeId;
use tidec_lir::symbol::{StorageClass, Symbol};
use tidec_lexer::TokenKind;

use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_statement(&mut self) -> NodeId {
        match self.peek().clone() {
            TokenKind::LBrace => self.parse_compound_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Case => self.parse_case_statement(),
            TokenKind::Default => self.parse_default_statement(),
            TokenKind::Break => {
                self.bump();
                self.expect(&TokenKind::Semi, "`;` after `break`");
                self.tu.ast.break_stmt()
            }
            TokenKind::Continue => {
                self.bump();
                self.expect(&TokenKind::Semi, "`;` after `continue`");
                self.tu.ast.continue_stmt()
            }
            TokenKind::Return => {
                self.bump();
                let value = if self.check(&TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expression())
                };
                self.expect(&TokenKind::Semi, "`;` after `return`");
                self.tu.ast.return_stmt(value)
            }
            TokenKind::Goto => {
                self.bump();
                let label = self.expect_identifier("a label name after `goto`");
                self.expect(&TokenKind::Semi, "`;` after `goto` label");
                self.tu.ast.goto_stmt(label)
            }
            TokenKind::Semi => {
                self.bump();
                self.tu.ast.compound(Vec::new())
            }
            TokenKind::Identifier(_) if matches!(self.peek_at(1), TokenKind::Colon) => {
                let label = self.expect_identifier("a label name");
                self.bump(); // `:`
                self.tu.ast.label_stmt(label)
            }
            _ if self.at_type_start() => self.parse_local_declaration(),
            _ => {
                let expr = self.parse_expression();
                self.expect(&TokenKind::Semi, "`;` after expression statement");
                self.tu.ast.expr_statement(expr)
            }
        }
    }

    pub(crate) fn parse_compound_statement(&mut self) -> NodeId {
        self.expect(&TokenKind::LBrace, "`{` to start a block");
        self.tu.symbols.enter_scope();
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            statements.push(self.parse_statement());
        }
        self.tu.symbols.exit_scope();
        self.expect(&TokenKind::RBrace, "`}` to end a block");
        self.tu.ast.compound(statements)
    }

    /// A local variable declaration, one or more comma-separated
    /// declarators sharing a base type, each optionally initialized.
    /// Returned as a single compound statement so it behaves as one
    /// statement to its caller (matching the grammar's `int a = 1, b;`).
    fn parse_local_declaration(&mut self) -> NodeId {
        let (base, storage) = self.parse_declaration_specifiers();
        let mut decls = Vec::new();
        loop {
            let (name, ty) = self.parse_declarator(base);
            let init = if self.eat(&TokenKind::Assign) {
                Some(self.parse_assignment_expr())
            } else {
                None
            };

            if storage == StorageClass::Typedef {
                self.tu.symbols.add_global(Symbol {
                    name: name.clone(),
                    ty: self.tu.types.typedef(name.clone(), ty),
                    storage: StorageClass::Typedef,
                    defined: true,
                });
            } else {
                self.tu.symbols.add_local(Symbol {
                    name: name.clone(),
                    ty,
                    storage: StorageClass::Auto,
                    defined: true,
                });
                decls.push(self.tu.ast.declaration(name, ty, init));
            }

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semi, "`;` after declaration");
        if decls.len() == 1 {
            decls.pop().unwrap()
        } else {
            self.tu.ast.compound(decls)
        }
    }

    fn parse_if_statement(&mut self) -> NodeId {
        self.bump();
        self.expect(&TokenKind::LParen, "`(` after `if`");
        let cond = self.parse_expression();
        self.expect(&TokenKind::RParen, "`)` after `if` condition");
        let then_branch = self.parse_statement();
        let else_branch = if self.eat(&TokenKind::Else) { Some(self.parse_statement()) } else { None };
        self.tu.ast.if_stmt(cond, then_branch, else_branch)
    }

    fn parse_while_statement(&mut self) -> NodeId {
        self.bump();
        self.expect(&TokenKind::LParen, "`(` after `while`");
        let cond = self.parse_expression();
        self.expect(&TokenKind::RParen, "`)` after `while` condition");
        let body = self.parse_statement();
        self.tu.ast.while_stmt(cond, body)
    }

    fn parse_do_while_statement(&mut self) -> NodeId {
        self.bump();
        let body = self.parse_statement();
        self.expect(&TokenKind::While, "`while` after `do` body");
        self.expect(&TokenKind::LParen, "`(` after `while`");
        let cond = self.parse_expression();
        self.expect(&TokenKind::RParen, "`)` after `do`/`while` condition");
        self.expect(&TokenKind::Semi, "`;` after `do`/`while` statement");
        self.tu.ast.do_while_stmt(body, cond)
    }

    fn parse_for_statement(&mut self) -> NodeId {
        self.bump();
        self.expect(&TokenKind::LParen, "`(` after `for`");
        self.tu.symbols.enter_scope();

        let init = if self.check(&TokenKind::Semi) {
            self.bump();
            None
        } else if self.at_type_start() {
            Some(self.parse_local_declaration())
        } else {
            let expr = self.parse_expression();
            self.expect(&TokenKind::Semi, "`;` after `for` initializer");
            Some(self.tu.ast.expr_statement(expr))
        };

        let cond = if self.check(&TokenKind::Semi) { None } else { Some(self.parse_expression()) };
        self.expect(&TokenKind::Semi, "`;` after `for` condition");

        let step = if self.check(&TokenKind::RParen) { None } else { Some(self.parse_expression()) };
        self.expect(&TokenKind::RParen, "`)` after `for` clauses");

        let body = self.parse_statement();
        self.tu.symbols.exit_scope();
        self.tu.ast.for_stmt(init, cond, step, body)
    }

    fn parse_switch_statement(&mut self) -> NodeId {
        self.bump();
        self.expect(&TokenKind::LParen, "`(` after `switch`");
        let scrutinee = self.parse_expression();
        self.expect(&TokenKind::RParen, "`)` after `switch` expression");
        let body = self.parse_statement();
        self.tu.ast.switch_stmt(scrutinee, body)
    }

    fn parse_case_statement(&mut self) -> NodeId {
        self.bump();
        let expr = self.parse_conditional_expr_const();
        self.expect(&TokenKind::Colon, "`:` after `case` value");
        let body = self.parse_statement();
        self.tu.ast.case_stmt(expr, body)
    }

    fn parse_default_statement(&mut self) -> NodeId {
        self.bump();
        self.expect(&TokenKind::Colon, "`:` after `default`");
        let body = self.parse_statement();
        self.tu.ast.default_stmt(body)
    }

    /// `case` labels must be constant expressions; folds immediately and
    /// reports a diagnostic (defaulting to 0) if the label isn't one.
    fn parse_conditional_expr_const(&mut self) -> i64 {
        let expr = self.parse_conditional_expr();
        match self.tu.ast.evaluate_constant(expr) {
            Some(v) => v,
            None => {
                let line = self.current_line();
                self.errors.error_report(line, "`case` label is not a constant expression");
                0
            }
        }
    }
}
