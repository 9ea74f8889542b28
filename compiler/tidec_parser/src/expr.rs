//! Expression parsing: precedence climbing over the binary operators,
//! recursive-descent for everything else. Every node gets its static
//! type filled in as it is built — there is no separate type-checking
//! walk over the finished tree.

use tidec_lir::ast::{BinaryOp, NodeId, UnaryOp};
use tidec_lir::types::{BasicKind, TypeId, TypeKind};
use tidec_lexer::TokenKind;

use crate::Parser;

impl<'a> Parser<'a> {
    fn set_ty(&mut self, id: NodeId, ty: TypeId) -> NodeId {
        self.tu.ast.get_mut(id).ty = Some(ty);
        id
    }

    fn node_ty(&self, id: NodeId) -> TypeId {
        self.tu.ast.get(id).ty.unwrap_or(self.tu.types.int_ty)
    }

    fn is_float_kind(&self, ty: TypeId) -> bool {
        let resolved = self.tu.types.resolve(ty);
        matches!(
            self.tu.types.get(resolved).kind,
            TypeKind::Basic(BasicKind::Float) | TypeKind::Basic(BasicKind::Double)
        )
    }

    fn is_pointer_kind(&self, ty: TypeId) -> bool {
        matches!(self.tu.types.get(self.tu.types.resolve(ty)).kind, TypeKind::Pointer(_))
    }

    fn numeric_rank(&self, ty: TypeId) -> u8 {
        match self.tu.types.get(self.tu.types.resolve(ty)).kind {
            TypeKind::Basic(BasicKind::Double) => 4,
            TypeKind::Basic(BasicKind::Float) => 3,
            TypeKind::Basic(BasicKind::Long) => 2,
            _ => 1,
        }
    }

    fn common_numeric_type(&self, a: TypeId, b: TypeId) -> TypeId {
        match self.numeric_rank(a).max(self.numeric_rank(b)) {
            4 => self.tu.types.double_ty,
            3 => self.tu.types.float_ty,
            2 => self.tu.types.long_ty,
            _ => self.tu.types.int_ty,
        }
    }

    /// The top-level entry point: the comma operator has the lowest
    /// precedence of all.
    pub(crate) fn parse_expression(&mut self) -> NodeId {
        let mut lhs = self.parse_assignment_expr();
        while self.eat(&TokenKind::Comma) {
            let rhs = self.parse_assignment_expr();
            let ty = self.node_ty(rhs);
            let node = self.tu.ast.binary(BinaryOp::Comma, lhs, rhs);
            lhs = self.set_ty(node, ty);
        }
        lhs
    }

    pub(crate) fn parse_assignment_expr(&mut self) -> NodeId {
        let lhs = self.parse_conditional_expr();

        let op = match self.peek() {
            TokenKind::Assign => Some(BinaryOp::Assign),
            TokenKind::PlusAssign => Some(BinaryOp::AddAssign),
            TokenKind::MinusAssign => Some(BinaryOp::SubAssign),
            TokenKind::StarAssign => Some(BinaryOp::MulAssign),
            TokenKind::SlashAssign => Some(BinaryOp::DivAssign),
            TokenKind::PercentAssign => Some(BinaryOp::ModAssign),
            TokenKind::AmpAssign => Some(BinaryOp::AndAssign),
            TokenKind::PipeAssign => Some(BinaryOp::OrAssign),
            TokenKind::CaretAssign => Some(BinaryOp::XorAssign),
            TokenKind::ShlAssign => Some(BinaryOp::ShlAssign),
            TokenKind::ShrAssign => Some(BinaryOp::ShrAssign),
            _ => None,
        };
        let Some(op) = op else { return lhs };
        self.bump();
        let rhs = self.parse_assignment_expr();
        let ty = self.node_ty(lhs);
        let node = self.tu.ast.binary(op, lhs, rhs);
        self.set_ty(node, ty)
    }

    pub(crate) fn parse_conditional_expr(&mut self) -> NodeId {
        let cond = self.parse_binary_expr(0);
        if !self.eat(&TokenKind::Question) {
            return cond;
        }
        let then_branch = self.parse_expression();
        self.expect(&TokenKind::Colon, "`:` in conditional expression");
        let else_branch = self.parse_conditional_expr();

        let then_ty = self.node_ty(then_branch);
        let else_ty = self.node_ty(else_branch);
        let result_ty = if self.tu.types.size_of(self.tu.types.resolve(then_ty))
            >= self.tu.types.size_of(self.tu.types.resolve(else_ty))
        {
            then_ty
        } else {
            else_ty
        };
        let node = self.tu.ast.conditional(cond, then_branch, else_branch);
        self.set_ty(node, result_ty)
    }

    /// Binary-operator precedence, lowest to highest; index doubles as
    /// the recursion's minimum-precedence argument.
    fn binop_precedence(kind: &TokenKind) -> Option<(u8, BinaryOp)> {
        use TokenKind::*;
        Some(match kind {
            PipePipe => (1, BinaryOp::LogOr),
            AmpAmp => (2, BinaryOp::LogAnd),
            Pipe => (3, BinaryOp::BitOr),
            Caret => (4, BinaryOp::BitXor),
            Amp => (5, BinaryOp::BitAnd),
            TokenKind::Eq => (6, BinaryOp::Eq),
            Ne => (6, BinaryOp::Ne),
            Lt => (7, BinaryOp::Lt),
            Gt => (7, BinaryOp::Gt),
            Le => (7, BinaryOp::Le),
            Ge => (7, BinaryOp::Ge),
            Shl => (8, BinaryOp::Shl),
            Shr => (8, BinaryOp::Shr),
            Plus => (9, BinaryOp::Add),
            Minus => (9, BinaryOp::Sub),
            Star => (10, BinaryOp::Mul),
            Slash => (10, BinaryOp::Div),
            Percent => (10, BinaryOp::Mod),
            _ => return None,
        })
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> NodeId {
        let mut lhs = self.parse_unary_expr();
        loop {
            let Some((prec, op)) = Self::binop_precedence(self.peek()) else { break };
            if prec < min_prec {
                break;
            }
            self.bump();
            let rhs = self.parse_binary_expr(prec + 1);
            lhs = self.build_binary(op, lhs, rhs);
        }
        lhs
    }

    fn build_binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        let lhs_ty = self.node_ty(lhs);
        let rhs_ty = self.node_ty(rhs);

        let result_ty = match op {
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne => {
                self.tu.types.int_ty
            }
            BinaryOp::LogAnd | BinaryOp::LogOr => self.tu.types.int_ty,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                self.common_numeric_type(lhs_ty, rhs_ty)
            }
            BinaryOp::Add | BinaryOp::Sub => {
                if self.is_pointer_kind(lhs_ty) && self.is_pointer_kind(rhs_ty) {
                    self.tu.types.long_ty
                } else if self.is_pointer_kind(lhs_ty) {
                    lhs_ty
                } else if self.is_pointer_kind(rhs_ty) {
                    rhs_ty
                } else {
                    self.common_numeric_type(lhs_ty, rhs_ty)
                }
            }
            _ => self.common_numeric_type(lhs_ty, rhs_ty),
        };
        let node = self.tu.ast.binary(op, lhs, rhs);
        self.set_ty(node, result_ty)
    }

    fn parse_unary_expr(&mut self) -> NodeId {
        match self.peek().clone() {
            TokenKind::Plus => {
                self.bump();
                let operand = self.parse_unary_expr();
                let ty = self.node_ty(operand);
                let node = self.tu.ast.unary(UnaryOp::Plus, operand);
                self.set_ty(node, ty)
            }
            TokenKind::Minus => {
                self.bump();
                let operand = self.parse_unary_expr();
                let ty = self.node_ty(operand);
                let node = self.tu.ast.unary(UnaryOp::Neg, operand);
                self.set_ty(node, ty)
            }
            TokenKind::Bang => {
                self.bump();
                let operand = self.parse_unary_expr();
                let node = self.tu.ast.unary(UnaryOp::Not, operand);
                self.set_ty(node, self.tu.types.int_ty)
            }
            TokenKind::Tilde => {
                self.bump();
                let operand = self.parse_unary_expr();
                let ty = self.node_ty(operand);
                let node = self.tu.ast.unary(UnaryOp::BitNot, operand);
                self.set_ty(node, ty)
            }
            TokenKind::Amp => {
                self.bump();
                let operand = self.parse_unary_expr();
                let pointee = self.node_ty(operand);
                let ty = self.tu.types.pointer_to(pointee);
                let node = self.tu.ast.unary(UnaryOp::AddrOf, operand);
                self.set_ty(node, ty)
            }
            TokenKind::Star => {
                self.bump();
                let operand = self.parse_unary_expr();
                let operand_ty = self.node_ty(operand);
                let resolved = self.tu.types.resolve(operand_ty);
                let ty = match self.tu.types.get(resolved).kind {
                    TypeKind::Pointer(pointee) => pointee,
                    TypeKind::Array(elem, _) => elem,
                    _ => {
                        let line = self.current_line();
                        self.errors.error_report(line, "cannot dereference a non-pointer expression");
                        self.tu.types.int_ty
                    }
                };
                let node = self.tu.ast.unary(UnaryOp::Deref, operand);
                self.set_ty(node, ty)
            }
            TokenKind::PlusPlus => {
                self.bump();
                let operand = self.parse_unary_expr();
                let ty = self.node_ty(operand);
                let node = self.tu.ast.unary(UnaryOp::PreInc, operand);
                self.set_ty(node, ty)
            }
            TokenKind::MinusMinus => {
                self.bump();
                let operand = self.parse_unary_expr();
                let ty = self.node_ty(operand);
                let node = self.tu.ast.unary(UnaryOp::PreDec, operand);
                self.set_ty(node, ty)
            }
            TokenKind::Sizeof => {
                self.bump();
                if self.check(&TokenKind::LParen) && self.at_type_start_after_paren() {
                    self.bump();
                    let target = self.parse_type_name();
                    self.expect(&TokenKind::RParen, "`)` after sizeof's type");
                    let node = self.tu.ast.sizeof_type(target);
                    self.set_ty(node, self.tu.types.int_ty)
                } else {
                    let operand = self.parse_unary_expr();
                    let node = self.tu.ast.unary(UnaryOp::SizeofExpr, operand);
                    self.set_ty(node, self.tu.types.int_ty)
                }
            }
            TokenKind::LParen if self.at_type_start_after_paren() => {
                self.bump();
                let target = self.parse_type_name();
                self.expect(&TokenKind::RParen, "`)` after cast type");
                let operand = self.parse_unary_expr();
                let node = self.tu.ast.cast(target, operand);
                self.set_ty(node, target)
            }
            _ => self.parse_postfix_expr(),
        }
    }

    /// `sizeof(` and a cast both need one token of lookahead past `(` to
    /// tell a type name from a parenthesized expression.
    fn at_type_start_after_paren(&self) -> bool {
        if !self.check(&TokenKind::LParen) {
            return false;
        }
        match self.peek_at(1) {
            TokenKind::Void
            | TokenKind::Bool
            | TokenKind::Char
            | TokenKind::Short
            | TokenKind::Int
            | TokenKind::Long
            | TokenKind::Float
            | TokenKind::Double
            | TokenKind::Signed
            | TokenKind::Unsigned
            | TokenKind::Struct
            | TokenKind::Union
            | TokenKind::Enum
            | TokenKind::Const
            | TokenKind::Volatile => true,
            TokenKind::Identifier(name) => self.tu.symbols.is_typedef_name(name),
            _ => false,
        }
    }

    fn parse_postfix_expr(&mut self) -> NodeId {
        let mut node = self.parse_primary_expr();
        loop {
            match self.peek().clone() {
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_expression();
                    self.expect(&TokenKind::RBracket, "`]` after subscript index");
                    let base_ty = self.node_ty(node);
                    let resolved = self.tu.types.resolve(base_ty);
                    let elem_ty = match self.tu.types.get(resolved).kind {
                        TypeKind::Array(elem, _) => elem,
                        TypeKind::Pointer(elem) => elem,
                        _ => {
                            let line = self.current_line();
                            self.errors.error_report(line, "subscripted value is not an array or pointer");
                            self.tu.types.int_ty
                        }
                    };
                    let sub = self.tu.ast.subscript(node, index);
                    node = self.set_ty(sub, elem_ty);
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    let arrow = matches!(self.peek(), TokenKind::Arrow);
                    self.bump();
                    let field = self.expect_identifier("a member name");
                    let base_ty = self.node_ty(node);
                    let field_ty = self.lookup_member_type(base_ty, arrow, &field);
                    let member = self.tu.ast.member(node, field, arrow);
                    node = self.set_ty(member, field_ty);
                }
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_assignment_expr());
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "`)` after call arguments");
                    let ret_ty = self.call_return_type(node);
                    let call = self.tu.ast.call(node, args);
                    node = self.set_ty(call, ret_ty);
                }
                TokenKind::PlusPlus => {
                    self.bump();
                    let ty = self.node_ty(node);
                    let post = self.tu.ast.unary(UnaryOp::PostInc, node);
                    node = self.set_ty(post, ty);
                }
                TokenKind::MinusMinus => {
                    self.bump();
                    let ty = self.node_ty(node);
                    let post = self.tu.ast.unary(UnaryOp::PostDec, node);
                    node = self.set_ty(post, ty);
                }
                _ => break,
            }
        }
        node
    }

    fn lookup_member_type(&mut self, base_ty: TypeId, arrow: bool, field: &str) -> TypeId {
        let struct_ty = if arrow {
            match self.tu.types.get(self.tu.types.resolve(base_ty)).kind {
                TypeKind::Pointer(pointee) => pointee,
                _ => {
                    let line = self.current_line();
                    self.errors.error_report(line, "`->` applied to a non-pointer expression");
                    return self.tu.types.int_ty;
                }
            }
        } else {
            base_ty
        };
        let resolved = self.tu.types.resolve(struct_ty);
        match &self.tu.types.get(resolved).kind {
            TypeKind::Struct { fields: Some(fields), .. } | TypeKind::Union { fields: Some(fields), .. } => {
                match fields.iter().find(|f| f.name == field) {
                    Some(f) => f.ty,
                    None => {
                        let line = self.current_line();
                        self.errors.error_report(line, &format!("no member named `{}`", field));
                        self.tu.types.int_ty
                    }
                }
            }
            _ => {
                let line = self.current_line();
                self.errors.error_report(line, "member access on a non-struct/union value");
                self.tu.types.int_ty
            }
        }
    }

    fn call_return_type(&mut self, callee: NodeId) -> TypeId {
        let callee_ty = self.node_ty(callee);
        let resolved = self.tu.types.resolve(callee_ty);
        match self.tu.types.get(resolved).kind {
            TypeKind::Function { ret, .. } => ret,
            TypeKind::Pointer(pointee) => match self.tu.types.get(self.tu.types.resolve(pointee)).kind {
                TypeKind::Function { ret, .. } => ret,
                _ => self.tu.types.int_ty,
            },
            _ => self.tu.types.int_ty,
        }
    }

    fn parse_primary_expr(&mut self) -> NodeId {
        let line = self.current_line();
        match self.peek().clone() {
            TokenKind::IntConstant(v) => {
                self.bump();
                let node = self.tu.ast.int_constant(v);
                self.set_ty(node, self.tu.types.int_ty)
            }
            TokenKind::FloatConstant(v) => {
                self.bump();
                let node = self.tu.ast.float_constant(v);
                self.set_ty(node, self.tu.types.double_ty)
            }
            TokenKind::CharConstant(v) => {
                self.bump();
                let node = self.tu.ast.char_constant(v);
                self.set_ty(node, self.tu.types.int_ty)
            }
            TokenKind::StringLiteral(s) => {
                self.bump();
                let ty = self.tu.types.pointer_to(self.tu.types.char_ty);
                let node = self.tu.ast.string_literal(s);
                self.set_ty(node, ty)
            }
            TokenKind::Identifier(name) => {
                self.bump();
                let ty = match self.tu.symbols.lookup(&name) {
                    Some(symbol) => symbol.ty,
                    None => {
                        self.errors
                            .error_report(line, &format!("use of undefined identifier `{}`", name));
                        self.tu.types.int_ty
                    }
                };
                let node = self.tu.ast.identifier(name);
                self.set_ty(node, ty)
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression();
                self.expect(&TokenKind::RParen, "`)` to close parenthesized expression");
                inner
            }
            TokenKind::LBrace => self.parse_initializer_list(),
            other => {
                self.errors.error_report(line, &format!("expected an expression, found {:?}", other));
                self.bump();
                let node = self.tu.ast.int_constant(0);
                self.set_ty(node, self.tu.types.int_ty)
            }
        }
    }

    /// `{ e0, e1, ... }`, with a trailing comma before `}` allowed.
    /// Elements are parsed at assignment precedence so a nested brace list
    /// (a struct member that is itself an array, for instance) recurses
    /// back into this same function.
    fn parse_initializer_list(&mut self) -> NodeId {
        self.expect(&TokenKind::LBrace, "`{` to start an initializer list");
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                elements.push(self.parse_assignment_expr());
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
                if self.check(&TokenKind::RBrace) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBrace, "`}` to close an initializer list");
        self.tu.ast.initializer_list(elements)
    }
}
