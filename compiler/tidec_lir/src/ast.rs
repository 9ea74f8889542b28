//! The abstract syntax tree produced by the parser and consumed by the
//! emitter.
//!
//! Nodes live in an [`tidec_utils::arena::Arena`] and are addressed by
//! [`NodeId`] handles rather than owned/boxed pointers, so a tree can be
//! built bottom-up without `Rc`/`RefCell` and without per-node lifetimes.

use tidec_utils::arena::{Arena, Id};

use crate::types::TypeId;

pub type NodeId = Id<AstNode>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    LogAnd,
    LogOr,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    /// `a, b`: evaluate `a` for its side effects, discard it, yield `b`.
    Comma,
}

impl BinaryOp {
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
                | BinaryOp::AndAssign
                | BinaryOp::OrAssign
                | BinaryOp::XorAssign
                | BinaryOp::ShlAssign
                | BinaryOp::ShrAssign
        )
    }

    /// The non-assignment operator a compound assignment expands to, e.g.
    /// `+=` expands to `+` for the implicit `a = a + b` lowering.
    pub fn underlying(self) -> BinaryOp {
        match self {
            BinaryOp::AddAssign => BinaryOp::Add,
            BinaryOp::SubAssign => BinaryOp::Sub,
            BinaryOp::MulAssign => BinaryOp::Mul,
            BinaryOp::DivAssign => BinaryOp::Div,
            BinaryOp::ModAssign => BinaryOp::Mod,
            BinaryOp::AndAssign => BinaryOp::BitAnd,
            BinaryOp::OrAssign => BinaryOp::BitOr,
            BinaryOp::XorAssign => BinaryOp::BitXor,
            BinaryOp::ShlAssign => BinaryOp::Shl,
            BinaryOp::ShrAssign => BinaryOp::Shr,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    BitNot,
    AddrOf,
    Deref,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    /// `sizeof expr` — distinct from `SizeofType` below, which takes a
    /// type name directly rather than evaluating an expression's type.
    SizeofExpr,
}

#[derive(Debug, Clone)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Char(i64),
}

#[derive(Debug, Clone)]
pub enum AstKind {
    Identifier(String),
    Constant(Constant),
    StringLiteral(String),
    /// `{ e0, e1, ... }` — a brace initializer for an array or struct
    /// declaration; never appears anywhere an ordinary expression can.
    InitializerList(Vec<NodeId>),

    BinaryOp { op: BinaryOp, lhs: NodeId, rhs: NodeId },
    UnaryOp { op: UnaryOp, operand: NodeId },
    Cast { target: TypeId, operand: NodeId },
    SizeofType { target: TypeId },
    Conditional { cond: NodeId, then_branch: NodeId, else_branch: NodeId },
    Call { callee: NodeId, args: Vec<NodeId> },
    Subscript { base: NodeId, index: NodeId },
    Member { base: NodeId, field: String, arrow: bool },

    ExprStatement(NodeId),
    CompoundStatement(Vec<NodeId>),
    Declaration { name: String, ty: TypeId, init: Option<NodeId> },
    If { cond: NodeId, then_branch: NodeId, else_branch: Option<NodeId> },
    While { cond: NodeId, body: NodeId },
    DoWhile { body: NodeId, cond: NodeId },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
    },
    Switch { scrutinee: NodeId, body: NodeId },
    Case { value: i64, body: NodeId },
    Default { body: NodeId },
    Return(Option<NodeId>),
    Break,
    Continue,
    Goto(String),
    Label(String),
    /// The list of top-level declarations/definitions making up the whole
    /// translation unit; also used for a function's parameter/body pairing
    /// when convenient for the emitter to walk uniformly.
    StatementList(Vec<NodeId>),
    FunctionDefinition {
        name: String,
        ty: TypeId,
        params: Vec<String>,
        body: NodeId,
    },
}

#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: AstKind,
    /// Set once a semantic pass resolves the expression's static type;
    /// `None` for statement-level nodes that have no value.
    pub ty: Option<TypeId>,
}

/// Owns every [`AstNode`] produced while parsing one translation unit.
pub struct Ast {
    arena: Arena<AstNode>,
}

impl Ast {
    pub fn new() -> Self {
        Ast { arena: Arena::new() }
    }

    pub fn get(&self, id: NodeId) -> &AstNode {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut AstNode {
        self.arena.get_mut(id)
    }

    fn push(&mut self, kind: AstKind) -> NodeId {
        self.arena.alloc(AstNode { kind, ty: None })
    }

    pub fn identifier(&mut self, name: impl Into<String>) -> NodeId {
        self.push(AstKind::Identifier(name.into()))
    }

    pub fn int_constant(&mut self, value: i64) -> NodeId {
        self.push(AstKind::Constant(Constant::Int(value)))
    }

    pub fn float_constant(&mut self, value: f64) -> NodeId {
        self.push(AstKind::Constant(Constant::Float(value)))
    }

    pub fn char_constant(&mut self, value: i64) -> NodeId {
        self.push(AstKind::Constant(Constant::Char(value)))
    }

    pub fn string_literal(&mut self, value: impl Into<String>) -> NodeId {
        self.push(AstKind::StringLiteral(value.into()))
    }

    pub fn initializer_list(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.push(AstKind::InitializerList(elements))
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(AstKind::BinaryOp { op, lhs, rhs })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        self.push(AstKind::UnaryOp { op, operand })
    }

    pub fn cast(&mut self, target: TypeId, operand: NodeId) -> NodeId {
        self.push(AstKind::Cast { target, operand })
    }

    pub fn sizeof_type(&mut self, target: TypeId) -> NodeId {
        self.push(AstKind::SizeofType { target })
    }

    pub fn conditional(&mut self, cond: NodeId, then_branch: NodeId, else_branch: NodeId) -> NodeId {
        self.push(AstKind::Conditional { cond, then_branch, else_branch })
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.push(AstKind::Call { callee, args })
    }

    pub fn subscript(&mut self, base: NodeId, index: NodeId) -> NodeId {
        self.push(AstKind::Subscript { base, index })
    }

    pub fn member(&mut self, base: NodeId, field: impl Into<String>, arrow: bool) -> NodeId {
        self.push(AstKind::Member { base, field: field.into(), arrow })
    }

    pub fn expr_statement(&mut self, expr: NodeId) -> NodeId {
        self.push(AstKind::ExprStatement(expr))
    }

    pub fn compound(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.push(AstKind::CompoundStatement(statements))
    }

    pub fn declaration(&mut self, name: impl Into<String>, ty: TypeId, init: Option<NodeId>) -> NodeId {
        self.push(AstKind::Declaration { name: name.into(), ty, init })
    }

    pub fn if_stmt(&mut self, cond: NodeId, then_branch: NodeId, else_branch: Option<NodeId>) -> NodeId {
        self.push(AstKind::If { cond, then_branch, else_branch })
    }

    pub fn while_stmt(&mut self, cond: NodeId, body: NodeId) -> NodeId {
        self.push(AstKind::While { cond, body })
    }

    pub fn do_while_stmt(&mut self, body: NodeId, cond: NodeId) -> NodeId {
        self.push(AstKind::DoWhile { body, cond })
    }

    pub fn for_stmt(
        &mut self,
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.push(AstKind::For { init, cond, step, body })
    }

    pub fn switch_stmt(&mut self, scrutinee: NodeId, body: NodeId) -> NodeId {
        self.push(AstKind::Switch { scrutinee, body })
    }

    pub fn case_stmt(&mut self, value: i64, body: NodeId) -> NodeId {
        self.push(AstKind::Case { value, body })
    }

    pub fn default_stmt(&mut self, body: NodeId) -> NodeId {
        self.push(AstKind::Default { body })
    }

    pub fn return_stmt(&mut self, value: Option<NodeId>) -> NodeId {
        self.push(AstKind::Return(value))
    }

    pub fn break_stmt(&mut self) -> NodeId {
        self.push(AstKind::Break)
    }

    pub fn continue_stmt(&mut self) -> NodeId {
        self.push(AstKind::Continue)
    }

    pub fn goto_stmt(&mut self, label: impl Into<String>) -> NodeId {
        self.push(AstKind::Goto(label.into()))
    }

    pub fn label_stmt(&mut self, label: impl Into<String>) -> NodeId {
        self.push(AstKind::Label(label.into()))
    }

    pub fn statement_list(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.push(AstKind::StatementList(statements))
    }

    pub fn function_definition(
        &mut self,
        name: impl Into<String>,
        ty: TypeId,
        params: Vec<String>,
        body: NodeId,
    ) -> NodeId {
        self.push(AstKind::FunctionDefinition { name: name.into(), ty, params, body })
    }

    /// Folds a constant integer expression, used to resolve array
    /// dimensions (`int a[N]`) and enum initializers that are not bare
    /// literals. Only a narrow set of forms is folded: integer/char
    /// literals, the four arithmetic binary ops (`+ - * /`) between two
    /// already-foldable operands, and unary `-`/`~`. Anything else (a
    /// function call, an identifier that isn't itself a folded enumerator,
    /// floating point, `sizeof`) returns `None` and the caller reports a
    /// "not a constant expression" diagnostic.
    pub fn evaluate_constant(&self, id: NodeId) -> Option<i64> {
        match &self.get(id).kind {
            AstKind::Constant(Constant::Int(v)) => Some(*v),
            AstKind::Constant(Constant::Char(v)) => Some(*v),
            AstKind::UnaryOp { op: UnaryOp::Neg, operand } => {
                self.evaluate_constant(*operand).map(|v| -v)
            }
            AstKind::UnaryOp { op: UnaryOp::BitNot, operand } => {
                self.evaluate_constant(*operand).map(|v| !v)
            }
            AstKind::BinaryOp { op, lhs, rhs } => {
                let lhs = self.evaluate_constant(*lhs)?;
                let rhs = self.evaluate_constant(*rhs)?;
                match op {
                    BinaryOp::Add => Some(lhs + rhs),
                    BinaryOp::Sub => Some(lhs - rhs),
                    BinaryOp::Mul => Some(lhs * rhs),
                    // Division/modulo by a folded zero yields 0 rather than
                    // aborting folding; the diagnostic for an actual
                    // division by zero at runtime is the emitted program's
                    // problem, not the compiler's.
                    BinaryOp::Div => Some(if rhs == 0 { 0 } else { lhs / rhs }),
                    BinaryOp::Mod => Some(if rhs == 0 { 0 } else { lhs % rhs }),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_binary_arithmetic() {
        let mut ast = Ast::new();
        let two = ast.int_constant(2);
        let three = ast.int_constant(3);
        let sum = ast.binary(BinaryOp::Add, two, three);
        assert_eq!(ast.evaluate_constant(sum), Some(5));
    }

    #[test]
    fn folds_unary_negation_for_array_dimensions() {
        let mut ast = Ast::new();
        let one = ast.int_constant(1);
        let neg = ast.unary(UnaryOp::Neg, one);
        let four = ast.int_constant(4);
        let dim = ast.binary(BinaryOp::Add, neg, four);
        assert_eq!(ast.evaluate_constant(dim), Some(3));
    }

    #[test]
    fn folds_bitwise_not() {
        let mut ast = Ast::new();
        let zero = ast.int_constant(0);
        let not = ast.unary(UnaryOp::BitNot, zero);
        assert_eq!(ast.evaluate_constant(not), Some(-1));
    }

    #[test]
    fn refuses_to_fold_a_call() {
        let mut ast = Ast::new();
        let callee = ast.identifier("f");
        let call = ast.call(callee, vec![]);
        assert_eq!(ast.evaluate_constant(call), None);
    }

    #[test]
    fn compound_assign_expands_to_its_underlying_operator() {
        assert_eq!(BinaryOp::AddAssign.underlying(), BinaryOp::Add);
        assert!(BinaryOp::AddAssign.is_assignment());
        assert!(!BinaryOp::Add.is_assignment());
    }
}
