//! The data model shared by the parser and the emitter: the type system,
//! the AST, and the symbol table for one translation unit.

pub mod ast;
pub mod symbol;
pub mod types;

pub use ast::{Ast, AstKind, AstNode, BinaryOp, Constant, NodeId, UnaryOp};
pub use symbol::{StorageClass, Symbol, SymbolTable, TagKind};
pub use types::{BasicKind, Field, TypeId, TypeInfo, TypeKind, TypeSystem};

/// Everything a parser or emitter needs to process one translation unit:
/// the interned types, the AST nodes parsed so far, and the symbol table
/// tracking what each name currently refers to.
pub struct TranslationUnit {
    pub types: TypeSystem,
    pub ast: Ast,
    pub symbols: SymbolTable,
    /// The root node, a `StatementList` of top-level declarations and
    /// function definitions, set once parsing finishes.
    pub root: Option<NodeId>,
}

impl TranslationUnit {
    pub fn new() -> Self {
        let mut types = TypeSystem::new();
        let symbols = SymbolTable::new(&mut types);
        TranslationUnit { types, ast: Ast::new(), symbols, root: None }
    }
}

impl Default for TranslationUnit {
    fn default() -> Self {
        Self::new()
    }
}
