//! The symbol table: name resolution for ordinary identifiers and for the
//! separate `struct`/`union`/`enum` tag namespace, plus scoping for
//! function-local variables.

use std::collections::HashMap;

use crate::types::{TypeId, TypeSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Auto,
    Static,
    Extern,
    /// Introduced by `typedef`; the symbol names a type, not a value.
    Typedef,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: TypeId,
    pub storage: StorageClass,
    /// True once a function/variable has a defining (not just declaring)
    /// occurrence, so a second definition can be rejected.
    pub defined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Struct,
    Union,
    Enum,
}

/// One level of block scope for local variables. Function parameters and
/// the function body's outermost block share scope 0; nested `{ }` blocks
/// push additional scopes that are popped on exit.
#[derive(Default)]
struct Scope {
    names: HashMap<String, Symbol>,
}

/// Global append-only symbol store plus a stack of local scopes, mirroring
/// a two-tier table: symbols declared at file scope outlive the whole
/// translation unit, while locals are only visible for the lifetime of the
/// function currently being parsed/emitted.
pub struct SymbolTable {
    globals: Vec<Symbol>,
    locals: Vec<Scope>,
    tags: HashMap<String, (TagKind, TypeId)>,
    /// Every struct/union type ever defined, in definition order, so the
    /// emitter can walk them to emit `%name = type { ... }` declarations
    /// without re-deriving the order from the tag map (whose iteration
    /// order is unspecified).
    all_aggregates: Vec<TypeId>,
}

impl SymbolTable {
    pub fn new(types: &mut TypeSystem) -> Self {
        let mut table = SymbolTable {
            globals: Vec::new(),
            locals: Vec::new(),
            tags: HashMap::new(),
            all_aggregates: Vec::new(),
        };
        table.register_builtins(types);
        table
    }

    fn register_builtins(&mut self, types: &mut TypeSystem) {
        // `__builtin_va_list` is treated as an opaque, pointer-sized
        // struct so that `va_list ap;` parses and type-checks as an
        // ordinary declaration before the emitter special-cases
        // `__builtin_va_start`/`__builtin_va_end` calls on it.
        let va_list_struct = types.declare_struct("__va_list_tag".to_string());
        types.define_struct(va_list_struct, vec![]);
        self.add_global(Symbol {
            name: "__builtin_va_list".to_string(),
            ty: va_list_struct,
            storage: StorageClass::Typedef,
            defined: true,
        });
    }

    pub fn enter_scope(&mut self) {
        self.locals.push(Scope::default());
    }

    pub fn exit_scope(&mut self) {
        self.locals.pop();
    }

    /// Drops every local scope, used when starting a new function.
    pub fn clear_locals(&mut self) {
        self.locals.clear();
    }

    pub fn add_global(&mut self, symbol: Symbol) {
        self.globals.push(symbol);
    }

    /// Adds a symbol to the innermost active local scope. Panics if called
    /// with no scope entered, which would indicate a parser bug (every
    /// function body enters at least one scope before declaring locals).
    pub fn add_local(&mut self, symbol: Symbol) {
        self.locals
            .last_mut()
            .expect("add_local called with no local scope entered")
            .names
            .insert(symbol.name.clone(), symbol);
    }

    /// Looks up `name`, innermost local scope first, then file scope —
    /// the ordinary C shadowing rule.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        for scope in self.locals.iter().rev() {
            if let Some(symbol) = scope.names.get(name) {
                return Some(symbol);
            }
        }
        self.globals.iter().rev().find(|s| s.name == name)
    }

    /// True if `name` was declared via `typedef`, the lexical-feedback
    /// query the parser consults to disambiguate `T * x;` (declaration)
    /// from `t * x;` (multiplication expression).
    pub fn is_typedef_name(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some(s) if s.storage == StorageClass::Typedef)
    }

    pub fn tag_add(&mut self, name: String, kind: TagKind, ty: TypeId) {
        if matches!(kind, TagKind::Struct | TagKind::Union) {
            self.all_aggregates.push(ty);
        }
        self.tags.insert(name, (kind, ty));
    }

    pub fn tag_lookup(&self, name: &str) -> Option<(TagKind, TypeId)> {
        self.tags.get(name).copied()
    }

    pub fn globals(&self) -> &[Symbol] {
        &self.globals
    }

    pub fn all_aggregates(&self) -> &[TypeId] {
        &self.all_aggregates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_va_list_is_preregistered() {
        let mut types = TypeSystem::new();
        let table = SymbolTable::new(&mut types);
        assert!(table.is_typedef_name("__builtin_va_list"));
    }

    #[test]
    fn local_shadows_global() {
        let mut types = TypeSystem::new();
        let mut table = SymbolTable::new(&mut types);
        table.add_global(Symbol {
            name: "x".to_string(),
            ty: types.int_ty,
            storage: StorageClass::Extern,
            defined: true,
        });
        table.enter_scope();
        table.add_local(Symbol {
            name: "x".to_string(),
            ty: types.char_ty,
            storage: StorageClass::Auto,
            defined: true,
        });
        assert_eq!(table.lookup("x").unwrap().ty, types.char_ty);
        table.exit_scope();
        assert_eq!(table.lookup("x").unwrap().ty, types.int_ty);
    }

    #[test]
    fn clear_locals_drops_every_scope() {
        let mut types = TypeSystem::new();
        let mut table = SymbolTable::new(&mut types);
        table.enter_scope();
        table.add_local(Symbol {
            name: "y".to_string(),
            ty: types.int_ty,
            storage: StorageClass::Auto,
            defined: true,
        });
        table.clear_locals();
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn tag_lookup_returns_registered_struct() {
        let mut types = TypeSystem::new();
        let mut table = SymbolTable::new(&mut types);
        let p = types.declare_struct("P".to_string());
        table.tag_add("P".to_string(), TagKind::Struct, p);
        let (kind, ty) = table.tag_lookup("P").unwrap();
        assert_eq!(kind, TagKind::Struct);
        assert_eq!(ty, p);
    }
}
