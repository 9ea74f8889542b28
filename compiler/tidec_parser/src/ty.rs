//! Type-specifier and declarator parsing: `struct`/`union`/`enum`
//! definitions and references, storage classes, `typedef`, and the
//! pointer/array suffixes a declarator can carry. Function-pointer and
//! other nested declarators are not supported — a declarator is always
//! `TYPE *...* name [N]...` or, at top level, `TYPE *...* name(params)`.

use tidec_lir::symbol::{StorageClass, Symbol, TagKind};
use tidec_lir::types::{Field, TypeId};
use tidec_lexer::TokenKind;

use crate::Parser;

impl<'a> Parser<'a> {
    /// True if the current token could begin a type (used to disambiguate
    /// a declaration from an expression statement, and to recognize a
    /// parenthesized cast/`sizeof(type)`).
    pub(crate) fn at_type_start(&self) -> bool {
        match self.peek() {
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
            | TokenKind::Typedef
            | TokenKind::Static
            | TokenKind::Extern
            | TokenKind::Auto
            | TokenKind::Register
            | TokenKind::Const
            | TokenKind::Volatile => true,
            TokenKind::Identifier(name) => self.tu.symbols.is_typedef_name(name),
            _ => false,
        }
    }

    /// Parses storage-class specifiers, qualifiers (accepted and
    /// discarded — this subset does not track `const`/`volatile`, a
    /// deliberate simplification recorded in DESIGN.md), and the base
    /// type, in any order, the way C's grammar actually allows them to be
    /// interleaved.
    pub(crate) fn parse_declaration_specifiers(&mut self) -> (TypeId, StorageClass) {
        let mut storage = StorageClass::Auto;
        let mut base: Option<TypeId> = None;
        let mut signed_seen = false;
        let mut unsigned_seen = false;

        loop {
            match self.peek().clone() {
                TokenKind::Typedef => {
                    storage = StorageClass::Typedef;
                    self.bump();
                }
                TokenKind::Static => {
                    storage = StorageClass::Static;
                    self.bump();
                }
                TokenKind::Extern => {
                    storage = StorageClass::Extern;
                    self.bump();
                }
                TokenKind::Auto | TokenKind::Register => {
                    self.bump();
                }
                TokenKind::Const | TokenKind::Volatile => {
                    self.bump();
                }
                TokenKind::Signed => {
                    signed_seen = true;
                    self.bump();
                }
                TokenKind::Unsigned => {
                    unsigned_seen = true;
                    self.bump();
                }
                TokenKind::Void => {
                    base = Some(self.tu.types.void);
                    self.bump();
                }
                TokenKind::Bool => {
                    base = Some(self.tu.types.bool_ty);
                    self.bump();
                }
                TokenKind::Char => {
                    base = Some(self.tu.types.char_ty);
                    self.bump();
                }
                TokenKind::Short => {
                    base = Some(self.tu.types.short_ty);
                    self.bump();
                }
                TokenKind::Int => {
                    base = Some(self.tu.types.int_ty);
                    self.bump();
                }
                TokenKind::Long => {
                    base = Some(self.tu.types.long_ty);
                    self.bump();
                }
                TokenKind::Float => {
                    base = Some(self.tu.types.float_ty);
                    self.bump();
                }
                TokenKind::Double => {
                    base = Some(self.tu.types.double_ty);
                    self.bump();
                }
                TokenKind::Struct => {
                    base = Some(self.parse_struct_or_union(true));
                }
                TokenKind::Union => {
                    base = Some(self.parse_struct_or_union(false));
                }
                TokenKind::Enum => {
                    base = Some(self.parse_enum());
                }
                TokenKind::Identifier(name) if base.is_none() && self.tu.symbols.is_typedef_name(&name) => {
                    base = self.tu.symbols.lookup(&name).map(|s| s.ty);
                    self.bump();
                }
                _ => break,
            }
        }

        let resolved = base.unwrap_or_else(|| {
            // `unsigned`/`signed` with no other base type names `int`,
            // same as plain `int` (all integers are signed in this
            // subset, so the two keywords are otherwise no-ops).
            if unsigned_seen || signed_seen {
                self.tu.types.int_ty
            } else {
                let line = self.current_line();
                self.errors.error_report(line, "expected a type specifier");
                // Nothing in the loop above consumed a token on this path,
                // so skip the offending one here to keep the caller making
                // forward progress.
                if !self.at_eof() {
                    self.bump();
                }
                self.tu.types.int_ty
            }
        });
        (resolved, storage)
    }

    fn parse_struct_or_union(&mut self, is_struct: bool) -> TypeId {
        self.bump(); // `struct` / `union`

        let tag = match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.bump();
                name
            }
            _ => self.tu.types.next_anon_tag(),
        };

        if !self.check(&TokenKind::LBrace) {
            // A reference to a previously declared (or forward-declared)
            // tag, e.g. `struct P p;` or a recursive `struct Node *next;`.
            return match self.tu.symbols.tag_lookup(&tag) {
                Some((_, ty)) => ty,
                None => {
                    let id = if is_struct {
                        self.tu.types.declare_struct(tag.clone())
                    } else {
                        self.tu.types.declare_union(tag.clone())
                    };
                    let kind = if is_struct { TagKind::Struct } else { TagKind::Union };
                    self.tu.symbols.tag_add(tag, kind, id);
                    id
                }
            };
        }

        self.bump(); // `{`

        let id = match self.tu.symbols.tag_lookup(&tag) {
            Some((_, ty)) => ty,
            None => {
                let id = if is_struct {
                    self.tu.types.declare_struct(tag.clone())
                } else {
                    self.tu.types.declare_union(tag.clone())
                };
                let kind = if is_struct { TagKind::Struct } else { TagKind::Union };
                self.tu.symbols.tag_add(tag.clone(), kind, id);
                id
            }
        };

        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            let (member_base, _) = self.parse_declaration_specifiers();
            loop {
                let (name, member_ty) = self.parse_declarator(member_base);
                fields.push(Field { name, ty: member_ty, offset: 0 });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Semi, "`;` after member declaration");
        }
        self.expect(&TokenKind::RBrace, "`}` to close struct/union body");

        if is_struct {
            self.tu.types.define_struct(id, fields);
        } else {
            self.tu.types.define_union(id, fields);
        }
        id
    }

    fn parse_enum(&mut self) -> TypeId {
        self.bump(); // `enum`
        let tag = match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.bump();
                name
            }
            _ => self.tu.types.next_anon_tag(),
        };

        if !self.check(&TokenKind::LBrace) {
            return match self.tu.symbols.tag_lookup(&tag) {
                Some((_, ty)) => ty,
                None => {
                    let line = self.current_line();
                    self.errors.error_report(line, &format!("undefined enum tag `{}`", tag));
                    self.tu.types.int_ty
                }
            };
        }
        self.bump(); // `{`

        let mut enumerators = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            let name = self.expect_identifier("an enumerator name");
            let explicit = if self.eat(&TokenKind::Assign) {
                let expr = self.parse_assignment_expr();
                self.tu.ast.evaluate_constant(expr)
            } else {
                None
            };
            enumerators.push((name, explicit));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "`}` to close enum body");

        let id = self.tu.types.define_enum(tag.clone(), enumerators.clone());
        self.tu.symbols.tag_add(tag, TagKind::Enum, id);

        // Each enumerator is also an ordinary identifier usable anywhere
        // an `int` constant is, so it is entered into the global symbol
        // table as one.
        let resolved_values: Vec<(String, i64)> = match &self.tu.types.get(id).kind {
            tidec_lir::types::TypeKind::Enum { enumerators, .. } => enumerators.clone(),
            _ => unreachable!(),
        };
        for (name, _value) in resolved_values {
            self.tu.symbols.add_global(Symbol {
                name,
                ty: id,
                storage: StorageClass::Auto,
                defined: true,
            });
        }
        id
    }

    /// Parses the pointer/array suffixes of a declarator and the name
    /// they decorate. `base` is the type already parsed from the
    /// declaration specifiers (e.g. `int` in `int *x[3]`).
    pub(crate) fn parse_declarator(&mut self, mut base: TypeId) -> (String, TypeId) {
        while self.eat(&TokenKind::Star) {
            while matches!(self.peek(), TokenKind::Const | TokenKind::Volatile) {
                self.bump();
            }
            base = self.tu.types.pointer_to(base);
        }

        let name = self.expect_identifier("a declarator name");

        if self.check(&TokenKind::LBracket) {
            return (name, self.parse_array_suffix(base));
        }
        (name, base)
    }

    /// Parses one or more `[N]`/`[]` suffixes, building the array type
    /// from the innermost dimension outward so `int a[2][3]` is an array
    /// of 2 arrays of 3 `int`s.
    fn parse_array_suffix(&mut self, base: TypeId) -> TypeId {
        let mut dims = Vec::new();
        while self.eat(&TokenKind::LBracket) {
            let count = if self.check(&TokenKind::RBracket) {
                None
            } else {
                let expr = self.parse_assignment_expr();
                self.tu.ast.evaluate_constant(expr).map(|v| v as u64)
            };
            self.expect(&TokenKind::RBracket, "`]` to close array dimension");
            dims.push(count);
        }
        let mut ty = base;
        for count in dims.into_iter().rev() {
            ty = self.tu.types.array_of(ty, count);
        }
        ty
    }

    /// Parses a bare type name for a cast or `sizeof(T)`: declaration
    /// specifiers followed by an abstract declarator (pointers and array
    /// brackets only, no identifier).
    pub(crate) fn parse_type_name(&mut self) -> TypeId {
        let (mut base, _) = self.parse_declaration_specifiers();
        while self.eat(&TokenKind::Star) {
            base = self.tu.types.pointer_to(base);
        }
        if self.check(&TokenKind::LBracket) {
            let mut dims = Vec::new();
            while self.eat(&TokenKind::LBracket) {
                let count = if self.check(&TokenKind::RBracket) {
                    None
                } else {
                    let expr = self.parse_assignment_expr();
                    self.tu.ast.evaluate_constant(expr).map(|v| v as u64)
                };
                self.expect(&TokenKind::RBracket, "`]` to close array dimension");
                dims.push(count);
            }
            for count in dims.into_iter().rev() {
                base = self.tu.types.array_of(base, count);
            }
        }
        base
    }
}
