//! Top-level parsing: the sequence of function definitions, global
//! variable declarations, and bare `struct`/`union`/`enum`/`typedef`
//! declarations that make up a translation unit.

use tidec_lir::symbol::{StorageClass, Symbol};
use tidec_lir::types::TypeId;
use tidec_lexer::TokenKind;

use crate::Parser;

impl<'a> Parser<'a> {
    pub fn parse_program(&mut self) {
        let mut items = Vec::new();
        while !self.at_eof() {
            if let Some(item) = self.parse_external_declaration() {
                items.push(item);
            }
        }
        let root = self.tu.ast.statement_list(items);
        self.tu.root = Some(root);
    }

    fn parse_external_declaration(&mut self) -> Option<tidec_lir::ast::NodeId> {
        let (base, storage) = self.parse_declaration_specifiers();

        // A bare `struct Foo { ... };`/`enum E { ... };` with no
        // declarator at all — the tag definition itself was already
        // registered while parsing the specifiers.
        if self.eat(&TokenKind::Semi) {
            return None;
        }

        let mut result = None;
        loop {
            let mut ty = base;
            while self.eat(&TokenKind::Star) {
                ty = self.tu.types.pointer_to(ty);
            }
            let name = self.expect_identifier("a declarator name");

            if self.check(&TokenKind::LParen) {
                let (func_ty, param_names) = self.parse_function_type(ty);
                if self.check(&TokenKind::LBrace) {
                    return Some(self.parse_function_definition(&name, func_ty, param_names));
                }
                self.register_function_decl(&name, func_ty);
                self.expect(&TokenKind::Semi, "`;` after function declaration");
                return result;
            }

            let var_ty = if self.check(&TokenKind::LBracket) {
                self.parse_array_suffix_toplevel(ty)
            } else {
                ty
            };

            let init = if self.eat(&TokenKind::Assign) {
                Some(self.parse_assignment_expr())
            } else {
                None
            };

            let final_ty = self.fix_up_array_from_string_init(var_ty, init);

            if storage == StorageClass::Typedef {
                let typedef_ty = self.tu.types.typedef(name.clone(), final_ty);
                self.tu.symbols.add_global(Symbol {
                    name,
                    ty: typedef_ty,
                    storage: StorageClass::Typedef,
                    defined: true,
                });
            } else {
                self.tu.symbols.add_global(Symbol {
                    name: name.clone(),
                    ty: final_ty,
                    storage,
                    defined: init.is_some() || storage != StorageClass::Extern,
                });
                result = Some(self.tu.ast.declaration(name, final_ty, init));
            }

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semi, "`;` after declaration");
        result
    }

    /// Sizes an incomplete array (`char s[]`) from a string-literal
    /// initializer's length including the NUL terminator. Initializer
    /// *lists* (`int a[] = {1,2,3}`) are not sized this way — the
    /// original implementation this subset follows only ever handled the
    /// string-literal case.
    fn fix_up_array_from_string_init(&mut self, ty: TypeId, init: Option<tidec_lir::ast::NodeId>) -> TypeId {
        let resolved = self.tu.types.resolve(ty);
        let (elem, count) = match self.tu.types.get(resolved).kind {
            tidec_lir::types::TypeKind::Array(elem, count) => (elem, count),
            _ => return ty,
        };
        if count.is_some() {
            return ty;
        }
        let Some(init) = init else { return ty };
        if let tidec_lir::ast::AstKind::StringLiteral(s) = &self.tu.ast.get(init).kind {
            let len = s.as_bytes().len() as u64 + 1;
            return self.tu.types.array_of(elem, Some(len));
        }
        ty
    }

    fn parse_array_suffix_toplevel(&mut self, base: TypeId) -> TypeId {
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

    /// Parses a parameter list, returning the function type together
    /// with each parameter's name (empty string for an unnamed parameter
    /// in a prototype). `(` has not yet been consumed.
    fn parse_function_type(&mut self, ret: TypeId) -> (TypeId, Vec<String>) {
        self.expect(&TokenKind::LParen, "`(` to start a parameter list");
        let mut params = Vec::new();
        let mut names = Vec::new();
        let mut variadic = false;

        if self.check(&TokenKind::Void) && matches!(self.peek_at(1), TokenKind::RParen) {
            self.bump();
        } else if !self.check(&TokenKind::RParen) {
            loop {
                if self.eat(&TokenKind::Ellipsis) {
                    variadic = true;
                    break;
                }
                let (param_base, _) = self.parse_declaration_specifiers();
                let mut param_ty = param_base;
                while self.eat(&TokenKind::Star) {
                    param_ty = self.tu.types.pointer_to(param_ty);
                }
                // Parameter names are optional in a prototype; a
                // definition's parameters are always named.
                let param_name = if matches!(self.peek(), TokenKind::Identifier(_)) {
                    self.expect_identifier("a parameter name")
                } else {
                    String::new()
                };
                if self.check(&TokenKind::LBracket) {
                    // `T name[]` as a parameter is really `T*`.
                    self.bump();
                    if !self.check(&TokenKind::RBracket) {
                        let expr = self.parse_assignment_expr();
                        self.tu.ast.evaluate_constant(expr);
                    }
                    self.expect(&TokenKind::RBracket, "`]` in array parameter");
                    param_ty = self.tu.types.pointer_to(param_ty);
                }
                params.push(param_ty);
                names.push(param_name);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "`)` to end a parameter list");
        (self.tu.types.function_of(params, ret, variadic, false), names)
    }

    fn register_function_decl(&mut self, name: &str, ty: TypeId) {
        let already_defined = self.tu.symbols.lookup(name).map(|s| s.defined).unwrap_or(false);
        self.tu.symbols.add_global(Symbol {
            name: name.to_string(),
            ty,
            storage: StorageClass::Extern,
            defined: already_defined,
        });
    }

    fn parse_function_definition(
        &mut self,
        name: &str,
        ty: TypeId,
        param_names: Vec<String>,
    ) -> tidec_lir::ast::NodeId {
        self.tu.symbols.add_global(Symbol {
            name: name.to_string(),
            ty,
            storage: StorageClass::Extern,
            defined: true,
        });

        let param_types = match &self.tu.types.get(self.tu.types.resolve(ty)).kind {
            tidec_lir::types::TypeKind::Function { params, .. } => params.clone(),
            _ => Vec::new(),
        };

        self.tu.symbols.enter_scope();
        for (param_name, param_ty) in param_names.iter().zip(param_types.iter()) {
            if param_name.is_empty() {
                continue;
            }
            self.tu.symbols.add_local(Symbol {
                name: param_name.clone(),
                ty: *param_ty,
                storage: StorageClass::Auto,
                defined: true,
            });
        }
        let body = self.parse_compound_statement();
        self.tu.symbols.exit_scope();

        self.tu.ast.function_definition(name, ty, param_names, body)
    }
}
