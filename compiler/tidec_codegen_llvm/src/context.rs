//! Owns the module-level output buffers and orchestrates the emission
//! order the rest of this crate's modules feed into.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use tidec_abi::LirTarget;
use tidec_lir::TranslationUnit;
use tidec_log::ErrorSink;

/// Everything needed to emit one translation unit's IR text.
pub struct CodegenCtx<'a> {
    pub tu: &'a TranslationUnit,
    pub errors: ErrorSink,
    pub target: LirTarget,

    struct_types: String,
    functions: String,
    globals: String,
    declarations: String,
    strings: String,

    /// Maps a string literal's contents to the name of the global already
    /// emitted for it, so two occurrences of the same literal share one
    /// constant (matching the original's string-interning behavior).
    string_table: HashMap<String, String>,
    next_string_id: u32,

    /// Names already given an external `declare`, so a callee seen more
    /// than once is only declared the first time.
    declared_externals: HashSet<String>,
}

impl<'a> CodegenCtx<'a> {
    pub fn new(tu: &'a TranslationUnit) -> Self {
        CodegenCtx {
            tu,
            errors: ErrorSink::new(),
            target: LirTarget::new(),
            struct_types: String::new(),
            functions: String::new(),
            globals: String::new(),
            declarations: String::new(),
            strings: String::new(),
            string_table: HashMap::new(),
            next_string_id: 0,
            declared_externals: HashSet::new(),
        }
    }

    pub fn push_struct_type(&mut self, line: impl AsRef<str>) {
        writeln!(self.struct_types, "{}", line.as_ref()).unwrap();
    }

    pub fn push_function(&mut self, text: impl AsRef<str>) {
        self.functions.push_str(text.as_ref());
        self.functions.push('\n');
    }

    pub fn push_global(&mut self, line: impl AsRef<str>) {
        writeln!(self.globals, "{}", line.as_ref()).unwrap();
    }

    /// Declares an external function once, e.g. for an implicitly-declared
    /// callee or a runtime intrinsic (`llvm.va_start`). Subsequent calls
    /// for the same `name` are no-ops.
    pub fn declare_external(&mut self, name: &str, signature: impl AsRef<str>) {
        if self.declared_externals.insert(name.to_string()) {
            writeln!(self.declarations, "declare {}", signature.as_ref()).unwrap();
        }
    }

    /// Interns a string literal's bytes, returning the name of the global
    /// constant holding it (creating one the first time this exact
    /// content is seen).
    pub fn intern_string(&mut self, contents: &str) -> String {
        if let Some(name) = self.string_table.get(contents) {
            return name.clone();
        }
        let name = format!("@.str{}", self.next_string_id);
        self.next_string_id += 1;

        let byte_len = contents.as_bytes().len() + 1; // NUL terminator
        let escaped = escape_llvm_string(contents);
        writeln!(
            self.strings,
            "{} = private unnamed_addr constant [{} x i8] c\"{}\\00\"",
            name, byte_len, escaped
        )
        .unwrap();

        self.string_table.insert(contents.to_string(), name.clone());
        name
    }

    /// Assembles the final module text in the fixed emission order: target
    /// header, struct type definitions, function definitions, globals,
    /// external function declarations, string constants.
    pub fn finish(self) -> String {
        let mut out = String::new();

        if let Some(triple) = self.target.target_triple_string() {
            writeln!(out, "target triple = \"{}\"", triple).unwrap();
        }
        writeln!(
            out,
            "target datalayout = \"{}\"",
            self.target.data_layout_string()
        )
        .unwrap();
        out.push('\n');

        if !self.struct_types.is_empty() {
            out.push_str(&self.struct_types);
            out.push('\n');
        }
        out.push_str(&self.functions);
        if !self.globals.is_empty() {
            out.push('\n');
            out.push_str(&self.globals);
        }
        if !self.declarations.is_empty() {
            out.push('\n');
            out.push_str(&self.declarations);
        }
        if !self.strings.is_empty() {
            out.push('\n');
            out.push_str(&self.strings);
        }

        out
    }
}

/// Escapes a string's bytes the way LLVM's IR printer does: every
/// non-printable-ASCII byte (and `"`/`\`) becomes `\XX` hex.
pub fn escape_llvm_string(s: &str) -> String {
    let mut out = String::new();
    for byte in s.as_bytes() {
        match byte {
            b'"' | b'\\' => {
                write!(out, "\\{:02X}", byte).unwrap();
            }
            0x20..=0x7e => out.push(*byte as char),
            _ => {
                write!(out, "\\{:02X}", byte).unwrap();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_literal_twice_reuses_the_global() {
        let tu = TranslationUnit::new();
        let mut ctx = CodegenCtx::new(&tu);
        let a = ctx.intern_string("hello");
        let b = ctx.intern_string("hello");
        assert_eq!(a, b);
        let c = ctx.intern_string("world");
        assert_ne!(a, c);
    }

    #[test]
    fn declaring_an_external_twice_emits_once() {
        let tu = TranslationUnit::new();
        let mut ctx = CodegenCtx::new(&tu);
        ctx.declare_external("printf", "i32 @printf(i8*, ...)");
        ctx.declare_external("printf", "i32 @printf(i8*, ...)");
        let out = ctx.finish();
        assert_eq!(out.matches("declare i32 @printf").count(), 1);
    }

    #[test]
    fn escape_handles_quotes_and_newlines() {
        assert_eq!(escape_llvm_string("a\"b"), "a\\22b");
        assert_eq!(escape_llvm_string("a\nb"), "a\\0Ab");
    }
}
