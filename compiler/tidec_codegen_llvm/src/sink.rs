//! Two-buffer output sink used while emitting one function body.
//!
//! LLVM (and this emitter's literal-IR-text testing) expects every
//! `alloca` in a function to precede any other instruction in the entry
//! block. Declarations, however, are discovered as the statement list is
//! walked top to bottom, possibly deep inside nested blocks. Rather than
//! pre-scanning the whole function body for declarations before emitting
//! anything, every `alloca` is written to a *second* buffer as it is
//! discovered, and the two buffers are spliced together only once the
//! whole function has been emitted: allocas first, then everything else.

use std::fmt::Write as _;

#[derive(Default)]
pub struct Sink {
    /// Every non-alloca instruction, in emission order.
    body: String,
    /// Every `alloca`, in the order declarations were discovered.
    allocas: String,
}

impl Sink {
    pub fn new() -> Self {
        Sink::default()
    }

    /// Appends a line (without a trailing newline of its own) to the main
    /// instruction stream.
    pub fn emit(&mut self, line: impl AsRef<str>) {
        writeln!(self.body, "  {}", line.as_ref()).unwrap();
    }

    /// Appends a raw, already-indented line (used for labels, which are
    /// not indented) to the main instruction stream.
    pub fn emit_raw(&mut self, line: impl AsRef<str>) {
        writeln!(self.body, "{}", line.as_ref()).unwrap();
    }

    /// Appends an `alloca` line to the hoisted-allocas buffer.
    pub fn emit_alloca(&mut self, line: impl AsRef<str>) {
        writeln!(self.allocas, "  {}", line.as_ref()).unwrap();
    }

    /// Splices the two buffers: every hoisted alloca first, then the rest
    /// of the function body in emission order.
    pub fn finish(self) -> String {
        let mut out = String::with_capacity(self.allocas.len() + self.body.len());
        out.push_str(&self.allocas);
        out.push_str(&self.body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocas_always_precede_body_instructions() {
        let mut sink = Sink::new();
        sink.emit("%1 = add i32 1, 2");
        sink.emit_alloca("%x.addr = alloca i32");
        sink.emit("store i32 %1, i32* %x.addr");
        let text = sink.finish();
        let alloca_pos = text.find("alloca").unwrap();
        let add_pos = text.find("add i32").unwrap();
        assert!(alloca_pos < add_pos);
    }
}
