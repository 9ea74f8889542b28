//! The diagnostic channel shared by the parser and the emitter.
//!
//! `ErrorSink` is a plain counter plus an optional suppression flag, not a
//! collected list of structured diagnostics: every call site is expected to
//! print its own message immediately (via `tracing::error!`, matching the
//! rest of this crate's logging story) and record that it happened. This
//! keeps diagnostic reporting free of its own allocation/formatting
//! machinery, matching the "no anyhow/thiserror" policy used everywhere
//! else in this workspace.

use tracing::error;

/// Tracks how many errors have been reported during one compilation and
/// whether error output is currently suppressed.
#[derive(Debug, Default)]
pub struct ErrorSink {
    count: u32,
    suppressed: bool,
}

impl ErrorSink {
    pub fn new() -> Self {
        ErrorSink { count: 0, suppressed: false }
    }

    pub fn error_get_count(&self) -> u32 {
        self.count
    }

    /// Suppresses (or re-enables) printing of subsequent reports. The
    /// counter still increments either way, so `-a`/dry-run passes can
    /// still detect "would this have failed" without producing output.
    pub fn error_suppress_output(&mut self, suppress: bool) {
        self.suppressed = suppress;
    }

    /// Reports a non-fatal diagnostic at the given location. Increments
    /// the error count; printing happens unless output is suppressed.
    pub fn error_report(&mut self, line: u32, message: &str) {
        self.count += 1;
        if !self.suppressed {
            error!(line, "{}", message);
        }
    }
}

/// Reports a diagnostic and signals the caller should stop compiling. This
/// never calls `std::process::exit` itself — that decision belongs to the
/// binary's `main`, so library code stays usable from tests and from
/// embedders that want to keep running after a failed compilation.
pub fn fatal_error(sink: &mut ErrorSink, line: u32, message: &str) {
    sink.error_report(line, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_report() {
        let mut sink = ErrorSink::new();
        sink.error_report(1, "first");
        sink.error_report(2, "second");
        assert_eq!(sink.error_get_count(), 2);
    }

    #[test]
    fn suppression_still_counts() {
        let mut sink = ErrorSink::new();
        sink.error_suppress_output(true);
        sink.error_report(1, "hidden");
        assert_eq!(sink.error_get_count(), 1);
    }

    #[test]
    fn fatal_error_reports_through_the_sink() {
        let mut sink = ErrorSink::new();
        fatal_error(&mut sink, 10, "unexpected token");
        assert_eq!(sink.error_get_count(), 1);
    }
}
