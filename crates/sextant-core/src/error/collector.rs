//! Collector for accumulating diagnostics during a processing phase.
//!
//! The [`DiagnosticCollector`] lets a phase report every problem it finds
//! instead of stopping at the first one.

use log::{debug, warn};

use crate::error::Diagnostic;

/// A collector for accumulating diagnostics during a processing phase.
///
/// # Example
///
/// ```
/// # use sextant_core::error::{Diagnostic, DiagnosticCollector, ErrorCode};
/// let mut collector = DiagnosticCollector::new();
///
/// collector.emit(Diagnostic::warning("dangling flow `f1`").with_code(ErrorCode::E003));
/// collector.emit(Diagnostic::error("duplicate element `t1`").with_code(ErrorCode::E002));
///
/// assert!(collector.has_errors());
/// let diagnostics = collector.finish();
/// assert_eq!(diagnostics.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    ///
    /// Errors and warnings are also forwarded to the log at `warn` level so
    /// they show up in CLI output without a separate rendering step.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        if diagnostic.severity().is_info() {
            debug!(diagnostic:% = diagnostic; "Diagnostic emitted");
        } else {
            warn!(diagnostic:% = diagnostic; "Diagnostic emitted");
        }
        self.diagnostics.push(diagnostic);
    }

    /// Emit every diagnostic from an iterator.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }

    /// Returns `true` if any error-level diagnostic was emitted.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Returns the diagnostics collected so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns the number of collected diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Finish collection and return every diagnostic in emission order.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_collector_empty() {
        let collector = DiagnosticCollector::new();

        assert!(collector.is_empty());
        assert!(!collector.has_errors());
        assert!(collector.finish().is_empty());
    }

    #[test]
    fn test_collector_warnings_only() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("unresolved").with_code(ErrorCode::E100));
        collector.emit(Diagnostic::info("loose match").with_code(ErrorCode::E104));

        assert!(!collector.has_errors());
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_collector_error_sets_flag() {
        let mut collector = DiagnosticCollector::new();
        collector.extend([
            Diagnostic::warning("first"),
            Diagnostic::error("second"),
            Diagnostic::info("third"),
        ]);

        assert!(collector.has_errors());
        let messages: Vec<String> = collector
            .finish()
            .iter()
            .map(|diag| diag.message().to_string())
            .collect();
        assert_eq!(messages, ["first", "second", "third"]);
    }
}
