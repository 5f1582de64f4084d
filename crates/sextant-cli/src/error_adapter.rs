//! Error adapter for converting Sextant errors and diagnostics to miette
//! reports.
//!
//! This module provides the bridge between the library's error and
//! diagnostic types and miette's graphical report rendering used in the CLI.
//!
//! # Multi-Error Support
//!
//! When a [`CatalogError::Malformed`] carries several diagnostics, each
//! diagnostic is rendered independently.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, Severity as MietteSeverity};

use sextant::{
    SextantError,
    diagnostics::{Diagnostic, Severity},
};

/// Adapter for a single sextant diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    /// Context entries and help text, pre-rendered for `help()`.
    help: Option<String>,
}

impl<'a> DiagnosticAdapter<'a> {
    pub fn new(diag: &'a Diagnostic) -> Self {
        let mut lines: Vec<String> = diag
            .context()
            .iter()
            .map(|entry| format!("{}: {}", entry.key(), entry.value()))
            .collect();
        if let Some(help) = diag.help() {
            lines.push(help.to_string());
        }
        let help = (!lines.is_empty()).then(|| lines.join("\n"));
        Self { diag, help }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<MietteSeverity> {
        Some(match self.diag.severity() {
            Severity::Error => MietteSeverity::Error,
            Severity::Warning => MietteSeverity::Warning,
            Severity::Info => MietteSeverity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_deref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }
}

/// Adapter for [`SextantError`] variants without diagnostics.
pub struct ErrorAdapter<'a>(pub &'a SextantError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            SextantError::EmptyCorpus => "sextant::empty_corpus",
            SextantError::NoRoot => "sextant::no_root",
            SextantError::UnknownDocument(_) => "sextant::unknown_document",
            SextantError::Cancelled { .. } => "sextant::cancelled",
            SextantError::Catalog(_) => "sextant::catalog",
            SextantError::Io(_) => "sextant::io",
            SextantError::Config(_) => "sextant::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            SextantError::EmptyCorpus => "the corpus directory must contain at least one `*.json` catalog",
            SextantError::UnknownDocument(_) => "use a file name, process id or document name",
            _ => return None,
        };
        Some(Box::new(help))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    Diagnostic(DiagnosticAdapter<'a>),
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<MietteSeverity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Error(_) => Some(MietteSeverity::Error),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }
}

/// Convert a [`SextantError`] into a list of reportable errors.
///
/// A malformed catalog yields one [`Reportable`] per diagnostic; every
/// other error yields a single one.
pub fn to_reportables(err: &SextantError) -> Vec<Reportable<'_>> {
    match err {
        SextantError::Catalog(catalog) if !catalog.diagnostics().is_empty() => catalog
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

/// Renders one report to a string with miette's graphical handler.
pub fn render(reportable: &dyn MietteDiagnostic) -> String {
    let mut writer = String::new();
    if GraphicalReportHandler::new()
        .render_report(&mut writer, reportable)
        .is_err()
    {
        writer = reportable.to_string();
    }
    writer
}

#[cfg(test)]
mod tests {
    use sextant::{CatalogError, diagnostics::ErrorCode};

    use super::*;

    #[test]
    fn test_diagnostic_help_lists_context() {
        let diag = Diagnostic::error("call activity `Credit` matches 2 documents")
            .with_code(ErrorCode::E101)
            .with_context("candidates", "a.bpmn, b.bpmn")
            .with_help("add an explicit mapping entry");

        let adapter = DiagnosticAdapter::new(&diag);

        assert_eq!(adapter.to_string(), "call activity `Credit` matches 2 documents");
        assert_eq!(
            adapter.help().unwrap().to_string(),
            "candidates: a.bpmn, b.bpmn\nadd an explicit mapping entry"
        );
        assert_eq!(adapter.code().unwrap().to_string(), "E101");
        assert_eq!(adapter.severity(), Some(MietteSeverity::Error));
    }

    #[test]
    fn test_info_maps_to_advice() {
        let diag = Diagnostic::info("loose match");

        let adapter = DiagnosticAdapter::new(&diag);

        assert_eq!(adapter.severity(), Some(MietteSeverity::Advice));
        assert!(adapter.help().is_none());
    }

    #[test]
    fn test_malformed_catalog_splits_diagnostics() {
        let err = SextantError::Catalog(CatalogError::Malformed {
            origin: "a.json".to_string(),
            diagnostics: vec![Diagnostic::error("first"), Diagnostic::error("second")],
        });

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 2);
        assert_eq!(reportables[0].to_string(), "first");
        assert_eq!(reportables[1].to_string(), "second");
    }

    #[test]
    fn test_plain_error() {
        let err = SextantError::UnknownDocument("credit".to_string());

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "unknown document `credit`");
                assert_eq!(e.code().unwrap().to_string(), "sextant::unknown_document");
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_render_contains_message() {
        let diag = Diagnostic::warning("call activity `Pay` has no match").with_code(ErrorCode::E100);

        let rendered = render(&DiagnosticAdapter::new(&diag));

        assert!(rendered.contains("call activity `Pay` has no match"));
    }
}
