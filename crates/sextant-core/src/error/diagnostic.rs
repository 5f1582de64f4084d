//! The core diagnostic type for the Sextant error system.
//!
//! A [`Diagnostic`] represents a single note, warning or error with an
//! optional error code, ordered context entries and help text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, Severity};

/// One `key = value` pair describing where a diagnostic applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    key: String,
    value: String,
}

impl ContextEntry {
    /// Returns the context key, e.g. `"document"`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the context value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A diagnostic message attached to a link, a tree node, a path or a whole
/// build.
///
/// # Example
///
/// ```text
/// error[E300]: cyclic call detected: `approval.bpmn` is already on the call path
///   document = application.bpmn
///   element = call-approval
///   = help: the call is shown without children
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
    message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    context: Vec<ContextEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use sextant_core::error::{Diagnostic, ErrorCode};
    /// let diag = Diagnostic::error("cyclic call detected")
    ///     .with_code(ErrorCode::E300)
    ///     .with_context("document", "approval.bpmn");
    /// assert!(diag.severity().is_error());
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all context entries in insertion order.
    pub fn context(&self) -> &[ContextEntry] {
        &self.context
    }

    /// Get the value of the first context entry with the given key.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|entry| entry.key == key)
            .map(ContextEntry::value)
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Append a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.push(ContextEntry {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Create a new diagnostic with the given severity and message.
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            context: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.context().is_empty());
        assert!(diag.help().is_none());
    }

    #[test]
    fn test_diagnostic_with_context_keeps_order() {
        let diag = Diagnostic::warning("no target found")
            .with_context("document", "application.bpmn")
            .with_context("element", "call-1")
            .with_context("hint", "credit-check");

        let keys: Vec<&str> = diag.context().iter().map(ContextEntry::key).collect();
        assert_eq!(keys, ["document", "element", "hint"]);
        assert_eq!(diag.context_value("element"), Some("call-1"));
        assert_eq!(diag.context_value("missing"), None);
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::error("ambiguous link").with_code(ErrorCode::E101);

        assert_eq!(diag.to_string(), "error[E101]: ambiguous link");
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::info("matched by file name");

        assert_eq!(diag.to_string(), "info: matched by file name");
    }

    #[test]
    fn test_diagnostic_serializes_compactly() {
        let diag = Diagnostic::warning("self call").with_code(ErrorCode::E200);

        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "severity": "warning",
                "code": "E200",
                "message": "self call",
            })
        );
    }
}
