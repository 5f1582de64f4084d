//! Diagnostic system shared by every Sextant component.
//!
//! Problems found in a corpus are data, not control flow: an unresolved call,
//! a cycle or a malformed document becomes a [`Diagnostic`] attached to the
//! smallest entity it concerns, and processing carries on with the best
//! partial result.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Ordered key/value context entries
//! - Severity levels
//! - A collector for accumulating diagnostics during a phase
//!
//! # Example
//!
//! ```
//! # use sextant_core::error::{Diagnostic, ErrorCode};
//!
//! let diag = Diagnostic::error("call activity `Credit Check` matches 2 documents")
//!     .with_code(ErrorCode::E101)
//!     .with_context("document", "application.bpmn")
//!     .with_context("candidates", "a.bpmn, b.bpmn")
//!     .with_help("add an explicit mapping entry for this call site");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::{ContextEntry, Diagnostic};
pub use error_code::ErrorCode;
pub use severity::Severity;
