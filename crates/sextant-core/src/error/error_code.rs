//! Error codes for the Sextant diagnostic system.
//!
//! Error codes are organized by component:
//! - `E0xx` - Catalog errors
//! - `E1xx` - Subprocess resolution
//! - `E2xx` - Cross-document graph
//! - `E3xx` - Tree construction
//! - `E4xx` - Flow path enumeration
//! - `E5xx` - Scheduling

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // =========================================================================
    // Catalog Errors (E0xx)
    // =========================================================================
    /// Malformed document.
    ///
    /// A document's element catalog could not be read or is unusable; the
    /// document is left out of the corpus.
    E001,

    /// Duplicate element id.
    ///
    /// Two elements in one document share an id. The first one is kept.
    E002,

    /// Dangling sequence flow.
    ///
    /// A sequence flow references a source or target element that does not
    /// exist in its document. The flow is dropped.
    E003,

    /// Malformed mapping record.
    ///
    /// An entry of the explicit mapping document is incomplete.
    E004,

    /// Duplicate document.
    ///
    /// Two catalogs declare the same file name. The first one is kept.
    E005,

    // =========================================================================
    // Resolution Errors (E1xx)
    // =========================================================================
    /// Unresolved link.
    ///
    /// No matching strategy found a target document for a call activity.
    E100,

    /// Ambiguous link.
    ///
    /// A matching strategy found two or more equally ranked candidates.
    E101,

    /// Missing hint.
    ///
    /// A call activity carries neither a called-document hint nor a name.
    E102,

    /// Stale explicit mapping.
    ///
    /// The mapping table names a target document that is not in the corpus.
    E103,

    /// Loose heuristic match.
    ///
    /// The link was only matched by substring containment on file names.
    E104,

    // =========================================================================
    // Graph Errors (E2xx)
    // =========================================================================
    /// Self call.
    ///
    /// A document calls itself.
    E200,

    /// Link from unknown document.
    ///
    /// A subprocess link names a source document that is not in the corpus.
    E201,

    // =========================================================================
    // Tree Errors (E3xx)
    // =========================================================================
    /// Cyclic call.
    ///
    /// A call chain returns to a document already on the ancestor path.
    E300,

    /// Unreachable root.
    ///
    /// Every document is called by another one; the root was picked by
    /// fewest incoming calls.
    E301,

    /// Unknown root hint.
    ///
    /// The preferred root did not match any document.
    E302,

    /// Depth limit reached.
    ///
    /// A call chain is deeper than the configured maximum.
    E303,

    /// Unreachable documents.
    ///
    /// Some documents are not reachable from the chosen root.
    E304,

    // =========================================================================
    // Flow Errors (E4xx)
    // =========================================================================
    /// No start event.
    ///
    /// A document has no start event; elements without incoming flows are
    /// used as starting points instead.
    E400,

    /// Path limit reached.
    ///
    /// Path enumeration stopped at the configured maximum.
    E401,

    /// Dead end.
    ///
    /// A traversal reached a non-end element with no outgoing flow.
    E402,

    // =========================================================================
    // Scheduling Errors (E5xx)
    // =========================================================================
    /// Date out of range.
    ///
    /// A computed date does not fit the calendar; the date was clamped.
    E500,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Catalog errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            // Resolution errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            // Graph errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            // Tree errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            // Flow errors
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            ErrorCode::E402 => "E402",
            // Scheduling errors
            ErrorCode::E500 => "E500",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Catalog errors
            ErrorCode::E001 => "malformed document",
            ErrorCode::E002 => "duplicate element id",
            ErrorCode::E003 => "dangling sequence flow",
            ErrorCode::E004 => "malformed mapping record",
            ErrorCode::E005 => "duplicate document",
            // Resolution errors
            ErrorCode::E100 => "unresolved link",
            ErrorCode::E101 => "ambiguous link",
            ErrorCode::E102 => "missing called document hint",
            ErrorCode::E103 => "stale explicit mapping",
            ErrorCode::E104 => "loose heuristic match",
            // Graph errors
            ErrorCode::E200 => "self call",
            ErrorCode::E201 => "link from unknown document",
            // Tree errors
            ErrorCode::E300 => "cyclic call",
            ErrorCode::E301 => "unreachable root",
            ErrorCode::E302 => "unknown root hint",
            ErrorCode::E303 => "depth limit reached",
            ErrorCode::E304 => "unreachable documents",
            // Flow errors
            ErrorCode::E400 => "no start event",
            ErrorCode::E401 => "path limit reached",
            ErrorCode::E402 => "dead end",
            // Scheduling errors
            ErrorCode::E500 => "date out of range",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
