//! Subprocess link types.

use std::fmt;

use serde::Serialize;

use sextant_core::{error::Diagnostic, identifier::Id};

/// Outcome of resolving one call activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Matched,
    Unresolved,
    Ambiguous,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchStatus::Matched => "matched",
            MatchStatus::Unresolved => "unresolved",
            MatchStatus::Ambiguous => "ambiguous",
        })
    }
}

/// The matching strategy that produced a link's outcome.
///
/// Loose containment matches report [`MatchSource::Filename`] together with
/// an `E104` info diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchSource {
    ExplicitMap,
    Id,
    Name,
    Filename,
    None,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchSource::ExplicitMap => "explicit-map",
            MatchSource::Id => "id",
            MatchSource::Name => "name",
            MatchSource::Filename => "filename",
            MatchSource::None => "none",
        })
    }
}

/// The resolved (or unresolved) target of one call activity.
///
/// Exactly one link exists per call activity. Links are immutable once the
/// resolver has produced them.
#[derive(Debug, Clone, Serialize)]
pub struct SubprocessLink {
    source_document: Id,
    source_element_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched_document: Option<Id>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    candidates: Vec<Id>,
    match_status: MatchStatus,
    match_source: MatchSource,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl SubprocessLink {
    pub(super) fn matched(
        source_document: Id,
        source_element_id: Id,
        hint: Option<String>,
        target: Id,
        source: MatchSource,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            source_document,
            source_element_id,
            hint,
            matched_document: Some(target),
            candidates: Vec::new(),
            match_status: MatchStatus::Matched,
            match_source: source,
            diagnostics,
        }
    }

    pub(super) fn ambiguous(
        source_document: Id,
        source_element_id: Id,
        hint: Option<String>,
        candidates: Vec<Id>,
        source: MatchSource,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            source_document,
            source_element_id,
            hint,
            matched_document: None,
            candidates,
            match_status: MatchStatus::Ambiguous,
            match_source: source,
            diagnostics,
        }
    }

    pub(super) fn unresolved(
        source_document: Id,
        source_element_id: Id,
        hint: Option<String>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            source_document,
            source_element_id,
            hint,
            matched_document: None,
            candidates: Vec::new(),
            match_status: MatchStatus::Unresolved,
            match_source: MatchSource::None,
            diagnostics,
        }
    }

    /// The document holding the call activity.
    pub fn source_document(&self) -> Id {
        self.source_document
    }

    /// The call activity's element id.
    pub fn source_element_id(&self) -> Id {
        self.source_element_id
    }

    /// The text the link was resolved from: the called-document hint, or
    /// the element name when the element carries no hint.
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn matched_document(&self) -> Option<Id> {
        self.matched_document
    }

    /// Tied candidates of an ambiguous link, in file-name order.
    pub fn candidates(&self) -> &[Id] {
        &self.candidates
    }

    pub fn match_status(&self) -> MatchStatus {
        self.match_status
    }

    pub fn match_source(&self) -> MatchSource {
        self.match_source
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_matched(&self) -> bool {
        self.match_status == MatchStatus::Matched
    }
}
