//! Wire types for catalog and mapping documents.
//!
//! These mirror the JSON produced by the markup-parsing collaborator
//! field-for-field and stay permissive (most fields optional) so that a
//! sloppy document still decodes. Elaboration turns them into the checked
//! [`sextant_core`] model and reports what was wrong.

use serde::Deserialize;

use sextant_core::element::ElementKind;

/// One decoded catalog document.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub process_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub elements: Vec<RawElement>,
    #[serde(default)]
    pub flows: Vec<RawFlow>,
}

/// One decoded element record.
///
/// The `kind` tag and its kind-specific fields are flattened into the same
/// JSON object: `{"id": "c1", "kind": "callActivity", "called_document_hint": "x"}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawElement {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub branch: Option<String>,
}

/// One decoded sequence flow.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFlow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
}

/// The explicit mapping document.
#[derive(Debug, Deserialize)]
pub(crate) struct RawMapping {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub entries: Vec<RawMappingEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMappingEntry {
    #[serde(default)]
    pub source_document: Option<String>,
    #[serde(default)]
    pub source_element_id: Option<String>,
    #[serde(default)]
    pub target_document: Option<String>,
}
