//! # Sextant Catalog
//!
//! Loading of element catalogs and explicit mapping documents. This crate
//! turns the JSON catalogs produced by a markup-parsing front end into the
//! checked [`sextant_core`] model.
//!
//! ## Usage
//!
//! ```
//! # use sextant_catalog::{parse_document, CatalogError};
//!
//! fn main() -> Result<(), CatalogError> {
//!     let source = r#"{
//!         "file_name": "application.bpmn",
//!         "elements": [
//!             {"id": "start", "kind": "startEvent"},
//!             {"id": "call", "kind": "callActivity", "called_document_hint": "credit-check"}
//!         ],
//!         "flows": [{"id": "f1", "source": "start", "target": "call"}]
//!     }"#;
//!
//!     let (document, diagnostics) = parse_document(source, "application.json")?;
//!     assert_eq!(document.call_activities().count(), 1);
//!     assert!(diagnostics.is_empty());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod condition;

mod catalog_types;
mod elaborate;
mod error;
mod loader;

pub use cache::CatalogCache;
pub use error::{CatalogError, Result};
pub use loader::{LoadOptions, load_corpus};

use sextant_core::{
    corpus::{DocumentCatalog, ExplicitMapping},
    error::Diagnostic,
};

/// Parse one catalog document from JSON text.
///
/// # Arguments
///
/// * `source` - The catalog JSON.
/// * `origin` - Where the text came from. Used in diagnostics, and as the
///   file name when the catalog does not declare one.
///
/// # Returns
///
/// The elaborated document plus the warnings raised while elaborating it
/// (duplicate elements, dangling flows and the like).
///
/// # Errors
///
/// Returns [`CatalogError::Json`] for undecodable text and
/// [`CatalogError::Malformed`] when the document cannot be named.
pub fn parse_document(source: &str, origin: &str) -> Result<(DocumentCatalog, Vec<Diagnostic>)> {
    cache::parse_document_named(source, origin)
}

/// Parse an explicit mapping document from JSON text.
///
/// Never fails: an undecodable mapping yields `None` with an `E004` error
/// diagnostic, and incomplete entries are skipped with warnings.
pub fn parse_mapping(source: &str, origin: &str) -> (Option<ExplicitMapping>, Vec<Diagnostic>) {
    loader::parse_mapping_named(source, origin)
}
