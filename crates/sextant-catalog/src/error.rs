//! Error type for catalog loading.
//!
//! Hard failures only: a document that cannot be read or decoded. Problems
//! inside a decoded document are reported as
//! [`Diagnostic`](sextant_core::error::Diagnostic)s instead.

use std::{io, path::PathBuf};

use thiserror::Error;

use sextant_core::error::Diagnostic;

/// A type alias for `Result<T, CatalogError>`.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors raised while loading element catalogs.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode `{origin}`: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document `{origin}` is unusable: {}", first_message(diagnostics))]
    Malformed {
        origin: String,
        diagnostics: Vec<Diagnostic>,
    },
}

impl CatalogError {
    /// Returns the diagnostics carried by a `Malformed` error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CatalogError::Malformed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

fn first_message(diagnostics: &[Diagnostic]) -> String {
    match diagnostics.first() {
        Some(first) if diagnostics.len() > 1 => {
            format!("{} (+{} more)", first.message(), diagnostics.len() - 1)
        }
        Some(first) => first.message().to_string(),
        None => "no details".to_string(),
    }
}
