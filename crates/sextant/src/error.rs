//! Error types for Sextant operations.
//!
//! This module provides the main error type [`SextantError`]. Only conditions
//! that make a whole resolution pass meaningless are errors; everything else
//! is reported as a [`Diagnostic`](sextant_core::error::Diagnostic) next to
//! the best-effort result.

use std::io;

use thiserror::Error;

use sextant_catalog::CatalogError;

/// The main error type for Sextant operations.
#[derive(Debug, Error)]
pub enum SextantError {
    #[error("corpus contains no documents")]
    EmptyCorpus,

    #[error("no candidate root document found")]
    NoRoot,

    #[error("unknown document `{0}`")]
    UnknownDocument(String),

    #[error("resolution pass cancelled before {stage}")]
    Cancelled { stage: &'static str },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
