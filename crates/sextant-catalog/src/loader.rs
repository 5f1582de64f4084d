//! Corpus loading from a directory of catalog documents.
//!
//! Every `*.json` file in the directory is one document's element catalog,
//! except the optional mapping document. A document that fails to load is
//! left out with an `E001` diagnostic on the corpus; loading carries on with
//! the rest.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use sextant_core::{
    corpus::{Corpus, ExplicitMapping},
    error::{Diagnostic, ErrorCode},
};

use crate::{
    cache::CatalogCache,
    catalog_types::RawMapping,
    elaborate::elaborate_mapping,
    error::{CatalogError, Result},
};

/// Options for [`load_corpus`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    mapping: Option<PathBuf>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path of the explicit mapping document.
    ///
    /// When the mapping document lives inside the corpus directory it is not
    /// treated as a catalog.
    pub fn with_mapping(mut self, path: impl Into<PathBuf>) -> Self {
        self.mapping = Some(path.into());
        self
    }

    pub fn mapping(&self) -> Option<&Path> {
        self.mapping.as_deref()
    }
}

/// Loads every catalog in `dir` into a [`Corpus`].
///
/// # Arguments
///
/// * `dir` - Directory holding one `*.json` catalog per document.
/// * `options` - Loading options (mapping document location).
/// * `cache` - Parse cache shared across loads by the caller.
///
/// # Errors
///
/// Returns [`CatalogError::Io`] if the directory or the mapping document
/// cannot be read. Problems with individual documents become corpus
/// diagnostics instead.
pub fn load_corpus(dir: &Path, options: &LoadOptions, cache: &mut CatalogCache) -> Result<Corpus> {
    info!(dir = dir.display().to_string(); "Loading corpus");

    let mut corpus = Corpus::new();

    for path in catalog_paths(dir, options.mapping())? {
        let origin = path.display().to_string();
        match cache.load(&path) {
            Ok((document, diagnostics)) => {
                for diagnostic in diagnostics {
                    corpus.push_diagnostic(diagnostic);
                }
                let file_name = document.file_name();
                if corpus.contains(file_name) {
                    warn!(document:% = file_name, origin; "Duplicate document ignored");
                    corpus.push_diagnostic(
                        Diagnostic::error(format!("document `{file_name}` is defined more than once"))
                            .with_code(ErrorCode::E005)
                            .with_context("document", file_name)
                            .with_context("origin", &origin)
                            .with_help("the first catalog in file-name order is kept"),
                    );
                    continue;
                }
                corpus.insert(document);
            }
            Err(err) => {
                warn!(origin, err:% = err; "Document left out of corpus");
                let mut diagnostic = Diagnostic::error(format!("document could not be loaded: {err}"))
                    .with_code(ErrorCode::E001)
                    .with_context("origin", &origin);
                if let Some(help) = err.diagnostics().first().and_then(Diagnostic::help) {
                    diagnostic = diagnostic.with_help(help);
                }
                corpus.push_diagnostic(diagnostic);
            }
        }
    }

    if let Some(mapping_path) = options.mapping() {
        let (mapping, diagnostics) = load_mapping(mapping_path)?;
        for diagnostic in diagnostics {
            corpus.push_diagnostic(diagnostic);
        }
        if let Some(mapping) = mapping {
            corpus.set_mapping(mapping);
        }
    }

    info!(
        documents = corpus.len(),
        diagnostics = corpus.diagnostics().len();
        "Corpus loaded"
    );
    Ok(corpus)
}

/// Lists catalog files in `dir` in file-name order, leaving out `mapping`.
fn catalog_paths(dir: &Path, mapping: Option<&Path>) -> Result<Vec<PathBuf>> {
    let io_error = |source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mapping_name = mapping.and_then(Path::file_name);
    let mapping_dir = mapping.and_then(Path::parent);

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let is_mapping = mapping_name.is_some()
            && path.file_name() == mapping_name
            && mapping_dir.is_none_or(|mapping_dir| same_dir(mapping_dir, dir));
        if is_mapping {
            debug!(path = path.display().to_string(); "Skipping mapping document");
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

fn same_dir(a: &Path, b: &Path) -> bool {
    if a.as_os_str().is_empty() {
        return false;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Reads the explicit mapping document.
///
/// An undecodable mapping is reported as an `E004` error diagnostic and
/// resolution continues without it.
fn load_mapping(path: &Path) -> Result<(Option<ExplicitMapping>, Vec<Diagnostic>)> {
    let source = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let origin = path.display().to_string();
    Ok(parse_mapping_named(&source, &origin))
}

pub(crate) fn parse_mapping_named(
    source: &str,
    origin: &str,
) -> (Option<ExplicitMapping>, Vec<Diagnostic>) {
    match serde_json::from_str::<RawMapping>(source) {
        Ok(raw) => {
            let (mapping, diagnostics) = elaborate_mapping(raw, origin);
            (Some(mapping), diagnostics)
        }
        Err(err) => (
            None,
            vec![
                Diagnostic::error(format!("mapping document could not be decoded: {err}"))
                    .with_code(ErrorCode::E004)
                    .with_context("origin", origin)
                    .with_help("resolution continues without explicit mappings"),
            ],
        ),
    }
}
