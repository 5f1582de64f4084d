//! Explicit cache of elaborated catalog documents.
//!
//! The cache is an ordinary value owned by the caller and passed into corpus
//! loading, so two loads only share work when they share a cache. Entries
//! are keyed by path and revalidated against the file's modification time;
//! callers that know a document changed can drop it with
//! [`CatalogCache::invalidate`].

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use log::{debug, trace};

use sextant_core::{corpus::DocumentCatalog, error::Diagnostic};

use crate::{
    catalog_types::RawDocument,
    elaborate::elaborate_document,
    error::{CatalogError, Result},
};

#[derive(Debug)]
struct CacheEntry {
    modified: Option<SystemTime>,
    document: DocumentCatalog,
    diagnostics: Vec<Diagnostic>,
}

/// Parsed documents keyed by the path they were loaded from.
#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: HashMap<PathBuf, CacheEntry>,
    hits: usize,
    misses: usize,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the document at `path`, reusing the cached result when the file
    /// has not been modified since it was cached.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read,
    /// [`CatalogError::Json`] if it cannot be decoded and
    /// [`CatalogError::Malformed`] if it cannot be elaborated. Failed loads
    /// are never cached.
    pub fn load(&mut self, path: &Path) -> Result<(DocumentCatalog, Vec<Diagnostic>)> {
        let modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .ok();

        if let Some(entry) = self.entries.get(path) {
            if entry.modified.is_some() && entry.modified == modified {
                self.hits += 1;
                trace!(path = path.display().to_string(); "Catalog cache hit");
                return Ok((entry.document.clone(), entry.diagnostics.clone()));
            }
        }

        self.misses += 1;
        debug!(path = path.display().to_string(); "Catalog cache miss");

        let source = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = default_file_name(path);
        let (document, diagnostics) = parse_document_named(&source, &origin)?;

        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                document: document.clone(),
                diagnostics: diagnostics.clone(),
            },
        );
        Ok((document, diagnostics))
    }

    /// Drops the cached entry for `path`. Returns `true` if one existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let removed = self.entries.remove(path).is_some();
        if removed {
            debug!(path = path.display().to_string(); "Catalog cache entry invalidated");
        }
        removed
    }

    /// Drops every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of loads answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Number of loads that read and elaborated the file.
    pub fn misses(&self) -> usize {
        self.misses
    }
}

/// Decodes and elaborates one catalog document from JSON text.
pub(crate) fn parse_document_named(
    source: &str,
    origin: &str,
) -> Result<(DocumentCatalog, Vec<Diagnostic>)> {
    let raw: RawDocument = serde_json::from_str(source).map_err(|source| CatalogError::Json {
        origin: origin.to_string(),
        source,
    })?;
    elaborate_document(raw, origin)
}

/// The file name a catalog falls back to when it does not declare one:
/// `credit-check.json` stands for `credit-check`.
fn default_file_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_catalog(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_second_load_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(
            dir.path(),
            "a.json",
            r#"{"file_name": "a.bpmn", "elements": [{"id": "t", "kind": "task"}]}"#,
        );
        let mut cache = CatalogCache::new();

        let (first, _) = cache.load(&path).unwrap();
        let (second, _) = cache.load(&path).unwrap();

        assert_eq!(first.file_name(), second.file_name());
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
        assert!(cache.contains(&path));
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(
            dir.path(),
            "b.json",
            r#"{"elements": [{"id": "t", "kind": "task"}]}"#,
        );
        let mut cache = CatalogCache::new();

        let (document, _) = cache.load(&path).unwrap();
        assert_eq!(document.file_name(), "b");

        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));
        cache.load(&path).unwrap();

        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn test_failed_load_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path(), "broken.json", "{ not json");
        let mut cache = CatalogCache::new();

        let err = cache.load(&path).unwrap_err();

        assert!(matches!(err, CatalogError::Json { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = CatalogCache::new();

        let err = cache.load(&dir.path().join("missing.json")).unwrap_err();

        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path(), "c.json", r#"{"file_name": "c.bpmn"}"#);
        let mut cache = CatalogCache::new();
        cache.load(&path).unwrap();

        cache.clear();

        assert!(cache.is_empty());
    }
}
