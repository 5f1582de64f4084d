//! Per-corpus lookup indices.
//!
//! Built once per resolution pass so that matching a call activity never
//! rescans the corpus: by process id, by display name, by file base name
//! (with and without the corpus-wide prefix) and by loose normalized key.

use std::collections::HashMap;

use log::debug;

use sextant_core::{corpus::Corpus, identifier::Id};

use crate::config::ResolverConfig;

/// Lookup tables over the documents of one corpus.
///
/// Every candidate list is in file-name order because the corpus iterates
/// documents in that order.
#[derive(Debug)]
pub struct CorpusIndex<'a> {
    corpus: &'a Corpus,
    by_process_id: HashMap<&'a str, Vec<Id>>,
    by_name: HashMap<&'a str, Vec<Id>>,
    by_base_name: HashMap<String, Vec<Id>>,
    by_stripped_base_name: HashMap<String, Vec<Id>>,
    loose_keys: Vec<(Id, Vec<String>)>,
    prefix: Option<String>,
    loose_min_hint_len: usize,
}

impl<'a> CorpusIndex<'a> {
    pub fn new(corpus: &'a Corpus, config: &ResolverConfig) -> Self {
        let prefix = config.filename_prefix().map(str::to_lowercase);

        let mut by_process_id: HashMap<&'a str, Vec<Id>> = HashMap::new();
        let mut by_name: HashMap<&'a str, Vec<Id>> = HashMap::new();
        let mut by_base_name: HashMap<String, Vec<Id>> = HashMap::new();
        let mut by_stripped_base_name: HashMap<String, Vec<Id>> = HashMap::new();
        let mut loose_keys = Vec::with_capacity(corpus.len());

        for document in corpus.documents() {
            let file_name = document.file_name();
            if let Some(process_id) = document.process_id() {
                by_process_id
                    .entry(process_id.trim())
                    .or_default()
                    .push(file_name);
            }
            if let Some(name) = document.name() {
                by_name.entry(name.trim()).or_default().push(file_name);
            }

            let base = document.base_name().to_lowercase();
            let mut keys = vec![loose_key(&base)];
            if let Some(stripped) = strip_prefix(&base, prefix.as_deref()) {
                keys.push(loose_key(stripped));
                by_stripped_base_name
                    .entry(stripped.to_string())
                    .or_default()
                    .push(file_name);
            }
            by_base_name.entry(base).or_default().push(file_name);
            loose_keys.push((file_name, keys));
        }

        debug!(
            documents = corpus.len(),
            process_ids = by_process_id.len(),
            names = by_name.len();
            "Corpus index built"
        );

        Self {
            corpus,
            by_process_id,
            by_name,
            by_base_name,
            by_stripped_base_name,
            loose_keys,
            prefix,
            loose_min_hint_len: config.loose_min_hint_len(),
        }
    }

    pub fn corpus(&self) -> &'a Corpus {
        self.corpus
    }

    /// Documents whose declared process id equals `id` exactly.
    pub fn by_process_id(&self, id: &str) -> &[Id] {
        self.by_process_id
            .get(id.trim())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Documents whose declared display name equals `name` exactly.
    pub fn by_name(&self, name: &str) -> &[Id] {
        self.by_name
            .get(name.trim())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Documents whose file base name matches `hint`, case-insensitively.
    ///
    /// An exact base-name match wins. Otherwise the corpus-wide prefix is
    /// stripped from the hint, the candidates or both, and every document
    /// matching any of those variants is returned.
    pub fn by_filename(&self, hint: &str) -> Vec<Id> {
        let key = filename_key(hint);
        if key.is_empty() {
            return Vec::new();
        }
        if let Some(exact) = self.by_base_name.get(&key) {
            return exact.clone();
        }

        let stripped_hint = strip_prefix(&key, self.prefix.as_deref());
        let variants = [
            self.by_stripped_base_name.get(&key),
            stripped_hint.and_then(|hint| self.by_base_name.get(hint)),
            stripped_hint.and_then(|hint| self.by_stripped_base_name.get(hint)),
        ];

        let mut candidates: Vec<Id> = variants.into_iter().flatten().flatten().copied().collect();
        candidates.sort();
        candidates.dedup();
        candidates
    }

    /// Documents whose base name loosely contains `hint`, best rank only.
    ///
    /// Both sides are reduced to lower-case alphanumerics. A candidate equal
    /// to the hint ranks first, one that starts or ends with it second, one
    /// that merely contains it last. Hints shorter than the configured
    /// minimum never match. `exclude` is left out before ranking.
    pub fn by_loose_containment(&self, hint: &str, exclude: Option<Id>) -> Vec<Id> {
        let hint = loose_key(hint);
        if hint.chars().count() < self.loose_min_hint_len.max(1) {
            return Vec::new();
        }

        let mut best: Option<LooseRank> = None;
        let mut candidates = Vec::new();
        for (file_name, keys) in &self.loose_keys {
            if Some(*file_name) == exclude {
                continue;
            }
            let Some(rank) = keys.iter().filter_map(|key| loose_rank(&hint, key)).min() else {
                continue;
            };
            match best {
                Some(current) if rank > current => {}
                Some(current) if rank == current => candidates.push(*file_name),
                _ => {
                    best = Some(rank);
                    candidates.clear();
                    candidates.push(*file_name);
                }
            }
        }
        candidates
    }

    /// Resolves a free-form document reference: a file name, process id,
    /// display name or file base name, tried in that order.
    ///
    /// Returns every document of the first tier that matched anything.
    pub fn lookup(&self, reference: &str) -> Vec<Id> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Vec::new();
        }

        let file_name = Id::new(reference);
        if self.corpus.contains(file_name) {
            return vec![file_name];
        }
        let by_process_id = self.by_process_id(reference);
        if !by_process_id.is_empty() {
            return by_process_id.to_vec();
        }
        let by_name = self.by_name(reference);
        if !by_name.is_empty() {
            return by_name.to_vec();
        }
        self.by_filename(reference)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LooseRank {
    Equal,
    Affix,
    Interior,
}

fn loose_rank(hint: &str, candidate: &str) -> Option<LooseRank> {
    if candidate == hint {
        Some(LooseRank::Equal)
    } else if candidate.starts_with(hint) || candidate.ends_with(hint) {
        Some(LooseRank::Affix)
    } else if candidate.contains(hint) {
        Some(LooseRank::Interior)
    } else {
        None
    }
}

/// Lower-cased, trimmed, with one trailing alphabetic extension removed.
fn filename_key(text: &str) -> String {
    let text = text.trim().to_lowercase();
    match text.rsplit_once('.') {
        Some((base, ext))
            if !base.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            base.to_string()
        }
        _ => text,
    }
}

fn loose_key(text: &str) -> String {
    filename_key(text)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn strip_prefix<'s>(text: &'s str, prefix: Option<&str>) -> Option<&'s str> {
    prefix
        .and_then(|prefix| text.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use sextant_core::corpus::DocumentCatalog;

    use super::*;

    fn corpus(documents: &[(&str, Option<&str>, Option<&str>)]) -> Corpus {
        let mut corpus = Corpus::new();
        for (file_name, process_id, name) in documents {
            let mut document = DocumentCatalog::new(Id::new(file_name));
            if let Some(process_id) = process_id {
                document = document.with_process_id(*process_id);
            }
            if let Some(name) = name {
                document = document.with_name(*name);
            }
            corpus.insert(document);
        }
        corpus
    }

    #[test]
    fn test_filename_key() {
        assert_eq!(filename_key(" Credit-Check.BPMN "), "credit-check");
        assert_eq!(filename_key("credit check"), "credit check");
        assert_eq!(filename_key("v1.2"), "v1.2");
    }

    #[test]
    fn test_filename_with_and_without_prefix() {
        let corpus = corpus(&[
            ("mortgage-se-credit-check.bpmn", None, None),
            ("household.bpmn", None, None),
        ]);
        let config = ResolverConfig::default().with_filename_prefix("mortgage-se-");
        let index = CorpusIndex::new(&corpus, &config);

        assert_eq!(index.by_filename("credit-check"), [Id::new("mortgage-se-credit-check.bpmn")]);
        assert_eq!(index.by_filename("Mortgage-SE-credit-check"), [Id::new("mortgage-se-credit-check.bpmn")]);
        assert_eq!(index.by_filename("mortgage-se-household"), [Id::new("household.bpmn")]);
        assert!(index.by_filename("credit").is_empty());
    }

    #[test]
    fn test_loose_prefers_better_rank() {
        let corpus = corpus(&[
            ("credit.bpmn", None, None),
            ("credit-check.bpmn", None, None),
            ("pre-credit-check-review.bpmn", None, None),
        ]);
        let index = CorpusIndex::new(&corpus, &ResolverConfig::default());

        assert_eq!(index.by_loose_containment("Credit Check", None), [Id::new("credit-check.bpmn")]);
        assert_eq!(index.by_loose_containment("cred", None), [Id::new("credit-check.bpmn"), Id::new("credit.bpmn")]);
        assert_eq!(index.by_loose_containment("review", None), [Id::new("pre-credit-check-review.bpmn")]);
        assert_eq!(
            index.by_loose_containment("Credit Check", Some(Id::new("credit-check.bpmn"))),
            [Id::new("pre-credit-check-review.bpmn")]
        );
    }

    #[test]
    fn test_loose_short_hint_skipped() {
        let corpus = corpus(&[("ab-process.bpmn", None, None)]);
        let index = CorpusIndex::new(&corpus, &ResolverConfig::default());

        assert!(index.by_loose_containment("ab", None).is_empty());
    }

    #[test]
    fn test_lookup_tiers() {
        let corpus = corpus(&[
            ("a.bpmn", Some("proc-a"), Some("Application")),
            ("b.bpmn", Some("proc-b"), Some("Application")),
        ]);
        let index = CorpusIndex::new(&corpus, &ResolverConfig::default());

        assert_eq!(index.lookup("b.bpmn"), [Id::new("b.bpmn")]);
        assert_eq!(index.lookup("proc-a"), [Id::new("a.bpmn")]);
        assert_eq!(index.lookup("Application"), [Id::new("a.bpmn"), Id::new("b.bpmn")]);
        assert_eq!(index.lookup("B"), [Id::new("b.bpmn")]);
        assert!(index.lookup("zzz").is_empty());
    }
}
