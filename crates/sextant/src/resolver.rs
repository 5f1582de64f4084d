//! Subprocess resolution.
//!
//! For every call activity in the corpus the [`SubprocessResolver`] decides
//! which document it calls. Strategies are tried in a fixed order:
//!
//! 1. the explicit mapping table entry for the exact call site,
//! 2. the hint against declared process ids,
//! 3. the hint against declared display names,
//! 4. the hint against file base names, with and without the corpus-wide
//!    prefix,
//! 5. loose containment of the hint in file base names.
//!
//! The first strategy that finds anything decides the outcome. When it
//! finds more than one candidate the link is ambiguous; the resolver never
//! picks between tied candidates.

mod index;
mod link;
mod strategy;

pub use index::CorpusIndex;
pub use link::{MatchSource, MatchStatus, SubprocessLink};

use log::{debug, info, warn};

use sextant_core::{
    corpus::Corpus,
    element::ElementRecord,
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    identifier::Id,
};

use crate::config::ResolverConfig;

use strategy::{MatchQuery, MatchResult, STRATEGIES};

/// Resolves call activities against one corpus.
#[derive(Debug)]
pub struct SubprocessResolver<'a> {
    index: CorpusIndex<'a>,
}

impl<'a> SubprocessResolver<'a> {
    /// Builds the lookup indices for `corpus`.
    pub fn new(corpus: &'a Corpus, config: &ResolverConfig) -> Self {
        Self {
            index: CorpusIndex::new(corpus, config),
        }
    }

    pub fn index(&self) -> &CorpusIndex<'a> {
        &self.index
    }

    /// Resolves every call activity of every document.
    ///
    /// Links are returned in document file-name order, then catalog order
    /// within each document, one per call activity.
    pub fn resolve_all(&self) -> Vec<SubprocessLink> {
        let corpus = self.index.corpus();
        info!(documents = corpus.len(); "Resolving subprocess links");

        let links: Vec<SubprocessLink> = corpus
            .documents()
            .flat_map(|document| document.call_activities())
            .map(|element| self.resolve(element))
            .collect();

        info!(
            links = links.len(),
            matched = links.iter().filter(|link| link.is_matched()).count();
            "Subprocess links resolved"
        );
        links
    }

    /// Resolves a single call activity.
    ///
    /// The hint is the element's called-document hint, falling back to its
    /// display name.
    pub fn resolve(&self, element: &ElementRecord) -> SubprocessLink {
        let document = element.owner_document();
        let element_id = element.id();
        let hint = element
            .called_document_hint()
            .or(element.name())
            .map(str::trim)
            .filter(|hint| !hint.is_empty());
        let query = MatchQuery {
            document,
            element: element_id,
            hint,
        };

        let mut collector = DiagnosticCollector::new();

        for strategy in &STRATEGIES {
            match (strategy.run)(&query, &self.index) {
                MatchResult::None => {}
                MatchResult::Stale(target) => {
                    collector.emit(
                        Diagnostic::warning(format!(
                            "explicit mapping for `{element_id}` names unknown document `{target}`"
                        ))
                        .with_code(ErrorCode::E103)
                        .with_context("document", document)
                        .with_context("element", element_id)
                        .with_context("target", &target)
                        .with_help("the remaining strategies are tried instead"),
                    );
                }
                MatchResult::Unique(target) => {
                    debug!(
                        document:% = document,
                        element:% = element_id,
                        target:% = target,
                        strategy = strategy.name;
                        "Call activity matched"
                    );
                    if strategy.heuristic {
                        collector.emit(
                            Diagnostic::info(format!(
                                "`{element_id}` matched `{target}` by loose containment"
                            ))
                            .with_code(ErrorCode::E104)
                            .with_context("document", document)
                            .with_context("element", element_id)
                            .with_context("hint", hint.unwrap_or_default()),
                        );
                    }
                    return SubprocessLink::matched(
                        document,
                        element_id,
                        hint.map(String::from),
                        target,
                        strategy.source,
                        collector.finish(),
                    );
                }
                MatchResult::Tied(candidates) => {
                    warn!(
                        document:% = document,
                        element:% = element_id,
                        candidates = candidates.len(),
                        strategy = strategy.name;
                        "Ambiguous call activity"
                    );
                    collector.emit(
                        Diagnostic::error(format!(
                            "call activity `{element_id}` matches {} documents: {}",
                            candidates.len(),
                            join(&candidates)
                        ))
                        .with_code(ErrorCode::E101)
                        .with_context("document", document)
                        .with_context("element", element_id)
                        .with_context("hint", hint.unwrap_or_default())
                        .with_context("strategy", strategy.name)
                        .with_context("candidates", join(&candidates))
                        .with_help("add an explicit mapping entry for this call site"),
                    );
                    return SubprocessLink::ambiguous(
                        document,
                        element_id,
                        hint.map(String::from),
                        candidates,
                        strategy.source,
                        collector.finish(),
                    );
                }
            }
        }

        match hint {
            Some(hint) => {
                debug!(document:% = document, element:% = element_id, hint; "Call activity unresolved");
                collector.emit(
                    Diagnostic::warning(format!(
                        "no document matches `{hint}` called from `{element_id}`"
                    ))
                    .with_code(ErrorCode::E100)
                    .with_context("document", document)
                    .with_context("element", element_id)
                    .with_context("hint", hint),
                );
            }
            None => {
                collector.emit(
                    Diagnostic::warning(format!(
                        "call activity `{element_id}` names no called document"
                    ))
                    .with_code(ErrorCode::E102)
                    .with_context("document", document)
                    .with_context("element", element_id)
                    .with_help("set a called-document hint or an explicit mapping entry"),
                );
            }
        }

        SubprocessLink::unresolved(
            document,
            element_id,
            hint.map(String::from),
            collector.finish(),
        )
    }

    /// Resolves a free-form document reference to exactly one document.
    ///
    /// Returns `None` when nothing or more than one document matches.
    pub fn find_document(&self, reference: &str) -> Option<Id> {
        match self.index.lookup(reference).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

fn join(candidates: &[Id]) -> String {
    candidates
        .iter()
        .map(Id::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
