//! Matching strategies.
//!
//! Each strategy is a pure function of the query and the corpus index. The
//! resolver tries them in [`STRATEGIES`] order and stops at the first one
//! that returns anything other than [`MatchResult::None`].

use sextant_core::identifier::Id;

use super::{index::CorpusIndex, link::MatchSource};

/// The call site being resolved.
#[derive(Debug, Clone, Copy)]
pub(super) struct MatchQuery<'q> {
    pub document: Id,
    pub element: Id,
    pub hint: Option<&'q str>,
}

/// What a single strategy found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum MatchResult {
    None,
    Unique(Id),
    Tied(Vec<Id>),
    /// The strategy had an answer that names no document in the corpus.
    Stale(String),
}

impl MatchResult {
    fn from_candidates(candidates: Vec<Id>) -> Self {
        match candidates.as_slice() {
            [] => MatchResult::None,
            [only] => MatchResult::Unique(*only),
            _ => MatchResult::Tied(candidates),
        }
    }
}

pub(super) type StrategyFn = fn(&MatchQuery<'_>, &CorpusIndex<'_>) -> MatchResult;

#[derive(Debug, Clone, Copy)]
pub(super) struct Strategy {
    pub name: &'static str,
    pub source: MatchSource,
    /// Heuristic matches are reported with an info diagnostic.
    pub heuristic: bool,
    pub run: StrategyFn,
}

pub(super) const STRATEGIES: [Strategy; 5] = [
    Strategy {
        name: "explicit-map",
        source: MatchSource::ExplicitMap,
        heuristic: false,
        run: explicit_map,
    },
    Strategy {
        name: "id",
        source: MatchSource::Id,
        heuristic: false,
        run: process_id,
    },
    Strategy {
        name: "name",
        source: MatchSource::Name,
        heuristic: false,
        run: display_name,
    },
    Strategy {
        name: "filename",
        source: MatchSource::Filename,
        heuristic: false,
        run: filename,
    },
    Strategy {
        name: "loose",
        source: MatchSource::Filename,
        heuristic: true,
        run: loose_containment,
    },
];

/// Looks the call site up in the explicit mapping table. The entry's target
/// may be a file name, process id, display name or base name.
fn explicit_map(query: &MatchQuery<'_>, index: &CorpusIndex<'_>) -> MatchResult {
    let Some(mapping) = index.corpus().mapping() else {
        return MatchResult::None;
    };
    let Some(entry) = mapping.lookup(query.document, query.element) else {
        return MatchResult::None;
    };
    match MatchResult::from_candidates(index.lookup(entry.target_document())) {
        MatchResult::None => MatchResult::Stale(entry.target_document().to_string()),
        result => result,
    }
}

/// Candidates other than the calling document. Only an explicit mapping
/// entry can make a document call itself.
fn other_documents(query: &MatchQuery<'_>, candidates: impl IntoIterator<Item = Id>) -> MatchResult {
    MatchResult::from_candidates(
        candidates
            .into_iter()
            .filter(|&candidate| candidate != query.document)
            .collect(),
    )
}

fn process_id(query: &MatchQuery<'_>, index: &CorpusIndex<'_>) -> MatchResult {
    query.hint.map_or(MatchResult::None, |hint| {
        other_documents(query, index.by_process_id(hint).iter().copied())
    })
}

fn display_name(query: &MatchQuery<'_>, index: &CorpusIndex<'_>) -> MatchResult {
    query.hint.map_or(MatchResult::None, |hint| {
        other_documents(query, index.by_name(hint).iter().copied())
    })
}

fn filename(query: &MatchQuery<'_>, index: &CorpusIndex<'_>) -> MatchResult {
    query.hint.map_or(MatchResult::None, |hint| {
        other_documents(query, index.by_filename(hint))
    })
}

fn loose_containment(query: &MatchQuery<'_>, index: &CorpusIndex<'_>) -> MatchResult {
    query.hint.map_or(MatchResult::None, |hint| {
        other_documents(query, index.by_loose_containment(hint, Some(query.document)))
    })
}
