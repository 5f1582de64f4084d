//! Cross-document call graph.
//!
//! Nodes are documents and edges are `(caller, callee)` pairs derived from
//! matched subprocess links. Several call sites linking the same pair of
//! documents collapse into one edge that remembers every call site. The
//! graph also records how many distinct call sites target each document
//! (its reuse count).

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

use log::{debug, info, trace, warn};
use petgraph::{
    Direction,
    dot::Dot,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use serde::Serialize;

use sextant_core::{
    corpus::Corpus,
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    identifier::Id,
};

use crate::resolver::{MatchStatus, SubprocessLink};

/// The call sites merged into one graph edge.
#[derive(Debug, Clone, Default)]
pub struct CallEdge {
    call_sites: Vec<Id>,
}

impl CallEdge {
    /// Element ids of the call activities behind this edge, in link order.
    pub fn call_sites(&self) -> &[Id] {
        &self.call_sites
    }
}

impl fmt::Display for CallEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.call_sites.as_slice() {
            [only] => write!(f, "{only}"),
            sites => write!(f, "{} call sites", sites.len()),
        }
    }
}

/// One edge of the document graph.
#[derive(Debug, Clone, Copy)]
pub struct GraphEdge<'g> {
    pub from: Id,
    pub to: Id,
    pub call: &'g CallEdge,
}

impl GraphEdge<'_> {
    pub fn is_self_call(&self) -> bool {
        self.from == self.to
    }
}

/// Link outcome counts over the whole corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub documents: usize,
    pub edges: usize,
    pub links: usize,
    pub matched: usize,
    pub unresolved: usize,
    pub ambiguous: usize,
    pub self_calls: usize,
    pub reused_targets: usize,
}

/// Directed graph of documents calling documents.
#[derive(Debug)]
pub struct DocumentGraph {
    graph: DiGraph<Id, CallEdge>,
    node_indices: HashMap<Id, NodeIndex>,
    reuse_counts: BTreeMap<Id, usize>,
    links: Vec<SubprocessLink>,
    diagnostics: Vec<Diagnostic>,
}

impl DocumentGraph {
    /// Builds the graph from the corpus documents and their resolved links.
    ///
    /// Self calls are kept as self-loop edges and reported with `E200`.
    /// Links whose source document is not in the corpus are skipped with
    /// `E201`.
    pub fn build(corpus: &Corpus, links: Vec<SubprocessLink>) -> Self {
        info!(documents = corpus.len(), links = links.len(); "Building document graph");

        let mut graph: DiGraph<Id, CallEdge> = DiGraph::with_capacity(corpus.len(), links.len());
        let mut node_indices = HashMap::with_capacity(corpus.len());
        for document in corpus.documents() {
            let idx = graph.add_node(document.file_name());
            node_indices.insert(document.file_name(), idx);
        }

        let mut collector = DiagnosticCollector::new();
        let mut call_sites_by_target: BTreeMap<Id, BTreeSet<(Id, Id)>> = BTreeMap::new();

        for link in links.iter().filter(|link| link.is_matched()) {
            let (source, Some(target)) = (link.source_document(), link.matched_document()) else {
                continue;
            };
            let (Some(&from), Some(&to)) = (node_indices.get(&source), node_indices.get(&target))
            else {
                collector.emit(
                    Diagnostic::error(format!(
                        "link from `{}` refers to a document outside the corpus",
                        link.source_element_id()
                    ))
                    .with_code(ErrorCode::E201)
                    .with_context("document", source)
                    .with_context("element", link.source_element_id())
                    .with_context("target", target),
                );
                continue;
            };

            if source == target {
                warn!(document:% = source, element:% = link.source_element_id(); "Document calls itself");
                collector.emit(
                    Diagnostic::error(format!(
                        "`{}` in `{source}` calls its own document",
                        link.source_element_id()
                    ))
                    .with_code(ErrorCode::E200)
                    .with_context("document", source)
                    .with_context("element", link.source_element_id())
                    .with_help("the call is not expanded in the hierarchy"),
                );
            }

            let edge = match graph.find_edge(from, to) {
                Some(edge) => edge,
                None => graph.add_edge(from, to, CallEdge::default()),
            };
            if let Some(weight) = graph.edge_weight_mut(edge) {
                weight.call_sites.push(link.source_element_id());
            }

            call_sites_by_target
                .entry(target)
                .or_default()
                .insert((source, link.source_element_id()));
        }

        let reuse_counts: BTreeMap<Id, usize> = call_sites_by_target
            .into_iter()
            .map(|(target, sites)| (target, sites.len()))
            .collect();

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            reused = reuse_counts.values().filter(|count| **count > 1).count();
            "Document graph built"
        );
        trace!(graph:?; "Document graph");

        Self {
            graph,
            node_indices,
            reuse_counts,
            links,
            diagnostics: collector.finish(),
        }
    }

    /// Documents in file-name order.
    pub fn documents(&self) -> impl Iterator<Item = Id> + '_ {
        self.graph.node_weights().copied()
    }

    pub fn contains(&self, document: Id) -> bool {
        self.node_indices.contains_key(&document)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edges(&self) -> impl Iterator<Item = GraphEdge<'_>> {
        self.graph.edge_references().map(|edge| GraphEdge {
            from: self.graph[edge.source()],
            to: self.graph[edge.target()],
            call: edge.weight(),
        })
    }

    /// All links the graph was built from, matched or not.
    pub fn links(&self) -> &[SubprocessLink] {
        &self.links
    }

    /// The link of one call site.
    pub fn link(&self, document: Id, element: Id) -> Option<&SubprocessLink> {
        self.links
            .iter()
            .find(|link| link.source_document() == document && link.source_element_id() == element)
    }

    /// Graph-level diagnostics (self calls, links from unknown documents).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of distinct call sites that resolve to `document`.
    pub fn reuse_count(&self, document: Id) -> usize {
        self.reuse_counts.get(&document).copied().unwrap_or(0)
    }

    /// Documents called from more than one call site, with their counts.
    pub fn reused_targets(&self) -> impl Iterator<Item = (Id, usize)> + '_ {
        self.reuse_counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(document, count)| (*document, *count))
    }

    /// Number of distinct documents calling `document`. Self calls are not
    /// counted.
    pub fn in_degree(&self, document: Id) -> usize {
        self.neighbors(document, Direction::Incoming).len()
    }

    /// Number of distinct documents called by `document`. Self calls are not
    /// counted.
    pub fn out_degree(&self, document: Id) -> usize {
        self.neighbors(document, Direction::Outgoing).len()
    }

    /// Documents called by `document`, in file-name order.
    pub fn callees(&self, document: Id) -> Vec<Id> {
        self.neighbors(document, Direction::Outgoing)
    }

    /// Documents calling `document`, in file-name order.
    pub fn callers(&self, document: Id) -> Vec<Id> {
        self.neighbors(document, Direction::Incoming)
    }

    /// Returns `true` if `document` calls itself.
    pub fn has_self_call(&self, document: Id) -> bool {
        self.node_indices
            .get(&document)
            .is_some_and(|&idx| self.graph.find_edge(idx, idx).is_some())
    }

    fn neighbors(&self, document: Id, direction: Direction) -> Vec<Id> {
        let Some(&idx) = self.node_indices.get(&document) else {
            return Vec::new();
        };
        let mut neighbors: Vec<Id> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter(|&other| other != idx)
            .map(|other| self.graph[other])
            .collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    /// Link outcome counts.
    pub fn stats(&self) -> LinkStats {
        let count = |status| {
            self.links
                .iter()
                .filter(|link| link.match_status() == status)
                .count()
        };
        LinkStats {
            documents: self.graph.node_count(),
            edges: self.graph.edge_count(),
            links: self.links.len(),
            matched: count(MatchStatus::Matched),
            unresolved: count(MatchStatus::Unresolved),
            ambiguous: count(MatchStatus::Ambiguous),
            self_calls: self.edges().filter(GraphEdge::is_self_call).count(),
            reused_targets: self.reused_targets().count(),
        }
    }

    /// Renders the graph in Graphviz DOT format. Edge labels show the call
    /// site, or the number of call sites for merged edges.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }
}

#[cfg(test)]
mod tests {
    use sextant_core::{
        corpus::{DocumentCatalog, ExplicitMapping, MappingEntry},
        element::{ElementKind, ElementRecord},
    };

    use super::*;
    use crate::{config::ResolverConfig, resolver::SubprocessResolver};

    fn call(owner: &str, id: &str, hint: &str) -> ElementRecord {
        ElementRecord::new(
            Id::new(owner),
            Id::new(id),
            ElementKind::CallActivity {
                called_document_hint: Some(hint.to_string()),
            },
        )
    }

    fn graph(corpus: &Corpus) -> DocumentGraph {
        let links = SubprocessResolver::new(corpus, &ResolverConfig::default()).resolve_all();
        DocumentGraph::build(corpus, links)
    }

    fn sample_corpus() -> Corpus {
        Corpus::new()
            .with_document(
                DocumentCatalog::new(Id::new("root.bpmn"))
                    .with_element(call("root.bpmn", "c1", "shared"))
                    .with_element(call("root.bpmn", "c2", "shared"))
                    .with_element(call("root.bpmn", "c3", "mid")),
            )
            .with_document(
                DocumentCatalog::new(Id::new("mid.bpmn")).with_element(call("mid.bpmn", "c1", "shared")),
            )
            .with_document(DocumentCatalog::new(Id::new("shared.bpmn")))
    }

    #[test]
    fn test_multi_edges_collapse() {
        let graph = graph(&sample_corpus());

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);

        let root_to_shared = graph
            .edges()
            .find(|edge| edge.from == "root.bpmn" && edge.to == "shared.bpmn")
            .unwrap();
        assert_eq!(root_to_shared.call.call_sites(), [Id::new("c1"), Id::new("c2")]);
    }

    #[test]
    fn test_reuse_counts_distinct_call_sites() {
        let graph = graph(&sample_corpus());

        assert_eq!(graph.reuse_count(Id::new("shared.bpmn")), 3);
        assert_eq!(graph.reuse_count(Id::new("mid.bpmn")), 1);
        assert_eq!(graph.reuse_count(Id::new("root.bpmn")), 0);
        let reused: Vec<(Id, usize)> = graph.reused_targets().collect();
        assert_eq!(reused, [(Id::new("shared.bpmn"), 3)]);
    }

    #[test]
    fn test_degrees() {
        let graph = graph(&sample_corpus());

        assert_eq!(graph.in_degree(Id::new("root.bpmn")), 0);
        assert_eq!(graph.out_degree(Id::new("root.bpmn")), 2);
        assert_eq!(graph.in_degree(Id::new("shared.bpmn")), 2);
        assert_eq!(graph.callers(Id::new("shared.bpmn")), [Id::new("mid.bpmn"), Id::new("root.bpmn")]);
        assert_eq!(graph.callees(Id::new("unknown.bpmn")), Vec::<Id>::new());
    }

    #[test]
    fn test_self_call_kept_and_flagged() {
        let corpus = Corpus::new()
            .with_document(
                DocumentCatalog::new(Id::new("loop.bpmn")).with_element(call("loop.bpmn", "again", "loop")),
            )
            .with_mapping(ExplicitMapping::new("map.json").with_entry(MappingEntry::new(
                Id::new("loop.bpmn"),
                Id::new("again"),
                "loop.bpmn",
            )));

        let graph = graph(&corpus);

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_self_call(Id::new("loop.bpmn")));
        assert_eq!(graph.in_degree(Id::new("loop.bpmn")), 0);
        assert_eq!(graph.diagnostics()[0].code(), Some(ErrorCode::E200));
        assert_eq!(graph.stats().self_calls, 1);
    }

    #[test]
    fn test_stats() {
        let corpus = sample_corpus().with_document(
            DocumentCatalog::new(Id::new("x.bpmn")).with_element(call("x.bpmn", "lost", "nothing-like-it")),
        );

        let stats = graph(&corpus).stats();

        assert_eq!(stats.documents, 4);
        assert_eq!(stats.links, 5);
        assert_eq!(stats.matched, 4);
        assert_eq!(stats.unresolved, 1);
        assert_eq!(stats.ambiguous, 0);
        assert_eq!(stats.reused_targets, 1);
    }

    #[test]
    fn test_dot_output() {
        let dot = graph(&sample_corpus()).to_dot();

        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("root.bpmn"));
        assert!(dot.contains("2 call sites"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
