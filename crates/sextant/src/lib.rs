//! Sextant - cross-document hierarchy resolution for process-definition corpora.
//!
//! Given the element catalogs of a set of process documents, Sextant links
//! every call activity to the document it invokes, builds the document call
//! graph and a rooted process tree, enumerates start-to-end paths within a
//! document and lays the tree out on a calendar.
//!
//! The pipeline stages are exposed as modules and can be used on their own:
//!
//! - [`resolver`] - call activity to document matching
//! - [`graph`] - the document call graph with reuse counts
//! - [`tree`] - root selection and the process tree
//! - [`flow`] - path enumeration within one document
//! - [`schedule`] - calendar scheduling of a tree
//!
//! [`HierarchyBuilder`] runs them in order.

pub mod config;
pub mod flow;
pub mod graph;
pub mod ordering;
pub mod resolver;
pub mod schedule;
pub mod tree;

mod error;

pub use sextant_catalog::{CatalogCache, CatalogError, LoadOptions};
pub use sextant_core::{corpus, element, error as diagnostics, identifier};

pub use error::SextantError;

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::NaiveDate;
use log::{info, trace};

use sextant_core::{
    corpus::{Corpus, DocumentCatalog},
    error::Diagnostic,
};

use config::AppConfig;
use flow::{FlowGraph, PathEnumeration, PathEnumerator};
use graph::DocumentGraph;
use resolver::{CorpusIndex, SubprocessResolver};
use schedule::{ScheduledTree, Scheduler};
use tree::{ProcessTree, TreeBuilder, TreeNode};

/// The result of one resolution pass over a corpus.
#[derive(Debug)]
pub struct Hierarchy {
    corpus_diagnostics: Vec<Diagnostic>,
    graph: DocumentGraph,
    tree: ProcessTree,
}

impl Hierarchy {
    /// The document graph, including every subprocess link.
    pub fn graph(&self) -> &DocumentGraph {
        &self.graph
    }

    pub fn tree(&self) -> &ProcessTree {
        &self.tree
    }

    /// Every diagnostic of the pass, each once: loading, links, graph and
    /// tree construction. Diagnostics on individual tree nodes are available
    /// through [`ProcessTree::node_diagnostics`].
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        self.corpus_diagnostics
            .iter()
            .chain(self.graph.links().iter().flat_map(|link| link.diagnostics()))
            .chain(self.graph.diagnostics())
            .chain(self.tree.diagnostics())
            .collect()
    }

    /// Returns `true` if any diagnostic of the pass, node-attached ones
    /// included, is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics()
            .into_iter()
            .chain(self.tree.node_diagnostics().into_iter().map(|(_, diagnostic)| diagnostic))
            .any(|diagnostic| diagnostic.severity().is_error())
    }
}

/// Runs a resolution pass over a corpus.
///
/// # Examples
///
/// ```
/// use sextant::HierarchyBuilder;
/// use sextant::corpus::{Corpus, DocumentCatalog};
/// use sextant::element::{ElementKind, ElementRecord};
/// use sextant::identifier::Id;
///
/// let main = Id::new("main.bpmn");
/// let corpus = Corpus::new()
///     .with_document(DocumentCatalog::new(main).with_element(ElementRecord::new(
///         main,
///         Id::new("check"),
///         ElementKind::CallActivity { called_document_hint: Some("credit".to_string()) },
///     )))
///     .with_document(DocumentCatalog::new(Id::new("credit.bpmn")));
///
/// let hierarchy = HierarchyBuilder::default().build(&corpus).unwrap();
/// assert_eq!(hierarchy.tree().root().id(), "main.bpmn");
/// assert_eq!(hierarchy.graph().edge_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    config: AppConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl HierarchyBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self { config, cancel: None }
    }

    /// Stops a pass at the next stage boundary once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Loads a corpus directory through the caller's cache.
    ///
    /// # Errors
    ///
    /// Returns [`SextantError::Catalog`] when the directory or the mapping
    /// file cannot be read. Individual documents that fail to load are
    /// reported as corpus diagnostics instead.
    pub fn load(
        &self,
        dir: &Path,
        mapping: Option<&Path>,
        cache: &mut CatalogCache,
    ) -> Result<Corpus, SextantError> {
        let options = match mapping {
            Some(path) => LoadOptions::new().with_mapping(path),
            None => LoadOptions::new(),
        };
        let corpus = sextant_catalog::load_corpus(dir, &options, cache)?;
        Ok(corpus)
    }

    /// Resolves links, builds the graph and the tree.
    ///
    /// # Errors
    ///
    /// Returns [`SextantError::EmptyCorpus`] for a corpus without documents,
    /// [`SextantError::NoRoot`] when no root can be chosen and
    /// [`SextantError::Cancelled`] when the cancellation flag was set.
    pub fn build(&self, corpus: &Corpus) -> Result<Hierarchy, SextantError> {
        if corpus.is_empty() {
            return Err(SextantError::EmptyCorpus);
        }

        self.check_cancelled("resolution")?;
        let resolver = SubprocessResolver::new(corpus, self.config.resolver());
        let links = resolver.resolve_all();

        self.check_cancelled("graph construction")?;
        let graph = DocumentGraph::build(corpus, links);
        trace!(graph:? = graph; "Document graph");

        self.check_cancelled("tree construction")?;
        let tree = TreeBuilder::new(resolver.index(), &graph, self.config.tree()).build()?;

        Ok(Hierarchy {
            corpus_diagnostics: corpus.diagnostics().to_vec(),
            graph,
            tree,
        })
    }

    /// Enumerates start-to-end paths of one document.
    pub fn paths(&self, document: &DocumentCatalog) -> PathEnumeration {
        let graph = FlowGraph::from_document(document);
        PathEnumerator::new(self.config.flow()).enumerate(&graph)
    }

    /// Like [`HierarchyBuilder::paths`], finding the document by file name,
    /// process id or name.
    ///
    /// # Errors
    ///
    /// Returns [`SextantError::UnknownDocument`] unless the reference names
    /// exactly one document.
    pub fn paths_for(&self, corpus: &Corpus, reference: &str) -> Result<PathEnumeration, SextantError> {
        let index = CorpusIndex::new(corpus, self.config.resolver());
        let document = match index.lookup(reference).as_slice() {
            [file_name] => corpus.document(*file_name),
            _ => None,
        }
        .ok_or_else(|| SextantError::UnknownDocument(reference.to_string()))?;
        Ok(self.paths(document))
    }

    /// Schedules a tree with the configured default leaf duration.
    pub fn schedule(&self, tree: &ProcessTree, project_start: NaiveDate) -> ScheduledTree {
        Scheduler::new(self.config.schedule()).schedule(tree, project_start)
    }

    /// Schedules a tree with a per-leaf duration function.
    pub fn schedule_with<F>(&self, tree: &ProcessTree, project_start: NaiveDate, duration: F) -> ScheduledTree
    where
        F: Fn(&TreeNode) -> i64,
    {
        Scheduler::new(self.config.schedule())
            .with_duration(duration)
            .schedule(tree, project_start)
    }

    fn check_cancelled(&self, stage: &'static str) -> Result<(), SextantError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                info!(stage; "Resolution pass cancelled");
                Err(SextantError::Cancelled { stage })
            }
            _ => Ok(()),
        }
    }
}
