//! Tree construction from the document graph.

use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};

use sextant_core::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    identifier::Id,
};

use super::{NodeKind, NodeLink, ProcessTree, TreeNode};
use crate::{
    config::TreeConfig,
    error::SextantError,
    graph::DocumentGraph,
    ordering::{self, DocumentOrdering},
    resolver::{CorpusIndex, SubprocessLink},
};

/// The chosen root document and how it was chosen.
#[derive(Debug, Clone)]
pub struct RootSelection {
    pub root: Id,
    pub diagnostics: Vec<Diagnostic>,
}

/// A node under construction; children are arena indices.
#[derive(Debug)]
struct Slot {
    node: TreeNode,
    children: Vec<usize>,
}

/// A pending expansion of `document` below the node in `slot`.
#[derive(Debug)]
struct Frame {
    slot: usize,
    document: Id,
    /// Documents on the path from the root to this expansion, inclusive.
    path: Vec<Id>,
    depth: usize,
}

/// Builds the [`ProcessTree`] of a corpus.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    index: &'a CorpusIndex<'a>,
    graph: &'a DocumentGraph,
    config: &'a TreeConfig,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(index: &'a CorpusIndex<'a>, graph: &'a DocumentGraph, config: &'a TreeConfig) -> Self {
        Self {
            index,
            graph,
            config,
        }
    }

    /// Picks the root document.
    ///
    /// A root hint that resolves to exactly one document wins. Otherwise the
    /// uncalled document with the most callees is chosen. When every
    /// document is called by another, the one with the fewest callers is
    /// chosen and an `E301` error is recorded. Ties go to the first file
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`SextantError::NoRoot`] when the graph has no documents.
    pub fn select_root(&self) -> Result<RootSelection, SextantError> {
        let mut collector = DiagnosticCollector::new();

        if let Some(hint) = self.config.root() {
            match self.index.lookup(hint).as_slice() {
                [root] if self.graph.contains(*root) => {
                    debug!(root:% = root, hint; "Root selected from hint");
                    return Ok(RootSelection {
                        root: *root,
                        diagnostics: Vec::new(),
                    });
                }
                candidates => {
                    collector.emit(
                        Diagnostic::warning(format!("root hint `{hint}` does not name one document"))
                            .with_code(ErrorCode::E302)
                            .with_context("hint", hint)
                            .with_context("candidates", candidates.len())
                            .with_help("the root is chosen from the call graph instead"),
                    );
                }
            }
        }

        let entry_points = self
            .graph
            .documents()
            .filter(|document| self.graph.in_degree(*document) == 0);
        if let Some(root) = max_by_first(entry_points, |document| self.graph.out_degree(*document)) {
            debug!(root:% = root; "Root selected from call graph");
            return Ok(RootSelection {
                root,
                diagnostics: collector.finish(),
            });
        }

        let fewest_callers = max_by_first(self.graph.documents(), |document| {
            usize::MAX - self.graph.in_degree(*document)
        });
        let Some(root) = fewest_callers else {
            return Err(SextantError::NoRoot);
        };
        warn!(root:% = root; "Every document is called by another");
        collector.emit(
            Diagnostic::error("every document is called by another document")
                .with_code(ErrorCode::E301)
                .with_context("root", root)
                .with_context("callers", self.graph.in_degree(root))
                .with_help("set a root document in the configuration"),
        );
        Ok(RootSelection {
            root,
            diagnostics: collector.finish(),
        })
    }

    /// Builds the tree below the selected root.
    ///
    /// The walk uses an explicit worklist. Each frame carries the documents
    /// on its path; a call activity whose target is on that path is not
    /// expanded (see [`cycle_break`]).
    ///
    /// # Errors
    ///
    /// Returns [`SextantError::NoRoot`] when no root can be selected.
    pub fn build(&self) -> Result<ProcessTree, SextantError> {
        let RootSelection { root, diagnostics } = self.select_root()?;
        info!(root:% = root; "Building process tree");

        let mut collector = DiagnosticCollector::new();
        collector.extend(diagnostics);

        let links: HashMap<(Id, Id), &SubprocessLink> = self
            .graph
            .links()
            .iter()
            .map(|link| ((link.source_document(), link.source_element_id()), link))
            .collect();

        let root_label = self
            .index
            .corpus()
            .document(root)
            .map(|document| document.label())
            .unwrap_or_else(|| root.to_string());

        let mut slots = vec![Slot {
            node: TreeNode::document(root, root_label),
            children: Vec::new(),
        }];
        let mut stack = vec![Frame {
            slot: 0,
            document: root,
            path: vec![root],
            depth: 0,
        }];
        let mut orderings: HashMap<Id, DocumentOrdering> = HashMap::new();
        let mut reached: BTreeSet<Id> = BTreeSet::from([root]);

        while let Some(frame) = stack.pop() {
            let Some(document) = self.index.corpus().document(frame.document) else {
                continue;
            };
            let ordering = orderings
                .entry(frame.document)
                .or_insert_with(|| DocumentOrdering::for_document(document));
            let parent_id = slots[frame.slot].node.id();

            for element in document.elements() {
                let mut node = TreeNode::element(
                    parent_id.create_nested(element.id()),
                    element.label(),
                    NodeKind::from_element(element.kind()),
                    frame.document,
                    element.id(),
                    ordering.hints(element.id()),
                );

                let mut expansion = None;
                if let Some(link) = links.get(&(frame.document, element.id())) {
                    node.data.diagnostics.extend(link.diagnostics().iter().cloned());
                    let reuse_count = link.matched_document().map_or(0, |target| self.graph.reuse_count(target));
                    node.data.subprocess_link = Some(NodeLink::new((*link).clone(), reuse_count));
                    if let Some(target) = link.matched_document() {
                        if let Some(diagnostic) = cycle_break(&frame.path, target, node.id()) {
                            node.data.diagnostics.push(diagnostic);
                        } else if frame.depth + 1 > self.config.max_depth() {
                            node.data.diagnostics.push(
                                Diagnostic::warning(format!(
                                    "call to `{target}` not expanded: depth limit {} reached",
                                    self.config.max_depth()
                                ))
                                .with_code(ErrorCode::E303)
                                .with_context("node", node.id())
                                .with_context("target", target),
                            );
                        } else {
                            expansion = Some(target);
                        }
                    }
                }

                let slot = slots.len();
                slots.push(Slot {
                    node,
                    children: Vec::new(),
                });
                slots[frame.slot].children.push(slot);

                if let Some(target) = expansion {
                    reached.insert(target);
                    let mut path = frame.path.clone();
                    path.push(target);
                    stack.push(Frame {
                        slot,
                        document: target,
                        path,
                        depth: frame.depth + 1,
                    });
                }
            }
        }

        let unreachable: Vec<Id> = self
            .graph
            .documents()
            .filter(|document| !reached.contains(document))
            .collect();
        if !unreachable.is_empty() {
            let names: Vec<String> = unreachable.iter().map(Id::to_string).collect();
            collector.emit(
                Diagnostic::info(format!(
                    "{} documents are not reachable from `{root}`",
                    unreachable.len()
                ))
                .with_code(ErrorCode::E304)
                .with_context("documents", names.join(", ")),
            );
        }

        let root_node = assemble(slots).ok_or(SextantError::NoRoot)?;
        let tree = ProcessTree::new(root_node, collector.finish());
        info!(nodes = tree.len(), depth = tree.depth(); "Process tree built");
        Ok(tree)
    }
}

/// The cycle-break policy: a call whose target document is already on the
/// path from the root is not followed, and the calling node gets an `E300`
/// error instead of children.
pub(crate) fn cycle_break(path: &[Id], target: Id, node: Id) -> Option<Diagnostic> {
    if !path.contains(&target) {
        return None;
    }
    let chain: Vec<String> = path
        .iter()
        .chain(std::iter::once(&target))
        .map(Id::to_string)
        .collect();
    warn!(node:% = node, target:% = target; "Cyclic call detected");
    Some(
        Diagnostic::error(format!("cyclic call detected: `{target}` is already being expanded"))
            .with_code(ErrorCode::E300)
            .with_context("node", node)
            .with_context("target", target)
            .with_context("chain", chain.join(" -> "))
            .with_help("the call is shown without children"),
    )
}

/// Turns the arena into nested nodes with sorted children.
///
/// Children always sit at higher indices than their parent, so a single
/// reverse pass finishes every child before its parent.
fn assemble(slots: Vec<Slot>) -> Option<TreeNode> {
    let (mut nodes, children): (Vec<Option<TreeNode>>, Vec<Vec<usize>>) = slots
        .into_iter()
        .map(|slot| (Some(slot.node), slot.children))
        .unzip();

    for idx in (0..nodes.len()).rev() {
        let mut finished: Vec<TreeNode> = children[idx]
            .iter()
            .filter_map(|&child| nodes[child].take())
            .collect();
        finished.sort_by(|a, b| ordering::compare(&a.sort_key(), &b.sort_key()));
        if let Some(node) = nodes[idx].as_mut() {
            node.children = finished;
        }
    }

    nodes.into_iter().next().flatten()
}

/// The first item with the greatest score.
fn max_by_first<I, F>(items: I, score: F) -> Option<Id>
where
    I: Iterator<Item = Id>,
    F: Fn(&Id) -> usize,
{
    let mut best: Option<(Id, usize)> = None;
    for item in items {
        let value = score(&item);
        if best.is_none_or(|(_, best_value)| value > best_value) {
            best = Some((item, value));
        }
    }
    best.map(|(item, _)| item)
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use sextant_core::{
        corpus::{Corpus, DocumentCatalog, ExplicitMapping, MappingEntry},
        element::{ElementKind, ElementRecord},
    };

    use super::*;
    use crate::{config::ResolverConfig, resolver::SubprocessResolver};

    // ===================
    // Strategies
    // ===================

    /// A corpus of `doc0.bpmn`..`docN.bpmn` with call activities along
    /// random `(from, to)` pairs, self calls and cycles included.
    fn corpus_strategy() -> impl Strategy<Value = Corpus> {
        (1usize..5).prop_flat_map(|count| {
            prop::collection::vec((0..count, 0..count), 0..8).prop_map(move |calls| {
                let mut documents: Vec<DocumentCatalog> = (0..count)
                    .map(|idx| DocumentCatalog::new(Id::new(&format!("doc{idx}.bpmn"))))
                    .collect();
                // Hints never resolve to the calling document, so self calls
                // go through the mapping.
                let mut mapping = ExplicitMapping::new("map.json");
                for (site, (from, to)) in calls.into_iter().enumerate() {
                    let owner = documents[from].file_name();
                    let element = Id::new(&format!("call{site}"));
                    documents[from].push_element(ElementRecord::new(
                        owner,
                        element,
                        ElementKind::CallActivity {
                            called_document_hint: Some(format!("doc{to}")),
                        },
                    ));
                    if from == to {
                        mapping = mapping.with_entry(MappingEntry::new(owner, element, format!("doc{to}.bpmn")));
                    }
                }
                documents
                    .into_iter()
                    .fold(Corpus::new(), |corpus, document| corpus.with_document(document))
                    .with_mapping(mapping)
            })
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    fn build_tree(corpus: &Corpus) -> ProcessTree {
        let resolver_config = ResolverConfig::default();
        let tree_config = TreeConfig::default();
        let index = CorpusIndex::new(corpus, &resolver_config);
        let links = SubprocessResolver::new(corpus, &resolver_config).resolve_all();
        let graph = DocumentGraph::build(corpus, links);
        TreeBuilder::new(&index, &graph, &tree_config)
            .build()
            .expect("non-empty corpus has a root")
    }

    /// No expanded call re-enters a document already on its path, and every
    /// call that was not expanded for that reason carries a cycle error.
    fn check_acyclic(corpus: &Corpus) -> Result<(), TestCaseError> {
        let tree = build_tree(corpus);
        let mut stack: Vec<(&TreeNode, Vec<Id>)> = vec![(tree.root(), vec![tree.root().id()])];

        while let Some((node, path)) = stack.pop() {
            for child in node.children() {
                let mut child_path = path.clone();
                if let Some(target) = child.matched_document() {
                    let on_path = path.contains(&target);
                    if on_path {
                        prop_assert!(child.is_leaf(), "`{}` re-enters `{}`", child.id(), target);
                        prop_assert!(
                            child.diagnostics().iter().any(|d| d.code() == Some(ErrorCode::E300)),
                            "`{}` has no cycle diagnostic",
                            child.id()
                        );
                    } else {
                        child_path.push(target);
                    }
                }
                stack.push((child, child_path));
            }
        }
        Ok(())
    }

    /// Two builds of the same corpus produce the same node sequence.
    fn check_deterministic(corpus: &Corpus) -> Result<(), TestCaseError> {
        let first: Vec<Id> = build_tree(corpus).iter().map(TreeNode::id).collect();
        let second: Vec<Id> = build_tree(corpus).iter().map(TreeNode::id).collect();
        prop_assert_eq!(first, second);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn tree_never_reenters_its_path(corpus in corpus_strategy()) {
            check_acyclic(&corpus)?;
        }

        #[test]
        fn tree_build_is_deterministic(corpus in corpus_strategy()) {
            check_deterministic(&corpus)?;
        }
    }
}
