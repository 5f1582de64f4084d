//! The rooted process hierarchy.
//!
//! A [`ProcessTree`] is built once from the document graph and never
//! mutated afterwards. Every occurrence of a called document is its own
//! subtree; shared subprocesses are recognizable through the reuse count on
//! [`NodeLink`], not through shared nodes. `children` is the only ownership
//! relation: parents are found by [`ProcessTree::parent_of`], never stored.

mod builder;

pub use builder::{RootSelection, TreeBuilder};

use std::fmt;

use serde::Serialize;

use sextant_core::{element::ElementKind, error::Diagnostic, identifier::Id};

use crate::{
    ordering::{OrderHints, SiblingKey},
    resolver::SubprocessLink,
};

/// What a tree node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Document,
    CallActivity,
    SubProcess,
    Task,
    Gateway,
    StartEvent,
    EndEvent,
    IntermediateEvent,
    BoundaryEvent,
}

impl NodeKind {
    pub fn from_element(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::StartEvent => NodeKind::StartEvent,
            ElementKind::EndEvent => NodeKind::EndEvent,
            ElementKind::IntermediateEvent => NodeKind::IntermediateEvent,
            ElementKind::BoundaryEvent => NodeKind::BoundaryEvent,
            ElementKind::Task { .. } => NodeKind::Task,
            ElementKind::CallActivity { .. } => NodeKind::CallActivity,
            ElementKind::SubProcess => NodeKind::SubProcess,
            ElementKind::Gateway { .. } => NodeKind::Gateway,
        }
    }

    /// Activities, tasks and decisions take time on a schedule; documents
    /// and events do not.
    pub fn is_schedulable(&self) -> bool {
        matches!(
            self,
            NodeKind::CallActivity | NodeKind::SubProcess | NodeKind::Task | NodeKind::Gateway
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::CallActivity => "callActivity",
            NodeKind::SubProcess => "subProcess",
            NodeKind::Task => "task",
            NodeKind::Gateway => "gateway",
            NodeKind::StartEvent => "startEvent",
            NodeKind::EndEvent => "endEvent",
            NodeKind::IntermediateEvent => "intermediateEvent",
            NodeKind::BoundaryEvent => "boundaryEvent",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call activity's link as seen from one occurrence in the tree.
#[derive(Debug, Clone, Serialize)]
pub struct NodeLink {
    #[serde(flatten)]
    link: SubprocessLink,
    reuse_count: usize,
}

impl NodeLink {
    pub fn new(link: SubprocessLink, reuse_count: usize) -> Self {
        Self { link, reuse_count }
    }

    pub fn link(&self) -> &SubprocessLink {
        &self.link
    }

    /// Distinct call sites across the corpus that resolve to the same
    /// document.
    pub fn reuse_count(&self) -> usize {
        self.reuse_count
    }

    pub fn is_reused(&self) -> bool {
        self.reuse_count > 1
    }
}

/// What a tree node says about itself, without its children.
#[derive(Debug, Clone, Serialize)]
pub struct NodeData {
    id: Id,
    label: String,
    kind: NodeKind,
    owner_document: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    element_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visual_order_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subprocess_link: Option<NodeLink>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl NodeData {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn owner_document(&self) -> Id {
        self.owner_document
    }

    pub fn element_id(&self) -> Option<Id> {
        self.element_id
    }

    pub fn order_index(&self) -> Option<u32> {
        self.order_index
    }

    pub fn visual_order_index(&self) -> Option<u32> {
        self.visual_order_index
    }

    pub fn branch_id(&self) -> Option<&str> {
        self.branch_id.as_deref()
    }

    pub fn subprocess_link(&self) -> Option<&NodeLink> {
        self.subprocess_link.as_ref()
    }

    /// The document this node's call activity resolved to, if any.
    pub fn matched_document(&self) -> Option<Id> {
        self.subprocess_link
            .as_ref()
            .and_then(|link| link.link().matched_document())
    }

    /// Diagnostics attached to this node only.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// One node of the process hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    data: NodeData,
    children: Vec<TreeNode>,
}

impl TreeNode {
    /// A document node (the tree root).
    pub(crate) fn document(document: Id, label: String) -> Self {
        Self {
            data: NodeData {
                id: document,
                label,
                kind: NodeKind::Document,
                owner_document: document,
                element_id: None,
                order_index: None,
                visual_order_index: None,
                branch_id: None,
                subprocess_link: None,
                diagnostics: Vec::new(),
            },
            children: Vec::new(),
        }
    }

    /// An element node whose id is nested under its parent's id.
    pub(crate) fn element(
        id: Id,
        label: String,
        kind: NodeKind,
        owner_document: Id,
        element_id: Id,
        hints: OrderHints,
    ) -> Self {
        Self {
            data: NodeData {
                id,
                label,
                kind,
                owner_document,
                element_id: Some(element_id),
                order_index: hints.order_index,
                visual_order_index: hints.visual_order_index,
                branch_id: hints.branch_id,
                subprocess_link: None,
                diagnostics: Vec::new(),
            },
            children: Vec::new(),
        }
    }

    /// The node without its children.
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn id(&self) -> Id {
        self.data.id
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind
    }

    pub fn owner_document(&self) -> Id {
        self.data.owner_document
    }

    pub fn element_id(&self) -> Option<Id> {
        self.data.element_id
    }

    pub fn order_index(&self) -> Option<u32> {
        self.data.order_index
    }

    pub fn visual_order_index(&self) -> Option<u32> {
        self.data.visual_order_index
    }

    pub fn branch_id(&self) -> Option<&str> {
        self.data.branch_id()
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    pub fn subprocess_link(&self) -> Option<&NodeLink> {
        self.data.subprocess_link()
    }

    /// The document this node's call activity resolved to, if any.
    pub fn matched_document(&self) -> Option<Id> {
        self.data.matched_document()
    }

    /// Diagnostics attached to this node only.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.data.diagnostics
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn sort_key(&self) -> SiblingKey<'_> {
        SiblingKey {
            visual_order_index: self.data.visual_order_index,
            order_index: self.data.order_index,
            branch_id: self.data.branch_id.as_deref(),
            label: &self.data.label,
            id: self.data.id,
        }
    }

    /// Iterates this node and its descendants in depth-first pre-order,
    /// children in sibling order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.iter_with_depth().map(|(_, node)| node)
    }

    /// Like [`TreeNode::iter`], paired with the depth below this node.
    pub fn iter_with_depth(&self) -> impl Iterator<Item = (usize, &TreeNode)> {
        let mut stack = vec![(0, self)];
        std::iter::from_fn(move || {
            let (depth, node) = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
            Some((depth, node))
        })
    }
}

/// The process hierarchy of one resolution pass.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessTree {
    root: TreeNode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl ProcessTree {
    pub(crate) fn new(root: TreeNode, diagnostics: Vec<Diagnostic>) -> Self {
        Self { root, diagnostics }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Build-level diagnostics: root selection and unreachable documents.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// All nodes in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.root.iter()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always `false`: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Depth of the deepest node; the root alone has depth 0.
    pub fn depth(&self) -> usize {
        self.root
            .iter_with_depth()
            .map(|(depth, _)| depth)
            .max()
            .unwrap_or(0)
    }

    pub fn find(&self, id: Id) -> Option<&TreeNode> {
        self.iter().find(|node| node.id() == id)
    }

    /// The parent of the node with the given id. `None` for the root or an
    /// unknown id.
    pub fn parent_of(&self, id: Id) -> Option<&TreeNode> {
        self.iter()
            .find(|node| node.children.iter().any(|child| child.id() == id))
    }

    /// The nodes from the root down to the node with the given id.
    pub fn path_to(&self, id: Id) -> Vec<&TreeNode> {
        let mut path = Vec::new();
        let mut current = self.find(id);
        while let Some(node) = current {
            path.push(node);
            current = self.parent_of(node.id());
        }
        path.reverse();
        path
    }

    /// Every node-attached diagnostic, paired with its node id, in tree
    /// order.
    pub fn node_diagnostics(&self) -> Vec<(Id, &Diagnostic)> {
        self.iter()
            .flat_map(|node| node.diagnostics().iter().map(move |diagnostic| (node.id(), diagnostic)))
            .collect()
    }
}
