//! Start-to-end path enumeration within a single document.
//!
//! A [`FlowGraph`] is the sequence-flow graph of one document. The
//! [`PathEnumerator`] walks it depth-first from every start node and emits a
//! [`ProcessPath`] per distinct route that reaches an end node. Each route
//! owns its visited set, so branches that re-converge are walked once per
//! route while a loop is never walked twice within one route.
//!
//! # Example
//!
//! ```
//! # use sextant::{config::FlowConfig, flow::{FlowGraph, PathEnumerator}};
//! # use sextant::corpus::DocumentCatalog;
//! # use sextant::element::{ElementKind, ElementRecord, SequenceFlow};
//! # use sextant::identifier::Id;
//! let doc = Id::new("intake.bpmn");
//! let document = DocumentCatalog::new(doc)
//!     .with_element(ElementRecord::new(doc, Id::new("start"), ElementKind::StartEvent))
//!     .with_element(ElementRecord::new(doc, Id::new("done"), ElementKind::EndEvent))
//!     .with_flow(SequenceFlow::new(Id::new("f1"), Id::new("start"), Id::new("done")));
//!
//! let graph = FlowGraph::from_document(&document);
//! let enumeration = PathEnumerator::new(&FlowConfig::default()).enumerate(&graph);
//! assert_eq!(enumeration.paths().len(), 1);
//! ```

use std::{collections::HashSet, fmt};

use indexmap::IndexMap;
use log::{debug, info, trace};
use serde::Serialize;

use sextant_catalog::condition;
use sextant_core::{
    corpus::DocumentCatalog,
    element::{ElementKind, ElementRecord},
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    identifier::Id,
};

use crate::config::FlowConfig;

/// The role of a node in the flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowNodeKind {
    Start,
    Task,
    CallActivity,
    Gateway,
    SubProcess,
    Intermediate,
    End,
}

impl FlowNodeKind {
    fn from_element(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::StartEvent => FlowNodeKind::Start,
            ElementKind::EndEvent => FlowNodeKind::End,
            ElementKind::IntermediateEvent | ElementKind::BoundaryEvent => FlowNodeKind::Intermediate,
            ElementKind::Task { .. } => FlowNodeKind::Task,
            ElementKind::CallActivity { .. } => FlowNodeKind::CallActivity,
            ElementKind::SubProcess => FlowNodeKind::SubProcess,
            ElementKind::Gateway { .. } => FlowNodeKind::Gateway,
        }
    }
}

impl fmt::Display for FlowNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowNodeKind::Start => "start",
            FlowNodeKind::Task => "task",
            FlowNodeKind::CallActivity => "callActivity",
            FlowNodeKind::Gateway => "gateway",
            FlowNodeKind::SubProcess => "subProcess",
            FlowNodeKind::Intermediate => "intermediate",
            FlowNodeKind::End => "end",
        };
        f.write_str(name)
    }
}

/// A node of the flow graph with the ids of its edges.
#[derive(Debug, Clone, Serialize)]
pub struct FlowNode {
    id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    kind: FlowNodeKind,
    outgoing: Vec<Id>,
    incoming: Vec<Id>,
}

impl FlowNode {
    fn from_element(element: &ElementRecord) -> Self {
        Self {
            id: element.id(),
            name: element.name().map(String::from),
            kind: FlowNodeKind::from_element(element.kind()),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> FlowNodeKind {
        self.kind
    }

    /// Outgoing edge ids in document order.
    pub fn outgoing(&self) -> &[Id] {
        &self.outgoing
    }

    pub fn incoming(&self) -> &[Id] {
        &self.incoming
    }

    /// A gateway with more than one outgoing edge.
    pub fn is_split(&self) -> bool {
        self.kind == FlowNodeKind::Gateway && self.outgoing.len() > 1
    }

    /// Whether taking `edge` out of this node is a gateway decision: every
    /// edge of a split, or a guarded edge of any gateway.
    pub fn decides(&self, edge: &FlowEdge) -> bool {
        self.is_split() || (self.kind == FlowNodeKind::Gateway && edge.condition.is_some())
    }
}

/// A sequence flow with its condition reduced to plain text.
#[derive(Debug, Clone, Serialize)]
pub struct FlowEdge {
    id: Id,
    source: Id,
    target: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
}

impl FlowEdge {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The condition without expression delimiters, if the flow has one.
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }
}

/// The sequence-flow graph of one document.
#[derive(Debug, Clone, Serialize)]
pub struct FlowGraph {
    document: Id,
    nodes: IndexMap<Id, FlowNode>,
    edges: IndexMap<Id, FlowEdge>,
}

impl FlowGraph {
    /// Builds the graph from a document catalog. Flows whose endpoints are
    /// not elements of the document are ignored.
    pub fn from_document(document: &DocumentCatalog) -> Self {
        let mut nodes: IndexMap<Id, FlowNode> = document
            .elements()
            .iter()
            .map(|element| (element.id(), FlowNode::from_element(element)))
            .collect();
        let mut edges = IndexMap::new();

        for flow in document.flows() {
            if !nodes.contains_key(&flow.source()) || !nodes.contains_key(&flow.target()) {
                trace!(flow:% = flow.id(); "Skipping flow with unknown endpoint");
                continue;
            }
            if let Some(source) = nodes.get_mut(&flow.source()) {
                source.outgoing.push(flow.id());
            }
            if let Some(target) = nodes.get_mut(&flow.target()) {
                target.incoming.push(flow.id());
            }
            let condition = flow
                .condition()
                .map(condition::plain_text)
                .filter(|text| !text.is_empty());
            edges.insert(
                flow.id(),
                FlowEdge {
                    id: flow.id(),
                    source: flow.source(),
                    target: flow.target(),
                    name: flow.name().map(String::from),
                    condition,
                },
            );
        }

        debug!(
            document:% = document.file_name(),
            nodes = nodes.len(),
            edges = edges.len();
            "Flow graph built"
        );
        Self {
            document: document.file_name(),
            nodes,
            edges,
        }
    }

    pub fn document(&self) -> Id {
        self.document
    }

    pub fn node(&self, id: Id) -> Option<&FlowNode> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: Id) -> Option<&FlowEdge> {
        self.edges.get(&id)
    }

    /// Nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &FlowEdge> {
        self.edges.values()
    }

    /// Outgoing edges of a node in document order.
    pub fn outgoing(&self, id: Id) -> impl Iterator<Item = &FlowEdge> {
        self.nodes
            .get(&id)
            .map(|node| node.outgoing.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|edge| self.edges.get(edge))
    }

    pub fn start_nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.nodes().filter(|node| node.kind == FlowNodeKind::Start)
    }

    pub fn end_nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.nodes().filter(|node| node.kind == FlowNodeKind::End)
    }
}

/// The branch a route took at a split gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayCondition {
    gateway_id: Id,
    edge_id: Id,
    target_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl GatewayCondition {
    fn taken(edge: &FlowEdge) -> Self {
        Self {
            gateway_id: edge.source,
            edge_id: edge.id,
            target_id: edge.target,
            condition: edge.condition.clone(),
            label: edge.name.clone(),
        }
    }

    pub fn gateway_id(&self) -> Id {
        self.gateway_id
    }

    pub fn edge_id(&self) -> Id {
        self.edge_id
    }

    pub fn target_id(&self) -> Id {
        self.target_id
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// The flow's display name, often the business reading of the condition.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// One start-to-end route through a document.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessPath {
    start_event: Id,
    end_event: Id,
    node_ids: Vec<Id>,
    visited_call_activities: Vec<Id>,
    gateway_conditions: Vec<GatewayCondition>,
    error_path: bool,
}

impl ProcessPath {
    pub fn start_event(&self) -> Id {
        self.start_event
    }

    pub fn end_event(&self) -> Id {
        self.end_event
    }

    /// Node ids from start to end; no id appears twice.
    pub fn node_ids(&self) -> &[Id] {
        &self.node_ids
    }

    /// Call activities on the route, in route order.
    pub fn visited_call_activities(&self) -> &[Id] {
        &self.visited_call_activities
    }

    pub fn gateway_conditions(&self) -> &[GatewayCondition] {
        &self.gateway_conditions
    }

    /// Whether the end event looks like an error outcome.
    ///
    /// This is a keyword match on the end event's name and id and is not
    /// exhaustive: an end event named in a language the keyword list does
    /// not cover is classified as a regular outcome.
    pub fn is_error_path(&self) -> bool {
        self.error_path
    }
}

/// All routes of one document plus what went wrong while finding them.
#[derive(Debug, Clone, Serialize)]
pub struct PathEnumeration {
    document: Id,
    paths: Vec<ProcessPath>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl PathEnumeration {
    pub fn document(&self) -> Id {
        self.document
    }

    pub fn paths(&self) -> &[ProcessPath] {
        &self.paths
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_paths(&self) -> impl Iterator<Item = &ProcessPath> {
        self.paths.iter().filter(|path| path.error_path)
    }

    /// Paths passing through the given call activity.
    pub fn through_call_activity(&self, element: Id) -> impl Iterator<Item = &ProcessPath> {
        self.paths
            .iter()
            .filter(move |path| path.visited_call_activities.contains(&element))
    }
}

/// Returns `true` when the node's name or id contains one of the keywords,
/// ignoring case.
pub fn is_error_end(node: &FlowNode, keywords: &[String]) -> bool {
    let name = node.name().unwrap_or_default().to_lowercase();
    let id = node.id().with_str(str::to_lowercase);
    keywords
        .iter()
        .map(|keyword| keyword.to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| name.contains(&keyword) || id.contains(&keyword))
}

/// A partially walked route.
#[derive(Debug, Clone)]
struct Route {
    node: Id,
    node_ids: Vec<Id>,
    visited: HashSet<Id>,
    conditions: Vec<GatewayCondition>,
}

/// Enumerates start-to-end routes of a [`FlowGraph`].
#[derive(Debug)]
pub struct PathEnumerator<'a> {
    config: &'a FlowConfig,
}

impl<'a> PathEnumerator<'a> {
    pub fn new(config: &'a FlowConfig) -> Self {
        Self { config }
    }

    /// Walks every route from every start node.
    ///
    /// Without start events, nodes with no incoming flow are used as
    /// starts and an `E400` warning is recorded. A route that stops at a
    /// node with no outgoing flow that is not an end event is dropped with
    /// an `E402` warning. A route whose every continuation loops back into
    /// itself is dropped silently. Enumeration stops with an `E401` warning
    /// once the configured path limit is reached.
    pub fn enumerate(&self, graph: &FlowGraph) -> PathEnumeration {
        let mut collector = DiagnosticCollector::new();
        let starts = self.start_nodes(graph, &mut collector);
        let mut paths = Vec::new();
        let mut dead_ends: Vec<Id> = Vec::new();

        'starts: for start in starts {
            let mut stack = vec![Route {
                node: start,
                node_ids: vec![start],
                visited: HashSet::from([start]),
                conditions: Vec::new(),
            }];

            while let Some(route) = stack.pop() {
                let Some(node) = graph.node(route.node) else {
                    continue;
                };

                if node.kind == FlowNodeKind::End {
                    if paths.len() >= self.config.max_paths() {
                        collector.emit(
                            Diagnostic::warning(format!(
                                "path enumeration stopped after {} paths",
                                self.config.max_paths()
                            ))
                            .with_code(ErrorCode::E401)
                            .with_context("document", graph.document)
                            .with_help("raise `flow.max_paths` to see every path"),
                        );
                        break 'starts;
                    }
                    paths.push(self.finish(graph, start, node, route));
                    continue;
                }

                if node.outgoing.is_empty() {
                    if !dead_ends.contains(&node.id) {
                        dead_ends.push(node.id);
                    }
                    continue;
                }

                let continuations: Vec<Route> = graph
                    .outgoing(node.id)
                    .filter(|edge| !route.visited.contains(&edge.target))
                    .map(|edge| {
                        let mut next = route.clone();
                        next.node = edge.target;
                        next.node_ids.push(edge.target);
                        next.visited.insert(edge.target);
                        if node.decides(edge) {
                            next.conditions.push(GatewayCondition::taken(edge));
                        }
                        next
                    })
                    .collect();
                if continuations.is_empty() {
                    trace!(node:% = node.id; "Route loops back on itself");
                }
                stack.extend(continuations.into_iter().rev());
            }
        }

        for node in dead_ends {
            collector.emit(
                Diagnostic::warning(format!("flow stops at `{node}`, which is not an end event"))
                    .with_code(ErrorCode::E402)
                    .with_context("document", graph.document)
                    .with_context("node", node),
            );
        }

        info!(
            document:% = graph.document,
            paths = paths.len();
            "Paths enumerated"
        );
        PathEnumeration {
            document: graph.document,
            paths,
            diagnostics: collector.finish(),
        }
    }

    fn start_nodes(&self, graph: &FlowGraph, collector: &mut DiagnosticCollector) -> Vec<Id> {
        let starts: Vec<Id> = graph.start_nodes().map(FlowNode::id).collect();
        if !starts.is_empty() {
            return starts;
        }

        let sources: Vec<Id> = graph
            .nodes()
            .filter(|node| node.incoming.is_empty() && !node.outgoing.is_empty())
            .map(FlowNode::id)
            .collect();
        collector.emit(
            Diagnostic::warning(format!("`{}` has no start event", graph.document))
                .with_code(ErrorCode::E400)
                .with_context("document", graph.document)
                .with_context("fallback_starts", sources.len()),
        );
        sources
    }

    fn finish(&self, graph: &FlowGraph, start: Id, end: &FlowNode, route: Route) -> ProcessPath {
        let visited_call_activities = route
            .node_ids
            .iter()
            .copied()
            .filter(|id| graph.node(*id).is_some_and(|node| node.kind == FlowNodeKind::CallActivity))
            .collect();
        ProcessPath {
            start_event: start,
            end_event: end.id,
            node_ids: route.node_ids,
            visited_call_activities,
            gateway_conditions: route.conditions,
            error_path: is_error_end(end, self.config.error_keywords()),
        }
    }
}

#[cfg(test)]
mod tests {
    use sextant_core::element::{GatewayType, SequenceFlow, TaskType};

    use super::*;

    const DOC: &str = "credit.bpmn";

    fn element(id: &str, kind: ElementKind) -> ElementRecord {
        ElementRecord::new(Id::new(DOC), Id::new(id), kind)
    }

    fn task(id: &str) -> ElementRecord {
        element(
            id,
            ElementKind::Task {
                task_type: TaskType::ServiceTask,
            },
        )
    }

    fn gateway(id: &str) -> ElementRecord {
        element(
            id,
            ElementKind::Gateway {
                gateway_type: GatewayType::Exclusive,
            },
        )
    }

    fn flow(id: &str, source: &str, target: &str) -> SequenceFlow {
        SequenceFlow::new(Id::new(id), Id::new(source), Id::new(target))
    }

    fn enumerate(document: &DocumentCatalog) -> PathEnumeration {
        let graph = FlowGraph::from_document(document);
        PathEnumerator::new(&FlowConfig::default()).enumerate(&graph)
    }

    /// start -> split -(yes)-> approve -> merge -> end
    ///              \-(no)--> reject --/
    fn diamond() -> DocumentCatalog {
        DocumentCatalog::new(Id::new(DOC))
            .with_element(element("start", ElementKind::StartEvent))
            .with_element(gateway("split"))
            .with_element(task("approve"))
            .with_element(element(
                "reject",
                ElementKind::CallActivity {
                    called_document_hint: Some("rejection".to_string()),
                },
            ))
            .with_element(gateway("merge"))
            .with_element(element("end", ElementKind::EndEvent))
            .with_flow(flow("f0", "start", "split"))
            .with_flow(flow("f1", "split", "approve").with_name("Yes").with_condition("${approved}"))
            .with_flow(flow("f2", "split", "reject").with_condition("#{ !approved }"))
            .with_flow(flow("f3", "approve", "merge"))
            .with_flow(flow("f4", "reject", "merge"))
            .with_flow(flow("f5", "merge", "end"))
    }

    #[test]
    fn test_two_branches_give_two_paths() {
        let enumeration = enumerate(&diamond());

        let paths = enumeration.paths();
        assert_eq!(paths.len(), 2);
        assert!(enumeration.diagnostics().is_empty());

        let [first, second] = paths else {
            unreachable!();
        };
        assert_eq!(first.node_ids(), ["start", "split", "approve", "merge", "end"].map(Id::new));
        assert_eq!(second.node_ids(), ["start", "split", "reject", "merge", "end"].map(Id::new));

        for path in paths {
            assert_eq!(path.gateway_conditions().len(), 1);
            assert_eq!(path.start_event(), "start");
            assert_eq!(path.end_event(), "end");
        }

        let shared: HashSet<Id> = ["start", "split", "merge", "end"].map(Id::new).into();
        let first_only: HashSet<Id> = first.node_ids().iter().copied().filter(|id| !shared.contains(id)).collect();
        let second_only: HashSet<Id> = second.node_ids().iter().copied().filter(|id| !shared.contains(id)).collect();
        assert!(first_only.is_disjoint(&second_only));
    }

    #[test]
    fn test_conditions_are_plain_text() {
        let enumeration = enumerate(&diamond());

        let yes = &enumeration.paths()[0].gateway_conditions()[0];
        assert_eq!(yes.gateway_id(), "split");
        assert_eq!(yes.edge_id(), "f1");
        assert_eq!(yes.condition(), Some("approved"));
        assert_eq!(yes.label(), Some("Yes"));

        let no = &enumeration.paths()[1].gateway_conditions()[0];
        assert_eq!(no.condition(), Some("!approved"));
        assert_eq!(no.label(), None);
    }

    #[test]
    fn test_call_activities_recorded() {
        let enumeration = enumerate(&diamond());

        assert!(enumeration.paths()[0].visited_call_activities().is_empty());
        assert_eq!(enumeration.paths()[1].visited_call_activities(), [Id::new("reject")]);
        assert_eq!(enumeration.through_call_activity(Id::new("reject")).count(), 1);
    }

    #[test]
    fn test_loop_is_walked_once_per_path() {
        let document = DocumentCatalog::new(Id::new(DOC))
            .with_element(element("start", ElementKind::StartEvent))
            .with_element(task("work"))
            .with_element(gateway("check"))
            .with_element(element("end", ElementKind::EndEvent))
            .with_flow(flow("f0", "start", "work"))
            .with_flow(flow("f1", "work", "check"))
            .with_flow(flow("retry", "check", "work"))
            .with_flow(flow("done", "check", "end"));

        let enumeration = enumerate(&document);

        assert_eq!(enumeration.paths().len(), 1);
        assert_eq!(
            enumeration.paths()[0].node_ids(),
            ["start", "work", "check", "end"].map(Id::new)
        );
        assert!(enumeration.diagnostics().is_empty());
    }

    #[test]
    fn test_error_path_keywords() {
        let document = DocumentCatalog::new(Id::new(DOC))
            .with_element(element("start", ElementKind::StartEvent))
            .with_element(gateway("decide"))
            .with_element(element("granted", ElementKind::EndEvent).with_name("Loan granted"))
            .with_element(element("end-2", ElementKind::EndEvent).with_name("Avslag sendt"))
            .with_element(element("Event_Rejected", ElementKind::EndEvent))
            .with_flow(flow("f0", "start", "decide"))
            .with_flow(flow("f1", "decide", "granted"))
            .with_flow(flow("f2", "decide", "end-2"))
            .with_flow(flow("f3", "decide", "Event_Rejected"));

        let enumeration = enumerate(&document);

        let flags: Vec<bool> = enumeration.paths().iter().map(ProcessPath::is_error_path).collect();
        assert_eq!(flags, [false, true, true]);
        assert_eq!(enumeration.error_paths().count(), 2);
    }

    #[test]
    fn test_missing_start_falls_back_to_sources() {
        let document = DocumentCatalog::new(Id::new(DOC))
            .with_element(task("first"))
            .with_element(element("end", ElementKind::EndEvent))
            .with_flow(flow("f0", "first", "end"));

        let enumeration = enumerate(&document);

        assert_eq!(enumeration.paths().len(), 1);
        assert_eq!(enumeration.paths()[0].start_event(), "first");
        assert_eq!(enumeration.diagnostics()[0].code(), Some(ErrorCode::E400));
    }

    #[test]
    fn test_dead_end_reported_once() {
        let document = DocumentCatalog::new(Id::new(DOC))
            .with_element(element("start", ElementKind::StartEvent))
            .with_element(gateway("split"))
            .with_element(task("a"))
            .with_element(task("b"))
            .with_element(task("stuck"))
            .with_flow(flow("f0", "start", "split"))
            .with_flow(flow("f1", "split", "a"))
            .with_flow(flow("f2", "split", "b"))
            .with_flow(flow("f3", "a", "stuck"))
            .with_flow(flow("f4", "b", "stuck"));

        let enumeration = enumerate(&document);

        assert!(enumeration.paths().is_empty());
        assert_eq!(enumeration.diagnostics().len(), 1);
        assert_eq!(enumeration.diagnostics()[0].code(), Some(ErrorCode::E402));
        assert_eq!(enumeration.diagnostics()[0].context_value("node"), Some("stuck"));
    }

    #[test]
    fn test_path_limit() {
        let graph = FlowGraph::from_document(&diamond());
        let config = FlowConfig::default().with_max_paths(1);

        let enumeration = PathEnumerator::new(&config).enumerate(&graph);

        assert_eq!(enumeration.paths().len(), 1);
        assert_eq!(enumeration.diagnostics()[0].code(), Some(ErrorCode::E401));
    }

    #[test]
    fn test_graph_edges_follow_flows() {
        let graph = FlowGraph::from_document(&diamond());

        let split = graph.node(Id::new("split")).unwrap();
        assert!(split.is_split());
        assert_eq!(split.outgoing(), ["f1", "f2"].map(Id::new));
        assert_eq!(graph.node(Id::new("merge")).unwrap().incoming().len(), 2);
        assert!(!graph.node(Id::new("merge")).unwrap().is_split());
        assert_eq!(graph.end_nodes().count(), 1);
    }

    #[test]
    fn test_guarded_single_exit_gateway_recorded() {
        let document = DocumentCatalog::new(Id::new(DOC))
            .with_element(element("start", ElementKind::StartEvent))
            .with_element(gateway("ready"))
            .with_element(element("end", ElementKind::EndEvent))
            .with_flow(flow("f0", "start", "ready"))
            .with_flow(flow("f1", "ready", "end").with_condition("${documentsComplete}"));

        let enumeration = enumerate(&document);

        let conditions = enumeration.paths()[0].gateway_conditions();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].gateway_id(), "ready");
        assert_eq!(conditions[0].condition(), Some("documentsComplete"));
    }

    #[test]
    fn test_graph_serializes_nodes_and_edges() {
        let graph = FlowGraph::from_document(&diamond());

        let json = serde_json::to_value(&graph).unwrap();

        assert_eq!(json["document"], DOC);
        assert_eq!(json["nodes"]["split"]["outgoing"], serde_json::json!(["f1", "f2"]));
        assert_eq!(json["edges"]["f1"]["condition"], "approved");
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use sextant_core::element::{GatewayType, SequenceFlow};

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// A document with one start, one end and `n` gateways wired by random
    /// flows, loops included. At most one flow joins any ordered pair of
    /// nodes.
    fn document_strategy() -> impl Strategy<Value = DocumentCatalog> {
        (1usize..7).prop_flat_map(|count| {
            // Node 0 is the start, node `count + 1` the end.
            let nodes = count + 2;
            prop::collection::btree_set((0..nodes - 1, 1..nodes), 1..14).prop_map(move |flows| {
                let doc = Id::new("random.bpmn");
                let mut document = DocumentCatalog::new(doc)
                    .with_element(ElementRecord::new(doc, Id::new("n0"), ElementKind::StartEvent));
                for idx in 1..=count {
                    document.push_element(ElementRecord::new(
                        doc,
                        Id::new(&format!("n{idx}")),
                        ElementKind::Gateway {
                            gateway_type: GatewayType::Inclusive,
                        },
                    ));
                }
                document.push_element(ElementRecord::new(
                    doc,
                    Id::new(&format!("n{}", count + 1)),
                    ElementKind::EndEvent,
                ));
                for (idx, (source, target)) in flows.into_iter().enumerate() {
                    document.push_flow(SequenceFlow::new(
                        Id::new(&format!("f{idx}")),
                        Id::new(&format!("n{source}")),
                        Id::new(&format!("n{target}")),
                    ));
                }
                document
            })
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    /// No node appears twice within one path, and every path runs from a
    /// start node to an end node along existing flows.
    fn check_paths_are_simple(document: &DocumentCatalog) -> Result<(), TestCaseError> {
        let graph = FlowGraph::from_document(document);
        let enumeration = PathEnumerator::new(&FlowConfig::default()).enumerate(&graph);

        for path in enumeration.paths() {
            let unique: HashSet<Id> = path.node_ids().iter().copied().collect();
            prop_assert_eq!(unique.len(), path.node_ids().len());
            prop_assert_eq!(path.node_ids().first().copied(), Some(path.start_event()));
            prop_assert_eq!(path.node_ids().last().copied(), Some(path.end_event()));
            prop_assert_eq!(
                graph.node(path.end_event()).map(FlowNode::kind),
                Some(FlowNodeKind::End)
            );
            for pair in path.node_ids().windows(2) {
                prop_assert!(
                    graph.outgoing(pair[0]).any(|edge| edge.target() == pair[1]),
                    "no flow from {} to {}",
                    pair[0],
                    pair[1]
                );
            }
        }
        Ok(())
    }

    /// Two paths never share the same node sequence.
    fn check_paths_are_distinct(document: &DocumentCatalog) -> Result<(), TestCaseError> {
        let graph = FlowGraph::from_document(document);
        let enumeration = PathEnumerator::new(&FlowConfig::default()).enumerate(&graph);

        let routes: HashSet<Vec<Id>> = enumeration
            .paths()
            .iter()
            .map(|path| path.node_ids().to_vec())
            .collect();
        prop_assert_eq!(routes.len(), enumeration.paths().len());
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn paths_never_revisit_a_node(document in document_strategy()) {
            check_paths_are_simple(&document)?;
        }

        #[test]
        fn paths_are_distinct(document in document_strategy()) {
            check_paths_are_distinct(&document)?;
        }
    }
}
