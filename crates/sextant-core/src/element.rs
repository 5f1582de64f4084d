//! Element catalog types.
//!
//! A document's catalog is a flat list of typed [`ElementRecord`]s plus the
//! [`SequenceFlow`] edges between them. Each [`ElementKind`] variant carries
//! only the fields that kind can legally have: only a call activity has a
//! called-document hint, only a gateway has a gateway type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// Position of an element's shape in the source diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagramPosition {
    x: f64,
    y: f64,
}

impl DiagramPosition {
    /// Creates a position from diagram coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

/// Task flavours as they appear in process-definition markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskType {
    #[default]
    Task,
    UserTask,
    ServiceTask,
    BusinessRuleTask,
    ScriptTask,
    ManualTask,
    SendTask,
    ReceiveTask,
}

/// Gateway flavours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GatewayType {
    #[default]
    Exclusive,
    Inclusive,
    Parallel,
    EventBased,
    Complex,
}

/// The closed set of element kinds the resolution logic switches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementKind {
    StartEvent,
    EndEvent,
    IntermediateEvent,
    BoundaryEvent,
    Task {
        #[serde(default)]
        task_type: TaskType,
    },
    /// An activity delegating execution to another document.
    CallActivity {
        /// Name or identifier of the called document as written in the
        /// calling document, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        called_document_hint: Option<String>,
    },
    /// An embedded sub-process, expanded inline in the same document.
    SubProcess,
    Gateway {
        #[serde(default)]
        gateway_type: GatewayType,
    },
}

impl ElementKind {
    /// Returns `true` for start, end, intermediate and boundary events.
    pub fn is_event(&self) -> bool {
        matches!(
            self,
            ElementKind::StartEvent
                | ElementKind::EndEvent
                | ElementKind::IntermediateEvent
                | ElementKind::BoundaryEvent
        )
    }

    pub fn is_call_activity(&self) -> bool {
        matches!(self, ElementKind::CallActivity { .. })
    }

    pub fn is_gateway(&self) -> bool {
        matches!(self, ElementKind::Gateway { .. })
    }

    /// Short lower-case name used in logs and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::StartEvent => "startEvent",
            ElementKind::EndEvent => "endEvent",
            ElementKind::IntermediateEvent => "intermediateEvent",
            ElementKind::BoundaryEvent => "boundaryEvent",
            ElementKind::Task { .. } => "task",
            ElementKind::CallActivity { .. } => "callActivity",
            ElementKind::SubProcess => "subProcess",
            ElementKind::Gateway { .. } => "gateway",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed node of a document's element catalog.
///
/// Element ids are unique within their owning document only. Identity across
/// documents exists solely through subprocess resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementRecord {
    id: Id,
    name: Option<String>,
    #[serde(flatten)]
    kind: ElementKind,
    owner_document: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<DiagramPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_hint: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch_hint: Option<String>,
}

impl ElementRecord {
    /// Creates a record owned by `owner_document`.
    pub fn new(owner_document: Id, id: Id, kind: ElementKind) -> Self {
        Self {
            id,
            name: None,
            kind,
            owner_document,
            position: None,
            order_hint: None,
            branch_hint: None,
        }
    }

    /// Sets the display name. Blank names are treated as absent.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    /// Sets the diagram position.
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(DiagramPosition::new(x, y));
        self
    }

    /// Sets an explicit execution-order hint.
    pub fn with_order_hint(mut self, order: u32) -> Self {
        self.order_hint = Some(order);
        self
    }

    /// Sets an explicit branch label.
    pub fn with_branch_hint(mut self, branch: impl Into<String>) -> Self {
        self.branch_hint = Some(branch.into());
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the name, or the id when the element is unnamed.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn owner_document(&self) -> Id {
        self.owner_document
    }

    pub fn position(&self) -> Option<DiagramPosition> {
        self.position
    }

    pub fn order_hint(&self) -> Option<u32> {
        self.order_hint
    }

    pub fn branch_hint(&self) -> Option<&str> {
        self.branch_hint.as_deref()
    }

    /// Returns the called-document hint of a call activity.
    ///
    /// Always `None` for other kinds.
    pub fn called_document_hint(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::CallActivity {
                called_document_hint,
            } => called_document_hint.as_deref(),
            _ => None,
        }
    }
}

/// A directed sequence-flow edge between two elements of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceFlow {
    id: Id,
    source: Id,
    target: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
}

impl SequenceFlow {
    pub fn new(id: Id, source: Id, target: Id) -> Self {
        Self {
            id,
            source,
            target,
            name: None,
            condition: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the raw condition expression text of this flow.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

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

    /// Returns the raw condition text, delimiters included.
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }
}
