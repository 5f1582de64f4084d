//! Documents, the explicit mapping table and the corpus that holds them.
//!
//! A [`Corpus`] is the complete, consistent input of one resolution pass.
//! Documents are keyed by file name and kept in a `BTreeMap`, so every
//! iteration over the corpus is in file-name order and passes are
//! reproducible.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    element::{ElementRecord, SequenceFlow},
    error::Diagnostic,
    identifier::Id,
};

/// The element catalog of one process-definition document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentCatalog {
    file_name: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    elements: Vec<ElementRecord>,
    flows: Vec<SequenceFlow>,
}

impl DocumentCatalog {
    /// Creates an empty catalog for the document stored as `file_name`.
    pub fn new(file_name: Id) -> Self {
        Self {
            file_name,
            process_id: None,
            name: None,
            elements: Vec::new(),
            flows: Vec::new(),
        }
    }

    /// Sets the document's declared process identifier.
    pub fn with_process_id(mut self, process_id: impl Into<String>) -> Self {
        self.process_id = Some(process_id.into());
        self
    }

    /// Sets the document's declared display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends an element. Its owner is rewritten to this document.
    pub fn with_element(mut self, element: ElementRecord) -> Self {
        self.push_element(element);
        self
    }

    /// Appends a sequence flow.
    pub fn with_flow(mut self, flow: SequenceFlow) -> Self {
        self.flows.push(flow);
        self
    }

    pub fn push_element(&mut self, element: ElementRecord) {
        let element = if element.owner_document() == self.file_name {
            element
        } else {
            rehome(element, self.file_name)
        };
        self.elements.push(element);
    }

    pub fn push_flow(&mut self, flow: SequenceFlow) {
        self.flows.push(flow);
    }

    /// Returns the file name this document is keyed by.
    pub fn file_name(&self) -> Id {
        self.file_name
    }

    pub fn process_id(&self) -> Option<&str> {
        self.process_id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the display name, the process id or the file name, in that
    /// order of preference.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.process_id.clone())
            .unwrap_or_else(|| self.file_name.to_string())
    }

    /// Returns the file name without its extension.
    ///
    /// `mortgage-se-appeal.bpmn` becomes `mortgage-se-appeal`.
    pub fn base_name(&self) -> String {
        self.file_name.with_str(|file_name| {
            match file_name.rsplit_once('.') {
                Some((base, _)) if !base.is_empty() => base.to_string(),
                _ => file_name.to_string(),
            }
        })
    }

    pub fn elements(&self) -> &[ElementRecord] {
        &self.elements
    }

    pub fn flows(&self) -> &[SequenceFlow] {
        &self.flows
    }

    /// Looks up an element by id.
    pub fn element(&self, id: Id) -> Option<&ElementRecord> {
        self.elements.iter().find(|element| element.id() == id)
    }

    /// Returns the call activities in catalog order.
    pub fn call_activities(&self) -> impl Iterator<Item = &ElementRecord> {
        self.elements
            .iter()
            .filter(|element| element.kind().is_call_activity())
    }
}

fn rehome(element: ElementRecord, owner: Id) -> ElementRecord {
    let mut rehomed = ElementRecord::new(owner, element.id(), element.kind().clone());
    if let Some(name) = element.name() {
        rehomed = rehomed.with_name(name);
    }
    if let Some(position) = element.position() {
        rehomed = rehomed.with_position(position.x(), position.y());
    }
    if let Some(order) = element.order_hint() {
        rehomed = rehomed.with_order_hint(order);
    }
    if let Some(branch) = element.branch_hint() {
        rehomed = rehomed.with_branch_hint(branch);
    }
    rehomed
}

/// One authoritative call-site link from the explicit mapping document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    source_document: Id,
    source_element_id: Id,
    target_document: String,
}

impl MappingEntry {
    pub fn new(
        source_document: Id,
        source_element_id: Id,
        target_document: impl Into<String>,
    ) -> Self {
        Self {
            source_document,
            source_element_id,
            target_document: target_document.into(),
        }
    }

    pub fn source_document(&self) -> Id {
        self.source_document
    }

    pub fn source_element_id(&self) -> Id {
        self.source_element_id
    }

    /// Returns the target reference: a file name, process id or name.
    pub fn target_document(&self) -> &str {
        &self.target_document
    }
}

/// Externally supplied table of authoritative call-site links.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExplicitMapping {
    provenance: String,
    entries: Vec<MappingEntry>,
}

impl ExplicitMapping {
    /// Creates an empty table with a provenance label (where the table came
    /// from, e.g. `"bpmn-map.json"`).
    pub fn new(provenance: impl Into<String>) -> Self {
        Self {
            provenance: provenance.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: MappingEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn push(&mut self, entry: MappingEntry) {
        self.entries.push(entry);
    }

    pub fn provenance(&self) -> &str {
        &self.provenance
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Returns the entry for the given call site, if any.
    ///
    /// When a call site appears more than once, the first entry wins.
    pub fn lookup(&self, source_document: Id, source_element_id: Id) -> Option<&MappingEntry> {
        self.entries.iter().find(|entry| {
            entry.source_document == source_document && entry.source_element_id == source_element_id
        })
    }
}

/// All documents of one resolution pass, plus the optional mapping table and
/// the diagnostics raised while assembling them.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: BTreeMap<Id, DocumentCatalog>,
    mapping: Option<ExplicitMapping>,
    diagnostics: Vec<Diagnostic>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, returning the previous one with the same file name.
    pub fn insert(&mut self, document: DocumentCatalog) -> Option<DocumentCatalog> {
        self.documents.insert(document.file_name(), document)
    }

    /// Builder form of [`Corpus::insert`].
    pub fn with_document(mut self, document: DocumentCatalog) -> Self {
        self.insert(document);
        self
    }

    pub fn set_mapping(&mut self, mapping: ExplicitMapping) {
        self.mapping = Some(mapping);
    }

    pub fn with_mapping(mut self, mapping: ExplicitMapping) -> Self {
        self.set_mapping(mapping);
        self
    }

    /// Records a corpus-level diagnostic (e.g. a document that failed to load).
    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn document(&self, file_name: Id) -> Option<&DocumentCatalog> {
        self.documents.get(&file_name)
    }

    pub fn contains(&self, file_name: Id) -> bool {
        self.documents.contains_key(&file_name)
    }

    /// Iterates documents in file-name order.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentCatalog> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn mapping(&self) -> Option<&ExplicitMapping> {
        self.mapping.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
