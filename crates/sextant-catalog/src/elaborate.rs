//! Elaboration of decoded catalogs into the checked core model.
//!
//! Elaboration never fails on a single bad element or flow: duplicates keep
//! the first record, dangling flows are dropped, and each repair is reported
//! as a diagnostic. Only a document that cannot even be named is rejected.

use indexmap::IndexMap;
use log::{debug, trace};

use sextant_core::{
    corpus::{DocumentCatalog, ExplicitMapping, MappingEntry},
    element::{ElementRecord, SequenceFlow},
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    identifier::Id,
};

use crate::{
    catalog_types::{RawDocument, RawElement, RawFlow, RawMapping},
    error::{CatalogError, Result},
};

/// Turns a decoded document into a [`DocumentCatalog`].
///
/// # Arguments
///
/// * `raw` - The decoded document.
/// * `origin` - Where the document came from; used in diagnostics and as the
///   file name when the document does not declare one.
///
/// # Errors
///
/// Returns [`CatalogError::Malformed`] when neither the document nor its
/// origin provide a usable file name.
pub(crate) fn elaborate_document(
    raw: RawDocument,
    origin: &str,
) -> Result<(DocumentCatalog, Vec<Diagnostic>)> {
    let mut collector = DiagnosticCollector::new();

    let file_name = match non_blank(raw.file_name.as_deref()).or_else(|| non_blank(Some(origin))) {
        Some(file_name) => Id::new(file_name),
        None => {
            return Err(CatalogError::Malformed {
                origin: origin.to_string(),
                diagnostics: vec![
                    Diagnostic::error("document declares no file name")
                        .with_code(ErrorCode::E001)
                        .with_context("origin", origin),
                ],
            });
        }
    };

    let mut document = DocumentCatalog::new(file_name);
    if let Some(process_id) = non_blank(raw.process_id.as_deref()) {
        document = document.with_process_id(process_id);
    }
    if let Some(name) = non_blank(raw.name.as_deref()) {
        document = document.with_name(name);
    }

    let elements = elaborate_elements(file_name, raw.elements, &mut collector);
    if elements.is_empty() {
        collector.emit(
            Diagnostic::warning("document has no elements")
                .with_code(ErrorCode::E001)
                .with_context("document", file_name),
        );
    }

    let flows = elaborate_flows(file_name, raw.flows, &elements, &mut collector);

    for element in elements.into_values() {
        document.push_element(element);
    }
    for flow in flows {
        document.push_flow(flow);
    }

    debug!(
        document:% = file_name,
        elements = document.elements().len(),
        flows = document.flows().len();
        "Document elaborated"
    );
    trace!(document:?; "Elaborated document");

    Ok((document, collector.finish()))
}

fn elaborate_elements(
    document: Id,
    raw_elements: Vec<RawElement>,
    collector: &mut DiagnosticCollector,
) -> IndexMap<Id, ElementRecord> {
    let mut elements: IndexMap<Id, ElementRecord> = IndexMap::with_capacity(raw_elements.len());

    for (position, raw) in raw_elements.into_iter().enumerate() {
        let Some(raw_id) = non_blank(Some(raw.id.as_str())) else {
            collector.emit(
                Diagnostic::warning(format!("element #{position} has no id and is ignored"))
                    .with_code(ErrorCode::E001)
                    .with_context("document", document)
                    .with_context("kind", &raw.kind),
            );
            continue;
        };
        let id = Id::new(raw_id);

        if elements.contains_key(&id) {
            collector.emit(
                Diagnostic::warning(format!("element `{id}` is defined more than once"))
                    .with_code(ErrorCode::E002)
                    .with_context("document", document)
                    .with_context("element", id)
                    .with_help("the first definition is kept"),
            );
            continue;
        }

        let mut record = ElementRecord::new(document, id, raw.kind);
        if let Some(name) = raw.name {
            record = record.with_name(name);
        }
        if let (Some(x), Some(y)) = (raw.x, raw.y) {
            if x.is_finite() && y.is_finite() {
                record = record.with_position(x, y);
            }
        }
        if let Some(order) = raw.order {
            record = record.with_order_hint(order);
        }
        if let Some(branch) = non_blank(raw.branch.as_deref()) {
            record = record.with_branch_hint(branch);
        }
        elements.insert(id, record);
    }

    elements
}

fn elaborate_flows(
    document: Id,
    raw_flows: Vec<RawFlow>,
    elements: &IndexMap<Id, ElementRecord>,
    collector: &mut DiagnosticCollector,
) -> Vec<SequenceFlow> {
    let mut flows = Vec::with_capacity(raw_flows.len());

    for (position, raw) in raw_flows.into_iter().enumerate() {
        let id = match non_blank(Some(raw.id.as_str())) {
            Some(id) => Id::new(id),
            None => Id::new(&format!("flow#{position}")),
        };

        let source = Id::new(raw.source.trim());
        let target = Id::new(raw.target.trim());
        let missing: Vec<Id> = [source, target]
            .into_iter()
            .filter(|endpoint| !elements.contains_key(endpoint))
            .collect();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|id| format!("`{id}`")).collect();
            collector.emit(
                Diagnostic::warning(format!(
                    "sequence flow `{id}` references unknown element {}",
                    names.join(" and ")
                ))
                .with_code(ErrorCode::E003)
                .with_context("document", document)
                .with_context("flow", id)
                .with_help("the flow is dropped"),
            );
            continue;
        }

        let mut flow = SequenceFlow::new(id, source, target);
        if let Some(name) = non_blank(raw.name.as_deref()) {
            flow = flow.with_name(name);
        }
        if let Some(condition) = non_blank(raw.condition.as_deref()) {
            flow = flow.with_condition(condition);
        }
        flows.push(flow);
    }

    flows
}

/// Turns a decoded mapping document into an [`ExplicitMapping`].
///
/// Incomplete entries are skipped with an `E004` warning.
pub(crate) fn elaborate_mapping(raw: RawMapping, origin: &str) -> (ExplicitMapping, Vec<Diagnostic>) {
    let mut collector = DiagnosticCollector::new();
    let provenance = non_blank(raw.source.as_deref()).unwrap_or(origin);
    let mut mapping = ExplicitMapping::new(provenance);

    for (position, entry) in raw.entries.into_iter().enumerate() {
        let source_document = non_blank(entry.source_document.as_deref());
        let source_element_id = non_blank(entry.source_element_id.as_deref());
        let target_document = non_blank(entry.target_document.as_deref());

        match (source_document, source_element_id, target_document) {
            (Some(source_document), Some(source_element_id), Some(target_document)) => {
                mapping.push(MappingEntry::new(
                    Id::new(source_document),
                    Id::new(source_element_id),
                    target_document,
                ));
            }
            _ => collector.emit(
                Diagnostic::warning(format!("mapping entry #{position} is incomplete"))
                    .with_code(ErrorCode::E004)
                    .with_context("mapping", provenance)
                    .with_help(
                        "entries need source_document, source_element_id and target_document",
                    ),
            ),
        }
    }

    debug!(
        provenance = mapping.provenance(),
        entries = mapping.entries().len();
        "Mapping elaborated"
    );

    (mapping, collector.finish())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
