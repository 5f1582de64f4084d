//! Plain-text and JSON rendering of command results.

use std::io::{self, Write};

use serde::Serialize;

use sextant::{
    diagnostics::Diagnostic,
    flow::PathEnumeration,
    graph::{DocumentGraph, LinkStats},
    identifier::Id,
    resolver::SubprocessLink,
    schedule::{ScheduledTree, TimelineRow},
    tree::{ProcessTree, TreeNode},
};

const INDENT: &str = "  ";

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::other)?;
    writeln!(out)
}

pub fn tree<W: Write>(out: &mut W, tree: &ProcessTree) -> io::Result<()> {
    for (depth, node) in tree.root().iter_with_depth() {
        writeln!(out, "{}{}", INDENT.repeat(depth), node_line(node))?;
        for diagnostic in node.diagnostics() {
            writeln!(out, "{}  ! {}", INDENT.repeat(depth), diagnostic_line(diagnostic))?;
        }
    }
    Ok(())
}

fn node_line(node: &TreeNode) -> String {
    let mut line = format!("{} [{}]", node.label(), node.kind());
    if let Some(link) = node.subprocess_link() {
        match link.link().matched_document() {
            Some(target) => line.push_str(&format!(" -> {target}")),
            None => line.push_str(&format!(" -> ({})", link.link().match_status())),
        }
        if link.is_reused() {
            line.push_str(&format!(" (reused x{})", link.reuse_count()));
        }
    }
    line
}

fn diagnostic_line(diagnostic: &Diagnostic) -> String {
    match diagnostic.code() {
        Some(code) => format!("{} {code}: {}", diagnostic.severity(), diagnostic.message()),
        None => format!("{}: {}", diagnostic.severity(), diagnostic.message()),
    }
}

/// Serializable view of the document graph.
#[derive(Debug, Serialize)]
pub struct GraphReport {
    pub stats: LinkStats,
    pub edges: Vec<EdgeReport>,
    pub reused: Vec<ReuseReport>,
}

#[derive(Debug, Serialize)]
pub struct EdgeReport {
    pub from: Id,
    pub to: Id,
    pub call_sites: Vec<Id>,
}

#[derive(Debug, Serialize)]
pub struct ReuseReport {
    pub document: Id,
    pub call_sites: usize,
}

impl GraphReport {
    pub fn new(graph: &DocumentGraph) -> Self {
        Self {
            stats: graph.stats(),
            edges: graph
                .edges()
                .map(|edge| EdgeReport {
                    from: edge.from,
                    to: edge.to,
                    call_sites: edge.call.call_sites().to_vec(),
                })
                .collect(),
            reused: graph
                .reused_targets()
                .map(|(document, call_sites)| ReuseReport { document, call_sites })
                .collect(),
        }
    }
}

pub fn graph<W: Write>(out: &mut W, graph: &DocumentGraph) -> io::Result<()> {
    let report = GraphReport::new(graph);
    for edge in &report.edges {
        writeln!(out, "{} -> {} ({} call sites)", edge.from, edge.to, edge.call_sites.len())?;
    }
    for reused in &report.reused {
        writeln!(out, "reused: {} ({} call sites)", reused.document, reused.call_sites)?;
    }
    let stats = report.stats;
    writeln!(
        out,
        "{} documents, {} edges, {} links: {} matched, {} unresolved, {} ambiguous",
        stats.documents, stats.edges, stats.links, stats.matched, stats.unresolved, stats.ambiguous
    )
}

pub fn links<W: Write>(out: &mut W, links: &[SubprocessLink]) -> io::Result<()> {
    for link in links {
        let target = link
            .matched_document()
            .map(|document| document.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{}::{}\t{}\t{}\t{}",
            link.source_document(),
            link.source_element_id(),
            link.match_status(),
            link.match_source(),
            target
        )?;
        if !link.candidates().is_empty() && !link.is_matched() {
            let candidates: Vec<String> = link.candidates().iter().map(Id::to_string).collect();
            writeln!(out, "{INDENT}candidates: {}", candidates.join(", "))?;
        }
    }
    Ok(())
}

pub fn paths<W: Write>(out: &mut W, enumeration: &PathEnumeration) -> io::Result<()> {
    for (idx, path) in enumeration.paths().iter().enumerate() {
        let nodes: Vec<String> = path.node_ids().iter().map(Id::to_string).collect();
        let marker = if path.is_error_path() { " [error]" } else { "" };
        writeln!(out, "path {}{marker}: {}", idx + 1, nodes.join(" -> "))?;
        for condition in path.gateway_conditions() {
            let text = condition.condition().or(condition.label()).unwrap_or("(no condition)");
            writeln!(
                out,
                "{INDENT}{} -> {}: {text}",
                condition.gateway_id(),
                condition.target_id()
            )?;
        }
    }
    for diagnostic in enumeration.diagnostics() {
        writeln!(out, "! {}", diagnostic_line(diagnostic))?;
    }
    Ok(())
}

/// Serializable view of a schedule with its flattened timeline.
#[derive(Debug, Serialize)]
pub struct ScheduleReport<'a> {
    pub schedule: &'a ScheduledTree,
    pub timeline: Vec<TimelineRow>,
}

pub fn schedule<W: Write>(out: &mut W, scheduled: &ScheduledTree) -> io::Result<()> {
    for row in scheduled.flatten() {
        let marker = if row.custom { "*" } else { " " };
        writeln!(
            out,
            "{} {} {marker}{}{}",
            row.start,
            row.end,
            INDENT.repeat(row.depth),
            row.label
        )?;
    }
    Ok(())
}
