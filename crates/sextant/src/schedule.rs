//! Calendar scheduling of a process tree.
//!
//! The [`Scheduler`] lays the leaves of a [`ProcessTree`] end to end in
//! sibling order and gives every container the span of its children. The
//! result is a parallel [`ScheduledTree`]; the process tree itself is not
//! touched.
//!
//! A leaf is a schedulable node (task, call activity, sub-process or
//! gateway) with no schedulable descendants. Documents and events never
//! take time and are dated only through their children, if at all.

use std::fmt;

use chrono::{Days, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use sextant_core::{
    error::{Diagnostic, ErrorCode},
    identifier::Id,
};

use crate::{
    config::ScheduleConfig,
    tree::{NodeData, NodeKind, ProcessTree, TreeNode},
};

/// Where a custom activity goes relative to the process schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    BeforeAll,
    AfterAll,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::BeforeAll => f.write_str("before-all"),
            Placement::AfterAll => f.write_str("after-all"),
        }
    }
}

/// A user-defined activity outside the process definitions, such as a
/// kickoff or a go-live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomActivity {
    name: String,
    placement: Placement,
    #[serde(default = "default_custom_days")]
    duration_days: u32,
}

fn default_custom_days() -> u32 {
    1
}

impl CustomActivity {
    pub fn new(name: impl Into<String>, placement: Placement, duration_days: u32) -> Self {
        Self {
            name: name.into(),
            placement,
            duration_days,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }
}

/// An inclusive-start, exclusive-end range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// A tree node annotated with its schedule. Scheduling diagnostics are
/// appended to the node's own.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledNode {
    #[serde(flatten)]
    node: NodeData,
    leaf: bool,
    leaf_count: usize,
    duration_days: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    children: Vec<ScheduledNode>,
}

impl ScheduledNode {
    fn unscheduled(node: &TreeNode) -> Self {
        Self {
            node: node.data().clone(),
            leaf: false,
            leaf_count: 0,
            duration_days: 0,
            start_date: None,
            end_date: None,
            children: Vec::new(),
        }
    }

    /// The tree node's own data: ids, ordering hints, link and diagnostics.
    pub fn node(&self) -> &NodeData {
        &self.node
    }

    pub fn id(&self) -> Id {
        self.node.id()
    }

    pub fn label(&self) -> &str {
        self.node.label()
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    /// Whether this node is laid out on its own rather than spanning its
    /// children.
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn duration_days(&self) -> u64 {
        self.duration_days
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn span(&self) -> Option<DateSpan> {
        Some(DateSpan {
            start: self.start_date?,
            end: self.end_date?,
        })
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.node.diagnostics()
    }

    pub fn children(&self) -> &[ScheduledNode] {
        &self.children
    }

    /// This node and its descendants in pre-order, with depth.
    pub fn iter_with_depth(&self) -> impl Iterator<Item = (usize, &ScheduledNode)> {
        let mut stack = vec![(0, self)];
        std::iter::from_fn(move || {
            let (depth, node) = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
            Some((depth, node))
        })
    }
}

/// A custom activity with its dates.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledCustom {
    #[serde(flatten)]
    activity: CustomActivity,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl ScheduledCustom {
    pub fn activity(&self) -> &CustomActivity {
        &self.activity
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

/// One row of the flattened timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineRow {
    /// `None` for custom activities.
    pub id: Option<Id>,
    pub label: String,
    pub depth: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub custom: bool,
    pub leaf: bool,
}

/// The schedule of a whole tree plus its custom activities.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledTree {
    project_start: NaiveDate,
    before: Vec<ScheduledCustom>,
    root: ScheduledNode,
    after: Vec<ScheduledCustom>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl ScheduledTree {
    pub fn project_start(&self) -> NaiveDate {
        self.project_start
    }

    pub fn root(&self) -> &ScheduledNode {
        &self.root
    }

    pub fn before(&self) -> &[ScheduledCustom] {
        &self.before
    }

    pub fn after(&self) -> &[ScheduledCustom] {
        &self.after
    }

    /// Custom-activity diagnostics; node diagnostics sit on the nodes.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The span to display for the root: from the earlier of the project
    /// start and the first dated child to the later of the process end and
    /// the last after-all activity.
    pub fn root_span(&self) -> DateSpan {
        let start = self
            .root
            .start_date
            .map_or(self.project_start, |date| date.min(self.project_start));
        let end = self
            .before
            .iter()
            .chain(&self.after)
            .map(|custom| custom.end_date)
            .chain(self.root.end_date)
            .fold(start, NaiveDate::max);
        DateSpan { start, end }
    }

    /// Every dated entry in display order: before-all activities, the tree
    /// in pre-order, then after-all activities. The root row carries
    /// [`ScheduledTree::root_span`].
    pub fn flatten(&self) -> Vec<TimelineRow> {
        let custom_row = |custom: &ScheduledCustom| TimelineRow {
            id: None,
            label: custom.activity.name.clone(),
            depth: 0,
            start: custom.start_date,
            end: custom.end_date,
            custom: true,
            leaf: true,
        };

        let mut rows: Vec<TimelineRow> = self.before.iter().map(custom_row).collect();
        let root_span = self.root_span();
        for (depth, node) in self.root.iter_with_depth() {
            let span = if depth == 0 { Some(root_span) } else { node.span() };
            if let Some(span) = span {
                rows.push(TimelineRow {
                    id: Some(node.id()),
                    label: node.label().to_string(),
                    depth,
                    start: span.start,
                    end: span.end,
                    custom: false,
                    leaf: node.leaf,
                });
            }
        }
        rows.extend(self.after.iter().map(custom_row));
        rows
    }
}

type DurationFn<'a> = Box<dyn Fn(&TreeNode) -> i64 + 'a>;

/// A tree node during scheduling; children are arena indices.
struct Slot<'t> {
    node: &'t TreeNode,
    children: Vec<usize>,
    schedulable_below: bool,
    leaf: bool,
    leaf_count: usize,
    duration_days: u64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    diagnostics: Vec<Diagnostic>,
}

/// Lays out a [`ProcessTree`] on the calendar.
pub struct Scheduler<'a> {
    config: &'a ScheduleConfig,
    duration: DurationFn<'a>,
}

impl fmt::Debug for Scheduler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> Scheduler<'a> {
    /// A scheduler giving every leaf the configured default duration.
    pub fn new(config: &'a ScheduleConfig) -> Self {
        let days = i64::from(config.default_duration_days());
        Self {
            config,
            duration: Box::new(move |_| days),
        }
    }

    /// Replaces the per-leaf duration function. Negative results are
    /// clamped to zero with an `E500` warning on the leaf.
    pub fn with_duration<F>(mut self, duration: F) -> Self
    where
        F: Fn(&TreeNode) -> i64 + 'a,
    {
        self.duration = Box::new(duration);
        self
    }

    /// Schedules the tree starting at `project_start`.
    pub fn schedule(&self, tree: &ProcessTree, project_start: NaiveDate) -> ScheduledTree {
        let mut diagnostics = Vec::new();

        let mut cursor = project_start;
        let before = self.lay_out_custom(Placement::BeforeAll, &mut cursor, &mut diagnostics);

        let mut slots = arena(tree.root());
        self.measure(&mut slots);
        date_leaves(&mut slots, &mut cursor);
        date_containers(&mut slots);

        let mut after_cursor = slots.first().and_then(|slot| slot.end_date).unwrap_or(cursor);
        let after = self.lay_out_custom(Placement::AfterAll, &mut after_cursor, &mut diagnostics);

        let root = assemble(slots).unwrap_or_else(|| ScheduledNode::unscheduled(tree.root()));
        info!(
            leaves = root.leaf_count,
            days = root.duration_days,
            start:% = project_start;
            "Schedule computed"
        );
        ScheduledTree {
            project_start,
            before,
            root,
            after,
            diagnostics,
        }
    }

    fn lay_out_custom(
        &self,
        placement: Placement,
        cursor: &mut NaiveDate,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ScheduledCustom> {
        self.config
            .custom_activities()
            .iter()
            .filter(|activity| activity.placement == placement)
            .map(|activity| {
                let start_date = *cursor;
                let end_date = add_days(start_date, u64::from(activity.duration_days)).unwrap_or_else(|| {
                    diagnostics.push(overflow(activity.name.as_str(), start_date));
                    NaiveDate::MAX
                });
                *cursor = end_date;
                debug!(activity = activity.name.as_str(), placement:% = placement; "Custom activity placed");
                ScheduledCustom {
                    activity: activity.clone(),
                    start_date,
                    end_date,
                }
            })
            .collect()
    }

    /// Bottom-up pass: leaf flags, leaf counts and durations.
    fn measure(&self, slots: &mut [Slot<'_>]) {
        for idx in (0..slots.len()).rev() {
            let children = std::mem::take(&mut slots[idx].children);
            let schedulable_children = children.iter().any(|&child| slots[child].schedulable_below);
            let leaf_count = children.iter().map(|&child| slots[child].leaf_count).sum();
            let duration_sum = children
                .iter()
                .fold(0u64, |sum, &child| sum.saturating_add(slots[child].duration_days));

            let slot = &mut slots[idx];
            slot.children = children;
            let schedulable = slot.node.kind().is_schedulable();
            slot.schedulable_below = schedulable || schedulable_children;
            slot.leaf = schedulable && !schedulable_children;

            if slot.leaf {
                slot.leaf_count = 1;
                let raw = (self.duration)(slot.node);
                slot.duration_days = match u64::try_from(raw) {
                    Ok(days) => days,
                    Err(_) => {
                        slot.diagnostics.push(
                            Diagnostic::warning(format!("negative duration {raw} for `{}`", slot.node.label()))
                                .with_code(ErrorCode::E500)
                                .with_context("node", slot.node.id())
                                .with_help("the leaf is scheduled with zero days"),
                        );
                        0
                    }
                };
            } else {
                slot.leaf_count = leaf_count;
                slot.duration_days = duration_sum;
            }
        }
    }
}

/// Flattens the tree into pre-order slots. Children of a slot always sit
/// at higher indices.
fn arena(root: &TreeNode) -> Vec<Slot<'_>> {
    let mut slots: Vec<Slot<'_>> = Vec::new();
    let mut stack: Vec<(Option<usize>, &TreeNode)> = vec![(None, root)];
    while let Some((parent, node)) = stack.pop() {
        let idx = slots.len();
        slots.push(Slot {
            node,
            children: Vec::new(),
            schedulable_below: false,
            leaf: false,
            leaf_count: 0,
            duration_days: 0,
            start_date: None,
            end_date: None,
            diagnostics: Vec::new(),
        });
        if let Some(parent) = parent {
            slots[parent].children.push(idx);
        }
        stack.extend(node.children().iter().rev().map(|child| (Some(idx), child)));
    }
    slots
}

/// Top-down pass: leaves end to end in pre-order, which is sibling order.
fn date_leaves(slots: &mut [Slot<'_>], cursor: &mut NaiveDate) {
    for slot in slots.iter_mut().filter(|slot| slot.leaf) {
        let start = *cursor;
        let end = match add_days(start, slot.duration_days) {
            Some(end) => end,
            None => {
                slot.diagnostics.push(overflow(slot.node.label(), start));
                NaiveDate::MAX
            }
        };
        slot.start_date = Some(start);
        slot.end_date = Some(end);
        *cursor = end;
    }
}

/// Containers span their dated children.
fn date_containers(slots: &mut [Slot<'_>]) {
    for idx in (0..slots.len()).rev() {
        if slots[idx].leaf {
            continue;
        }
        let start = slots[idx].children.iter().filter_map(|&child| slots[child].start_date).min();
        let end = slots[idx].children.iter().filter_map(|&child| slots[child].end_date).max();
        slots[idx].start_date = start;
        slots[idx].end_date = end;
    }
}

fn assemble(slots: Vec<Slot<'_>>) -> Option<ScheduledNode> {
    let mut children_of: Vec<Vec<usize>> = Vec::with_capacity(slots.len());
    let mut nodes: Vec<Option<ScheduledNode>> = Vec::with_capacity(slots.len());
    for slot in slots {
        children_of.push(slot.children);
        let mut node = slot.node.data().clone();
        for diagnostic in slot.diagnostics {
            node.push_diagnostic(diagnostic);
        }
        nodes.push(Some(ScheduledNode {
            node,
            leaf: slot.leaf,
            leaf_count: slot.leaf_count,
            duration_days: slot.duration_days,
            start_date: slot.start_date,
            end_date: slot.end_date,
            children: Vec::new(),
        }));
    }

    for idx in (0..nodes.len()).rev() {
        let children: Vec<ScheduledNode> = children_of[idx]
            .iter()
            .filter_map(|&child| nodes[child].take())
            .collect();
        if let Some(node) = nodes[idx].as_mut() {
            node.children = children;
        }
    }

    nodes.into_iter().next().flatten()
}

fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

fn overflow(what: &str, start: NaiveDate) -> Diagnostic {
    Diagnostic::warning(format!("`{what}` ends past the last representable date"))
        .with_code(ErrorCode::E500)
        .with_context("start", start)
        .with_help("the end date is clamped")
}
