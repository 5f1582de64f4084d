//! Sibling ordering.
//!
//! Children of every tree node are sorted by a four-level key:
//!
//! 1. `visual_order_index`, the rank of the element's diagram position in
//!    reading order (left to right, then top to bottom),
//! 2. `order_index`, an explicit execution-order hint or the breadth-first
//!    discovery rank over sequence flows,
//! 3. `branch_id`, with the canonical `main` branch before any alternate
//!    branch and alternates alphabetical,
//! 4. the label, alphabetically.
//!
//! Absent indices sort after present ones. The element id breaks any
//! remaining tie, so the order is total.

use std::{
    cmp::Ordering,
    collections::{HashMap, VecDeque},
};

use log::trace;

use sextant_core::{
    corpus::DocumentCatalog,
    element::{ElementKind, SequenceFlow},
    identifier::Id,
};

/// The canonical branch label.
pub const MAIN_BRANCH: &str = "main";

/// Ordering hints of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderHints {
    pub visual_order_index: Option<u32>,
    pub order_index: Option<u32>,
    pub branch_id: Option<String>,
}

/// Ordering hints for every element of one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentOrdering {
    hints: HashMap<Id, OrderHints>,
}

impl DocumentOrdering {
    /// Derives the hints of every element in `document`.
    pub fn for_document(document: &DocumentCatalog) -> Self {
        let mut hints: HashMap<Id, OrderHints> = document
            .elements()
            .iter()
            .map(|element| {
                let hint = OrderHints {
                    visual_order_index: None,
                    order_index: element.order_hint(),
                    branch_id: element.branch_hint().map(String::from),
                };
                (element.id(), hint)
            })
            .collect();

        for (id, rank) in visual_ranks(document) {
            if let Some(hint) = hints.get_mut(&id) {
                hint.visual_order_index = Some(rank);
            }
        }

        for (id, (rank, branch)) in discovery(document) {
            if let Some(hint) = hints.get_mut(&id) {
                if hint.order_index.is_none() {
                    hint.order_index = Some(rank);
                }
                if hint.branch_id.is_none() {
                    hint.branch_id = Some(branch);
                }
            }
        }

        trace!(document:% = document.file_name(), elements = hints.len(); "Ordering hints derived");
        Self { hints }
    }

    /// Hints of `element`, or empty hints for an unknown element.
    pub fn hints(&self, element: Id) -> OrderHints {
        self.hints.get(&element).cloned().unwrap_or_default()
    }
}

/// Dense rank of each positioned element's `(x, y)`; equal positions share
/// a rank.
fn visual_ranks(document: &DocumentCatalog) -> Vec<(Id, u32)> {
    let mut positioned: Vec<(Id, f64, f64)> = document
        .elements()
        .iter()
        .filter_map(|element| {
            element
                .position()
                .map(|position| (element.id(), position.x(), position.y()))
        })
        .collect();
    positioned.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)).then(a.0.cmp(&b.0)));

    let mut ranks = Vec::with_capacity(positioned.len());
    let mut rank = 0u32;
    let mut previous: Option<(f64, f64)> = None;
    for (id, x, y) in positioned {
        if let Some((px, py)) = previous {
            if px != x || py != y {
                rank += 1;
            }
        }
        previous = Some((x, y));
        ranks.push((id, rank));
    }
    ranks
}

/// Breadth-first discovery over sequence flows from the document's start
/// events (or from flow sources without incoming flows when there are
/// none). Returns each reached element's discovery rank and branch label.
fn discovery(document: &DocumentCatalog) -> HashMap<Id, (u32, String)> {
    let mut outgoing: HashMap<Id, Vec<&SequenceFlow>> = HashMap::new();
    let mut has_incoming: HashMap<Id, bool> = HashMap::new();
    for flow in document.flows() {
        outgoing.entry(flow.source()).or_default().push(flow);
        has_incoming.insert(flow.target(), true);
    }

    let mut starts: Vec<Id> = document
        .elements()
        .iter()
        .filter(|element| matches!(element.kind(), ElementKind::StartEvent))
        .map(|element| element.id())
        .collect();
    if starts.is_empty() {
        starts = document
            .elements()
            .iter()
            .map(|element| element.id())
            .filter(|id| outgoing.contains_key(id) && !has_incoming.contains_key(id))
            .collect();
    }

    let mut discovered: HashMap<Id, (u32, String)> = HashMap::new();
    let mut queue: VecDeque<Id> = VecDeque::new();
    let mut next_rank = 0u32;
    for start in starts {
        if discovered.contains_key(&start) {
            continue;
        }
        discovered.insert(start, (next_rank, MAIN_BRANCH.to_string()));
        next_rank += 1;
        queue.push_back(start);
    }

    while let Some(current) = queue.pop_front() {
        let Some(flows) = outgoing.get(&current) else {
            continue;
        };
        let branch = discovered
            .get(&current)
            .map(|(_, branch)| branch.clone())
            .unwrap_or_else(|| MAIN_BRANCH.to_string());
        let is_split = flows.len() > 1
            && document
                .element(current)
                .is_some_and(|element| element.kind().is_gateway());

        for (position, flow) in flows.iter().enumerate() {
            let target = flow.target();
            if discovered.contains_key(&target) {
                continue;
            }
            let target_branch = if is_split && position > 0 {
                format!("{current}/{}", flow.id())
            } else {
                branch.clone()
            };
            discovered.insert(target, (next_rank, target_branch));
            next_rank += 1;
            queue.push_back(target);
        }
    }

    discovered
}

/// Returns `true` for the canonical main branch or an absent branch.
pub fn is_main_branch(branch: Option<&str>) -> bool {
    branch.is_none_or(|branch| branch.eq_ignore_ascii_case(MAIN_BRANCH))
}

/// The complete sort key of one sibling.
#[derive(Debug, Clone, Copy)]
pub struct SiblingKey<'a> {
    pub visual_order_index: Option<u32>,
    pub order_index: Option<u32>,
    pub branch_id: Option<&'a str>,
    pub label: &'a str,
    pub id: Id,
}

/// Compares two siblings by the four-level key, then by id.
pub fn compare(a: &SiblingKey<'_>, b: &SiblingKey<'_>) -> Ordering {
    compare_index(a.visual_order_index, b.visual_order_index)
        .then_with(|| compare_index(a.order_index, b.order_index))
        .then_with(|| compare_branch(a.branch_id, b.branch_id))
        .then_with(|| a.label.cmp(b.label))
        .then_with(|| a.id.cmp(&b.id))
}

fn compare_index(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_branch(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (is_main_branch(a), is_main_branch(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(&b),
    }
}

#[cfg(test)]
mod tests {
    use sextant_core::element::{ElementRecord, GatewayType, TaskType};

    use super::*;

    fn key<'a>(visual: Option<u32>, order: Option<u32>, branch: Option<&'a str>, label: &'a str) -> SiblingKey<'a> {
        SiblingKey {
            visual_order_index: visual,
            order_index: order,
            branch_id: branch,
            label,
            id: Id::new(label),
        }
    }

    #[test]
    fn test_main_branch_first() {
        let main = key(Some(1), Some(2), Some("main"), "zeta");
        let alternate = key(Some(1), Some(2), Some("gw/f2"), "alpha");

        assert_eq!(compare(&main, &alternate), Ordering::Less);
        assert_eq!(compare(&alternate, &main), Ordering::Greater);
    }

    #[test]
    fn test_levels_in_priority_order() {
        let visual_first = key(Some(0), Some(9), Some("b"), "z");
        let visual_second = key(Some(1), Some(0), None, "a");
        assert_eq!(compare(&visual_first, &visual_second), Ordering::Less);

        let unpositioned = key(None, Some(0), None, "a");
        assert_eq!(compare(&visual_second, &unpositioned), Ordering::Less);

        let by_label_a = key(None, None, Some("x"), "a");
        let by_label_b = key(None, None, Some("x"), "b");
        assert_eq!(compare(&by_label_a, &by_label_b), Ordering::Less);

        let alt_a = key(None, None, Some("a"), "z");
        let alt_b = key(None, None, Some("b"), "a");
        assert_eq!(compare(&alt_a, &alt_b), Ordering::Less);
    }

    #[test]
    fn test_absent_and_main_branch_tie_on_id() {
        let absent = SiblingKey {
            id: Id::new("doc::first"),
            ..key(None, None, None, "a")
        };
        let main = SiblingKey {
            id: Id::new("doc::second"),
            ..key(None, None, Some("main"), "a")
        };

        let mut forward = [absent, main];
        let mut backward = [main, absent];
        forward.sort_by(compare);
        backward.sort_by(compare);

        assert_eq!(forward.map(|key| key.id), backward.map(|key| key.id));
        assert_ne!(compare(&absent, &main), Ordering::Equal);
    }

    fn split_document() -> DocumentCatalog {
        let doc = Id::new("split.bpmn");
        let element = |id: &str, kind: ElementKind| ElementRecord::new(doc, Id::new(id), kind);
        let task = || ElementKind::Task {
            task_type: TaskType::Task,
        };
        DocumentCatalog::new(doc)
            .with_element(element("start", ElementKind::StartEvent).with_position(0.0, 100.0))
            .with_element(
                element(
                    "gw",
                    ElementKind::Gateway {
                        gateway_type: GatewayType::Exclusive,
                    },
                )
                .with_position(100.0, 100.0),
            )
            .with_element(element("yes", task()).with_position(200.0, 50.0))
            .with_element(element("no", task()).with_position(200.0, 150.0))
            .with_element(element("end", ElementKind::EndEvent).with_position(300.0, 100.0))
            .with_element(element("orphan", task()).with_order_hint(7))
            .with_flow(SequenceFlow::new(Id::new("f1"), Id::new("start"), Id::new("gw")))
            .with_flow(SequenceFlow::new(Id::new("f2"), Id::new("gw"), Id::new("yes")))
            .with_flow(SequenceFlow::new(Id::new("f3"), Id::new("gw"), Id::new("no")))
            .with_flow(SequenceFlow::new(Id::new("f4"), Id::new("yes"), Id::new("end")))
            .with_flow(SequenceFlow::new(Id::new("f5"), Id::new("no"), Id::new("end")))
    }

    #[test]
    fn test_document_hints() {
        let ordering = DocumentOrdering::for_document(&split_document());

        let yes = ordering.hints(Id::new("yes"));
        let no = ordering.hints(Id::new("no"));
        let end = ordering.hints(Id::new("end"));
        let orphan = ordering.hints(Id::new("orphan"));

        assert_eq!(ordering.hints(Id::new("start")).visual_order_index, Some(0));
        assert_eq!(yes.visual_order_index, Some(2));
        assert_eq!(no.visual_order_index, Some(3));
        assert_eq!(yes.order_index, Some(2));
        assert_eq!(no.order_index, Some(3));
        assert_eq!(yes.branch_id.as_deref(), Some("main"));
        assert_eq!(no.branch_id.as_deref(), Some("gw/f3"));
        assert_eq!(end.branch_id.as_deref(), Some("main"));
        assert_eq!(orphan.order_index, Some(7));
        assert_eq!(orphan.visual_order_index, None);
        assert_eq!(orphan.branch_id, None);
    }

    #[test]
    fn test_shared_position_shares_rank() {
        let doc = Id::new("same.bpmn");
        let document = DocumentCatalog::new(doc)
            .with_element(ElementRecord::new(doc, Id::new("a"), ElementKind::SubProcess).with_position(5.0, 5.0))
            .with_element(ElementRecord::new(doc, Id::new("b"), ElementKind::SubProcess).with_position(5.0, 5.0))
            .with_element(ElementRecord::new(doc, Id::new("c"), ElementKind::SubProcess).with_position(9.0, 0.0));

        let ordering = DocumentOrdering::for_document(&document);

        assert_eq!(ordering.hints(Id::new("a")).visual_order_index, Some(0));
        assert_eq!(ordering.hints(Id::new("b")).visual_order_index, Some(0));
        assert_eq!(ordering.hints(Id::new("c")).visual_order_index, Some(1));
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    #[derive(Debug, Clone)]
    struct OwnedKey {
        visual: Option<u32>,
        order: Option<u32>,
        branch: Option<String>,
        label: String,
        id: String,
    }

    impl OwnedKey {
        fn key(&self) -> SiblingKey<'_> {
            SiblingKey {
                visual_order_index: self.visual,
                order_index: self.order,
                branch_id: self.branch.as_deref(),
                label: &self.label,
                id: Id::new(&self.id),
            }
        }
    }

    fn key_strategy() -> impl Strategy<Value = OwnedKey> {
        (
            prop::option::of(0u32..4),
            prop::option::of(0u32..4),
            prop::option::of(prop::sample::select(vec!["main", "gw/f2", "gw/f3", "b"])),
            "[a-d]{1,2}",
        )
            .prop_map(|(visual, order, branch, label)| OwnedKey {
                visual,
                order,
                branch: branch.map(String::from),
                label,
                id: String::new(),
            })
    }

    /// Siblings with unique ids, as tree nodes always have.
    fn siblings_strategy() -> impl Strategy<Value = Vec<OwnedKey>> {
        prop::collection::vec(key_strategy(), 0..12).prop_map(|keys| {
            keys.into_iter()
                .enumerate()
                .map(|(idx, key)| OwnedKey {
                    id: format!("sibling-{idx}"),
                    ..key
                })
                .collect()
        })
    }

    fn keys_and_permutation() -> impl Strategy<Value = (Vec<OwnedKey>, Vec<OwnedKey>)> {
        siblings_strategy().prop_flat_map(|keys| {
            let shuffled = Just(keys.clone()).prop_shuffle();
            (Just(keys), shuffled)
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    fn sorted_labels(keys: &[OwnedKey]) -> Vec<(Option<u32>, Option<u32>, Option<String>, String, String)> {
        let mut keys: Vec<&OwnedKey> = keys.iter().collect();
        keys.sort_by(|a, b| compare(&a.key(), &b.key()));
        keys.into_iter()
            .map(|key| (key.visual, key.order, key.branch.clone(), key.label.clone(), key.id.clone()))
            .collect()
    }

    /// Any permutation of the same siblings sorts to the same sequence.
    fn check_permutation_invariant(keys: &[OwnedKey], shuffled: &[OwnedKey]) -> Result<(), TestCaseError> {
        prop_assert_eq!(sorted_labels(keys), sorted_labels(shuffled));
        Ok(())
    }

    /// Among siblings with equal indices, main-branch ones come first.
    fn check_main_before_alternates(keys: &[OwnedKey]) -> Result<(), TestCaseError> {
        let sorted = sorted_labels(keys);
        for pair in sorted.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.0 == b.0 && a.1 == b.1 {
                let a_main = is_main_branch(a.2.as_deref());
                let b_main = is_main_branch(b.2.as_deref());
                prop_assert!(a_main || !b_main, "alternate sorted before main: {:?} {:?}", a, b);
            }
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn sibling_order_is_permutation_invariant((keys, shuffled) in keys_and_permutation()) {
            check_permutation_invariant(&keys, &shuffled)?;
        }

        #[test]
        fn main_branch_sorts_first(keys in siblings_strategy()) {
            check_main_before_alternates(&keys)?;
        }
    }
}
