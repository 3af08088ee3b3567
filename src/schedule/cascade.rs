//! Cascade-on-reschedule and parent/child containment.
//!
//! Moving or editing a node never edits the rest of the plan directly;
//! instead the whole project is loaded into a [`TaskGraph`], the change is
//! applied there, and this module works out every knock-on adjustment:
//!
//! - dependents are pushed forward until each starts no earlier than the
//!   latest end among its dependencies (forward shifts only, breadth-first
//!   through transitive dependents);
//! - children are kept inside their parents' windows: a start before the
//!   parent's start moves up, an end past the parent's end shortens the
//!   child's duration, never the other way around.
//!
//! The caller persists the returned adjustments in one transaction.

use std::collections::VecDeque;

use chrono::NaiveDate;

use crate::models::{Adjustment, PartKind, PartRef};
use crate::schedule::graph::TaskGraph;
use crate::schedule::ScheduleError;

/// Outcome of [`reschedule`]: the target's final duration plus every node
/// whose stored state must change (the target itself included).
#[derive(Debug, Clone)]
pub struct RescheduleOutcome {
    pub duration: i64,
    pub adjustments: Vec<Adjustment>,
}

/// Apply a drag-reschedule to `target` and settle the plan around it.
///
/// When `new_end` is given the duration becomes `new_end - new_start`,
/// floored at one day; otherwise the stored duration is kept. The returned
/// duration is the target's final one (containment may shorten it again).
pub fn reschedule(
    graph: &mut TaskGraph,
    target: PartRef,
    new_start: NaiveDate,
    new_end: Option<NaiveDate>,
) -> Result<RescheduleOutcome, ScheduleError> {
    graph.ensure_acyclic()?;
    let idx = graph
        .position(target)
        .ok_or(ScheduleError::PartNotFound(target))?;

    let duration = match new_end {
        Some(end) => (end - new_start).num_days().max(1),
        None => graph.nodes()[idx].duration,
    };
    {
        let node = graph.node_mut(idx);
        node.start = new_start;
        node.duration = duration;
    }

    let adjustments = settle(graph, idx, true);
    Ok(RescheduleOutcome {
        duration: graph.nodes()[idx].duration,
        adjustments,
    })
}

/// Settle the plan after `target` was created or edited in place.
///
/// The target itself is pulled forward past its dependencies and clamped
/// into its parent before the dependent cascade runs; it appears in the
/// returned adjustments only if any of that changed it.
pub fn settle_part(
    graph: &mut TaskGraph,
    target: PartRef,
) -> Result<Vec<Adjustment>, ScheduleError> {
    graph.ensure_acyclic()?;
    let idx = graph
        .position(target)
        .ok_or(ScheduleError::PartNotFound(target))?;
    Ok(settle(graph, idx, false))
}

/// Changed-node bookkeeping: first-touch order, no duplicates.
struct Changes {
    order: Vec<usize>,
    touched: Vec<bool>,
}

impl Changes {
    fn new(n: usize) -> Self {
        Self {
            order: Vec::new(),
            touched: vec![false; n],
        }
    }

    fn mark(&mut self, idx: usize) {
        if !self.touched[idx] {
            self.touched[idx] = true;
            self.order.push(idx);
        }
    }
}

fn settle(graph: &mut TaskGraph, origin: usize, origin_dirty: bool) -> Vec<Adjustment> {
    let mut changes = Changes::new(graph.nodes().len());
    if origin_dirty {
        changes.mark(origin);
    }

    // The origin obeys its own dependencies and its parent window first.
    if graph.nodes()[origin].sid.kind != PartKind::Phase {
        if shift_past_dependencies(graph, origin) {
            changes.mark(origin);
        }
    }
    if clamp_to_parent(graph, origin) {
        changes.mark(origin);
    }
    clamp_children(graph, origin, &mut changes);

    // Breadth-first over dependents of everything that moved. Phases never
    // seed the walk; they have no dependents in the dependency graph, and their
    // influence travels through the containment clamps above.
    let dependents = graph.dependents_index();
    let mut queue: VecDeque<usize> = changes
        .order
        .iter()
        .copied()
        .filter(|&i| graph.nodes()[i].sid.kind != PartKind::Phase)
        .collect();

    while let Some(moved) = queue.pop_front() {
        let numeric = graph.nodes()[moved].sid.id;
        let Some(deps) = dependents.get(&numeric) else {
            continue;
        };
        for &dependent in deps {
            if dependent == moved {
                continue;
            }
            if shift_past_dependencies(graph, dependent) {
                clamp_to_parent(graph, dependent);
                changes.mark(dependent);
                // Re-queue: a later shift of another dependency may push
                // this node again; forward-only shifts on an acyclic graph
                // terminate.
                queue.push_back(dependent);
                // Children dragged along by the clamp cascade too.
                let before = changes.order.len();
                clamp_children(graph, dependent, &mut changes);
                for &clamped_child in &changes.order[before..] {
                    queue.push_back(clamped_child);
                }
            }
        }
    }

    changes
        .order
        .iter()
        .map(|&idx| {
            let node = &graph.nodes()[idx];
            Adjustment {
                id: node.sid,
                start: node.start,
                duration: node.duration,
            }
        })
        .collect()
}

/// Push `idx` forward so it starts no earlier than the latest end among its
/// resolved dependencies. Never moves a start backward.
fn shift_past_dependencies(graph: &mut TaskGraph, idx: usize) -> bool {
    let required = graph
        .resolved_schedule_deps(idx)
        .into_iter()
        .map(|dep_idx| graph.nodes()[dep_idx].end())
        .max();
    match required {
        Some(required) if required > graph.nodes()[idx].start => {
            graph.node_mut(idx).start = required;
            true
        }
        _ => false,
    }
}

/// Keep `idx` inside its parent's window: the start moves up to the
/// parent's start, an overhanging end shortens the duration (to zero at
/// worst). The parent is never grown.
fn clamp_to_parent(graph: &mut TaskGraph, idx: usize) -> bool {
    let Some(parent) = graph.nodes()[idx].parent else {
        return false;
    };
    let Some(parent_node) = graph.get(parent) else {
        return false;
    };
    let (parent_start, parent_end) = (parent_node.start, parent_node.end());

    let mut changed = false;
    if graph.nodes()[idx].start < parent_start {
        graph.node_mut(idx).start = parent_start;
        changed = true;
    }
    if graph.nodes()[idx].end() > parent_end {
        let new_duration = (parent_end - graph.nodes()[idx].start).num_days().max(0);
        graph.node_mut(idx).duration = new_duration;
        changed = true;
    }
    changed
}

/// Clamp the children of `idx` into its window, recursing one level at a
/// time: only a child whose own window changed has its children revisited.
fn clamp_children(graph: &mut TaskGraph, idx: usize, changes: &mut Changes) {
    let sid = graph.nodes()[idx].sid;
    let child_idxs: Vec<usize> = graph.children_of(sid).to_vec();
    for child in child_idxs {
        if clamp_to_parent(graph, child) {
            changes.mark(child);
            clamp_children(graph, child, changes);
        }
    }
}
