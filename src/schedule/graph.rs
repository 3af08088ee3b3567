//! Uniform task-graph assembly over the three-level hierarchy.
//!
//! Phases, features, and items become one node shape each; dependency edges
//! come from the parsed dependency fields. Because numeric ids are only
//! unique per table, the graph keeps a multimap from each bare id to every
//! node carrying it, and a reference fans out to all of them.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};

use crate::models::{Feature, Item, PartKind, PartRef, Phase};
use crate::schedule::deps::parse_dependencies;
use crate::schedule::ScheduleError;

/// One schedulable node, normalized across kinds.
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub sid: PartRef,
    /// Containing part: the phase for a feature, the feature for an item.
    /// Phases have no schedulable parent (projects carry no window).
    pub parent: Option<PartRef>,
    pub start: NaiveDate,
    pub duration: i64,
    /// Parsed numeric dependency references. Always empty for phases.
    pub deps: Vec<i64>,
}

impl TaskNode {
    /// Exclusive end date.
    pub fn end(&self) -> NaiveDate {
        self.start + Days::new(self.duration.max(0) as u64)
    }
}

/// The dependency graph of one project's plan.
///
/// Node order is insertion order (phases, then features, then items), which
/// makes every downstream computation deterministic for a fixed plan.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
    by_sid: HashMap<PartRef, usize>,
    by_numeric: HashMap<i64, Vec<usize>>,
    children: HashMap<PartRef, Vec<usize>>,
}

impl TaskGraph {
    pub fn build(phases: &[Phase], features: &[Feature], items: &[Item]) -> Self {
        let mut graph = Self {
            nodes: Vec::with_capacity(phases.len() + features.len() + items.len()),
            by_sid: HashMap::new(),
            by_numeric: HashMap::new(),
            children: HashMap::new(),
        };

        for ph in phases {
            graph.push(TaskNode {
                sid: ph.part_ref(),
                parent: None,
                start: ph.start_date,
                duration: ph.duration,
                deps: Vec::new(),
            });
        }
        for ft in features {
            graph.push(TaskNode {
                sid: ft.part_ref(),
                parent: Some(PartRef::new(PartKind::Phase, ft.phase_id)),
                start: ft.start_date,
                duration: ft.duration,
                deps: parse_dependencies(ft.dependencies.as_deref().unwrap_or("")),
            });
        }
        for it in items {
            graph.push(TaskNode {
                sid: it.part_ref(),
                parent: Some(PartRef::new(PartKind::Feature, it.feature_id)),
                start: it.start_date,
                duration: it.duration,
                deps: parse_dependencies(it.dependencies.as_deref().unwrap_or("")),
            });
        }

        graph
    }

    fn push(&mut self, node: TaskNode) {
        let idx = self.nodes.len();
        self.by_sid.insert(node.sid, idx);
        self.by_numeric.entry(node.sid.id).or_default().push(idx);
        if let Some(parent) = node.parent {
            self.children.entry(parent).or_default().push(idx);
        }
        self.nodes.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    pub fn position(&self, sid: PartRef) -> Option<usize> {
        self.by_sid.get(&sid).copied()
    }

    pub fn get(&self, sid: PartRef) -> Option<&TaskNode> {
        self.position(sid).map(|idx| &self.nodes[idx])
    }

    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut TaskNode {
        &mut self.nodes[idx]
    }

    /// Every node sharing the given bare numeric id, in plan order.
    pub fn matching(&self, numeric_id: i64) -> &[usize] {
        self.by_numeric
            .get(&numeric_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Direct children of a node, in plan order.
    pub(crate) fn children_of(&self, sid: PartRef) -> &[usize] {
        self.children.get(&sid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dependency references of `idx` resolved through the numeric multimap,
    /// fanning out to every kind. Feeds the critical-path weights and the
    /// cycle check.
    ///
    /// A node never resolves a reference to itself: a part whose own id
    /// appears in its dependency field would otherwise form a self-loop.
    pub(crate) fn resolved_deps(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for dep_id in &self.nodes[idx].deps {
            for &dep_idx in self.matching(*dep_id) {
                if dep_idx != idx {
                    out.push(dep_idx);
                }
            }
        }
        out
    }

    /// Like [`Self::resolved_deps`] but restricted to features and items.
    ///
    /// Start-date enforcement ("a dependent starts no earlier than its
    /// dependencies end") only honors feature/item matches: a phase sharing
    /// a numeric id with a feature is a key collision, not a predecessor,
    /// and must not drag dependents to the phase's end.
    pub(crate) fn resolved_schedule_deps(&self, idx: usize) -> Vec<usize> {
        self.resolved_deps(idx)
            .into_iter()
            .filter(|&dep_idx| self.nodes[dep_idx].sid.kind != PartKind::Phase)
            .collect()
    }

    /// Map from a bare numeric id to the nodes whose dependency fields
    /// reference it. Used to walk dependents during a cascade.
    pub(crate) fn dependents_index(&self) -> HashMap<i64, Vec<usize>> {
        let mut dependents: HashMap<i64, Vec<usize>> = HashMap::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            for dep_id in &node.deps {
                let entry = dependents.entry(*dep_id).or_default();
                if !entry.contains(&idx) {
                    entry.push(idx);
                }
            }
        }
        dependents
    }

    /// Verify the resolved dependency graph is acyclic (Kahn's algorithm).
    ///
    /// Runs before the longest-path fixed point and before any cascade;
    /// a cycle fails the whole operation instead of producing a partial
    /// result.
    pub fn ensure_acyclic(&self) -> Result<(), ScheduleError> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];

        for idx in 0..n {
            for dep_idx in self.resolved_deps(idx) {
                outgoing[dep_idx].push(idx);
                in_degree[idx] += 1;
            }
        }

        let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut ordered = 0usize;
        while let Some(idx) = queue.pop() {
            ordered += 1;
            for &next in &outgoing[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push(next);
                }
            }
        }

        if ordered < n {
            let offender = (0..n)
                .find(|&i| in_degree[i] > 0)
                .expect("unordered node must remain");
            return Err(ScheduleError::DependencyCycle(self.nodes[offender].sid));
        }
        Ok(())
    }
}
