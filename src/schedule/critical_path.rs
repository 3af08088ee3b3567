//! Longest-path ("critical path") computation.
//!
//! A fixed-point relaxation rather than a true topological DP: passes over
//! the nodes repeat until nothing changes, capped at the node count. With
//! the cycle pre-check in [`TaskGraph::ensure_acyclic`] the cap is never the
//! thing that stops the loop; it stays as an invariant guard.

use std::collections::HashSet;

use crate::models::PartRef;
use crate::schedule::graph::TaskGraph;
use crate::schedule::ScheduleError;

/// Compute the duration-weighted longest chain through the graph.
///
/// Returns node ids from the start of the chain to its terminus. Ties, both
/// for a node's best predecessor and for the terminal node, resolve to the
/// first candidate in plan order, so a fixed plan always yields the same
/// path. An empty graph yields an empty path.
pub fn compute_critical_path(graph: &TaskGraph) -> Result<Vec<PartRef>, ScheduleError> {
    graph.ensure_acyclic()?;

    let n = graph.nodes().len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut best_len: Vec<Option<i64>> = vec![None; n];
    let mut predecessor: Vec<Option<usize>> = vec![None; n];

    let mut changed = true;
    let mut passes = 0;
    while changed && passes < n {
        changed = false;
        passes += 1;
        for idx in 0..n {
            let duration = graph.nodes()[idx].duration;
            let resolved = graph.resolved_deps(idx);
            if resolved.is_empty() {
                if best_len[idx] != Some(duration) {
                    best_len[idx] = Some(duration);
                    predecessor[idx] = None;
                    changed = true;
                }
            } else {
                let mut best_pred = None;
                let mut best_val = i64::MIN;
                for dep_idx in resolved {
                    let val = best_len[dep_idx].unwrap_or(0) + duration;
                    if val > best_val {
                        best_val = val;
                        best_pred = Some(dep_idx);
                    }
                }
                if best_len[idx] != Some(best_val) {
                    best_len[idx] = Some(best_val);
                    predecessor[idx] = best_pred;
                    changed = true;
                }
            }
        }
    }

    // Terminal node: globally maximum chain length, first in plan order on
    // ties. Backtrack predecessor links; the revisit guard mirrors the one
    // on relaxation passes.
    let mut terminal = 0;
    let mut max_len = i64::MIN;
    for idx in 0..n {
        if let Some(len) = best_len[idx] {
            if len > max_len {
                max_len = len;
                terminal = idx;
            }
        }
    }

    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = Some(terminal);
    while let Some(idx) = cursor {
        if !seen.insert(idx) {
            break;
        }
        path.push(graph.nodes()[idx].sid);
        cursor = predecessor[idx];
    }
    path.reverse();
    Ok(path)
}
