use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PartRef;

/// A scheduling change applied to one node: its final start and duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Adjustment {
    pub id: PartRef,
    pub start: NaiveDate,
    pub duration: i64,
}

/// Input for a drag-reschedule of any schedulable node.
///
/// When `new_end` is present the duration is derived from the window
/// (minimum one day); otherwise the node keeps its stored duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleInput {
    pub node_id: PartRef,
    pub new_start: NaiveDate,
    pub new_end: Option<NaiveDate>,
}

/// Result of a reschedule: the target's final duration, the recomputed
/// critical path, and every downstream adjustment that was persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleResponse {
    pub duration: i64,
    pub critical_path: Vec<PartRef>,
    pub cascade: Vec<Adjustment>,
}

/// Input for moving a node among its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderInput {
    pub node_id: PartRef,
    /// Project id for phases, phase id for features, feature id for items.
    pub parent_id: i64,
    pub new_position: i64,
}

/// One bar of the Gantt read model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GanttTask {
    pub id: PartRef,
    /// Display name, `"{Kind}: {title}"`.
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub milestone: bool,
    pub external: bool,
    /// Whether the node lies on the current critical path.
    pub critical: bool,
}

/// The full plan read model for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub tasks: Vec<GanttTask>,
    pub critical_path: Vec<PartRef>,
}
