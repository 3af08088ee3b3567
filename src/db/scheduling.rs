//! Scheduling operations over a whole project: drag-reschedule with its
//! cascade, critical-path reads, the Gantt plan read model, and sibling
//! reordering.

use std::collections::HashSet;

use anyhow::Result;

use crate::models::*;
use crate::schedule::{self, compute_critical_path, plan_positions, TaskGraph};

use super::{
    apply_adjustments, get_feature, get_item, get_phase, get_project, load_project_parts,
    table_for, Database,
};

impl Database {
    /// Reschedule one node (a Gantt drag) and cascade the consequences.
    ///
    /// The target's new window, forward shifts of dependents, and
    /// containment clamps commit together or not at all. The response
    /// `cascade` lists downstream adjustments only; the target's own final
    /// duration is reported separately.
    pub fn reschedule(&self, project_id: i64, input: RescheduleInput) -> Result<RescheduleResponse> {
        let conn = self.lock();
        get_project(&conn, project_id)?.ok_or_else(|| anyhow::anyhow!("Project not found"))?;

        let tx = conn.unchecked_transaction()?;
        let (phases, features, items) = load_project_parts(&tx, project_id)?;
        let mut graph = TaskGraph::build(&phases, &features, &items);

        let outcome =
            schedule::reschedule(&mut graph, input.node_id, input.new_start, input.new_end)?;
        apply_adjustments(&tx, &outcome.adjustments)?;

        let critical_path = compute_critical_path(&graph)?;
        tx.commit()?;

        Ok(RescheduleResponse {
            duration: outcome.duration,
            critical_path,
            cascade: outcome
                .adjustments
                .into_iter()
                .filter(|adj| adj.id != input.node_id)
                .collect(),
        })
    }

    /// The duration-weighted longest dependency chain through the project.
    pub fn critical_path(&self, project_id: i64) -> Result<Vec<PartRef>> {
        let conn = self.lock();
        get_project(&conn, project_id)?.ok_or_else(|| anyhow::anyhow!("Project not found"))?;
        let (phases, features, items) = load_project_parts(&conn, project_id)?;
        let graph = TaskGraph::build(&phases, &features, &items);
        Ok(compute_critical_path(&graph)?)
    }

    /// The Gantt read model: every part as a dated bar, nested in display
    /// order (phase, its features, each feature's items), annotated with
    /// the current critical path.
    pub fn plan(&self, project_id: i64) -> Result<PlanResponse> {
        let conn = self.lock();
        get_project(&conn, project_id)?.ok_or_else(|| anyhow::anyhow!("Project not found"))?;
        let (phases, features, items) = load_project_parts(&conn, project_id)?;

        let graph = TaskGraph::build(&phases, &features, &items);
        let critical_path = compute_critical_path(&graph)?;
        let critical: HashSet<PartRef> = critical_path.iter().copied().collect();

        let mut tasks = Vec::with_capacity(phases.len() + features.len() + items.len());
        for phase in &phases {
            tasks.push(gantt_task(
                phase.part_ref(),
                &phase.title,
                phase.start_date,
                phase.end_date(),
                phase.is_milestone,
                phase.classification,
                &critical,
            ));
            for feature in features.iter().filter(|f| f.phase_id == phase.id) {
                tasks.push(gantt_task(
                    feature.part_ref(),
                    &feature.title,
                    feature.start_date,
                    feature.end_date(),
                    feature.is_milestone,
                    feature.classification,
                    &critical,
                ));
                for item in items.iter().filter(|i| i.feature_id == feature.id) {
                    tasks.push(gantt_task(
                        item.part_ref(),
                        &item.title,
                        item.start_date,
                        item.end_date(),
                        item.is_milestone,
                        item.classification,
                        &critical,
                    ));
                }
            }
        }

        Ok(PlanResponse {
            tasks,
            critical_path,
        })
    }

    /// Move a node among its siblings, renumbering every sibling's sort
    /// position to a dense 0..N-1 run. Display-only; no dates change.
    pub fn reorder(&self, input: ReorderInput) -> Result<()> {
        let conn = self.lock();

        // The node must exist and belong to the named parent.
        let sibling_ids: Vec<i64> = match input.node_id.kind {
            PartKind::Phase => {
                let phase = get_phase(&conn, input.node_id.id)?
                    .filter(|p| p.project_id == input.parent_id)
                    .ok_or_else(|| anyhow::anyhow!("Phase not found"))?;
                self.sibling_ids(&conn, "phases", "project_id", phase.project_id)?
            }
            PartKind::Feature => {
                let feature = get_feature(&conn, input.node_id.id)?
                    .filter(|f| f.phase_id == input.parent_id)
                    .ok_or_else(|| anyhow::anyhow!("Feature not found"))?;
                self.sibling_ids(&conn, "features", "phase_id", feature.phase_id)?
            }
            PartKind::Item => {
                let item = get_item(&conn, input.node_id.id)?
                    .filter(|i| i.feature_id == input.parent_id)
                    .ok_or_else(|| anyhow::anyhow!("Item not found"))?;
                self.sibling_ids(&conn, "items", "feature_id", item.feature_id)?
            }
        };

        let positions = plan_positions(&sibling_ids, input.node_id.id, input.new_position);

        let tx = conn.unchecked_transaction()?;
        for (id, position) in positions {
            tx.execute(
                &format!(
                    "UPDATE {} SET sort_order = ? WHERE id = ?",
                    table_for(input.node_id.kind)
                ),
                (position, id),
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn sibling_ids(
        &self,
        conn: &rusqlite::Connection,
        table: &str,
        parent_column: &str,
        parent_id: i64,
    ) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id FROM {table} WHERE {parent_column} = ? ORDER BY sort_order, id"
        ))?;
        let ids = stmt
            .query_map([parent_id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }
}

fn gantt_task(
    id: PartRef,
    title: &str,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
    milestone: bool,
    classification: Classification,
    critical: &HashSet<PartRef>,
) -> GanttTask {
    GanttTask {
        id,
        name: format!("{}: {}", id.kind.label(), title),
        start,
        end,
        milestone,
        external: classification == Classification::External,
        critical: critical.contains(&id),
    }
}
