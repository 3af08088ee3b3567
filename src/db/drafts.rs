//! Draft parts: the unscheduled holding area and promotion into the plan.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::models::*;
use crate::schedule::{self, compute_critical_path, ScheduleError, TaskGraph};

use super::{
    apply_adjustments, get_feature, get_item, get_phase, get_project, load_project_parts,
    parse_classification, parse_date, parse_datetime, Database,
};

const DRAFT_COLUMNS: &str = "id, title, part_type, classification, project_id, phase_id, \
     feature_id, start_date, duration, is_milestone, dependencies, notes, created_at";

impl Database {
    pub fn get_drafts(&self) -> Result<Vec<DraftPart>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {DRAFT_COLUMNS} FROM draft_parts ORDER BY created_at, id"
        ))?;
        let drafts = stmt
            .query_map([], |row| draft_from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(drafts)
    }

    pub fn get_draft(&self, id: i64) -> Result<Option<DraftPart>> {
        let conn = self.lock();
        get_draft(&conn, id)
    }

    pub fn create_draft(&self, input: CreateDraftInput) -> Result<DraftPart> {
        if input.title.trim().is_empty() {
            return Err(ScheduleError::Validation("draft title required".to_string()).into());
        }
        if let Some(duration) = input.duration {
            if duration < 0 {
                return Err(ScheduleError::Validation(format!(
                    "duration must be a non-negative number of days, got {duration}"
                ))
                .into());
            }
        }

        let conn = self.lock();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO draft_parts (title, part_type, classification, project_id, phase_id,
                 feature_id, start_date, duration, is_milestone, dependencies, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &input.title,
                input.part_type.map(|k| k.as_str()),
                input.classification.as_str(),
                input.project_id,
                input.phase_id,
                input.feature_id,
                input.start_date.map(|d| d.to_string()),
                input.duration,
                input.is_milestone as i64,
                &input.dependencies,
                &input.notes,
                now.to_rfc3339(),
            ),
        )?;
        let id = conn.last_insert_rowid();

        Ok(DraftPart {
            id,
            title: input.title,
            part_type: DraftType::from_option(input.part_type),
            classification: input.classification,
            project_id: input.project_id,
            phase_id: input.phase_id,
            feature_id: input.feature_id,
            start_date: input.start_date,
            duration: input.duration,
            is_milestone: input.is_milestone,
            dependencies: input.dependencies,
            notes: input.notes,
            created_at: now,
        })
    }

    pub fn delete_draft(&self, id: i64) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM draft_parts WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    /// Promote a draft into a concrete phase, feature, or item.
    ///
    /// The draft is consumed: the concrete part is inserted, the plan is
    /// settled around it, and the draft row is deleted, all in one transaction.
    /// A draft pre-assigned to a different kind than requested is a
    /// conflict and nothing changes.
    pub fn promote_draft(
        &self,
        draft_id: i64,
        input: PromoteDraftInput,
    ) -> Result<PromoteDraftResponse> {
        let conn = self.lock();
        let draft =
            get_draft(&conn, draft_id)?.ok_or_else(|| anyhow::anyhow!("Draft not found"))?;

        let promoted = draft.promote(input.inferred_type).map_err(ScheduleError::from)?;
        let draft = promoted.draft;

        let start = input
            .start
            .or(draft.start_date)
            .unwrap_or_else(|| Utc::now().date_naive());
        let duration = input
            .duration
            .or(draft.duration)
            .map(|d| d.max(1))
            .unwrap_or(1);

        let tx = conn.unchecked_transaction()?;
        let (created, project_id) = match promoted.kind {
            PartKind::Phase => {
                let project_id = input
                    .project_id
                    .or(draft.project_id)
                    .ok_or_else(|| ScheduleError::Validation("project context required".into()))?;
                get_project(&tx, project_id)?
                    .ok_or_else(|| anyhow::anyhow!("Project not found"))?;
                let sort_order: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM phases WHERE project_id = ?",
                    [project_id],
                    |row| row.get(0),
                )?;
                let now = Utc::now();
                tx.execute(
                    "INSERT INTO phases (project_id, title, start_date, duration, is_milestone,
                         classification, notes, sort_order, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    (
                        project_id,
                        &draft.title,
                        start.to_string(),
                        duration,
                        draft.is_milestone as i64,
                        draft.classification.as_str(),
                        &draft.notes,
                        sort_order,
                        now.to_rfc3339(),
                        now.to_rfc3339(),
                    ),
                )?;
                (
                    PartRef::new(PartKind::Phase, tx.last_insert_rowid()),
                    project_id,
                )
            }
            PartKind::Feature => {
                let phase_id = input
                    .phase_id
                    .or(draft.phase_id)
                    .ok_or_else(|| ScheduleError::Validation("phase_id required".into()))?;
                let phase =
                    get_phase(&tx, phase_id)?.ok_or_else(|| anyhow::anyhow!("Phase not found"))?;
                let sort_order: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM features WHERE phase_id = ?",
                    [phase_id],
                    |row| row.get(0),
                )?;
                let now = Utc::now();
                tx.execute(
                    "INSERT INTO features (phase_id, title, start_date, duration, dependencies,
                         is_milestone, classification, notes, sort_order, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    (
                        phase_id,
                        &draft.title,
                        start.to_string(),
                        duration,
                        &draft.dependencies,
                        draft.is_milestone as i64,
                        draft.classification.as_str(),
                        &draft.notes,
                        sort_order,
                        now.to_rfc3339(),
                        now.to_rfc3339(),
                    ),
                )?;
                (
                    PartRef::new(PartKind::Feature, tx.last_insert_rowid()),
                    phase.project_id,
                )
            }
            PartKind::Item => {
                // The drop target may only know a sibling item; its parent
                // feature stands in for a missing feature id.
                let mut feature_id = input.feature_id.or(draft.feature_id);
                if feature_id.is_none() {
                    if let Some(item_id) = input.item_id {
                        feature_id = get_item(&tx, item_id)?.map(|it| it.feature_id);
                    }
                }
                let feature_id = feature_id
                    .ok_or_else(|| ScheduleError::Validation("feature_id required".into()))?;
                let feature = get_feature(&tx, feature_id)?
                    .ok_or_else(|| anyhow::anyhow!("Feature not found"))?;
                let phase = get_phase(&tx, feature.phase_id)?
                    .ok_or_else(|| anyhow::anyhow!("Phase not found"))?;
                let sort_order: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM items WHERE feature_id = ?",
                    [feature_id],
                    |row| row.get(0),
                )?;
                let now = Utc::now();
                tx.execute(
                    "INSERT INTO items (feature_id, title, start_date, duration, dependencies,
                         is_milestone, classification, notes, sort_order, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    (
                        feature_id,
                        &draft.title,
                        start.to_string(),
                        duration,
                        &draft.dependencies,
                        draft.is_milestone as i64,
                        draft.classification.as_str(),
                        &draft.notes,
                        sort_order,
                        now.to_rfc3339(),
                        now.to_rfc3339(),
                    ),
                )?;
                (
                    PartRef::new(PartKind::Item, tx.last_insert_rowid()),
                    phase.project_id,
                )
            }
        };

        tx.execute("DELETE FROM draft_parts WHERE id = ?", [draft_id])?;

        let (phases, features, items) = load_project_parts(&tx, project_id)?;
        let mut graph = TaskGraph::build(&phases, &features, &items);
        let adjustments = schedule::settle_part(&mut graph, created)?;
        apply_adjustments(&tx, &adjustments)?;
        let critical_path = compute_critical_path(&graph)?;

        let node = graph
            .get(created)
            .ok_or_else(|| anyhow::anyhow!("Promoted part missing from plan"))?;
        let summary = PromotedPartSummary {
            id: created,
            title: draft.title.clone(),
            start: node.start,
            duration: node.duration,
        };
        tx.commit()?;

        Ok(PromoteDraftResponse {
            created: summary,
            removed_draft_id: draft_id,
            critical_path,
            adjustments,
        })
    }
}

fn draft_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DraftPart> {
    let part_type = row
        .get::<_, Option<String>>(2)?
        .and_then(|s| PartKind::from_str(&s));
    Ok(DraftPart {
        id: row.get(0)?,
        title: row.get(1)?,
        part_type: DraftType::from_option(part_type),
        classification: parse_classification(row.get::<_, String>(3)?),
        project_id: row.get(4)?,
        phase_id: row.get(5)?,
        feature_id: row.get(6)?,
        start_date: row.get::<_, Option<String>>(7)?.map(parse_date),
        duration: row.get(8)?,
        is_milestone: row.get::<_, i64>(9)? != 0,
        dependencies: row.get(10)?,
        notes: row.get(11)?,
        created_at: parse_datetime(row.get::<_, String>(12)?),
    })
}

fn get_draft(conn: &Connection, id: i64) -> Result<Option<DraftPart>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAFT_COLUMNS} FROM draft_parts WHERE id = ?"
    ))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(draft_from_row(row)?)),
        None => Ok(None),
    }
}
