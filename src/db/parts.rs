//! Phase / feature / item CRUD.
//!
//! Creates and edits of features and items settle the plan afterwards: the
//! edited node is pushed past its dependencies, clamped into its parent's
//! window, and its dependents are cascaded, all inside the same
//! transaction as the row write. Phase edits settle their children the same
//! way; phase creates have nothing to settle yet.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::models::*;
use crate::schedule::{self, ScheduleError, TaskGraph};

use super::{
    apply_adjustments, feature_from_row, get_feature, get_item, get_phase, get_project,
    item_from_row, load_project_parts, phase_from_row, Database, FEATURE_COLUMNS, ITEM_COLUMNS,
    PHASE_COLUMNS,
};

impl Database {
    // ============================================================
    // Phase operations
    // ============================================================

    pub fn get_phases_by_project(&self, project_id: i64) -> Result<Vec<Phase>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PHASE_COLUMNS} FROM phases WHERE project_id = ? ORDER BY sort_order, id"
        ))?;
        let phases = stmt
            .query_map([project_id], |row| phase_from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(phases)
    }

    pub fn get_phase(&self, id: i64) -> Result<Option<Phase>> {
        let conn = self.lock();
        get_phase(&conn, id)
    }

    pub fn create_phase(&self, project_id: i64, input: CreatePhaseInput) -> Result<Phase> {
        validate_duration(input.duration)?;
        let conn = self.lock();
        get_project(&conn, project_id)?.ok_or_else(|| anyhow::anyhow!("Project not found"))?;

        let now = Utc::now();
        let sort_order: i64 = conn.query_row(
            "SELECT COUNT(*) FROM phases WHERE project_id = ?",
            [project_id],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO phases (project_id, title, start_date, duration, is_milestone,
                 classification, notes, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                project_id,
                &input.title,
                input.start_date.to_string(),
                input.duration,
                input.is_milestone as i64,
                input.classification.as_str(),
                &input.notes,
                sort_order,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;
        let id = conn.last_insert_rowid();

        Ok(Phase {
            id,
            project_id,
            title: input.title,
            start_date: input.start_date,
            duration: input.duration,
            is_milestone: input.is_milestone,
            classification: input.classification,
            notes: input.notes,
            sort_order,
            created_at: now,
            updated_at: now,
        })
    }

    /// Update a phase and settle its children: a narrowed window clamps
    /// features (and transitively items), and anything those clamps move
    /// cascades through the dependency graph.
    pub fn update_phase(
        &self,
        id: i64,
        input: UpdatePhaseInput,
    ) -> Result<Option<(Phase, Vec<Adjustment>)>> {
        if let Some(duration) = input.duration {
            validate_duration(duration)?;
        }
        let conn = self.lock();
        let Some(existing) = get_phase(&conn, id)? else {
            return Ok(None);
        };

        let now = Utc::now();
        let title = input.title.unwrap_or(existing.title);
        let start_date = input.start_date.unwrap_or(existing.start_date);
        let duration = input.duration.unwrap_or(existing.duration);
        let is_milestone = input.is_milestone.unwrap_or(existing.is_milestone);
        let classification = input.classification.unwrap_or(existing.classification);
        let notes = input.notes.or(existing.notes);

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE phases SET title = ?, start_date = ?, duration = ?, is_milestone = ?,
                 classification = ?, notes = ?, updated_at = ? WHERE id = ?",
            (
                &title,
                start_date.to_string(),
                duration,
                is_milestone as i64,
                classification.as_str(),
                &notes,
                now.to_rfc3339(),
                id,
            ),
        )?;

        let adjustments = settle_in_tx(
            &tx,
            existing.project_id,
            PartRef::new(PartKind::Phase, id),
        )?;
        tx.commit()?;

        Ok(Some((
            Phase {
                id,
                project_id: existing.project_id,
                title,
                start_date,
                duration,
                is_milestone,
                classification,
                notes,
                sort_order: existing.sort_order,
                created_at: existing.created_at,
                updated_at: now,
            },
            adjustments,
        )))
    }

    pub fn delete_phase(&self, id: i64) -> Result<bool> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM items WHERE feature_id IN (SELECT id FROM features WHERE phase_id = ?)",
            [id],
        )?;
        tx.execute("DELETE FROM features WHERE phase_id = ?", [id])?;
        let rows = tx.execute("DELETE FROM phases WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // ============================================================
    // Feature operations
    // ============================================================

    pub fn get_features_by_phase(&self, phase_id: i64) -> Result<Vec<Feature>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FEATURE_COLUMNS} FROM features WHERE phase_id = ? ORDER BY sort_order, id"
        ))?;
        let features = stmt
            .query_map([phase_id], |row| feature_from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(features)
    }

    pub fn get_feature(&self, id: i64) -> Result<Option<Feature>> {
        let conn = self.lock();
        get_feature(&conn, id)
    }

    pub fn create_feature(
        &self,
        phase_id: i64,
        input: CreateFeatureInput,
    ) -> Result<(Feature, Vec<Adjustment>)> {
        validate_duration(input.duration)?;
        let conn = self.lock();
        let phase = get_phase(&conn, phase_id)?.ok_or_else(|| anyhow::anyhow!("Phase not found"))?;

        let now = Utc::now();
        let tx = conn.unchecked_transaction()?;
        let sort_order: i64 = tx.query_row(
            "SELECT COUNT(*) FROM features WHERE phase_id = ?",
            [phase_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO features (phase_id, title, start_date, duration, dependencies,
                 is_milestone, classification, notes, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                phase_id,
                &input.title,
                input.start_date.to_string(),
                input.duration,
                &input.dependencies,
                input.is_milestone as i64,
                input.classification.as_str(),
                &input.notes,
                sort_order,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;
        let id = tx.last_insert_rowid();

        let adjustments = settle_in_tx(
            &tx,
            phase.project_id,
            PartRef::new(PartKind::Feature, id),
        )?;
        let created =
            get_feature(&tx, id)?.ok_or_else(|| anyhow::anyhow!("Feature vanished mid-create"))?;
        tx.commit()?;

        Ok((created, adjustments))
    }

    pub fn update_feature(
        &self,
        id: i64,
        input: UpdateFeatureInput,
    ) -> Result<Option<(Feature, Vec<Adjustment>)>> {
        if let Some(duration) = input.duration {
            validate_duration(duration)?;
        }
        let conn = self.lock();
        let Some(existing) = get_feature(&conn, id)? else {
            return Ok(None);
        };
        let phase = get_phase(&conn, existing.phase_id)?
            .ok_or_else(|| anyhow::anyhow!("Phase not found"))?;

        let now = Utc::now();
        let title = input.title.unwrap_or(existing.title);
        let start_date = input.start_date.unwrap_or(existing.start_date);
        let duration = input.duration.unwrap_or(existing.duration);
        let dependencies = input.dependencies.or(existing.dependencies);
        let is_milestone = input.is_milestone.unwrap_or(existing.is_milestone);
        let classification = input.classification.unwrap_or(existing.classification);
        let notes = input.notes.or(existing.notes);

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE features SET title = ?, start_date = ?, duration = ?, dependencies = ?,
                 is_milestone = ?, classification = ?, notes = ?, updated_at = ? WHERE id = ?",
            (
                &title,
                start_date.to_string(),
                duration,
                &dependencies,
                is_milestone as i64,
                classification.as_str(),
                &notes,
                now.to_rfc3339(),
                id,
            ),
        )?;

        let adjustments = settle_in_tx(
            &tx,
            phase.project_id,
            PartRef::new(PartKind::Feature, id),
        )?;
        let updated =
            get_feature(&tx, id)?.ok_or_else(|| anyhow::anyhow!("Feature vanished mid-update"))?;
        tx.commit()?;

        Ok(Some((updated, adjustments)))
    }

    pub fn delete_feature(&self, id: i64) -> Result<bool> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM items WHERE feature_id = ?", [id])?;
        let rows = tx.execute("DELETE FROM features WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // ============================================================
    // Item operations
    // ============================================================

    pub fn get_items_by_feature(&self, feature_id: i64) -> Result<Vec<Item>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE feature_id = ? ORDER BY sort_order, id"
        ))?;
        let items = stmt
            .query_map([feature_id], |row| item_from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let conn = self.lock();
        get_item(&conn, id)
    }

    pub fn create_item(
        &self,
        feature_id: i64,
        input: CreateItemInput,
    ) -> Result<(Item, Vec<Adjustment>)> {
        validate_duration(input.duration)?;
        let conn = self.lock();
        let feature =
            get_feature(&conn, feature_id)?.ok_or_else(|| anyhow::anyhow!("Feature not found"))?;
        let phase = get_phase(&conn, feature.phase_id)?
            .ok_or_else(|| anyhow::anyhow!("Phase not found"))?;

        let now = Utc::now();
        let tx = conn.unchecked_transaction()?;
        let sort_order: i64 = tx.query_row(
            "SELECT COUNT(*) FROM items WHERE feature_id = ?",
            [feature_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO items (feature_id, title, start_date, duration, dependencies,
                 is_milestone, classification, notes, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                feature_id,
                &input.title,
                input.start_date.to_string(),
                input.duration,
                &input.dependencies,
                input.is_milestone as i64,
                input.classification.as_str(),
                &input.notes,
                sort_order,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;
        let id = tx.last_insert_rowid();

        let adjustments =
            settle_in_tx(&tx, phase.project_id, PartRef::new(PartKind::Item, id))?;
        let created =
            get_item(&tx, id)?.ok_or_else(|| anyhow::anyhow!("Item vanished mid-create"))?;
        tx.commit()?;

        Ok((created, adjustments))
    }

    pub fn update_item(
        &self,
        id: i64,
        input: UpdateItemInput,
    ) -> Result<Option<(Item, Vec<Adjustment>)>> {
        if let Some(duration) = input.duration {
            validate_duration(duration)?;
        }
        let conn = self.lock();
        let Some(existing) = get_item(&conn, id)? else {
            return Ok(None);
        };
        let feature = get_feature(&conn, existing.feature_id)?
            .ok_or_else(|| anyhow::anyhow!("Feature not found"))?;
        let phase = get_phase(&conn, feature.phase_id)?
            .ok_or_else(|| anyhow::anyhow!("Phase not found"))?;

        let now = Utc::now();
        let title = input.title.unwrap_or(existing.title);
        let start_date = input.start_date.unwrap_or(existing.start_date);
        let duration = input.duration.unwrap_or(existing.duration);
        let dependencies = input.dependencies.or(existing.dependencies);
        let is_milestone = input.is_milestone.unwrap_or(existing.is_milestone);
        let classification = input.classification.unwrap_or(existing.classification);
        let notes = input.notes.or(existing.notes);

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE items SET title = ?, start_date = ?, duration = ?, dependencies = ?,
                 is_milestone = ?, classification = ?, notes = ?, updated_at = ? WHERE id = ?",
            (
                &title,
                start_date.to_string(),
                duration,
                &dependencies,
                is_milestone as i64,
                classification.as_str(),
                &notes,
                now.to_rfc3339(),
                id,
            ),
        )?;

        let adjustments =
            settle_in_tx(&tx, phase.project_id, PartRef::new(PartKind::Item, id))?;
        let updated =
            get_item(&tx, id)?.ok_or_else(|| anyhow::anyhow!("Item vanished mid-update"))?;
        tx.commit()?;

        Ok(Some((updated, adjustments)))
    }

    pub fn delete_item(&self, id: i64) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM items WHERE id = ?", [id])?;
        Ok(rows > 0)
    }
}

fn validate_duration(duration: i64) -> Result<()> {
    if duration < 0 {
        return Err(ScheduleError::Validation(format!(
            "duration must be a non-negative number of days, got {duration}"
        ))
        .into());
    }
    Ok(())
}

/// Load the project snapshot, settle around `target`, persist whatever
/// changed. Runs inside the caller's transaction.
fn settle_in_tx(conn: &Connection, project_id: i64, target: PartRef) -> Result<Vec<Adjustment>> {
    let (phases, features, items) = load_project_parts(conn, project_id)?;
    let mut graph = TaskGraph::build(&phases, &features, &items);
    let adjustments = schedule::settle_part(&mut graph, target)?;
    apply_adjustments(conn, &adjustments)?;
    Ok(adjustments)
}
