mod drafts;
mod images;
mod parts;
mod scheduling;
mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;

use crate::models::*;

/// SQLite-backed store for plans.
///
/// One shared connection behind a mutex; every multi-row mutation (cascade
/// application, reorder, promotion, cascading delete) runs inside a single
/// transaction so a failure leaves the plan untouched.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "planboard")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("planboard.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn get_all_projects(&self) -> Result<Vec<Project>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, created_at, updated_at FROM projects ORDER BY title, id",
        )?;

        let projects = stmt
            .query_map([], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    created_at: parse_datetime(row.get::<_, String>(2)?),
                    updated_at: parse_datetime(row.get::<_, String>(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.lock();
        get_project(&conn, id)
    }

    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let conn = self.lock();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO projects (title, created_at, updated_at) VALUES (?, ?, ?)",
            (&input.title, now.to_rfc3339(), now.to_rfc3339()),
        )?;
        let id = conn.last_insert_rowid();

        Ok(Project {
            id,
            title: input.title,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_project(&self, id: i64, input: UpdateProjectInput) -> Result<Option<Project>> {
        let conn = self.lock();
        let Some(existing) = get_project(&conn, id)? else {
            return Ok(None);
        };

        let now = Utc::now();
        let title = input.title.unwrap_or(existing.title);

        conn.execute(
            "UPDATE projects SET title = ?, updated_at = ? WHERE id = ?",
            (&title, now.to_rfc3339(), id),
        )?;

        Ok(Some(Project {
            id,
            title,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a project and everything under it: items, features, phases,
    /// then the project row, all in one transaction.
    pub fn delete_project(&self, id: i64) -> Result<bool> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM items WHERE feature_id IN (
                SELECT f.id FROM features f
                JOIN phases p ON f.phase_id = p.id
                WHERE p.project_id = ?)",
            [id],
        )?;
        tx.execute(
            "DELETE FROM features WHERE phase_id IN (
                SELECT id FROM phases WHERE project_id = ?)",
            [id],
        )?;
        tx.execute("DELETE FROM phases WHERE project_id = ?", [id])?;
        let rows = tx.execute("DELETE FROM projects WHERE id = ?", [id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    /// Snapshot of every schedulable part in a project, in plan order
    /// (phases by sort position, features and items by their parents).
    pub fn get_project_parts(
        &self,
        project_id: i64,
    ) -> Result<(Vec<Phase>, Vec<Feature>, Vec<Item>)> {
        let conn = self.lock();
        load_project_parts(&conn, project_id)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

// ============================================================
// Row mapping and snapshot helpers (shared with the impl blocks
// in the sibling modules, usable inside transactions)
// ============================================================

pub(crate) fn parse_date(s: String) -> NaiveDate {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or_default()
}

pub(crate) fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn parse_classification(s: String) -> Classification {
    Classification::from_str(&s).unwrap_or_default()
}

pub(crate) fn get_project(conn: &Connection, id: i64) -> Result<Option<Project>> {
    let mut stmt =
        conn.prepare("SELECT id, title, created_at, updated_at FROM projects WHERE id = ?")?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(Project {
            id: row.get(0)?,
            title: row.get(1)?,
            created_at: parse_datetime(row.get::<_, String>(2)?),
            updated_at: parse_datetime(row.get::<_, String>(3)?),
        }))
    } else {
        Ok(None)
    }
}

pub(crate) const PHASE_COLUMNS: &str = "id, project_id, title, start_date, duration, is_milestone, \
     classification, notes, sort_order, created_at, updated_at";

pub(crate) const FEATURE_COLUMNS: &str = "id, phase_id, title, start_date, duration, dependencies, \
     is_milestone, classification, notes, sort_order, created_at, updated_at";

pub(crate) const ITEM_COLUMNS: &str = "id, feature_id, title, start_date, duration, dependencies, \
     is_milestone, classification, notes, sort_order, created_at, updated_at";

pub(crate) fn phase_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Phase> {
    Ok(Phase {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        start_date: parse_date(row.get::<_, String>(3)?),
        duration: row.get(4)?,
        is_milestone: row.get::<_, i64>(5)? != 0,
        classification: parse_classification(row.get::<_, String>(6)?),
        notes: row.get(7)?,
        sort_order: row.get(8)?,
        created_at: parse_datetime(row.get::<_, String>(9)?),
        updated_at: parse_datetime(row.get::<_, String>(10)?),
    })
}

pub(crate) fn feature_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Feature> {
    Ok(Feature {
        id: row.get(0)?,
        phase_id: row.get(1)?,
        title: row.get(2)?,
        start_date: parse_date(row.get::<_, String>(3)?),
        duration: row.get(4)?,
        dependencies: row.get(5)?,
        is_milestone: row.get::<_, i64>(6)? != 0,
        classification: parse_classification(row.get::<_, String>(7)?),
        notes: row.get(8)?,
        sort_order: row.get(9)?,
        created_at: parse_datetime(row.get::<_, String>(10)?),
        updated_at: parse_datetime(row.get::<_, String>(11)?),
    })
}

pub(crate) fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        feature_id: row.get(1)?,
        title: row.get(2)?,
        start_date: parse_date(row.get::<_, String>(3)?),
        duration: row.get(4)?,
        dependencies: row.get(5)?,
        is_milestone: row.get::<_, i64>(6)? != 0,
        classification: parse_classification(row.get::<_, String>(7)?),
        notes: row.get(8)?,
        sort_order: row.get(9)?,
        created_at: parse_datetime(row.get::<_, String>(10)?),
        updated_at: parse_datetime(row.get::<_, String>(11)?),
    })
}

pub(crate) fn get_phase(conn: &Connection, id: i64) -> Result<Option<Phase>> {
    let mut stmt = conn.prepare(&format!("SELECT {PHASE_COLUMNS} FROM phases WHERE id = ?"))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(phase_from_row(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn get_feature(conn: &Connection, id: i64) -> Result<Option<Feature>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FEATURE_COLUMNS} FROM features WHERE id = ?"
    ))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(feature_from_row(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn get_item(conn: &Connection, id: i64) -> Result<Option<Item>> {
    let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(item_from_row(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn load_project_parts(
    conn: &Connection,
    project_id: i64,
) -> Result<(Vec<Phase>, Vec<Feature>, Vec<Item>)> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PHASE_COLUMNS} FROM phases WHERE project_id = ? ORDER BY sort_order, id"
    ))?;
    let phases = stmt
        .query_map([project_id], |row| phase_from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    let columns = FEATURE_COLUMNS
        .split(", ")
        .map(|c| format!("f.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} FROM features f
         JOIN phases p ON f.phase_id = p.id
         WHERE p.project_id = ? ORDER BY f.phase_id, f.sort_order, f.id"
    ))?;
    let features = stmt
        .query_map([project_id], |row| feature_from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    let columns = ITEM_COLUMNS
        .split(", ")
        .map(|c| format!("i.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} FROM items i
         JOIN features f ON i.feature_id = f.id
         JOIN phases p ON f.phase_id = p.id
         WHERE p.project_id = ? ORDER BY i.feature_id, i.sort_order, i.id"
    ))?;
    let items = stmt
        .query_map([project_id], |row| item_from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((phases, features, items))
}

/// Which table a part kind lives in.
pub(crate) fn table_for(kind: PartKind) -> &'static str {
    match kind {
        PartKind::Phase => "phases",
        PartKind::Feature => "features",
        PartKind::Item => "items",
    }
}

pub(crate) fn part_exists(conn: &Connection, part: PartRef) -> Result<bool> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE id = ?", table_for(part.kind)),
        [part.id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Persist engine adjustments. Runs inside the caller's transaction.
pub(crate) fn apply_adjustments(conn: &Connection, adjustments: &[Adjustment]) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    for adj in adjustments {
        conn.execute(
            &format!(
                "UPDATE {} SET start_date = ?, duration = ?, updated_at = ? WHERE id = ?",
                table_for(adj.id.kind)
            ),
            (adj.start.to_string(), adj.duration, &now, adj.id.id),
        )?;
    }
    Ok(())
}
