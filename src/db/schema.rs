use anyhow::{Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "initial",
        sql: include_str!("migrations/001_initial.sql"),
    },
    Migration {
        version: "002",
        name: "draft_parts",
        sql: include_str!("migrations/002_draft_parts.sql"),
    },
    Migration {
        version: "003",
        name: "sort_order",
        sql: include_str!("migrations/003_sort_order.sql"),
    },
    Migration {
        version: "004",
        name: "images",
        sql: include_str!("migrations/004_images.sql"),
    },
];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    // Check for existing database without version tracking (upgrade path)
    let needs_baseline = check_needs_baseline(conn)?;
    if needs_baseline {
        mark_migration_applied(conn, "001", "initial")?;
        tracing::info!("Detected existing database, marked migration 001 as applied");
    }

    // Get applied migrations
    let applied = get_applied_migrations(conn)?;

    // Run pending migrations
    for migration in MIGRATIONS {
        if !applied.contains(&migration.version.to_string()) {
            apply_migration(conn, migration)?;
        }
    }

    Ok(())
}

fn check_needs_baseline(conn: &Connection) -> Result<bool> {
    // If schema_migrations is empty but tables exist, this is an existing database
    let migration_count: i32 =
        conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;

    if migration_count > 0 {
        return Ok(false);
    }

    // Check if core tables exist (phases table is a good indicator)
    let tables_exist: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='phases'",
        [],
        |row| row.get(0),
    )?;

    Ok(tables_exist > 0)
}

fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(versions)
}

fn mark_migration_applied(conn: &Connection, version: &str, name: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (version, name, &now),
    )?;
    Ok(())
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!(
        "Applying migration {}: {}",
        migration.version,
        migration.name
    );

    // Run migration in a transaction
    conn.execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", migration.sql))
        .with_context(|| {
            format!(
                "Failed to apply migration {}: {}",
                migration.version, migration.name
            )
        })?;

    mark_migration_applied(conn, migration.version, migration.name)?;

    tracing::info!("Migration {} applied successfully", migration.version);
    Ok(())
}
