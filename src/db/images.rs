//! Image metadata and its many-to-many attachment to parts.
//!
//! The server only tracks associations; serving the actual files is the
//! deployment's upload directory's business.

use anyhow::Result;
use chrono::Utc;

use crate::models::*;
use crate::schedule::ScheduleError;

use super::{parse_datetime, part_exists, Database};

impl Database {
    pub fn get_all_images(&self) -> Result<Vec<Image>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT id, filename, created_at FROM images ORDER BY created_at, id")?;
        let images = stmt
            .query_map([], |row| {
                Ok(Image {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    created_at: parse_datetime(row.get::<_, String>(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }

    pub fn create_image(&self, input: CreateImageInput) -> Result<Image> {
        if input.filename.trim().is_empty() {
            return Err(ScheduleError::Validation("filename required".to_string()).into());
        }
        let conn = self.lock();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO images (filename, created_at) VALUES (?, ?)",
            (&input.filename, now.to_rfc3339()),
        )?;
        Ok(Image {
            id: conn.last_insert_rowid(),
            filename: input.filename,
            created_at: now,
        })
    }

    /// Attach an image to a part. Re-attaching is a no-op.
    pub fn attach_image(&self, image_id: i64, part: PartRef) -> Result<()> {
        let conn = self.lock();
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM images WHERE id = ?",
            [image_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            anyhow::bail!("Image not found");
        }
        if !part_exists(&conn, part)? {
            return Err(ScheduleError::PartNotFound(part).into());
        }
        conn.execute(
            "INSERT OR IGNORE INTO part_images (image_id, part_kind, part_id) VALUES (?, ?, ?)",
            (image_id, part.kind.as_str(), part.id),
        )?;
        Ok(())
    }

    pub fn detach_image(&self, image_id: i64, part: PartRef) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute(
            "DELETE FROM part_images WHERE image_id = ? AND part_kind = ? AND part_id = ?",
            (image_id, part.kind.as_str(), part.id),
        )?;
        Ok(rows > 0)
    }

    pub fn get_images_for_part(&self, part: PartRef) -> Result<Vec<Image>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT i.id, i.filename, i.created_at FROM images i
             JOIN part_images pi ON pi.image_id = i.id
             WHERE pi.part_kind = ? AND pi.part_id = ?
             ORDER BY i.created_at, i.id",
        )?;
        let images = stmt
            .query_map((part.kind.as_str(), part.id), |row| {
                Ok(Image {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    created_at: parse_datetime(row.get::<_, String>(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }
}
