use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Classification, PartKind, PartRef};

/// A phase: the outermost schedulable level, owned by a project.
///
/// Phases carry a time window and display ordering but never depend on other
/// parts; dependency edges only originate from features and items. Their
/// window bounds their features' windows (containment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    /// Length in days; the phase ends the morning of `start_date + duration`
    /// (exclusive end).
    pub duration: i64,
    pub is_milestone: bool,
    pub classification: Classification,
    pub notes: Option<String>,
    /// Position among siblings, maintained dense 0..N-1 by reorder.
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Phase {
    pub fn part_ref(&self) -> PartRef {
        PartRef::new(PartKind::Phase, self.id)
    }

    /// Exclusive end date: `start_date + duration` days.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Days::new(self.duration.max(0) as u64)
    }
}

/// Input for creating a new phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePhaseInput {
    pub title: String,
    pub start_date: NaiveDate,
    pub duration: i64,
    #[serde(default)]
    pub is_milestone: bool,
    #[serde(default)]
    pub classification: Classification,
    pub notes: Option<String>,
}

/// Input for updating a phase. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePhaseInput {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub is_milestone: Option<bool>,
    pub classification: Option<Classification>,
    pub notes: Option<String>,
}
