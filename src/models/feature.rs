use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Classification, PartKind, PartRef};

/// A feature: the mid-level schedulable part, owned by a phase.
///
/// Features may depend on other features or items via the free-text
/// `dependencies` field (`"item-3, feature-5; 7"`, parsed by
/// `schedule::deps::parse_dependencies`). A feature's window must lie inside
/// its phase's window, and its start is pushed forward past the end of every
/// dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    pub phase_id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub duration: i64,
    /// Raw dependency text as entered; parsed on demand, never normalized.
    pub dependencies: Option<String>,
    pub is_milestone: bool,
    pub classification: Classification,
    pub notes: Option<String>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feature {
    pub fn part_ref(&self) -> PartRef {
        PartRef::new(PartKind::Feature, self.id)
    }

    /// Exclusive end date: `start_date + duration` days.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Days::new(self.duration.max(0) as u64)
    }
}

/// Input for creating a new feature under a phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeatureInput {
    pub title: String,
    pub start_date: NaiveDate,
    pub duration: i64,
    pub dependencies: Option<String>,
    #[serde(default)]
    pub is_milestone: bool,
    #[serde(default)]
    pub classification: Classification,
    pub notes: Option<String>,
}

/// Input for updating a feature. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFeatureInput {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub dependencies: Option<String>,
    pub is_milestone: Option<bool>,
    pub classification: Option<Classification>,
    pub notes: Option<String>,
}
