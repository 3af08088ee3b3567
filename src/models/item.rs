use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Classification, PartKind, PartRef};

/// An item: the leaf schedulable part, owned by a feature.
///
/// Identical in shape to [`super::Feature`] but has no children of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub feature_id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub duration: i64,
    pub dependencies: Option<String>,
    pub is_milestone: bool,
    pub classification: Classification,
    pub notes: Option<String>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn part_ref(&self) -> PartRef {
        PartRef::new(PartKind::Item, self.id)
    }

    /// Exclusive end date: `start_date + duration` days.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Days::new(self.duration.max(0) as u64)
    }
}

/// Input for creating a new item under a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemInput {
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

/// Input for updating an item. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemInput {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub dependencies: Option<String>,
    pub is_milestone: Option<bool>,
    pub classification: Option<Classification>,
    pub notes: Option<String>,
}
