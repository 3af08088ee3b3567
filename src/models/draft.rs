use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Adjustment, Classification, PartKind, PartRef};

/// The (possibly not-yet-decided) kind of a draft part.
///
/// A draft created in the holding area may leave its kind open until it is
/// dropped onto the plan; promotion then supplies the inferred kind. A draft
/// created with an explicit kind can only ever be promoted as that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftType {
    Unassigned,
    Assigned(PartKind),
}

impl DraftType {
    pub fn as_option(&self) -> Option<PartKind> {
        match self {
            Self::Unassigned => None,
            Self::Assigned(kind) => Some(*kind),
        }
    }

    pub fn from_option(kind: Option<PartKind>) -> Self {
        match kind {
            None => Self::Unassigned,
            Some(kind) => Self::Assigned(kind),
        }
    }
}

impl Serialize for DraftType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DraftType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_option(Option::<PartKind>::deserialize(
            deserializer,
        )?))
    }
}

/// Promoting a draft as a kind that conflicts with its pre-assigned one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("draft is typed as {assigned}, cannot promote as {requested}")]
pub struct DraftTypeConflict {
    pub assigned: PartKind,
    pub requested: PartKind,
}

/// An unscheduled staging record for a not-yet-placed part.
///
/// Drafts live outside the plan: start date and duration are optional, and
/// the parent bindings are hints for promotion rather than constraints.
/// A draft is destroyed exactly once, at promotion, in the same transaction
/// that inserts the concrete phase/feature/item it becomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPart {
    pub id: i64,
    pub title: String,
    pub part_type: DraftType,
    pub classification: Classification,
    pub project_id: Option<i64>,
    /// Pre-bound parent phase, used when promoting as a feature.
    pub phase_id: Option<i64>,
    /// Pre-bound parent feature, used when promoting as an item.
    pub feature_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub is_milestone: bool,
    pub dependencies: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DraftPart {
    /// Whether promotion still has to supply a kind.
    pub fn needs_type(&self) -> bool {
        self.part_type == DraftType::Unassigned
    }

    /// Consume the draft, resolving its final kind.
    ///
    /// An unassigned draft takes on `requested`; an assigned draft must be
    /// promoted as its own kind or the promotion is rejected.
    pub fn promote(self, requested: PartKind) -> Result<PromotedDraft, DraftTypeConflict> {
        match self.part_type {
            DraftType::Assigned(assigned) if assigned != requested => Err(DraftTypeConflict {
                assigned,
                requested,
            }),
            _ => Ok(PromotedDraft {
                kind: requested,
                draft: self,
            }),
        }
    }
}

/// A draft whose kind has been resolved, ready to become a concrete part.
#[derive(Debug, Clone)]
pub struct PromotedDraft {
    pub kind: PartKind,
    pub draft: DraftPart,
}

/// Input for creating a draft part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDraftInput {
    pub title: String,
    #[serde(default)]
    pub part_type: Option<PartKind>,
    #[serde(default)]
    pub classification: Classification,
    pub project_id: Option<i64>,
    pub phase_id: Option<i64>,
    pub feature_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub duration: Option<i64>,
    #[serde(default)]
    pub is_milestone: bool,
    pub dependencies: Option<String>,
    pub notes: Option<String>,
}

/// What a promotion produced: the concrete part that replaced the draft,
/// plus the plan recomputation that placing it triggered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteDraftResponse {
    pub created: PromotedPartSummary,
    pub removed_draft_id: i64,
    pub critical_path: Vec<PartRef>,
    pub adjustments: Vec<Adjustment>,
}

/// Canonical summary of a freshly promoted part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotedPartSummary {
    pub id: PartRef,
    pub title: String,
    pub start: NaiveDate,
    pub duration: i64,
}

/// Input for promoting a draft into a concrete part.
///
/// `inferred_type` comes from where the draft was dropped. Parent ids fall
/// back to the draft's pre-bound ones; for items, an `item_id` of a sibling
/// can stand in for the feature id (the sibling's parent is used).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteDraftInput {
    pub inferred_type: PartKind,
    pub start: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub project_id: Option<i64>,
    pub phase_id: Option<i64>,
    pub feature_id: Option<i64>,
    pub item_id: Option<i64>,
}
