use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project: the top-level container for a plan.
///
/// Projects own an ordered list of phases; deleting a project cascades
/// through phases, features, and items in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub title: String,
}

/// Input for renaming a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    pub title: Option<String>,
}
