use thiserror::Error;

use crate::models::{DraftTypeConflict, PartRef};

/// Errors from the scheduling engine and the operations built on it.
///
/// Everything here is raised before any row is written; the db layer maps a
/// mid-transaction storage failure to a rollback instead.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Bad input: malformed reference, negative duration, missing field.
    #[error("{0}")]
    Validation(String),

    /// The referenced node does not exist in the project being scheduled.
    #[error("{0} not found")]
    PartNotFound(PartRef),

    /// The dependency graph contains a cycle; the offending node is the
    /// first one (in plan order) that could not be ordered.
    #[error("dependency cycle detected at {0}")]
    DependencyCycle(PartRef),

    /// A draft with a pre-assigned type was promoted as a different type.
    #[error(transparent)]
    DraftTypeConflict(#[from] DraftTypeConflict),
}
