use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PartRef;

/// Metadata for an uploaded image.
///
/// Only the association is modeled here: images attach many-to-many to any
/// phase, feature, or item. File bytes live wherever the deployment keeps
/// its upload directory and are not the server's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

/// Input for registering an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateImageInput {
    pub filename: String,
}

/// Input for attaching or detaching an image to/from a part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAttachmentInput {
    pub part: PartRef,
}
