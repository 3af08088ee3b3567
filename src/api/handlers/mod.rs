use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::export;
use crate::models::*;
use crate::schedule::ScheduleError;

// ============================================================
// Error Handling
// ============================================================

/// Map an operation failure to a response.
///
/// Engine errors carry their own taxonomy; anything else is either an
/// entity-level not-found (safe to expose) or an internal error that is
/// logged server-side and sanitized for the client.
fn map_error(e: anyhow::Error) -> (StatusCode, String) {
    if let Some(schedule_err) = e.downcast_ref::<ScheduleError>() {
        let status = match schedule_err {
            ScheduleError::Validation(_) => StatusCode::BAD_REQUEST,
            ScheduleError::PartNotFound(_) => StatusCode::NOT_FOUND,
            ScheduleError::DependencyCycle(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ScheduleError::DraftTypeConflict(_) => StatusCode::CONFLICT,
        };
        tracing::warn!("Scheduling error: {}", schedule_err);
        return (status, schedule_err.to_string());
    }

    let msg = e.to_string();
    if msg.contains("not found") {
        tracing::warn!("Not found: {}", msg);
        return (StatusCode::NOT_FOUND, msg);
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// A created or edited part with its canonical window and whatever other
/// nodes the settle pass moved.
#[derive(Debug, Serialize)]
pub struct SettledPart<T: Serialize> {
    #[serde(flatten)]
    pub part: T,
    pub end: NaiveDate,
    pub adjustments: Vec<Adjustment>,
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(
    State(db): State<Database>,
) -> Result<Json<Vec<Project>>, (StatusCode, String)> {
    db.get_all_projects().map(Json).map_err(map_error)
}

pub async fn get_project(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Project>, (StatusCode, String)> {
    db.get_project(id)
        .map_err(map_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))
}

pub async fn create_project(
    State(db): State<Database>,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), (StatusCode, String)> {
    db.create_project(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(map_error)
}

pub async fn update_project(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProjectInput>,
) -> Result<Json<Project>, (StatusCode, String)> {
    db.update_project(id, input)
        .map_err(map_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))
}

pub async fn delete_project(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_project(id).map_err(map_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Project not found".to_string()))
    }
}

// ============================================================
// Phases
// ============================================================

pub async fn list_project_phases(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<Phase>>, (StatusCode, String)> {
    db.get_phases_by_project(project_id)
        .map(Json)
        .map_err(map_error)
}

pub async fn create_phase(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
    Json(input): Json<CreatePhaseInput>,
) -> Result<(StatusCode, Json<SettledPart<Phase>>), (StatusCode, String)> {
    db.create_phase(project_id, input)
        .map(|phase| {
            let end = phase.end_date();
            (
                StatusCode::CREATED,
                Json(SettledPart {
                    part: phase,
                    end,
                    adjustments: Vec::new(),
                }),
            )
        })
        .map_err(map_error)
}

pub async fn get_phase(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Phase>, (StatusCode, String)> {
    db.get_phase(id)
        .map_err(map_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Phase not found".to_string()))
}

pub async fn update_phase(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePhaseInput>,
) -> Result<Json<SettledPart<Phase>>, (StatusCode, String)> {
    db.update_phase(id, input)
        .map_err(map_error)?
        .map(|(phase, adjustments)| {
            let end = phase.end_date();
            Json(SettledPart {
                part: phase,
                end,
                adjustments,
            })
        })
        .ok_or((StatusCode::NOT_FOUND, "Phase not found".to_string()))
}

pub async fn delete_phase(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_phase(id).map_err(map_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Phase not found".to_string()))
    }
}

// ============================================================
// Features
// ============================================================

pub async fn list_phase_features(
    State(db): State<Database>,
    Path(phase_id): Path<i64>,
) -> Result<Json<Vec<Feature>>, (StatusCode, String)> {
    db.get_features_by_phase(phase_id)
        .map(Json)
        .map_err(map_error)
}

pub async fn create_feature(
    State(db): State<Database>,
    Path(phase_id): Path<i64>,
    Json(input): Json<CreateFeatureInput>,
) -> Result<(StatusCode, Json<SettledPart<Feature>>), (StatusCode, String)> {
    db.create_feature(phase_id, input)
        .map(|(feature, adjustments)| {
            let end = feature.end_date();
            (
                StatusCode::CREATED,
                Json(SettledPart {
                    part: feature,
                    end,
                    adjustments,
                }),
            )
        })
        .map_err(map_error)
}

pub async fn get_feature(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Feature>, (StatusCode, String)> {
    db.get_feature(id)
        .map_err(map_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Feature not found".to_string()))
}

pub async fn update_feature(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateFeatureInput>,
) -> Result<Json<SettledPart<Feature>>, (StatusCode, String)> {
    db.update_feature(id, input)
        .map_err(map_error)?
        .map(|(feature, adjustments)| {
            let end = feature.end_date();
            Json(SettledPart {
                part: feature,
                end,
                adjustments,
            })
        })
        .ok_or((StatusCode::NOT_FOUND, "Feature not found".to_string()))
}

pub async fn delete_feature(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_feature(id).map_err(map_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Feature not found".to_string()))
    }
}

// ============================================================
// Items
// ============================================================

pub async fn list_feature_items(
    State(db): State<Database>,
    Path(feature_id): Path<i64>,
) -> Result<Json<Vec<Item>>, (StatusCode, String)> {
    db.get_items_by_feature(feature_id)
        .map(Json)
        .map_err(map_error)
}

pub async fn create_item(
    State(db): State<Database>,
    Path(feature_id): Path<i64>,
    Json(input): Json<CreateItemInput>,
) -> Result<(StatusCode, Json<SettledPart<Item>>), (StatusCode, String)> {
    db.create_item(feature_id, input)
        .map(|(item, adjustments)| {
            let end = item.end_date();
            (
                StatusCode::CREATED,
                Json(SettledPart {
                    part: item,
                    end,
                    adjustments,
                }),
            )
        })
        .map_err(map_error)
}

pub async fn get_item(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Item>, (StatusCode, String)> {
    db.get_item(id)
        .map_err(map_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))
}

pub async fn update_item(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateItemInput>,
) -> Result<Json<SettledPart<Item>>, (StatusCode, String)> {
    db.update_item(id, input)
        .map_err(map_error)?
        .map(|(item, adjustments)| {
            let end = item.end_date();
            Json(SettledPart {
                part: item,
                end,
                adjustments,
            })
        })
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))
}

pub async fn delete_item(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_item(id).map_err(map_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Item not found".to_string()))
    }
}

// ============================================================
// Scheduling
// ============================================================

pub async fn reschedule(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
    Json(input): Json<RescheduleInput>,
) -> Result<Json<RescheduleResponse>, (StatusCode, String)> {
    db.reschedule(project_id, input)
        .map(Json)
        .map_err(map_error)
}

pub async fn get_critical_path(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<PartRef>>, (StatusCode, String)> {
    db.critical_path(project_id).map(Json).map_err(map_error)
}

pub async fn get_plan(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
) -> Result<Json<PlanResponse>, (StatusCode, String)> {
    db.plan(project_id).map(Json).map_err(map_error)
}

pub async fn reorder(
    State(db): State<Database>,
    Json(input): Json<ReorderInput>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    db.reorder(input)
        .map(|_| Json(serde_json::json!({ "status": "ok" })))
        .map_err(map_error)
}

// ============================================================
// Exports
// ============================================================

pub async fn export_critical_path_csv(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let path = db.critical_path(project_id).map_err(map_error)?;
    let body = export::critical_path_csv(&path);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"critical_path.csv\"",
            ),
        ],
        body,
    ))
}

pub async fn export_calendar_ics(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    db.get_project(project_id)
        .map_err(map_error)?
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))?;
    let (phases, features, items) = db.get_project_parts(project_id).map_err(map_error)?;
    let body = export::calendar_ics(&phases, &features, &items, chrono::Utc::now());
    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"project_calendar.ics\"",
            ),
        ],
        body,
    ))
}

pub async fn export_bundle(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
) -> Result<Json<export::ProjectBundle>, (StatusCode, String)> {
    let project = db
        .get_project(project_id)
        .map_err(map_error)?
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))?;
    let (phases, features, items) = db.get_project_parts(project_id).map_err(map_error)?;
    Ok(Json(export::project_bundle(
        &project, &phases, &features, &items,
    )))
}

// ============================================================
// Drafts
// ============================================================

pub async fn list_drafts(
    State(db): State<Database>,
) -> Result<Json<Vec<DraftPart>>, (StatusCode, String)> {
    db.get_drafts().map(Json).map_err(map_error)
}

pub async fn create_draft(
    State(db): State<Database>,
    Json(input): Json<CreateDraftInput>,
) -> Result<(StatusCode, Json<DraftPart>), (StatusCode, String)> {
    db.create_draft(input)
        .map(|d| (StatusCode::CREATED, Json(d)))
        .map_err(map_error)
}

pub async fn delete_draft(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_draft(id).map_err(map_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Draft not found".to_string()))
    }
}

pub async fn promote_draft(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<PromoteDraftInput>,
) -> Result<Json<PromoteDraftResponse>, (StatusCode, String)> {
    db.promote_draft(id, input).map(Json).map_err(map_error)
}

// ============================================================
// Images
// ============================================================

pub async fn list_images(
    State(db): State<Database>,
) -> Result<Json<Vec<Image>>, (StatusCode, String)> {
    db.get_all_images().map(Json).map_err(map_error)
}

pub async fn create_image(
    State(db): State<Database>,
    Json(input): Json<CreateImageInput>,
) -> Result<(StatusCode, Json<Image>), (StatusCode, String)> {
    db.create_image(input)
        .map(|i| (StatusCode::CREATED, Json(i)))
        .map_err(map_error)
}

pub async fn attach_image(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<ImageAttachmentInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    db.attach_image(id, input.part)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_error)
}

pub async fn detach_image(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<ImageAttachmentInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.detach_image(id, input.part).map_err(map_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Attachment not found".to_string()))
    }
}

pub async fn list_part_images(
    State(db): State<Database>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Vec<Image>>, (StatusCode, String)> {
    let kind = PartKind::from_str(&kind).ok_or((
        StatusCode::BAD_REQUEST,
        format!("unknown part kind: {kind}"),
    ))?;
    db.get_images_for_part(PartRef::new(kind, id))
        .map(Json)
        .map_err(map_error)
}
