mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Projects
        .route("/projects", get(handlers::list_projects))
        .route("/projects", post(handlers::create_project))
        .route("/projects/{id}", get(handlers::get_project))
        .route("/projects/{id}", put(handlers::update_project))
        .route("/projects/{id}", delete(handlers::delete_project))
        .route("/projects/{id}/phases", get(handlers::list_project_phases))
        .route("/projects/{id}/phases", post(handlers::create_phase))
        // Scheduling
        .route("/projects/{id}/reschedule", post(handlers::reschedule))
        .route("/projects/{id}/critical-path", get(handlers::get_critical_path))
        .route("/projects/{id}/plan", get(handlers::get_plan))
        .route("/reorder", post(handlers::reorder))
        // Exports
        .route("/projects/{id}/export/critical-path.csv", get(handlers::export_critical_path_csv))
        .route("/projects/{id}/export/calendar.ics", get(handlers::export_calendar_ics))
        .route("/projects/{id}/export/bundle", get(handlers::export_bundle))
        // Phases
        .route("/phases/{id}", get(handlers::get_phase))
        .route("/phases/{id}", put(handlers::update_phase))
        .route("/phases/{id}", delete(handlers::delete_phase))
        .route("/phases/{id}/features", get(handlers::list_phase_features))
        .route("/phases/{id}/features", post(handlers::create_feature))
        // Features
        .route("/features/{id}", get(handlers::get_feature))
        .route("/features/{id}", put(handlers::update_feature))
        .route("/features/{id}", delete(handlers::delete_feature))
        .route("/features/{id}/items", get(handlers::list_feature_items))
        .route("/features/{id}/items", post(handlers::create_item))
        // Items
        .route("/items/{id}", get(handlers::get_item))
        .route("/items/{id}", put(handlers::update_item))
        .route("/items/{id}", delete(handlers::delete_item))
        // Drafts
        .route("/drafts", get(handlers::list_drafts))
        .route("/drafts", post(handlers::create_draft))
        .route("/drafts/{id}", delete(handlers::delete_draft))
        .route("/drafts/{id}/promote", post(handlers::promote_draft))
        // Images
        .route("/images", get(handlers::list_images))
        .route("/images", post(handlers::create_image))
        .route("/images/{id}/attach", post(handlers::attach_image))
        .route("/images/{id}/detach", post(handlers::detach_image))
        .route("/parts/{kind}/{id}/images", get(handlers::list_part_images))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
