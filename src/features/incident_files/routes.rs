use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::incident_files::handlers;
use crate::features::incident_files::services::IncidentFileService;

pub fn routes(service: Arc<IncidentFileService>) -> Router {
    Router::new()
        .route(
            "/api/incidents/{incident_id}/files",
            get(handlers::list_files).post(handlers::upload_files),
        )
        .route(
            "/api/incidents/{incident_id}/files/{id}",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .route(
            "/api/incidents/{incident_id}/files/{id}/download",
            get(handlers::download_file),
        )
        .with_state(service)
}
