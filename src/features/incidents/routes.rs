use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::incidents::handlers;
use crate::features::incidents::services::IncidentService;

pub fn routes(service: Arc<IncidentService>) -> Router {
    Router::new()
        .route(
            "/api/incidents",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route("/api/incidents/search", get(handlers::search_incidents))
        .route("/api/incidents/form", post(handlers::create_incident_from_form))
        .route("/api/incidents/print/{id}", get(handlers::print_incident))
        .route(
            "/api/incidents/{incident_id}",
            get(handlers::get_incident)
                .patch(handlers::update_incident)
                .delete(handlers::delete_incident),
        )
        .route("/api/incidents/{incident_id}/form", get(handlers::get_incident_form))
        .with_state(service)
}
