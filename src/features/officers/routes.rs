use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::officers::handlers;
use crate::features::officers::services::OfficerService;

pub fn routes(service: Arc<OfficerService>) -> Router {
    Router::new()
        .route(
            "/api/officers",
            get(handlers::list_officers).post(handlers::create_officer),
        )
        .route(
            "/api/officers/{id}",
            get(handlers::get_officer)
                .patch(handlers::update_officer)
                .delete(handlers::delete_officer),
        )
        .with_state(service)
}
