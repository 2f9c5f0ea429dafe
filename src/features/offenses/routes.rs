use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::offenses::handlers;
use crate::features::offenses::services::OffenseService;

pub fn routes(service: Arc<OffenseService>) -> Router {
    Router::new()
        .route(
            "/api/offenses",
            get(handlers::list_offenses).post(handlers::create_offense),
        )
        .route(
            "/api/offenses/{id}",
            get(handlers::get_offense)
                .patch(handlers::update_offense)
                .delete(handlers::delete_offense),
        )
        .with_state(service)
}
