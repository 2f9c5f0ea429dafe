use axum::{routing::get, Router};

use crate::features::choices::handlers;

pub fn routes() -> Router {
    Router::new().route("/api/choices", get(handlers::get_choices))
}
