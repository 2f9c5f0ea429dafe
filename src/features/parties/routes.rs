use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::parties::handlers::{self, PartyRouteState};
use crate::features::parties::models::PartyType;
use crate::features::parties::services::PartyService;

pub fn routes(service: Arc<PartyService>) -> Router {
    PartyType::ALL
        .into_iter()
        .fold(Router::new(), |router, party_type| {
            let state = PartyRouteState {
                service: service.clone(),
                party_type,
            };
            let collection = format!("/api/incidents/{{incident_id}}/{}", party_type.plural());
            let item = format!("{}/{{id}}", collection);

            router.merge(
                Router::new()
                    .route(
                        &collection,
                        get(handlers::list_parties).post(handlers::create_party),
                    )
                    .route(
                        &item,
                        get(handlers::get_party)
                            .patch(handlers::update_party)
                            .delete(handlers::delete_party),
                    )
                    .with_state(state),
            )
        })
}
