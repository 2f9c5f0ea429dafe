use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::parties::dtos::{PartyInput, PartyResponseDto, UpdatePartyDto};
use crate::features::parties::models::PartyType;
use crate::features::parties::services::PartyService;
use crate::shared::types::{ApiResponse, Meta};

/// Router state for one party collection. The victims and suspects routes
/// share these handlers and differ only in `party_type`.
#[derive(Clone)]
pub struct PartyRouteState {
    pub service: Arc<PartyService>,
    pub party_type: PartyType,
}

/// List the victims or suspects of an incident
#[utoipa::path(
    get,
    path = "/api/incidents/{incident_id}/{parties}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID"),
        ("parties" = String, Path, description = "`victims` or `suspects`")
    ),
    responses(
        (status = 200, description = "Parties in display order", body = ApiResponse<Vec<PartyResponseDto>>),
        (status = 404, description = "Incident not found")
    ),
    tag = "parties",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_parties(
    State(state): State<PartyRouteState>,
    Path(incident_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<PartyResponseDto>>>> {
    let parties = state.service.list(incident_id, state.party_type).await?;
    let total = parties.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(parties),
        None,
        Some(Meta { total }),
    )))
}

/// Add a victim or suspect to an incident
#[utoipa::path(
    post,
    path = "/api/incidents/{incident_id}/{parties}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID"),
        ("parties" = String, Path, description = "`victims` or `suspects`")
    ),
    request_body = PartyInput,
    responses(
        (status = 201, description = "Party created", body = ApiResponse<PartyResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Incident not found")
    ),
    tag = "parties",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_party(
    State(state): State<PartyRouteState>,
    Path(incident_id): Path<i64>,
    AppJson(dto): AppJson<PartyInput>,
) -> Result<(StatusCode, Json<ApiResponse<PartyResponseDto>>)> {
    dto.validate()?;

    let party = state
        .service
        .create(incident_id, state.party_type, dto)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(party), None, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/incidents/{incident_id}/{parties}/{id}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID"),
        ("parties" = String, Path, description = "`victims` or `suspects`"),
        ("id" = i64, Path, description = "Party ID")
    ),
    responses(
        (status = 200, description = "Party found", body = ApiResponse<PartyResponseDto>),
        (status = 404, description = "Party not found")
    ),
    tag = "parties",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_party(
    State(state): State<PartyRouteState>,
    Path((incident_id, id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<PartyResponseDto>>> {
    let party = state.service.get(incident_id, state.party_type, id).await?;
    Ok(Json(ApiResponse::success(Some(party), None, None)))
}

/// Partially update a victim or suspect. The party type never changes.
#[utoipa::path(
    patch,
    path = "/api/incidents/{incident_id}/{parties}/{id}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID"),
        ("parties" = String, Path, description = "`victims` or `suspects`"),
        ("id" = i64, Path, description = "Party ID")
    ),
    request_body = UpdatePartyDto,
    responses(
        (status = 200, description = "Party updated", body = ApiResponse<PartyResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Party not found")
    ),
    tag = "parties",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_party(
    State(state): State<PartyRouteState>,
    Path((incident_id, id)): Path<(i64, i64)>,
    AppJson(dto): AppJson<UpdatePartyDto>,
) -> Result<Json<ApiResponse<PartyResponseDto>>> {
    dto.validate()?;

    let party = state
        .service
        .update(incident_id, state.party_type, id, dto)
        .await?;
    Ok(Json(ApiResponse::success(Some(party), None, None)))
}

#[utoipa::path(
    delete,
    path = "/api/incidents/{incident_id}/{parties}/{id}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID"),
        ("parties" = String, Path, description = "`victims` or `suspects`"),
        ("id" = i64, Path, description = "Party ID")
    ),
    responses(
        (status = 204, description = "Party deleted"),
        (status = 404, description = "Party not found")
    ),
    tag = "parties",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_party(
    State(state): State<PartyRouteState>,
    Path((incident_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    state
        .service
        .delete(incident_id, state.party_type, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
