use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::officers::dtos::{
    CreateOfficerDto, ListOfficersQuery, OfficerResponseDto, UpdateOfficerDto,
};
use crate::features::officers::services::OfficerService;
use crate::shared::types::{ApiResponse, Meta};

/// List officers
#[utoipa::path(
    get,
    path = "/api/officers",
    params(ListOfficersQuery),
    responses(
        (status = 200, description = "Page of officers", body = ApiResponse<Vec<OfficerResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "officers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_officers(
    State(service): State<Arc<OfficerService>>,
    Query(query): Query<ListOfficersQuery>,
) -> Result<Json<ApiResponse<Vec<OfficerResponseDto>>>> {
    let (officers, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(officers),
        None,
        Some(Meta { total }),
    )))
}

/// Create an officer together with its user account
#[utoipa::path(
    post,
    path = "/api/officers",
    request_body = CreateOfficerDto,
    responses(
        (status = 201, description = "Officer created", body = ApiResponse<OfficerResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Officer number or username already taken")
    ),
    tag = "officers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_officer(
    State(service): State<Arc<OfficerService>>,
    AppJson(dto): AppJson<CreateOfficerDto>,
) -> Result<(StatusCode, Json<ApiResponse<OfficerResponseDto>>)> {
    dto.validate()?;

    let officer = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(officer), None, None)),
    ))
}

/// Get an officer
#[utoipa::path(
    get,
    path = "/api/officers/{id}",
    params(
        ("id" = i64, Path, description = "Officer ID")
    ),
    responses(
        (status = 200, description = "Officer found", body = ApiResponse<OfficerResponseDto>),
        (status = 404, description = "Officer not found")
    ),
    tag = "officers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_officer(
    State(service): State<Arc<OfficerService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OfficerResponseDto>>> {
    let officer = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(officer), None, None)))
}

/// Partially update an officer
#[utoipa::path(
    patch,
    path = "/api/officers/{id}",
    params(
        ("id" = i64, Path, description = "Officer ID")
    ),
    request_body = UpdateOfficerDto,
    responses(
        (status = 200, description = "Officer updated", body = ApiResponse<OfficerResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Officer not found"),
        (status = 409, description = "Officer number already taken")
    ),
    tag = "officers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_officer(
    State(service): State<Arc<OfficerService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateOfficerDto>,
) -> Result<Json<ApiResponse<OfficerResponseDto>>> {
    dto.validate()?;

    let officer = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(officer), None, None)))
}

/// Delete an officer and its user account
#[utoipa::path(
    delete,
    path = "/api/officers/{id}",
    params(
        ("id" = i64, Path, description = "Officer ID")
    ),
    responses(
        (status = 204, description = "Officer deleted"),
        (status = 404, description = "Officer not found"),
        (status = 409, description = "Officer is named on incidents")
    ),
    tag = "officers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_officer(
    State(service): State<Arc<OfficerService>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
