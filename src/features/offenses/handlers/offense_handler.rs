use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::offenses::dtos::{CreateOffenseDto, ListOffensesQuery, UpdateOffenseDto};
use crate::features::offenses::models::Offense;
use crate::features::offenses::services::OffenseService;
use crate::shared::types::{ApiResponse, Meta};

/// List offense codes
#[utoipa::path(
    get,
    path = "/api/offenses",
    params(ListOffensesQuery),
    responses(
        (status = 200, description = "Page of offenses", body = ApiResponse<Vec<Offense>>)
    ),
    tag = "offenses",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_offenses(
    State(service): State<Arc<OffenseService>>,
    Query(query): Query<ListOffensesQuery>,
) -> Result<Json<ApiResponse<Vec<Offense>>>> {
    let (offenses, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(offenses),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    post,
    path = "/api/offenses",
    request_body = CreateOffenseDto,
    responses(
        (status = 201, description = "Offense created", body = ApiResponse<Offense>),
        (status = 400, description = "Validation error")
    ),
    tag = "offenses",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_offense(
    State(service): State<Arc<OffenseService>>,
    AppJson(dto): AppJson<CreateOffenseDto>,
) -> Result<(StatusCode, Json<ApiResponse<Offense>>)> {
    dto.validate()?;

    let offense = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(offense), None, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/offenses/{id}",
    params(
        ("id" = i64, Path, description = "Offense ID")
    ),
    responses(
        (status = 200, description = "Offense found", body = ApiResponse<Offense>),
        (status = 404, description = "Offense not found")
    ),
    tag = "offenses",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_offense(
    State(service): State<Arc<OffenseService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Offense>>> {
    let offense = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(offense), None, None)))
}

#[utoipa::path(
    patch,
    path = "/api/offenses/{id}",
    params(
        ("id" = i64, Path, description = "Offense ID")
    ),
    request_body = UpdateOffenseDto,
    responses(
        (status = 200, description = "Offense updated", body = ApiResponse<Offense>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Offense not found")
    ),
    tag = "offenses",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_offense(
    State(service): State<Arc<OffenseService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateOffenseDto>,
) -> Result<Json<ApiResponse<Offense>>> {
    dto.validate()?;

    let offense = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(offense), None, None)))
}

#[utoipa::path(
    delete,
    path = "/api/offenses/{id}",
    params(
        ("id" = i64, Path, description = "Offense ID")
    ),
    responses(
        (status = 204, description = "Offense deleted"),
        (status = 404, description = "Offense not found")
    ),
    tag = "offenses",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_offense(
    State(service): State<Arc<OffenseService>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
