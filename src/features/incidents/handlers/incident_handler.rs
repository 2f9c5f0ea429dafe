use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, FormPairs, QueryPairs};
use crate::features::incidents::dtos::{
    CreateIncidentDto, IncidentDetailDto, IncidentSummaryDto, UpdateIncidentDto,
};
use crate::features::incidents::forms::{flatten_incident, form_fields, IncidentForm};
use crate::features::incidents::printing::render_incident_report;
use crate::features::incidents::services::IncidentService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List incidents, newest report first
#[utoipa::path(
    get,
    path = "/api/incidents",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of incidents", body = ApiResponse<Vec<IncidentSummaryDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_incidents(
    State(service): State<Arc<IncidentService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<IncidentSummaryDto>>>> {
    let (incidents, total) = service.list(&pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(incidents),
        None,
        Some(Meta { total }),
    )))
}

/// Create an incident with its offenses, victims and suspects
#[utoipa::path(
    post,
    path = "/api/incidents",
    request_body = CreateIncidentDto,
    responses(
        (status = 201, description = "Incident created", body = ApiResponse<IncidentDetailDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Incident number already exists")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_incident(
    State(service): State<Arc<IncidentService>>,
    AppJson(dto): AppJson<CreateIncidentDto>,
) -> Result<(StatusCode, Json<ApiResponse<IncidentDetailDto>>)> {
    dto.validate()?;

    let incident = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(incident), None, None)),
    ))
}

/// Search incidents
///
/// Any incident column can be filtered by name. `<field>_min`/`min_<field>`
/// and `<field>_max`/`max_<field>` give ranges, `offenses` may repeat, officer
/// roles match on last name, and `victim_<field>`/`suspect_<field>` filter
/// parties (`victim_min_date_of_birth` for ranges). `page` and `page_size` paginate.
#[utoipa::path(
    get,
    path = "/api/incidents/search",
    params(
        ("incident_number" = Option<String>, Query, description = "Case-insensitive substring"),
        ("earliest_occurrence_datetime" = Option<String>, Query, description = "Occurred on or after"),
        ("latest_occurrence_datetime" = Option<String>, Query, description = "Occurred on or before"),
        ("offenses" = Option<Vec<i64>>, Query, description = "Offense IDs, any of"),
        ("reporting_officer" = Option<String>, Query, description = "Reporting officer last name"),
        ("victim_last_name" = Option<String>, Query, description = "Victim last name"),
        ("suspect_juvenile" = Option<bool>, Query, description = "Juvenile suspect"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Matching incidents", body = ApiResponse<Vec<IncidentSummaryDto>>),
        (status = 400, description = "Unparseable filter value")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn search_incidents(
    State(service): State<Arc<IncidentService>>,
    QueryPairs(params): QueryPairs,
) -> Result<Json<ApiResponse<Vec<IncidentSummaryDto>>>> {
    let (incidents, total) = service.search(&params).await?;
    Ok(Json(ApiResponse::success(
        Some(incidents),
        None,
        Some(Meta { total }),
    )))
}

/// Create an incident from prefix-encoded form data
///
/// Victims and suspects are sent as `victims-0-last_name`, `suspects-1-sex`
/// and so on, with their addresses split into `..._street_number`, `..._route`,
/// `..._city`, `..._state` and `..._postal_code`.
#[utoipa::path(
    post,
    path = "/api/incidents/form",
    request_body(
        content = String,
        content_type = "application/x-www-form-urlencoded",
        description = "Flat incident form"
    ),
    responses(
        (status = 201, description = "Incident created", body = ApiResponse<IncidentDetailDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Incident number already exists")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_incident_from_form(
    State(service): State<Arc<IncidentService>>,
    FormPairs(pairs): FormPairs,
) -> Result<(StatusCode, Json<ApiResponse<IncidentDetailDto>>)> {
    let dto = IncidentForm::from_pairs(&pairs)?;
    dto.validate()?;

    let incident = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(incident), None, None)),
    ))
}

/// Get an incident with everything attached to it
#[utoipa::path(
    get,
    path = "/api/incidents/{incident_id}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID")
    ),
    responses(
        (status = 200, description = "Incident found", body = ApiResponse<IncidentDetailDto>),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_incident(
    State(service): State<Arc<IncidentService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<IncidentDetailDto>>> {
    let incident = service.get_detail(id).await?;
    Ok(Json(ApiResponse::success(Some(incident), None, None)))
}

/// Initial form data for editing an incident
///
/// Repeated keys are joined with `,` (`"offenses": "3,5"`).
#[utoipa::path(
    get,
    path = "/api/incidents/{incident_id}/form",
    params(
        ("incident_id" = i64, Path, description = "Incident ID")
    ),
    responses(
        (status = 200, description = "Flattened form fields", body = ApiResponse<BTreeMap<String, String>>),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_incident_form(
    State(service): State<Arc<IncidentService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BTreeMap<String, String>>>> {
    let incident = service.get_detail(id).await?;
    let fields = form_fields(flatten_incident(&incident));
    Ok(Json(ApiResponse::success(Some(fields), None, None)))
}

/// Partially update an incident
#[utoipa::path(
    patch,
    path = "/api/incidents/{incident_id}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID")
    ),
    request_body = UpdateIncidentDto,
    responses(
        (status = 200, description = "Incident updated", body = ApiResponse<IncidentDetailDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Incident not found"),
        (status = 409, description = "Incident number already exists")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_incident(
    State(service): State<Arc<IncidentService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateIncidentDto>,
) -> Result<Json<ApiResponse<IncidentDetailDto>>> {
    dto.validate()?;

    let incident = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(incident), None, None)))
}

/// Delete an incident, its parties and its files
#[utoipa::path(
    delete,
    path = "/api/incidents/{incident_id}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID")
    ),
    responses(
        (status = 204, description = "Incident deleted"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_incident(
    State(service): State<Arc<IncidentService>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Date stamped on printed reports, taken in UTC
fn print_date(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// Printable PDF report of an incident
#[utoipa::path(
    get,
    path = "/api/incidents/print/{id}",
    params(
        ("id" = i64, Path, description = "Incident ID")
    ),
    responses(
        (status = 200, description = "Incident report", content_type = "application/pdf"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn print_incident(
    State(service): State<Arc<IncidentService>>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let incident = service.get_detail(id).await?;
    let filename = format!("incident-{}.pdf", incident.incident_number);
    let today = print_date(Utc::now());

    let pdf = tokio::task::spawn_blocking(move || render_incident_report(&incident, today))
        .await
        .map_err(|e| AppError::Internal(format!("PDF task failed: {}", e)))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", filename),
            ),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_print_date_is_the_utc_day() {
        let late_evening_in_atlanta = Utc.with_ymd_and_hms(2024, 3, 2, 2, 30, 0).unwrap();
        assert_eq!(
            print_date(late_evening_in_atlanta),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }
}
