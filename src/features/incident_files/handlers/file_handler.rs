use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::incident_files::dtos::{
    IncidentFileDto, UploadIncidentFilesDto, UploadedFile,
};
use crate::features::incident_files::services::IncidentFileService;
use crate::shared::types::{ApiResponse, Meta};

/// Multipart part names that carry files
const FILE_FIELDS: [&str; 3] = ["files", "file", "uploadFile"];

/// `attachment` disposition that survives non-ASCII names
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[utoipa::path(
    get,
    path = "/api/incidents/{incident_id}/files",
    params(
        ("incident_id" = i64, Path, description = "Incident ID")
    ),
    responses(
        (status = 200, description = "Files attached to the incident", body = ApiResponse<Vec<IncidentFileDto>>),
        (status = 404, description = "Incident not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    State(service): State<Arc<IncidentFileService>>,
    Path(incident_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<IncidentFileDto>>>> {
    let files = service.list(incident_id).await?;
    let total = files.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Upload one or more files to an incident
///
/// Accepts multipart/form-data; every part named `files`, `file` or
/// `uploadFile` is stored. Other parts are ignored.
#[utoipa::path(
    post,
    path = "/api/incidents/{incident_id}/files",
    params(
        ("incident_id" = i64, Path, description = "Incident ID")
    ),
    request_body(
        content = UploadIncidentFilesDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Files stored", body = ApiResponse<Vec<IncidentFileDto>>),
        (status = 400, description = "No file or file too large"),
        (status = 404, description = "Incident not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_files(
    user: AuthenticatedUser,
    State(service): State<Arc<IncidentFileService>>,
    Path(incident_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<IncidentFileDto>>>)> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if !FILE_FIELDS.contains(&field_name.as_str()) {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        files.push(UploadedFile {
            filename,
            content_type,
            data: data.to_vec(),
        });
    }

    let saved = service.upload(incident_id, files, user.user_id).await?;
    let total = saved.len() as i64;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(saved),
            None,
            Some(Meta { total }),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/incidents/{incident_id}/files/{id}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID"),
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = ApiResponse<IncidentFileDto>),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    State(service): State<Arc<IncidentFileService>>,
    Path((incident_id, id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<IncidentFileDto>>> {
    let file = service.get(incident_id, id).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// Download the raw file
#[utoipa::path(
    get,
    path = "/api/incidents/{incident_id}/files/{id}/download",
    params(
        ("incident_id" = i64, Path, description = "Incident ID"),
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    State(service): State<Arc<IncidentFileService>>,
    Path((incident_id, id)): Path<(i64, i64)>,
) -> Result<Response> {
    let (file, data) = service.download(incident_id, id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&file.original_filename),
            ),
        ],
        data,
    )
        .into_response())
}

/// Delete the file and its record
#[utoipa::path(
    delete,
    path = "/api/incidents/{incident_id}/files/{id}",
    params(
        ("incident_id" = i64, Path, description = "Incident ID"),
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(service): State<Arc<IncidentFileService>>,
    Path((incident_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    service.delete(incident_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("scene 1.jpg"),
            "attachment; filename=\"scene 1.jpg\"; filename*=UTF-8''scene%201.jpg"
        );
        assert_eq!(
            content_disposition("café.pdf"),
            "attachment; filename=\"caf_.pdf\"; filename*=UTF-8''caf%C3%A9.pdf"
        );
    }
}
