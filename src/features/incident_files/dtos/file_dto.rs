use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::incident_files::models::IncidentFile;

/// Multipart upload form, for the OpenAPI document only. The handler reads
/// the body with axum's `Multipart` extractor and accepts the parts named
/// `files`, `file` or `uploadFile`, each possibly repeated.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadIncidentFilesDto {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IncidentFileDto {
    pub id: i64,
    pub incident: i64,
    /// Stored file name, unique within the incident
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    /// Bytes
    pub file_size: i64,
    pub uploaded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<IncidentFile> for IncidentFileDto {
    fn from(file: IncidentFile) -> Self {
        Self {
            id: file.id,
            incident: file.incident_id,
            filename: file.stored_name().to_string(),
            original_filename: file.original_filename,
            content_type: file.content_type,
            file_size: file.file_size,
            uploaded_by: file.uploaded_by,
            created_at: file.created_at,
        }
    }
}

/// One file read from an upload request
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}
