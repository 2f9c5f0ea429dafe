use std::sync::Arc;

use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::incident_files::dtos::{IncidentFileDto, UploadedFile};
use crate::features::incident_files::models::IncidentFile;
use crate::modules::storage::FileStorage;

/// Attachments of an incident, oldest first
pub(crate) async fn load_for_incident(pool: &PgPool, incident_id: i64) -> Result<Vec<IncidentFileDto>> {
    let sql = format!(
        "SELECT {} FROM incident_files WHERE incident_id = $1 ORDER BY created_at, id",
        IncidentFile::COLUMNS
    );
    let files = sqlx::query_as::<_, IncidentFile>(&sql)
        .bind(incident_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list incident files: {:?}", e);
            AppError::Database(e)
        })?;

    Ok(files.into_iter().map(Into::into).collect())
}

/// Point the file rows of a renumbered incident at its new directory
pub(crate) async fn move_paths(
    conn: &mut PgConnection,
    incident_id: i64,
    from: &str,
    to: &str,
) -> Result<u64> {
    let from = format!("{}/", from);
    let to = format!("{}/", to);
    let result = sqlx::query(
        r#"
        UPDATE incident_files
        SET file_path = $1 || substr(file_path, char_length($2) + 1)
        WHERE incident_id = $3 AND left(file_path, char_length($2)) = $2
        "#,
    )
    .bind(&to)
    .bind(&from)
    .bind(incident_id)
    .execute(conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to move incident file paths: {:?}", e);
        AppError::Database(e)
    })?;

    Ok(result.rows_affected())
}

/// Service for incident attachments: rows in `incident_files`, bytes in storage
pub struct IncidentFileService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
    max_upload_size: usize,
}

impl IncidentFileService {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>, max_upload_size: usize) -> Self {
        Self {
            pool,
            storage,
            max_upload_size,
        }
    }

    async fn incident_number(&self, incident_id: i64) -> Result<String> {
        sqlx::query_scalar("SELECT incident_number FROM incidents WHERE id = $1")
            .bind(incident_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get incident: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", incident_id)))
    }

    async fn find(&self, incident_id: i64, id: i64) -> Result<IncidentFile> {
        let sql = format!(
            "SELECT {} FROM incident_files WHERE id = $1 AND incident_id = $2",
            IncidentFile::COLUMNS
        );
        sqlx::query_as::<_, IncidentFile>(&sql)
            .bind(id)
            .bind(incident_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get incident file: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))
    }

    pub async fn list(&self, incident_id: i64) -> Result<Vec<IncidentFileDto>> {
        self.incident_number(incident_id).await?;
        load_for_incident(&self.pool, incident_id).await
    }

    pub async fn get(&self, incident_id: i64, id: i64) -> Result<IncidentFileDto> {
        Ok(self.find(incident_id, id).await?.into())
    }

    /// Store every uploaded file under the incident's directory and record it.
    /// Either every file is kept or none is.
    pub async fn upload(
        &self,
        incident_id: i64,
        files: Vec<UploadedFile>,
        uploaded_by: i64,
    ) -> Result<Vec<IncidentFileDto>> {
        if files.is_empty() {
            return Err(AppError::BadRequest("No files were uploaded".to_string()));
        }
        if let Some(file) = files.iter().find(|f| f.data.len() > self.max_upload_size) {
            return Err(AppError::BadRequest(format!(
                "File '{}' is too large. Maximum size is {} bytes",
                file.filename, self.max_upload_size
            )));
        }

        let incident_number = self.incident_number(incident_id).await?;
        let mut stored = Vec::with_capacity(files.len());

        match self
            .store_all(incident_id, &incident_number, files, uploaded_by, &mut stored)
            .await
        {
            Ok(saved) => Ok(saved),
            Err(e) => {
                for path in &stored {
                    if let Err(cleanup) = self.storage.delete(path).await {
                        warn!("Could not remove orphaned file {}: {}", path, cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    /// Save the bytes and insert the rows in one transaction. Paths written to
    /// storage are pushed to `stored` as they land.
    async fn store_all(
        &self,
        incident_id: i64,
        incident_number: &str,
        files: Vec<UploadedFile>,
        uploaded_by: i64,
        stored: &mut Vec<String>,
    ) -> Result<Vec<IncidentFileDto>> {
        let sql = format!(
            r#"
            INSERT INTO incident_files
                (incident_id, file_path, original_filename, content_type, file_size, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            IncidentFile::COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(files.len());

        for file in files {
            let path = self
                .storage
                .save(incident_number, &file.filename, &file.data)
                .await?;
            stored.push(path.clone());

            let row = sqlx::query_as::<_, IncidentFile>(&sql)
                .bind(incident_id)
                .bind(&path)
                .bind(&file.filename)
                .bind(&file.content_type)
                .bind(file.data.len() as i64)
                .bind(uploaded_by)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to record incident file: {:?}", e);
                    AppError::Database(e)
                })?;
            saved.push(row);
        }

        tx.commit().await?;

        for row in &saved {
            info!(
                "File stored: id={}, path={}, size={}",
                row.id, row.file_path, row.file_size
            );
        }
        Ok(saved.into_iter().map(Into::into).collect())
    }

    /// File row plus its bytes
    pub async fn download(&self, incident_id: i64, id: i64) -> Result<(IncidentFile, Vec<u8>)> {
        let file = self.find(incident_id, id).await?;
        let data = self.storage.open(&file.file_path).await?;
        Ok((file, data))
    }

    /// Delete the row and the file on disk
    pub async fn delete(&self, incident_id: i64, id: i64) -> Result<()> {
        let file = self.find(incident_id, id).await?;

        sqlx::query("DELETE FROM incident_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete incident file: {:?}", e);
                AppError::Database(e)
            })?;

        self.storage.delete(&file.file_path).await?;
        info!("File {} deleted from incident {}", file.file_path, incident_id);
        Ok(())
    }
}
