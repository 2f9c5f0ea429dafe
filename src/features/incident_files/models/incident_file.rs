use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct IncidentFile {
    pub id: i64,
    pub incident_id: i64,
    /// Relative to the media root: `<incident_number>/<filename>`
    pub file_path: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub uploaded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl IncidentFile {
    pub const COLUMNS: &'static str = "id, incident_id, file_path, original_filename, \
        content_type, file_size, uploaded_by, created_at";

    /// Name of the stored file, without its directory
    pub fn stored_name(&self) -> &str {
        self.file_path
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name() {
        let file = IncidentFile {
            id: 1,
            incident_id: 1,
            file_path: "2024-001/scene_ab12cd3.jpg".to_string(),
            original_filename: "scene.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            file_size: 10,
            uploaded_by: None,
            created_at: Utc::now(),
        };
        assert_eq!(file.stored_name(), "scene_ab12cd3.jpg");
    }
}
