use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Officer joined with the user account it belongs to
#[derive(Debug, Clone, FromRow)]
pub struct Officer {
    pub id: i64,
    pub officer_number: i32,
    pub supervisor_id: Option<i64>,
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Officer {
    pub const SELECT: &'static str = r#"
        SELECT o.id, o.officer_number, o.supervisor_id,
               u.id AS user_id, u.username, u.first_name, u.last_name, u.email, u.is_active,
               o.created_at, o.updated_at
        FROM officers o
        JOIN users u ON u.id = o.user_id
    "#;

    /// "First Last", falling back to the username when both are blank
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}
