use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// GCIC/UCR offense code
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Offense {
    pub id: i64,
    pub gcic_code: String,
    pub ucr_code: String,
    pub ucr_rank: Option<i32>,
    pub code_group: Option<String>,
    pub ucr_alpha: String,
    pub ucr_name_classification: String,
    pub ucr_subclass_description: String,
}

impl Offense {
    pub const COLUMNS: &'static str = "id, gcic_code, ucr_code, ucr_rank, code_group, ucr_alpha, \
        ucr_name_classification, ucr_subclass_description";

    /// Short label used on printed reports, e.g. `16-8-2 BURGLARY`
    pub fn label(&self) -> String {
        let description = if self.ucr_subclass_description.is_empty() {
            &self.ucr_name_classification
        } else {
            &self.ucr_subclass_description
        };
        format!("{} {}", self.gcic_code, description).trim().to_string()
    }
}
