use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOffenseDto {
    #[validate(length(min = 1, max = 8, message = "GCIC code must be 1-8 characters"))]
    pub gcic_code: String,

    #[validate(length(min = 1, max = 8, message = "UCR code must be 1-8 characters"))]
    pub ucr_code: String,

    pub ucr_rank: Option<i32>,

    #[validate(length(max = 4, message = "Code group must be at most 4 characters"))]
    pub code_group: Option<String>,

    #[serde(default)]
    #[validate(length(max = 10, message = "UCR alpha must be at most 10 characters"))]
    pub ucr_alpha: String,

    #[serde(default)]
    pub ucr_name_classification: String,

    #[serde(default)]
    pub ucr_subclass_description: String,
}

/// Partial update; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateOffenseDto {
    #[validate(length(min = 1, max = 8, message = "GCIC code must be 1-8 characters"))]
    pub gcic_code: Option<String>,

    #[validate(length(min = 1, max = 8, message = "UCR code must be 1-8 characters"))]
    pub ucr_code: Option<String>,

    pub ucr_rank: Option<i32>,

    #[validate(length(max = 4, message = "Code group must be at most 4 characters"))]
    pub code_group: Option<String>,

    #[validate(length(max = 10, message = "UCR alpha must be at most 10 characters"))]
    pub ucr_alpha: Option<String>,

    pub ucr_name_classification: Option<String>,

    pub ucr_subclass_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListOffensesQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// Case-insensitive match on codes and descriptions
    pub q: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    crate::shared::constants::DEFAULT_PAGE_SIZE
}
