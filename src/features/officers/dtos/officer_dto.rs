use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::officers::models::Officer;
use crate::shared::validation::USERNAME_REGEX;

/// User account created together with an officer
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOfficerUserDto {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may contain only letters, digits and @/./+/-/_"
        )
    )]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOfficerDto {
    #[validate(nested)]
    pub user: CreateOfficerUserDto,

    #[validate(range(min = 1, message = "Officer number must be positive"))]
    pub officer_number: i32,

    /// Supervising officer id
    pub supervisor: Option<i64>,
}

/// Partial update; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateOfficerDto {
    #[validate(range(min = 1, message = "Officer number must be positive"))]
    pub officer_number: Option<i32>,

    pub supervisor: Option<i64>,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficerUserDto {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficerResponseDto {
    pub id: i64,
    pub officer_number: i32,
    pub supervisor: Option<i64>,
    pub user: OfficerUserDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Officer> for OfficerResponseDto {
    fn from(o: Officer) -> Self {
        Self {
            id: o.id,
            officer_number: o.officer_number,
            supervisor: o.supervisor_id,
            user: OfficerUserDto {
                id: o.user_id,
                username: o.username,
                first_name: o.first_name,
                last_name: o.last_name,
                email: o.email,
                is_active: o.is_active,
            },
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListOfficersQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// Case-insensitive match on first or last name
    pub name: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    crate::shared::constants::DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_officer_validation() {
        let dto: CreateOfficerDto = serde_json::from_value(json!({
            "user": {"username": "bad name", "password": "short"},
            "officer_number": 0
        }))
        .unwrap();

        let err: crate::core::error::AppError = dto.validate().unwrap_err().into();
        let message = err.to_string();
        assert!(message.contains("officer_number"));
        assert!(message.contains("user.username"));
        assert!(message.contains("user.password"));
    }

    #[test]
    fn test_valid_create_officer() {
        let dto: CreateOfficerDto = serde_json::from_value(json!({
            "user": {
                "username": "jdoe",
                "password": "long-enough",
                "first_name": "Jane",
                "last_name": "Doe",
                "email": "jdoe@example.gov"
            },
            "officer_number": 1138,
            "supervisor": 3
        }))
        .unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.supervisor, Some(3));
    }

    #[test]
    fn test_generated_names_validate() {
        use fake::faker::name::en::{FirstName, LastName};
        use fake::Fake;

        for number in 1..=20 {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let dto: CreateOfficerDto = serde_json::from_value(json!({
                "user": {
                    "username": format!("officer{}", number),
                    "password": "long-enough",
                    "first_name": first_name,
                    "last_name": last_name
                },
                "officer_number": number
            }))
            .unwrap();
            assert!(dto.validate().is_ok(), "{} {}", first_name, last_name);
        }
    }
}
