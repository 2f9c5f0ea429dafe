use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity attached to every request that passed the bearer-token check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    /// Officer record linked to the user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officer_id: Option<i64>,
}

/// JWT payload for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer_id: Option<i64>,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
    /// Issue time of the first token in a refresh chain
    pub orig_iat: u64,
}

impl Claims {
    pub fn to_user(&self) -> Option<AuthenticatedUser> {
        Some(AuthenticatedUser {
            user_id: self.sub.parse().ok()?,
            username: self.username.clone(),
            officer_id: self.officer_id,
        })
    }
}

/// Row used to authenticate a login attempt
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub officer_id: Option<i64>,
}
