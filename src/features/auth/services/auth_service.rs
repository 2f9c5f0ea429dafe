use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    MeOfficerDto, MeResponseDto, RefreshTokenRequestDto, TokenRequestDto, TokenResponseDto,
};
use crate::features::auth::jwt::{IssuedToken, JwtService};
use crate::features::auth::model::{AuthenticatedUser, UserCredentials};
use crate::features::auth::password::verify_password;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

#[derive(Debug, FromRow)]
struct MeRow {
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    officer_id: Option<i64>,
    officer_number: Option<i32>,
    supervisor_id: Option<i64>,
}

/// Service for username/password login and token lifecycle
pub struct AuthService {
    pool: PgPool,
    jwt: Arc<JwtService>,
}

fn token_response(issued: IssuedToken) -> TokenResponseDto {
    TokenResponseDto {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtService>) -> Self {
        Self { pool, jwt }
    }

    /// Check credentials and issue an access token
    pub async fn obtain_token(&self, dto: TokenRequestDto) -> Result<TokenResponseDto> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT u.id, u.username, u.password_hash, u.is_active, o.id AS officer_id
            FROM users u
            LEFT JOIN officers o ON o.user_id = u.id
            WHERE u.username = $1
            ORDER BY o.id
            LIMIT 1
            "#,
        )
        .bind(&dto.username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user credentials: {:?}", e);
            AppError::Database(e)
        })?;

        // Same message for unknown user and wrong password
        let invalid =
            || AppError::Unauthorized("Unable to log in with provided credentials.".to_string());
        let credentials = credentials.ok_or_else(invalid)?;

        let password = dto.password;
        let hash = credentials.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check failed: {}", e)))?;
        if !verified {
            return Err(invalid());
        }

        if !credentials.is_active {
            return Err(AppError::Unauthorized(
                "User account is disabled.".to_string(),
            ));
        }

        let user = AuthenticatedUser {
            user_id: credentials.id,
            username: credentials.username,
            officer_id: credentials.officer_id,
        };

        tracing::info!("Issued token for user '{}'", user.username);
        Ok(token_response(self.jwt.issue(&user)?))
    }

    pub fn refresh_token(&self, dto: RefreshTokenRequestDto) -> Result<TokenResponseDto> {
        Ok(token_response(self.jwt.refresh(&dto.token)?))
    }

    pub async fn get_current_user(&self, user: AuthenticatedUser) -> Result<MeResponseDto> {
        let row = sqlx::query_as::<_, MeRow>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name, u.email,
                   o.id AS officer_id, o.officer_number, o.supervisor_id
            FROM users u
            LEFT JOIN officers o ON o.user_id = u.id
            WHERE u.id = $1 AND u.is_active = TRUE
            ORDER BY o.id
            LIMIT 1
            "#,
        )
        .bind(user.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load current user: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        let officer = match (row.officer_id, row.officer_number) {
            (Some(id), Some(officer_number)) => Some(MeOfficerDto {
                id,
                officer_number,
                supervisor_id: row.supervisor_id,
            }),
            _ => None,
        };

        Ok(MeResponseDto {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            officer,
        })
    }
}
