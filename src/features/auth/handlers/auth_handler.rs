use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    MeResponseDto, RefreshTokenRequestDto, TokenRequestDto, TokenResponseDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

/// Obtain an access token with username and password
#[utoipa::path(
    post,
    path = "/api/auth/token",
    request_body = TokenRequestDto,
    responses(
        (status = 200, description = "Token issued", body = ApiResponse<TokenResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn obtain_token(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<TokenRequestDto>,
) -> Result<Json<ApiResponse<TokenResponseDto>>> {
    dto.validate()?;

    let token = service.obtain_token(dto).await?;
    Ok(Json(ApiResponse::success(Some(token), None, None)))
}

/// Exchange a still-valid token for a fresh one
#[utoipa::path(
    post,
    path = "/api/auth/token/refresh",
    request_body = RefreshTokenRequestDto,
    responses(
        (status = 200, description = "Token refreshed", body = ApiResponse<TokenResponseDto>),
        (status = 401, description = "Invalid or expired token")
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RefreshTokenRequestDto>,
) -> Result<Json<ApiResponse<TokenResponseDto>>> {
    dto.validate()?;

    let token = service.refresh_token(dto)?;
    Ok(Json(ApiResponse::success(Some(token), None, None)))
}

/// Get current authenticated user info
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<MeResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<MeResponseDto>>> {
    let me = service.get_current_user(user).await?;
    Ok(Json(ApiResponse::success(Some(me), None, None)))
}
