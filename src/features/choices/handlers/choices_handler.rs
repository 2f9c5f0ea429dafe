use axum::Json;

use crate::features::choices::dtos::ChoicesResponseDto;
use crate::shared::types::ApiResponse;

/// Choice lists for shifts, party types, sex, race, NCIC colours and states
#[utoipa::path(
    get,
    path = "/api/choices",
    responses(
        (status = 200, description = "All choice lists", body = ApiResponse<ChoicesResponseDto>)
    ),
    tag = "choices"
)]
pub async fn get_choices() -> Json<ApiResponse<ChoicesResponseDto>> {
    Json(ApiResponse::success(Some(ChoicesResponseDto::build()), None, None))
}
