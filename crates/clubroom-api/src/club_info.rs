use axum::{Extension, Json, extract::State, response::IntoResponse};

use clubroom_types::api::Claims;
use clubroom_types::domain::ClubInformation;

use crate::auth::{AppState, current_member, require_board};
use crate::error::ApiError;

/// GET /club-information
pub async fn get_club_information(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let info = state.run_db(|db| db.get_club_information()).await?;
    Ok(Json(info))
}

/// PUT /club-information — board only, always a total overwrite. Unknown
/// input keys are dropped by deserialization into the fixed schema.
pub async fn update_club_information(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(info): Json<ClubInformation>,
) -> Result<impl IntoResponse, ApiError> {
    let modifier = current_member(&state, &claims).await?;
    require_board(&modifier)?;

    let updated = state
        .run_db(move |db| db.update_club_information(&info))
        .await?;
    Ok(Json(updated))
}
