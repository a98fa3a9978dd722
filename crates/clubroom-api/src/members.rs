use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use clubroom_db::models::MemberPatch;
use clubroom_types::api::{Claims, MemberModify};

use crate::auth::{
    AppState, current_member, hash_password, member_response, password_is_acceptable,
    require_board,
};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_page_limit")]
    pub limit: u32,
}

pub fn default_page_limit() -> u32 {
    100
}

/// GET /members — board only.
pub async fn list_members(
    State(state): State<AppState>,
    Query(page): Query<Page>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let accessor = current_member(&state, &claims).await?;
    require_board(&accessor)?;

    let members = state
        .run_db(move |db| db.list_members(page.skip, page.limit))
        .await?;
    let members: Vec<_> = members.into_iter().map(member_response).collect();
    Ok(Json(members))
}

/// GET /members/{student_id} — board only.
pub async fn get_member(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let accessor = current_member(&state, &claims).await?;
    require_board(&accessor)?;

    let member = state
        .run_db(move |db| db.get_member(&student_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("no such member".into()))?;
    Ok(Json(member_response(member)))
}

/// GET /me
pub async fn get_myself(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let me = current_member(&state, &claims).await?;
    Ok(Json(member_response(me)))
}

/// PATCH /members/{student_id} — self or board; changing `role` is board
/// only. A new password is validated and hashed here, never stored raw.
pub async fn update_member(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(modify): Json<MemberModify>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = current_member(&state, &claims).await?;
    if actor.student_id != student_id && !actor.role.is_board() {
        return Err(ApiError::Forbidden);
    }
    if modify.role.is_some() && !actor.role.is_board() {
        return Err(ApiError::Forbidden);
    }

    let password_hash = match &modify.password {
        Some(password) if !password_is_acceptable(password) => {
            return Err(ApiError::Validation("password does not meet the policy".into()));
        }
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let patch = MemberPatch {
        real_name: modify.real_name,
        username: modify.username,
        password_hash,
        role: modify.role,
    };

    let updated = state
        .run_db(move |db| db.update_member(&student_id, &patch))
        .await?
        .ok_or_else(|| ApiError::NotFound("no such member".into()))?;
    Ok(Json(member_response(updated)))
}

/// DELETE /members/{student_id} — self or board.
pub async fn delete_member(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = current_member(&state, &claims).await?;
    if actor.student_id != student_id && !actor.role.is_board() {
        return Err(ApiError::Forbidden);
    }

    let deleter = actor.student_id.clone();
    let deleted = state
        .run_db(move |db| db.delete_member(&student_id))
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("no such member".into()));
    }

    info!("member deleted by {}", deleter);
    Ok(StatusCode::NO_CONTENT)
}
