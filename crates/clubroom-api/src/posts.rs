use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use clubroom_db::models::{PostDraft, PostOutlineRow, PostRow};
use clubroom_types::api::{Claims, PostCreate, PostOutline, PostResponse, UploadedFileInfo};
use clubroom_types::domain::{PostKind, PostRef};

use crate::auth::{AppState, current_member, require_board};
use crate::error::ApiError;
use crate::members::Page;

fn outline(row: PostOutlineRow) -> PostOutline {
    PostOutline {
        no: row.no,
        title: row.title,
        author: row.author,
        published: row.published,
    }
}

fn response(row: PostRow) -> PostResponse {
    PostResponse {
        no: row.no,
        title: row.title,
        author: row.author,
        content: row.content,
        published: row.published,
        modifier: row.modifier,
        modified: row.modified,
        attached: row
            .attached
            .into_iter()
            .map(|a| UploadedFileInfo {
                id: a.id,
                name: a.name,
                content_type: a.content_type,
            })
            .collect(),
    }
}

fn draft(post: PostCreate) -> PostDraft {
    PostDraft {
        title: post.title,
        content: post.content,
        attached: post.attached,
    }
}

// -- Singleton pages (about, rules) --

async fn get_singleton(state: AppState, kind: PostKind) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .run_db(move |db| db.get_post(PostRef::Singleton(kind)))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no {} page yet", kind.as_str())))?;
    Ok(Json(response(post)))
}

/// PUT on a singleton page is create-or-replace: the previous row (if any)
/// is dropped and the modifier becomes the author of the fresh row.
async fn put_singleton(
    state: AppState,
    kind: PostKind,
    claims: Claims,
    post: PostCreate,
) -> Result<Json<PostResponse>, ApiError> {
    let modifier = current_member(&state, &claims).await?;
    require_board(&modifier)?;

    let draft = draft(post);
    let name = modifier.real_name;
    let replaced = state
        .run_db(move |db| db.replace_singleton_post(kind, &name, &draft))
        .await?;
    Ok(Json(response(replaced)))
}

pub async fn get_about(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    get_singleton(state, PostKind::About).await
}

pub async fn put_about(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(post): Json<PostCreate>,
) -> Result<impl IntoResponse, ApiError> {
    put_singleton(state, PostKind::About, claims, post).await
}

pub async fn get_rules(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    get_singleton(state, PostKind::Rules).await
}

pub async fn put_rules(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(post): Json<PostCreate>,
) -> Result<impl IntoResponse, ApiError> {
    put_singleton(state, PostKind::Rules, claims, post).await
}

// -- Notices --

pub async fn list_notices(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .run_db(move |db| db.list_posts(PostKind::Notice, page.skip, page.limit))
        .await?;
    let outlines: Vec<_> = rows.into_iter().map(outline).collect();
    Ok(Json(outlines))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    pub limit: u32,
}

fn default_recent_limit() -> u32 {
    4
}

/// GET /recent-notices — the front page strip.
pub async fn recent_notices(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .run_db(move |db| db.list_posts(PostKind::Notice, 0, query.limit))
        .await?;
    let outlines: Vec<_> = rows.into_iter().map(outline).collect();
    Ok(Json(outlines))
}

pub async fn get_notice(
    State(state): State<AppState>,
    Path(no): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .run_db(move |db| db.get_post(PostRef::Numbered(no)))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no notice #{}", no)))?;
    Ok(Json(response(post)))
}

pub async fn create_notice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(post): Json<PostCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let author = current_member(&state, &claims).await?;
    require_board(&author)?;

    let draft = draft(post);
    let name = author.real_name;
    let created = state
        .run_db(move |db| db.create_post(PostKind::Notice, &name, &draft))
        .await?;
    Ok((StatusCode::CREATED, Json(response(created))))
}

pub async fn update_notice(
    State(state): State<AppState>,
    Path(no): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(post): Json<PostCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let modifier = current_member(&state, &claims).await?;
    require_board(&modifier)?;

    let draft = draft(post);
    let name = modifier.real_name;
    let updated = state
        .run_db(move |db| db.update_numbered_post(no, &name, &draft))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no notice #{}", no)))?;
    Ok(Json(response(updated)))
}

pub async fn delete_notice(
    State(state): State<AppState>,
    Path(no): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let deleter = current_member(&state, &claims).await?;
    require_board(&deleter)?;

    let deleted = state
        .run_db(move |db| db.delete_post(PostKind::Notice, no))
        .await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("no notice #{}", no)));
    }
    Ok(StatusCode::NO_CONTENT)
}
