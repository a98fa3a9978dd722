use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;

use clubroom_db::models::{MagazineContentRow, MagazineRow};
use clubroom_types::api::{
    Claims, MagazineContentItem, MagazineCreate, MagazineOutline, MagazineResponse,
};

use crate::auth::{AppState, current_member, require_board};
use crate::error::ApiError;
use crate::members::Page;
use crate::posts::RecentQuery;

fn rows(magazine: &MagazineCreate) -> (MagazineRow, Vec<MagazineContentRow>) {
    let row = MagazineRow {
        published: magazine.published,
        year: magazine.year,
        cover: magazine.cover.clone(),
    };
    let contents = magazine
        .contents
        .iter()
        .map(|c| MagazineContentRow {
            kind: c.kind.clone(),
            title: c.title.clone(),
            author: c.author.clone(),
            language: c.language.clone(),
        })
        .collect();
    (row, contents)
}

fn response(magazine: MagazineRow, contents: Vec<MagazineContentRow>) -> MagazineResponse {
    MagazineResponse {
        published: magazine.published,
        year: magazine.year,
        cover: magazine.cover,
        contents: contents
            .into_iter()
            .map(|c| MagazineContentItem {
                kind: c.kind,
                title: c.title,
                author: c.author,
                language: c.language,
            })
            .collect(),
    }
}

pub async fn list_magazines(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<impl IntoResponse, ApiError> {
    let magazines = state
        .run_db(move |db| db.list_magazines(page.skip, page.limit))
        .await?;
    let outlines: Vec<_> = magazines
        .into_iter()
        .map(|m| MagazineOutline {
            published: m.published,
            year: m.year,
            cover: m.cover,
        })
        .collect();
    Ok(Json(outlines))
}

pub async fn recent_magazines(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let magazines = state
        .run_db(move |db| db.list_magazines(0, query.limit))
        .await?;
    let outlines: Vec<_> = magazines
        .into_iter()
        .map(|m| MagazineOutline {
            published: m.published,
            year: m.year,
            cover: m.cover,
        })
        .collect();
    Ok(Json(outlines))
}

pub async fn get_magazine(
    State(state): State<AppState>,
    Path(published): Path<NaiveDate>,
) -> Result<impl IntoResponse, ApiError> {
    let (magazine, contents) = state
        .run_db(move |db| db.get_magazine(published))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no magazine published {}", published)))?;
    Ok(Json(response(magazine, contents)))
}

pub async fn create_magazine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(magazine): Json<MagazineCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let publisher = current_member(&state, &claims).await?;
    require_board(&publisher)?;

    let published = magazine.published;
    if state
        .run_db(move |db| db.get_magazine(published))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "a magazine published {} already exists",
            published
        )));
    }

    let (row, contents) = rows(&magazine);
    let created = state
        .run_db(move |db| {
            db.create_magazine(&row, &contents)?;
            db.get_magazine(row.published)
        })
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("magazine vanished after insert")))?;
    Ok((StatusCode::CREATED, Json(response(created.0, created.1))))
}

/// PATCH /magazines/{published} — full replace of scalars and contents.
pub async fn update_magazine(
    State(state): State<AppState>,
    Path(published): Path<NaiveDate>,
    Extension(claims): Extension<Claims>,
    Json(magazine): Json<MagazineCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let publisher = current_member(&state, &claims).await?;
    require_board(&publisher)?;

    let (row, contents) = rows(&magazine);
    let new_date = row.published;
    let updated = state
        .run_db(move |db| {
            if !db.update_magazine(published, &row, &contents)? {
                return Ok(None);
            }
            db.get_magazine(new_date)
        })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no magazine published {}", published)))?;
    Ok(Json(response(updated.0, updated.1)))
}

pub async fn delete_magazine(
    State(state): State<AppState>,
    Path(published): Path<NaiveDate>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let deleter = current_member(&state, &claims).await?;
    require_board(&deleter)?;

    let deleted = state
        .run_db(move |db| db.delete_magazine(published))
        .await?;
    if !deleted {
        return Err(ApiError::NotFound(format!(
            "no magazine published {}",
            published
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
