use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Role;

// -- JWT Claims --

/// JWT claims shared by the REST middleware and the token endpoints.
/// Canonical definition lives here in clubroom-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Login name of the member the token was issued to.
    pub sub: String,
    pub kind: TokenKind,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub portal_id: String,
    pub portal_pw: String,
    pub real_name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub refresh_token: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_at: i64,
}

// -- Members --

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub student_id: String,
    pub real_name: String,
    pub username: String,
    pub role: Role,
}

/// Partial update; absent fields are left untouched. `password` arrives in
/// plaintext and is hashed before it reaches the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberModify {
    pub real_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

// -- Posts --

#[derive(Debug, Clone, Deserialize)]
pub struct PostCreate {
    pub title: String,
    pub content: String,
    /// Uploaded-file ids to associate; ids that resolve to nothing are
    /// silently dropped.
    #[serde(default)]
    pub attached: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub no: i64,
    pub title: String,
    pub author: String,
    pub content: String,
    pub published: NaiveDate,
    pub modifier: Option<String>,
    pub modified: Option<NaiveDate>,
    pub attached: Vec<UploadedFileInfo>,
}

/// List-view shape: everything but the body.
#[derive(Debug, Serialize)]
pub struct PostOutline {
    pub no: i64,
    pub title: String,
    pub author: String,
    pub published: NaiveDate,
}

// -- Magazines --

#[derive(Debug, Clone, Deserialize)]
pub struct MagazineCreate {
    pub published: NaiveDate,
    pub year: i32,
    pub cover: String,
    #[serde(default)]
    pub contents: Vec<MagazineContentItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagazineContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub author: String,
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct MagazineResponse {
    pub published: NaiveDate,
    pub year: i32,
    pub cover: String,
    pub contents: Vec<MagazineContentItem>,
}

#[derive(Debug, Serialize)]
pub struct MagazineOutline {
    pub published: NaiveDate,
    pub year: i32,
    pub cover: String,
}

// -- Uploaded files --

#[derive(Debug, Serialize)]
pub struct UploadedFileInfo {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
}
