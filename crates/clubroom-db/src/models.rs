//! Database row types — these map directly to SQLite rows.
//! Distinct from clubroom-types API models to keep the DB layer independent.

use chrono::NaiveDate;
use clubroom_types::domain::Role;
use uuid::Uuid;

pub struct MemberRow {
    pub student_id: String,
    pub real_name: String,
    pub username: String,
    /// Argon2 digest, never plaintext.
    pub password: String,
    pub role: Role,
}

/// Partial member update; `None` fields are left untouched. The password,
/// when present, is already hashed.
#[derive(Default)]
pub struct MemberPatch {
    pub real_name: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

pub struct PostRow {
    pub no: i64,
    pub kind: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub published: NaiveDate,
    pub modifier: Option<String>,
    pub modified: Option<NaiveDate>,
    pub attached: Vec<AttachmentRow>,
}

/// List-view projection: no body, no attachments.
pub struct PostOutlineRow {
    pub no: i64,
    pub title: String,
    pub author: String,
    pub published: NaiveDate,
}

/// Attachment metadata joined onto a post; the blob stays in its own table.
pub struct AttachmentRow {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
}

/// Input for creating or rewriting a post.
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub attached: Vec<Uuid>,
}

pub struct MagazineRow {
    pub published: NaiveDate,
    pub year: i32,
    pub cover: String,
}

pub struct MagazineContentRow {
    pub kind: String,
    pub title: String,
    pub author: String,
    pub language: String,
}

pub struct UploadedFileRow {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub binary: Vec<u8>,
}
