use crate::Database;
use crate::models::{
    AttachmentRow, MagazineContentRow, MagazineRow, MemberPatch, MemberRow, PostDraft,
    PostOutlineRow, PostRow, UploadedFileRow,
};
use anyhow::Result;
use chrono::NaiveDate;
use clubroom_types::domain::{ClubInformation, PostKind, PostRef, Role};
use rusqlite::Connection;
use uuid::Uuid;

impl Database {
    // -- Members --

    pub fn create_member(&self, member: &MemberRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO members (student_id, real_name, username, password, role)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    member.student_id,
                    member.real_name,
                    member.username,
                    member.password,
                    member.role.as_str(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_member(&self, student_id: &str) -> Result<Option<MemberRow>> {
        self.with_conn(|conn| {
            query_member(conn, "student_id", student_id)
        })
    }

    pub fn get_member_by_username(&self, username: &str) -> Result<Option<MemberRow>> {
        self.with_conn(|conn| query_member(conn, "username", username))
    }

    pub fn list_members(&self, skip: u32, limit: u32) -> Result<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT student_id, real_name, username, password, role
                 FROM members ORDER BY student_id LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map([limit, skip], member_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Applies only the present fields of `patch`. Returns `None` without
    /// creating anything when no member matches.
    pub fn update_member(&self, student_id: &str, patch: &MemberPatch) -> Result<Option<MemberRow>> {
        self.with_tx(|tx| {
            let Some(existing) = query_member(tx, "student_id", student_id)? else {
                return Ok(None);
            };

            let real_name = patch.real_name.as_deref().unwrap_or(&existing.real_name);
            let username = patch.username.as_deref().unwrap_or(&existing.username);
            let password = patch.password_hash.as_deref().unwrap_or(&existing.password);
            let role = patch.role.unwrap_or(existing.role);

            tx.execute(
                "UPDATE members SET real_name = ?1, username = ?2, password = ?3, role = ?4
                 WHERE student_id = ?5",
                rusqlite::params![real_name, username, password, role.as_str(), student_id],
            )?;

            query_member(tx, "student_id", student_id)
        })
    }

    /// True only if a row existed and was removed.
    pub fn delete_member(&self, student_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM members WHERE student_id = ?1", [student_id])?;
            Ok(deleted > 0)
        })
    }

    // -- Posts --

    /// Newest-first outlines for list views; bodies and attachments stay out.
    pub fn list_posts(&self, kind: PostKind, skip: u32, limit: u32) -> Result<Vec<PostOutlineRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT no, title, author, published FROM posts
                 WHERE kind = ?1 ORDER BY no DESC LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![kind.as_str(), limit, skip], |row| {
                    Ok(PostOutlineRow {
                        no: row.get(0)?,
                        title: row.get(1)?,
                        author: row.get(2)?,
                        published: date_col(row, 3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_posts(&self, kind: PostKind) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE kind = ?1",
                [kind.as_str()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn get_post(&self, post: PostRef) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, post))
    }

    /// Inserts a post, snapshotting `author` as a display name. Attachment
    /// ids that do not resolve to an uploaded file are silently dropped.
    pub fn create_post(&self, kind: PostKind, author: &str, draft: &PostDraft) -> Result<PostRow> {
        self.with_tx(|tx| {
            let no = insert_post(tx, kind, author, draft)?;
            query_post(tx, PostRef::Numbered(no))?
                .ok_or_else(|| anyhow::anyhow!("post {} vanished after insert", no))
        })
    }

    /// In-place update of a numbered post; author and published date are
    /// left untouched, the modifier snapshot and the attachment set are
    /// rewritten.
    pub fn update_numbered_post(
        &self,
        no: i64,
        modifier: &str,
        draft: &PostDraft,
    ) -> Result<Option<PostRow>> {
        self.with_tx(|tx| {
            let updated = tx.execute(
                "UPDATE posts SET title = ?1, content = ?2, modifier = ?3, modified = ?4
                 WHERE no = ?5",
                rusqlite::params![
                    draft.title,
                    draft.content,
                    modifier,
                    today().to_string(),
                    no
                ],
            )?;
            if updated == 0 {
                return Ok(None);
            }

            tx.execute("DELETE FROM post_attachments WHERE post_no = ?1", [no])?;
            link_attachments(tx, no, &draft.attached)?;

            query_post(tx, PostRef::Numbered(no))
        })
    }

    /// Replace-not-patch for singleton pages: any prior row of `kind` is
    /// deleted and a fresh one inserted, so the modifier becomes the author
    /// and the published date resets to today.
    pub fn replace_singleton_post(
        &self,
        kind: PostKind,
        modifier: &str,
        draft: &PostDraft,
    ) -> Result<PostRow> {
        self.with_tx(|tx| {
            tx.execute("DELETE FROM posts WHERE kind = ?1", [kind.as_str()])?;
            let no = insert_post(tx, kind, modifier, draft)?;
            query_post(tx, PostRef::Numbered(no))?
                .ok_or_else(|| anyhow::anyhow!("post {} vanished after insert", no))
        })
    }

    /// Scoped by both sequence number and kind, so a notice delete can never
    /// remove a singleton page.
    pub fn delete_post(&self, kind: PostKind, no: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM posts WHERE no = ?1 AND kind = ?2",
                rusqlite::params![no, kind.as_str()],
            )?;
            Ok(deleted > 0)
        })
    }

    // -- Magazines --

    pub fn get_magazine(
        &self,
        published: NaiveDate,
    ) -> Result<Option<(MagazineRow, Vec<MagazineContentRow>)>> {
        self.with_conn(|conn| {
            let Some(magazine) = query_magazine(conn, published)? else {
                return Ok(None);
            };
            let contents = query_magazine_contents(conn, published)?;
            Ok(Some((magazine, contents)))
        })
    }

    pub fn list_magazines(&self, skip: u32, limit: u32) -> Result<Vec<MagazineRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT published, year, cover FROM magazines
                 ORDER BY published DESC LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map([limit, skip], magazine_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Magazine row and its content rows land in one transaction.
    pub fn create_magazine(
        &self,
        magazine: &MagazineRow,
        contents: &[MagazineContentRow],
    ) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO magazines (published, year, cover) VALUES (?1, ?2, ?3)",
                rusqlite::params![magazine.published.to_string(), magazine.year, magazine.cover],
            )?;
            insert_magazine_contents(tx, magazine.published, contents)?;
            Ok(())
        })
    }

    /// Full replace of scalars and contents. Existence is checked before
    /// anything is touched, so a not-found result has no side effects, and
    /// the delete-then-insert sequence is atomic.
    pub fn update_magazine(
        &self,
        published: NaiveDate,
        magazine: &MagazineRow,
        contents: &[MagazineContentRow],
    ) -> Result<bool> {
        self.with_tx(|tx| {
            if query_magazine(tx, published)?.is_none() {
                return Ok(false);
            }

            tx.execute(
                "DELETE FROM magazine_contents WHERE published = ?1",
                [published.to_string()],
            )?;
            tx.execute(
                "UPDATE magazines SET published = ?1, year = ?2, cover = ?3 WHERE published = ?4",
                rusqlite::params![
                    magazine.published.to_string(),
                    magazine.year,
                    magazine.cover,
                    published.to_string()
                ],
            )?;
            insert_magazine_contents(tx, magazine.published, contents)?;
            Ok(true)
        })
    }

    /// Content rows go with the magazine (FK cascade).
    pub fn delete_magazine(&self, published: NaiveDate) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM magazines WHERE published = ?1",
                [published.to_string()],
            )?;
            Ok(deleted > 0)
        })
    }

    // -- Uploaded files --

    pub fn get_uploaded_file(&self, id: Uuid) -> Result<Option<UploadedFileRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, content_type, binary FROM uploaded_files WHERE id = ?1",
                    [id.to_string()],
                    |row| {
                        Ok(UploadedFileRow {
                            id: uuid_col(row, 0)?,
                            name: row.get(1)?,
                            content_type: row.get(2)?,
                            binary: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn create_uploaded_file(&self, file: &UploadedFileRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO uploaded_files (id, name, content_type, binary)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![file.id.to_string(), file.name, file.content_type, file.binary],
            )?;
            Ok(())
        })
    }

    /// Rows-deleted as a bool; post associations disappear via FK cascade so
    /// referencing posts degrade to a smaller attachment set.
    pub fn delete_uploaded_file(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM uploaded_files WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }

    // -- Club information --

    /// Re-materializes the fixed schema from key/value rows; keys outside
    /// the schema are ignored.
    pub fn get_club_information(&self) -> Result<ClubInformation> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM club_information")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut info = ClubInformation::default();
            for (key, value) in rows {
                info.set(&key, value);
            }
            Ok(info)
        })
    }

    /// Total overwrite: every existing row is dropped and exactly one row
    /// per schema field is reinserted, all in one transaction.
    pub fn update_club_information(&self, info: &ClubInformation) -> Result<ClubInformation> {
        self.with_tx(|tx| {
            tx.execute("DELETE FROM club_information", [])?;
            for key in ClubInformation::FIELDS {
                tx.execute(
                    "INSERT INTO club_information (key, value) VALUES (?1, ?2)",
                    rusqlite::params![key, info.get(key)],
                )?;
            }
            Ok(info.clone())
        })
    }
}

// -- Row mapping helpers --

fn query_member(conn: &Connection, column: &str, value: &str) -> Result<Option<MemberRow>> {
    // `column` is always a compile-time literal, never user input.
    let sql = format!(
        "SELECT student_id, real_name, username, password, role FROM members WHERE {} = ?1",
        column
    );
    let row = conn.query_row(&sql, [value], member_from_row).optional()?;
    Ok(row)
}

fn member_from_row(row: &rusqlite::Row) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        student_id: row.get(0)?,
        real_name: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        role: role_col(row, 4)?,
    })
}

fn insert_post(conn: &Connection, kind: PostKind, author: &str, draft: &PostDraft) -> Result<i64> {
    conn.execute(
        "INSERT INTO posts (kind, title, author, content, published)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            kind.as_str(),
            draft.title,
            author,
            draft.content,
            today().to_string()
        ],
    )?;
    let no = conn.last_insert_rowid();
    link_attachments(conn, no, &draft.attached)?;
    Ok(no)
}

/// Associates the given uploaded-file ids with a post. Ids with no matching
/// file row are dropped without error.
fn link_attachments(conn: &Connection, post_no: i64, file_ids: &[Uuid]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO post_attachments (post_no, file_id)
         SELECT ?1, id FROM uploaded_files WHERE id = ?2",
    )?;
    for id in file_ids {
        stmt.execute(rusqlite::params![post_no, id.to_string()])?;
    }
    Ok(())
}

fn query_post(conn: &Connection, post: PostRef) -> Result<Option<PostRow>> {
    let (condition, value): (&str, String) = match post {
        PostRef::Numbered(no) => ("no = ?1", no.to_string()),
        PostRef::Singleton(kind) => ("kind = ?1", kind.as_str().to_string()),
    };
    let sql = format!(
        "SELECT no, kind, title, author, content, published, modifier, modified
         FROM posts WHERE {} LIMIT 1",
        condition
    );

    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(PostRow {
                no: row.get(0)?,
                kind: row.get(1)?,
                title: row.get(2)?,
                author: row.get(3)?,
                content: row.get(4)?,
                published: date_col(row, 5)?,
                modifier: row.get(6)?,
                modified: opt_date_col(row, 7)?,
                attached: Vec::new(),
            })
        })
        .optional()?;

    let Some(mut post) = row else {
        return Ok(None);
    };
    post.attached = query_attachments(conn, post.no)?;
    Ok(Some(post))
}

fn query_attachments(conn: &Connection, post_no: i64) -> Result<Vec<AttachmentRow>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.name, f.content_type
         FROM post_attachments a
         JOIN uploaded_files f ON a.file_id = f.id
         WHERE a.post_no = ?1
         ORDER BY f.id",
    )?;
    let rows = stmt
        .query_map([post_no], |row| {
            Ok(AttachmentRow {
                id: uuid_col(row, 0)?,
                name: row.get(1)?,
                content_type: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_magazine(conn: &Connection, published: NaiveDate) -> Result<Option<MagazineRow>> {
    let row = conn
        .query_row(
            "SELECT published, year, cover FROM magazines WHERE published = ?1",
            [published.to_string()],
            magazine_from_row,
        )
        .optional()?;
    Ok(row)
}

fn magazine_from_row(row: &rusqlite::Row) -> rusqlite::Result<MagazineRow> {
    Ok(MagazineRow {
        published: date_col(row, 0)?,
        year: row.get(1)?,
        cover: row.get(2)?,
    })
}

/// Contents come back in insertion order.
fn query_magazine_contents(
    conn: &Connection,
    published: NaiveDate,
) -> Result<Vec<MagazineContentRow>> {
    let mut stmt = conn.prepare(
        "SELECT kind, title, author, language FROM magazine_contents
         WHERE published = ?1 ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([published.to_string()], |row| {
            Ok(MagazineContentRow {
                kind: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
                language: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn insert_magazine_contents(
    conn: &Connection,
    published: NaiveDate,
    contents: &[MagazineContentRow],
) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO magazine_contents (published, seq, kind, title, author, language)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (seq, content) in contents.iter().enumerate() {
        stmt.execute(rusqlite::params![
            published.to_string(),
            seq as i64,
            content.kind,
            content.title,
            content.author,
            content.language
        ])?;
    }
    Ok(())
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

// -- Column conversion helpers --

fn date_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| conversion_error(idx, e))
}

fn opt_date_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        None => Ok(None),
        Some(text) => text.parse().map(Some).map_err(|e| conversion_error(idx, e)),
    }
}

fn uuid_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| conversion_error(idx, e))
}

fn role_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Role> {
    let text: String = row.get(idx)?;
    Role::parse(&text).ok_or_else(|| {
        conversion_error(idx, anyhow::anyhow!("unknown role '{}'", text))
    })
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err.into())
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn member(student_id: &str, username: &str) -> MemberRow {
        MemberRow {
            student_id: student_id.into(),
            real_name: "Kim".into(),
            username: username.into(),
            password: "$argon2id$fake".into(),
            role: Role::Member,
        }
    }

    fn draft(title: &str, attached: Vec<Uuid>) -> PostDraft {
        PostDraft {
            title: title.into(),
            content: "body".into(),
            attached,
        }
    }

    fn file(name: &str) -> UploadedFileRow {
        UploadedFileRow {
            id: Uuid::new_v4(),
            name: name.into(),
            content_type: "image/png".into(),
            binary: vec![1, 2, 3],
        }
    }

    #[test]
    fn member_create_and_fetch() {
        let db = db();
        db.create_member(&member("202012345", "kim01")).unwrap();

        let fetched = db.get_member("202012345").unwrap().unwrap();
        assert_eq!(fetched.username, "kim01");
        assert_eq!(fetched.real_name, "Kim");
        assert_eq!(fetched.role, Role::Member);

        let by_username = db.get_member_by_username("kim01").unwrap().unwrap();
        assert_eq!(by_username.student_id, "202012345");
    }

    #[test]
    fn duplicate_student_id_rejected() {
        let db = db();
        db.create_member(&member("202012345", "kim01")).unwrap();
        assert!(db.create_member(&member("202012345", "lee02")).is_err());
    }

    #[test]
    fn duplicate_username_rejected() {
        let db = db();
        db.create_member(&member("202012345", "kim01")).unwrap();
        assert!(db.create_member(&member("202067890", "kim01")).is_err());
    }

    #[test]
    fn member_update_is_partial_and_idempotent() {
        let db = db();
        db.create_member(&member("202012345", "kim01")).unwrap();

        let patch = MemberPatch {
            real_name: Some("Kim Minsu".into()),
            role: Some(Role::Board),
            ..Default::default()
        };

        let first = db.update_member("202012345", &patch).unwrap().unwrap();
        let second = db.update_member("202012345", &patch).unwrap().unwrap();

        assert_eq!(first.real_name, "Kim Minsu");
        assert_eq!(first.role, Role::Board);
        // untouched fields survive
        assert_eq!(first.username, "kim01");
        assert_eq!(second.real_name, first.real_name);
        assert_eq!(second.username, first.username);
        assert_eq!(second.role, first.role);
    }

    #[test]
    fn member_update_missing_returns_none() {
        let db = db();
        let patch = MemberPatch {
            real_name: Some("Ghost".into()),
            ..Default::default()
        };
        assert!(db.update_member("000000000", &patch).unwrap().is_none());
        // and nothing got created
        assert!(db.get_member("000000000").unwrap().is_none());
    }

    #[test]
    fn member_delete_reports_existence() {
        let db = db();
        db.create_member(&member("202012345", "kim01")).unwrap();
        assert!(db.delete_member("202012345").unwrap());
        assert!(!db.delete_member("202012345").unwrap());
    }

    #[test]
    fn notice_create_list_delete_scenario() {
        let db = db();
        let post = db
            .create_post(PostKind::Notice, "Kim", &draft("welcome", vec![]))
            .unwrap();

        let listed = db.list_posts(PostKind::Notice, 0, 100).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "welcome");
        assert_eq!(listed[0].no, post.no);
        assert_eq!(db.count_posts(PostKind::Notice).unwrap(), 1);

        assert!(db.delete_post(PostKind::Notice, post.no).unwrap());
        assert!(db.list_posts(PostKind::Notice, 0, 100).unwrap().is_empty());
    }

    #[test]
    fn notices_list_newest_first() {
        let db = db();
        for title in ["first", "second", "third"] {
            db.create_post(PostKind::Notice, "Kim", &draft(title, vec![]))
                .unwrap();
        }
        let listed = db.list_posts(PostKind::Notice, 0, 100).unwrap();
        let titles: Vec<&str> = listed.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["third", "second", "first"]);
    }

    #[test]
    fn delete_is_scoped_by_kind() {
        let db = db();
        let about = db
            .create_post(PostKind::About, "Kim", &draft("about us", vec![]))
            .unwrap();
        // a notice-delete aimed at the about page's number must not touch it
        assert!(!db.delete_post(PostKind::Notice, about.no).unwrap());
        assert!(db.get_post(PostRef::Singleton(PostKind::About)).unwrap().is_some());
    }

    #[test]
    fn singleton_replace_never_leaves_two_rows() {
        let db = db();
        db.create_post(PostKind::About, "Kim", &draft("v1", vec![]))
            .unwrap();
        db.replace_singleton_post(PostKind::About, "Lee", &draft("v2", vec![]))
            .unwrap();
        db.replace_singleton_post(PostKind::About, "Park", &draft("v3", vec![]))
            .unwrap();

        assert_eq!(db.count_posts(PostKind::About).unwrap(), 1);
        let page = db.get_post(PostRef::Singleton(PostKind::About)).unwrap().unwrap();
        assert_eq!(page.title, "v3");
        // replace resets the author to the modifier
        assert_eq!(page.author, "Park");
    }

    #[test]
    fn numbered_update_keeps_author_and_published() {
        let db = db();
        let post = db
            .create_post(PostKind::Notice, "Kim", &draft("orig", vec![]))
            .unwrap();

        let updated = db
            .update_numbered_post(post.no, "Lee", &draft("edited", vec![]))
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "edited");
        assert_eq!(updated.author, "Kim");
        assert_eq!(updated.published, post.published);
        assert_eq!(updated.modifier.as_deref(), Some("Lee"));
        assert!(updated.modified.is_some());
    }

    #[test]
    fn unknown_attachment_ids_are_dropped() {
        let db = db();
        let real = file("cover.png");
        db.create_uploaded_file(&real).unwrap();

        let post = db
            .create_post(
                PostKind::Notice,
                "Kim",
                &draft("attached", vec![real.id, Uuid::new_v4()]),
            )
            .unwrap();

        assert_eq!(post.attached.len(), 1);
        assert_eq!(post.attached[0].id, real.id);
    }

    #[test]
    fn deleting_referenced_file_degrades_attachment_set() {
        let db = db();
        let a = file("a.png");
        let b = file("b.png");
        db.create_uploaded_file(&a).unwrap();
        db.create_uploaded_file(&b).unwrap();

        let post = db
            .create_post(PostKind::Notice, "Kim", &draft("two files", vec![a.id, b.id]))
            .unwrap();
        assert_eq!(post.attached.len(), 2);

        assert!(db.delete_uploaded_file(a.id).unwrap());

        let refetched = db.get_post(PostRef::Numbered(post.no)).unwrap().unwrap();
        assert_eq!(refetched.attached.len(), 1);
        assert_eq!(refetched.attached[0].id, b.id);
    }

    #[test]
    fn uploaded_file_delete_reports_existence() {
        let db = db();
        let f = file("gone.pdf");
        db.create_uploaded_file(&f).unwrap();
        assert!(db.delete_uploaded_file(f.id).unwrap());
        assert!(!db.delete_uploaded_file(f.id).unwrap());
    }

    fn magazine(published: &str) -> MagazineRow {
        MagazineRow {
            published: published.parse().unwrap(),
            year: 2023,
            cover: "cover-uuid".into(),
        }
    }

    fn content(title: &str) -> MagazineContentRow {
        MagazineContentRow {
            kind: "poem".into(),
            title: title.into(),
            author: "Kim".into(),
            language: "ko".into(),
        }
    }

    #[test]
    fn magazine_contents_round_trip_in_order() {
        let db = db();
        let mag = magazine("2023-03-01");
        let contents = vec![content("spring"), content("rain"), content("night")];
        db.create_magazine(&mag, &contents).unwrap();

        let (fetched, fetched_contents) = db.get_magazine(mag.published).unwrap().unwrap();
        assert_eq!(fetched.year, 2023);
        assert_eq!(fetched_contents.len(), 3);
        let titles: Vec<&str> = fetched_contents.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["spring", "rain", "night"]);
    }

    #[test]
    fn magazine_update_fully_replaces_contents() {
        let db = db();
        let mag = magazine("2023-03-01");
        db.create_magazine(&mag, &[content("old-a"), content("old-b")])
            .unwrap();

        let replaced = db
            .update_magazine(mag.published, &magazine("2023-03-01"), &[content("new")])
            .unwrap();
        assert!(replaced);

        let (_, contents) = db.get_magazine(mag.published).unwrap().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].title, "new");
    }

    #[test]
    fn magazine_update_missing_has_no_side_effects() {
        let db = db();
        let mag = magazine("2023-03-01");
        db.create_magazine(&mag, &[content("keep")]).unwrap();

        let other: NaiveDate = "2024-01-01".parse().unwrap();
        assert!(!db.update_magazine(other, &magazine("2024-01-01"), &[]).unwrap());

        // the existing magazine's contents were not collateral damage
        let (_, contents) = db.get_magazine(mag.published).unwrap().unwrap();
        assert_eq!(contents.len(), 1);
    }

    #[test]
    fn magazine_delete_cascades_contents() {
        let db = db();
        let mag = magazine("2023-03-01");
        db.create_magazine(&mag, &[content("a"), content("b")]).unwrap();

        assert!(db.delete_magazine(mag.published).unwrap());
        assert!(!db.delete_magazine(mag.published).unwrap());
        assert!(db.get_magazine(mag.published).unwrap().is_none());

        // no orphaned content rows remain
        let orphans: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM magazine_contents", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn magazines_list_newest_first() {
        let db = db();
        for date in ["2021-03-01", "2023-03-01", "2022-09-01"] {
            db.create_magazine(&magazine(date), &[]).unwrap();
        }
        let listed = db.list_magazines(0, 100).unwrap();
        let dates: Vec<String> = listed.iter().map(|m| m.published.to_string()).collect();
        assert_eq!(dates, ["2023-03-01", "2022-09-01", "2021-03-01"]);
    }

    #[test]
    fn club_information_full_replace_leaves_only_schema_keys() {
        let db = db();
        // seed a stale key outside the schema
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO club_information (key, value) VALUES ('legacy', 'stale')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let mut info = ClubInformation::default();
        info.address = Some("student hall 201".into());
        info.email = Some("club@example.ac.kr".into());
        db.update_club_information(&info).unwrap();

        let fetched = db.get_club_information().unwrap();
        assert_eq!(fetched, info);

        let keys: Vec<String> = db
            .with_conn(|conn| {
                let mut stmt = conn.prepare("SELECT key FROM club_information ORDER BY key")?;
                let keys = stmt
                    .query_map([], |r| r.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .unwrap();
        let mut expected: Vec<String> =
            ClubInformation::FIELDS.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(keys, expected);
    }
}
