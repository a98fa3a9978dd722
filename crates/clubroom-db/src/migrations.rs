use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS members (
            student_id  TEXT PRIMARY KEY,
            real_name   TEXT NOT NULL,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'member'
        );

        CREATE TABLE IF NOT EXISTS posts (
            no          INTEGER PRIMARY KEY AUTOINCREMENT,
            kind        TEXT NOT NULL,
            title       TEXT NOT NULL,
            author      TEXT NOT NULL,
            content     TEXT NOT NULL,
            published   TEXT NOT NULL,
            modifier    TEXT,
            modified    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_posts_kind
            ON posts(kind, no);

        CREATE TABLE IF NOT EXISTS uploaded_files (
            id            TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            content_type  TEXT NOT NULL,
            binary        BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS post_attachments (
            post_no     INTEGER NOT NULL REFERENCES posts(no) ON DELETE CASCADE,
            file_id     TEXT NOT NULL REFERENCES uploaded_files(id) ON DELETE CASCADE,
            UNIQUE(post_no, file_id)
        );

        CREATE TABLE IF NOT EXISTS magazines (
            published   TEXT PRIMARY KEY,
            year        INTEGER NOT NULL,
            cover       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS magazine_contents (
            published   TEXT NOT NULL REFERENCES magazines(published)
                            ON DELETE CASCADE ON UPDATE CASCADE,
            seq         INTEGER NOT NULL,
            kind        TEXT NOT NULL,
            title       TEXT NOT NULL,
            author      TEXT NOT NULL,
            language    TEXT NOT NULL,
            UNIQUE(published, seq)
        );

        CREATE TABLE IF NOT EXISTS club_information (
            key         TEXT PRIMARY KEY,
            value       TEXT
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
