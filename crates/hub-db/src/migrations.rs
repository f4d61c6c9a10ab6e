use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                email           TEXT NOT NULL UNIQUE,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                display_name    TEXT,
                avatar          TEXT,
                bio             TEXT,
                role            TEXT NOT NULL,
                frame_style     TEXT NOT NULL DEFAULT 'NONE',
                is_shiny        INTEGER NOT NULL DEFAULT 0,
                is_online       INTEGER NOT NULL DEFAULT 0,
                is_verified     INTEGER NOT NULL DEFAULT 0,
                last_seen       TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT
            );

            CREATE TABLE posts (
                id          TEXT PRIMARY KEY,
                content     TEXT NOT NULL DEFAULT '',
                image       TEXT,
                author_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_posts_created ON posts(created_at);
            CREATE INDEX idx_posts_author ON posts(author_id);

            CREATE TABLE likes (
                id          TEXT PRIMARY KEY,
                post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                type        TEXT NOT NULL CHECK (type IN ('LIKE', 'DISLIKE')),
                created_at  TEXT NOT NULL,
                UNIQUE(post_id, user_id)
            );

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_post ON comments(post_id, created_at);

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                sender_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                receiver_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT,
                image       TEXT,
                is_read     INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_messages_sender ON messages(sender_id, created_at);
            CREATE INDEX idx_messages_receiver ON messages(receiver_id, created_at);

            CREATE TABLE group_messages (
                id          TEXT PRIMARY KEY,
                sender_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT,
                image       TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_group_messages_created ON group_messages(created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
