use crate::models::{
    AccountPatch, AccountRow, CommentRow, GroupMessageRow, LikeRow, MessageRow, NewAccountRow,
    PostRow,
};
use crate::{Database, timestamp_now};
use anyhow::{Result, bail};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};

const ACCOUNT_COLUMNS: &str = "id, email, username, password_hash, display_name, avatar, bio, \
     role, frame_style, is_shiny, is_online, is_verified, last_seen, created_at, updated_at";
const POST_COLUMNS: &str = "id, content, image, author_id, created_at";
const LIKE_COLUMNS: &str = "id, post_id, user_id, type, created_at";
const COMMENT_COLUMNS: &str = "id, post_id, user_id, content, created_at";
const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, image, is_read, created_at";
const GROUP_MESSAGE_COLUMNS: &str = "id, sender_id, content, image, created_at";

/// Tables that may be named in a count query.
pub const TABLES: &[&str] = &["users", "posts", "likes", "comments", "messages", "group_messages"];

impl Database {
    // -- Accounts --

    pub fn create_account(&self, new: &NewAccountRow) -> Result<AccountRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, username, password_hash, display_name, avatar, bio,
                                    role, frame_style, is_shiny, is_online, is_verified, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    new.id,
                    new.email,
                    new.username,
                    new.password_hash,
                    new.display_name,
                    new.avatar,
                    new.bio,
                    new.role,
                    new.frame_style,
                    new.is_shiny,
                    new.is_online,
                    new.is_verified,
                    timestamp_now(),
                ],
            )?;
            query_account(conn, "id", &new.id)?
                .ok_or_else(|| anyhow::anyhow!("Account vanished after insert: {}", new.id))
        })
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "email", email))
    }

    pub fn get_account_by_username(&self, username: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "username", username))
    }

    pub fn get_account_by_id(&self, id: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "id", id))
    }

    pub fn get_accounts_by_ids(&self, ids: &[String]) -> Result<Vec<AccountRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id IN ({})",
                placeholders(ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(ids.iter()), account_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_accounts(&self, role: Option<&str>, newest_first: bool) -> Result<Vec<AccountRow>> {
        self.with_conn(|conn| {
            let order = if newest_first { "created_at DESC, rowid DESC" } else { "rowid ASC" };
            let rows = match role {
                Some(role) => {
                    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE role = ?1 ORDER BY {order}");
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map([role], account_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows
                }
                None => {
                    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users ORDER BY {order}");
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map([], account_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows
                }
            };
            Ok(rows)
        })
    }

    /// Apply a column patch. Returns the updated row, or `None` when no row
    /// has that id.
    pub fn update_account(&self, id: &str, patch: &AccountPatch) -> Result<Option<AccountRow>> {
        let mut sets: Vec<&'static str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let mut text = |column: &'static str, value: &Option<String>| {
            if let Some(v) = value {
                sets.push(column);
                values.push(Value::Text(v.clone()));
            }
        };
        text("display_name", &patch.display_name);
        text("bio", &patch.bio);
        text("avatar", &patch.avatar);
        text("password_hash", &patch.password_hash);
        text("role", &patch.role);
        text("frame_style", &patch.frame_style);
        text("last_seen", &patch.last_seen);
        text("updated_at", &patch.updated_at);

        for (column, value) in [
            ("is_shiny", patch.is_shiny),
            ("is_verified", patch.is_verified),
            ("is_online", patch.is_online),
        ] {
            if let Some(v) = value {
                sets.push(column);
                values.push(Value::Integer(v as i64));
            }
        }

        self.with_conn_mut(|conn| {
            if !sets.is_empty() {
                let assignments: Vec<String> = sets
                    .iter()
                    .enumerate()
                    .map(|(i, column)| format!("{} = ?{}", column, i + 1))
                    .collect();
                let sql = format!(
                    "UPDATE users SET {} WHERE id = ?{}",
                    assignments.join(", "),
                    sets.len() + 1
                );
                values.push(Value::Text(id.to_string()));
                conn.execute(&sql, params_from_iter(values.iter()))?;
            }
            query_account(conn, "id", id)
        })
    }

    pub fn delete_account(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? > 0))
    }

    pub fn count_online_accounts(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM users WHERE is_online = 1", [], |r| r.get(0))?;
            Ok(n as u64)
        })
    }

    // -- Posts --

    pub fn insert_post(
        &self,
        id: &str,
        content: &str,
        image: Option<&str>,
        author_id: &str,
    ) -> Result<PostRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (id, content, image, author_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, content, image, author_id, timestamp_now()],
            )?;
            query_one(conn, &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"), id, post_row)?
                .ok_or_else(|| anyhow::anyhow!("Post vanished after insert: {}", id))
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            query_one(conn, &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"), id, post_row)
        })
    }

    /// Reverse-chronological window over all posts.
    pub fn list_posts(&self, offset: u32, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(params![limit, offset], post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_posts_by_author(&self, author_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE author_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([author_id], post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])? > 0))
    }

    // -- Likes --

    pub fn get_like(&self, post_id: &str, user_id: &str) -> Result<Option<LikeRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {LIKE_COLUMNS} FROM likes WHERE post_id = ?1 AND user_id = ?2"),
                [post_id, user_id],
                like_row,
            )
            .optional()
        })
    }

    pub fn insert_like(&self, id: &str, post_id: &str, user_id: &str, kind: &str) -> Result<LikeRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO likes (id, post_id, user_id, type, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, post_id, user_id, kind, timestamp_now()],
            )?;
            query_one(conn, &format!("SELECT {LIKE_COLUMNS} FROM likes WHERE id = ?1"), id, like_row)?
                .ok_or_else(|| anyhow::anyhow!("Like vanished after insert: {}", id))
        })
    }

    pub fn set_like_kind(&self, id: &str, kind: &str) -> Result<Option<LikeRow>> {
        self.with_conn_mut(|conn| {
            conn.execute("UPDATE likes SET type = ?1 WHERE id = ?2", [kind, id])?;
            query_one(conn, &format!("SELECT {LIKE_COLUMNS} FROM likes WHERE id = ?1"), id, like_row)
        })
    }

    pub fn delete_like(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM likes WHERE id = ?1", [id])? > 0))
    }

    /// Batch-fetch likes for a set of post IDs.
    pub fn get_likes_for_posts(&self, post_ids: &[String]) -> Result<Vec<LikeRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {LIKE_COLUMNS} FROM likes WHERE post_id IN ({}) ORDER BY created_at, rowid",
                placeholders(post_ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(post_ids.iter()), like_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_likes_for_posts(&self, post_ids: &[String]) -> Result<u64> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT COUNT(*) FROM likes WHERE post_id IN ({})",
                placeholders(post_ids.len())
            );
            let n: i64 = conn.query_row(&sql, params_from_iter(post_ids.iter()), |r| r.get(0))?;
            Ok(n as u64)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, id: &str, post_id: &str, user_id: &str, content: &str) -> Result<CommentRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (id, post_id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, post_id, user_id, content, timestamp_now()],
            )?;
            query_one(conn, &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"), id, comment_row)?
                .ok_or_else(|| anyhow::anyhow!("Comment vanished after insert: {}", id))
        })
    }

    /// Comments on the given posts, oldest first.
    pub fn get_comments_for_posts(&self, post_ids: &[String]) -> Result<Vec<CommentRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id IN ({}) ORDER BY created_at, rowid",
                placeholders(post_ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(post_ids.iter()), comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Direct messages --

    pub fn insert_message(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        content: Option<&str>,
        image: Option<&str>,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content, image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, sender_id, receiver_id, content, image, timestamp_now()],
            )?;
            query_one(conn, &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"), id, message_row)?
                .ok_or_else(|| anyhow::anyhow!("Message vanished after insert: {}", id))
        })
    }

    /// Every message where `user_id` is sender or receiver, newest first.
    pub fn get_messages_involving(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE sender_id = ?1 OR receiver_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// The thread between two users, oldest first.
    pub fn get_messages_between(&self, a: &str, b: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE (sender_id = ?1 AND receiver_id = ?2)
                    OR (sender_id = ?2 AND receiver_id = ?1)
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt
                .query_map([a, b], message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Flag everything `sender_id` sent to `receiver_id` as read. Returns how
    /// many rows flipped; rows already read are left alone.
    pub fn mark_read(&self, receiver_id: &str, sender_id: &str) -> Result<u64> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
                [receiver_id, sender_id],
            )?;
            Ok(n as u64)
        })
    }

    // -- Group room --

    pub fn insert_group_message(
        &self,
        id: &str,
        sender_id: &str,
        content: Option<&str>,
        image: Option<&str>,
    ) -> Result<GroupMessageRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO group_messages (id, sender_id, content, image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, sender_id, content, image, timestamp_now()],
            )?;
            query_one(
                conn,
                &format!("SELECT {GROUP_MESSAGE_COLUMNS} FROM group_messages WHERE id = ?1"),
                id,
                group_message_row,
            )?
            .ok_or_else(|| anyhow::anyhow!("Group message vanished after insert: {}", id))
        })
    }

    /// Newest-first window over the room.
    pub fn list_group_messages(&self, offset: u32, limit: u32) -> Result<Vec<GroupMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GROUP_MESSAGE_COLUMNS} FROM group_messages
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(params![limit, offset], group_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Counts --

    pub fn count_rows(&self, table: &str) -> Result<u64> {
        if !TABLES.contains(&table) {
            bail!("Unknown table: {}", table);
        }

        self.with_conn(|conn| {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
            Ok(n as u64)
        })
    }
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

fn query_account(conn: &Connection, column: &str, value: &str) -> Result<Option<AccountRow>> {
    // `column` is always one of our own literals, never user input.
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE {column} = ?1");
    query_one(conn, &sql, value, account_row)
}

fn query_one<T>(
    conn: &Connection,
    sql: &str,
    key: &str,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    stmt.query_row([key], map).optional()
}

fn account_row(row: &Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password_hash: row.get(3)?,
        display_name: row.get(4)?,
        avatar: row.get(5)?,
        bio: row.get(6)?,
        role: row.get(7)?,
        frame_style: row.get(8)?,
        is_shiny: row.get(9)?,
        is_online: row.get(10)?,
        is_verified: row.get(11)?,
        last_seen: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn post_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        content: row.get(1)?,
        image: row.get(2)?,
        author_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn like_row(row: &Row<'_>) -> rusqlite::Result<LikeRow> {
    Ok(LikeRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        kind: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn comment_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        image: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn group_message_row(row: &Row<'_>) -> rusqlite::Result<GroupMessageRow> {
    Ok(GroupMessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        content: row.get(2)?,
        image: row.get(3)?,
        created_at: row.get(4)?,
    })
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
