use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, warn};
use uuid::Uuid;

use hub_db::Database;
use hub_db::models::{
    AccountPatch, AccountRow, CommentRow, GroupMessageRow, LikeRow, MessageRow, NewAccountRow,
    PostRow,
};
use hub_types::api::{
    AccountChanges, NewAccount, NewComment, NewDirectMessage, NewGroupMessage, NewLike, NewPost,
};
use hub_types::query::{AccountQuery, PageRange, Table};
use hub_types::{
    Account, AccountRecord, Comment, CommentWithAuthor, DirectMessage, FeedPost, FrameStyle,
    GroupMessage, Like, LikeKind, Post, Role, RoomMessage, ThreadMessage,
};

use super::Backend;
use crate::error::{HubError, Result};

/// Backend over the embedded SQLite store. Every call hops onto the blocking
/// pool since rusqlite is synchronous.
#[derive(Clone)]
pub struct LocalBackend {
    db: Arc<Database>,
}

impl LocalBackend {
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let out = tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                HubError::from(e)
            })??;
        Ok(out)
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn account_by_email(&self, email: &str) -> Result<Option<AccountRecord>> {
        let email = email.to_string();
        let row = self.run(move |db| db.get_account_by_email(&email)).await?;
        Ok(row.map(record_from_row))
    }

    async fn account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let username = username.to_string();
        let row = self.run(move |db| db.get_account_by_username(&username)).await?;
        Ok(row.map(account_from_row))
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let row = self.run(move |db| db.get_account_by_id(&id.to_string())).await?;
        Ok(row.map(account_from_row))
    }

    async fn list_accounts(&self, query: AccountQuery) -> Result<Vec<Account>> {
        let rows = self
            .run(move |db| db.list_accounts(query.role.map(Role::as_str), query.newest_first))
            .await?;
        Ok(rows.into_iter().map(account_from_row).collect())
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        let row = NewAccountRow {
            id: Uuid::new_v4().to_string(),
            email: account.email,
            username: account.username,
            password_hash: account.password_hash,
            display_name: Some(account.display_name),
            avatar: Some(account.avatar),
            bio: Some(account.bio),
            role: account.role.as_str().to_string(),
            frame_style: account.frame_style.as_str().to_string(),
            is_shiny: account.is_shiny,
            is_online: account.is_online,
            is_verified: account.is_verified,
        };
        let row = self.run(move |db| db.create_account(&row)).await?;
        Ok(account_from_row(row))
    }

    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> Result<Option<Account>> {
        let patch = AccountPatch {
            display_name: changes.display_name,
            bio: changes.bio,
            avatar: changes.avatar,
            password_hash: changes.password_hash,
            role: changes.role.map(|r| r.as_str().to_string()),
            frame_style: changes.frame_style.map(|f| f.as_str().to_string()),
            is_shiny: changes.is_shiny,
            is_verified: changes.is_verified,
            is_online: changes.is_online,
            last_seen: changes.last_seen.map(format_time),
            updated_at: changes.updated_at.map(format_time),
        };
        let row = self.run(move |db| db.update_account(&id.to_string(), &patch)).await?;
        Ok(row.map(account_from_row))
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool> {
        self.run(move |db| db.delete_account(&id.to_string())).await
    }

    async fn count_online(&self) -> Result<u64> {
        self.run(|db| db.count_online_accounts()).await
    }

    async fn list_posts(&self, range: PageRange) -> Result<Vec<FeedPost>> {
        self.run(move |db| {
            let rows = db.list_posts(range.offset, range.limit)?;
            assemble_posts(db, rows)
        })
        .await
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<FeedPost>> {
        self.run(move |db| {
            let rows = db.list_posts_by_author(&author_id.to_string())?;
            assemble_posts(db, rows)
        })
        .await
    }

    async fn post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let row = self.run(move |db| db.get_post(&id.to_string())).await?;
        Ok(row.map(post_from_row))
    }

    async fn insert_post(&self, post: NewPost) -> Result<FeedPost> {
        self.run(move |db| {
            let row = db.insert_post(
                &Uuid::new_v4().to_string(),
                &post.content,
                post.image.as_deref(),
                &post.author_id.to_string(),
            )?;
            let mut joined = assemble_posts(db, vec![row])?;
            joined.pop().ok_or_else(|| anyhow::anyhow!("Inserted post missing from join"))
        })
        .await
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        self.run(move |db| db.delete_post(&id.to_string())).await
    }

    async fn find_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Like>> {
        let row = self
            .run(move |db| db.get_like(&post_id.to_string(), &user_id.to_string()))
            .await?;
        Ok(row.map(like_from_row))
    }

    async fn insert_like(&self, like: NewLike) -> Result<Like> {
        let row = self
            .run(move |db| {
                db.insert_like(
                    &Uuid::new_v4().to_string(),
                    &like.post_id.to_string(),
                    &like.user_id.to_string(),
                    like.kind.as_str(),
                )
            })
            .await?;
        Ok(like_from_row(row))
    }

    async fn set_like_kind(&self, id: Uuid, kind: LikeKind) -> Result<Like> {
        let row = self
            .run(move |db| db.set_like_kind(&id.to_string(), kind.as_str()))
            .await?
            .ok_or(HubError::NotFound("like"))?;
        Ok(like_from_row(row))
    }

    async fn delete_like(&self, id: Uuid) -> Result<bool> {
        self.run(move |db| db.delete_like(&id.to_string())).await
    }

    async fn count_likes(&self, post_ids: &[Uuid]) -> Result<u64> {
        let ids: Vec<String> = post_ids.iter().map(Uuid::to_string).collect();
        self.run(move |db| db.count_likes_for_posts(&ids)).await
    }

    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        self.run(move |db| {
            let rows = db.get_comments_for_posts(&[post_id.to_string()])?;
            let accounts = accounts_for(db, rows.iter().map(|c| c.user_id.clone()))?;
            Ok(rows.into_iter().map(|row| comment_with_author(row, &accounts)).collect())
        })
        .await
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<CommentWithAuthor> {
        self.run(move |db| {
            let row = db.insert_comment(
                &Uuid::new_v4().to_string(),
                &comment.post_id.to_string(),
                &comment.user_id.to_string(),
                &comment.content,
            )?;
            let accounts = accounts_for(db, [row.user_id.clone()])?;
            Ok(comment_with_author(row, &accounts))
        })
        .await
    }

    async fn messages_involving(&self, user_id: Uuid) -> Result<Vec<DirectMessage>> {
        let rows = self
            .run(move |db| db.get_messages_involving(&user_id.to_string()))
            .await?;
        Ok(rows.into_iter().map(message_from_row).collect())
    }

    async fn messages_between(&self, a: Uuid, b: Uuid) -> Result<Vec<ThreadMessage>> {
        self.run(move |db| {
            let rows = db.get_messages_between(&a.to_string(), &b.to_string())?;
            let accounts = accounts_for(db, [a.to_string(), b.to_string()])?;
            Ok(rows.into_iter().map(|row| thread_message(row, &accounts)).collect())
        })
        .await
    }

    async fn insert_message(&self, message: NewDirectMessage) -> Result<ThreadMessage> {
        self.run(move |db| {
            let row = db.insert_message(
                &Uuid::new_v4().to_string(),
                &message.sender_id.to_string(),
                &message.receiver_id.to_string(),
                message.content.as_deref(),
                message.image.as_deref(),
            )?;
            let accounts = accounts_for(db, [row.sender_id.clone(), row.receiver_id.clone()])?;
            Ok(thread_message(row, &accounts))
        })
        .await
    }

    async fn mark_read(&self, receiver_id: Uuid, sender_id: Uuid) -> Result<u64> {
        self.run(move |db| db.mark_read(&receiver_id.to_string(), &sender_id.to_string()))
            .await
    }

    async fn group_messages(&self, range: PageRange) -> Result<Vec<RoomMessage>> {
        self.run(move |db| {
            let rows = db.list_group_messages(range.offset, range.limit)?;
            let accounts = accounts_for(db, rows.iter().map(|m| m.sender_id.clone()))?;
            Ok(rows.into_iter().map(|row| room_message(row, &accounts)).collect())
        })
        .await
    }

    async fn insert_group_message(&self, message: NewGroupMessage) -> Result<RoomMessage> {
        self.run(move |db| {
            let row = db.insert_group_message(
                &Uuid::new_v4().to_string(),
                &message.sender_id.to_string(),
                message.content.as_deref(),
                message.image.as_deref(),
            )?;
            let accounts = accounts_for(db, [row.sender_id.clone()])?;
            Ok(room_message(row, &accounts))
        })
        .await
    }

    async fn count(&self, table: Table) -> Result<u64> {
        self.run(move |db| db.count_rows(table.as_str())).await
    }
}

// -- Joins --

fn accounts_for<I>(db: &Database, ids: I) -> anyhow::Result<HashMap<String, Account>>
where
    I: IntoIterator<Item = String>,
{
    let mut ids: Vec<String> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();

    Ok(db
        .get_accounts_by_ids(&ids)?
        .into_iter()
        .map(|row| (row.id.clone(), account_from_row(row)))
        .collect())
}

fn assemble_posts(db: &Database, rows: Vec<PostRow>) -> anyhow::Result<Vec<FeedPost>> {
    let post_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let like_rows = db.get_likes_for_posts(&post_ids)?;
    let comment_rows = db.get_comments_for_posts(&post_ids)?;

    let accounts = accounts_for(
        db,
        rows.iter()
            .map(|r| r.author_id.clone())
            .chain(comment_rows.iter().map(|c| c.user_id.clone())),
    )?;

    let mut likes: HashMap<String, Vec<Like>> = HashMap::new();
    for row in like_rows {
        likes.entry(row.post_id.clone()).or_default().push(like_from_row(row));
    }

    let mut comments: HashMap<String, Vec<CommentWithAuthor>> = HashMap::new();
    for row in comment_rows {
        let post_id = row.post_id.clone();
        comments.entry(post_id).or_default().push(comment_with_author(row, &accounts));
    }

    Ok(rows
        .into_iter()
        .map(|row| FeedPost {
            author: accounts.get(&row.author_id).cloned(),
            likes: likes.remove(&row.id).unwrap_or_default(),
            comments: comments.remove(&row.id).unwrap_or_default(),
            post: post_from_row(row),
        })
        .collect())
}

fn comment_with_author(row: CommentRow, accounts: &HashMap<String, Account>) -> CommentWithAuthor {
    CommentWithAuthor {
        user: accounts.get(&row.user_id).cloned(),
        comment: Comment {
            id: parse_id(&row.id, "comment id"),
            post_id: parse_id(&row.post_id, "comment post_id"),
            user_id: parse_id(&row.user_id, "comment user_id"),
            content: row.content,
            created_at: parse_time(&row.created_at),
        },
    }
}

fn thread_message(row: MessageRow, accounts: &HashMap<String, Account>) -> ThreadMessage {
    ThreadMessage {
        sender: accounts.get(&row.sender_id).cloned(),
        receiver: accounts.get(&row.receiver_id).cloned(),
        message: message_from_row(row),
    }
}

fn room_message(row: GroupMessageRow, accounts: &HashMap<String, Account>) -> RoomMessage {
    RoomMessage {
        sender: accounts.get(&row.sender_id).cloned(),
        message: GroupMessage {
            id: parse_id(&row.id, "group message id"),
            sender_id: parse_id(&row.sender_id, "group message sender_id"),
            content: row.content,
            image: row.image,
            created_at: parse_time(&row.created_at),
        },
    }
}

// -- Row conversion --

fn account_from_row(row: AccountRow) -> Account {
    let role = row.role.parse().unwrap_or_else(|e| {
        warn!("Corrupt role on account '{}': {}", row.id, e);
        Role::Type1
    });
    let frame_style = row.frame_style.parse().unwrap_or_else(|e| {
        warn!("Corrupt frame_style on account '{}': {}", row.id, e);
        FrameStyle::None
    });

    Account {
        id: parse_id(&row.id, "account id"),
        email: row.email,
        username: row.username,
        display_name: row.display_name,
        avatar: row.avatar,
        bio: row.bio,
        role,
        frame_style,
        is_shiny: row.is_shiny,
        is_online: row.is_online,
        is_verified: row.is_verified,
        last_seen: row.last_seen.as_deref().map(parse_time),
        created_at: parse_time(&row.created_at),
        updated_at: row.updated_at.as_deref().map(parse_time),
    }
}

fn record_from_row(row: AccountRow) -> AccountRecord {
    let password_hash = row.password_hash.clone();
    AccountRecord {
        account: account_from_row(row),
        password_hash,
    }
}

fn post_from_row(row: PostRow) -> Post {
    Post {
        id: parse_id(&row.id, "post id"),
        content: row.content,
        image: row.image,
        author_id: parse_id(&row.author_id, "post author_id"),
        created_at: parse_time(&row.created_at),
    }
}

fn like_from_row(row: LikeRow) -> Like {
    Like {
        id: parse_id(&row.id, "like id"),
        post_id: parse_id(&row.post_id, "like post_id"),
        user_id: parse_id(&row.user_id, "like user_id"),
        kind: row.kind.parse().unwrap_or_else(|e| {
            warn!("Corrupt type on like '{}': {}", row.id, e);
            LikeKind::Like
        }),
        created_at: parse_time(&row.created_at),
    }
}

fn message_from_row(row: MessageRow) -> DirectMessage {
    DirectMessage {
        id: parse_id(&row.id, "message id"),
        sender_id: parse_id(&row.sender_id, "message sender_id"),
        receiver_id: parse_id(&row.receiver_id, "message receiver_id"),
        content: row.content,
        image: row.image,
        is_read: row.is_read,
        created_at: parse_time(&row.created_at),
    }
}

fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn parse_time(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}
