//! The table-store boundary.
//!
//! Every method is one filtered read or one write against the store. Nothing
//! here retries, batches or wraps calls in a transaction; composite behavior
//! (uniqueness pre-checks, like toggling, conversation grouping) lives in the
//! operation modules on top.

pub mod local;
pub mod rest;

use async_trait::async_trait;
use uuid::Uuid;

use hub_types::api::{
    AccountChanges, NewAccount, NewComment, NewDirectMessage, NewGroupMessage, NewLike, NewPost,
};
use hub_types::query::{AccountQuery, PageRange, Table};
use hub_types::{
    Account, AccountRecord, CommentWithAuthor, DirectMessage, FeedPost, Like, LikeKind, Post,
    RoomMessage, ThreadMessage,
};

use crate::error::Result;

pub use local::LocalBackend;
pub use rest::RestBackend;

#[async_trait]
pub trait Backend: Send + Sync {
    // -- Accounts --

    async fn account_by_email(&self, email: &str) -> Result<Option<AccountRecord>>;
    async fn account_by_username(&self, username: &str) -> Result<Option<Account>>;
    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>>;
    async fn list_accounts(&self, query: AccountQuery) -> Result<Vec<Account>>;
    async fn insert_account(&self, account: NewAccount) -> Result<Account>;
    /// `None` when no account has that id.
    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> Result<Option<Account>>;
    async fn delete_account(&self, id: Uuid) -> Result<bool>;
    async fn count_online(&self) -> Result<u64>;

    // -- Posts --

    /// Reverse-chronological window with author, likes and comments joined.
    async fn list_posts(&self, range: PageRange) -> Result<Vec<FeedPost>>;
    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<FeedPost>>;
    async fn post_by_id(&self, id: Uuid) -> Result<Option<Post>>;
    async fn insert_post(&self, post: NewPost) -> Result<FeedPost>;
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    // -- Likes --

    async fn find_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Like>>;
    async fn insert_like(&self, like: NewLike) -> Result<Like>;
    async fn set_like_kind(&self, id: Uuid, kind: LikeKind) -> Result<Like>;
    async fn delete_like(&self, id: Uuid) -> Result<bool>;
    async fn count_likes(&self, post_ids: &[Uuid]) -> Result<u64>;

    // -- Comments --

    /// Oldest first, commenter joined.
    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>>;
    async fn insert_comment(&self, comment: NewComment) -> Result<CommentWithAuthor>;

    // -- Direct messages --

    /// Messages where `user_id` is either endpoint, newest first.
    async fn messages_involving(&self, user_id: Uuid) -> Result<Vec<DirectMessage>>;
    /// The thread between two users, oldest first, endpoints joined.
    async fn messages_between(&self, a: Uuid, b: Uuid) -> Result<Vec<ThreadMessage>>;
    async fn insert_message(&self, message: NewDirectMessage) -> Result<ThreadMessage>;
    /// Flag every message from `sender_id` to `receiver_id` as read.
    async fn mark_read(&self, receiver_id: Uuid, sender_id: Uuid) -> Result<u64>;

    // -- Group room --

    /// Newest-first window with the sender joined.
    async fn group_messages(&self, range: PageRange) -> Result<Vec<RoomMessage>>;
    async fn insert_group_message(&self, message: NewGroupMessage) -> Result<RoomMessage>;

    /// Exact row count of a table.
    async fn count(&self, table: Table) -> Result<u64>;
}
