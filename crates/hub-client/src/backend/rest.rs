use std::fmt::Display;

use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use hub_types::api::{
    AccountChanges, NewAccount, NewComment, NewDirectMessage, NewGroupMessage, NewLike, NewPost,
};
use hub_types::query::{AccountQuery, PageRange, Table};
use hub_types::{
    Account, AccountRecord, CommentWithAuthor, DirectMessage, FeedPost, Like, LikeKind, Post,
    RoomMessage, ThreadMessage,
};

use super::Backend;
use crate::error::{HubError, Result};

const POST_SELECT: &str = "*,author:users!author_id(*),likes(*),comments(*,user:users!user_id(*))";
const COMMENT_SELECT: &str = "*,user:users!user_id(*)";
const THREAD_SELECT: &str = "*,sender:users!sender_id(*),receiver:users!receiver_id(*)";
const ROOM_SELECT: &str = "*,sender:users!sender_id(*)";

/// Backend for a hosted PostgREST-compatible table store.
///
/// The anon key goes out both as the `apikey` header and as the bearer
/// token. Row-level filtering is the store's business.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    key: String,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, key)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key: key.into(),
        }
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table.as_str());
        self.client
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    fn select(&self, table: Table, columns: &str) -> RequestBuilder {
        self.request(Method::GET, table).query(&[("select", columns)])
    }

    fn insert(&self, table: Table, columns: &str) -> RequestBuilder {
        self.request(Method::POST, table)
            .query(&[("select", columns)])
            .header("Prefer", "return=representation")
    }

    fn update(&self, table: Table, columns: &str) -> RequestBuilder {
        self.request(Method::PATCH, table)
            .query(&[("select", columns)])
            .header("Prefer", "return=representation")
    }

    fn delete(&self, table: Table) -> RequestBuilder {
        self.request(Method::DELETE, table)
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
    }

    fn posts_page(&self, range: PageRange) -> RequestBuilder {
        self.select(Table::Posts, POST_SELECT).query(&[
            ("order", "created_at.desc".to_string()),
            ("comments.order", "created_at.asc".to_string()),
            ("offset", range.offset.to_string()),
            ("limit", range.limit.to_string()),
        ])
    }

    fn thread(&self, a: Uuid, b: Uuid) -> RequestBuilder {
        let filter = format!(
            "(and(sender_id.eq.{a},receiver_id.eq.{b}),and(sender_id.eq.{b},receiver_id.eq.{a}))"
        );
        self.select(Table::Messages, THREAD_SELECT)
            .query(&[("or", filter.as_str()), ("order", "created_at.asc")])
    }

    async fn rows<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Vec<T>> {
        let resp = check(req.send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn first<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Option<T>> {
        Ok(self.rows(req).await?.into_iter().next())
    }

    async fn affected(&self, req: RequestBuilder) -> Result<u64> {
        Ok(self.rows::<serde_json::Value>(req).await?.len() as u64)
    }

    async fn count_where(&self, table: Table, filters: &[(&str, String)]) -> Result<u64> {
        let req = self
            .request(Method::HEAD, table)
            .query(&[("select", "id")])
            .query(filters)
            .header("Prefer", "count=exact");
        let resp = check(req.send().await?).await?;

        let range = resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        parse_total(range)
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn account_by_email(&self, email: &str) -> Result<Option<AccountRecord>> {
        self.first(self.select(Table::Users, "*").query(&[("email", eq(email)), limit_one()]))
            .await
    }

    async fn account_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.first(self.select(Table::Users, "*").query(&[("username", eq(username)), limit_one()]))
            .await
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        self.first(self.select(Table::Users, "*").query(&[("id", eq(id)), limit_one()]))
            .await
    }

    async fn list_accounts(&self, query: AccountQuery) -> Result<Vec<Account>> {
        let mut req = self.select(Table::Users, "*");
        if let Some(role) = query.role {
            req = req.query(&[("role", eq(role))]);
        }
        if query.newest_first {
            req = req.query(&[("order", "created_at.desc")]);
        }
        self.rows(req).await
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        debug!("Inserting account '{}'", account.username);
        self.first(self.insert(Table::Users, "*").json(&account))
            .await?
            .ok_or(HubError::NotFound("inserted account"))
    }

    async fn update_account(&self, id: Uuid, changes: AccountChanges) -> Result<Option<Account>> {
        self.first(self.update(Table::Users, "*").query(&[("id", eq(id))]).json(&changes))
            .await
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool> {
        Ok(self.affected(self.delete(Table::Users).query(&[("id", eq(id))])).await? > 0)
    }

    async fn count_online(&self) -> Result<u64> {
        self.count_where(Table::Users, &[("is_online", eq(true))]).await
    }

    async fn list_posts(&self, range: PageRange) -> Result<Vec<FeedPost>> {
        self.rows(self.posts_page(range)).await
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<FeedPost>> {
        let req = self.select(Table::Posts, POST_SELECT).query(&[
            ("author_id", eq(author_id)),
            ("order", "created_at.desc".to_string()),
            ("comments.order", "created_at.asc".to_string()),
        ]);
        self.rows(req).await
    }

    async fn post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        self.first(self.select(Table::Posts, "*").query(&[("id", eq(id)), limit_one()]))
            .await
    }

    async fn insert_post(&self, post: NewPost) -> Result<FeedPost> {
        self.first(self.insert(Table::Posts, POST_SELECT).json(&post))
            .await?
            .ok_or(HubError::NotFound("inserted post"))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        Ok(self.affected(self.delete(Table::Posts).query(&[("id", eq(id))])).await? > 0)
    }

    async fn find_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Like>> {
        let req = self.select(Table::Likes, "*").query(&[
            ("post_id", eq(post_id)),
            ("user_id", eq(user_id)),
            limit_one(),
        ]);
        self.first(req).await
    }

    async fn insert_like(&self, like: NewLike) -> Result<Like> {
        self.first(self.insert(Table::Likes, "*").json(&like))
            .await?
            .ok_or(HubError::NotFound("inserted like"))
    }

    async fn set_like_kind(&self, id: Uuid, kind: LikeKind) -> Result<Like> {
        let req = self
            .update(Table::Likes, "*")
            .query(&[("id", eq(id))])
            .json(&json!({ "type": kind }));
        self.first(req).await?.ok_or(HubError::NotFound("like"))
    }

    async fn delete_like(&self, id: Uuid) -> Result<bool> {
        Ok(self.affected(self.delete(Table::Likes).query(&[("id", eq(id))])).await? > 0)
    }

    async fn count_likes(&self, post_ids: &[Uuid]) -> Result<u64> {
        if post_ids.is_empty() {
            return Ok(0);
        }
        self.count_where(Table::Likes, &[("post_id", in_list(post_ids))]).await
    }

    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let req = self.select(Table::Comments, COMMENT_SELECT).query(&[
            ("post_id", eq(post_id)),
            ("order", "created_at.asc".to_string()),
        ]);
        self.rows(req).await
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<CommentWithAuthor> {
        self.first(self.insert(Table::Comments, COMMENT_SELECT).json(&comment))
            .await?
            .ok_or(HubError::NotFound("inserted comment"))
    }

    async fn messages_involving(&self, user_id: Uuid) -> Result<Vec<DirectMessage>> {
        let req = self.select(Table::Messages, "*").query(&[
            ("or", format!("(sender_id.eq.{user_id},receiver_id.eq.{user_id})")),
            ("order", "created_at.desc".to_string()),
        ]);
        self.rows(req).await
    }

    async fn messages_between(&self, a: Uuid, b: Uuid) -> Result<Vec<ThreadMessage>> {
        self.rows(self.thread(a, b)).await
    }

    async fn insert_message(&self, message: NewDirectMessage) -> Result<ThreadMessage> {
        self.first(self.insert(Table::Messages, THREAD_SELECT).json(&message))
            .await?
            .ok_or(HubError::NotFound("inserted message"))
    }

    async fn mark_read(&self, receiver_id: Uuid, sender_id: Uuid) -> Result<u64> {
        let req = self
            .update(Table::Messages, "id")
            .query(&[
                ("receiver_id", eq(receiver_id)),
                ("sender_id", eq(sender_id)),
                ("is_read", eq(false)),
            ])
            .json(&json!({ "is_read": true }));
        self.affected(req).await
    }

    async fn group_messages(&self, range: PageRange) -> Result<Vec<RoomMessage>> {
        let req = self.select(Table::GroupMessages, ROOM_SELECT).query(&[
            ("order", "created_at.desc".to_string()),
            ("offset", range.offset.to_string()),
            ("limit", range.limit.to_string()),
        ]);
        self.rows(req).await
    }

    async fn insert_group_message(&self, message: NewGroupMessage) -> Result<RoomMessage> {
        self.first(self.insert(Table::GroupMessages, ROOM_SELECT).json(&message))
            .await?
            .ok_or(HubError::NotFound("inserted group message"))
    }

    async fn count(&self, table: Table) -> Result<u64> {
        self.count_where(table, &[]).await
    }
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let url = resp.url().path().to_string();
    let body = resp.text().await.unwrap_or_default();
    warn!("Store request to {} failed with {}: {}", url, status, body);
    Err(HubError::Status {
        status: status.as_u16(),
        body,
    })
}

fn eq(value: impl Display) -> String {
    format!("eq.{}", value)
}

fn in_list(ids: &[Uuid]) -> String {
    let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    format!("in.({})", ids.join(","))
}

fn limit_one() -> (&'static str, String) {
    ("limit", "1".to_string())
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/42`.
fn parse_total(range: &str) -> Result<u64> {
    range
        .rsplit_once('/')
        .and_then(|(_, total)| total.parse().ok())
        .ok_or_else(|| HubError::Status {
            status: 200,
            body: format!("unusable Content-Range '{}'", range),
        })
}
