use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Enumerations --

/// Membership tier. The three ordinary tiers are what a user picks at
/// registration; `Admin` is only ever assigned by another administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "TYPE_1")]
    Type1,
    #[serde(rename = "TYPE_2")]
    Type2,
    #[serde(rename = "TYPE_3")]
    Type3,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Type1 => "TYPE_1",
            Self::Type2 => "TYPE_2",
            Self::Type3 => "TYPE_3",
            Self::Admin => "ADMIN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Type1 => "Type 1",
            Self::Type2 => "Type 2",
            Self::Type3 => "Type 3",
            Self::Admin => "Administrator",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TYPE_1" | "TYPE1" | "1" => Ok(Self::Type1),
            "TYPE_2" | "TYPE2" | "2" => Ok(Self::Type2),
            "TYPE_3" | "TYPE3" | "3" => Ok(Self::Type3),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(UnknownVariant::new("role", s)),
        }
    }
}

/// Decorative avatar border, administrator-assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrameStyle {
    #[default]
    None,
    Fire,
    Gold,
    Neon,
}

impl FrameStyle {
    pub const ALL: [FrameStyle; 4] = [Self::None, Self::Fire, Self::Gold, Self::Neon];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Fire => "FIRE",
            Self::Gold => "GOLD",
            Self::Neon => "NEON",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "No frame",
            Self::Fire => "Fire",
            Self::Gold => "Gold",
            Self::Neon => "Neon",
        }
    }
}

impl fmt::Display for FrameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameStyle {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|frame| frame.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("frame style", s))
    }
}

/// Polarity of a reaction on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LikeKind {
    Like,
    Dislike,
}

impl LikeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Dislike => "DISLIKE",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Like => Self::Dislike,
            Self::Dislike => Self::Like,
        }
    }
}

impl fmt::Display for LikeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LikeKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIKE" => Ok(Self::Like),
            "DISLIKE" => Ok(Self::Dislike),
            _ => Err(UnknownVariant::new("like type", s)),
        }
    }
}

/// Returned when a stored or typed string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

// -- Accounts --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub frame_style: FrameStyle,
    #[serde(default)]
    pub is_shiny: bool,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub is_verified: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Display name when set, username otherwise.
    pub fn name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// An account row together with its stored credential. Only the login path
/// ever sees this; the session keeps the bare [`Account`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(flatten)]
    pub account: Account,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStats {
    pub posts_count: u64,
    pub likes_count: u64,
}

// -- Posts --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A post with its author, reactions and comments joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<Account>,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<CommentWithAuthor>,
}

impl FeedPost {
    pub fn like_count(&self) -> usize {
        self.count(LikeKind::Like)
    }

    pub fn dislike_count(&self) -> usize {
        self.count(LikeKind::Dislike)
    }

    /// The reaction `user_id` currently has on this post, if any.
    pub fn reaction_of(&self, user_id: Uuid) -> Option<LikeKind> {
        self.likes.iter().find(|l| l.user_id == user_id).map(|l| l.kind)
    }

    fn count(&self, kind: LikeKind) -> usize {
        self.likes.iter().filter(|l| l.kind == kind).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: LikeKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<Account>,
}

// -- Direct messages --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl DirectMessage {
    /// The other endpoint of this message as seen from `me`.
    pub fn counterpart(&self, me: Uuid) -> Uuid {
        if self.sender_id == me { self.receiver_id } else { self.sender_id }
    }
}

/// A direct message with both endpoints joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    #[serde(flatten)]
    pub message: DirectMessage,
    pub sender: Option<Account>,
    pub receiver: Option<Account>,
}

/// Derived per-counterpart summary of a user's direct messages. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub user: Account,
    pub last_message: Option<DirectMessage>,
    pub unread_count: usize,
}

// -- Group room --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMessage {
    #[serde(flatten)]
    pub message: GroupMessage,
    pub sender: Option<Account>,
}

// -- Admin --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStats {
    pub users: u64,
    pub posts: u64,
    pub messages: u64,
    pub group_messages: u64,
    pub online_users: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_json() -> serde_json::Value {
        serde_json::json!({
            "id": "6f1c2a52-0d7e-4f0e-9a59-0c4f6a3c2b10",
            "email": "mira@example.com",
            "username": "mira",
            "display_name": null,
            "avatar": "https://img.example/mira.png",
            "bio": "",
            "role": "TYPE_2",
            "frame_style": "GOLD",
            "is_shiny": true,
            "is_online": false,
            "is_verified": true,
            "last_seen": null,
            "created_at": "2025-03-01T10:00:00.000000Z",
            "updated_at": null,
            "password_hash": "$argon2id$stub"
        })
    }

    #[test]
    fn account_reads_store_columns() {
        let account: Account = serde_json::from_value(account_json()).unwrap();
        assert_eq!(account.role, Role::Type2);
        assert_eq!(account.frame_style, FrameStyle::Gold);
        assert!(account.is_shiny && account.is_verified);
        assert_eq!(account.name(), "mira");
    }

    #[test]
    fn record_keeps_hash_apart_from_account() {
        let record: AccountRecord = serde_json::from_value(account_json()).unwrap();
        assert_eq!(record.password_hash, "$argon2id$stub");

        let session = serde_json::to_value(&record.account).unwrap();
        assert!(session.get("password_hash").is_none());
    }

    #[test]
    fn like_column_is_named_type() {
        let like: Like = serde_json::from_value(serde_json::json!({
            "id": "0b8e2d6e-9b43-4a52-8d43-0e7d1e6c9a01",
            "post_id": "1b8e2d6e-9b43-4a52-8d43-0e7d1e6c9a01",
            "user_id": "2b8e2d6e-9b43-4a52-8d43-0e7d1e6c9a01",
            "type": "DISLIKE",
            "created_at": "2025-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(like.kind, LikeKind::Dislike);
        assert_eq!(like.kind.opposite(), LikeKind::Like);
    }

    #[test]
    fn role_parsing_accepts_short_forms() {
        assert_eq!("type_1".parse::<Role>().unwrap(), Role::Type1);
        assert_eq!("3".parse::<Role>().unwrap(), Role::Type3);
        assert!("moderator".parse::<Role>().is_err());
        assert_eq!("neon".parse::<FrameStyle>().unwrap(), FrameStyle::Neon);
    }
}
