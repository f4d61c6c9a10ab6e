/// Database row types. These map directly to SQLite rows and stay
/// independent of the hub-types models; conversion happens in the client.

#[derive(Debug, Clone)]
pub struct AccountRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub role: String,
    pub frame_style: String,
    pub is_shiny: bool,
    pub is_online: bool,
    pub is_verified: bool,
    pub last_seen: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Values for a fresh `users` row; the store stamps `created_at`.
#[derive(Debug, Clone)]
pub struct NewAccountRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub role: String,
    pub frame_style: String,
    pub is_shiny: bool,
    pub is_online: bool,
    pub is_verified: bool,
}

/// Column-level patch; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub frame_style: Option<String>,
    pub is_shiny: Option<bool>,
    pub is_verified: Option<bool>,
    pub is_online: Option<bool>,
    pub last_seen: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: String,
    pub content: String,
    pub image: Option<String>,
    pub author_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct LikeRow {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub kind: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: Option<String>,
    pub image: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct GroupMessageRow {
    pub id: String,
    pub sender_id: String,
    pub content: Option<String>,
    pub image: Option<String>,
    pub created_at: String,
}
