use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FrameStyle, LikeKind, Role};

// -- Auth --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub avatar: Option<String>,
}

/// Row inserted into the `users` table on registration.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
    pub avatar: String,
    pub bio: String,
    pub role: Role,
    pub frame_style: FrameStyle,
    pub is_shiny: bool,
    pub is_online: bool,
    pub is_verified: bool,
}

/// Field-level patch of an account row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_style: Option<FrameStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_shiny: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AccountChanges {
    pub fn presence(online: bool, at: DateTime<Utc>) -> Self {
        Self {
            is_online: Some(online),
            last_seen: Some(at),
            ..Self::default()
        }
    }
}

/// The only account fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn into_changes(self, at: DateTime<Utc>) -> AccountChanges {
        AccountChanges {
            display_name: self.display_name,
            bio: self.bio,
            avatar: self.avatar,
            updated_at: Some(at),
            ..AccountChanges::default()
        }
    }
}

/// Role and decorative flags, settable only by an administrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminUpdate {
    pub role: Option<Role>,
    pub frame_style: Option<FrameStyle>,
    pub is_shiny: Option<bool>,
    pub is_verified: Option<bool>,
}

impl AdminUpdate {
    pub fn into_changes(self, at: DateTime<Utc>) -> AccountChanges {
        AccountChanges {
            role: self.role,
            frame_style: self.frame_style,
            is_shiny: self.is_shiny,
            is_verified: self.is_verified,
            updated_at: Some(at),
            ..AccountChanges::default()
        }
    }
}

// -- Posts --

#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewLike {
    pub post_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: LikeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub content: String,
    pub post_id: Uuid,
    pub user_id: Uuid,
}

// -- Messages --

#[derive(Debug, Clone, Serialize)]
pub struct NewDirectMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGroupMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub sender_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_never_touches_flags() {
        let changes = ProfileUpdate {
            display_name: Some("Mira".into()),
            ..ProfileUpdate::default()
        }
        .into_changes(Utc::now());

        let body = serde_json::to_value(&changes).unwrap();
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        assert!(body.get("display_name").is_some());
        assert!(body.get("updated_at").is_some());
    }
}
