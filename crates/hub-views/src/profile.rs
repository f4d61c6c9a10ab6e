use uuid::Uuid;

use hub_client::Hub;
use hub_types::{Account, AccountStats, FeedPost};

use crate::or_empty;

#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub account: Option<Account>,
    pub stats: AccountStats,
    pub posts: Vec<FeedPost>,
    /// Viewing your own page, which offers editing instead of messaging.
    pub is_own: bool,
}

impl Profile {
    /// Load `user`'s page, or the signed-in account's when `user` is `None`.
    /// An unknown or vanished account gives an empty profile.
    pub async fn load(hub: &Hub, user: Option<Uuid>) -> Self {
        let me = hub.current_user().await.map(|a| a.id);
        let Some(target) = user.or(me) else {
            return Self::default();
        };

        let Some(account) = or_empty("profile", hub.user(target).await) else {
            return Self::default();
        };

        let (stats, posts) = tokio::join!(hub.user_stats(target), hub.posts_by(target));
        Self {
            account: Some(account),
            stats: or_empty("profile stats", stats),
            posts: or_empty("profile posts", posts),
            is_own: me == Some(target),
        }
    }
}
