use uuid::Uuid;

use hub_types::query::AccountQuery;
use hub_types::{Account, AccountStats, Role};

use crate::Hub;
use crate::error::Result;

impl Hub {
    /// Every account, optionally restricted to one role.
    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<Account>> {
        self.backend
            .list_accounts(AccountQuery { role, newest_first: false })
            .await
    }

    pub async fn user(&self, id: Uuid) -> Result<Option<Account>> {
        self.backend.account_by_id(id).await
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.backend.account_by_username(username.trim()).await
    }

    /// Post count, and reactions of either polarity across those posts.
    pub async fn user_stats(&self, id: Uuid) -> Result<AccountStats> {
        let posts = self.backend.posts_by_author(id).await?;
        let ids: Vec<Uuid> = posts.iter().map(|p| p.post.id).collect();
        let likes_count = self.backend.count_likes(&ids).await?;
        Ok(AccountStats {
            posts_count: posts.len() as u64,
            likes_count,
        })
    }
}
