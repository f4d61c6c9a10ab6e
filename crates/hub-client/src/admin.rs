use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use hub_types::api::AdminUpdate;
use hub_types::query::{AccountQuery, Table};
use hub_types::{Account, SiteStats};

use crate::Hub;
use crate::error::{HubError, Result};

impl Hub {
    pub async fn admin_users(&self) -> Result<Vec<Account>> {
        self.require_admin().await?;
        self.backend
            .list_accounts(AccountQuery { role: None, newest_first: true })
            .await
    }

    pub async fn admin_update_user(&self, id: Uuid, update: AdminUpdate) -> Result<Account> {
        let me = self.require_admin().await?;
        let account = self
            .backend
            .update_account(id, update.into_changes(Utc::now()))
            .await?
            .ok_or(HubError::NotFound("account"))?;

        info!("Admin '{}' updated '{}'", me.username, account.username);
        if account.id == me.id {
            self.session.set(account.clone()).await?;
        }
        Ok(account)
    }

    pub async fn admin_delete_user(&self, id: Uuid) -> Result<()> {
        let me = self.require_admin().await?;
        if !self.backend.delete_account(id).await? {
            return Err(HubError::NotFound("account"));
        }
        info!("Admin '{}' deleted account {}", me.username, id);
        if id == me.id {
            self.session.clear().await?;
        }
        Ok(())
    }

    pub async fn admin_delete_post(&self, id: Uuid) -> Result<()> {
        let me = self.require_admin().await?;
        if !self.backend.delete_post(id).await? {
            return Err(HubError::NotFound("post"));
        }
        info!("Admin '{}' deleted post {}", me.username, id);
        Ok(())
    }

    pub async fn site_stats(&self) -> Result<SiteStats> {
        self.require_admin().await?;
        let (users, posts, messages, group_messages, online_users) = tokio::try_join!(
            self.backend.count(Table::Users),
            self.backend.count(Table::Posts),
            self.backend.count(Table::Messages),
            self.backend.count(Table::GroupMessages),
            self.backend.count_online(),
        )?;
        Ok(SiteStats {
            users,
            posts,
            messages,
            group_messages,
            online_users,
        })
    }
}
