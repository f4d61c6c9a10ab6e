use uuid::Uuid;

use hub_client::{Hub, HubError, Result};
use hub_types::api::AdminUpdate;
use hub_types::{Account, SiteStats};

use crate::or_empty;

/// The administrator console: every account plus site-wide counters.
pub struct AdminConsole {
    hub: Hub,
    users: Vec<Account>,
    stats: SiteStats,
    pub search: String,
}

impl AdminConsole {
    /// Open and load the console. Refused for anyone but an administrator.
    pub async fn open(hub: Hub) -> Result<Self> {
        let me = hub.session().require().await?;
        if !me.is_admin() {
            return Err(HubError::Forbidden);
        }

        let mut console = Self {
            hub,
            users: Vec::new(),
            stats: SiteStats::default(),
            search: String::new(),
        };
        console.load().await;
        Ok(console)
    }

    pub async fn load(&mut self) {
        let (users, stats) = tokio::join!(self.hub.admin_users(), self.hub.site_stats());
        self.users = or_empty("admin users", users);
        self.stats = or_empty("site stats", stats);
    }

    pub fn stats(&self) -> SiteStats {
        self.stats
    }

    pub fn users(&self) -> &[Account] {
        &self.users
    }

    /// Accounts whose username, email or display name contains the search.
    pub fn filtered(&self) -> Vec<&Account> {
        let query = self.search.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| {
                query.is_empty()
                    || u.username.to_lowercase().contains(&query)
                    || u.email.to_lowercase().contains(&query)
                    || u.display_name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub async fn update_user(&mut self, id: Uuid, update: AdminUpdate) -> Result<Account> {
        let account = self.hub.admin_update_user(id, update).await?;
        if let Some(slot) = self.users.iter_mut().find(|u| u.id == id) {
            *slot = account.clone();
        }
        Ok(account)
    }

    pub async fn delete_user(&mut self, id: Uuid) -> Result<()> {
        self.hub.admin_delete_user(id).await?;
        self.load().await;
        Ok(())
    }

    pub async fn delete_post(&mut self, id: Uuid) -> Result<()> {
        self.hub.admin_delete_post(id).await?;
        self.stats = or_empty("site stats", self.hub.site_stats().await);
        Ok(())
    }
}
