use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use hub_client::Hub;
use hub_types::{Account, Role, UnknownVariant};

use crate::or_empty;

/// Which tier the directory shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Only(Role),
}

impl RoleFilter {
    pub fn admits(self, account: &Account) -> bool {
        match self {
            Self::All => true,
            Self::Only(role) => account.role == role,
        }
    }
}

impl fmt::Display for RoleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(role) => f.write_str(role.as_str()),
        }
    }
}

impl FromStr for RoleFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let role: Role = s.parse()?;
        if role.is_admin() {
            return Err(UnknownVariant::new("role filter", s));
        }
        Ok(Self::Only(role))
    }
}

/// The member directory.
pub struct Radar {
    hub: Hub,
    pub filter: RoleFilter,
    pub search: String,
    users: Vec<Account>,
}

impl Radar {
    pub fn new(hub: Hub) -> Self {
        Self {
            hub,
            filter: RoleFilter::All,
            search: String::new(),
            users: Vec::new(),
        }
    }

    pub async fn load(&mut self) {
        self.users = or_empty("users", self.hub.list_users(None).await);
    }

    /// Accounts passing both the role filter and the search box.
    pub fn visible(&self) -> Vec<&Account> {
        self.users
            .iter()
            .filter(|a| self.filter.admits(a))
            .filter(|a| matches_search(a, &self.search))
            .collect()
    }
}

/// Case-insensitive substring match on username, display name and bio. A blank
/// query matches everyone.
pub fn matches_search(account: &Account, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    let hit = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(&query));
    hit(Some(&account.username)) || hit(account.display_name.as_deref()) || hit(account.bio.as_deref())
}

pub fn last_seen_label(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = last_seen else {
        return "unknown".into();
    };
    let minutes = (now - at).num_minutes();
    if minutes < 1 {
        "just now".into()
    } else if minutes < 60 {
        format!("{} minutes ago", minutes)
    } else if minutes < 60 * 24 {
        format!("{} hours ago", minutes / 60)
    } else {
        format!("{} days ago", minutes / (60 * 24))
    }
}
