use std::fmt;
use std::str::FromStr;

use tracing::info;
use uuid::Uuid;

use hub_client::{Hub, HubError, Result};
use hub_types::{Account, UnknownVariant};

/// The main screen currently shown.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum View {
    #[default]
    Radar,
    Gallery,
    /// Direct messages, optionally opened on one counterpart.
    Chat { with: Option<Account> },
    GroupChat,
    /// Someone's profile; `None` is your own.
    Profile { user: Option<Uuid> },
    Settings,
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Radar => "radar",
            Self::Gallery => "gallery",
            Self::Chat { .. } => "chat",
            Self::GroupChat => "group-chat",
            Self::Profile { .. } => "profile",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a bare tab name, without a chat or profile target.
impl FromStr for View {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "radar" => Ok(Self::Radar),
            "gallery" => Ok(Self::Gallery),
            "chat" => Ok(Self::Chat { with: None }),
            "group-chat" | "group" | "room" => Ok(Self::GroupChat),
            "profile" => Ok(Self::Profile { user: None }),
            "settings" => Ok(Self::Settings),
            _ => Err(UnknownVariant::new("view", s)),
        }
    }
}

/// Top-level navigation state.
pub struct Shell {
    hub: Hub,
    user: Option<Account>,
    view: View,
    admin_open: bool,
}

impl Shell {
    /// Start on the radar with whatever session was restored.
    pub async fn start(hub: Hub) -> Self {
        let user = hub.current_user().await;
        if let Some(user) = &user {
            info!("Resuming session for '{}'", user.username);
        }
        Self {
            hub,
            user,
            view: View::Radar,
            admin_open: false,
        }
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn user(&self) -> Option<&Account> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn is_admin_open(&self) -> bool {
        self.admin_open
    }

    /// Pick up the account after a login or registration.
    pub async fn authenticated(&mut self) {
        self.user = self.hub.current_user().await;
        self.view = View::Radar;
    }

    /// Re-read the session, e.g. after the profile was edited.
    pub async fn refresh_user(&mut self) {
        self.user = self.hub.current_user().await;
    }

    /// Switch tabs. Any chat or profile target not carried by `view` is
    /// forgotten.
    pub fn navigate(&mut self, view: View) {
        self.view = view;
    }

    pub fn message_user(&mut self, user: Account) {
        self.view = View::Chat { with: Some(user) };
    }

    pub fn view_profile(&mut self, user: Uuid) {
        self.view = View::Profile { user: Some(user) };
    }

    pub fn open_admin(&mut self) -> Result<()> {
        match &self.user {
            Some(user) if user.is_admin() => {
                self.admin_open = true;
                Ok(())
            }
            Some(_) => Err(HubError::Forbidden),
            None => Err(HubError::NotLoggedIn),
        }
    }

    pub fn close_admin(&mut self) {
        self.admin_open = false;
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.hub.logout().await?;
        self.user = None;
        self.view = View::Radar;
        self.admin_open = false;
        Ok(())
    }
}
