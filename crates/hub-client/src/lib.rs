//! Data access for SocialHub.
//!
//! [`Hub`] is the single entry point: it owns a [`Backend`], the session and
//! the image relay, and exposes one method per user-facing operation. The
//! operation groups live in their own modules as `impl Hub` blocks.

pub mod backend;
pub mod config;
pub mod error;
pub mod images;
pub mod session;

mod admin;
mod auth;
mod comments;
mod group;
mod likes;
mod messages;
mod posts;
mod users;

use std::sync::Arc;

use tracing::info;

pub use backend::{Backend, LocalBackend, RestBackend};
pub use config::{BackendConfig, ClientConfig, PollIntervals};
pub use error::{HubError, Result};
pub use images::{ImageHost, ImageRef, ImageUpload};
pub use session::SessionStore;

use hub_types::Account;

/// Cheap to clone; every clone shares the same backend, session and relay.
#[derive(Clone)]
pub struct Hub {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    images: Arc<ImageHost>,
}

impl Hub {
    pub fn new(backend: Arc<dyn Backend>, session: SessionStore, images: ImageHost) -> Self {
        Self {
            backend,
            session: Arc::new(session),
            images: Arc::new(images),
        }
    }

    /// Build the backend named by `config` and restore the saved session.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let backend: Arc<dyn Backend> = match &config.backend {
            BackendConfig::Rest { url, key } => {
                info!("Using table store at {}", url);
                Arc::new(RestBackend::new(url.clone(), key.clone()))
            }
            BackendConfig::Local { db_path } => {
                info!("Using local database {}", db_path.display());
                Arc::new(LocalBackend::open(db_path)?)
            }
        };
        let session = SessionStore::open(config.session_path.clone()).await;
        let images = ImageHost::new(config.image_key.clone(), config.image_endpoint.clone());
        Ok(Self::new(backend, session, images))
    }

    /// In-memory database, memory-only session and an image host that is never
    /// reachable.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(
            Arc::new(LocalBackend::in_memory()?),
            SessionStore::in_memory(),
            ImageHost::new("", "http://127.0.0.1:9/upload"),
        ))
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn images(&self) -> &ImageHost {
        &self.images
    }

    pub async fn current_user(&self) -> Option<Account> {
        self.session.current().await
    }

    async fn require_admin(&self) -> Result<Account> {
        let me = self.session.require().await?;
        if me.is_admin() { Ok(me) } else { Err(HubError::Forbidden) }
    }
}
