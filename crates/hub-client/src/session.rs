use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::{info, warn};

use hub_types::Account;

use crate::error::{HubError, Result};

/// The signed-in account, mirrored to a JSON file so a restart can resume
/// without logging in again.
pub struct SessionStore {
    path: Option<PathBuf>,
    current: RwLock<Option<Account>>,
}

impl SessionStore {
    /// Memory-only store; nothing survives the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: RwLock::new(None),
        }
    }

    /// Open the store at `path`, restoring whatever session it holds.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let restored = load(&path).await;
        if let Some(account) = &restored {
            info!("Restored session for '{}'", account.username);
        }
        Self {
            path: Some(path),
            current: RwLock::new(restored),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn current(&self) -> Option<Account> {
        self.current.read().await.clone()
    }

    /// The signed-in account, or `NotLoggedIn`.
    pub async fn require(&self) -> Result<Account> {
        self.current().await.ok_or(HubError::NotLoggedIn)
    }

    pub async fn set(&self, account: Account) -> Result<()> {
        if let Some(path) = &self.path {
            let json = serde_json::to_vec_pretty(&account)?;
            tokio::fs::write(path, json).await?;
        }
        *self.current.write().await = Some(account);
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        *self.current.write().await = None;
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

async fn load(path: &Path) -> Option<Account> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Cannot read session file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(account) => Some(account),
        Err(e) => {
            warn!("Ignoring corrupt session file {}: {}", path.display(), e);
            None
        }
    }
}
