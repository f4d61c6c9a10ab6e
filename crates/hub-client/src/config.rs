use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HubError, Result};

pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://api.imgbb.com/1/upload";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Hosted PostgREST-style table store.
    Rest { url: String, key: String },
    /// Embedded SQLite file.
    Local { db_path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub conversations: Duration,
    pub thread: Duration,
    pub room: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            conversations: Duration::from_secs(5),
            thread: Duration::from_secs(3),
            room: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub image_key: String,
    pub image_endpoint: String,
    pub session_path: PathBuf,
    pub poll: PollIntervals,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match var("HUB_BACKEND").as_deref().unwrap_or("local") {
            "rest" => BackendConfig::Rest {
                url: var("HUB_BACKEND_URL")
                    .ok_or_else(|| HubError::Config("HUB_BACKEND_URL is required for the rest backend".into()))?
                    .trim_end_matches('/')
                    .to_string(),
                key: var("HUB_BACKEND_KEY")
                    .ok_or_else(|| HubError::Config("HUB_BACKEND_KEY is required for the rest backend".into()))?,
            },
            "local" => BackendConfig::Local {
                db_path: var("HUB_DB_PATH").unwrap_or_else(|| "socialhub.db".into()).into(),
            },
            other => return Err(HubError::Config(format!("unknown HUB_BACKEND '{}'", other))),
        };

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match var(key) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| HubError::Config(format!("{} must be a positive number of seconds", key))),
            }
        };

        let defaults = PollIntervals::default();
        let poll = PollIntervals {
            conversations: secs("HUB_POLL_CONVERSATIONS_SECS", defaults.conversations)?,
            thread: secs("HUB_POLL_THREAD_SECS", defaults.thread)?,
            room: secs("HUB_POLL_ROOM_SECS", defaults.room)?,
        };

        Ok(Self {
            backend,
            image_key: var("HUB_IMAGE_KEY").unwrap_or_default(),
            image_endpoint: var("HUB_IMAGE_ENDPOINT").unwrap_or_else(|| DEFAULT_IMAGE_ENDPOINT.into()),
            session_path: var("HUB_SESSION_PATH")
                .unwrap_or_else(|| "socialhub_session.json".into())
                .into(),
            poll,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ClientConfig> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_store() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.backend, BackendConfig::Local { db_path: "socialhub.db".into() });
        assert_eq!(cfg.image_endpoint, DEFAULT_IMAGE_ENDPOINT);
        assert_eq!(cfg.poll, PollIntervals::default());
    }

    #[test]
    fn rest_requires_url_and_key() {
        assert!(config(&[("HUB_BACKEND", "rest")]).is_err());

        let cfg = config(&[
            ("HUB_BACKEND", "rest"),
            ("HUB_BACKEND_URL", "https://store.example.co/"),
            ("HUB_BACKEND_KEY", "anon"),
        ])
        .unwrap();
        assert_eq!(
            cfg.backend,
            BackendConfig::Rest { url: "https://store.example.co".into(), key: "anon".into() }
        );
    }

    #[test]
    fn poll_intervals_must_be_positive() {
        assert!(config(&[("HUB_POLL_ROOM_SECS", "0")]).is_err());
        assert!(config(&[("HUB_POLL_ROOM_SECS", "soon")]).is_err());
        let cfg = config(&[("HUB_POLL_THREAD_SECS", "10")]).unwrap();
        assert_eq!(cfg.poll.thread, Duration::from_secs(10));
    }
}
