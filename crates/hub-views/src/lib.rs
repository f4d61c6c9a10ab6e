//! Per-screen state for SocialHub.
//!
//! Each screen owns a [`Hub`](hub_client::Hub) clone and the data it shows.
//! Listings that fail are logged and shown empty; mutations hand their error
//! back to the caller so it can be rendered inline.

pub mod admin;
pub mod chat;
pub mod gallery;
pub mod group_chat;
pub mod poll;
pub mod profile;
pub mod radar;
pub mod settings;
pub mod shell;

pub use poll::Poller;
pub use shell::{Shell, View};

use tracing::warn;

pub(crate) fn or_empty<T: Default>(what: &str, result: hub_client::Result<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("Failed to load {}: {}", what, e);
        T::default()
    })
}
