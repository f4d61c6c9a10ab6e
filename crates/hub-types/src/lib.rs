//! Shared models for the SocialHub client.
//!
//! Field names follow the column names of the hosted table store so the same
//! types deserialize straight out of a REST response and out of the local store.

pub mod api;
pub mod models;
pub mod query;

pub use models::*;
