#![allow(dead_code)]

use std::sync::Arc;

use hub_client::{Backend, Hub, ImageHost, LocalBackend, SessionStore};
use hub_types::api::{AccountChanges, RegisterRequest};
use hub_types::{Account, Role};

pub const PASSWORD: &str = "hunter22";

pub fn store() -> Arc<dyn Backend> {
    Arc::new(LocalBackend::in_memory().unwrap())
}

/// A fresh client with its own session over a shared store.
pub fn client(store: &Arc<dyn Backend>) -> Hub {
    Hub::new(
        store.clone(),
        SessionStore::in_memory(),
        ImageHost::new("", "http://127.0.0.1:9/upload"),
    )
}

pub fn request(username: &str, role: Role) -> RegisterRequest {
    RegisterRequest {
        email: format!("{}@example.com", username),
        username: username.to_string(),
        password: PASSWORD.to_string(),
        display_name: None,
        role,
        avatar: None,
    }
}

pub async fn member(store: &Arc<dyn Backend>, username: &str) -> (Hub, Account) {
    let hub = client(store);
    let account = hub.register(request(username, Role::Type1)).await.unwrap();
    (hub, account)
}

/// Registered as an ordinary member, promoted at the store, then signed in
/// again so the session carries the role.
pub async fn admin(store: &Arc<dyn Backend>, username: &str) -> (Hub, Account) {
    let (hub, account) = member(store, username).await;
    store
        .update_account(
            account.id,
            AccountChanges { role: Some(Role::Admin), ..AccountChanges::default() },
        )
        .await
        .unwrap();
    let account = hub.login(&account.email, PASSWORD).await.unwrap();
    assert!(account.is_admin());
    (hub, account)
}
