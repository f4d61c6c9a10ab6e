mod common;

use hub_client::{Hub, HubError, ImageHost, SessionStore};
use hub_types::api::ProfileUpdate;
use hub_types::{FrameStyle, Role};

use common::{PASSWORD, client, member, request, store};

#[tokio::test]
async fn register_fills_defaults_and_signs_in() {
    let store = store();
    let hub = client(&store);

    let mut req = request("  nova ", Role::Type3);
    req.email = " nova@example.com ".into();
    let account = hub.register(req).await.unwrap();

    assert_eq!(account.username, "nova");
    assert_eq!(account.email, "nova@example.com");
    assert_eq!(account.display_name.as_deref(), Some("nova"));
    assert_eq!(
        account.avatar.as_deref(),
        Some("https://api.dicebear.com/7.x/avataaars/svg?seed=nova")
    );
    assert_eq!(account.role, Role::Type3);
    assert_eq!(account.frame_style, FrameStyle::None);
    assert!(account.is_online);
    assert!(!account.is_shiny);
    assert!(!account.is_verified);

    assert_eq!(hub.current_user().await, Some(account));
}

#[tokio::test]
async fn duplicate_email_is_checked_before_username() {
    let store = store();
    member(&store, "mira").await;
    let hub = client(&store);

    // same email and same username: email wins
    let err = hub.register(request("mira", Role::Type1)).await.unwrap_err();
    assert!(matches!(err, HubError::EmailTaken));

    let mut other_email = request("mira", Role::Type1);
    other_email.email = "someone@example.com".into();
    let err = hub.register(other_email).await.unwrap_err();
    assert!(matches!(err, HubError::UsernameTaken));

    assert!(hub.current_user().await.is_none());
}

#[tokio::test]
async fn register_rejects_bad_input() {
    let hub = client(&store());

    let mut no_at = request("kai", Role::Type1);
    no_at.email = "kai.example.com".into();
    assert!(matches!(hub.register(no_at).await, Err(HubError::Validation(_))));

    let mut blank_name = request("kai", Role::Type1);
    blank_name.username = "   ".into();
    assert!(matches!(hub.register(blank_name).await, Err(HubError::Validation(_))));

    let mut short = request("kai", Role::Type1);
    short.password = "12345".into();
    assert!(matches!(hub.register(short).await, Err(HubError::Validation(_))));

    assert!(matches!(
        hub.register(request("kai", Role::Admin)).await,
        Err(HubError::Validation(_))
    ));

    // none of the rejected attempts left a row behind
    assert!(hub.list_users(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn login_checks_password_and_marks_online() {
    let store = store();
    let (first, account) = member(&store, "lio").await;
    first.logout().await.unwrap();
    assert!(first.current_user().await.is_none());

    let offline = first.user(account.id).await.unwrap().unwrap();
    assert!(!offline.is_online);
    assert!(offline.last_seen.is_some());

    let hub = client(&store);
    assert!(matches!(
        hub.login("lio@example.com", "wrong-password").await,
        Err(HubError::InvalidCredentials)
    ));
    assert!(matches!(
        hub.login("nobody@example.com", PASSWORD).await,
        Err(HubError::InvalidCredentials)
    ));

    let signed_in = hub.login("lio@example.com", PASSWORD).await.unwrap();
    assert!(signed_in.is_online);
    assert_eq!(hub.current_user().await.map(|a| a.id), Some(account.id));
}

#[tokio::test]
async fn session_file_restores_after_restart() {
    let store = store();
    let path = std::env::temp_dir().join(format!("hub-auth-{}.json", uuid::Uuid::new_v4()));

    let images = || ImageHost::new("", "http://127.0.0.1:9/upload");
    let hub = Hub::new(store.clone(), SessionStore::open(&path).await, images());
    let account = hub.register(request("rue", Role::Type2)).await.unwrap();

    let restarted = Hub::new(store.clone(), SessionStore::open(&path).await, images());
    assert_eq!(restarted.current_user().await.map(|a| a.id), Some(account.id));

    restarted.logout().await.unwrap();
    assert!(!path.exists());
    let again = Hub::new(store, SessionStore::open(&path).await, images());
    assert!(again.current_user().await.is_none());
}

#[tokio::test]
async fn profile_update_touches_only_profile_fields() {
    let store = store();
    let (hub, _) = member(&store, "ivy").await;

    let updated = hub
        .update_profile(ProfileUpdate {
            display_name: Some("Ivy Q".into()),
            bio: Some("plants".into()),
            avatar: None,
        })
        .await
        .unwrap();

    assert_eq!(updated.name(), "Ivy Q");
    assert_eq!(updated.bio.as_deref(), Some("plants"));
    assert_eq!(updated.role, Role::Type1);
    assert!(updated.updated_at.is_some());
    assert_eq!(hub.current_user().await, Some(updated));
}

#[tokio::test]
async fn change_password_validates_then_rehashes() {
    let store = store();
    let (hub, account) = member(&store, "oak").await;

    assert!(matches!(
        hub.change_password(PASSWORD, "newpass1", "newpass2").await,
        Err(HubError::Validation(_))
    ));
    assert!(matches!(
        hub.change_password(PASSWORD, "abc", "abc").await,
        Err(HubError::Validation(_))
    ));
    assert!(matches!(
        hub.change_password("not-it", "newpass1", "newpass1").await,
        Err(HubError::InvalidCredentials)
    ));

    hub.change_password(PASSWORD, "newpass1", "newpass1").await.unwrap();

    let other = client(&store);
    assert!(other.login(&account.email, PASSWORD).await.is_err());
    assert!(other.login(&account.email, "newpass1").await.is_ok());
}

#[tokio::test]
async fn signed_out_operations_are_refused() {
    let hub = client(&store());
    assert!(matches!(
        hub.update_profile(ProfileUpdate::default()).await,
        Err(HubError::NotLoggedIn)
    ));
    assert!(matches!(hub.conversations().await, Err(HubError::NotLoggedIn)));
    assert!(matches!(
        hub.send_group_message("hello", None).await,
        Err(HubError::NotLoggedIn)
    ));
    // logging out without a session is a no-op
    hub.logout().await.unwrap();
}
