mod common;

use hub_client::HubError;
use hub_types::api::AdminUpdate;
use hub_types::{FrameStyle, Role};

use common::{admin, member, store};

#[tokio::test]
async fn members_cannot_use_admin_operations() {
    let store = store();
    let (hub, me) = member(&store, "kit").await;
    let post = hub.create_post("mine", None).await.unwrap().post.id;

    assert!(matches!(hub.admin_users().await, Err(HubError::Forbidden)));
    assert!(matches!(hub.site_stats().await, Err(HubError::Forbidden)));
    assert!(matches!(
        hub.admin_update_user(me.id, AdminUpdate { role: Some(Role::Admin), ..AdminUpdate::default() })
            .await,
        Err(HubError::Forbidden)
    ));
    assert!(matches!(hub.admin_delete_user(me.id).await, Err(HubError::Forbidden)));
    assert!(matches!(hub.admin_delete_post(post).await, Err(HubError::Forbidden)));

    let unchanged = hub.user(me.id).await.unwrap().unwrap();
    assert_eq!(unchanged.role, Role::Type1);
}

#[tokio::test]
async fn admin_edits_decorations_and_role() {
    let store = store();
    let (root, _) = admin(&store, "root").await;
    let (_, target) = member(&store, "lux").await;

    let updated = root
        .admin_update_user(
            target.id,
            AdminUpdate {
                role: Some(Role::Type3),
                frame_style: Some(FrameStyle::Neon),
                is_shiny: Some(true),
                is_verified: Some(true),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.role, Role::Type3);
    assert_eq!(updated.frame_style, FrameStyle::Neon);
    assert!(updated.is_shiny);
    assert!(updated.is_verified);
    assert_eq!(updated.email, target.email);
}

#[tokio::test]
async fn self_edit_refreshes_session() {
    let store = store();
    let (root, me) = admin(&store, "max").await;

    root.admin_update_user(me.id, AdminUpdate { frame_style: Some(FrameStyle::Fire), ..AdminUpdate::default() })
        .await
        .unwrap();

    let session = root.current_user().await.unwrap();
    assert_eq!(session.frame_style, FrameStyle::Fire);
    assert!(session.is_admin());
}

#[tokio::test]
async fn listing_deleting_and_counting() {
    let store = store();
    let (root, _) = admin(&store, "nox").await;
    let (ann, ann_account) = member(&store, "ann").await;
    let (_, ben) = member(&store, "ben").await;

    let post = ann.create_post("soon gone", None).await.unwrap().post.id;
    ann.send_message(ben.id, "hi", None).await.unwrap();
    ann.send_group_message("hello room", None).await.unwrap();

    let users = root.admin_users().await.unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["ben", "ann", "nox"]);

    let stats = root.site_stats().await.unwrap();
    assert_eq!(stats.users, 3);
    assert_eq!(stats.posts, 1);
    assert_eq!(stats.messages, 1);
    assert_eq!(stats.group_messages, 1);
    assert_eq!(stats.online_users, 3);

    root.admin_delete_post(post).await.unwrap();
    assert!(matches!(root.admin_delete_post(post).await, Err(HubError::NotFound(_))));

    root.admin_delete_user(ann_account.id).await.unwrap();
    let stats = root.site_stats().await.unwrap();
    assert_eq!(stats.users, 2);
    assert_eq!(stats.messages, 0);
    assert_eq!(stats.group_messages, 0);
}

#[tokio::test]
async fn deleting_own_account_signs_out() {
    let store = store();
    let (root, me) = admin(&store, "oak").await;
    let (_, other) = member(&store, "pim").await;

    root.admin_delete_user(other.id).await.unwrap();
    assert!(root.current_user().await.is_some());

    root.admin_delete_user(me.id).await.unwrap();
    assert!(root.current_user().await.is_none());
    assert!(matches!(root.create_post("still here?", None).await, Err(HubError::NotLoggedIn)));
}
