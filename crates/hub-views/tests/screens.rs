use std::sync::Arc;
use std::time::Duration;

use hub_client::{Backend, Hub, HubError, ImageHost, LocalBackend, PollIntervals, SessionStore};
use hub_types::api::{AccountChanges, AdminUpdate, RegisterRequest};
use hub_types::{Account, FrameStyle, LikeKind, Role};
use hub_views::admin::AdminConsole;
use hub_views::chat::Chat;
use hub_views::gallery::Gallery;
use hub_views::group_chat::GroupChat;
use hub_views::profile::Profile;
use hub_views::radar::{Radar, RoleFilter};
use hub_views::settings::{Notice, Settings};
use hub_views::{Shell, View};

const SLOW: Duration = Duration::from_secs(600);

fn slow_polls() -> PollIntervals {
    PollIntervals { conversations: SLOW, thread: SLOW, room: SLOW }
}

fn store() -> Arc<dyn Backend> {
    Arc::new(LocalBackend::in_memory().unwrap())
}

async fn join(store: &Arc<dyn Backend>, username: &str, role: Role) -> (Hub, Account) {
    let hub = Hub::new(
        store.clone(),
        SessionStore::in_memory(),
        ImageHost::new("", "http://127.0.0.1:9/upload"),
    );
    let account = hub
        .register(RegisterRequest {
            email: format!("{}@example.com", username),
            username: username.into(),
            password: "hunter22".into(),
            display_name: None,
            role,
            avatar: None,
        })
        .await
        .unwrap();
    (hub, account)
}

async fn promote(store: &Arc<dyn Backend>, hub: &Hub, account: &Account) {
    store
        .update_account(account.id, AccountChanges { role: Some(Role::Admin), ..AccountChanges::default() })
        .await
        .unwrap();
    hub.login(&account.email, "hunter22").await.unwrap();
}

#[tokio::test]
async fn radar_filters_and_searches() {
    let store = store();
    let (hub, _) = join(&store, "amber", Role::Type1).await;
    join(&store, "basil", Role::Type2).await;
    join(&store, "cedar", Role::Type2).await;

    let mut radar = Radar::new(hub);
    radar.load().await;
    assert_eq!(radar.visible().len(), 3);

    radar.filter = RoleFilter::Only(Role::Type2);
    let names: Vec<&str> = radar.visible().iter().map(|a| a.username.as_str()).collect();
    assert_eq!(names, ["basil", "cedar"]);

    radar.search = "CED".into();
    assert_eq!(radar.visible().len(), 1);

    radar.filter = RoleFilter::Only(Role::Type3);
    assert!(radar.visible().is_empty());
}

#[tokio::test]
async fn gallery_replaces_then_appends() {
    let store = store();
    let (hub, _) = join(&store, "dune", Role::Type1).await;
    for n in 1..=12 {
        hub.create_post(&format!("p{}", n), None).await.unwrap();
    }

    let gallery = Gallery::new(hub);
    assert!(gallery.load(1).await);
    assert_eq!(gallery.posts().len(), 10);
    assert!(gallery.has_more());

    assert!(gallery.load_more().await);
    let posts = gallery.posts();
    assert_eq!(posts.len(), 12);
    assert_eq!(posts[0].post.content, "p12");
    assert_eq!(posts[11].post.content, "p1");
    assert!(!gallery.has_more());
    assert!(!gallery.load_more().await);

    assert!(gallery.reload().await);
    assert_eq!(gallery.posts().len(), 10);
    assert_eq!(gallery.page(), 1);
}

#[tokio::test]
async fn gallery_drops_overlapping_loads() {
    let store = store();
    let (hub, _) = join(&store, "echo", Role::Type1).await;
    hub.create_post("only", None).await.unwrap();

    let gallery = Gallery::new(hub);
    let (first, second) = tokio::join!(gallery.load(1), gallery.load(1));
    assert!(first);
    assert!(!second);
    assert!(!gallery.is_loading());
    assert_eq!(gallery.posts().len(), 1);
}

#[tokio::test]
async fn gallery_keeps_reactions_and_comments_current() {
    let store = store();
    let (author, _) = join(&store, "fern", Role::Type1).await;
    let (fan, fan_account) = join(&store, "gale", Role::Type1).await;
    let post = author.create_post("sunset", None).await.unwrap().post.id;

    let gallery = Gallery::new(fan);
    gallery.reload().await;

    gallery.react(post, LikeKind::Like).await.unwrap();
    assert_eq!(gallery.posts()[0].like_count(), 1);

    gallery.react(post, LikeKind::Dislike).await.unwrap();
    let cached = &gallery.posts()[0];
    assert_eq!(cached.like_count(), 0);
    assert_eq!(cached.reaction_of(fan_account.id), Some(LikeKind::Dislike));

    gallery.comment(post, "lovely").await.unwrap();
    assert_eq!(gallery.posts()[0].comments.len(), 1);

    assert!(matches!(gallery.delete_post(post).await, Err(HubError::Forbidden)));
    assert_eq!(gallery.posts().len(), 1);
}

#[tokio::test]
async fn chat_opens_on_initial_user_and_sends() {
    let store = store();
    let (ann, ann_account) = join(&store, "ann", Role::Type1).await;
    let (bob, bob_account) = join(&store, "bob", Role::Type1).await;
    bob.send_message(ann_account.id, "hello ann", None).await.unwrap();

    let mut unselected = Chat::open(ann.clone(), slow_polls(), None);
    assert!(matches!(unselected.send_text("hi").await, Err(HubError::Validation(_))));
    assert!(unselected.next_messages().await.is_none());
    drop(unselected);

    let mut chat = Chat::open(ann.clone(), slow_polls(), Some(bob_account.clone()));
    assert_eq!(chat.selected().map(|a| a.id), Some(bob_account.id));

    let thread = chat.next_messages().await.unwrap();
    assert_eq!(thread.len(), 1);

    let conversations = chat.next_conversations().await.unwrap();
    assert_eq!(conversations[0].user.id, bob_account.id);

    chat.send_text("hi bob").await.unwrap();
    let thread = chat.next_messages().await.unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[1].message.content.as_deref(), Some("hi bob"));

    // bob's message was marked read when the thread loaded
    let summary = ann.conversations().await.unwrap();
    assert_eq!(summary[0].unread_count, 0);

    // the image host is unreachable, so nothing is sent
    let failed = chat
        .send_image(hub_client::ImageUpload::new("wave.png", b"png".to_vec()))
        .await;
    assert!(matches!(failed, Err(HubError::Upload(_))));
    assert_eq!(bob.thread(ann_account.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn group_chat_loads_older_pages_on_top() {
    let store = store();
    let (hub, _) = join(&store, "hana", Role::Type1).await;
    for n in 1..=60 {
        hub.send_group_message(&format!("m{}", n), None).await.unwrap();
    }

    let mut room = GroupChat::open(hub, SLOW);
    let newest = room.next().await.unwrap();
    assert_eq!(newest.items.len(), 50);
    assert!(room.has_more());

    assert_eq!(room.load_older().await, 10);
    assert!(!room.has_more());

    let messages = room.messages();
    assert_eq!(messages.len(), 60);
    assert_eq!(messages[0].message.content.as_deref(), Some("m1"));
    assert_eq!(messages[59].message.content.as_deref(), Some("m60"));

    room.send("m61").await.unwrap();
    let refreshed = room.next().await.unwrap();
    assert_eq!(refreshed.items.last().and_then(|m| m.message.content.as_deref()), Some("m61"));
    assert_eq!(
        room.messages().last().and_then(|m| m.message.content.clone()),
        Some("m61".into())
    );
}

#[tokio::test]
async fn group_chat_older_pages_never_repeat_messages() {
    let store = store();
    let (hub, _) = join(&store, "ivo", Role::Type1).await;
    for n in 1..=150 {
        hub.send_group_message(&format!("m{}", n), None).await.unwrap();
    }

    let mut room = GroupChat::open(hub.clone(), SLOW);
    room.next().await.unwrap();
    assert_eq!(room.load_older().await, 50);

    // ten new messages shift every older page by ten
    for n in 151..=160 {
        hub.send_group_message(&format!("m{}", n), None).await.unwrap();
    }
    assert_eq!(room.load_older().await, 40);

    let messages = room.messages();
    let mut ids: Vec<_> = messages.iter().map(|m| m.message.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), messages.len());
    assert_eq!(messages.len(), 140);
    assert_eq!(messages[0].message.content.as_deref(), Some("m11"));
}

#[tokio::test]
async fn group_chat_image_needs_the_host() {
    let store = store();
    let (hub, _) = join(&store, "jun", Role::Type1).await;
    let room = GroupChat::open(hub.clone(), SLOW);

    let failed = room
        .send_image(hub_client::ImageUpload::new("cat.jpg", b"jpg".to_vec()))
        .await;
    assert!(matches!(failed, Err(HubError::Upload(_))));
    assert!(hub.group_messages(1, 50).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn profile_defaults_to_self_and_tolerates_missing_accounts() {
    let store = store();
    let (hub, me) = join(&store, "iris", Role::Type2).await;
    let (_, other) = join(&store, "jade", Role::Type3).await;
    hub.create_post("hello", None).await.unwrap();

    let own = Profile::load(&hub, None).await;
    assert!(own.is_own);
    assert_eq!(own.account.map(|a| a.id), Some(me.id));
    assert_eq!(own.stats.posts_count, 1);
    assert_eq!(own.posts.len(), 1);

    let theirs = Profile::load(&hub, Some(other.id)).await;
    assert!(!theirs.is_own);
    assert!(theirs.posts.is_empty());

    let missing = Profile::load(&hub, Some(uuid::Uuid::new_v4())).await;
    assert!(missing.account.is_none());
}

#[tokio::test]
async fn settings_report_inline() {
    let store = store();
    let (hub, _) = join(&store, "kiwi", Role::Type1).await;
    let mut settings = Settings::open(hub.clone()).await.unwrap();
    assert_eq!(settings.form.display_name, "kiwi");

    assert!(settings.change_password("hunter22", "abcdef", "abcdeg").await.is_err());
    assert_eq!(settings.notice(), Some(&Notice::Error("passwords do not match".into())));

    assert!(settings.change_password("nope", "abcdef", "abcdef").await.is_err());
    assert_eq!(
        settings.notice(),
        Some(&Notice::Error("current password is incorrect".into()))
    );

    settings.form.display_name = "Kiwi Bird".into();
    settings.form.bio = "flightless".into();
    let saved = settings.save_profile().await.unwrap();
    assert_eq!(saved.name(), "Kiwi Bird");
    assert_eq!(settings.notice(), Some(&Notice::ProfileSaved));
    assert_eq!(hub.current_user().await.and_then(|a| a.bio), Some("flightless".into()));

    let image = settings
        .upload_avatar(hub_client::ImageUpload::new("me.jpg", b"jpg".to_vec()))
        .await;
    assert_eq!(settings.form.avatar, image.url());
    assert!(settings.form.avatar.starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn admin_console_requires_admin_and_searches() {
    let store = store();
    let (member, _) = join(&store, "lime", Role::Type1).await;
    let (root, root_account) = join(&store, "mint", Role::Type1).await;
    promote(&store, &root, &root_account).await;

    assert!(matches!(AdminConsole::open(member).await, Err(HubError::Forbidden)));

    let mut console = AdminConsole::open(root).await.unwrap();
    assert_eq!(console.users().len(), 2);
    assert_eq!(console.stats().users, 2);

    console.search = "LIME@".into();
    let hits = console.filtered();
    assert_eq!(hits.len(), 1);
    let lime = hits[0].id;

    let updated = console
        .update_user(lime, AdminUpdate { frame_style: Some(FrameStyle::Gold), ..AdminUpdate::default() })
        .await
        .unwrap();
    assert_eq!(updated.frame_style, FrameStyle::Gold);
    assert_eq!(console.filtered()[0].frame_style, FrameStyle::Gold);

    console.delete_user(lime).await.unwrap();
    assert_eq!(console.users().len(), 1);
    assert_eq!(console.stats().users, 1);
}

#[tokio::test]
async fn shell_navigation_and_logout() {
    let store = store();
    let (hub, me) = join(&store, "nori", Role::Type1).await;
    let (_, other) = join(&store, "opal", Role::Type1).await;

    let mut shell = Shell::start(hub).await;
    assert!(shell.is_authenticated());
    assert_eq!(shell.view(), &View::Radar);

    shell.message_user(other.clone());
    assert_eq!(shell.view(), &View::Chat { with: Some(other.clone()) });
    shell.navigate(View::Gallery);
    shell.navigate(View::Chat { with: None });
    assert_eq!(shell.view(), &View::Chat { with: None });

    shell.view_profile(other.id);
    assert_eq!(shell.view(), &View::Profile { user: Some(other.id) });

    assert!(matches!(shell.open_admin(), Err(HubError::Forbidden)));
    assert!(!shell.is_admin_open());

    promote(&store, shell.hub(), &me).await;
    shell.refresh_user().await;
    shell.open_admin().unwrap();
    assert!(shell.is_admin_open());

    shell.logout().await.unwrap();
    assert!(!shell.is_authenticated());
    assert!(!shell.is_admin_open());
    assert_eq!(shell.view(), &View::Radar);
    assert!(matches!(shell.open_admin(), Err(HubError::NotLoggedIn)));
}
