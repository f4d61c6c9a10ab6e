use std::path::Path;

use anyhow::{Context, bail};
use tracing::info;
use uuid::Uuid;

use hub_client::{ClientConfig, Hub, ImageUpload};
use hub_types::api::{AdminUpdate, RegisterRequest};
use hub_types::{Account, LikeKind};
use hub_views::admin::AdminConsole;
use hub_views::chat::Chat;
use hub_views::gallery::PAGE_SIZE as FEED_PAGE;
use hub_views::group_chat::{GroupChat, PAGE_SIZE as ROOM_PAGE, starts_sender_run};
use hub_views::profile::Profile;
use hub_views::radar::Radar;
use hub_views::settings::Settings;

use crate::cli::{Command, Screen};
use crate::render;

pub async fn run(hub: &Hub, config: &ClientConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Register { email, username, password, role, display_name } => {
            let account = hub
                .register(RegisterRequest {
                    email,
                    username,
                    password,
                    display_name,
                    role,
                    avatar: None,
                })
                .await?;
            render::account_detail(&account);
        }
        Command::Login { email, password } => {
            let account = hub.login(&email, &password).await?;
            render::account_detail(&account);
        }
        Command::Logout => {
            hub.logout().await?;
            println!("Signed out.");
        }
        Command::Whoami => match hub.current_user().await {
            Some(account) => render::account_detail(&account),
            None => println!("Not signed in."),
        },

        Command::Users { role, search } => {
            let mut radar = Radar::new(hub.clone());
            radar.filter = role;
            radar.search = search.unwrap_or_default();
            radar.load().await;
            for account in radar.visible() {
                render::account(account);
            }
        }
        Command::Profile { user } => {
            let user = match user {
                Some(user) => Some(resolve(hub, &user).await?.id),
                None => None,
            };
            let profile = Profile::load(hub, user).await;
            let Some(account) = &profile.account else {
                bail!("no such profile");
            };
            render::account_detail(account);
            println!(
                "  {} posts, {} reactions",
                profile.stats.posts_count, profile.stats.likes_count
            );
            for post in &profile.posts {
                render::post(post);
            }
        }

        Command::Feed { page } => {
            let feed = hub.feed(page, FEED_PAGE).await?;
            for post in &feed.items {
                render::post(post);
            }
            if feed.has_more {
                println!("-- more: hub feed --page {}", page.max(1) + 1);
            }
        }
        Command::Post { content, image } => {
            let image = relay(hub, image.as_deref()).await?;
            let post = hub.create_post(&content, image).await?;
            render::post(&post);
        }
        Command::DeletePost { id } => {
            hub.delete_post(id).await?;
            println!("Deleted {}.", id);
        }
        Command::Like { post } => react(hub, post, LikeKind::Like).await?,
        Command::Dislike { post } => react(hub, post, LikeKind::Dislike).await?,
        Command::Comments { post } => {
            for comment in hub.comments(post).await? {
                render::comment(&comment);
            }
        }
        Command::Comment { post, content } => {
            let comment = hub.add_comment(post, &content).await?;
            render::comment(&comment);
        }

        Command::Conversations => {
            for conversation in hub.conversations().await? {
                render::conversation(&conversation);
            }
        }
        Command::Thread { user } => {
            let other = resolve(hub, &user).await?;
            let thread = hub.thread(other.id).await?;
            for i in 0..thread.len() {
                render::thread_entry(&thread, i);
            }
        }
        Command::Send { user, content, image } => {
            let other = resolve(hub, &user).await?;
            let image = upload(hub, image.as_deref()).await?;
            let message = hub.send_message(other.id, &content, image).await?;
            render::thread_message(&message);
        }
        Command::Room { page } => {
            let room = hub.group_messages(page, ROOM_PAGE).await?;
            for (i, message) in room.items.iter().enumerate() {
                render::room_message(message, starts_sender_run(&room.items, i));
            }
            if room.has_more {
                println!("-- older: hub room --page {}", page.max(1) + 1);
            }
        }
        Command::Say { content, image } => {
            let image = upload(hub, image.as_deref()).await?;
            let message = hub.send_group_message(&content, image).await?;
            render::room_message(&message, true);
        }

        Command::Settings { display_name, bio, avatar } => {
            let mut settings = Settings::open(hub.clone()).await?;
            if let Some(name) = display_name {
                settings.form.display_name = name;
            }
            if let Some(bio) = bio {
                settings.form.bio = bio;
            }
            if let Some(path) = avatar {
                let image = settings.upload_avatar(load(&path).await?).await;
                if !image.is_hosted() {
                    println!("Avatar upload failed; keeping a local preview.");
                }
            }
            let account = settings.save_profile().await?;
            render::account_detail(&account);
        }
        Command::Password { current, new, confirm } => {
            hub.change_password(&current, &new, &confirm).await?;
            println!("Password changed.");
        }

        Command::AdminUsers { search } => {
            let mut console = AdminConsole::open(hub.clone()).await?;
            console.search = search.unwrap_or_default();
            for account in console.filtered() {
                render::account(account);
            }
        }
        Command::AdminStats => render::stats(&hub.site_stats().await?),
        Command::AdminUpdate { user, role, frame, shiny, verified } => {
            let target = resolve(hub, &user).await?;
            let update = AdminUpdate {
                role,
                frame_style: frame,
                is_shiny: shiny,
                is_verified: verified,
            };
            let account = hub.admin_update_user(target.id, update).await?;
            render::account_detail(&account);
        }
        Command::AdminDeleteUser { user } => {
            let target = resolve(hub, &user).await?;
            hub.admin_delete_user(target.id).await?;
            println!("Deleted @{}.", target.username);
        }
        Command::AdminDeletePost { id } => {
            hub.admin_delete_post(id).await?;
            println!("Deleted {}.", id);
        }

        Command::Watch { screen, user } => watch(hub, config, screen, user).await?,
    }
    Ok(())
}

async fn react(hub: &Hub, post: Uuid, kind: LikeKind) -> anyhow::Result<()> {
    match hub.toggle_like(post, kind).await? {
        Some(like) => println!("{} on {}", like.kind, post),
        None => println!("Reaction withdrawn from {}", post),
    }
    Ok(())
}

/// Follow a polled screen until Ctrl-C.
async fn watch(hub: &Hub, config: &ClientConfig, screen: Screen, user: Option<String>) -> anyhow::Result<()> {
    hub.session().require().await?;
    info!("Watching {:?}, Ctrl-C to stop", screen);

    match screen {
        Screen::Conversations => {
            let mut chat = Chat::open(hub.clone(), config.poll, None);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    Some(list) = chat.next_conversations() => {
                        println!("-- {} conversations", list.len());
                        for conversation in &list {
                            render::conversation(conversation);
                        }
                    }
                }
            }
        }
        Screen::Thread => {
            let Some(user) = user else {
                bail!("watch thread needs a user");
            };
            let other = resolve(hub, &user).await?;
            let mut chat = Chat::open(hub.clone(), config.poll, Some(other));
            let mut shown = 0;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    Some(thread) = chat.next_messages() => {
                        for i in shown..thread.len() {
                            render::thread_entry(&thread, i);
                        }
                        shown = thread.len();
                    }
                }
            }
        }
        Screen::Room => {
            let mut room = GroupChat::open(hub.clone(), config.poll.room);
            let mut last_seen: Option<Uuid> = None;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    Some(page) = room.next() => {
                        let start = last_seen
                            .and_then(|id| page.items.iter().position(|m| m.message.id == id))
                            .map_or(0, |i| i + 1);
                        for (i, message) in page.items.iter().enumerate().skip(start) {
                            render::room_message(message, starts_sender_run(&page.items, i));
                        }
                        if let Some(newest) = page.items.last() {
                            last_seen = Some(newest.message.id);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// A user given as a username or an id.
async fn resolve(hub: &Hub, user: &str) -> anyhow::Result<Account> {
    let found = match user.parse::<Uuid>() {
        Ok(id) => hub.user(id).await?,
        Err(_) => hub.user_by_username(user.trim_start_matches('@')).await?,
    };
    found.with_context(|| format!("no user '{}'", user))
}

async fn load(path: &Path) -> anyhow::Result<ImageUpload> {
    ImageUpload::from_path(path)
        .await
        .with_context(|| format!("cannot read image {}", path.display()))
}

/// Upload an attachment, falling back to an inline preview.
async fn relay(hub: &Hub, path: Option<&Path>) -> anyhow::Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let image = hub.images().upload_or_preview(&load(path).await?).await;
    if !image.is_hosted() {
        println!("Image upload failed; sending a local preview instead.");
    }
    Ok(Some(image.into_url()))
}

/// Upload a message attachment. Messages never carry a local preview.
async fn upload(hub: &Hub, path: Option<&Path>) -> anyhow::Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    Ok(Some(hub.images().upload(&load(path).await?).await?))
}
