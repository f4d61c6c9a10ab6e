use chrono::{DateTime, Local, Utc};

use hub_types::{
    Account, CommentWithAuthor, Conversation, FeedPost, RoomMessage, SiteStats, ThreadMessage,
};
use hub_views::chat::{conversation_date, starts_new_day};
use hub_views::radar::last_seen_label;

fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn name(account: Option<&Account>) -> &str {
    account.map(Account::name).unwrap_or("(deleted)")
}

pub fn account(a: &Account) {
    let mut badges = Vec::new();
    if a.is_verified {
        badges.push("verified");
    }
    if a.is_shiny {
        badges.push("shiny");
    }
    let presence = if a.is_online {
        "online".to_string()
    } else {
        format!("seen {}", last_seen_label(a.last_seen, Utc::now()))
    };
    println!(
        "{:<20} @{:<16} {:<8} frame={:<5} {:<22} {}  {}",
        a.name(),
        a.username,
        a.role.label(),
        a.frame_style.as_str(),
        presence,
        badges.join(","),
        a.id
    );
}

pub fn account_detail(a: &Account) {
    account(a);
    if let Some(bio) = a.bio.as_deref().filter(|b| !b.is_empty()) {
        println!("  {}", bio);
    }
    println!("  email: {}  joined: {}", a.email, clock(a.created_at));
}

pub fn post(p: &FeedPost) {
    println!(
        "[{}] {} at {}",
        p.post.id,
        name(p.author.as_ref()),
        clock(p.post.created_at)
    );
    if !p.post.content.is_empty() {
        println!("  {}", p.post.content);
    }
    if let Some(image) = &p.post.image {
        println!("  image: {}", preview(image));
    }
    println!(
        "  +{} -{}  {} comments",
        p.like_count(),
        p.dislike_count(),
        p.comments.len()
    );
}

pub fn comment(c: &CommentWithAuthor) {
    println!(
        "  {} ({}): {}",
        name(c.user.as_ref()),
        clock(c.comment.created_at),
        c.comment.content
    );
}

pub fn conversation(c: &Conversation) {
    let last = c
        .last_message
        .as_ref()
        .map(|m| body(m.content.as_deref(), m.image.as_deref()))
        .unwrap_or_default();
    let unread = if c.unread_count > 0 {
        format!(" ({} unread)", c.unread_count)
    } else {
        String::new()
    };
    let when = c
        .last_message
        .as_ref()
        .map(|m| format!(" [{}]", conversation_date(m.created_at, Utc::now())))
        .unwrap_or_default();
    println!("@{}{}{}: {}", c.user.username, unread, when, last);
}

/// One entry of a thread listing, headed by a date line when the day changes.
pub fn thread_entry(messages: &[ThreadMessage], index: usize) {
    let Some(m) = messages.get(index) else {
        return;
    };
    if starts_new_day(messages, index) {
        println!("-- {} --", m.message.created_at.format("%a %b %-d, %Y"));
    }
    thread_message(m);
}

pub fn thread_message(m: &ThreadMessage) {
    let read = if m.message.is_read { "" } else { " *" };
    println!(
        "{} {}: {}{}",
        clock(m.message.created_at),
        name(m.sender.as_ref()),
        body(m.message.content.as_deref(), m.message.image.as_deref()),
        read
    );
}

pub fn room_message(m: &RoomMessage, show_sender: bool) {
    let sender = if show_sender { name(m.sender.as_ref()) } else { "" };
    println!(
        "{} {:>20} | {}",
        clock(m.message.created_at),
        sender,
        body(m.message.content.as_deref(), m.message.image.as_deref())
    );
}

pub fn stats(s: &SiteStats) {
    println!("users:          {}", s.users);
    println!("online:         {}", s.online_users);
    println!("posts:          {}", s.posts);
    println!("messages:       {}", s.messages);
    println!("group messages: {}", s.group_messages);
}

fn body(content: Option<&str>, image: Option<&str>) -> String {
    match (content, image) {
        (Some(text), Some(image)) => format!("{} [image {}]", text, preview(image)),
        (Some(text), None) => text.to_string(),
        (None, Some(image)) => format!("[image {}]", preview(image)),
        (None, None) => String::new(),
    }
}

/// Inline `data:` previews are far too long to print.
fn preview(url: &str) -> &str {
    if url.starts_with("data:") { "(local preview)" } else { url }
}
