use chrono::{DateTime, Utc};
use tracing::debug;

use hub_client::{Hub, HubError, ImageUpload, PollIntervals, Result};
use hub_types::{Account, Conversation, ThreadMessage};

use crate::or_empty;
use crate::poll::Poller;

/// Direct messages: the conversation list plus, once a counterpart is
/// picked, the open thread. Both refresh on their own timers.
pub struct Chat {
    hub: Hub,
    intervals: PollIntervals,
    conversations: Poller<Vec<Conversation>>,
    selected: Option<Account>,
    thread: Option<Poller<Vec<ThreadMessage>>>,
}

impl Chat {
    /// Start polling. `with` opens a thread straight away, as when arriving
    /// from the radar or a profile.
    pub fn open(hub: Hub, intervals: PollIntervals, with: Option<Account>) -> Self {
        let conversations = {
            let hub = hub.clone();
            Poller::spawn("conversations", intervals.conversations, move || {
                let hub = hub.clone();
                async move { or_empty("conversations", hub.conversations().await) }
            })
        };

        let mut chat = Self {
            hub,
            intervals,
            conversations,
            selected: None,
            thread: None,
        };
        if let Some(user) = with {
            chat.select(user);
        }
        chat
    }

    /// Switch the open thread. The previous thread's poller stops.
    pub fn select(&mut self, user: Account) {
        debug!("Opening thread with '{}'", user.username);
        let hub = self.hub.clone();
        let other = user.id;
        self.thread = Some(Poller::spawn("thread", self.intervals.thread, move || {
            let hub = hub.clone();
            async move { or_empty("thread", hub.thread(other).await) }
        }));
        self.selected = Some(user);
    }

    pub fn close_thread(&mut self) {
        self.thread = None;
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Account> {
        self.selected.as_ref()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.conversations.latest().unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<ThreadMessage> {
        self.thread.as_ref().and_then(Poller::latest).unwrap_or_default()
    }

    pub async fn next_conversations(&mut self) -> Option<Vec<Conversation>> {
        self.conversations.next().await
    }

    /// Wait for the open thread's next refresh. `None` when no thread is open.
    pub async fn next_messages(&mut self) -> Option<Vec<ThreadMessage>> {
        self.thread.as_mut()?.next().await
    }

    pub async fn send_text(&self, content: &str) -> Result<ThreadMessage> {
        let to = self.target()?;
        let message = self.hub.send_message(to.id, content, None).await?;
        self.refresh();
        Ok(message)
    }

    /// Upload then send. When the host refuses the image nothing is sent and
    /// the upload error comes back.
    pub async fn send_image(&self, upload: ImageUpload) -> Result<ThreadMessage> {
        let to = self.target()?;
        let url = self.hub.images().upload(&upload).await?;
        let message = self.hub.send_message(to.id, "", Some(url)).await?;
        self.refresh();
        Ok(message)
    }

    fn target(&self) -> Result<&Account> {
        self.selected
            .as_ref()
            .ok_or(HubError::Validation("no conversation is open"))
    }

    fn refresh(&self) {
        self.conversations.refresh();
        if let Some(thread) = &self.thread {
            thread.refresh();
        }
    }
}

/// Whether the message at `index` begins a new calendar day and so gets a
/// date separator.
pub fn starts_new_day(messages: &[ThreadMessage], index: usize) -> bool {
    let day = |m: &ThreadMessage| m.message.created_at.date_naive();
    match (index.checked_sub(1).and_then(|i| messages.get(i)), messages.get(index)) {
        (None, Some(_)) => true,
        (Some(prev), Some(cur)) => day(prev) != day(cur),
        _ => false,
    }
}

/// Short relative date for the conversation list.
pub fn conversation_date(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match (now - at).num_days() {
        0 => at.format("%H:%M").to_string(),
        1 => "yesterday".into(),
        _ => at.format("%b %-d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use hub_types::DirectMessage;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn sent(created_at: DateTime<Utc>) -> ThreadMessage {
        ThreadMessage {
            message: DirectMessage {
                id: Uuid::new_v4(),
                sender_id: Uuid::new_v4(),
                receiver_id: Uuid::new_v4(),
                content: Some("hi".into()),
                image: None,
                is_read: false,
                created_at,
            },
            sender: None,
            receiver: None,
        }
    }

    #[test]
    fn day_separators() {
        let thread = vec![
            sent(at(2025, 5, 1, 9)),
            sent(at(2025, 5, 1, 23)),
            sent(at(2025, 5, 2, 0)),
        ];
        assert!(starts_new_day(&thread, 0));
        assert!(!starts_new_day(&thread, 1));
        assert!(starts_new_day(&thread, 2));
        assert!(!starts_new_day(&thread, 3));
    }

    #[test]
    fn conversation_dates() {
        let now = at(2025, 5, 10, 12);
        assert_eq!(conversation_date(now - Duration::hours(3), now), "09:00");
        assert_eq!(conversation_date(now - Duration::hours(30), now), "yesterday");
        assert_eq!(conversation_date(at(2025, 3, 4, 8), now), "Mar 4");
    }
}
