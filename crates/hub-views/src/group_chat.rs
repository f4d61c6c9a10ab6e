use std::collections::HashSet;
use std::time::Duration;

use hub_client::{Hub, ImageUpload, Result};
use hub_types::RoomMessage;
use hub_types::query::Page;

use crate::or_empty;
use crate::poll::Poller;

pub const PAGE_SIZE: u32 = 50;

/// The global room. The newest page is polled; older pages are fetched on
/// request and kept above it.
pub struct GroupChat {
    hub: Hub,
    newest: Poller<Page<RoomMessage>>,
    older: Vec<RoomMessage>,
    page: u32,
    older_has_more: bool,
}

impl GroupChat {
    pub fn open(hub: Hub, every: Duration) -> Self {
        let newest = {
            let hub = hub.clone();
            Poller::spawn("room", every, move || {
                let hub = hub.clone();
                async move { or_empty("room", hub.group_messages(1, PAGE_SIZE).await) }
            })
        };
        Self {
            hub,
            newest,
            older: Vec::new(),
            page: 1,
            older_has_more: false,
        }
    }

    /// Everything loaded, oldest first.
    pub fn messages(&self) -> Vec<RoomMessage> {
        let latest = self.newest.latest().unwrap_or_default().items;
        let fresh: HashSet<_> = latest.iter().map(|m| m.message.id).collect();
        self.older
            .iter()
            .filter(|m| !fresh.contains(&m.message.id))
            .cloned()
            .chain(latest)
            .collect()
    }

    pub fn has_more(&self) -> bool {
        if self.page > 1 {
            self.older_has_more
        } else {
            self.newest.latest().is_some_and(|p| p.has_more)
        }
    }

    pub async fn next(&mut self) -> Option<Page<RoomMessage>> {
        self.newest.next().await
    }

    /// Fetch the page before the oldest one loaded and put it on top.
    /// Returns how many messages were new to the screen.
    ///
    /// Pages are counted back from the newest message, so anything posted
    /// since the last call shifts the window and the page overlaps what is
    /// already loaded. Overlapping messages are skipped.
    pub async fn load_older(&mut self) -> usize {
        let next = self.page + 1;
        let page = or_empty("older room messages", self.hub.group_messages(next, PAGE_SIZE).await);

        let latest = self.newest.latest().unwrap_or_default().items;
        let loaded: HashSet<_> = self
            .older
            .iter()
            .chain(&latest)
            .map(|m| m.message.id)
            .collect();
        let mut items: Vec<_> = page
            .items
            .into_iter()
            .filter(|m| !loaded.contains(&m.message.id))
            .collect();

        let count = items.len();
        items.append(&mut self.older);
        self.older = items;
        self.page = next;
        self.older_has_more = page.has_more;
        count
    }

    pub async fn send(&self, content: &str) -> Result<RoomMessage> {
        let message = self.hub.send_group_message(content, None).await?;
        self.newest.refresh();
        Ok(message)
    }

    /// Upload then post. Nothing is posted when the host refuses the image.
    pub async fn send_image(&self, upload: ImageUpload) -> Result<RoomMessage> {
        let url = self.hub.images().upload(&upload).await?;
        let message = self.hub.send_group_message("", Some(url)).await?;
        self.newest.refresh();
        Ok(message)
    }
}

/// Whether the message at `index` opens a run by a different sender, and so
/// shows the sender's name.
pub fn starts_sender_run(messages: &[RoomMessage], index: usize) -> bool {
    match (index.checked_sub(1).and_then(|i| messages.get(i)), messages.get(index)) {
        (None, Some(_)) => true,
        (Some(prev), Some(cur)) => prev.message.sender_id != cur.message.sender_id,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hub_types::GroupMessage;
    use uuid::Uuid;

    fn from(sender_id: Uuid) -> RoomMessage {
        RoomMessage {
            message: GroupMessage {
                id: Uuid::new_v4(),
                sender_id,
                content: Some("hey".into()),
                image: None,
                created_at: Utc::now(),
            },
            sender: None,
        }
    }

    #[test]
    fn sender_runs() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let room = vec![from(a), from(a), from(b), from(a)];

        let starts: Vec<bool> = (0..room.len()).map(|i| starts_sender_run(&room, i)).collect();
        assert_eq!(starts, [true, false, true, true]);
        assert!(!starts_sender_run(&room, 9));
    }
}
