use std::collections::HashMap;

use futures_util::future::join_all;
use tracing::debug;
use uuid::Uuid;

use hub_types::api::NewDirectMessage;
use hub_types::{Conversation, DirectMessage, ThreadMessage};

use crate::Hub;
use crate::error::{HubError, Result};

impl Hub {
    /// The signed-in account's conversations, most recently active first.
    pub async fn conversations(&self) -> Result<Vec<Conversation>> {
        let me = self.session.require().await?;
        let messages = self.backend.messages_involving(me.id).await?;
        let summaries = summarize(me.id, messages);

        let lookups = summaries
            .iter()
            .map(|(counterpart, _, _)| self.backend.account_by_id(*counterpart));
        let accounts = join_all(lookups).await;

        let mut conversations = Vec::with_capacity(summaries.len());
        for ((counterpart, last, unread), account) in summaries.into_iter().zip(accounts) {
            match account? {
                Some(user) => conversations.push(Conversation {
                    user,
                    last_message: Some(last),
                    unread_count: unread,
                }),
                None => debug!("Dropping conversation with vanished account {}", counterpart),
            }
        }
        Ok(conversations)
    }

    /// The thread with `other`, oldest first. Opening it marks everything
    /// `other` sent as read.
    pub async fn thread(&self, other: Uuid) -> Result<Vec<ThreadMessage>> {
        let me = self.session.require().await?;
        let messages = self.backend.messages_between(me.id, other).await?;
        let marked = self.backend.mark_read(me.id, other).await?;
        if marked > 0 {
            debug!("Marked {} messages from {} as read", marked, other);
        }
        Ok(messages)
    }

    pub async fn send_message(
        &self,
        to: Uuid,
        content: &str,
        image: Option<String>,
    ) -> Result<ThreadMessage> {
        let (content, image) = message_body(content, image)?;
        let me = self.session.require().await?;
        self.backend
            .insert_message(NewDirectMessage {
                content,
                image,
                sender_id: me.id,
                receiver_id: to,
            })
            .await
    }
}

/// Trimmed text and image of an outgoing message; at least one must be set.
pub(crate) fn message_body(
    content: &str,
    image: Option<String>,
) -> Result<(Option<String>, Option<String>)> {
    let content = Some(content.trim()).filter(|c| !c.is_empty()).map(str::to_string);
    let image = image.filter(|i| !i.trim().is_empty());
    if content.is_none() && image.is_none() {
        return Err(HubError::Validation("a message needs text or an image"));
    }
    Ok((content, image))
}

/// Group newest-first messages by counterpart, keeping first-seen order,
/// the newest message and the unread count received from each.
fn summarize(me: Uuid, messages: Vec<DirectMessage>) -> Vec<(Uuid, DirectMessage, usize)> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut by_counterpart: HashMap<Uuid, (DirectMessage, usize)> = HashMap::new();

    for message in messages {
        let counterpart = message.counterpart(me);
        let unread = usize::from(message.receiver_id == me && !message.is_read);
        match by_counterpart.get_mut(&counterpart) {
            Some((_, count)) => *count += unread,
            None => {
                order.push(counterpart);
                by_counterpart.insert(counterpart, (message, unread));
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| by_counterpart.remove(&id).map(|(last, unread)| (id, last, unread)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn message(from: Uuid, to: Uuid, minutes_ago: i64, is_read: bool) -> DirectMessage {
        DirectMessage {
            id: Uuid::new_v4(),
            sender_id: from,
            receiver_id: to,
            content: Some(format!("{} min ago", minutes_ago)),
            image: None,
            is_read,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn groups_by_counterpart_in_activity_order() {
        let me = Uuid::new_v4();
        let ana = Uuid::new_v4();
        let bo = Uuid::new_v4();

        let newest_first = vec![
            message(bo, me, 1, false),
            message(me, ana, 2, false),
            message(ana, me, 3, false),
            message(bo, me, 4, true),
            message(ana, me, 5, false),
        ];
        let latest_bo = newest_first[0].clone();
        let latest_ana = newest_first[1].clone();

        let summary = summarize(me, newest_first);
        assert_eq!(summary.len(), 2);

        assert_eq!(summary[0].0, bo);
        assert_eq!(summary[0].1, latest_bo);
        assert_eq!(summary[0].2, 1);

        // my own unread outgoing message does not count
        assert_eq!(summary[1].0, ana);
        assert_eq!(summary[1].1, latest_ana);
        assert_eq!(summary[1].2, 2);
    }

    #[test]
    fn body_needs_text_or_image() {
        assert!(message_body("   ", None).is_err());
        assert!(message_body("", Some(" ".into())).is_err());
        assert_eq!(message_body(" hi ", None).unwrap(), (Some("hi".into()), None));
        assert_eq!(
            message_body("", Some("https://i.example/x.png".into())).unwrap(),
            (None, Some("https://i.example/x.png".into()))
        );
    }
}
