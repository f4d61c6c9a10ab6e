use hub_types::RoomMessage;
use hub_types::api::NewGroupMessage;
use hub_types::query::{Page, PageRange};

use crate::Hub;
use crate::error::Result;
use crate::messages::message_body;

impl Hub {
    /// One page of the room. Pages count back from the newest message, but
    /// the items of each page come out oldest first, ready for display.
    pub async fn group_messages(&self, page: u32, limit: u32) -> Result<Page<RoomMessage>> {
        let mut rows = self.backend.group_messages(PageRange::page(page, limit)).await?;
        rows.reverse();
        Ok(Page::from_rows(rows, limit))
    }

    pub async fn send_group_message(&self, content: &str, image: Option<String>) -> Result<RoomMessage> {
        let me = self.session.require().await?;
        let (content, image) = message_body(content, image)?;
        self.backend
            .insert_group_message(NewGroupMessage {
                content,
                image,
                sender_id: me.id,
            })
            .await
    }
}
