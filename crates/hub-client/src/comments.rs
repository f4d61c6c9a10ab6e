use uuid::Uuid;

use hub_types::CommentWithAuthor;
use hub_types::api::NewComment;

use crate::Hub;
use crate::error::{HubError, Result};

impl Hub {
    pub async fn comments(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        self.backend.comments_for_post(post_id).await
    }

    pub async fn add_comment(&self, post_id: Uuid, content: &str) -> Result<CommentWithAuthor> {
        let content = content.trim();
        if content.is_empty() {
            return Err(HubError::Validation("a comment cannot be empty"));
        }

        let me = self.session.require().await?;
        self.backend
            .insert_comment(NewComment {
                content: content.to_string(),
                post_id,
                user_id: me.id,
            })
            .await
    }
}
