use tracing::{debug, info};
use uuid::Uuid;

use hub_types::FeedPost;
use hub_types::api::NewPost;
use hub_types::query::{Page, PageRange};

use crate::Hub;
use crate::error::{HubError, Result};

impl Hub {
    /// One page of the gallery, newest first.
    pub async fn feed(&self, page: u32, limit: u32) -> Result<Page<FeedPost>> {
        let posts = self.backend.list_posts(PageRange::page(page, limit)).await?;
        debug!("Feed page {} returned {} posts", page, posts.len());
        Ok(Page::from_rows(posts, limit))
    }

    pub async fn posts_by(&self, author_id: Uuid) -> Result<Vec<FeedPost>> {
        self.backend.posts_by_author(author_id).await
    }

    /// Publish a post. Text may be empty when an image is attached.
    pub async fn create_post(&self, content: &str, image: Option<String>) -> Result<FeedPost> {
        let content = content.trim();
        let image = image.filter(|i| !i.trim().is_empty());
        if content.is_empty() && image.is_none() {
            return Err(HubError::Validation("a post needs text or an image"));
        }

        let me = self.session.require().await?;
        let post = self
            .backend
            .insert_post(NewPost {
                content: content.to_string(),
                image,
                author_id: me.id,
            })
            .await?;

        info!("'{}' published post {}", me.username, post.post.id);
        Ok(post)
    }

    /// Remove a post. Only its author or an administrator may.
    pub async fn delete_post(&self, id: Uuid) -> Result<()> {
        let me = self.session.require().await?;
        let post = self
            .backend
            .post_by_id(id)
            .await?
            .ok_or(HubError::NotFound("post"))?;

        if post.author_id != me.id && !me.is_admin() {
            return Err(HubError::Forbidden);
        }

        self.backend.delete_post(id).await?;
        info!("'{}' deleted post {}", me.username, id);
        Ok(())
    }
}
