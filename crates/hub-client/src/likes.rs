use tracing::debug;
use uuid::Uuid;

use hub_types::api::NewLike;
use hub_types::{Like, LikeKind};

use crate::Hub;
use crate::error::Result;

impl Hub {
    /// Apply a reaction for the signed-in account.
    ///
    /// With no prior reaction the new one is recorded. Repeating the same
    /// reaction withdraws it and returns `None`. The opposite reaction flips
    /// the existing row in place.
    pub async fn toggle_like(&self, post_id: Uuid, kind: LikeKind) -> Result<Option<Like>> {
        let me = self.session.require().await?;

        match self.backend.find_like(post_id, me.id).await? {
            None => {
                let like = self
                    .backend
                    .insert_like(NewLike { post_id, user_id: me.id, kind })
                    .await?;
                debug!("{} added {} on {}", me.username, kind, post_id);
                Ok(Some(like))
            }
            Some(existing) if existing.kind == kind => {
                self.backend.delete_like(existing.id).await?;
                debug!("{} withdrew {} on {}", me.username, kind, post_id);
                Ok(None)
            }
            Some(existing) => {
                let like = self.backend.set_like_kind(existing.id, kind).await?;
                debug!("{} switched to {} on {}", me.username, kind, post_id);
                Ok(Some(like))
            }
        }
    }
}
