use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};
use uuid::Uuid;

use hub_client::{Hub, ImageUpload, Result};
use hub_types::query::Page;
use hub_types::{FeedPost, Like, LikeKind};

use crate::or_empty;

pub const PAGE_SIZE: u32 = 10;

#[derive(Default)]
struct FeedState {
    posts: Vec<FeedPost>,
    page: u32,
    has_more: bool,
}

/// The media feed with its paging cursor.
///
/// Shared by reference so a scroll-triggered load can race a refresh; the
/// loser of that race is dropped rather than queued.
pub struct Gallery {
    hub: Hub,
    state: Mutex<FeedState>,
    loading: AtomicBool,
}

/// Clears the in-flight flag even when the load future is dropped midway.
struct Loading<'a>(&'a AtomicBool);

impl<'a> Loading<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FeedState {
    fn apply(&mut self, page: u32, result: Result<Page<FeedPost>>) {
        match result {
            Ok(fetched) => {
                if page == 1 {
                    self.posts = fetched.items;
                } else {
                    self.posts.extend(fetched.items);
                }
                self.page = page;
                self.has_more = fetched.has_more;
            }
            // The cursor stays put so the next load_more asks for this page again.
            Err(e) if page > 1 => warn!("Failed to load gallery page {}: {}", page, e),
            Err(e) => {
                warn!("Failed to load gallery: {}", e);
                self.posts.clear();
                self.page = 1;
                self.has_more = false;
            }
        }
    }
}

impl Gallery {
    pub fn new(hub: Hub) -> Self {
        Self {
            hub,
            state: Mutex::new(FeedState { has_more: true, ..FeedState::default() }),
            loading: AtomicBool::new(false),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn posts(&self) -> Vec<FeedPost> {
        self.state().posts.clone()
    }

    pub fn page(&self) -> u32 {
        self.state().page
    }

    pub fn has_more(&self) -> bool {
        self.state().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Load `page`. Page 1 replaces the list; later pages append. Returns
    /// `false` without fetching when a load is already running.
    pub async fn load(&self, page: u32) -> bool {
        let Some(_loading) = Loading::acquire(&self.loading) else {
            debug!("Gallery load of page {} skipped, one is in flight", page);
            return false;
        };

        let page = page.max(1);
        let result = self.hub.feed(page, PAGE_SIZE).await;
        self.state().apply(page, result);
        true
    }

    pub async fn reload(&self) -> bool {
        self.load(1).await
    }

    pub async fn load_more(&self) -> bool {
        let (page, has_more) = {
            let state = self.state();
            (state.page, state.has_more)
        };
        if !has_more {
            return false;
        }
        self.load(page + 1).await
    }

    /// Publish a post, uploading the attachment first when there is one.
    pub async fn create_post(&self, content: &str, image: Option<ImageUpload>) -> Result<FeedPost> {
        let image = match image {
            Some(upload) => Some(self.hub.images().upload_or_preview(&upload).await.into_url()),
            None => None,
        };
        let post = self.hub.create_post(content, image).await?;
        {
            let mut state = self.state();
            if !state.posts.iter().any(|p| p.post.id == post.post.id) {
                state.posts.insert(0, post.clone());
            }
        }
        self.reload().await;
        Ok(post)
    }

    /// Toggle a reaction and patch the cached post to match.
    pub async fn react(&self, post_id: Uuid, kind: LikeKind) -> Result<Option<Like>> {
        let me = self.hub.session().require().await?;
        let like = self.hub.toggle_like(post_id, kind).await?;

        let mut state = self.state();
        if let Some(post) = state.posts.iter_mut().find(|p| p.post.id == post_id) {
            post.likes.retain(|l| l.user_id != me.id);
            post.likes.extend(like.clone());
        }
        Ok(like)
    }

    /// Comment, then refetch that post's comments.
    pub async fn comment(&self, post_id: Uuid, content: &str) -> Result<()> {
        self.hub.add_comment(post_id, content).await?;
        let comments = or_empty("comments", self.hub.comments(post_id).await);

        let mut state = self.state();
        if let Some(post) = state.posts.iter_mut().find(|p| p.post.id == post_id) {
            post.comments = comments;
        }
        Ok(())
    }

    pub async fn delete_post(&self, post_id: Uuid) -> Result<()> {
        self.hub.delete_post(post_id).await?;
        self.state().posts.retain(|p| p.post.id != post_id);
        Ok(())
    }
}
