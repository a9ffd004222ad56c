//! # Feed
//!
//! Community feed: short posts with embedded likes and comments.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use domains::models::{Comment, Post, User, UserSummary};
use domains::policy;
use domains::ports::{FileStore, PostRepo, UserRepo};
use domains::{DomainError, Result};

pub const DEFAULT_FEED_PAGE_SIZE: u32 = 10;

/// A post with its author resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub posts: Vec<PostView>,
    pub total: u64,
    pub page: u32,
}

pub struct FeedService {
    posts: Arc<dyn PostRepo>,
    users: Arc<dyn UserRepo>,
    files: Arc<dyn FileStore>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        users: Arc<dyn UserRepo>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self { posts, users, files }
    }

    /// Newest-first page of the feed with authors resolved in one lookup.
    pub async fn list(&self, page: u32, limit: u32) -> Result<FeedPage> {
        let page = page.max(1);
        let limit = if limit == 0 { DEFAULT_FEED_PAGE_SIZE } else { limit };
        let (posts, total) = self.posts.list(page, limit).await?;

        let mut author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors: HashMap<Uuid, UserSummary> = self
            .users
            .find_many(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.summary()))
            .collect();

        let posts = posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.author_id).cloned();
                PostView { post, author }
            })
            .collect();
        Ok(FeedPage { posts, total, page })
    }

    pub async fn create(
        &self,
        author_id: Uuid,
        content: String,
        image: Option<(Vec<u8>, String, mime::Mime)>,
    ) -> Result<Post> {
        let content = content.trim().to_owned();
        if content.is_empty() {
            return Err(DomainError::validation("Post content is required"));
        }
        let image_url = match image {
            Some((data, file_name, content_type)) => {
                let stored = self.files.store(data, &file_name, &content_type).await?;
                Some(stored.url)
            }
            None => None,
        };
        let post = Post::new(author_id, content, image_url);
        self.posts.insert(post.clone()).await?;
        Ok(post)
    }

    /// Adds the caller's like, or removes it if already present.
    pub async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Result<Post> {
        let mut post = self.require_post(post_id).await?;
        if let Some(idx) = post.likes.iter().position(|id| *id == user_id) {
            post.likes.remove(idx);
        } else {
            post.likes.push(user_id);
        }
        self.posts.update(&post).await?;
        Ok(post)
    }

    pub async fn comment(&self, user_id: Uuid, post_id: Uuid, content: String) -> Result<Post> {
        let content = content.trim().to_owned();
        if content.is_empty() {
            return Err(DomainError::validation("Comment content is required"));
        }
        let mut post = self.require_post(post_id).await?;
        post.comments.push(Comment {
            id: Uuid::new_v4(),
            author_id: user_id,
            content,
            created_at: Utc::now(),
        });
        self.posts.update(&post).await?;
        Ok(post)
    }

    /// Authors remove their own posts; admins remove anything.
    pub async fn delete(&self, user: &User, post_id: Uuid) -> Result<()> {
        let post = self.require_post(post_id).await?;
        if !policy::can_remove_post(user, post.author_id) {
            return Err(DomainError::forbidden("Not authorized to delete this post"));
        }
        self.posts.delete(post_id).await?;
        tracing::info!(post_id = %post_id, removed_by = %user.id, "feed post removed");
        Ok(())
    }

    async fn require_post(&self, post_id: Uuid) -> Result<Post> {
        self.posts
            .find(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }
}
