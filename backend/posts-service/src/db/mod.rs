//! Entity store
//!
//! `Store` is the seam between the domain services and persistence. Two
//! implementations exist:
//! - `PgStore`: PostgreSQL through sqlx (production)
//! - `MemoryStore`: process-local maps (tests, `STORE_BACKEND=memory`)

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::Result;
use crate::models::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges, User};

/// Post selection understood by every store backend.
///
/// Ordering is not part of the filter; the feed assembler owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by any of the given authors. An empty list selects nothing.
    Authors(Vec<i64>),
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // Users

    async fn create_user(&self, username: &str) -> Result<User>;

    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    // Groups

    /// Fails with `Conflict` when the slug is taken
    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// All groups ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// Detaches the group's posts; returns false if the group did not exist
    async fn delete_group(&self, group_id: i64) -> Result<bool>;

    // Posts

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;

    /// Returns the updated post, or `None` if it does not exist
    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>>;

    /// Deletes the post and its comments
    async fn delete_post(&self, post_id: i64) -> Result<bool>;

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>>;

    async fn count_posts_by_author(&self, author_id: i64) -> Result<i64>;

    // Comments

    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;

    /// Comments on a post, oldest first
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;

    // Follows

    /// Idempotent; returns true if a new follow was recorded
    async fn create_follow(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// Idempotent; returns true if a follow was removed
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool>;

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool>;

    async fn followed_author_ids(&self, user_id: i64) -> Result<Vec<i64>>;

    async fn count_follows(&self) -> Result<i64>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
