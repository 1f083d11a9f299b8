/// Feed assembly - resolves a feed scope into posts, newest first
use crate::db::{PostFilter, Store};
use crate::error::{AppError, Result};
use crate::metrics::FEED_ASSEMBLY_DURATION_SECONDS;
use crate::models::Post;
use std::sync::Arc;
use tracing::debug;

/// Which posts belong in a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    All,
    ByGroup(String),
    ByAuthor(String),
    /// Posts by every author the given user follows
    ByFollowedAuthors(i64),
}

impl FeedScope {
    /// Metric label
    pub fn kind(&self) -> &'static str {
        match self {
            FeedScope::All => "all",
            FeedScope::ByGroup(_) => "group",
            FeedScope::ByAuthor(_) => "author",
            FeedScope::ByFollowedAuthors(_) => "follow",
        }
    }
}

#[derive(Clone)]
pub struct FeedAssembler {
    store: Arc<dyn Store>,
}

impl FeedAssembler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Posts in `scope`, ordered by creation time descending with ties in
    /// insertion (id) order.
    ///
    /// Unknown group slugs and usernames are `NotFound`. A user who follows
    /// nobody gets an empty feed.
    pub async fn assemble(&self, scope: &FeedScope) -> Result<Vec<Post>> {
        let timer = FEED_ASSEMBLY_DURATION_SECONDS
            .with_label_values(&[scope.kind()])
            .start_timer();

        let filter = match self.resolve(scope).await? {
            Some(filter) => filter,
            None => {
                timer.observe_duration();
                debug!(?scope, "feed scope is empty");
                return Ok(Vec::new());
            }
        };

        let mut posts = self.store.list_posts(&filter).await?;
        sort_newest_first(&mut posts);

        timer.observe_duration();
        debug!(?scope, count = posts.len(), "feed assembled");
        Ok(posts)
    }

    /// Translate a scope into a store filter; `None` means the feed is empty
    /// without asking the store for posts.
    async fn resolve(&self, scope: &FeedScope) -> Result<Option<PostFilter>> {
        let filter = match scope {
            FeedScope::All => PostFilter::All,
            FeedScope::ByGroup(slug) => {
                let group = self
                    .store
                    .find_group_by_slug(slug)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("group {}", slug)))?;
                PostFilter::Group(group.id)
            }
            FeedScope::ByAuthor(username) => {
                let author = self
                    .store
                    .find_user_by_username(username)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;
                PostFilter::Author(author.id)
            }
            FeedScope::ByFollowedAuthors(user_id) => {
                let authors = self.store.followed_author_ids(*user_id).await?;
                if authors.is_empty() {
                    return Ok(None);
                }
                PostFilter::Authors(authors)
            }
        };
        Ok(Some(filter))
    }
}

/// Creation time descending, then id ascending.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
