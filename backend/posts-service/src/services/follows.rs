/// Follow service - subscriptions between readers and authors
use crate::cache::PageCache;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::metrics::CONTENT_WRITES_TOTAL;
use crate::models::User;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct FollowService {
    store: Arc<dyn Store>,
    cache: Arc<PageCache>,
}

impl FollowService {
    pub fn new(store: Arc<dyn Store>, cache: Arc<PageCache>) -> Self {
        Self { store, cache }
    }

    async fn author(&self, username: &str) -> Result<User> {
        self.store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", username)))
    }

    /// Follow `author_username`. Following twice or following oneself is a
    /// no-op; returns true only when a new follow was recorded.
    pub async fn follow(&self, user_id: i64, author_username: &str) -> Result<bool> {
        let author = self.author(author_username).await?;
        if author.id == user_id {
            debug!(user_id, "ignoring self-follow");
            return Ok(false);
        }

        let created = self.store.create_follow(user_id, author.id).await?;
        if created {
            CONTENT_WRITES_TOTAL
                .with_label_values(&["follow", "create"])
                .inc();
            self.cache.invalidate_all();
            info!(user_id, author_id = author.id, "follow created");
        }
        Ok(created)
    }

    /// Unfollow `author_username`; returns true only when a follow existed.
    pub async fn unfollow(&self, user_id: i64, author_username: &str) -> Result<bool> {
        let author = self.author(author_username).await?;

        let removed = self.store.delete_follow(user_id, author.id).await?;
        if removed {
            CONTENT_WRITES_TOTAL
                .with_label_values(&["follow", "delete"])
                .inc();
            self.cache.invalidate_all();
            info!(user_id, author_id = author.id, "follow removed");
        }
        Ok(removed)
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        self.store.is_following(user_id, author_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use std::time::Duration;

    async fn setup() -> (Arc<MemoryStore>, FollowService, User, User) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(PageCache::new(Duration::from_secs(20)));
        let service = FollowService::new(store.clone(), cache);
        let reader = store.create_user("reader").await.unwrap();
        let author = store.create_user("auth").await.unwrap();
        (store, service, reader, author)
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let (store, service, reader, author) = setup().await;
        assert!(service.follow(reader.id, "auth").await.unwrap());
        assert!(!service.follow(reader.id, "auth").await.unwrap());
        assert_eq!(store.count_follows().await.unwrap(), 1);
        assert!(service.is_following(reader.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_is_ignored() {
        let (store, service, reader, _author) = setup().await;
        assert!(!service.follow(reader.id, "reader").await.unwrap());
        assert_eq!(store.count_follows().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unfollow() {
        let (store, service, reader, author) = setup().await;
        service.follow(reader.id, "auth").await.unwrap();
        assert!(service.unfollow(reader.id, "auth").await.unwrap());
        assert!(!service.unfollow(reader.id, "auth").await.unwrap());
        assert_eq!(store.count_follows().await.unwrap(), 0);
        assert!(!service.is_following(reader.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_author_is_not_found() {
        let (_store, service, reader, _author) = setup().await;
        let err = service.follow(reader.id, "nobody").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
