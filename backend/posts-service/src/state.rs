/// Shared application state handed to every handler
use crate::cache::PageCache;
use crate::config::FeedConfig;
use crate::db::Store;
use crate::media::MediaStorage;
use crate::services::{CommentService, FeedAssembler, FollowService, Paginator, PostService};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub feed: FeedAssembler,
    pub paginator: Paginator,
    pub cache: Arc<PageCache>,
    pub posts: PostService,
    pub comments: CommentService,
    pub follows: FollowService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, feed: &FeedConfig, media: MediaStorage) -> Self {
        let cache = Arc::new(PageCache::new(Duration::from_secs(
            feed.index_cache_ttl_secs,
        )));

        Self {
            feed: FeedAssembler::new(store.clone()),
            paginator: Paginator::new(feed.posts_per_page),
            posts: PostService::new(store.clone(), cache.clone(), media),
            comments: CommentService::new(store.clone(), cache.clone()),
            follows: FollowService::new(store.clone(), cache.clone()),
            cache,
            store,
        }
    }
}
