/// Comment service - replies on posts
use crate::cache::PageCache;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::forms::CommentForm;
use crate::metrics::CONTENT_WRITES_TOTAL;
use crate::models::{Comment, NewComment};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
    cache: Arc<PageCache>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>, cache: Arc<PageCache>) -> Self {
        Self { store, cache }
    }

    /// Add a comment to `post_id`. An invalid form stores nothing and
    /// returns `None`; a missing post is `NotFound`.
    pub async fn add(
        &self,
        author_id: i64,
        post_id: i64,
        mut form: CommentForm,
    ) -> Result<Option<Comment>> {
        if self.store.find_post(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        if let Err(errors) = form.clean() {
            debug!(post_id, ?errors, "discarding invalid comment");
            return Ok(None);
        }

        let comment = self
            .store
            .create_comment(NewComment {
                post_id,
                author_id,
                text: form.text,
            })
            .await?;

        CONTENT_WRITES_TOTAL
            .with_label_values(&["comment", "create"])
            .inc();
        self.cache.invalidate_all();
        info!(post_id, comment_id = comment.id, "comment added");
        Ok(Some(comment))
    }

    pub async fn list(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.store.list_comments(post_id).await
    }
}
