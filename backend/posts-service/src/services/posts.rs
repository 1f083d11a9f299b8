/// Post service - create, edit and delete posts on behalf of their author
use crate::cache::PageCache;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::forms::{add_error, FormErrors, PostForm, Submission, INVALID_CHOICE};
use crate::media::MediaStorage;
use crate::metrics::CONTENT_WRITES_TOTAL;
use crate::models::{NewPost, Post, PostChanges};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn Store>,
    cache: Arc<PageCache>,
    media: MediaStorage,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>, cache: Arc<PageCache>, media: MediaStorage) -> Self {
        Self {
            store,
            cache,
            media,
        }
    }

    /// Get a post by ID, `NotFound` if it does not exist
    pub async fn get(&self, post_id: i64) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    /// Create a post authored by `author_id`
    pub async fn create(&self, author_id: i64, mut form: PostForm) -> Result<Submission<Post>> {
        let group_id = match self.clean(&mut form).await? {
            Ok(group_id) => group_id,
            Err(errors) => return Ok(Submission::Rejected(errors)),
        };

        let mut new_post = NewPost::new(author_id, form.text);
        if let Some(group_id) = group_id {
            new_post = new_post.in_group(group_id);
        }
        if let Some(upload) = &form.image {
            let reference = self
                .media
                .save_post_image(&upload.file_name, &upload.content)
                .await?;
            new_post = new_post.with_image(reference);
        }

        let post = self.store.create_post(new_post).await?;
        self.written("create");
        info!(post_id = post.id, author_id, "post created");
        Ok(Submission::Accepted(post))
    }

    /// Edit a post. Only its author may do so; anyone else gets `Forbidden`.
    /// The stored image is replaced only when a new one is uploaded.
    pub async fn edit(
        &self,
        viewer_id: i64,
        post_id: i64,
        mut form: PostForm,
    ) -> Result<Submission<Post>> {
        let existing = self.get(post_id).await?;
        ensure_author(&existing, viewer_id)?;

        let group_id = match self.clean(&mut form).await? {
            Ok(group_id) => group_id,
            Err(errors) => return Ok(Submission::Rejected(errors)),
        };

        let image = match &form.image {
            Some(upload) => Some(
                self.media
                    .save_post_image(&upload.file_name, &upload.content)
                    .await?,
            ),
            None => None,
        };

        let post = self
            .store
            .update_post(
                post_id,
                PostChanges {
                    text: form.text,
                    group_id,
                    image,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        self.written("update");
        info!(post_id, "post updated");
        Ok(Submission::Accepted(post))
    }

    /// Delete a post and its comments. Author only.
    pub async fn delete(&self, viewer_id: i64, post_id: i64) -> Result<Post> {
        let post = self.get(post_id).await?;
        ensure_author(&post, viewer_id)?;

        if !self.store.delete_post(post_id).await? {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }
        if let Some(image) = &post.image {
            if let Err(err) = self.media.remove(image).await {
                warn!(post_id, image = %image, "failed to remove post image: {}", err);
            }
        }

        self.written("delete");
        info!(post_id, "post deleted");
        Ok(post)
    }

    /// Field checks plus the group lookup; the outer `Result` carries store
    /// failures, the inner one form errors.
    async fn clean(&self, form: &mut PostForm) -> Result<std::result::Result<Option<i64>, FormErrors>> {
        let (group_id, mut errors) = match form.clean() {
            Ok(group_id) => (group_id, FormErrors::new()),
            Err(errors) => (None, errors),
        };

        if let Some(id) = group_id {
            if self.store.find_group(id).await?.is_none() {
                add_error(&mut errors, "group", INVALID_CHOICE);
            }
        }

        if errors.is_empty() {
            Ok(Ok(group_id))
        } else {
            Ok(Err(errors))
        }
    }

    fn written(&self, action: &str) {
        CONTENT_WRITES_TOTAL
            .with_label_values(&["post", action])
            .inc();
        self.cache.invalidate_all();
    }
}

fn ensure_author(post: &Post, viewer_id: i64) -> Result<()> {
    if post.author_id == viewer_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "user {} is not the author of post {}",
            viewer_id, post.id
        )))
    }
}
