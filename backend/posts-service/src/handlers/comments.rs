/// Comment handler
use super::{post_url, redirect};
use crate::error::Result;
use crate::forms::CommentForm;
use crate::middleware::Viewer;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// Add a comment and go back to the post. Invalid comments are dropped
/// without an error.
pub async fn add_comment(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    state
        .comments
        .add(viewer.id, post_id, form.into_inner())
        .await?;
    Ok(redirect(post_url(post_id)))
}
