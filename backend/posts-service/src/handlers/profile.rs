/// Author profile handler
use super::PageQuery;
use crate::error::{AppError, Result};
use crate::middleware::OptionalViewer;
use crate::models::{Post, User};
use crate::services::{FeedScope, Page};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ProfileContext {
    author: User,
    posts_count: i64,
    /// Whether the viewer follows this author; always false for guests and
    /// on one's own profile
    following: bool,
    page_obj: Page<Post>,
}

pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalViewer,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let username = username.into_inner();
    let author = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;

    let following = match &viewer.0 {
        Some(viewer) if viewer.id != author.id => {
            state.follows.is_following(viewer.id, author.id).await?
        }
        _ => false,
    };

    let posts = state.feed.assemble(&FeedScope::ByAuthor(username)).await?;
    let posts_count = posts.len() as i64;
    let page_obj = state.paginator.paginate_raw(posts, query.page.as_deref());

    Ok(HttpResponse::Ok().json(ProfileContext {
        author,
        posts_count,
        following,
        page_obj,
    }))
}
