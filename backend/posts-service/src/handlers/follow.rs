/// Follow handlers - subscription feed, follow and unfollow
use super::{profile_url, redirect, PageQuery};
use crate::error::Result;
use crate::middleware::Viewer;
use crate::models::Post;
use crate::services::{FeedScope, Page};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct FollowContext {
    page_obj: Page<Post>,
}

/// Posts by every author the viewer follows
pub async fn follow_index(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let posts = state
        .feed
        .assemble(&FeedScope::ByFollowedAuthors(viewer.id))
        .await?;
    let page_obj = state.paginator.paginate_raw(posts, query.page.as_deref());
    Ok(HttpResponse::Ok().json(FollowContext { page_obj }))
}

pub async fn profile_follow(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let username = username.into_inner();
    state.follows.follow(viewer.id, &username).await?;
    Ok(redirect(profile_url(&username)))
}

pub async fn profile_unfollow(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let username = username.into_inner();
    state.follows.unfollow(viewer.id, &username).await?;
    Ok(redirect(profile_url(&username)))
}
