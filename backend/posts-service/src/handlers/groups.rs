/// Group handlers
use super::PageQuery;
use crate::error::{AppError, Result};
use crate::models::{Group, Post};
use crate::services::{FeedScope, Page};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct GroupContext {
    group: Group,
    page_obj: Page<Post>,
}

/// Posts of one group, newest first
pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let slug = slug.into_inner();
    let group = state
        .store
        .find_group_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group {}", slug)))?;

    let posts = state.feed.assemble(&FeedScope::ByGroup(slug)).await?;
    let page_obj = state.paginator.paginate_raw(posts, query.page.as_deref());

    Ok(HttpResponse::Ok().json(GroupContext { group, page_obj }))
}
