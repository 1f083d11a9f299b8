/// Post handlers - index feed, detail, create, edit and delete
use super::{post_url, profile_url, redirect, FormContext, PageQuery};
use crate::cache::PageCache;
use crate::error::{AppError, Result};
use crate::forms::{comment_form_fields, post_form_fields, FormErrors, PostForm, Submission};
use crate::middleware::Viewer;
use crate::models::{Comment, Post};
use crate::services::{FeedScope, Page};
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::Bytes;
use serde::Serialize;

pub const INDEX_TITLE: &str = "Latest updates";

#[derive(Debug, Serialize)]
struct IndexContext {
    title: &'static str,
    page_obj: Page<Post>,
}

#[derive(Debug, Serialize)]
struct PostDetailContext {
    post: Post,
    /// Number of posts by the same author
    posts_count: i64,
    comments: Vec<Comment>,
    form: FormContext<()>,
}

/// Values a post form is pre-filled with
#[derive(Debug, Default, Serialize)]
pub struct PostInitial {
    pub text: String,
    pub group: Option<i64>,
    pub image: Option<String>,
}

impl PostInitial {
    fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id,
            image: post.image.clone(),
        }
    }

    fn from_form(form: &PostForm) -> Self {
        Self {
            text: form.text.clone(),
            group: form.group.as_deref().and_then(|g| g.trim().parse().ok()),
            image: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct PostFormContext {
    form: FormContext<PostInitial>,
    is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_id: Option<i64>,
}

fn json_page(body: Bytes) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/json")
        .body(body)
}

/// Index feed, served from the page cache while it is fresh
pub async fn index(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let key = PageCache::key(req.path(), req.query_string());
    if let Some(body) = state.cache.get(&key) {
        return Ok(json_page(body));
    }

    let posts = state.feed.assemble(&FeedScope::All).await?;
    let page_obj = state.paginator.paginate_raw(posts, query.page.as_deref());
    let body = Bytes::from(serde_json::to_vec(&IndexContext {
        title: INDEX_TITLE,
        page_obj,
    })?);

    state.cache.put(key, body.clone());
    Ok(json_page(body))
}

pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = state.posts.get(post_id.into_inner()).await?;
    let posts_count = state.store.count_posts_by_author(post.author_id).await?;
    let comments = state.comments.list(post.id).await?;

    Ok(HttpResponse::Ok().json(PostDetailContext {
        post,
        posts_count,
        comments,
        form: FormContext {
            fields: comment_form_fields(),
            initial: (),
            errors: FormErrors::new(),
        },
    }))
}

async fn render_post_form(
    state: &AppState,
    initial: PostInitial,
    errors: FormErrors,
    post_id: Option<i64>,
) -> Result<HttpResponse> {
    let groups = state.store.list_groups().await?;
    Ok(HttpResponse::Ok().json(PostFormContext {
        form: FormContext {
            fields: post_form_fields(&groups),
            initial,
            errors,
        },
        is_edit: post_id.is_some(),
        post_id,
    }))
}

pub async fn post_create_form(state: web::Data<AppState>, _viewer: Viewer) -> Result<HttpResponse> {
    render_post_form(&state, PostInitial::default(), FormErrors::new(), None).await
}

pub async fn post_create(
    state: web::Data<AppState>,
    viewer: Viewer,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = PostForm::from_multipart(payload).await?;
    let initial = PostInitial::from_form(&form);

    match state.posts.create(viewer.id, form).await? {
        Submission::Accepted(_) => Ok(redirect(profile_url(&viewer.username))),
        Submission::Rejected(errors) => render_post_form(&state, initial, errors, None).await,
    }
}

pub async fn post_edit_form(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = state.posts.get(post_id.into_inner()).await?;
    if post.author_id != viewer.id {
        return Ok(redirect(post_url(post.id)));
    }

    render_post_form(
        &state,
        PostInitial::from_post(&post),
        FormErrors::new(),
        Some(post.id),
    )
    .await
}

pub async fn post_edit(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let form = PostForm::from_multipart(payload).await?;
    let initial = PostInitial::from_form(&form);

    match state.posts.edit(viewer.id, post_id, form).await {
        Ok(Submission::Accepted(post)) => Ok(redirect(post_url(post.id))),
        Ok(Submission::Rejected(errors)) => {
            render_post_form(&state, initial, errors, Some(post_id)).await
        }
        Err(AppError::Forbidden(_)) => Ok(redirect(post_url(post_id))),
        Err(err) => Err(err),
    }
}

pub async fn post_delete(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    match state.posts.delete(viewer.id, post_id).await {
        Ok(_) => Ok(redirect(profile_url(&viewer.username))),
        Err(AppError::Forbidden(_)) => Ok(redirect(post_url(post_id))),
        Err(err) => Err(err),
    }
}
