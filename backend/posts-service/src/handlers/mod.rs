/// HTTP handlers for posts-service
///
/// Every page answers with the JSON context a template would have rendered.
/// Successful form submissions and authorization failures answer with a
/// `302 Found` redirect.
///
/// - Posts: index feed, post detail, create, edit, delete
/// - Groups: group feed
/// - Profile: author page and post count
/// - Comments: add a comment to a post
/// - Follow: follow feed, follow/unfollow
/// - About: static pages
/// - Health: liveness and store readiness
pub mod about;
pub mod comments;
pub mod follow;
pub mod groups;
pub mod health;
pub mod posts;
pub mod profile;

use crate::error::AppError;
use crate::forms::{FieldSpec, FormErrors};
use actix_web::{http::header, web, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

/// `?page=` query; kept raw so that junk values fall back to page 1
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Form as a template would receive it
#[derive(Debug, Serialize)]
pub struct FormContext<I: Serialize> {
    pub fields: Vec<FieldSpec>,
    pub initial: I,
    pub errors: FormErrors,
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    tracing::debug!(path = %req.path(), "no route");
    AppError::NotFound(format!("no page at {}", req.path())).error_response()
}

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(groups::group_posts))
        .route("/profile/{username}/", web::get().to(profile::profile))
        .route(
            "/profile/{username}/follow/",
            web::get().to(follow::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            web::get().to(follow::profile_unfollow),
        )
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/create/")
                .route(web::get().to(posts::post_create_form))
                .route(web::post().to(posts::post_create)),
        )
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(posts::post_edit_form))
                .route(web::post().to(posts::post_edit)),
        )
        .route("/posts/{post_id}/delete/", web::post().to(posts::post_delete))
        .route(
            "/posts/{post_id}/comment/",
            web::post().to(comments::add_comment),
        )
        .route("/follow/", web::get().to(follow::follow_index))
        .route("/about/author/", web::get().to(about::author))
        .route("/about/tech/", web::get().to(about::tech))
        .route("/health", web::get().to(health::health))
        .route("/health/live", web::get().to(health::liveness))
        .route("/health/ready", web::get().to(health::readiness))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .default_service(web::to(not_found));
}
