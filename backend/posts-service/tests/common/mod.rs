//! Shared fixtures for the HTTP integration tests.
//!
//! Every test builds its own `TestApp`: a fresh `MemoryStore`, a temporary
//! media root and signing keys. Nothing is shared between tests.
#![allow(dead_code)]

use actix_web::http::header;
use actix_web::test::TestRequest;
use actix_web::web;
use posts_service::config::FeedConfig;
use posts_service::db::{MemoryStore, Store};
use posts_service::media::MediaStorage;
use posts_service::middleware::JwtKeys;
use posts_service::models::{Group, NewGroup, NewPost, Post, User};
use posts_service::AppState;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const SECRET: &str = "integration-test-secret";
pub const BOUNDARY: &str = "----yatube-test-boundary";

/// Build an actix test service around a `TestApp`
macro_rules! init_app {
    ($app:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($app.state.clone())
                .wrap(posts_service::middleware::ViewerIdentity::new(
                    $app.keys.clone(),
                ))
                .configure(posts_service::handlers::configure),
        )
        .await
    };
}

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub store: Arc<MemoryStore>,
    pub keys: Arc<JwtKeys>,
    pub media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_feed(FeedConfig {
            posts_per_page: 10,
            index_cache_ttl_secs: 20,
        })
    }

    pub fn with_feed(feed: FeedConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let media = tempfile::tempdir().expect("media tempdir");
        let state = web::Data::new(AppState::new(
            store.clone(),
            &feed,
            MediaStorage::new(media.path()),
        ));
        Self {
            state,
            store,
            keys: Arc::new(JwtKeys::from_secret(SECRET)),
            media,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.store.create_user(username).await.expect("create user")
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.store
            .create_group(NewGroup {
                title: "Test group".to_string(),
                slug: slug.to_string(),
                description: "Test description".to_string(),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        let mut new_post = NewPost::new(author.id, text);
        if let Some(group) = group {
            new_post = new_post.in_group(group.id);
        }
        self.store.create_post(new_post).await.expect("create post")
    }

    pub fn token(&self, user: &User) -> String {
        self.keys
            .issue_token(user, Duration::from_secs(3600))
            .expect("issue token")
    }

    /// GET as `user`
    pub fn get_as(&self, path: &str, user: &User) -> TestRequest {
        authorize(TestRequest::get().uri(path), &self.token(user))
    }

    /// POST as `user`
    pub fn post_as(&self, path: &str, user: &User) -> TestRequest {
        authorize(TestRequest::post().uri(path), &self.token(user))
    }
}

pub fn authorize(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
}

/// Attach a multipart/form-data body with text fields and an optional file
/// part named `image`.
pub fn with_multipart(
    req: TestRequest,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> TestRequest {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: image/gif\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    req.insert_header((
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    ))
    .set_payload(body)
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];
