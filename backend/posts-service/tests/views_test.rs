//! Page contexts, pagination, caching and follow feeds.

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use common::TestApp;
use posts_service::config::FeedConfig;
use posts_service::db::Store;
use posts_service::models::NewPost;
use serde_json::Value;

macro_rules! get_json {
    ($service:expr, $req:expr $(,)?) => {{
        let resp = test::call_service($service, $req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        body
    }};
}

fn ids(page: &Value) -> Vec<i64> {
    page["page_obj"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

#[actix_web::test]
async fn paginator_splits_feeds_into_pages() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let group = app.group("test-1").await;
    for i in 0..13 {
        app.post(&author, &format!("Test post {}", i), Some(&group)).await;
    }
    let service = init_app!(app);

    for base in ["/", "/group/test-1/", "/profile/auth/"] {
        let first = get_json!(&service, TestRequest::get().uri(base).to_request());
        assert_eq!(ids(&first).len(), 10, "first page of {}", base);
        assert_eq!(first["page_obj"]["total_pages"], 2);
        assert_eq!(first["page_obj"]["has_next"], true);

        let second = get_json!(
            &service,
            TestRequest::get()
                .uri(&format!("{}?page=2", base))
                .to_request(),
        );
        assert_eq!(ids(&second).len(), 3, "second page of {}", base);
        assert_eq!(second["page_obj"]["has_previous"], true);
    }
}

#[actix_web::test]
async fn out_of_range_pages_are_clamped() {
    let app = TestApp::with_feed(FeedConfig {
        posts_per_page: 10,
        index_cache_ttl_secs: 0,
    });
    let author = app.user("auth").await;
    for i in 0..15 {
        app.post(&author, &format!("Test post {}", i), None).await;
    }
    let service = init_app!(app);

    let last = get_json!(&service, TestRequest::get().uri("/?page=99").to_request());
    assert_eq!(last["page_obj"]["number"], 2);
    assert_eq!(ids(&last).len(), 5);

    let junk = get_json!(&service, TestRequest::get().uri("/?page=abc").to_request());
    assert_eq!(junk["page_obj"]["number"], 1);
    assert_eq!(ids(&junk).len(), 10);
}

#[actix_web::test]
async fn feeds_are_newest_first() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let older = app.post(&author, "older", None).await;
    let newer = app
        .store
        .create_post(
            NewPost::new(author.id, "newer")
                .created_at(older.created_at + chrono::Duration::minutes(5)),
        )
        .await
        .unwrap();
    let service = init_app!(app);

    let index = get_json!(&service, TestRequest::get().uri("/").to_request());
    assert_eq!(ids(&index), vec![newer.id, older.id]);
}

#[actix_web::test]
async fn group_post_shows_up_where_expected() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let group = app.group("test-1").await;
    app.group("test-2").await;
    let post = app.post(&author, "Test post", Some(&group)).await;
    let service = init_app!(app);

    for page in ["/", "/group/test-1/", "/profile/auth/"] {
        let ctx = get_json!(&service, TestRequest::get().uri(page).to_request());
        assert_eq!(ids(&ctx), vec![post.id], "{}", page);
    }

    let other = get_json!(&service, TestRequest::get().uri("/group/test-2/").to_request());
    assert!(ids(&other).is_empty());
    assert_eq!(other["group"]["slug"], "test-2");
}

#[actix_web::test]
async fn page_contexts_carry_their_objects() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let group = app.group("test-1").await;
    let post = app.post(&author, "Test post", Some(&group)).await;
    app.post(&author, "Another post", None).await;
    let service = init_app!(app);

    let group_ctx = get_json!(&service, TestRequest::get().uri("/group/test-1/").to_request());
    assert_eq!(group_ctx["group"]["title"], "Test group");
    assert_eq!(group_ctx["group"]["description"], "Test description");

    let profile = get_json!(&service, TestRequest::get().uri("/profile/auth/").to_request());
    assert_eq!(profile["author"]["username"], "auth");
    assert_eq!(profile["posts_count"], 2);
    assert_eq!(profile["following"], false);

    let detail = get_json!(
        &service,
        TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    );
    assert_eq!(detail["post"]["text"], "Test post");
    assert_eq!(detail["post"]["author_username"], "auth");
    assert_eq!(detail["post"]["group_slug"], "test-1");
    assert_eq!(detail["posts_count"], 2);
    assert_eq!(detail["comments"], Value::Array(vec![]));
    assert_eq!(detail["form"]["fields"][0]["name"], "text");
}

#[actix_web::test]
async fn post_forms_describe_their_fields() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let group = app.group("test-1").await;
    let post = app.post(&author, "Test post", Some(&group)).await;
    let service = init_app!(app);

    let create = get_json!(&service, app.get_as("/create/", &author).to_request());
    let kinds: Vec<(&str, &str)> = create["form"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| (f["name"].as_str().unwrap(), f["kind"].as_str().unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![("text", "char"), ("group", "choice"), ("image", "image")]
    );
    assert_eq!(create["form"]["fields"][1]["choices"][0]["value"], group.id);
    assert_eq!(create["is_edit"], false);

    let edit = get_json!(
        &service,
        app.get_as(&format!("/posts/{}/edit/", post.id), &author)
            .to_request(),
    );
    assert_eq!(edit["is_edit"], true);
    assert_eq!(edit["post_id"], post.id);
    assert_eq!(edit["form"]["initial"]["text"], "Test post");
    assert_eq!(edit["form"]["initial"]["group"], group.id);
}

#[actix_web::test]
async fn index_is_cached_until_a_write() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    app.post(&author, "First post", None).await;
    let service = init_app!(app);

    let before =
        test::call_and_read_body(&service, TestRequest::get().uri("/").to_request()).await;

    // Written behind the services' back, so the cache is not cleared
    app.post(&author, "Sneaky post", None).await;
    let cached =
        test::call_and_read_body(&service, TestRequest::get().uri("/").to_request()).await;
    assert_eq!(before, cached);

    app.state.cache.invalidate_all();
    let fresh: Value =
        test::call_and_read_body_json(&service, TestRequest::get().uri("/").to_request()).await;
    assert_eq!(fresh["page_obj"]["total_count"], 2);
}

#[actix_web::test]
async fn follow_and_unfollow_change_follow_count() {
    let app = TestApp::new();
    let reader = app.user("reader").await;
    app.user("auth").await;
    let service = init_app!(app);

    let resp = test::call_service(
        &service,
        app.get_as("/profile/auth/follow/", &reader).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location(&resp), "/profile/auth/");
    assert_eq!(app.store.count_follows().await.unwrap(), 1);

    let profile = get_json!(&service, app.get_as("/profile/auth/", &reader).to_request());
    assert_eq!(profile["following"], true);

    // Following twice changes nothing
    test::call_service(
        &service,
        app.get_as("/profile/auth/follow/", &reader).to_request(),
    )
    .await;
    assert_eq!(app.store.count_follows().await.unwrap(), 1);

    let resp = test::call_service(
        &service,
        app.get_as("/profile/auth/unfollow/", &reader).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(app.store.count_follows().await.unwrap(), 0);
}

#[actix_web::test]
async fn self_follow_is_ignored() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let service = init_app!(app);

    let resp = test::call_service(
        &service,
        app.get_as("/profile/auth/follow/", &author).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(app.store.count_follows().await.unwrap(), 0);
}

#[actix_web::test]
async fn new_post_reaches_followers_only() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let follower = app.user("follower").await;
    let stranger = app.user("stranger").await;
    let service = init_app!(app);

    test::call_service(
        &service,
        app.get_as("/profile/auth/follow/", &follower).to_request(),
    )
    .await;
    let post = app.post(&author, "Fresh post", None).await;

    let feed = get_json!(&service, app.get_as("/follow/", &follower).to_request());
    assert_eq!(ids(&feed), vec![post.id]);

    let feed = get_json!(&service, app.get_as("/follow/", &stranger).to_request());
    assert!(ids(&feed).is_empty());
}
