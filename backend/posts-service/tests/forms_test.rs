//! Form submissions: create, edit, delete posts and add comments.

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use common::{location, with_multipart, TestApp, SMALL_GIF};
use posts_service::db::{PostFilter, Store};
use serde_json::Value;

#[actix_web::test]
async fn create_post_redirects_to_profile() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let group = app.group("test-1").await;
    let service = init_app!(app);

    let group_id = group.id.to_string();
    let req = with_multipart(
        app.post_as("/create/", &author),
        &[("text", "Test post"), ("group", group_id.as_str())],
        Some(("small.gif", SMALL_GIF)),
    );
    let resp = test::call_service(&service, req.to_request()).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");

    let posts = app.store.list_posts(&PostFilter::All).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "Test post");
    assert_eq!(posts[0].group_id, Some(group.id));
    assert_eq!(posts[0].image.as_deref(), Some("posts/small.gif"));
    assert!(app.media.path().join("posts/small.gif").exists());
}

#[actix_web::test]
async fn create_post_without_group_or_image() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let service = init_app!(app);

    let req = with_multipart(
        app.post_as("/create/", &author),
        &[("text", "Plain post"), ("group", "")],
        None,
    );
    let resp = test::call_service(&service, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let posts = app.store.list_posts(&PostFilter::All).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].group_id, None);
    assert_eq!(posts[0].image, None);
}

#[actix_web::test]
async fn invalid_post_form_is_rendered_with_errors() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let service = init_app!(app);

    let req = with_multipart(
        app.post_as("/create/", &author),
        &[("text", "   "), ("group", "999")],
        None,
    );
    let resp = test::call_service(&service, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["form"]["errors"]["text"].is_array());
    assert!(body["form"]["errors"]["group"].is_array());
    assert_eq!(app.store.count_posts_by_author(author.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn guest_cannot_create_post() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let service = init_app!(app);

    let req = with_multipart(TestRequest::post().uri("/create/"), &[("text", "Test post")], None);
    let resp = test::call_service(&service, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
    assert_eq!(app.store.count_posts_by_author(author.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn edit_post_changes_text() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let post = app.post(&author, "Test post", None).await;
    let service = init_app!(app);

    let req = with_multipart(
        app.post_as(&format!("/posts/{}/edit/", post.id), &author),
        &[("text", "Edited post")],
        None,
    );
    let resp = test::call_service(&service, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let edited = app.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(edited.text, "Edited post");
    assert_eq!(app.store.count_posts_by_author(author.id).await.unwrap(), 1);
}

#[actix_web::test]
async fn stranger_cannot_edit_or_delete() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let stranger = app.user("stranger").await;
    let post = app.post(&author, "Test post", None).await;
    let service = init_app!(app);

    let req = with_multipart(
        app.post_as(&format!("/posts/{}/edit/", post.id), &stranger),
        &[("text", "Hijacked")],
        None,
    );
    let resp = test::call_service(&service, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let resp = test::call_service(
        &service,
        app.post_as(&format!("/posts/{}/delete/", post.id), &stranger)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let unchanged = app.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(unchanged.text, "Test post");
}

#[actix_web::test]
async fn author_can_delete_post() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let post = app.post(&author, "Test post", None).await;
    let service = init_app!(app);

    let resp = test::call_service(
        &service,
        app.post_as(&format!("/posts/{}/delete/", post.id), &author)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");
    assert!(app.store.find_post(post.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn guest_comment_redirects_to_login() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let post = app.post(&author, "Test post", None).await;
    let service = init_app!(app);

    let path = format!("/posts/{}/comment/", post.id);
    let req = TestRequest::post()
        .uri(&path)
        .set_form([("text", "Guest comment")]);
    let resp = test::call_service(&service, req.to_request()).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/auth/login/?next={}", path));
    assert!(app.store.list_comments(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn user_comment_is_added_to_post() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let reader = app.user("reader").await;
    let post = app.post(&author, "Test post", None).await;
    let service = init_app!(app);

    let req = app
        .post_as(&format!("/posts/{}/comment/", post.id), &reader)
        .set_form([("text", "Nice post")]);
    let resp = test::call_service(&service, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let detail: Value = test::call_and_read_body_json(
        &service,
        TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(detail["comments"][0]["text"], "Nice post");
    assert_eq!(detail["comments"][0]["author_username"], "reader");
}

#[actix_web::test]
async fn blank_comment_is_dropped() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let post = app.post(&author, "Test post", None).await;
    let service = init_app!(app);

    let req = app
        .post_as(&format!("/posts/{}/comment/", post.id), &author)
        .set_form([("text", "  ")]);
    let resp = test::call_service(&service, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(app.store.list_comments(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn created_post_appears_on_index_despite_cache() {
    let app = TestApp::new();
    let author = app.user("auth").await;
    let service = init_app!(app);

    let before: Value =
        test::call_and_read_body_json(&service, TestRequest::get().uri("/").to_request()).await;
    assert_eq!(before["page_obj"]["total_count"], 0);

    let req = with_multipart(app.post_as("/create/", &author), &[("text", "New post")], None);
    test::call_service(&service, req.to_request()).await;

    let after: Value =
        test::call_and_read_body_json(&service, TestRequest::get().uri("/").to_request()).await;
    assert_eq!(after["page_obj"]["total_count"], 1);
}
