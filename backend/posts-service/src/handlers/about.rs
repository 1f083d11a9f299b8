/// Static "about" pages
use actix_web::HttpResponse;

pub async fn author() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "page": "author",
        "title": "About the author",
        "text": "Yatube is a small blogging platform built as a learning project.",
    }))
}

pub async fn tech() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "page": "tech",
        "title": "Technologies",
        "text": "Rust, actix-web, sqlx and PostgreSQL.",
    }))
}
