//! Seed script for demo users and groups, printing a bearer token per user
//! Run with: cargo run --bin seed

use posts_service::db::{PgStore, Store};
use posts_service::middleware::JwtKeys;
use posts_service::models::NewGroup;
use posts_service::Config;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

const TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    println!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.store.database_url)
        .await?;
    let store = PgStore::new(pool);
    store.migrate().await?;
    println!("Connected successfully!");

    let usernames = std::env::var("SEED_USERS").unwrap_or_else(|_| "auth,reader".to_string());
    let keys = JwtKeys::from_secret(&config.auth.jwt_secret);

    let mut tokens = Vec::new();
    for username in usernames.split(',').map(str::trim).filter(|u| !u.is_empty()) {
        let user = match store.find_user_by_username(username).await? {
            Some(user) => {
                println!("User {} already exists", username);
                user
            }
            None => {
                println!("Creating user {}...", username);
                store.create_user(username).await?
            }
        };
        tokens.push((user.username.clone(), keys.issue_token(&user, TOKEN_TTL)?));
    }

    let slug = std::env::var("SEED_GROUP_SLUG").unwrap_or_else(|_| "test-1".to_string());
    if store.find_group_by_slug(&slug).await?.is_none() {
        println!("Creating group {}...", slug);
        store
            .create_group(NewGroup {
                title: "Test group".to_string(),
                slug: slug.clone(),
                description: "Demo group".to_string(),
            })
            .await?;
    }

    println!("\n========================================");
    println!("Demo accounts ready");
    println!("========================================");
    for (username, token) in tokens {
        println!("{}:\n  Authorization: Bearer {}", username, token);
    }
    println!("========================================");

    Ok(())
}
