/// Posts Service Library
///
/// Posts, groups, comments and follow feeds for the Yatube blogging
/// platform. Pages answer with JSON contexts; writes answer with redirects.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: Users, groups, posts, comments
/// - `services`: Feed assembly, pagination and the write paths
/// - `db`: `Store` trait with PostgreSQL and in-memory backends
/// - `cache`: TTL page cache for the index feed
/// - `forms`: Submitted forms and field errors
/// - `media`: Uploaded post images
/// - `middleware`: Viewer identity from bearer tokens
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
