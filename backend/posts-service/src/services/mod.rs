/// Business logic layer for posts-service
///
/// - Feed assembly: scope -> ordered posts
/// - Pagination: ordered posts -> page N
/// - Post, comment and follow services: the write paths
pub mod comments;
pub mod feed;
pub mod follows;
pub mod pagination;
pub mod posts;

pub use comments::CommentService;
pub use feed::{FeedAssembler, FeedScope};
pub use follows::FollowService;
pub use pagination::{Page, Paginator};
pub use posts::PostService;
