//! Process-local store backed by ordered maps behind an async `RwLock`.
//!
//! Mirrors the PostgreSQL schema constraints (unique usernames and slugs,
//! unique follow pairs, no self-follow, cascading deletes) so the services
//! behave the same against either backend.

use super::{PostFilter, Store};
use crate::error::{AppError, Result};
use crate::models::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges, User};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    author_id: i64,
    group_id: Option<i64>,
    image: Option<String>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Sequences {
    user: i64,
    group: i64,
    post: i64,
    comment: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct State {
    seq: Sequences,
    users: BTreeMap<i64, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    /// (user_id, author_id)
    follows: BTreeSet<(i64, i64)>,
}

impl State {
    fn username(&self, user_id: i64) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn hydrate_post(&self, row: &PostRow) -> Post {
        let group = row.group_id.and_then(|id| self.groups.get(&id));
        Post {
            id: row.id,
            text: row.text.clone(),
            created_at: row.created_at,
            author_id: row.author_id,
            author_username: self.username(row.author_id),
            group_id: group.map(|g| g.id),
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
            image: row.image.clone(),
        }
    }

    fn hydrate_comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_username: self.username(row.author_id),
            text: row.text.clone(),
            created_at: row.created_at,
        }
    }

    fn require_user(&self, user_id: i64) -> Result<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("user {}", user_id)))
        }
    }

    fn require_group(&self, group_id: Option<i64>) -> Result<()> {
        match group_id {
            Some(id) if !self.groups.contains_key(&id) => {
                Err(AppError::NotFound(format!("group {}", id)))
            }
            _ => Ok(()),
        }
    }
}

/// In-memory `Store` implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, username: &str) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!(
                "username {} is already taken",
                username
            )));
        }

        let user = User {
            id: next(&mut state.seq.user),
            username: username.to_string(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group slug {} is already taken",
                group.slug
            )));
        }

        let group = Group {
            id: next(&mut state.seq.group),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>> {
        Ok(self.state.read().await.groups.get(&group_id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn delete_group(&self, group_id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.groups.remove(&group_id).is_none() {
            return Ok(false);
        }
        for post in state.posts.values_mut() {
            if post.group_id == Some(group_id) {
                post.group_id = None;
            }
        }
        Ok(true)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut state = self.state.write().await;
        state.require_user(post.author_id)?;
        state.require_group(post.group_id)?;

        let row = PostRow {
            id: next(&mut state.seq.post),
            text: post.text,
            created_at: post.created_at.unwrap_or_else(Utc::now),
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        };
        let hydrated = state.hydrate_post(&row);
        state.posts.insert(row.id, row);
        Ok(hydrated)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.posts.get(&post_id).map(|row| state.hydrate_post(row)))
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        state.require_group(changes.group_id)?;

        let Some(row) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        row.text = changes.text;
        row.group_id = changes.group_id;
        if let Some(image) = changes.image {
            row.image = Some(image);
        }

        let row = row.clone();
        Ok(Some(state.hydrate_post(&row)))
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.posts.remove(&post_id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, c| c.post_id != post_id);
        Ok(true)
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        let posts = state
            .posts
            .values()
            .filter(|row| match filter {
                PostFilter::All => true,
                PostFilter::Group(id) => row.group_id == Some(*id),
                PostFilter::Author(id) => row.author_id == *id,
                PostFilter::Authors(ids) => ids.contains(&row.author_id),
            })
            .map(|row| state.hydrate_post(row))
            .collect();
        Ok(posts)
    }

    async fn count_posts_by_author(&self, author_id: i64) -> Result<i64> {
        let state = self.state.read().await;
        let count = state
            .posts
            .values()
            .filter(|row| row.author_id == author_id)
            .count();
        Ok(count as i64)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut state = self.state.write().await;
        state.require_user(comment.author_id)?;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(AppError::NotFound(format!("post {}", comment.post_id)));
        }

        let row = CommentRow {
            id: next(&mut state.seq.comment),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: Utc::now(),
        };
        let hydrated = state.hydrate_comment(&row);
        state.comments.insert(row.id, row);
        Ok(hydrated)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .map(|c| state.hydrate_comment(c))
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn create_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        if user_id == author_id {
            return Err(AppError::Validation("users cannot follow themselves".into()));
        }
        let mut state = self.state.write().await;
        state.require_user(user_id)?;
        state.require_user(author_id)?;
        Ok(state.follows.insert((user_id, author_id)))
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        Ok(self.state.write().await.follows.remove(&(user_id, author_id)))
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .follows
            .contains(&(user_id, author_id)))
    }

    async fn followed_author_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user_id)
            .map(|(_, author)| *author)
            .collect())
    }

    async fn count_follows(&self) -> Result<i64> {
        Ok(self.state.read().await.follows.len() as i64)
    }
}
