//! Persistence layer.
//!
//! Handlers only see the [`Repository`] trait. Two implementations exist: Postgres for
//! deployments and an in-process store for tests and database-less local runs. Both apply
//! the same visibility predicate and the same page clamping.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    error::RepoResult,
    models::{
        AdminPostUpdate, Category, CategoryForm, Comment, Location, LocationForm, Post, PostForm,
        ProfileForm, User,
    },
    pagination::Page,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// AdminPostFilter
///
/// Query parameters of the administrative post listing (GET /admin/posts).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AdminPostFilter {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    /// Author username.
    pub author: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Lower bound (inclusive) on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Upper bound (inclusive) on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
}

/// Repository
///
/// Every persistence operation the handlers need. `page` arguments are 1-based requested
/// page numbers; implementations clamp them. Mutations scoped by `author_id` only touch
/// rows owned by that author and report `None`/`false` otherwise.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Public post listings (visibility applied) ---
    // Index: all visible posts, newest first.
    async fn list_visible_posts(&self, now: DateTime<Utc>, page: usize) -> RepoResult<Page<Post>>;
    // Visible posts of one category, newest first.
    async fn list_category_posts(
        &self,
        category_id: i64,
        now: DateTime<Utc>,
        page: usize,
    ) -> RepoResult<Page<Post>>;
    // Posts of one author, newest first. `include_hidden` skips the visibility filter
    // and is only set when the author is looking at their own profile.
    async fn list_author_posts(
        &self,
        author_id: Uuid,
        include_hidden: bool,
        now: DateTime<Utc>,
        page: usize,
    ) -> RepoResult<Page<Post>>;
    async fn get_visible_post(&self, id: i64, now: DateTime<Utc>) -> RepoResult<Option<Post>>;

    // --- Posts (no visibility filter) ---
    async fn get_post(&self, id: i64) -> RepoResult<Option<Post>>;
    async fn create_post(&self, author_id: Uuid, form: PostForm) -> RepoResult<Post>;
    async fn update_post(&self, id: i64, author_id: Uuid, form: PostForm) -> RepoResult<Option<Post>>;
    // Deletes the post and its comments.
    async fn delete_post(&self, id: i64, author_id: Uuid) -> RepoResult<bool>;

    // --- Administration ---
    // All posts ordered by title.
    async fn list_admin_posts(&self, filter: &AdminPostFilter, page: usize) -> RepoResult<Page<Post>>;
    async fn update_post_admin(&self, id: i64, update: AdminPostUpdate) -> RepoResult<Option<Post>>;

    // --- Categories & Locations ---
    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>>;
    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>>;
    async fn list_categories(&self, published_only: bool) -> RepoResult<Vec<Category>>;
    async fn create_category(&self, form: CategoryForm) -> RepoResult<Category>;
    async fn set_category_status(&self, id: i64, is_published: bool) -> RepoResult<Option<Category>>;
    async fn get_location(&self, id: i64) -> RepoResult<Option<Location>>;
    async fn list_locations(&self) -> RepoResult<Vec<Location>>;
    async fn create_location(&self, form: LocationForm) -> RepoResult<Location>;

    // --- Comments ---
    // Oldest first.
    async fn list_comments(&self, post_id: i64) -> RepoResult<Vec<Comment>>;
    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>>;
    async fn add_comment(&self, post_id: i64, author_id: Uuid, text: String) -> RepoResult<Comment>;
    async fn update_comment(&self, id: i64, author_id: Uuid, text: String) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64, author_id: Uuid) -> RepoResult<bool>;

    // --- Profiles ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    // Fails with `RepoError::Conflict` on a taken username.
    async fn create_user(&self, user: User) -> RepoResult<User>;
    async fn update_profile(&self, id: Uuid, form: ProfileForm) -> RepoResult<Option<User>>;
}

/// RepositoryState
///
/// The repository handle shared through `AppState`.
pub type RepositoryState = Arc<dyn Repository>;
