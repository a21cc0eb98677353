//! In-process `Repository` used by tests and by local runs with `DATABASE_URL=memory`.
//! Contents are lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AdminPostFilter, Repository};
use crate::{
    error::{RepoError, RepoResult},
    models::{
        AdminPostUpdate, Category, CategoryForm, Comment, Location, LocationForm, Post, PostForm,
        ProfileForm, User,
    },
    pagination::{POSTS_PER_PAGE, Page, paginate},
    visibility::is_visible,
};

#[derive(Debug, Clone)]
struct PostRecord {
    id: i64,
    title: String,
    body: String,
    pub_date: DateTime<Utc>,
    author_id: Uuid,
    category_id: Option<i64>,
    location_id: Option<i64>,
    image: Option<String>,
    is_published: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: i64,
    post_id: i64,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    categories: Vec<Category>,
    locations: Vec<Location>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    last_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn username(&self, id: Uuid) -> String {
        self.users
            .iter()
            .find(|user| user.id == id)
            .map(|user| user.username.clone())
            .unwrap_or_default()
    }

    // Same shape as the joined row the Postgres store returns.
    fn hydrate_post(&self, record: &PostRecord) -> Post {
        let category = record
            .category_id
            .and_then(|id| self.categories.iter().find(|category| category.id == id));
        let location = record
            .location_id
            .and_then(|id| self.locations.iter().find(|location| location.id == id));
        let comment_count = self
            .comments
            .iter()
            .filter(|comment| comment.post_id == record.id)
            .count() as i64;

        Post {
            id: record.id,
            title: record.title.clone(),
            body: record.body.clone(),
            pub_date: record.pub_date,
            author_id: record.author_id,
            author_username: self.username(record.author_id),
            category_id: category.map(|category| category.id),
            category_title: category.map(|category| category.title.clone()),
            category_slug: category.map(|category| category.slug.clone()),
            category_is_published: category.map(|category| category.is_published),
            location_id: location.map(|location| location.id),
            location_name: location.map(|location| location.name.clone()),
            image: record.image.clone(),
            is_published: record.is_published,
            created_at: record.created_at,
            comment_count,
        }
    }

    fn hydrate_comment(&self, record: &CommentRecord) -> Comment {
        Comment {
            id: record.id,
            post_id: record.post_id,
            author_id: record.author_id,
            author_username: self.username(record.author_id),
            text: record.text.clone(),
            created_at: record.created_at,
        }
    }

    /// Hydrated posts matching `keep`, newest first.
    fn chronological(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .map(|record| self.hydrate_post(record))
            .filter(|post| keep(post))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts
    }

    fn post(&self, id: i64) -> Option<Post> {
        self.posts
            .iter()
            .find(|record| record.id == id)
            .map(|record| self.hydrate_post(record))
    }
}

/// MemoryRepository
#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_visible_posts(&self, now: DateTime<Utc>, page: usize) -> RepoResult<Page<Post>> {
        let store = self.store.read().await;
        let posts = store.chronological(|post| is_visible(post, now));
        Ok(paginate(posts, POSTS_PER_PAGE, page))
    }

    async fn list_category_posts(
        &self,
        category_id: i64,
        now: DateTime<Utc>,
        page: usize,
    ) -> RepoResult<Page<Post>> {
        let store = self.store.read().await;
        let posts = store
            .chronological(|post| post.category_id == Some(category_id) && is_visible(post, now));
        Ok(paginate(posts, POSTS_PER_PAGE, page))
    }

    async fn list_author_posts(
        &self,
        author_id: Uuid,
        include_hidden: bool,
        now: DateTime<Utc>,
        page: usize,
    ) -> RepoResult<Page<Post>> {
        let store = self.store.read().await;
        let posts = store.chronological(|post| {
            post.author_id == author_id && (include_hidden || is_visible(post, now))
        });
        Ok(paginate(posts, POSTS_PER_PAGE, page))
    }

    async fn get_visible_post(&self, id: i64, now: DateTime<Utc>) -> RepoResult<Option<Post>> {
        let store = self.store.read().await;
        Ok(store.post(id).filter(|post| is_visible(post, now)))
    }

    async fn get_post(&self, id: i64) -> RepoResult<Option<Post>> {
        Ok(self.store.read().await.post(id))
    }

    async fn create_post(&self, author_id: Uuid, form: PostForm) -> RepoResult<Post> {
        let mut store = self.store.write().await;
        let id = store.next_id();
        store.posts.push(PostRecord {
            id,
            title: form.title,
            body: form.body,
            pub_date: form.pub_date,
            author_id,
            category_id: form.category_id,
            location_id: form.location_id,
            image: form.image,
            is_published: true,
            created_at: Utc::now(),
        });
        tracing::info!(post_id = id, %author_id, "post created");
        store
            .post(id)
            .ok_or(RepoError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_post(&self, id: i64, author_id: Uuid, form: PostForm) -> RepoResult<Option<Post>> {
        let mut store = self.store.write().await;
        let Some(record) = store
            .posts
            .iter_mut()
            .find(|record| record.id == id && record.author_id == author_id)
        else {
            return Ok(None);
        };
        record.title = form.title;
        record.body = form.body;
        record.pub_date = form.pub_date;
        record.category_id = form.category_id;
        record.location_id = form.location_id;
        record.image = form.image;
        Ok(store.post(id))
    }

    async fn delete_post(&self, id: i64, author_id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let before = store.posts.len();
        store
            .posts
            .retain(|record| !(record.id == id && record.author_id == author_id));
        let deleted = store.posts.len() < before;
        if deleted {
            store.comments.retain(|comment| comment.post_id != id);
        }
        Ok(deleted)
    }

    async fn list_admin_posts(&self, filter: &AdminPostFilter, page: usize) -> RepoResult<Page<Post>> {
        let store = self.store.read().await;
        let search = filter.search.as_ref().map(|search| search.to_lowercase());
        let mut posts: Vec<Post> = store
            .posts
            .iter()
            .map(|record| store.hydrate_post(record))
            .filter(|post| {
                search
                    .as_ref()
                    .is_none_or(|search| post.title.to_lowercase().contains(search))
                    && filter
                        .author
                        .as_ref()
                        .is_none_or(|author| &post.author_username == author)
                    && filter
                        .category
                        .as_ref()
                        .is_none_or(|slug| post.category_slug.as_ref() == Some(slug))
                    && filter.created_from.is_none_or(|from| post.created_at >= from)
                    && filter.created_to.is_none_or(|to| post.created_at <= to)
            })
            .collect();
        posts.sort_by_cached_key(|post| (post.title.to_lowercase(), post.id));
        Ok(paginate(posts, POSTS_PER_PAGE, page))
    }

    async fn update_post_admin(&self, id: i64, update: AdminPostUpdate) -> RepoResult<Option<Post>> {
        let mut store = self.store.write().await;
        let Some(record) = store.posts.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };
        if let Some(is_published) = update.is_published {
            record.is_published = is_published;
        }
        if let Some(category_id) = update.category_id {
            record.category_id = category_id;
        }
        Ok(store.post(id))
    }

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        let store = self.store.read().await;
        Ok(store.categories.iter().find(|category| category.id == id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let store = self.store.read().await;
        Ok(store
            .categories
            .iter()
            .find(|category| category.slug == slug)
            .cloned())
    }

    async fn list_categories(&self, published_only: bool) -> RepoResult<Vec<Category>> {
        let store = self.store.read().await;
        let mut categories: Vec<Category> = store
            .categories
            .iter()
            .filter(|category| category.is_published || !published_only)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn create_category(&self, form: CategoryForm) -> RepoResult<Category> {
        let mut store = self.store.write().await;
        if store.categories.iter().any(|category| category.slug == form.slug) {
            return Err(RepoError::Conflict(format!("slug {} is taken", form.slug)));
        }
        let category = Category {
            id: store.next_id(),
            title: form.title,
            description: form.description,
            slug: form.slug,
            is_published: form.is_published,
            created_at: Utc::now(),
        };
        store.categories.push(category.clone());
        Ok(category)
    }

    async fn set_category_status(&self, id: i64, is_published: bool) -> RepoResult<Option<Category>> {
        let mut store = self.store.write().await;
        Ok(store
            .categories
            .iter_mut()
            .find(|category| category.id == id)
            .map(|category| {
                category.is_published = is_published;
                category.clone()
            }))
    }

    async fn get_location(&self, id: i64) -> RepoResult<Option<Location>> {
        let store = self.store.read().await;
        Ok(store.locations.iter().find(|location| location.id == id).cloned())
    }

    async fn list_locations(&self) -> RepoResult<Vec<Location>> {
        let store = self.store.read().await;
        let mut locations = store.locations.clone();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn create_location(&self, form: LocationForm) -> RepoResult<Location> {
        let mut store = self.store.write().await;
        let location = Location {
            id: store.next_id(),
            name: form.name,
            created_at: Utc::now(),
        };
        store.locations.push(location.clone());
        Ok(location)
    }

    async fn list_comments(&self, post_id: i64) -> RepoResult<Vec<Comment>> {
        let store = self.store.read().await;
        let mut comments: Vec<Comment> = store
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .map(|comment| store.hydrate_comment(comment))
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let store = self.store.read().await;
        Ok(store
            .comments
            .iter()
            .find(|comment| comment.id == id)
            .map(|comment| store.hydrate_comment(comment)))
    }

    async fn add_comment(&self, post_id: i64, author_id: Uuid, text: String) -> RepoResult<Comment> {
        let mut store = self.store.write().await;
        let record = CommentRecord {
            id: store.next_id(),
            post_id,
            author_id,
            text,
            created_at: Utc::now(),
        };
        let comment = store.hydrate_comment(&record);
        store.comments.push(record);
        tracing::info!(comment_id = comment.id, post_id, %author_id, "comment added");
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, author_id: Uuid, text: String) -> RepoResult<Option<Comment>> {
        let mut store = self.store.write().await;
        let Some(record) = store
            .comments
            .iter_mut()
            .find(|comment| comment.id == id && comment.author_id == author_id)
        else {
            return Ok(None);
        };
        record.text = text;
        let record = record.clone();
        Ok(Some(store.hydrate_comment(&record)))
    }

    async fn delete_comment(&self, id: i64, author_id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let before = store.comments.len();
        store
            .comments
            .retain(|comment| !(comment.id == id && comment.author_id == author_id));
        Ok(store.comments.len() < before)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|user| user.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(&self, user: User) -> RepoResult<User> {
        let mut store = self.store.write().await;
        if store
            .users
            .iter()
            .any(|existing| existing.id == user.id || existing.username == user.username)
        {
            return Err(RepoError::Conflict(format!("username {} is taken", user.username)));
        }
        store.users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, form: ProfileForm) -> RepoResult<Option<User>> {
        let mut store = self.store.write().await;
        if store
            .users
            .iter()
            .any(|user| user.id != id && user.username == form.username)
        {
            return Err(RepoError::Conflict(format!("username {} is taken", form.username)));
        }
        Ok(store.users.iter_mut().find(|user| user.id == id).map(|user| {
            user.username = form.username;
            user.first_name = form.first_name;
            user.last_name = form.last_name;
            user.email = form.email;
            user.clone()
        }))
    }
}
