use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{AdminPostFilter, Repository};
use crate::{
    error::{RepoError, RepoResult},
    models::{
        AdminPostUpdate, Category, CategoryForm, Comment, Location, LocationForm, Post, PostForm,
        ProfileForm, User,
    },
    pagination::{POSTS_PER_PAGE, Page, PageWindow},
    visibility::push_visible_predicate,
};

// Post rows joined with author, category and location. Filters are appended by the callers.
const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.body, p.pub_date, p.author_id, u.username AS author_username,
           p.category_id, c.title AS category_title, c.slug AS category_slug,
           c.is_published AS category_is_published,
           p.location_id, l.name AS location_name,
           p.image, p.is_published, p.created_at,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN profiles u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

// Same joins as POST_SELECT so every filter can be reused for the page count.
const POST_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM posts p
    JOIN profiles u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
"#;

const CHRONOLOGICAL: &str = "p.pub_date DESC, p.id DESC";
const BY_TITLE: &str = "LOWER(p.title) ASC, p.id ASC";

const COMMENT_SELECT: &str = r#"
    SELECT cm.id, cm.post_id, cm.author_id, u.username AS author_username, cm.text, cm.created_at
    FROM comments cm
    JOIN profiles u ON u.id = cm.author_id
"#;

const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";
const PROFILE_COLUMNS: &str = "id, username, first_name, last_name, email, role";

/// PostgresRepository
///
/// `Repository` backed by Postgres. Queries are built at runtime with `QueryBuilder`, and
/// every value goes through a bind parameter.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Wraps `pool` after applying the embedded migrations in `migrations/`.
    pub async fn init(pool: PgPool) -> RepoResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
        Ok(Self::new(pool))
    }

    /// Counts the rows matching `filter`, clamps the requested page and fetches it.
    async fn fetch_post_page<F>(&self, filter: F, order_by: &str, requested: usize) -> RepoResult<Page<Post>>
    where
        F: Fn(&mut QueryBuilder<'_, Postgres>) + Send + Sync,
    {
        let mut count = QueryBuilder::new(POST_COUNT);
        filter(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let window = PageWindow::resolve(usize::try_from(total).unwrap_or(0), POSTS_PER_PAGE, requested);

        let mut select = QueryBuilder::new(POST_SELECT);
        filter(&mut select);
        select.push(" ORDER BY ").push(order_by);
        select.push(" LIMIT ").push_bind(window.limit() as i64);
        select.push(" OFFSET ").push_bind(window.offset() as i64);

        let posts = select.build_query_as::<Post>().fetch_all(&self.pool).await?;
        Ok(Page::from_window(posts, window))
    }

    // Re-reads a post after a write so the joined columns are fresh.
    async fn reload_post(&self, id: i64) -> RepoResult<Post> {
        self.get_post(id)
            .await?
            .ok_or(RepoError::Database(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_visible_posts(&self, now: DateTime<Utc>, page: usize) -> RepoResult<Page<Post>> {
        self.fetch_post_page(
            |builder| {
                builder.push(" WHERE ");
                push_visible_predicate(builder, now);
            },
            CHRONOLOGICAL,
            page,
        )
        .await
    }

    async fn list_category_posts(
        &self,
        category_id: i64,
        now: DateTime<Utc>,
        page: usize,
    ) -> RepoResult<Page<Post>> {
        self.fetch_post_page(
            |builder| {
                builder.push(" WHERE p.category_id = ").push_bind(category_id);
                builder.push(" AND ");
                push_visible_predicate(builder, now);
            },
            CHRONOLOGICAL,
            page,
        )
        .await
    }

    async fn list_author_posts(
        &self,
        author_id: Uuid,
        include_hidden: bool,
        now: DateTime<Utc>,
        page: usize,
    ) -> RepoResult<Page<Post>> {
        self.fetch_post_page(
            |builder| {
                builder.push(" WHERE p.author_id = ").push_bind(author_id);
                if !include_hidden {
                    builder.push(" AND ");
                    push_visible_predicate(builder, now);
                }
            },
            CHRONOLOGICAL,
            page,
        )
        .await
    }

    async fn get_visible_post(&self, id: i64, now: DateTime<Utc>) -> RepoResult<Option<Post>> {
        let mut builder = QueryBuilder::new(POST_SELECT);
        builder.push(" WHERE p.id = ").push_bind(id);
        builder.push(" AND ");
        push_visible_predicate(&mut builder, now);

        Ok(builder
            .build_query_as::<Post>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_post(&self, id: i64) -> RepoResult<Option<Post>> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// `is_published` is left to the column default.
    async fn create_post(&self, author_id: Uuid, form: PostForm) -> RepoResult<Post> {
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO posts (title, body, pub_date, author_id, category_id, location_id, image)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id"#,
        )
        .bind(form.title)
        .bind(form.body)
        .bind(form.pub_date)
        .bind(author_id)
        .bind(form.category_id)
        .bind(form.location_id)
        .bind(form.image)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(post_id = id, %author_id, "post created");
        self.reload_post(id).await
    }

    async fn update_post(&self, id: i64, author_id: Uuid, form: PostForm) -> RepoResult<Option<Post>> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"UPDATE posts
               SET title = $3, body = $4, pub_date = $5,
                   category_id = $6, location_id = $7, image = $8
               WHERE id = $1 AND author_id = $2
               RETURNING id"#,
        )
        .bind(id)
        .bind(author_id)
        .bind(form.title)
        .bind(form.body)
        .bind(form.pub_date)
        .bind(form.category_id)
        .bind(form.location_id)
        .bind(form.image)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => Ok(Some(self.reload_post(id).await?)),
            None => Ok(None),
        }
    }

    async fn delete_post(&self, id: i64, author_id: Uuid) -> RepoResult<bool> {
        // comments.post_id is ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_admin_posts(&self, filter: &AdminPostFilter, page: usize) -> RepoResult<Page<Post>> {
        self.fetch_post_page(
            |builder| {
                builder.push(" WHERE TRUE");
                if let Some(search) = &filter.search {
                    builder
                        .push(" AND p.title ILIKE ")
                        .push_bind(format!("%{}%", search));
                }
                if let Some(author) = &filter.author {
                    builder.push(" AND u.username = ").push_bind(author.clone());
                }
                if let Some(category) = &filter.category {
                    builder.push(" AND c.slug = ").push_bind(category.clone());
                }
                if let Some(from) = filter.created_from {
                    builder.push(" AND p.created_at >= ").push_bind(from);
                }
                if let Some(to) = filter.created_to {
                    builder.push(" AND p.created_at <= ").push_bind(to);
                }
            },
            BY_TITLE,
            page,
        )
        .await
    }

    async fn update_post_admin(&self, id: i64, update: AdminPostUpdate) -> RepoResult<Option<Post>> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"UPDATE posts
               SET is_published = COALESCE($2, is_published),
                   category_id = CASE WHEN $3 THEN $4 ELSE category_id END
               WHERE id = $1
               RETURNING id"#,
        )
        .bind(id)
        .bind(update.is_published)
        .bind(update.category_id.is_some())
        .bind(update.category_id.flatten())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => Ok(Some(self.reload_post(id).await?)),
            None => Ok(None),
        }
    }

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1");
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_categories(&self, published_only: bool) -> RepoResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_published OR NOT $1 ORDER BY title"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(published_only)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_category(&self, form: CategoryForm) -> RepoResult<Category> {
        let sql = format!(
            "INSERT INTO categories (title, description, slug, is_published) \
             VALUES ($1, $2, $3, $4) RETURNING {CATEGORY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(form.title)
            .bind(form.description)
            .bind(form.slug)
            .bind(form.is_published)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn set_category_status(&self, id: i64, is_published: bool) -> RepoResult<Option<Category>> {
        let sql = format!(
            "UPDATE categories SET is_published = $2 WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(is_published)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_location(&self, id: i64) -> RepoResult<Option<Location>> {
        Ok(
            sqlx::query_as::<_, Location>("SELECT id, name, created_at FROM locations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_locations(&self) -> RepoResult<Vec<Location>> {
        Ok(
            sqlx::query_as::<_, Location>("SELECT id, name, created_at FROM locations ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn create_location(&self, form: LocationForm) -> RepoResult<Location> {
        Ok(sqlx::query_as::<_, Location>(
            "INSERT INTO locations (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(form.name)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_comments(&self, post_id: i64) -> RepoResult<Vec<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE cm.post_id = $1 ORDER BY cm.created_at ASC, cm.id ASC");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE cm.id = $1");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Inserts and joins the author in one statement.
    async fn add_comment(&self, post_id: i64, author_id: Uuid, text: String) -> RepoResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3)
                RETURNING id, post_id, author_id, text, created_at
            )
            SELECT i.id, i.post_id, i.author_id, u.username AS author_username, i.text, i.created_at
            FROM inserted i JOIN profiles u ON u.id = i.author_id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(comment_id = comment.id, post_id, %author_id, "comment added");
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, author_id: Uuid, text: String) -> RepoResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments SET text = $3 WHERE id = $1 AND author_id = $2
                RETURNING id, post_id, author_id, text, created_at
            )
            SELECT d.id, d.post_id, d.author_id, u.username AS author_username, d.text, d.created_at
            FROM updated d JOIN profiles u ON u.id = d.author_id
            "#,
        )
        .bind(id)
        .bind(author_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_comment(&self, id: i64, author_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: User) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO profiles ({PROFILE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PROFILE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(user.username)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.email)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_profile(&self, id: Uuid, form: ProfileForm) -> RepoResult<Option<User>> {
        let sql = format!(
            "UPDATE profiles SET username = $2, first_name = $3, last_name = $4, email = $5 \
             WHERE id = $1 RETURNING {PROFILE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(form.username)
            .bind(form.first_name)
            .bind(form.last_name)
            .bind(form.email)
            .fetch_optional(&self.pool)
            .await?)
    }
}
