//! Behaviour every `Repository` implementation must share. Each check runs against the
//! in-memory store; the Postgres variants need a database and are ignored by default
//! (`DATABASE_URL=postgres://... cargo test -- --ignored`).

use blogicum::{
    models::{CategoryForm, PostForm, ProfileForm, User},
    repository::{AdminPostFilter, MemoryRepository, PostgresRepository, Repository},
};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

async fn postgres() -> PostgresRepository {
    dotenv::dotenv().ok();
    let db_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set to run integration tests");
    let pool = PgPool::connect(&db_url)
        .await
        .expect("Failed to connect to database for integration tests.");
    PostgresRepository::init(pool)
        .await
        .expect("Failed to run database migrations.")
}

/// A fresh author with a unique username, so runs against a shared database don't collide.
async fn new_author(repo: &dyn Repository) -> User {
    let id = Uuid::new_v4();
    let username = format!("author_{}", &id.simple().to_string()[..12]);
    repo.create_user(User {
        id,
        email: format!("{username}@blogicum.test"),
        username,
        role: User::DEFAULT_ROLE.to_string(),
        ..User::default()
    })
    .await
    .unwrap()
}

fn form(title: &str, pub_date: DateTime<Utc>) -> PostForm {
    PostForm {
        title: title.to_string(),
        body: "body".to_string(),
        pub_date,
        ..PostForm::default()
    }
}

// --- Shared checks ---

async fn scheduled_post_appears_once_due(repo: &dyn Repository) {
    let author = new_author(repo).await;
    let now = Utc::now();
    let post = repo
        .create_post(author.id, form("Scheduled", now + Duration::hours(1)))
        .await
        .unwrap();

    let before = repo
        .list_author_posts(author.id, false, now, 1)
        .await
        .unwrap();
    assert!(before.items.is_empty());
    assert!(repo.get_visible_post(post.id, now).await.unwrap().is_none());

    let later = now + Duration::hours(1) + Duration::seconds(1);
    let after = repo
        .list_author_posts(author.id, false, later, 1)
        .await
        .unwrap();
    assert_eq!(after.items.len(), 1);
    let index = repo.list_visible_posts(later, 1).await.unwrap();
    assert!(index.total >= 1);
    assert!(repo.get_visible_post(post.id, later).await.unwrap().is_some());
}

async fn unpublished_category_hides_posts(repo: &dyn Repository) {
    let author = new_author(repo).await;
    let slug = format!("cat-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let category = repo
        .create_category(CategoryForm {
            title: "Hidden soon".into(),
            description: String::new(),
            slug,
            is_published: true,
        })
        .await
        .unwrap();

    let now = Utc::now();
    let post = repo
        .create_post(
            author.id,
            PostForm {
                category_id: Some(category.id),
                ..form("In category", now - Duration::hours(1))
            },
        )
        .await
        .unwrap();
    assert_eq!(
        repo.list_category_posts(category.id, now, 1).await.unwrap().total,
        1
    );

    repo.set_category_status(category.id, false).await.unwrap();

    assert!(repo.get_visible_post(post.id, now).await.unwrap().is_none());
    assert_eq!(
        repo.list_category_posts(category.id, now, 1).await.unwrap().total,
        0
    );
    // The author still sees it on their own profile.
    assert_eq!(
        repo.list_author_posts(author.id, true, now, 1).await.unwrap().total,
        1
    );
}

async fn out_of_range_page_clamps(repo: &dyn Repository) {
    let author = new_author(repo).await;
    let now = Utc::now();
    for n in 0..3 {
        repo.create_post(author.id, form(&format!("P{n}"), now - Duration::minutes(n + 1)))
            .await
            .unwrap();
    }

    let far = repo.list_author_posts(author.id, false, now, 999).await.unwrap();
    let first = repo.list_author_posts(author.id, false, now, 1).await.unwrap();
    assert_eq!(far, first);
    assert_eq!(first.items.len(), 3);
    assert_eq!(first.items[0].title, "P0");
}

async fn mutations_are_scoped_to_the_author(repo: &dyn Repository) {
    let author = new_author(repo).await;
    let stranger = new_author(repo).await;
    let post = repo
        .create_post(author.id, form("Mine", Utc::now() - Duration::hours(1)))
        .await
        .unwrap();
    let comment = repo
        .add_comment(post.id, author.id, "hello".into())
        .await
        .unwrap();

    assert!(
        repo.update_post(post.id, stranger.id, form("Theirs", Utc::now()))
            .await
            .unwrap()
            .is_none()
    );
    assert!(!repo.delete_post(post.id, stranger.id).await.unwrap());
    assert!(
        repo.update_comment(comment.id, stranger.id, "edited".into())
            .await
            .unwrap()
            .is_none()
    );
    assert!(!repo.delete_comment(comment.id, stranger.id).await.unwrap());

    assert!(repo.delete_post(post.id, author.id).await.unwrap());
    assert!(repo.get_comment(comment.id).await.unwrap().is_none());
}

async fn usernames_stay_unique(repo: &dyn Repository) {
    let first = new_author(repo).await;
    let second = new_author(repo).await;

    let clash = User {
        id: Uuid::new_v4(),
        ..first.clone()
    };
    assert!(repo.create_user(clash).await.is_err());

    let rename = ProfileForm {
        username: first.username.clone(),
        ..ProfileForm::from(&second)
    };
    assert!(repo.update_profile(second.id, rename).await.is_err());
}

async fn admin_titles_sort_case_insensitively(repo: &dyn Repository) {
    let author = new_author(repo).await;
    let now = Utc::now();
    for title in ["Zebra crossing", "alpine lakes", "Alps at dawn"] {
        repo.create_post(author.id, form(title, now)).await.unwrap();
    }

    let filter = AdminPostFilter {
        author: Some(author.username.clone()),
        ..AdminPostFilter::default()
    };
    let page = repo.list_admin_posts(&filter, 1).await.unwrap();
    let titles: Vec<&str> = page.items.iter().map(|post| post.title.as_str()).collect();
    assert_eq!(titles, vec!["alpine lakes", "Alps at dawn", "Zebra crossing"]);
}

// --- In-memory store ---

#[tokio::test]
async fn memory_scheduled_post_appears_once_due() {
    scheduled_post_appears_once_due(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn memory_unpublished_category_hides_posts() {
    unpublished_category_hides_posts(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn memory_out_of_range_page_clamps() {
    out_of_range_page_clamps(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn memory_mutations_are_scoped_to_the_author() {
    mutations_are_scoped_to_the_author(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn memory_usernames_stay_unique() {
    usernames_stay_unique(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn memory_admin_titles_sort_case_insensitively() {
    admin_titles_sort_case_insensitively(&MemoryRepository::new()).await;
}

// --- Postgres ---

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn postgres_scheduled_post_appears_once_due() {
    scheduled_post_appears_once_due(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn postgres_unpublished_category_hides_posts() {
    unpublished_category_hides_posts(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn postgres_out_of_range_page_clamps() {
    out_of_range_page_clamps(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn postgres_mutations_are_scoped_to_the_author() {
    mutations_are_scoped_to_the_author(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn postgres_usernames_stay_unique() {
    usernames_stay_unique(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn postgres_admin_titles_sort_case_insensitively() {
    admin_titles_sort_case_insensitively(&postgres().await).await;
}
