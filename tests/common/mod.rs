#![allow(dead_code)]

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use blogicum::{
    AppConfig, AppState, MemoryRepository, MockStorageService,
    auth::{AuthUser, Claims},
    models::{Category, CategoryForm, Post, PostForm, User},
    repository::Repository,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

pub const ANNA_ID: Uuid = Uuid::from_u128(1);
pub const BORIS_ID: Uuid = Uuid::from_u128(2);
pub const ADMIN_ID: Uuid = Uuid::from_u128(9);

/// A seeded in-memory application: two authors and one administrator.
pub struct Fixture {
    pub repo: Arc<MemoryRepository>,
    pub state: AppState,
    pub anna: User,
    pub boris: User,
    pub admin: User,
}

pub async fn fixture() -> Fixture {
    fixture_with(AppConfig::default(), MockStorageService::new()).await
}

pub async fn fixture_with(config: AppConfig, storage: MockStorageService) -> Fixture {
    let repo = Arc::new(MemoryRepository::new());
    let anna = repo.create_user(user(ANNA_ID, "anna", "user")).await.unwrap();
    let boris = repo.create_user(user(BORIS_ID, "boris", "user")).await.unwrap();
    let admin = repo.create_user(user(ADMIN_ID, "root", "admin")).await.unwrap();

    let state = AppState {
        repo: repo.clone(),
        storage: Arc::new(storage),
        config,
    };

    Fixture {
        repo,
        state,
        anna,
        boris,
        admin,
    }
}

pub fn user(id: Uuid, username: &str, role: &str) -> User {
    User {
        id,
        username: username.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: format!("{username}@blogicum.test"),
        role: role.to_string(),
    }
}

pub fn actor(user: &User) -> AuthUser {
    user.clone().into()
}

pub fn post_form(title: &str, pub_date: DateTime<Utc>) -> PostForm {
    PostForm {
        title: title.to_string(),
        body: format!("{title} body"),
        pub_date,
        ..PostForm::default()
    }
}

pub async fn seed_post(
    repo: &MemoryRepository,
    author: &User,
    title: &str,
    pub_date: DateTime<Utc>,
) -> Post {
    repo.create_post(author.id, post_form(title, pub_date))
        .await
        .unwrap()
}

pub async fn seed_category(repo: &MemoryRepository, slug: &str, is_published: bool) -> Category {
    repo.create_category(CategoryForm {
        title: slug.to_uppercase(),
        description: String::new(),
        slug: slug.to_string(),
        is_published,
    })
    .await
    .unwrap()
}

/// HS256 bearer token for `sub`, expiring `ttl_secs` from now (negative for expired).
pub fn token(sub: Uuid, secret: &str, ttl_secs: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let claims = Claims {
        sub,
        exp: (now + ttl_secs) as usize,
        iat: now as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// The `Location` header of a redirect.
pub fn location(response: impl IntoResponse) -> String {
    let response: Response = response.into_response();
    assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}
