use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::pagination::Page;

// --- Core Entities (Mapped to Database) ---

/// User
///
/// The locally mirrored profile of an identity owned by the external auth provider
/// (`profiles` table). `role` is either "user" or "admin".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

impl User {
    /// The role every self-registered profile receives.
    pub const DEFAULT_ROLE: &'static str = "user";
}

/// Category
///
/// A thematic section of the blog. Posts in an unpublished category are hidden from
/// every public listing, whatever their own flag says.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Location
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Location {
    pub id: i64,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Post
///
/// A post row joined with its author, category and location, plus the number of
/// comments. `category_is_published` is `None` when the post has no category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub category_id: Option<i64>,
    pub category_title: Option<String>,
    pub category_slug: Option<String>,
    pub category_is_published: Option<bool>,
    pub location_id: Option<i64>,
    pub location_name: Option<String>,
    // Object key of the uploaded image, if any.
    pub image: Option<String>,
    pub is_published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub comment_count: i64,
}

/// Comment
///
/// A comment joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub author_username: String,
    pub text: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Forms (Client-Writable Fields Only) ---
//
// Every form rejects unknown fields. Server-owned columns (author, post, publication flag)
// are not part of any form, so a client naming them gets a validation error instead of a
// silently ignored field.

/// PostForm
///
/// Input for creating and editing a post (POST /posts/new, POST /posts/{id}/edit).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default, PartialEq)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct PostForm {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
    /// Publication moment. A future value schedules the post.
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    #[validate(length(min = 1, max = 512))]
    pub image: Option<String>,
}

/// CommentForm
///
/// Input for adding or editing a comment. Only the text is client-writable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default, PartialEq)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct CommentForm {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
}

/// ProfileForm
///
/// The whitelisted, user-editable subset of a profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default, PartialEq)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct ProfileForm {
    #[validate(length(min = 1, max = 150), custom(function = "validate_username"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /auth/registration).
/// The password is only forwarded to the external auth provider; it is never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 150), custom(function = "validate_username"))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL for a post image.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "sunset.jpg")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

/// PresignedUrlResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to send back as `PostForm::image`.
    pub resource_key: String,
}

// --- Admin Forms ---

/// CategoryForm
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 64), custom(function = "validate_slug"))]
    pub slug: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

/// LocationForm
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct LocationForm {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
}

/// AdminPostUpdate
///
/// The columns an administrator may edit straight from the post listing.
/// `category_id: null` detaches the category, an absent key leaves it unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AdminPostUpdate {
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<i64>)]
    pub category_id: Option<Option<i64>>,
}

// --- Response Payloads ---

/// PostDetail
///
/// A single post with its comments in chronological order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// PostFormChoices
///
/// The choices offered by the post form: published categories and all locations.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct PostFormChoices {
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

/// PostEditPage
///
/// What the owner needs to render the edit form: the current post and the form choices.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct PostEditPage {
    pub post: Post,
    pub choices: PostFormChoices,
}

/// PublicProfile
///
/// A profile as shown to other users: no email, no role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// ProfilePage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProfilePage {
    pub profile: PublicProfile,
    pub posts: Page<Post>,
}

/// CategoryPage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryPage {
    pub category: Category,
    pub posts: Page<Post>,
}

/// AdminPostRow
///
/// One row of the administrative post listing. Empty relations are shown as
/// [`AdminPostRow::EMPTY_VALUE`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct AdminPostRow {
    pub id: i64,
    pub title: String,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
    pub author: String,
    pub category: String,
    pub is_published: bool,
}

impl AdminPostRow {
    pub const EMPTY_VALUE: &'static str = "Не задано";
}

impl From<Post> for AdminPostRow {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            pub_date: post.pub_date,
            author: post.author_username,
            category: post
                .category_title
                .unwrap_or_else(|| Self::EMPTY_VALUE.to_string()),
            is_published: post.is_published,
        }
    }
}

// --- Field Validators ---

/// Letters, digits and `@ . + - _`, the character set the auth provider accepts.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset"))
    }
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("slug_charset"))
    }
}

fn default_published() -> bool {
    true
}

// Distinguishes an explicit `null` (Some(None)) from an absent key (None, via `default`).
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_form_rejects_server_owned_fields() {
        let payload = r#"{
            "title": "Trip", "body": "Text", "pub_date": "2026-01-01T10:00:00Z",
            "is_published": false
        }"#;
        assert!(serde_json::from_str::<PostForm>(payload).is_err());

        let payload = r#"{
            "title": "Trip", "body": "Text", "pub_date": "2026-01-01T10:00:00Z",
            "author_id": "00000000-0000-0000-0000-000000000001"
        }"#;
        assert!(serde_json::from_str::<PostForm>(payload).is_err());
    }

    #[test]
    fn comment_form_only_accepts_text() {
        assert!(serde_json::from_str::<CommentForm>(r#"{"text": "Nice"}"#).is_ok());
        assert!(serde_json::from_str::<CommentForm>(r#"{"text": "Nice", "post_id": 3}"#).is_err());
    }

    #[test]
    fn profile_form_validates_username_and_email() {
        let form = ProfileForm {
            username: "anna k".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: "not-an-email".into(),
        };
        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn admin_update_distinguishes_null_from_absent() {
        let absent: AdminPostUpdate = serde_json::from_str(r#"{"is_published": true}"#).unwrap();
        assert_eq!(absent.category_id, None);

        let cleared: AdminPostUpdate = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(cleared.category_id, Some(None));

        let set: AdminPostUpdate = serde_json::from_str(r#"{"category_id": 4}"#).unwrap();
        assert_eq!(set.category_id, Some(Some(4)));
    }

    #[test]
    fn admin_row_marks_missing_category() {
        let row = AdminPostRow::from(Post {
            title: "Untitled".into(),
            author_username: "anna".into(),
            ..Post::default()
        });
        assert_eq!(row.category, AdminPostRow::EMPTY_VALUE);
    }
}
