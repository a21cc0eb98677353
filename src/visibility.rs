//! Public visibility of posts.
//!
//! A post is publicly visible iff it is published, its `pub_date` lies strictly in the past
//! and its category, when it has one, is published. [`is_visible`] is the in-process form
//! and [`push_visible_predicate`] the SQL form; every public listing and the detail view go
//! through one of the two.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::{auth::AuthUser, guard, models::Post};

/// is_visible
///
/// A post scheduled exactly at `now` is not visible yet.
pub fn is_visible(post: &Post, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date < now && post.category_is_published.unwrap_or(true)
}

/// Visible to the public, or owned by `actor`. Owners always see their own posts.
pub fn is_visible_to(post: &Post, actor: Option<&AuthUser>, now: DateTime<Utc>) -> bool {
    is_visible(post, now) || guard::can_modify(actor, post)
}

/// Appends the visibility condition for a query selecting `posts p` left-joined with
/// `categories c`. The caller provides the surrounding `WHERE`/`AND`.
pub fn push_visible_predicate(builder: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
    builder.push("(p.is_published = TRUE AND p.pub_date < ");
    builder.push_bind(now);
    builder.push(" AND (p.category_id IS NULL OR c.is_published = TRUE))");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn post(pub_date: DateTime<Utc>) -> Post {
        Post {
            id: 1,
            title: "Dawn over the bay".into(),
            pub_date,
            author_id: Uuid::from_u128(7),
            is_published: true,
            ..Post::default()
        }
    }

    #[test]
    fn future_posts_are_hidden_whatever_the_flags() {
        let now = Utc::now();
        let scheduled = post(now + Duration::minutes(1));
        assert!(!is_visible(&scheduled, now));

        let scheduled_in_open_category = Post {
            category_id: Some(3),
            category_is_published: Some(true),
            ..scheduled
        };
        assert!(!is_visible(&scheduled_in_open_category, now));
    }

    #[test]
    fn pub_date_equal_to_now_is_not_visible() {
        let now = Utc::now();
        assert!(!is_visible(&post(now), now));
        assert!(is_visible(&post(now - Duration::seconds(1)), now));
    }

    #[test]
    fn unpublished_category_hides_published_post() {
        let now = Utc::now();
        let hidden = Post {
            category_id: Some(3),
            category_is_published: Some(false),
            ..post(now - Duration::days(1))
        };
        assert!(hidden.is_published);
        assert!(!is_visible(&hidden, now));
    }

    #[test]
    fn post_without_category_only_needs_its_own_flag() {
        let now = Utc::now();
        let open = post(now - Duration::days(1));
        assert!(is_visible(&open, now));

        let draft = Post { is_published: false, ..open };
        assert!(!is_visible(&draft, now));
    }

    #[test]
    fn owner_sees_hidden_post() {
        let now = Utc::now();
        let draft = Post { is_published: false, ..post(now - Duration::days(1)) };
        let owner = AuthUser {
            id: draft.author_id,
            username: "anna".into(),
            role: "user".into(),
        };
        let stranger = AuthUser { id: Uuid::from_u128(8), ..owner.clone() };

        assert!(is_visible_to(&draft, Some(&owner), now));
        assert!(!is_visible_to(&draft, Some(&stranger), now));
        assert!(!is_visible_to(&draft, None, now));
    }

    #[test]
    fn sql_predicate_binds_now() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM posts p WHERE ");
        push_visible_predicate(&mut builder, Utc::now());
        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM posts p WHERE (p.is_published = TRUE AND p.pub_date < $1 \
             AND (p.category_id IS NULL OR c.is_published = TRUE))"
        );
    }
}
