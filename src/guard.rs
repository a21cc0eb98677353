//! Ownership checks for edit and delete actions.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    models::{Comment, Post, User},
};

/// Anything with an author of record.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

// A profile is owned by the user it describes.
impl Authored for User {
    fn author_id(&self) -> Uuid {
        self.id
    }
}

/// can_modify
///
/// True iff the actor is authenticated and is the resource's author. Anonymous actors
/// (`None`) never pass.
pub fn can_modify<R: Authored + ?Sized>(actor: Option<&AuthUser>, resource: &R) -> bool {
    actor.is_some_and(|actor| actor.id == resource.author_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: u128) -> AuthUser {
        AuthUser {
            id: Uuid::from_u128(id),
            username: format!("user{id}"),
            role: "user".into(),
        }
    }

    #[test]
    fn only_the_author_may_modify() {
        let post = Post {
            author_id: Uuid::from_u128(1),
            ..Post::default()
        };
        assert!(can_modify(Some(&actor(1)), &post));
        assert!(!can_modify(Some(&actor(2)), &post));
        assert!(!can_modify(None, &post));
    }

    #[test]
    fn admin_role_grants_no_ownership() {
        let comment = Comment {
            author_id: Uuid::from_u128(1),
            ..Comment::default()
        };
        let admin = AuthUser {
            role: "admin".into(),
            ..actor(9)
        };
        assert!(!can_modify(Some(&admin), &comment));
    }

    #[test]
    fn profile_belongs_to_its_user() {
        let user = User {
            id: Uuid::from_u128(5),
            ..User::default()
        };
        assert!(can_modify(Some(&actor(5)), &user));
        assert!(!can_modify(Some(&actor(6)), &user));
    }
}
