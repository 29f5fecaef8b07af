use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crypto_core::Role;

use super::post::Post;
use super::reaction::{ReactionKind, ReactionState};
use super::user::User;

/// Verified caller context
///
/// Built by the identity resolver from a validated credential and passed
/// explicitly into every operation. Never persisted by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub display_name: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Reaction record - one per (user_id, post_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub kind: ReactionKind,
}

// ============================================================================
// Operation inputs / outputs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPostInput {
    pub post_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeletePostInput {
    pub post_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReactInput {
    pub post_id: Uuid,
    pub kind: ReactionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactOutput {
    pub post_id: Uuid,
    pub state: ReactionState,
    pub likes: u32,
    pub dislikes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorView {
    pub id: Uuid,
    pub name: String,
}

/// Post as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub content: String,
    pub likes: u32,
    pub dislikes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator: CreatorView,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id(),
            content: post.content().to_string(),
            likes: post.like_count(),
            dislikes: post.dislike_count(),
            created_at: post.created_at(),
            updated_at: post.updated_at(),
            creator: CreatorView {
                id: post.creator_id(),
                name: post.creator_display_name().to_string(),
            },
        }
    }
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        PostView::from(&post)
    }
}

// ============================================================================
// User account inputs / outputs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Case-insensitive name filter; `None` lists everyone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersInput {
    pub query: Option<String>,
}

/// Partial update; at least one field must be set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserInput {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UpdateUserInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.role.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteUserInput {
    pub user_id: Uuid,
}

/// User as returned to callers; the password hash never leaves the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            role: user.role(),
            created_at: user.created_at(),
        }
    }
}

/// Result of signup and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthOutput {
    pub token: String,
    pub user: UserView,
}
