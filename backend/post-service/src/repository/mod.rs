/// Persistence gateways
///
/// The service never talks to storage directly; it goes through [`PostGateway`].
/// Reaction mutations go through a [`ReactionUnit`], which holds exclusion over the
/// target post from the moment the current reaction state is read until the
/// transition is committed or the unit is dropped.
pub mod memory;
pub mod posts;
pub mod users;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, ReactionState, RecordOp, User};

pub use memory::{InMemoryPostGateway, InMemoryUserGateway};
pub use posts::PgPostGateway;
pub use users::PgUserGateway;

/// Schema for [`PgPostGateway`] and [`PgUserGateway`]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostGateway: Send + Sync {
    /// All posts, newest first
    async fn find_posts(&self) -> Result<Vec<Post>>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    async fn insert_post(&self, post: &Post) -> Result<()>;

    /// Persist content edits (content + updated_at). Returns false if the post is gone.
    ///
    /// Counters are only ever written through a [`ReactionUnit`].
    async fn save_post(&self, post: &Post) -> Result<bool>;

    /// Delete a post and its reactions. Returns false if it was already gone.
    async fn delete_post(&self, post_id: Uuid) -> Result<bool>;

    /// Open a reaction unit of work for `(user_id, post_id)`
    ///
    /// Returns `None` if the post does not exist. While the returned unit is alive
    /// no other reaction mutation on the same post can start.
    async fn find_post_with_reaction_state(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Box<dyn ReactionUnit>>>;
}

/// Locked view of one post plus the caller's current reaction
#[async_trait]
pub trait ReactionUnit: Send {
    fn post(&self) -> &Post;

    fn state(&self) -> ReactionState;

    /// Write the reaction record and the post's counters together
    ///
    /// A unit can be committed once. Dropping it uncommitted discards everything.
    async fn commit(&mut self, op: RecordOp, post: &Post) -> Result<()>;
}

/// User account storage
///
/// Emails are unique. Lookups by email expect the normalized (lowercased) form.
#[async_trait]
pub trait UserGateway: Send + Sync {
    /// Users whose name contains `query` (case-insensitive), oldest first
    async fn find_users(&self, query: Option<&str>) -> Result<Vec<User>>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Returns false if the id or email is already taken
    async fn insert_user(&self, user: &User) -> Result<bool>;

    /// Returns false if the user is gone
    async fn update_user(&self, user: &User) -> Result<bool>;

    /// Returns false if the user was already gone
    async fn delete_user(&self, user_id: Uuid) -> Result<bool>;
}
