use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{PostGateway, ReactionUnit};
use crate::domain::{Post, ReactionKind, ReactionState, RecordOp};

/// Row shape of the `posts` table
#[derive(Debug, Clone, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    content: String,
    like_count: i32,
    dislike_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_id: Uuid,
    creator_name: String,
}

impl TryFrom<PostRow> for Post {
    type Error = anyhow::Error;

    fn try_from(row: PostRow) -> Result<Self> {
        let like_count = u32::try_from(row.like_count)
            .with_context(|| format!("negative like_count on post {}", row.id))?;
        let dislike_count = u32::try_from(row.dislike_count)
            .with_context(|| format!("negative dislike_count on post {}", row.id))?;

        Ok(Post::restore(
            row.id,
            row.content,
            like_count,
            dislike_count,
            row.created_at,
            row.updated_at,
            row.creator_id,
            row.creator_name,
        ))
    }
}

fn counter_to_db(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| anyhow!("counter {value} exceeds column range"))
}

const POST_COLUMNS: &str = "id, content, like_count, dislike_count, created_at, updated_at, creator_id, creator_name";

/// PostgreSQL gateway
///
/// Reaction units are transactions that lock the post row with
/// `SELECT ... FOR UPDATE`; concurrent reactions on the same post queue on that lock.
#[derive(Clone)]
pub struct PgPostGateway {
    pool: PgPool,
}

impl PgPostGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostGateway for PgPostGateway {
    async fn find_posts(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list posts")?;

        rows.into_iter().map(Post::try_from).collect()
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load post")?;

        row.map(Post::try_from).transpose()
    }

    async fn insert_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, content, like_count, dislike_count, created_at, updated_at,
                               creator_id, creator_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(post.id())
        .bind(post.content())
        .bind(counter_to_db(post.like_count())?)
        .bind(counter_to_db(post.dislike_count())?)
        .bind(post.created_at())
        .bind(post.updated_at())
        .bind(post.creator_id())
        .bind(post.creator_display_name())
        .execute(&self.pool)
        .await
        .context("Failed to insert post")?;

        Ok(())
    }

    async fn save_post(&self, post: &Post) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET content = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(post.id())
        .bind(post.content())
        .bind(post.updated_at())
        .execute(&self.pool)
        .await
        .context("Failed to save post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        // post_reactions rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_post_with_reaction_state(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Box<dyn ReactionUnit>>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin reaction transaction")?;

        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 FOR UPDATE"
        ))
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock post")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let post = Post::try_from(row)?;

        let kind: Option<String> = sqlx::query_scalar(
            r#"
            SELECT kind FROM post_reactions
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to load reaction")?;

        let held = kind
            .map(|k| ReactionKind::parse(&k).ok_or_else(|| anyhow!("unknown reaction kind {k}")))
            .transpose()?;

        let unit: Box<dyn ReactionUnit> = Box::new(PgReactionUnit {
            tx: Some(tx),
            user_id,
            post,
            state: ReactionState::from(held),
        });
        Ok(Some(unit))
    }
}

struct PgReactionUnit {
    tx: Option<Transaction<'static, Postgres>>,
    user_id: Uuid,
    post: Post,
    state: ReactionState,
}

#[async_trait]
impl ReactionUnit for PgReactionUnit {
    fn post(&self) -> &Post {
        &self.post
    }

    fn state(&self) -> ReactionState {
        self.state
    }

    async fn commit(&mut self, op: RecordOp, post: &Post) -> Result<()> {
        let mut tx = self
            .tx
            .take()
            .ok_or_else(|| anyhow!("reaction unit already committed"))?;
        let post_id = self.post.id();
        if post.id() != post_id {
            bail!("reaction unit for post {} got post {}", post_id, post.id());
        }

        let affected = match op {
            RecordOp::Insert(kind) => sqlx::query(
                r#"
                INSERT INTO post_reactions (user_id, post_id, kind)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(self.user_id)
            .bind(post_id)
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await
            .context("Failed to insert reaction")?,
            RecordOp::Update(kind) => sqlx::query(
                r#"
                UPDATE post_reactions
                SET kind = $3, updated_at = NOW()
                WHERE user_id = $1 AND post_id = $2
                "#,
            )
            .bind(self.user_id)
            .bind(post_id)
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await
            .context("Failed to update reaction")?,
            RecordOp::Delete => sqlx::query(
                r#"
                DELETE FROM post_reactions
                WHERE user_id = $1 AND post_id = $2
                "#,
            )
            .bind(self.user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete reaction")?,
        }
        .rows_affected();

        if affected != 1 {
            // tx dropped here, nothing is written
            bail!(
                "reaction {:?} touched {} rows for user {} on post {}",
                op,
                affected,
                self.user_id,
                post_id
            );
        }

        sqlx::query(
            r#"
            UPDATE posts
            SET like_count = $2, dislike_count = $3
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(counter_to_db(post.like_count())?)
        .bind(counter_to_db(post.dislike_count())?)
        .execute(&mut *tx)
        .await
        .context("Failed to update post counters")?;

        tx.commit()
            .await
            .context("Failed to commit reaction transaction")?;

        self.post = post.clone();
        Ok(())
    }
}
