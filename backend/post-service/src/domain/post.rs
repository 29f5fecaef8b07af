/// Post aggregate
///
/// Fields are private so the two counters can only move through the
/// increment/decrement methods and `creator_id` can never be reassigned.
/// Nothing in here performs I/O.
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use super::models::Identity;
use crate::error::{ServiceError, ServiceResult};

/// Only [`Post::create`] and [`Post::restore`] build a post; it cannot be
/// deserialized from caller input.
///
/// ```compile_fail
/// fn from_input<T: serde::de::DeserializeOwned>() {}
/// from_input::<post_service::domain::Post>();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    id: Uuid,
    content: String,
    like_count: u32,
    dislike_count: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_id: Uuid,
    creator_display_name: String,
}

fn validate_content(content: &str) -> ServiceResult<()> {
    if content.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "post content must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl Post {
    /// New post owned by `creator`, counters at zero
    pub fn create(content: impl Into<String>, creator: &Identity) -> ServiceResult<Self> {
        let content = content.into();
        validate_content(&content)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            content,
            like_count: 0,
            dislike_count: 0,
            created_at: now,
            updated_at: now,
            creator_id: creator.id,
            creator_display_name: creator.display_name.clone(),
        })
    }

    /// Rebuild a post from stored fields
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        content: String,
        like_count: u32,
        dislike_count: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        creator_id: Uuid,
        creator_display_name: String,
    ) -> Self {
        Self {
            id,
            content,
            like_count,
            dislike_count,
            created_at,
            updated_at,
            creator_id,
            creator_display_name,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn like_count(&self) -> u32 {
        self.like_count
    }

    pub fn dislike_count(&self) -> u32 {
        self.dislike_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn creator_id(&self) -> Uuid {
        self.creator_id
    }

    pub fn creator_display_name(&self) -> &str {
        &self.creator_display_name
    }

    pub fn is_created_by(&self, user_id: Uuid) -> bool {
        self.creator_id == user_id
    }

    /// Replace the content and bump `updated_at`
    pub fn edit_content(&mut self, new_content: impl Into<String>) -> ServiceResult<()> {
        let new_content = new_content.into();
        validate_content(&new_content)?;

        self.content = new_content;
        self.updated_at = Utc::now().max(self.updated_at);
        Ok(())
    }

    // ========== Counter Operations ==========

    pub fn increment_like(&mut self) -> ServiceResult<()> {
        self.like_count = increment(self.id, "like", self.like_count)?;
        Ok(())
    }

    pub fn decrement_like(&mut self) -> ServiceResult<()> {
        self.like_count = decrement(self.id, "like", self.like_count)?;
        Ok(())
    }

    pub fn increment_dislike(&mut self) -> ServiceResult<()> {
        self.dislike_count = increment(self.id, "dislike", self.dislike_count)?;
        Ok(())
    }

    pub fn decrement_dislike(&mut self) -> ServiceResult<()> {
        self.dislike_count = decrement(self.id, "dislike", self.dislike_count)?;
        Ok(())
    }
}

fn increment(post_id: Uuid, counter: &str, value: u32) -> ServiceResult<u32> {
    value.checked_add(1).ok_or_else(|| {
        error!(%post_id, counter, "counter overflow");
        ServiceError::InvalidState(format!("{counter} count overflow on post {post_id}"))
    })
}

fn decrement(post_id: Uuid, counter: &str, value: u32) -> ServiceResult<u32> {
    value.checked_sub(1).ok_or_else(|| {
        error!(%post_id, counter, "counter underflow");
        ServiceError::InvalidState(format!("{counter} count underflow on post {post_id}"))
    })
}
