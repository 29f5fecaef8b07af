/// Post service - listing, authoring, deletion and reactions
///
/// Every mutating operation follows the same order: load the target
/// (`NotFound`), authorize (`Forbidden`), mutate the aggregate, then issue a
/// single gateway write. An error at any step leaves storage untouched.
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{
    transition, CreatePostInput, DeletePostInput, EditPostInput, Identity, Post, PostView,
    ReactInput, ReactOutput,
};
use crate::error::{ServiceError, ServiceResult};
use crate::middleware::{authorize, Operation, Resource};
use crate::repository::PostGateway;

#[derive(Clone)]
pub struct PostService {
    gateway: Arc<dyn PostGateway>,
}

fn post_not_found(post_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("post {post_id} not found"))
}

impl PostService {
    pub fn new(gateway: Arc<dyn PostGateway>) -> Self {
        Self { gateway }
    }

    async fn load_post(&self, post_id: Uuid) -> ServiceResult<Post> {
        self.gateway
            .find_post(post_id)
            .await?
            .ok_or_else(|| post_not_found(post_id))
    }

    /// All posts, newest first
    pub async fn list_posts(&self, identity: &Identity) -> ServiceResult<Vec<PostView>> {
        authorize(identity, Operation::ListPosts, Resource::None)?;

        let posts = self.gateway.find_posts().await?;
        Ok(posts.iter().map(PostView::from).collect())
    }

    pub async fn create_post(
        &self,
        identity: &Identity,
        input: CreatePostInput,
    ) -> ServiceResult<PostView> {
        authorize(identity, Operation::CreatePost, Resource::None)?;

        let post = Post::create(input.content, identity)?;
        self.gateway.insert_post(&post).await?;

        info!(post_id = %post.id(), user_id = %identity.id, "post created");
        Ok(PostView::from(post))
    }

    /// Replace a post's content; creator only
    pub async fn edit_post(
        &self,
        identity: &Identity,
        input: EditPostInput,
    ) -> ServiceResult<PostView> {
        let mut post = self.load_post(input.post_id).await?;
        authorize(identity, Operation::EditPost, Resource::Post(&post))?;

        post.edit_content(input.content)?;
        if !self.gateway.save_post(&post).await? {
            // removed between the read and the save
            return Err(post_not_found(post.id()));
        }

        info!(post_id = %post.id(), user_id = %identity.id, "post edited");
        Ok(PostView::from(post))
    }

    /// Delete a post; creator or admin
    pub async fn delete_post(
        &self,
        identity: &Identity,
        input: DeletePostInput,
    ) -> ServiceResult<()> {
        let post = self.load_post(input.post_id).await?;
        authorize(identity, Operation::DeletePost, Resource::Post(&post))?;

        if !self.gateway.delete_post(post.id()).await? {
            // removed by someone else between the read and the delete
            return Err(post_not_found(post.id()));
        }

        info!(
            post_id = %post.id(),
            user_id = %identity.id,
            by_admin = !post.is_created_by(identity.id),
            "post deleted"
        );
        Ok(())
    }

    /// Like/dislike toggle
    ///
    /// Same kind as the one held retracts it; the opposite kind flips it in place.
    pub async fn react(&self, identity: &Identity, input: ReactInput) -> ServiceResult<ReactOutput> {
        let mut unit = self
            .gateway
            .find_post_with_reaction_state(input.post_id, identity.id)
            .await?
            .ok_or_else(|| post_not_found(input.post_id))?;
        authorize(identity, Operation::ReactToPost, Resource::Post(unit.post()))?;

        let step = transition(unit.state(), input.kind);
        let mut post = unit.post().clone();
        if let Err(e) = step.apply_to(&mut post) {
            error!(
                post_id = %input.post_id,
                user_id = %identity.id,
                from = ?step.from,
                requested = ?step.requested,
                likes = post.like_count(),
                dislikes = post.dislike_count(),
                "reaction transition breached counter invariant"
            );
            return Err(e);
        }

        unit.commit(step.record_op, &post).await?;

        info!(
            post_id = %post.id(),
            user_id = %identity.id,
            from = ?step.from,
            to = ?step.to,
            "reaction applied"
        );
        Ok(ReactOutput {
            post_id: post.id(),
            state: step.to,
            likes: post.like_count(),
            dislikes: post.dislike_count(),
        })
    }
}
