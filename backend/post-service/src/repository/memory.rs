use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{PostGateway, ReactionUnit, UserGateway};
use crate::domain::{Post, Reaction, ReactionKind, ReactionState, RecordOp, User};

#[derive(Debug, Default)]
struct Store {
    posts: HashMap<Uuid, Post>,
    /// (user_id, post_id) -> kind
    reactions: HashMap<(Uuid, Uuid), ReactionKind>,
}

/// Process-local gateway for tests and local development
///
/// A single mutex guards the whole store. A reaction unit owns the guard, so
/// reaction mutations are serialized across all posts, not just per post.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPostGateway {
    store: Arc<Mutex<Store>>,
}

impl InMemoryPostGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored reaction of `user_id` on `post_id`
    pub async fn reaction(&self, user_id: Uuid, post_id: Uuid) -> Option<ReactionKind> {
        self.store
            .lock()
            .await
            .reactions
            .get(&(user_id, post_id))
            .copied()
    }

    /// Reaction records attached to `post_id`
    pub async fn reactions_for(&self, post_id: Uuid) -> Vec<Reaction> {
        self.store
            .lock()
            .await
            .reactions
            .iter()
            .filter(|((_, p), _)| *p == post_id)
            .map(|(&(user_id, post_id), &kind)| Reaction {
                user_id,
                post_id,
                kind,
            })
            .collect()
    }

    pub async fn reaction_count(&self, post_id: Uuid) -> usize {
        self.reactions_for(post_id).await.len()
    }
}

#[async_trait]
impl PostGateway for InMemoryPostGateway {
    async fn find_posts(&self) -> Result<Vec<Post>> {
        let store = self.store.lock().await;
        let mut posts: Vec<Post> = store.posts.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(posts)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.store.lock().await.posts.get(&post_id).cloned())
    }

    async fn insert_post(&self, post: &Post) -> Result<()> {
        let mut store = self.store.lock().await;
        if store.posts.contains_key(&post.id()) {
            bail!("post {} already exists", post.id());
        }
        store.posts.insert(post.id(), post.clone());
        Ok(())
    }

    async fn save_post(&self, post: &Post) -> Result<bool> {
        let mut store = self.store.lock().await;
        let Some(stored) = store.posts.get(&post.id()) else {
            return Ok(false);
        };

        // keep the stored counters, take everything else from the edit
        let merged = Post::restore(
            post.id(),
            post.content().to_string(),
            stored.like_count(),
            stored.dislike_count(),
            stored.created_at(),
            post.updated_at(),
            stored.creator_id(),
            stored.creator_display_name().to_string(),
        );
        store.posts.insert(post.id(), merged);
        Ok(true)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let mut store = self.store.lock().await;
        let removed = store.posts.remove(&post_id).is_some();
        store.reactions.retain(|(_, p), _| *p != post_id);
        Ok(removed)
    }

    async fn find_post_with_reaction_state(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Box<dyn ReactionUnit>>> {
        let guard = self.store.clone().lock_owned().await;

        let Some(post) = guard.posts.get(&post_id).cloned() else {
            return Ok(None);
        };
        let state = ReactionState::from(guard.reactions.get(&(user_id, post_id)).copied());

        let unit: Box<dyn ReactionUnit> = Box::new(MemoryReactionUnit {
            guard: Some(guard),
            user_id,
            post,
            state,
        });
        Ok(Some(unit))
    }
}

struct MemoryReactionUnit {
    guard: Option<OwnedMutexGuard<Store>>,
    user_id: Uuid,
    post: Post,
    state: ReactionState,
}

#[async_trait]
impl ReactionUnit for MemoryReactionUnit {
    fn post(&self) -> &Post {
        &self.post
    }

    fn state(&self) -> ReactionState {
        self.state
    }

    async fn commit(&mut self, op: RecordOp, post: &Post) -> Result<()> {
        let store = self
            .guard
            .as_mut()
            .ok_or_else(|| anyhow!("reaction unit already committed"))?;
        if post.id() != self.post.id() {
            bail!("reaction unit for post {} got post {}", self.post.id(), post.id());
        }
        let key = (self.user_id, post.id());

        match op {
            RecordOp::Insert(kind) => {
                if store.reactions.contains_key(&key) {
                    bail!("reaction already exists for user {} on post {}", key.0, key.1);
                }
                store.reactions.insert(key, kind);
            }
            RecordOp::Update(kind) => {
                let slot = store
                    .reactions
                    .get_mut(&key)
                    .ok_or_else(|| anyhow!("no reaction to update for user {} on post {}", key.0, key.1))?;
                *slot = kind;
            }
            RecordOp::Delete => {
                store
                    .reactions
                    .remove(&key)
                    .ok_or_else(|| anyhow!("no reaction to delete for user {} on post {}", key.0, key.1))?;
            }
        }
        store.posts.insert(post.id(), post.clone());

        // release the lock
        self.guard = None;
        self.post = post.clone();
        Ok(())
    }
}

/// Process-local user store
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserGateway {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl InMemoryUserGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserGateway for InMemoryUserGateway {
    async fn find_users(&self, query: Option<&str>) -> Result<Vec<User>> {
        let needle = query.map(str::to_lowercase);
        let users = self.users.lock().await;

        let mut found: Vec<User> = users
            .values()
            .filter(|u| match &needle {
                Some(n) => u.name().to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        Ok(found)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().await.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<bool> {
        let mut users = self.users.lock().await;
        let taken = users.contains_key(&user.id())
            || users.values().any(|u| u.email() == user.email());
        if taken {
            return Ok(false);
        }
        users.insert(user.id(), user.clone());
        Ok(true)
    }

    async fn update_user(&self, user: &User) -> Result<bool> {
        let mut users = self.users.lock().await;
        if !users.contains_key(&user.id()) {
            return Ok(false);
        }
        if users
            .values()
            .any(|u| u.id() != user.id() && u.email() == user.email())
        {
            bail!("email {} already registered", user.email());
        }
        users.insert(user.id(), user.clone());
        Ok(true)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.users.lock().await.remove(&user_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Role};

    fn post() -> Post {
        let creator = Identity {
            id: Uuid::new_v4(),
            display_name: "owner".to_string(),
            role: Role::Normal,
        };
        Post::create("hello", &creator).unwrap()
    }

    #[tokio::test]
    async fn test_dropped_unit_writes_nothing() {
        let gateway = InMemoryPostGateway::new();
        let p = post();
        gateway.insert_post(&p).await.unwrap();
        let user = Uuid::new_v4();

        {
            let unit = gateway
                .find_post_with_reaction_state(p.id(), user)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(unit.state(), ReactionState::None);
        }

        assert_eq!(gateway.reaction(user, p.id()).await, None);
        assert_eq!(gateway.find_post(p.id()).await.unwrap().unwrap(), p);
    }

    #[tokio::test]
    async fn test_commit_twice_fails() {
        let gateway = InMemoryPostGateway::new();
        let mut p = post();
        gateway.insert_post(&p).await.unwrap();
        let user = Uuid::new_v4();

        let mut unit = gateway
            .find_post_with_reaction_state(p.id(), user)
            .await
            .unwrap()
            .unwrap();
        p.increment_like().unwrap();
        unit.commit(RecordOp::Insert(ReactionKind::Like), &p)
            .await
            .unwrap();

        assert!(unit
            .commit(RecordOp::Insert(ReactionKind::Like), &p)
            .await
            .is_err());
        let records = gateway.reactions_for(p.id()).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, user);
        assert_eq!(records[0].kind, ReactionKind::Like);
    }

    #[tokio::test]
    async fn test_update_without_record_is_rejected() {
        let gateway = InMemoryPostGateway::new();
        let p = post();
        gateway.insert_post(&p).await.unwrap();

        let mut unit = gateway
            .find_post_with_reaction_state(p.id(), Uuid::new_v4())
            .await
            .unwrap()
            .unwrap();
        assert!(unit
            .commit(RecordOp::Update(ReactionKind::Dislike), &p)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_save_post_keeps_stored_counters() {
        let gateway = InMemoryPostGateway::new();
        let p = post();
        gateway.insert_post(&p).await.unwrap();
        let user = Uuid::new_v4();

        // a like lands between the read and the save of an edit
        let mut edited = gateway.find_post(p.id()).await.unwrap().unwrap();
        let mut unit = gateway
            .find_post_with_reaction_state(p.id(), user)
            .await
            .unwrap()
            .unwrap();
        let mut liked = unit.post().clone();
        liked.increment_like().unwrap();
        unit.commit(RecordOp::Insert(ReactionKind::Like), &liked)
            .await
            .unwrap();
        drop(unit);

        edited.edit_content("edited").unwrap();
        assert!(gateway.save_post(&edited).await.unwrap());

        let stored = gateway.find_post(p.id()).await.unwrap().unwrap();
        assert_eq!(stored.content(), "edited");
        assert_eq!(stored.like_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_reactions() {
        let gateway = InMemoryPostGateway::new();
        let mut p = post();
        gateway.insert_post(&p).await.unwrap();
        let user = Uuid::new_v4();

        let mut unit = gateway
            .find_post_with_reaction_state(p.id(), user)
            .await
            .unwrap()
            .unwrap();
        p.increment_dislike().unwrap();
        unit.commit(RecordOp::Insert(ReactionKind::Dislike), &p)
            .await
            .unwrap();
        drop(unit);

        assert!(gateway.delete_post(p.id()).await.unwrap());
        assert!(!gateway.delete_post(p.id()).await.unwrap());
        assert!(!gateway.save_post(&p).await.unwrap());
        assert_eq!(gateway.reaction_count(p.id()).await, 0);
        assert!(gateway
            .find_post_with_reaction_state(p.id(), user)
            .await
            .unwrap()
            .is_none());
    }

    fn account(name: &str, email: &str) -> User {
        User::register(name, email, "hash".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let gateway = InMemoryUserGateway::new();
        let ana = account("ana", "ana@example.com");

        assert!(gateway.insert_user(&ana).await.unwrap());
        assert!(!gateway
            .insert_user(&account("other ana", "ana@example.com"))
            .await
            .unwrap());

        let mut bob = account("bob", "bob@example.com");
        assert!(gateway.insert_user(&bob).await.unwrap());
        bob.change_email("ana@example.com").unwrap();
        assert!(gateway.update_user(&bob).await.is_err());
    }

    #[tokio::test]
    async fn test_find_users_filters_by_name() {
        let gateway = InMemoryUserGateway::new();
        for (name, email) in [("Ana Souza", "ana@x.io"), ("Bob", "bob@x.io"), ("anabel", "bel@x.io")] {
            gateway.insert_user(&account(name, email)).await.unwrap();
        }

        assert_eq!(gateway.find_users(None).await.unwrap().len(), 3);
        let mut names: Vec<String> = gateway
            .find_users(Some("ANA"))
            .await
            .unwrap()
            .iter()
            .map(|u| u.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Ana Souza", "anabel"]);
    }

    #[tokio::test]
    async fn test_missing_user_update_and_delete_report_false() {
        let gateway = InMemoryUserGateway::new();
        let ghost = account("ghost", "ghost@example.com");

        assert!(!gateway.update_user(&ghost).await.unwrap());
        assert!(!gateway.delete_user(ghost.id()).await.unwrap());
        assert!(gateway
            .find_user_by_email("ghost@example.com")
            .await
            .unwrap()
            .is_none());
    }
}
