/// Reaction state machine
///
/// Per (user, post) pair the caller holds no reaction, a like, or a dislike.
/// A request for the kind already held retracts it (toggle-off); a request for
/// the opposite kind overwrites the record in place (flip).
///
/// | From     | Request | To       | Record           | Counters            |
/// |----------|---------|----------|------------------|---------------------|
/// | None     | Like    | Liked    | insert(Like)     | +1 like             |
/// | None     | Dislike | Disliked | insert(Dislike)  | +1 dislike          |
/// | Liked    | Like    | None     | delete           | -1 like             |
/// | Liked    | Dislike | Disliked | update(Dislike)  | -1 like, +1 dislike |
/// | Disliked | Dislike | None     | delete           | -1 dislike          |
/// | Disliked | Like    | Liked    | update(Like)     | -1 dislike, +1 like |
use serde::{Deserialize, Serialize};

use super::post::Post;
use crate::error::ServiceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 2] = [ReactionKind::Like, ReactionKind::Dislike];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "LIKE",
            ReactionKind::Dislike => "DISLIKE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LIKE" => Some(ReactionKind::Like),
            "DISLIKE" => Some(ReactionKind::Dislike),
            _ => None,
        }
    }
}

/// Request bodies carry `like: true|false`
impl From<bool> for ReactionKind {
    fn from(like: bool) -> Self {
        if like {
            ReactionKind::Like
        } else {
            ReactionKind::Dislike
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionState {
    None,
    Liked,
    Disliked,
}

impl ReactionState {
    pub const ALL: [ReactionState; 3] = [
        ReactionState::None,
        ReactionState::Liked,
        ReactionState::Disliked,
    ];

    /// Kind of the stored record, if any
    pub fn held_kind(&self) -> Option<ReactionKind> {
        match self {
            ReactionState::None => None,
            ReactionState::Liked => Some(ReactionKind::Like),
            ReactionState::Disliked => Some(ReactionKind::Dislike),
        }
    }
}

impl From<Option<ReactionKind>> for ReactionState {
    fn from(kind: Option<ReactionKind>) -> Self {
        match kind {
            None => ReactionState::None,
            Some(ReactionKind::Like) => ReactionState::Liked,
            Some(ReactionKind::Dislike) => ReactionState::Disliked,
        }
    }
}

/// Write to issue against the reaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOp {
    Insert(ReactionKind),
    Update(ReactionKind),
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterDelta {
    pub likes: i8,
    pub dislikes: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ReactionState,
    pub requested: ReactionKind,
    pub to: ReactionState,
    pub record_op: RecordOp,
    pub delta: CounterDelta,
}

/// The transition for `(state, requested)`
pub fn transition(state: ReactionState, requested: ReactionKind) -> Transition {
    use ReactionKind::{Dislike, Like};
    use ReactionState as S;

    let (to, record_op, likes, dislikes) = match (state, requested) {
        (S::None, Like) => (S::Liked, RecordOp::Insert(Like), 1, 0),
        (S::None, Dislike) => (S::Disliked, RecordOp::Insert(Dislike), 0, 1),
        (S::Liked, Like) => (S::None, RecordOp::Delete, -1, 0),
        (S::Liked, Dislike) => (S::Disliked, RecordOp::Update(Dislike), -1, 1),
        (S::Disliked, Dislike) => (S::None, RecordOp::Delete, 0, -1),
        (S::Disliked, Like) => (S::Liked, RecordOp::Update(Like), 1, -1),
    };

    Transition {
        from: state,
        requested,
        to,
        record_op,
        delta: CounterDelta { likes, dislikes },
    }
}

impl Transition {
    /// Move the post's counters by this transition's delta
    ///
    /// Decrements run first. The post is only touched when every step succeeds.
    pub fn apply_to(&self, post: &mut Post) -> ServiceResult<()> {
        let mut next = post.clone();

        if self.delta.likes < 0 {
            next.decrement_like()?;
        }
        if self.delta.dislikes < 0 {
            next.decrement_dislike()?;
        }
        if self.delta.likes > 0 {
            next.increment_like()?;
        }
        if self.delta.dislikes > 0 {
            next.increment_dislike()?;
        }

        *post = next;
        Ok(())
    }
}
