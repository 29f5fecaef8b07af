pub mod models;
pub mod post;
pub mod reaction;
pub mod user;

pub use models::{
    AuthOutput, CreatePostInput, CreatorView, DeletePostInput, DeleteUserInput, EditPostInput,
    Identity, ListUsersInput, LoginInput, PostView, ReactInput, ReactOutput, Reaction, Role,
    SignupInput, UpdateUserInput, UserView,
};
pub use post::Post;
pub use reaction::{transition, CounterDelta, ReactionKind, ReactionState, RecordOp, Transition};
pub use user::{normalize_email, User};
