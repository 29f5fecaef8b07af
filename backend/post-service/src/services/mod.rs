pub mod posts;
pub mod users;

pub use posts::PostService;
pub use users::UserService;
