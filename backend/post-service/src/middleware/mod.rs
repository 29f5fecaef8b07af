/// Request guards applied before any mutation
pub mod permissions;

pub use permissions::{authorize, Denied, Operation, Resource};
