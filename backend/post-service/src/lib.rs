/// Post Service Library
///
/// Posts with like/dislike reactions for the social platform, plus the user
/// accounts behind them. The crate holds the rules (identity resolution,
/// authorization, the post and user aggregates and the reaction state machine)
/// and the gateways that persist their results.
///
/// # Modules
///
/// - `auth`: Credential verification, identity resolution, password hashing
/// - `middleware`: Authorization rule table
/// - `domain`: Post and user aggregates, reaction state machine, operation inputs/outputs
/// - `repository`: Persistence gateways (PostgreSQL, in-memory)
/// - `services`: Operation orchestration
/// - `error`: Error types
/// - `config`: Configuration management
/// - `telemetry`: Tracing subscriber setup
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod repository;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use services::{PostService, UserService};
