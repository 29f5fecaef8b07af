/// Shared credential primitives for the posts platform
///
/// - `jwt`: RS256 access token issuing and validation carrying identity claims
pub mod jwt;

pub use jwt::{Claims, JwtError, JwtKeys, Role};
