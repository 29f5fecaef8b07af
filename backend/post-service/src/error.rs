/// Error types for post-service
///
/// Every operation surfaces exactly one of these kinds. `Unauthorized`,
/// `Forbidden` and `NotFound` go back to the caller verbatim. `InvalidState`
/// means a counter invariant was breached inside the service and the operation
/// was aborted before anything was written.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl ServiceError {
    /// HTTP-equivalent status for the surrounding request layer
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::InvalidInput(_) => 400,
            ServiceError::InvalidState(_)
            | ServiceError::Upstream(_) => 500,
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_distinguish_kinds() {
        assert_eq!(ServiceError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(ServiceError::Forbidden("not owner".into()).status_code(), 403);
        assert_eq!(ServiceError::NotFound("post".into()).status_code(), 404);
        assert_eq!(ServiceError::InvalidInput("empty".into()).status_code(), 400);
        assert_eq!(ServiceError::InvalidState("underflow".into()).status_code(), 500);
        assert_eq!(
            ServiceError::Upstream(anyhow::anyhow!("disk")).status_code(),
            500
        );
    }

    #[test]
    fn test_forbidden_message_keeps_reason() {
        let err = ServiceError::Forbidden("not owner".to_string());
        assert_eq!(err.to_string(), "Forbidden: not owner");
    }
}
