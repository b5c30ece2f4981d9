use thiserror::Error;

/// Error for session store operations
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Session token already issued")]
    DuplicateToken,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
