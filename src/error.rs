use thiserror::Error;

/// Main error type for vance operations
#[derive(Error, Debug)]
pub enum VanceError {
    #[error("Empty query")]
    EmptyQuery,

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Schema mismatch: expected {expected}, found {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("Another writer session is active")]
    WriterBusy,

    #[error("Commit failed: {0}")]
    CommitFailed(std::io::Error),

    #[error("Query parse error: {0}")]
    QueryParse(String),

    #[error("Invalid front matter: {0}")]
    FrontMatter(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted index: {0}")]
    Corrupted(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for vance operations
pub type Result<T> = std::result::Result<T, VanceError>;

impl VanceError {
    /// Check if this error was caused by the caller rather than the engine
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VanceError::EmptyQuery
                | VanceError::DocumentNotFound(_)
                | VanceError::QueryParse(_)
                | VanceError::FrontMatter(_)
                | VanceError::InvalidRequest(_)
        )
    }

    /// Check if this error indicates a transient failure that could be retried
    pub fn is_retriable(&self) -> bool {
        matches!(self, VanceError::WriterBusy)
    }
}
