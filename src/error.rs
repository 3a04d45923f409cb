use thiserror::Error;

/// Main error type for GraphLD
#[derive(Error, Debug)]
pub enum GraphldError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document parse errors
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source document or referenced vertex absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document extension or shape not recognized
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Recognized serialization without an implemented reader (RDF/XML, N-Triples)
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Lookup called with a malformed key
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Convenient Result type using GraphldError
pub type Result<T> = std::result::Result<T, GraphldError>;
