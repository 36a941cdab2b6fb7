use thiserror::Error;

/// Main error type for Docflow
#[derive(Error, Debug)]
pub enum DocflowError {
    /// Relationship API errors (network, auth, server, malformed body)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Type code missing from the type registry or routing table
    #[error("Unmapped object type: {0}")]
    UnmappedType(String),

    /// Expand requested but the probe result is not cached
    #[error("No cached sub-graph for node: {0}")]
    MissingSubgraph(String),

    /// Node id not present in the live graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Expand requested on a node without further relations
    #[error("Node is not expandable: {0}")]
    NotExpandable(String),

    /// Expand requested on a node that is already expanded
    #[error("Node is already expanded: {0}")]
    AlreadyExpanded(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenient Result type using DocflowError
pub type Result<T> = std::result::Result<T, DocflowError>;
