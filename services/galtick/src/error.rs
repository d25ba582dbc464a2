//! Error types for the galtick service

/// Errors that can occur in the galtick service
#[derive(Debug, thiserror::Error)]
pub enum GaltickError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not find channel with ID {0}")]
    ChannelNotFound(u64),

    #[error("Permission denied: {0}")]
    Privilege(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GaltickError {
    /// Transport-level failures: timeouts, refused connections, non-200 replies
    pub fn is_transport(&self) -> bool {
        matches!(self, GaltickError::Transport(_) | GaltickError::Status(_))
    }
}

/// Result type alias for galtick operations
pub type Result<T> = std::result::Result<T, GaltickError>;
