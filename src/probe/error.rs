use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The OS denied the privilege required for the transport. Raised only
    /// at initialization; callers may substitute a stub probe and continue.
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Host resolution failed: {0}")]
    Resolution(String),

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
