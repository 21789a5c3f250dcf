use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` when the failure came from the transport rather than
    /// from the payload or a missing capability.
    pub fn is_transport(&self) -> bool {
        match self {
            BridgeError::Http { status, .. } => *status >= 500 || *status == 429,
            BridgeError::Io(_) | BridgeError::OperationFailed(_) => true,
            BridgeError::NotAvailable(_) | BridgeError::Malformed(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
