//! Error types shared across ScreenReel crates.

/// Top-level error type for ScreenReel operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenReelError {
    #[error("Timeline error: {message}")]
    Timeline { message: String },

    #[error("Layout error: {message}")]
    Layout { message: String },

    #[error("Remap error: {message}")]
    Remap { message: String },

    #[error("Evaluation error: {message}")]
    Evaluation { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ScreenReelError.
pub type ScreenReelResult<T> = Result<T, ScreenReelError>;

impl ScreenReelError {
    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline {
            message: msg.into(),
        }
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout {
            message: msg.into(),
        }
    }

    pub fn remap(msg: impl Into<String>) -> Self {
        Self::Remap {
            message: msg.into(),
        }
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}
