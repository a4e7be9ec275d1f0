/// Convenience result alias used across the crate.
pub type StageResult<T> = Result<T, StageError>;

/// Error taxonomy shared by the parsing worker and the rendering context.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    /// Malformed or unsigned cross-thread message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The document decoder rejected the input buffer.
    #[error("decode error: {0}")]
    Decode(String),

    /// A single layer could not be flattened to pixels.
    #[error("compositing error: {0}")]
    Compositing(String),

    /// A font family could not be resolved by the font service.
    #[error("font load failure: {0}")]
    FontLoad(String),

    /// Invalid geometry, options or edits.
    #[error("validation error: {0}")]
    Validation(String),

    /// A document is already being parsed.
    #[error("busy: {0}")]
    Busy(String),

    /// The render surface failed to redraw.
    #[error("render error: {0}")]
    Render(String),

    /// Anything else, usually I/O at the edges.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Build a [`StageError::Protocol`].
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Build a [`StageError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`StageError::Compositing`].
    pub fn compositing(msg: impl Into<String>) -> Self {
        Self::Compositing(msg.into())
    }

    /// Build a [`StageError::FontLoad`].
    pub fn font_load(msg: impl Into<String>) -> Self {
        Self::FontLoad(msg.into())
    }

    /// Build a [`StageError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StageError::Busy`].
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Build a [`StageError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
