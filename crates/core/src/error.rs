/// Result alias that carries the custom [`LightsError`] type.
pub type Result<T> = std::result::Result<T, LightsError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum LightsError {
    /// Free-form failure surfaced to the caller as a readable message.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or palette JSON could not be parsed.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// No registry entry exists for the requested effect name.
    #[error("unknown effect `{0}`")]
    UnknownEffect(String),
    /// A coordinate outside the grid and control strip.
    #[error("coordinate ({x}, {y}) is outside the grid")]
    InvalidCoordinate { x: i32, y: i32 },
    /// The output sink rejected a batch.
    #[error("output sink failed: {0}")]
    Sink(String),
}

impl LightsError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for LightsError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for LightsError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
