use tracing::subscriber::SetGlobalDefaultError;

/// Error returned when a [`ConversionConfig`](crate::config::ConversionConfig)
/// or [`HookConfig`](crate::init::HookConfig) is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tag name must not be empty")]
    EmptyTagName,

    #[error("invalid tag name {0:?}: spaces, ':', '\"' and control characters are not allowed")]
    InvalidTagName(String),

    #[error("max depth must be at least 1")]
    ZeroMaxDepth,

    #[error("environment variable {key} has invalid boolean value {value:?}")]
    InvalidBool { key: String, value: String },

    #[error("environment variable {key} has invalid integer value {value:?}")]
    InvalidInteger { key: String, value: String },
}

/// Error reported by a [`Marshaler`](crate::marshal::Marshaler) that failed
/// to encode itself.
#[derive(thiserror::Error, Debug)]
pub enum MarshalError {
    #[error("value cannot be marshaled: {0}")]
    Unsupported(String),

    #[error("marshal failed: {0}")]
    Custom(String),
}

impl MarshalError {
    pub fn custom(msg: impl Into<String>) -> Self {
        MarshalError::Custom(msg.into())
    }
}

/// Error returned when installing the hook as the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("global tracing subscriber already installed")]
    AlreadyInstalled(#[from] SetGlobalDefaultError),
}
