use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Provider {provider} faulted: {message}")]
    ProviderFault { provider: String, message: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Duplicate provider name: {0}")]
    DuplicateProvider(String),

    #[error("Unknown work category: {0}")]
    UnknownCategory(String),

    #[error("Unknown provider kind: {0}")]
    UnknownKind(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DispatchError {
    /// Build a fault raised from inside a provider callback
    pub fn fault(provider: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::ProviderFault {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
