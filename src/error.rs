//! Cache error types

/// Object cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Object cache is not initialized; call wp_cache_init first")]
    NotInitialized,

    #[error("Object cache is disabled by configuration")]
    Disabled,

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<figment::Error> for CacheError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
