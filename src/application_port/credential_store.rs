use crate::domain_model::Credentials;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("credential store io error: {0}")]
    Io(String),
    #[error("credential store is corrupt: {0}")]
    Corrupt(String),
}

/// Persistence for the session's token pair.
///
/// Readers always go back to the store for the current pair instead of
/// caching it; the store is the single source of truth.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self) -> Result<Option<Credentials>, StoreError>;
    async fn set(&self, credentials: &Credentials) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}
