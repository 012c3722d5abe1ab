use crate::domain_model::Credentials;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh rejected with status {status}")]
    Rejected { status: u16 },
    #[error("refresh transport error: {0}")]
    Transport(String),
}

#[async_trait::async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Exchanges the given pair for a fresh one. Non-2xx responses are errors.
    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, RefreshError>;
}
