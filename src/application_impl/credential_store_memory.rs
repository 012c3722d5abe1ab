use crate::application_port::{CredentialStore, StoreError};
use crate::domain_model::Credentials;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: Mutex::new(Some(credentials)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Credentials>>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Io(format!("poisoned: {e}")))
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<Option<Credentials>, StoreError> {
        Ok(self.lock()?.clone())
    }

    async fn set(&self, credentials: &Credentials) -> Result<(), StoreError> {
        *self.lock()? = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.lock()? = None;
        Ok(())
    }
}
