use crate::application_port::{CredentialStore, StoreError};
use crate::domain_model::Credentials;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk layout: two independent string keys, mirroring browser local storage.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Durable credential store backed by a small JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, tokens: &StoredTokens) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let body =
            serde_json::to_vec_pretty(tokens).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        // write-then-rename so a crash never leaves half a file behind
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Result<Option<Credentials>, StoreError> {
        let body = match tokio::fs::read(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let tokens: StoredTokens =
            serde_json::from_slice(&body).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Credentials::from_parts(tokens.access_token, tokens.refresh_token))
    }

    async fn set(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let tokens = StoredTokens {
            access_token: Some(credentials.access().to_owned()),
            refresh_token: Some(credentials.refresh().to_owned()),
        };
        self.write(&tokens).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}
