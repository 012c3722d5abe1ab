use crate::application_impl::*;
use crate::application_port::*;
use crate::logger::*;
use crate::settings;
use anyhow::{Result, bail};
use std::sync::Arc;

/// Builds the credential store named by the `[credentials]` settings.
pub fn credential_store_from_settings(
    settings: &settings::Credentials,
) -> Result<Arc<dyn CredentialStore>> {
    match settings.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryCredentialStore::new())),
        "file" => Ok(Arc::new(FileCredentialStore::new(&settings.path))),
        other => bail!("unknown credential store backend: {}", other),
    }
}

/// Builds the HTTP refresh transport for the `[api]` settings.
pub fn refresh_transport_from_settings(
    settings: &settings::Api,
) -> Result<Arc<dyn RefreshTransport>> {
    let transport = HttpRefreshTransport::try_new(&HttpRefreshConfig::from(settings))?;
    debug!("refresh endpoint: {}", transport.endpoint());
    Ok(Arc::new(transport))
}
