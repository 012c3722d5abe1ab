use crate::application_port::*;
use crate::auth::{GuardError, TokenRefreshGuard};
use crate::domain_model::Credentials;
use crate::logger::*;
use crate::settings;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl From<&settings::Api> for ApiClientConfig {
    fn from(api: &settings::Api) -> Self {
        Self {
            base_url: api.base_url.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
        }
    }
}

/// Bearer-authenticated JSON client for the notes API.
///
/// Every request goes through the session's [`TokenRefreshGuard`]. Losing the
/// session (refresh rejected, or the refreshed pair could not be saved)
/// clears the credential store, which is what logs the user out.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    guard: TokenRefreshGuard,
}

impl ApiClient {
    pub fn try_new(config: &ApiClientConfig, guard: TokenRefreshGuard) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            guard,
        })
    }

    pub fn guard(&self) -> &TokenRefreshGuard {
        &self.guard
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(), StoreError> {
        self.guard.store().set(credentials).await
    }

    pub async fn sign_out(&self) -> Result<(), StoreError> {
        self.guard.store().clear().await
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, GuardError<ApiError>>
    where
        T: DeserializeOwned,
    {
        self.request_json::<(), T>(Method::GET, path, None).await
    }

    pub async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, GuardError<ApiError>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(method, path, Some(body)).await
    }

    async fn request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GuardError<ApiError>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let result = self
            .guard
            .perform(|credentials| {
                let mut request = self
                    .http
                    .request(method.clone(), &url)
                    .bearer_auth(credentials.access());
                if let Some(body) = body {
                    request = request.json(body);
                }
                execute_json::<T>(request)
            })
            .await;

        if let Err(e) = &result {
            if e.is_session_lost() {
                warn!("session lost on {} {}: {}", method, path, e);
                if let Err(store_error) = self.guard.store().clear().await {
                    error!("failed to clear credentials: {}", store_error);
                }
            }
        }

        result
    }
}

async fn execute_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ApiError::with_status(status.as_u16(), message));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::transport(format!("invalid response body: {e}")))
}
