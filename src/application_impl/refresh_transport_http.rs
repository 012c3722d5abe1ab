use crate::application_port::{RefreshError, RefreshTransport};
use crate::domain_model::Credentials;
use crate::settings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpRefreshConfig {
    pub base_url: String,
    pub refresh_path: String,
    pub timeout: Duration,
}

impl From<&settings::Api> for HttpRefreshConfig {
    fn from(api: &settings::Api) -> Self {
        Self {
            base_url: api.base_url.clone(),
            refresh_path: api.refresh_path.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
}

/// Calls the API's refresh endpoint over HTTP.
pub struct HttpRefreshTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpRefreshTransport {
    pub fn try_new(config: &HttpRefreshConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let endpoint = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            config.refresh_path
        );
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl RefreshTransport for HttpRefreshTransport {
    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, RefreshError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, credentials.bearer())
            .json(&RefreshRequest {
                refresh_token: credentials.refresh(),
            })
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        Credentials::from_parts(Some(body.access_token), Some(body.refresh_token))
            .ok_or_else(|| RefreshError::Transport("refresh returned an empty token".to_owned()))
    }
}
