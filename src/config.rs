//! Configuration options for the Backyard Festival client

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Environment variable holding the API base URL
pub const API_URL_VAR: &str = "FESTIVAL_API_URL";

/// Environment variable holding an optional API token
pub const API_TOKEN_VAR: &str = "FESTIVAL_API_TOKEN";

/// Configuration options for the HTTP client
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// The request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,

    /// Value sent in the `User-Agent` header
    pub user_agent: Option<String>,
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, value: &str) -> Self {
        self.user_agent = Some(value.to_string());
        self
    }

    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(builder.build()?)
    }
}

/// Where the API lives and which token to start with
#[derive(Debug, Clone)]
pub struct FestivalConfig {
    /// API base URL, always ending in `/`
    pub api_url: Url,
    pub token: Option<String>,
}

impl FestivalConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let api_url = normalize_base_url(api_url)?;
        let token = token.filter(|t| !t.trim().is_empty());
        Ok(Self { api_url, token })
    }

    /// Reads `FESTIVAL_API_URL` and, if set, `FESTIVAL_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(API_URL_VAR).map_err(|_| {
            Error::config(format!("{} environment variable not found", API_URL_VAR))
        })?;
        let token = std::env::var(API_TOKEN_VAR).ok();
        Self::new(&url, token)
    }
}

/// Parse `raw` and make sure relative joins land under its path.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::config("API URL cannot be empty"));
    }
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::config(format!("{} cannot be used as a base URL", raw)));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
