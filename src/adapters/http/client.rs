use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, COOKIE, PRAGMA};
use reqwest::Client;
use tracing::debug;

use crate::domain::StatusSample;
use crate::ports::{FetchError, StatusSource};

/// Connection settings for the `/data` endpoint
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    pub base_url: String,
    pub request_timeout: Option<Duration>,
    pub cookie: Option<String>,
}

impl HttpSourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: None,
            cookie: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }
}

/// Status source polling `GET {base_url}/data` with reqwest
pub struct HttpStatusSource {
    client: Client,
    url: String,
}

impl HttpStatusSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut headers = HeaderMap::new();
        // Any cache between us and the sampler must not answer for it
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        if let Some(cookie) = &config.cookie {
            let mut value = HeaderValue::from_str(cookie)?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: Self::data_url(&config.base_url),
        })
    }

    fn data_url(base_url: &str) -> String {
        format!("{}/data", base_url.trim_end_matches('/'))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self) -> Result<StatusSample, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!("GET {} -> {} ({} bytes)", self.url, status, body.len());

        Ok(StatusSample::from_json(&body)?)
    }
}
