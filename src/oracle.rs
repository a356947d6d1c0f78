//! HTTP implementation of the [`Oracle`] trait.
//!
//! Posts [`Form`]s as `multipart/form-data` with the configured fixed
//! boundary to one of two URLs, depending on the [`Endpoint`].
//!
//! # Retry Strategy
//!
//! - Network errors (connect, timeout, reset) → retry
//! - HTTP 429 and 5xx → retry
//! - Any other status → returned to the caller as-is
//! - Backoff: `retry_backoff_ms`, doubled per attempt (capped at 2^5)
//!
//! With the default `max_retries = 1` a request is tried at most twice. When
//! retries are exhausted on a retryable status the last reply is returned,
//! so the caller still sees the status it can log.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;

use crate::config::OracleConfig;
use crate::form::{self, Form};
use crate::traits::{Endpoint, Oracle, OracleReply};

pub struct HttpOracle {
    client: reqwest::Client,
    options_url: String,
    lookup_url: String,
    boundary: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpOracle {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the boundary or user agent cannot be used as a
    /// header value, the proxy URL is invalid, or the TLS backend fails to
    /// initialise.
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(&form::content_type(&config.boundary))
                .context("oracle.boundary is not usable in a Content-Type header")?,
        );

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers);

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy)
                    .with_context(|| format!("Invalid oracle.proxy: '{}'", proxy))?,
            );
        }

        Ok(Self {
            client: builder.build()?,
            options_url: config.options_url.clone(),
            lookup_url: config.lookup_url.clone(),
            boundary: config.boundary.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    fn url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Options => &self.options_url,
            Endpoint::VoterList => &self.lookup_url,
        }
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn submit(&self, endpoint: Endpoint, form: &Form) -> Result<OracleReply> {
        let url = self.url(endpoint);
        let body = form.encode(&self.boundary);

        let mut last_err = None;
        let mut last_reply = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.retry_backoff * (1u32 << (attempt - 1).min(5));
                tracing::debug!(url, attempt, ?delay, "retrying oracle request");
                tokio::time::sleep(delay).await;
            }

            let resp = self.client.post(url).body(body.clone()).send().await;

            match resp {
                Ok(response) => {
                    let status = response.status();
                    let text = match response.text().await {
                        Ok(text) => text,
                        Err(e) => {
                            last_err = Some(anyhow::Error::new(e).context("reading response body"));
                            continue;
                        }
                    };
                    let reply = OracleReply {
                        status: status.as_u16(),
                        body: text,
                    };

                    // Rate limited or server error: retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::debug!(url, status = status.as_u16(), "transient oracle status");
                        last_reply = Some(reply);
                        last_err = None;
                        continue;
                    }

                    return Ok(reply);
                }
                Err(e) => {
                    tracing::debug!(url, error = %e, "oracle request failed");
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        match (last_reply, last_err) {
            (_, Some(err)) => Err(err.context(format!("POST {} failed", url))),
            (Some(reply), None) => Ok(reply),
            (None, None) => Err(anyhow::anyhow!("POST {} failed after retries", url)),
        }
    }
}
