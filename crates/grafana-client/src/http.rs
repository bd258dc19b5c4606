use crate::error::{ClientError, Result};
use crate::{AdminStats, GrafanaApi, Metrics};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("grafana_exporter/", env!("CARGO_PKG_VERSION"));

/// Total request timeout, covering connect, send and body read.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Idle connection cap and keep-alive window for the pooled client.
const MAX_IDLE_CONNECTIONS: usize = 10;
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// The real HTTP implementation of [`GrafanaApi`].
///
/// One authenticated GET per call, no retries: retry policy belongs to the
/// Prometheus scrape schedule, not to this client.
#[derive(Debug)]
pub struct HttpClient {
    base: Url,
    username: String,
    password: String,
    client: Client,
}

impl HttpClient {
    /// Builds a client for the given Grafana base URI.
    ///
    /// Basic auth is attached to requests only when `username` and
    /// `password` are both non-empty. `skip_tls_verify` disables server
    /// certificate validation for self-signed deployments.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUri`] when `uri` does not parse, or
    /// [`ClientError::Transport`] when the underlying client cannot be
    /// constructed.
    pub fn new(uri: &str, username: &str, password: &str, skip_tls_verify: bool) -> Result<Self> {
        let base = Url::parse(uri).map_err(|_| ClientError::InvalidUri(uri.to_string()))?;

        let client = Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(skip_tls_verify)
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS)
            .pool_idle_timeout(KEEP_ALIVE)
            .tcp_keepalive(KEEP_ALIVE)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            base,
            username: username.to_string(),
            password: password.to_string(),
            client,
        })
    }

    fn basic_auth_enabled(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self
            .base
            .join(path)
            .map_err(|_| ClientError::InvalidUri(format!("{}{}", self.base, path)))?;

        let mut request = self.client.get(url);
        if self.basic_auth_enabled() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        let response = request.send().await.map_err(ClientError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(ClientError::Transport)?;
        serde_json::from_slice(&body).map_err(ClientError::Decode)
    }
}

#[async_trait]
impl GrafanaApi for HttpClient {
    async fn admin_stats(&self) -> Result<AdminStats> {
        self.get_json("/api/admin/stats").await
    }

    async fn metrics(&self) -> Result<Metrics> {
        self.get_json("/api/metrics").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_uri() {
        let err = HttpClient::new("not a uri", "", "", false).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUri(_)));
    }

    #[test]
    fn basic_auth_requires_both_credentials() {
        let anonymous = HttpClient::new("http://grafana:3000", "", "", false).unwrap();
        assert!(!anonymous.basic_auth_enabled());

        let username_only = HttpClient::new("http://grafana:3000", "admin", "", false).unwrap();
        assert!(!username_only.basic_auth_enabled());

        let full = HttpClient::new("http://grafana:3000", "admin", "secret", false).unwrap();
        assert!(full.basic_auth_enabled());
    }

    #[test]
    fn api_paths_resolve_against_base() {
        let client = HttpClient::new("https://grafana.example.com:3000/", "", "", false).unwrap();
        let url = client.base.join("/api/admin/stats").unwrap();
        assert_eq!(url.as_str(), "https://grafana.example.com:3000/api/admin/stats");
    }
}
