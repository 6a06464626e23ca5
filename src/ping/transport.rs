//! Pooled HTTP transport for all outbound pings.

use super::error::PingError;
use reqwest::header::USER_AGENT;
use std::time::Duration;

/// Idle connections kept per host.
pub const POOL_MAX_IDLE_PER_HOST: usize = 100;
/// Idle connections older than this are closed.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
/// Bound on TCP connect plus TLS handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parameters of a single probe.
#[derive(Debug, Clone)]
pub struct ProbeRequest<'a> {
    pub url: &'a str,
    pub user_agent: &'a str,
    pub timeout: Duration,
    pub max_body_bytes: u64,
}

/// What a probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    /// Body bytes read and discarded
    pub body_bytes: u64,
}

/// Connection-pooling client, safe to share across all in-flight attempts.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the shared client with pool and handshake bounds.
    ///
    /// Redirects are not followed: one probe is exactly one GET, and a 3xx
    /// is classified like any other status.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Create a transport with custom HTTP client (for testing).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Issue one GET, drain up to `max_body_bytes` of the body and release the connection.
    ///
    /// The deadline covers the whole exchange including the drain. Body read
    /// failures after the status line do not change the observed status.
    pub async fn probe(&self, request: &ProbeRequest<'_>) -> Result<ProbeResponse, PingError> {
        let timeout_ms = u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX);

        let mut response = self
            .client
            .get(request.url)
            .header(USER_AGENT, request.user_agent)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| PingError::from_reqwest(e, timeout_ms))?;

        let status = response.status().as_u16();
        let mut body_bytes = 0u64;

        while body_bytes < request.max_body_bytes {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);
                    body_bytes = body_bytes.saturating_add(len).min(request.max_body_bytes);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(
                        url = request.url,
                        status,
                        error = %e,
                        "Response body drain interrupted"
                    );
                    break;
                }
            }
        }

        Ok(ProbeResponse { status, body_bytes })
    }
}
