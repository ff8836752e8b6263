// Upstream client implementation
// reqwest adapter for the `Upstream` port

use async_trait::async_trait;
use marquee::domain::{OutboundRequest, UpstreamResponse};
use marquee::ports::Upstream;
use reqwest::Client;
use shared::{Error, Result};
use std::time::Duration;

pub struct ReqwestUpstream {
    http_client: Client,
}

impl ReqwestUpstream {
    /// `timeout` bounds the whole call: connect, send and body read.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Upstream for ReqwestUpstream {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse> {
        let mut builder = self.http_client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(UpstreamResponse { status, body })
    }
}

/// The URL is stripped from the message: it may carry a credential.
fn transport_error(err: reqwest::Error) -> Error {
    let err = err.without_url();
    if err.is_timeout() {
        Error::UpstreamTimeout(err.to_string())
    } else {
        Error::Upstream(err.to_string())
    }
}
