#![deny(clippy::all)]

use crate::domain::{OutboundRequest, UpstreamResponse};
use async_trait::async_trait;
use shared::Result;

// Ports are the pluggable extension points for the response cache and the outbound client

/// Port for the response cache (e.g., Moka).
///
/// Entries expire after the store's configured TTL. A miss, expired or
/// absent, is reported as `Error::NotFound`.
#[async_trait]
pub trait CacheStore<K, V>: Send + Sync + 'static {
    async fn put(&self, key: K, val: V) -> Result<()>;
    async fn get(&self, key: &K) -> Result<V>;
}

/// Port for the outbound HTTP call to an upstream API.
///
/// Any response that arrives, whatever its status, is `Ok`; only transport
/// failures and timeouts are errors.
#[async_trait]
pub trait Upstream: Send + Sync + 'static {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse>;
}
