use crate::domain::{CacheStatus, InboundRequest, ProxyReply, UpstreamResponse, cache_key};
use crate::mapping::{FixedEndpoint, PassThrough};
use crate::ports::{CacheStore, Upstream};
use crate::routes::{ProxyRoute, RouteTable, RouteTarget};
use bytes::Bytes;
use http::Method;
use serde_json::Value;
use shared::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Application service that answers proxied requests.
///
/// Per request: resolve the route, map to an upstream URL, consult the
/// cache (GET only), call upstream on a miss, relay the reply and store it
/// when it qualifies. The cache is only written after the upstream reply
/// has been fully validated, so an error never leaves an entry behind.
pub struct ProxyService {
    routes: RouteTable,
    cache: Arc<dyn CacheStore<String, Bytes>>,
    upstream: Arc<dyn Upstream>,
}

impl ProxyService {
    pub fn new(
        routes: RouteTable,
        cache: Arc<dyn CacheStore<String, Bytes>>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            routes,
            cache,
            upstream,
        }
    }

    pub async fn handle(&self, request: InboundRequest) -> Result<ProxyReply> {
        let route = self
            .routes
            .resolve(&request.path)
            .ok_or_else(|| Error::RouteNotFound(request.path.clone()))?;

        match &route.target {
            RouteTarget::PassThrough(target) => self.pass_through(route, target, &request).await,
            RouteTarget::FixedEndpoint(target) => {
                self.fixed_endpoint(route, target, &request).await
            }
        }
    }

    async fn pass_through(
        &self,
        route: &ProxyRoute,
        target: &PassThrough,
        request: &InboundRequest,
    ) -> Result<ProxyReply> {
        let outbound = target.map(&route.prefix, request);
        let key = cache_key(&outbound.method, &outbound.url);
        let cacheable = request.method == Method::GET;

        if cacheable {
            if let Some(body) = self.lookup(&key).await {
                info!("{} {} -> cache hit", route.name, key);
                return Ok(ProxyReply::cached(body));
            }
        }

        let response = self.upstream.send(outbound).await?;
        ensure_json(&response)?;

        let cache = if cacheable {
            if response.is_success() && !response.body.is_empty() {
                self.store(key.clone(), response.body.clone()).await;
            }
            CacheStatus::Miss
        } else {
            CacheStatus::Bypass
        };

        info!(
            "{} {} -> {} (cache {})",
            route.name,
            key,
            response.status,
            cache.as_str()
        );
        Ok(ProxyReply::relayed(response, cache))
    }

    async fn fixed_endpoint(
        &self,
        route: &ProxyRoute,
        target: &FixedEndpoint,
        request: &InboundRequest,
    ) -> Result<ProxyReply> {
        if request.method != Method::GET {
            return Err(Error::MethodNotAllowed(request.method.to_string()));
        }

        // Keyed on the URL without its credential, so every key in the
        // pool shares one entry and nothing secret lands in logs.
        let url = target.target_url(&request.query)?;
        let key = cache_key(&Method::GET, &url);

        if let Some(body) = self.lookup(&key).await {
            info!("{} {} -> cache hit", route.name, key);
            return Ok(ProxyReply::cached(body));
        }

        let response = self.upstream.send(target.outbound(&url)).await?;
        let payload = ensure_json(&response)?;

        // Empty result sets are not cached.
        if response.is_success() && payload.as_ref().is_some_and(has_items) {
            self.store(key.clone(), response.body.clone()).await;
        }

        info!("{} {} -> {} (cache miss)", route.name, key, response.status);
        Ok(ProxyReply::relayed(response, CacheStatus::Miss))
    }

    /// Cache read; a store failure degrades to a miss.
    async fn lookup(&self, key: &String) -> Option<Bytes> {
        match self.cache.get(key).await {
            Ok(body) => Some(body),
            Err(Error::NotFound) => None,
            Err(e) => {
                warn!("Cache lookup failed for '{}': {}", key, e);
                None
            }
        }
    }

    async fn store(&self, key: String, body: Bytes) {
        debug!("Caching {} ({} bytes)", key, body.len());
        if let Err(e) = self.cache.put(key, body).await {
            warn!("Cache store failed: {}", e);
        }
    }
}

/// Parse a non-empty upstream body as JSON. Empty bodies pass through as `None`.
fn ensure_json(response: &UpstreamResponse) -> Result<Option<Value>> {
    if response.body.is_empty() {
        return Ok(None);
    }

    serde_json::from_slice(&response.body)
        .map(Some)
        .map_err(|e| {
            Error::Upstream(format!(
                "upstream returned a non-JSON body (status {}): {}",
                response.status, e
            ))
        })
}

fn has_items(payload: &Value) -> bool {
    payload
        .get("items")
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}
