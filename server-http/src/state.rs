use crate::upstream::ReqwestUpstream;
use bytes::Bytes;
use marquee::ports::{CacheStore, Upstream};
use marquee::{ProxyService, RouteTable};
use shared::config::Config;
use std::sync::Arc;
use storage_engine::MokaCache;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyService>,
}

impl AppState {
    /// Wire the route table, response cache and outbound client from configuration.
    pub fn new(config: &Config) -> shared::Result<Self> {
        let routes = RouteTable::from_config(config)?;
        let cache = Arc::new(MokaCache::<String, Bytes>::new(
            "responses",
            config.cache_ttl,
        ));
        let upstream = Arc::new(ReqwestUpstream::new(config.upstream_timeout)?);

        tracing::info!(
            "Proxy state initialized: {} routes, cache ttl {:?}, upstream timeout {:?}",
            routes.len(),
            cache.ttl(),
            config.upstream_timeout
        );

        Ok(Self::with_parts(routes, cache, upstream))
    }

    pub fn with_parts(
        routes: RouteTable,
        cache: Arc<dyn CacheStore<String, Bytes>>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            proxy: Arc::new(ProxyService::new(routes, cache, upstream)),
        }
    }
}
