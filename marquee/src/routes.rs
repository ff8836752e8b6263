use crate::mapping::{ACCEPT_JSON, FixedEndpoint, PassThrough};
use crate::rotation::KeyRotator;
use shared::Result;
use shared::config::Config;

pub enum RouteTarget {
    PassThrough(PassThrough),
    FixedEndpoint(FixedEndpoint),
}

/// An inbound path prefix bound to one upstream.
pub struct ProxyRoute {
    pub name: String,
    pub prefix: String,
    pub target: RouteTarget,
}

impl ProxyRoute {
    /// A trailing `/` on `prefix` is dropped, so the forwarded suffix always
    /// starts at a segment boundary.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, target: RouteTarget) -> Self {
        let prefix: String = prefix.into();
        Self {
            name: name.into(),
            prefix: prefix.trim_end_matches('/').to_string(),
            target,
        }
    }

    /// Pass-through routes match on whole path segments: `/api` covers
    /// `/api` and `/api/...` but not `/apix`. Fixed endpoints match only
    /// their own path, optionally with a trailing `/`.
    pub fn matches(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix(self.prefix.as_str()) else {
            return false;
        };

        match self.target {
            RouteTarget::PassThrough(_) => rest.is_empty() || rest.starts_with('/'),
            RouteTarget::FixedEndpoint(_) => rest.is_empty() || rest == "/",
        }
    }
}

/// Static prefix → upstream table, defined once at startup.
pub struct RouteTable {
    routes: Vec<ProxyRoute>,
}

impl RouteTable {
    pub const MOVIES_PREFIX: &'static str = "/api";
    pub const VIDEO_SEARCH_PREFIX: &'static str = "/yt-search";

    pub fn new(routes: Vec<ProxyRoute>) -> Self {
        Self { routes }
    }

    /// The movie-metadata pass-through and the video-search fixed endpoint.
    pub fn from_config(config: &Config) -> Result<Self> {
        let movies = PassThrough::new(
            &config.tmdb_base_url,
            vec![
                (
                    "authorization".to_string(),
                    format!("Bearer {}", config.tmdb_token),
                ),
                (ACCEPT_JSON.0.to_string(), ACCEPT_JSON.1.to_string()),
            ],
        )?;

        let search = FixedEndpoint::new(
            &config.youtube_search_url,
            "query",
            "q",
            "key",
            KeyRotator::new(config.youtube_api_keys.clone())?,
        )?
        .with_fixed_param("part", "snippet")
        .with_fixed_param("type", "video")
        .with_fixed_param("maxResults", "1");

        Ok(Self::new(vec![
            ProxyRoute::new(
                "tmdb",
                Self::MOVIES_PREFIX,
                RouteTarget::PassThrough(movies),
            ),
            ProxyRoute::new(
                "youtube",
                Self::VIDEO_SEARCH_PREFIX,
                RouteTarget::FixedEndpoint(search),
            ),
        ]))
    }

    /// Longest matching prefix wins.
    pub fn resolve(&self, path: &str) -> Option<&ProxyRoute> {
        self.routes
            .iter()
            .filter(|route| route.matches(path))
            .max_by_key(|route| route.prefix.len())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
