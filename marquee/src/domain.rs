use bytes::Bytes;
use http::Method;
use std::collections::BTreeMap;
use url::Url;

/// Inbound query parameters, one value per name.
///
/// Ordered so that the same parameter set always renders the same outbound
/// URL, and therefore the same cache key.
pub type QueryParams = BTreeMap<String, String>;

/// Collapse raw query pairs into [`QueryParams`]; on duplicate names the last value wins.
pub fn collapse_query<I, K, V>(pairs: I) -> QueryParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[derive(Clone, Debug)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub body: Option<Bytes>,
}

impl InboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Attach a request body. Empty bodies are treated as absent.
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }
}

#[derive(Clone, Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// The method does not take part in caching.
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Bypass => "bypass",
        }
    }
}

/// What the proxy hands back to the HTTP layer: a status and a JSON body.
#[derive(Clone, Debug)]
pub struct ProxyReply {
    pub status: u16,
    pub body: Bytes,
    pub cache: CacheStatus,
}

impl ProxyReply {
    pub fn cached(body: Bytes) -> Self {
        Self {
            status: 200,
            body,
            cache: CacheStatus::Hit,
        }
    }

    pub fn relayed(response: UpstreamResponse, cache: CacheStatus) -> Self {
        Self {
            status: response.status,
            body: response.body,
            cache,
        }
    }
}

/// Cache key for a resolved request: method and URL, so neither differing
/// methods nor differing query strings can collide.
pub fn cache_key(method: &Method, url: &Url) -> String {
    format!("{} {}", method, url)
}
