//! Translation of inbound requests into upstream URLs.
//!
//! Two route families exist. A [`PassThrough`] route forwards the path
//! suffix and every query parameter to its upstream. A [`FixedEndpoint`]
//! route always targets one upstream URL and builds its parameter set from
//! a single required inbound parameter plus fixed defaults.

use crate::domain::{InboundRequest, OutboundRequest, QueryParams};
use crate::rotation::KeyRotator;
use http::Method;
use shared::{Error, Result};
use url::Url;

pub const ACCEPT_JSON: (&str, &str) = ("accept", "application/json");
const CONTENT_TYPE_JSON: (&str, &str) = ("content-type", "application/json");

pub struct PassThrough {
    base_url: Url,
    headers: Vec<(String, String)>,
}

impl PassThrough {
    pub fn new(base_url: &str, headers: Vec<(String, String)>) -> Result<Self> {
        Ok(Self {
            base_url: parse_base(base_url)?,
            headers,
        })
    }

    /// Resolve the upstream URL for an inbound path under `prefix`.
    ///
    /// Any query string on the base URL acts as a set of defaults; inbound
    /// parameters with the same name replace them.
    pub fn target_url(&self, prefix: &str, path: &str, query: &QueryParams) -> Url {
        let suffix = path.strip_prefix(prefix).unwrap_or("");

        let mut url = self.base_url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), suffix);
        url.set_path(if joined.is_empty() { "/" } else { joined.as_str() });

        let mut params: QueryParams = url.query_pairs().into_owned().collect();
        params.extend(query.iter().map(|(k, v)| (k.clone(), v.clone())));
        replace_query(&mut url, params.iter());

        url
    }

    pub fn map(&self, prefix: &str, request: &InboundRequest) -> OutboundRequest {
        let url = self.target_url(prefix, &request.path, &request.query);

        let mut headers = self.headers.clone();
        let body = if request.method == Method::GET {
            None
        } else {
            request.body.clone()
        };
        if body.is_some() {
            headers.push(owned(CONTENT_TYPE_JSON));
        }

        OutboundRequest {
            method: request.method.clone(),
            url,
            headers,
            body,
        }
    }
}

pub struct FixedEndpoint {
    endpoint: Url,
    required_param: String,
    upstream_param: String,
    credential_param: String,
    fixed_params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    credentials: KeyRotator,
}

impl FixedEndpoint {
    pub fn new(
        endpoint: &str,
        required_param: impl Into<String>,
        upstream_param: impl Into<String>,
        credential_param: impl Into<String>,
        credentials: KeyRotator,
    ) -> Result<Self> {
        Ok(Self {
            endpoint: parse_base(endpoint)?,
            required_param: required_param.into(),
            upstream_param: upstream_param.into(),
            credential_param: credential_param.into(),
            fixed_params: Vec::new(),
            headers: vec![owned(ACCEPT_JSON)],
            credentials,
        })
    }

    pub fn with_fixed_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fixed_params.push((name.into(), value.into()));
        self
    }

    /// Resolve the upstream URL, without the credential, from the inbound query.
    ///
    /// Fails with `BadRequest` when the required parameter is absent or blank.
    pub fn target_url(&self, query: &QueryParams) -> Result<Url> {
        let value = query
            .get(&self.required_param)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::BadRequest(format!(
                    "missing required query parameter '{}'",
                    self.required_param
                ))
            })?;

        let mut url = self.endpoint.clone();
        let params = self
            .fixed_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(std::iter::once((self.upstream_param.as_str(), value.as_str())));
        replace_query(&mut url, params);

        Ok(url)
    }

    /// Build the outbound call for a resolved URL, drawing the next credential.
    pub fn outbound(&self, url: &Url) -> OutboundRequest {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair(&self.credential_param, self.credentials.next());

        OutboundRequest {
            method: Method::GET,
            url,
            headers: self.headers.clone(),
            body: None,
        }
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::Configuration(format!("invalid upstream url '{}': {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::Configuration(format!(
            "upstream url '{}' cannot carry a path",
            raw
        )));
    }
    Ok(url)
}

fn replace_query<I, K, V>(url: &mut Url, params: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    url.set_query(None);
    let mut params = params.into_iter().peekable();
    if params.peek().is_some() {
        url.query_pairs_mut().extend_pairs(params);
    }
}

fn owned((name, value): (&str, &str)) -> (String, String) {
    (name.to_string(), value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collapse_query;
    use bytes::Bytes;

    fn tmdb(base: &str) -> PassThrough {
        PassThrough::new(
            base,
            vec![
                ("authorization".into(), "Bearer t0ken".into()),
                owned(ACCEPT_JSON),
            ],
        )
        .unwrap()
    }

    fn search(keys: &[&str]) -> FixedEndpoint {
        let rotator = KeyRotator::new(keys.iter().map(|k| k.to_string()).collect()).unwrap();
        FixedEndpoint::new(
            "https://www.googleapis.com/youtube/v3/search",
            "query",
            "q",
            "key",
            rotator,
        )
        .unwrap()
        .with_fixed_param("part", "snippet")
        .with_fixed_param("type", "video")
        .with_fixed_param("maxResults", "1")
    }

    #[test]
    fn test_pass_through_strips_prefix_and_copies_query() {
        let route = tmdb("https://api.themoviedb.org");
        let query = collapse_query(vec![("language", "en-US"), ("page", "2")]);

        let url = route.target_url("/api", "/api/3/movie/now_playing", &query);
        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/movie/now_playing?language=en-US&page=2"
        );
    }

    #[test]
    fn test_pass_through_without_query_has_no_question_mark() {
        let route = tmdb("https://api.themoviedb.org");
        let url = route.target_url("/api", "/api/3/genre/movie/list", &QueryParams::new());
        assert_eq!(url.as_str(), "https://api.themoviedb.org/3/genre/movie/list");
    }

    #[test]
    fn test_pass_through_bare_prefix_maps_to_base() {
        let route = tmdb("https://api.themoviedb.org");
        let url = route.target_url("/api", "/api", &QueryParams::new());
        assert_eq!(url.as_str(), "https://api.themoviedb.org/");
    }

    #[test]
    fn test_pass_through_keeps_base_path() {
        let route = tmdb("https://gateway.test/tmdb/");
        let url = route.target_url("/api", "/api/3/movie/550", &QueryParams::new());
        assert_eq!(url.as_str(), "https://gateway.test/tmdb/3/movie/550");
    }

    #[test]
    fn test_pass_through_inbound_overrides_defaults() {
        let route = tmdb("https://api.themoviedb.org?language=en-US&page=1");
        let query = collapse_query(vec![("page", "4")]);

        let url = route.target_url("/api", "/api/3/movie/now_playing", &query);
        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/movie/now_playing?language=en-US&page=4"
        );
    }

    #[test]
    fn test_pass_through_encodes_values() {
        let route = tmdb("https://api.themoviedb.org");
        let query = collapse_query(vec![("query", "fast & furious/7")]);

        let url = route.target_url("/api", "/api/3/search/movie", &query);
        assert_eq!(url.query(), Some("query=fast+%26+furious%2F7"));
    }

    #[test]
    fn test_pass_through_post_carries_body_and_content_type() {
        let route = tmdb("https://api.themoviedb.org");
        let request = InboundRequest::new(Method::POST, "/api/3/movie/550/rating")
            .with_body(Bytes::from_static(br#"{"value":8.5}"#));

        let outbound = route.map("/api", &request);
        assert_eq!(outbound.method, Method::POST);
        assert_eq!(outbound.body.as_deref(), Some(&br#"{"value":8.5}"#[..]));
        assert_eq!(outbound.header("Content-Type"), Some("application/json"));
        assert_eq!(outbound.header("authorization"), Some("Bearer t0ken"));
        assert_eq!(outbound.header("accept"), Some("application/json"));
    }

    #[test]
    fn test_pass_through_get_drops_body() {
        let route = tmdb("https://api.themoviedb.org");
        let request = InboundRequest::new(Method::GET, "/api/3/movie/550")
            .with_body(Bytes::from_static(b"{}"));

        let outbound = route.map("/api", &request);
        assert!(outbound.body.is_none());
        assert!(outbound.header("content-type").is_none());
    }

    #[test]
    fn test_fixed_endpoint_builds_parameter_set() {
        let route = search(&["k1"]);
        let query = collapse_query(vec![("query", "dune trailer"), ("maxResults", "50")]);

        let url = route.target_url(&query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/youtube/v3/search?part=snippet&type=video&maxResults=1&q=dune+trailer"
        );
    }

    #[test]
    fn test_fixed_endpoint_requires_query() {
        let route = search(&["k1"]);

        let missing = route.target_url(&QueryParams::new());
        assert!(matches!(missing, Err(Error::BadRequest(_))));

        let blank = route.target_url(&collapse_query(vec![("query", "  ")]));
        assert!(matches!(blank, Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_fixed_endpoint_ignores_inbound_credential() {
        let route = search(&["server-key"]);
        let query = collapse_query(vec![("query", "x"), ("key", "client-key")]);

        let url = route.target_url(&query).unwrap();
        let outbound = route.outbound(&url);
        let keys: Vec<String> = outbound
            .url
            .query_pairs()
            .filter(|(k, _)| k == "key")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(keys, vec!["server-key".to_string()]);
    }

    #[test]
    fn test_fixed_endpoint_rotates_credentials() {
        let route = search(&["k1", "k2"]);
        let url = route.target_url(&collapse_query(vec![("query", "x")])).unwrap();

        let first = route.outbound(&url);
        let second = route.outbound(&url);
        let third = route.outbound(&url);
        assert!(first.url.as_str().ends_with("&key=k1"));
        assert!(second.url.as_str().ends_with("&key=k2"));
        assert!(third.url.as_str().ends_with("&key=k1"));
        assert_eq!(first.method, Method::GET);
        assert_eq!(first.header("accept"), Some("application/json"));
    }

    #[test]
    fn test_invalid_base_is_configuration_error() {
        let result = PassThrough::new("not a url", Vec::new());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
