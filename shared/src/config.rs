use crate::{Error, Result};
use std::time::Duration;
use tracing::warn;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub tmdb_token: String,
    pub tmdb_base_url: String,
    pub youtube_api_keys: Vec<String>,
    pub youtube_search_url: String,
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Config {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 3000;
    const DEFAULT_CACHE_TTL_SECS: u64 = 60;
    const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_TMDB_BASE_URL: &'static str = "https://api.themoviedb.org";
    pub const DEFAULT_YOUTUBE_SEARCH_URL: &'static str = "https://www.googleapis.com/youtube/v3/search";

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Credentials are required; everything else falls back to a default
    /// with a warning when the supplied value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tmdb_token = lookup("TMDB_TOKEN")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Configuration("TMDB_TOKEN is not set".into()))?;

        let youtube_api_keys = parse_key_pool(&lookup("YOUTUBE_API_KEYS").unwrap_or_default());
        if youtube_api_keys.is_empty() {
            return Err(Error::Configuration(
                "YOUTUBE_API_KEYS must contain at least one key".into(),
            ));
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "PORT", Self::DEFAULT_PORT),
            tmdb_token,
            tmdb_base_url: lookup("TMDB_BASE_URL")
                .unwrap_or_else(|| Self::DEFAULT_TMDB_BASE_URL.to_string()),
            youtube_api_keys,
            youtube_search_url: lookup("YOUTUBE_SEARCH_URL")
                .unwrap_or_else(|| Self::DEFAULT_YOUTUBE_SEARCH_URL.to_string()),
            cache_ttl: Duration::from_secs(parse_positive_or(
                &lookup,
                "CACHE_TTL_SECS",
                Self::DEFAULT_CACHE_TTL_SECS,
            )),
            upstream_timeout: Duration::from_secs(parse_positive_or(
                &lookup,
                "UPSTREAM_TIMEOUT_SECS",
                Self::DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a comma-separated credential list, dropping blank entries.
pub fn parse_key_pool(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
    }
}

fn parse_positive_or<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, name, default) {
        0 => {
            warn!("{} must be positive, using default {}", name, default);
            default
        }
        value => value,
    }
}
