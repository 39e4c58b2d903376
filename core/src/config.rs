//! API base URL configuration.
//!
//! The base URL is resolved once, from a page origin or an explicit value,
//! and handed to `ApiClient` as an immutable value.

use std::env;

/// Path prefix every API route lives under.
pub const API_PREFIX: &str = "/api/v1";

/// Env var holding a complete base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";

/// Env var holding an origin to derive the base URL from.
pub const ORIGIN_ENV: &str = "API_ORIGIN";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Use `base_url` verbatim. An empty value is accepted here and reported
    /// as a configuration error on the first request.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Derive the base URL from an origin such as `https://booth.example.com`.
    pub fn from_origin(origin: &str) -> Self {
        let origin = origin.strip_suffix('/').unwrap_or(origin);
        Self::new(format!("{origin}{API_PREFIX}"))
    }

    /// `API_BASE_URL` wins, then `API_ORIGIN`; neither leaves the config unset.
    pub fn from_env() -> Self {
        if let Some(base_url) = non_empty_var(BASE_URL_ENV) {
            return Self::new(base_url);
        }
        match non_empty_var(ORIGIN_ENV) {
            Some(origin) => Self::from_origin(&origin),
            None => Self::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_gets_versioned_prefix() {
        let config = ApiConfig::from_origin("https://booth.example.com");
        assert_eq!(config.base_url(), "https://booth.example.com/api/v1");
    }

    #[test]
    fn origin_trailing_slash_is_dropped() {
        let config = ApiConfig::from_origin("http://localhost:5000/");
        assert_eq!(config.base_url(), "http://localhost:5000/api/v1");
    }

    #[test]
    fn default_config_has_empty_base() {
        assert_eq!(ApiConfig::default().base_url(), "");
        assert_eq!(ApiConfig::new("https://x.com/api/v1/").base_url(), "https://x.com/api/v1/");
    }
}
