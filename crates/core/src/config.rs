//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into controllers and
//! store adapters. Nothing in this crate reads process-wide environment variables during
//! request handling; binaries read the environment and feed the raw values through the
//! `*_from_env_value` helpers below.

use crate::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, REST_PATH_PREFIX};
use crate::{PhrError, PhrResult};
use phr_types::NonEmptyText;
use reqwest::Url;
use std::time::Duration;

/// Settings shared by every controller.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    request_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PhrError::InvalidConfig` if `request_timeout` is zero.
    pub fn new(request_timeout: Duration) -> PhrResult<Self> {
        if request_timeout.is_zero() {
            return Err(PhrError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }
        Ok(Self { request_timeout })
    }

    /// Upper bound applied to every individual store call.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Connection settings for the hosted backend.
///
/// The publishable key is the client-side key the backend issues for browser and mobile
/// apps. Row-level access is enforced by the backend, not by this key.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    base_url: Url,
    publishable_key: NonEmptyText,
    request_timeout: Duration,
}

impl StoreConfig {
    /// Create a new `StoreConfig`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend project URL, e.g. `https://example.supabase.co`.
    /// * `publishable_key` - Client key sent as `apikey` and bearer token.
    /// * `request_timeout` - Transport-level timeout for each HTTP request.
    ///
    /// # Errors
    ///
    /// Returns `PhrError::InvalidConfig` if the URL does not parse, is not http(s), the key is
    /// blank, or the timeout is zero.
    pub fn new(
        base_url: &str,
        publishable_key: &str,
        request_timeout: Duration,
    ) -> PhrResult<Self> {
        let mut url = Url::parse(base_url.trim())
            .map_err(|e| PhrError::InvalidConfig(format!("invalid store URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PhrError::InvalidConfig(format!(
                "store URL must be http or https, got {}",
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let publishable_key = NonEmptyText::new(publishable_key)
            .map_err(|_| PhrError::InvalidConfig("publishable key cannot be empty".into()))?;

        if request_timeout.is_zero() {
            return Err(PhrError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            base_url: url,
            publishable_key,
            request_timeout,
        })
    }

    /// Build a `StoreConfig` from optional raw values, as read from the environment by a
    /// binary (`PHR_STORE_URL`, `PHR_PUBLISHABLE_KEY`, `PHR_REQUEST_TIMEOUT_SECS`).
    ///
    /// # Errors
    ///
    /// Returns `PhrError::InvalidConfig` if the URL or key is missing, or any value is invalid.
    pub fn from_env_values(
        base_url: Option<String>,
        publishable_key: Option<String>,
        request_timeout: Option<String>,
    ) -> PhrResult<Self> {
        let base_url = base_url
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| PhrError::InvalidConfig("PHR_STORE_URL must be set".into()))?;
        let publishable_key = publishable_key
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| PhrError::InvalidConfig("PHR_PUBLISHABLE_KEY must be set".into()))?;
        let request_timeout = request_timeout_from_env_value(request_timeout)?;
        Self::new(&base_url, &publishable_key, request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn publishable_key(&self) -> &str {
        self.publishable_key.as_str()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// URL of a collection endpoint, e.g. `{base}/rest/v1/medications`.
    pub fn collection_url(&self, collection: &str) -> PhrResult<Url> {
        self.base_url
            .join(&format!("{REST_PATH_PREFIX}{collection}"))
            .map_err(|e| PhrError::InvalidConfig(format!("invalid collection URL: {e}")))
    }
}

/// Parse the request timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn request_timeout_from_env_value(value: Option<String>) -> PhrResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    };

    let secs = value.parse::<u64>().map_err(|_| {
        PhrError::InvalidConfig(format!("request timeout must be whole seconds, got {value}"))
    })?;
    if secs == 0 {
        return Err(PhrError::InvalidConfig(
            "request timeout must be greater than zero".into(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timeout_defaults_when_unset() {
        assert_eq!(
            request_timeout_from_env_value(None).unwrap(),
            Duration::from_secs(15)
        );
        assert_eq!(
            request_timeout_from_env_value(Some("  ".into())).unwrap(),
            Duration::from_secs(15)
        );
        assert_eq!(
            request_timeout_from_env_value(Some("30".into())).unwrap(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_request_timeout_rejects_garbage_and_zero() {
        assert!(request_timeout_from_env_value(Some("soon".into())).is_err());
        assert!(request_timeout_from_env_value(Some("0".into())).is_err());
    }

    #[test]
    fn test_store_config_builds_collection_urls() {
        let cfg = StoreConfig::new("https://demo.supabase.co", "pk_live", Duration::from_secs(5))
            .expect("valid config");
        assert_eq!(
            cfg.collection_url("medications").unwrap().as_str(),
            "https://demo.supabase.co/rest/v1/medications"
        );

        let nested = StoreConfig::new("http://localhost:54321/proxy", "k", Duration::from_secs(5))
            .unwrap();
        assert_eq!(
            nested.collection_url("family_history").unwrap().as_str(),
            "http://localhost:54321/proxy/rest/v1/family_history"
        );
    }

    #[test]
    fn test_store_config_rejects_bad_input() {
        let timeout = Duration::from_secs(5);
        assert!(StoreConfig::new("not a url", "k", timeout).is_err());
        assert!(StoreConfig::new("ftp://example.com", "k", timeout).is_err());
        assert!(StoreConfig::new("https://example.com", "   ", timeout).is_err());
        assert!(StoreConfig::new("https://example.com", "k", Duration::ZERO).is_err());
        assert!(CoreConfig::new(Duration::ZERO).is_err());
    }

    #[test]
    fn test_from_env_values_requires_url_and_key() {
        let err = StoreConfig::from_env_values(None, Some("k".into()), None)
            .expect_err("missing url");
        assert!(err.to_string().contains("PHR_STORE_URL"));

        let err = StoreConfig::from_env_values(Some("https://x.example".into()), Some(" ".into()), None)
            .expect_err("blank key");
        assert!(err.to_string().contains("PHR_PUBLISHABLE_KEY"));

        let cfg = StoreConfig::from_env_values(
            Some("https://x.example".into()),
            Some("pk".into()),
            Some("7".into()),
        )
        .unwrap();
        assert_eq!(cfg.request_timeout(), Duration::from_secs(7));
        assert_eq!(cfg.publishable_key(), "pk");
    }
}
