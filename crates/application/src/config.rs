//! Base-URL configuration

/// Environment variable read by [`ApiConfig::from_env`].
pub const BASE_URL_ENV: &str = "RELAY_API_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Immutable base URL supplied to every dispatcher at construction.
///
/// The full target of a call is `base_url + controller_prefix + endpoint`,
/// joined by plain concatenation; the base URL is stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Creates a config from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Reads the base URL from `RELAY_API_URL`, falling back to
    /// `http://localhost:3000`.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self { base_url }
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
