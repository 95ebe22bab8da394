use crate::constants::DEFAULT_API_ORIGIN;

/// Backend route configuration.
///
/// The telemetry backend lives on a single fixed origin; every API path is
/// relative to it.  The origin can be overridden at build time via the
/// `API_BASE_URL` environment variable (useful for pointing a dev bundle at
/// a staging backend) and at runtime via [`ApiConfig::from_url`], which the
/// unit tests use.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiConfig {
    /// Build-time override when `API_BASE_URL` is set, else the fixed
    /// production origin.
    pub fn new() -> Self {
        match option_env!("API_BASE_URL") {
            Some(url) => Self::from_url(url),
            None => Self::from_url(DEFAULT_API_ORIGIN),
        }
    }

    /// Create a new ApiConfig from a URL string.
    pub fn from_url(url: &str) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL for all API calls.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get a full URL for a given API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
