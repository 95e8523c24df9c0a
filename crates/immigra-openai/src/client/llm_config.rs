//! Configuration types for the OpenAI client.

use std::time::Duration;

use derive_builder::Builder;
use url::Url;

/// Default values for configuration options.
mod defaults {
    /// Default request timeout in seconds.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// OpenAI API base URL.
    pub const BASE_URL: &str = "https://api.openai.com/v1";
}

/// Validates the LlmConfig before building.
fn validate_config(builder: &LlmConfigBuilder) -> std::result::Result<(), String> {
    if let Some(Some(base_url)) = &builder.base_url {
        let url = Url::parse(base_url).map_err(|e| format!("Invalid base URL {base_url}: {e}"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "Base URL must start with http:// or https://, got {base_url}"
            ));
        }
    }

    if let Some(Some(timeout)) = builder.request_timeout
        && timeout.is_zero()
    {
        return Err("Request timeout must be greater than zero".to_string());
    }

    Ok(())
}

/// Configuration for the OpenAI client.
///
/// The credential is not part of the configuration; it is supplied when the
/// client is built so one configuration can serve several keys.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use immigra_openai::LlmConfig;
///
/// let config = LlmConfig::builder()
///     .with_base_url("http://localhost:8080/v1")
///     .with_request_timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.effective_request_timeout(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Default, Builder)]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "validate_config")
)]
pub struct LlmConfig {
    /// Upper bound on a single completion call (default: 30s).
    #[builder(default)]
    request_timeout: Option<Duration>,

    /// Base URL of the OpenAI-compatible API.
    #[builder(default)]
    base_url: Option<String>,

    /// User-Agent header sent with every request.
    #[builder(default)]
    user_agent: Option<String>,

    /// Optional `OpenAI-Organization` header.
    #[builder(default)]
    organization: Option<String>,
}

impl LlmConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> LlmConfigBuilder {
        LlmConfigBuilder::default()
    }

    /// Returns the effective request timeout (considering defaults).
    pub fn effective_request_timeout(&self) -> Duration {
        self.request_timeout
            .filter(|t| !t.is_zero())
            .unwrap_or_else(|| Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS))
    }

    /// Returns the effective base URL (considering defaults).
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(defaults::BASE_URL)
    }

    /// Returns the effective user agent (considering defaults).
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("immigra/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Returns the organization header value, if any.
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    /// Returns the full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> Result<Url, url::ParseError> {
        let base = self.effective_base_url().trim_end_matches('/');
        Url::parse(&format!("{base}/chat/completions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.effective_request_timeout(), Duration::from_secs(30));
        assert_eq!(config.effective_base_url(), defaults::BASE_URL);
        assert!(config.effective_user_agent().starts_with("immigra/"));
        assert!(config.organization().is_none());
    }

    #[test]
    fn completions_url_handles_trailing_slash() {
        let config = LlmConfig::builder()
            .with_base_url("http://localhost:9000/v1/")
            .build()
            .unwrap();
        assert_eq!(
            config.completions_url().unwrap().as_str(),
            "http://localhost:9000/v1/chat/completions"
        );

        let config = LlmConfig::default();
        assert_eq!(
            config.completions_url().unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn builder_validation() {
        assert!(LlmConfig::builder().with_base_url("ftp://example.com").build().is_err());
        assert!(LlmConfig::builder().with_base_url("not a url").build().is_err());
        assert!(
            LlmConfig::builder()
                .with_request_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(
            LlmConfig::builder()
                .with_user_agent("immigra-test")
                .with_organization("org-123")
                .build()
                .is_ok()
        );
    }
}
