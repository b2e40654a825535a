//! Configuration types for image analysis.
//!
//! All pipeline behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`]. One config is shared by every request an
//! [`crate::analyze::Analyzer`] handles; nothing in it changes per request.
//!
//! # Design choice: builder over constructor
//! Most callers only pick models and a timeout. The builder lets them set
//! what they care about and rely on documented defaults for the rest.

use crate::client::ImageTransport;
use crate::error::AnalysisError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Default multimodal model for the vision stage.
pub const DEFAULT_VISION_MODEL: &str = "qwen/qwen-2.5-vl-72b";

/// Default text model for the structuring stage.
pub const DEFAULT_STRUCTURE_MODEL: &str = "moonshot/kimi-vl-a3b-thinking";

/// Sampling temperature of the structuring stage. Not configurable.
pub const STRUCTURING_TEMPERATURE: f32 = 0.0;

/// Default cap on an inline image download.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

/// Configuration for an [`crate::analyze::Analyzer`].
///
/// # Example
/// ```rust
/// use mealscan::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .vision_model("openai/gpt-4o")
///     .api_timeout_secs(30)
///     .trusted_image_domains(["supabase.co", "images.example.com"])
///     .build()
///     .unwrap();
/// assert_eq!(config.api_timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// LLM provider name (e.g. "openrouter", "openai", "ollama").
    /// If None, resolved from the environment by
    /// [`crate::analyze::Analyzer::from_config`].
    pub provider_name: Option<String>,

    /// Multimodal model that describes the image(s).
    pub vision_model: String,

    /// Text model that turns the description into JSON.
    ///
    /// Usually smaller and cheaper than the vision model: it only reformats.
    pub structure_model: String,

    /// Sampling temperature of the vision call. Range 0.0–2.0. Default: 0.3.
    ///
    /// Slightly above zero so descriptions stay rich. The structuring call
    /// always runs at [`STRUCTURING_TEMPERATURE`].
    pub vision_temperature: f32,

    /// Maximum tokens either model may generate. Default: 4096.
    ///
    /// A fridge answer with three full recipes runs to roughly 2 500 tokens;
    /// too low a limit truncates the JSON and surfaces as `MalformedOutput`.
    pub max_tokens: usize,

    /// Per-remote-call timeout in seconds. Default: 60.
    ///
    /// Also bounds the persistence write.
    pub api_timeout_secs: u64,

    /// Retries on transport failure or timeout. Default: 0 (no retry).
    ///
    /// A retried generative call returns a different answer and costs again,
    /// so retrying is opt-in. Empty responses are never retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Structuring repair rounds after malformed or schema-violating output.
    /// Default: 0 (surface the first failure).
    pub repair_attempts: u32,

    /// Hosts image references may come from. Default: `["supabase.co"]`.
    ///
    /// A host matches a domain when it equals it or is a subdomain of it.
    pub trusted_image_domains: Vec<String>,

    /// How the vision client accepts images. Default: [`ImageTransport::HostedUrl`].
    pub image_transport: ImageTransport,

    /// Download timeout for inline image transport, in seconds. Default: 30.
    pub image_fetch_timeout_secs: u64,

    /// Largest image inline transport will download, in bytes. Default: 20 MiB.
    pub max_image_bytes: u64,

    /// Include internal error detail in HTTP 500 bodies. Default: false.
    pub expose_error_details: bool,

    /// Optional stage event receiver.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider_name: None,
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            structure_model: DEFAULT_STRUCTURE_MODEL.to_string(),
            vision_temperature: 0.3,
            max_tokens: 4096,
            api_timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
            repair_attempts: 0,
            trusted_image_domains: vec!["supabase.co".to_string()],
            image_transport: ImageTransport::HostedUrl,
            image_fetch_timeout_secs: 30,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            expose_error_details: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("provider_name", &self.provider_name)
            .field("vision_model", &self.vision_model)
            .field("structure_model", &self.structure_model)
            .field("vision_temperature", &self.vision_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("repair_attempts", &self.repair_attempts)
            .field("trusted_image_domains", &self.trusted_image_domains)
            .field("image_transport", &self.image_transport)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("expose_error_details", &self.expose_error_details)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.config.vision_model = model.into();
        self
    }

    pub fn structure_model(mut self, model: impl Into<String>) -> Self {
        self.config.structure_model = model.into();
        self
    }

    pub fn vision_temperature(mut self, t: f32) -> Self {
        self.config.vision_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn repair_attempts(mut self, n: u32) -> Self {
        self.config.repair_attempts = n;
        self
    }

    /// Replace the trusted domain list.
    pub fn trusted_image_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.trusted_image_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn image_transport(mut self, transport: ImageTransport) -> Self {
        self.config.image_transport = transport;
        self
    }

    pub fn image_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.image_fetch_timeout_secs = secs;
        self
    }

    pub fn max_image_bytes(mut self, bytes: u64) -> Self {
        self.config.max_image_bytes = bytes;
        self
    }

    pub fn expose_error_details(mut self, v: bool) -> Self {
        self.config.expose_error_details = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<AnalyzerConfig, AnalysisError> {
        let c = &mut self.config;
        if c.vision_model.trim().is_empty() || c.structure_model.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "Model identifiers must not be empty".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(AnalysisError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_image_bytes == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_image_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(AnalysisError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        c.trusted_image_domains = c
            .trusted_image_domains
            .iter()
            .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        if c.trusted_image_domains.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "At least one trusted image domain is required".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.vision_model, "qwen/qwen-2.5-vl-72b");
        assert_eq!(c.structure_model, "moonshot/kimi-vl-a3b-thinking");
        assert_eq!(c.vision_temperature, 0.3);
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.repair_attempts, 0);
        assert_eq!(c.trusted_image_domains, vec!["supabase.co"]);
        assert!(!c.expose_error_details);
    }

    #[test]
    fn temperature_is_clamped() {
        let c = AnalyzerConfig::builder().vision_temperature(5.0).build().unwrap();
        assert_eq!(c.vision_temperature, 2.0);
    }

    #[test]
    fn domains_are_normalised() {
        let c = AnalyzerConfig::builder()
            .trusted_image_domains([" .Supabase.CO ", "", "cdn.example.com"])
            .build()
            .unwrap();
        assert_eq!(c.trusted_image_domains, vec!["supabase.co", "cdn.example.com"]);
    }

    #[test]
    fn empty_domain_list_is_rejected() {
        let err = AnalyzerConfig::builder()
            .trusted_image_domains(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(AnalyzerConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn image_size_cap() {
        assert_eq!(AnalyzerConfig::default().max_image_bytes, 20 * 1024 * 1024);
        assert!(AnalyzerConfig::builder().max_image_bytes(0).build().is_err());
    }

    #[test]
    fn debug_hides_callback() {
        let c = AnalyzerConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        assert!(format!("{c:?}").contains("<dyn AnalysisProgressCallback>"));
    }
}
