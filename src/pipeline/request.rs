//! Request intake: what the caller asked for, checked before any remote call.
//!
//! Every image reference must be an absolute `http`/`https` URL whose host
//! is one of the trusted storage domains. A rejected request costs nothing;
//! no model is contacted.

use crate::error::AnalysisError;
use crate::mode::AnalysisMode;
use reqwest::Url;

/// One analysis request: image reference(s) plus mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    images: Vec<String>,
    mode: AnalysisMode,
}

impl AnalysisRequest {
    pub fn new<I, S>(images: I, mode: AnalysisMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: images.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// A request for one image.
    pub fn single(image: impl Into<String>, mode: AnalysisMode) -> Self {
        Self::new([image.into()], mode)
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// The first image reference, used in logs and persisted records.
    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Check the request against the trusted domain list.
    ///
    /// All supplied references are checked, including ones the mode will
    /// not send to the vision model.
    pub fn validate(&self, trusted_domains: &[String]) -> Result<(), AnalysisError> {
        if self.images.is_empty() {
            return Err(AnalysisError::invalid("Missing imageUrl or mode"));
        }
        for image in &self.images {
            check_image_ref(image, trusted_domains)?;
        }
        Ok(())
    }
}

fn check_image_ref(image: &str, trusted_domains: &[String]) -> Result<(), AnalysisError> {
    let image = image.trim();
    if image.is_empty() {
        return Err(AnalysisError::invalid("Missing imageUrl or mode"));
    }
    let url = Url::parse(image).map_err(|_| AnalysisError::invalid("Invalid imageUrl format"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AnalysisError::invalid("Invalid imageUrl format"));
    }
    let host = url
        .host_str()
        .ok_or_else(|| AnalysisError::invalid("Invalid imageUrl format"))?;
    if !is_trusted_host(host, trusted_domains) {
        return Err(AnalysisError::invalid(format!(
            "imageUrl must be from a trusted domain ({})",
            trusted_domains.join(", ")
        )));
    }
    Ok(())
}

/// `true` when `host` equals a trusted domain or is a subdomain of one.
///
/// A bare suffix test would also accept `evilsupabase.co`; the label
/// boundary is required.
pub fn is_trusted_host(host: &str, trusted_domains: &[String]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    trusted_domains.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
