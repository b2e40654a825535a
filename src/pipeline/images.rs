//! Image preparation for the vision request.
//!
//! With [`ImageTransport::HostedUrl`] the references go out untouched and the
//! model service fetches them. With [`ImageTransport::InlineData`] the core
//! downloads each image from the trusted store and embeds it as base64.
//!
//! Inline downloads follow a redirect only when its target is itself on a
//! trusted domain, and stop reading once the body exceeds
//! [`AnalyzerConfig::max_image_bytes`].

use crate::client::{ImageInput, ImageTransport};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::pipeline::request::is_trusted_host;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Redirect hops followed before an inline download is abandoned.
pub const MAX_REDIRECTS: usize = 5;

/// Turn validated image references into request parts for `transport`.
///
/// `TextOnly` clients are refused before this point by the vision stage.
pub async fn prepare_images(
    refs: &[String],
    transport: ImageTransport,
    config: &AnalyzerConfig,
) -> Result<Vec<ImageInput>, AnalysisError> {
    match transport {
        ImageTransport::HostedUrl => Ok(refs.iter().cloned().map(ImageInput::Url).collect()),
        ImageTransport::InlineData => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.image_fetch_timeout_secs))
                .redirect(trusted_redirects(config.trusted_image_domains.clone()))
                .build()
                .map_err(|e| AnalysisError::Internal(format!("http client: {e}")))?;
            let mut out = Vec::with_capacity(refs.len());
            for url in refs {
                out.push(fetch_inline(&client, url, config).await?);
            }
            Ok(out)
        }
        ImageTransport::TextOnly => Err(AnalysisError::Internal(
            "text-only client reached image preparation".into(),
        )),
    }
}

/// Follow a hop only when it stays on `http(s)` and a trusted host.
///
/// A refused hop stops the client, which hands back the 3xx response.
fn trusted_redirects(trusted_domains: Vec<String>) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let url = attempt.url();
        let trusted = matches!(url.scheme(), "http" | "https")
            && url
                .host_str()
                .is_some_and(|host| is_trusted_host(host, &trusted_domains));
        if trusted {
            attempt.follow()
        } else {
            warn!("Refusing redirect to untrusted location {}", url);
            attempt.stop()
        }
    })
}

async fn fetch_inline(
    client: &reqwest::Client,
    url: &str,
    config: &AnalyzerConfig,
) -> Result<ImageInput, AnalysisError> {
    info!("Fetching image for inline transport: {}", url);
    let max_bytes = config.max_image_bytes;
    let fetch_failed = |reason: String| AnalysisError::ImageFetchFailed {
        url: url.to_string(),
        reason,
    };
    let transport_failed = |e: reqwest::Error| {
        if e.is_timeout() {
            fetch_failed(format!("timed out after {}s", config.image_fetch_timeout_secs))
        } else {
            fetch_failed(e.to_string())
        }
    };

    let mut response = client.get(url).send().await.map_err(transport_failed)?;

    let status = response.status();
    if status.is_redirection() {
        let target = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("<no location>");
        return Err(fetch_failed(format!(
            "redirect to untrusted location {target}"
        )));
    }
    if !status.is_success() {
        return Err(fetch_failed(format!("HTTP {status}")));
    }
    if let Some(len) = response.content_length().filter(|len| *len > max_bytes) {
        return Err(fetch_failed(format!(
            "image is {len} bytes, limit is {max_bytes}"
        )));
    }

    let header_mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase());

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(transport_failed)? {
        if (bytes.len() + chunk.len()) as u64 > max_bytes {
            return Err(fetch_failed(format!("image exceeds the {max_bytes} byte limit")));
        }
        bytes.extend_from_slice(&chunk);
    }
    if bytes.is_empty() {
        return Err(fetch_failed("empty body".into()));
    }

    let mime_type = resolve_mime(header_mime.as_deref(), url)
        .ok_or_else(|| fetch_failed("response is not an image".into()))?;

    debug!("Fetched {} bytes of {}", bytes.len(), mime_type);
    Ok(ImageInput::Inline {
        mime_type,
        data: STANDARD.encode(&bytes),
    })
}

/// Pick the MIME type from the `Content-Type` header, falling back to the
/// URL's extension when the store answers with a generic type.
fn resolve_mime(header: Option<&str>, url: &str) -> Option<String> {
    match header {
        Some(h) if h.starts_with("image/") => return Some(h.to_string()),
        Some(h) if h != "application/octet-stream" && h != "binary/octet-stream" => return None,
        _ => {}
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hosted_urls_pass_through() {
        let refs = vec!["https://a.supabase.co/1.jpg".to_string(), "https://a.supabase.co/2.jpg".to_string()];
        let images = prepare_images(&refs, ImageTransport::HostedUrl, &AnalyzerConfig::default())
            .await
            .unwrap();
        assert_eq!(
            images,
            vec![
                ImageInput::Url(refs[0].clone()),
                ImageInput::Url(refs[1].clone())
            ]
        );
    }

    #[test]
    fn mime_from_header() {
        assert_eq!(resolve_mime(Some("image/webp"), "https://x/a"), Some("image/webp".into()));
        assert_eq!(resolve_mime(Some("text/html"), "https://x/a.jpg"), None);
    }

    #[test]
    fn mime_from_extension_when_generic() {
        assert_eq!(
            resolve_mime(Some("application/octet-stream"), "https://x/a/photo.JPG?token=1"),
            Some("image/jpeg".into())
        );
        assert_eq!(resolve_mime(None, "https://x/a/photo.png"), Some("image/png".into()));
        assert_eq!(resolve_mime(None, "https://x/a/photo"), None);
    }
}
