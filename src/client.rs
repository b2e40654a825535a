//! Remote model client seam.
//!
//! The pipeline never talks to a model vendor directly. It holds two
//! [`ModelClient`]s (vision and structuring), constructed once at start-up
//! and injected into [`crate::analyze::Analyzer`]. Tests substitute scripted
//! fakes; production wraps an `edgequake-llm` provider in [`ProviderClient`].
//!
//! ## Image transport
//!
//! Vendors disagree on how images reach a multimodal model: some fetch a
//! hosted URL themselves, others only accept inline base64 data. The client
//! declares which it wants through [`ModelClient::image_transport`] and the
//! vision stage prepares images accordingly, or refuses before dispatch.

use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::fmt;
use std::sync::Arc;

/// How a client accepts images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageTransport {
    /// Hosted URLs are forwarded unchanged; the model service fetches them.
    #[default]
    HostedUrl,
    /// The core downloads each image and sends it base64-encoded.
    InlineData,
    /// The model cannot accept images at all.
    TextOnly,
}

impl fmt::Display for ImageTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageTransport::HostedUrl => f.write_str("hosted-url"),
            ImageTransport::InlineData => f.write_str("inline-data"),
            ImageTransport::TextOnly => f.write_str("text-only"),
        }
    }
}

/// One image attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageInput {
    Url(String),
    Inline { mime_type: String, data: String },
}

impl fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageInput::Url(url) => f.debug_tuple("Url").field(url).finish(),
            ImageInput::Inline { mime_type, data } => f
                .debug_struct("Inline")
                .field("mime_type", mime_type)
                .field("data", &format_args!("<{} bytes base64>", data.len()))
                .finish(),
        }
    }
}

/// A single-message request: one text part plus zero or more images.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub prompt: String,
    pub images: Vec<ImageInput>,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// What the model sent back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Generated text; may be empty.
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Transport or API failure reported by a client.
///
/// Stage-agnostic; the pipeline wraps it into
/// [`crate::error::AnalysisError::UpstreamFailed`] with the stage attached.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ClientError(pub String);

/// A remote model the pipeline can call.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier logged in spans and stored with persisted records.
    fn model_id(&self) -> &str;

    /// How this client accepts images.
    fn image_transport(&self) -> ImageTransport {
        ImageTransport::HostedUrl
    }

    /// Send one request and wait for the reply.
    async fn complete(&self, request: ModelRequest) -> Result<Completion, ClientError>;
}

// ── edgequake-llm adapter ────────────────────────────────────────────────

/// [`ModelClient`] backed by an `edgequake-llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    model: String,
    transport: ImageTransport,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            transport: ImageTransport::default(),
        }
    }

    pub fn with_image_transport(mut self, transport: ImageTransport) -> Self {
        self.transport = transport;
        self
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("model", &self.model)
            .field("transport", &self.transport)
            .finish()
    }
}

fn to_image_data(image: &ImageInput) -> ImageData {
    match image {
        ImageInput::Url(url) => ImageData::from_url(url.as_str()),
        ImageInput::Inline { mime_type, data } => ImageData::new(data.clone(), mime_type.as_str()),
    }
}

fn build_messages(request: &ModelRequest) -> Vec<ChatMessage> {
    if request.images.is_empty() {
        vec![ChatMessage::user(request.prompt.as_str())]
    } else {
        let images = request.images.iter().map(to_image_data).collect();
        vec![ChatMessage::user_with_images(request.prompt.as_str(), images)]
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn image_transport(&self) -> ImageTransport {
        self.transport
    }

    async fn complete(&self, request: ModelRequest) -> Result<Completion, ClientError> {
        let messages = build_messages(&request);
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ClientError(e.to_string()))?;

        Ok(Completion {
            text: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_only_request_has_one_plain_message() {
        let request = ModelRequest {
            prompt: "describe".into(),
            images: vec![],
            temperature: 0.0,
            max_tokens: 16,
        };
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn inline_image_keeps_mime_type() {
        let data = to_image_data(&ImageInput::Inline {
            mime_type: "image/jpeg".into(),
            data: "AAAA".into(),
        });
        assert_eq!(data.mime_type, "image/jpeg");
        assert_eq!(data.data, "AAAA");
    }

    #[test]
    fn inline_debug_hides_payload() {
        let image = ImageInput::Inline {
            mime_type: "image/png".into(),
            data: "x".repeat(1000),
        };
        let rendered = format!("{image:?}");
        assert!(rendered.contains("1000 bytes"));
        assert!(!rendered.contains("xxxx"));
    }

    #[test]
    fn default_transport_is_hosted_url() {
        assert_eq!(ImageTransport::default(), ImageTransport::HostedUrl);
        assert_eq!(ImageTransport::InlineData.to_string(), "inline-data");
    }
}
