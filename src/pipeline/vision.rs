//! Vision stage: image(s) + mode → free-text description.

use crate::client::{Completion, ImageTransport, ModelClient, ModelRequest};
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Stage};
use crate::mode::AnalysisMode;
use crate::pipeline::{images, llm};
use crate::prompts;
use tracing::{debug, instrument};

/// The references the vision model actually sees.
///
/// Fridge mode sends every image in one request; the other modes describe a
/// single subject and send only the first.
pub fn select_images(images: &[String], mode: AnalysisMode) -> &[String] {
    if mode.accepts_multiple_images() {
        images
    } else {
        &images[..images.len().min(1)]
    }
}

/// Describe `images` for `mode` in one request to the vision client.
///
/// The request carries the mode's vision prompt as its text part and one
/// image part per selected reference. Fails with `UpstreamEmptyResponse`
/// when the model returns no text.
#[instrument(
    name = "vision",
    skip_all,
    fields(
        operation = "extract_description",
        model = %client.model_id(),
        mode = %mode,
        image_count = select_images(images, mode).len(),
    )
)]
pub async fn extract_description(
    client: &dyn ModelClient,
    images: &[String],
    mode: AnalysisMode,
    config: &AnalyzerConfig,
) -> Result<Completion, AnalysisError> {
    let transport = client.image_transport();
    if transport == ImageTransport::TextOnly {
        return Err(AnalysisError::UnsupportedImageTransport {
            model: client.model_id().to_string(),
        });
    }

    let selected = select_images(images, mode);
    if selected.is_empty() {
        return Err(AnalysisError::invalid("Missing imageUrl or mode"));
    }
    debug!("Sending {} image(s) via {}", selected.len(), transport);

    let parts = images::prepare_images(selected, transport, config).await?;
    let request = ModelRequest {
        prompt: prompts::vision_prompt(mode).to_string(),
        images: parts,
        temperature: config.vision_temperature,
        max_tokens: config.max_tokens,
    };

    llm::call_model(client, Stage::Vision, request, config).await
}
