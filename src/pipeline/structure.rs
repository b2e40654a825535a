//! Structuring stage: description + schema → text intended to be JSON.
//!
//! Always decoded at [`STRUCTURING_TEMPERATURE`]: this call reformats, it
//! should not invent.

use crate::client::{Completion, ModelClient, ModelRequest};
use crate::config::{AnalyzerConfig, STRUCTURING_TEMPERATURE};
use crate::error::{AnalysisError, Stage};
use crate::mode::AnalysisMode;
use crate::prompts;
use crate::pipeline::llm;
use tracing::instrument;

/// Ask the structuring client to turn `description` into JSON for `mode`.
#[instrument(
    name = "structuring",
    skip_all,
    fields(operation = "structure", model = %client.model_id(), mode = %mode)
)]
pub async fn structure(
    client: &dyn ModelClient,
    description: &str,
    mode: AnalysisMode,
    schema_description: &str,
    config: &AnalyzerConfig,
) -> Result<Completion, AnalysisError> {
    let prompt = prompts::structuring_prompt(mode, description, schema_description);
    send(client, prompt, config).await
}

/// Re-ask after a rejected answer, quoting it and the failure.
#[instrument(
    name = "structuring",
    skip_all,
    fields(operation = "repair", model = %client.model_id(), mode = %mode)
)]
pub async fn repair(
    client: &dyn ModelClient,
    description: &str,
    mode: AnalysisMode,
    schema_description: &str,
    rejected_output: &str,
    failure: &AnalysisError,
    config: &AnalyzerConfig,
) -> Result<Completion, AnalysisError> {
    let original = prompts::structuring_prompt(mode, description, schema_description);
    let prompt = prompts::repair_prompt(&original, rejected_output, &failure.to_string());
    send(client, prompt, config).await
}

async fn send(
    client: &dyn ModelClient,
    prompt: String,
    config: &AnalyzerConfig,
) -> Result<Completion, AnalysisError> {
    let request = ModelRequest {
        prompt,
        images: Vec::new(),
        temperature: STRUCTURING_TEMPERATURE,
        max_tokens: config.max_tokens,
    };
    llm::call_model(client, Stage::Structuring, request, config).await
}
