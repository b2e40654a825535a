//! The analysis entry point: one request in, one validated record out.
//!
//! [`Analyzer`] holds the two injected model clients, an optional store and
//! the config. It keeps no per-request state, so one instance serves any
//! number of concurrent requests.
//!
//! ## Request lifecycle
//!
//! ```text
//! Received ─▶ VisionDone ─▶ Structured ─▶ Sanitized ─▶ Validated
//!    │            │             │             │
//!    ▼            ▼             ▼             ▼
//! Rejected   VisionFailed  StructuringFailed  ParseFailed / SchemaFailed
//! ```
//!
//! The state a request ends in is logged with its outcome.
//!
//! The first unrecovered failure ends the request. With `repair_attempts > 0`
//! a parse or schema failure loops back to the structuring stage instead.
//! Persistence runs only after `Validated` and cannot change the outcome.

use crate::analysis::StructuredAnalysis;
use crate::client::{ModelClient, ProviderClient};
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, PersistenceError, Stage};
use crate::mode::AnalysisMode;
use crate::pipeline::request::AnalysisRequest;
use crate::pipeline::{sanitize, structure, validate, vision};
use crate::schema;
use crate::store::{AnalysisRecord, AnalysisStore};
use chrono::Utc;
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    /// Refused at intake, before any remote call.
    Rejected,
    VisionDone,
    Structured,
    Sanitized,
    Validated,
    VisionFailed,
    StructuringFailed,
    ParseFailed,
    SchemaFailed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            PipelineState::Received
                | PipelineState::VisionDone
                | PipelineState::Structured
                | PipelineState::Sanitized
        )
    }

    /// The failure state for an error raised while in `self`.
    fn failed(self, err: &AnalysisError) -> PipelineState {
        match err {
            AnalysisError::InvalidRequest { .. } => PipelineState::Rejected,
            AnalysisError::MalformedOutput { .. } => PipelineState::ParseFailed,
            AnalysisError::SchemaViolation { .. } => PipelineState::SchemaFailed,
            _ if self == PipelineState::Received => PipelineState::VisionFailed,
            _ => PipelineState::StructuringFailed,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Timing and usage for one successful request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub vision_ms: u64,
    /// Structuring time, repair rounds included.
    pub structuring_ms: u64,
    pub total_ms: u64,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub repair_attempts_used: u32,
    /// `true` only when a store is configured and the write succeeded.
    pub persisted: bool,
}

/// A validated record plus how it was obtained.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub analysis: StructuredAnalysis,
    pub stats: AnalysisStats,
}

/// Runs the vision → structuring → sanitize → validate pipeline.
#[derive(Clone)]
pub struct Analyzer {
    vision: Arc<dyn ModelClient>,
    structuring: Arc<dyn ModelClient>,
    store: Option<Arc<dyn AnalysisStore>>,
    config: AnalyzerConfig,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("vision", &self.vision.model_id())
            .field("structuring", &self.structuring.model_id())
            .field("store", &self.store.as_ref().map(|_| "<dyn AnalysisStore>"))
            .field("config", &self.config)
            .finish()
    }
}

impl Analyzer {
    /// Build from explicitly constructed clients.
    pub fn new(
        vision: Arc<dyn ModelClient>,
        structuring: Arc<dyn ModelClient>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            vision,
            structuring,
            store: None,
            config,
        }
    }

    /// Attach a store; validated records are saved to it best-effort.
    pub fn with_store(mut self, store: Arc<dyn AnalysisStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build both clients from `config` through `edgequake-llm`.
    ///
    /// Both stages share one provider; the models differ.
    pub fn from_config(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        let provider_name = resolve_provider_name(config.provider_name.as_deref())?;
        info!(
            "Using provider '{}' (vision: {}, structuring: {})",
            provider_name, config.vision_model, config.structure_model
        );
        let vision_provider = create_provider(&provider_name, &config.vision_model)?;
        let structure_provider = create_provider(&provider_name, &config.structure_model)?;

        let vision = ProviderClient::new(vision_provider, config.vision_model.clone())
            .with_image_transport(config.image_transport);
        let structuring = ProviderClient::new(structure_provider, config.structure_model.clone());
        Ok(Self::new(Arc::new(vision), Arc::new(structuring), config))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// `vision+structuring` model identifiers, as stored with records.
    pub fn model_used(&self) -> String {
        format!("{}+{}", self.vision.model_id(), self.structuring.model_id())
    }

    /// Analyse one request.
    ///
    /// # Errors
    /// `InvalidRequest` before any remote call when an image reference is
    /// missing, malformed or untrusted. Otherwise the first unrecovered
    /// failure of the vision, structuring, parse or schema step. A failed
    /// store write is never an error.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, AnalysisError> {
        let mode = request.mode();
        let first_image = request.first_image().unwrap_or("<none>");
        info!("Analysing {} image(s) in {} mode", request.images().len(), mode);

        let mut state = PipelineState::Received;
        let result = self.run(request, &mut state).await;
        debug_assert!(state.is_terminal(), "request ended in {state}");

        if let Some(cb) = &self.config.progress_callback {
            let message = result.as_ref().err().map(|e| e.to_string());
            cb.on_analysis_complete(message.as_deref());
        }

        match &result {
            Ok(out) => info!(
                state = %state,
                "Analysis complete: {} ({}ms, {} tokens)",
                out.analysis.summary(),
                out.stats.total_ms,
                out.stats.input_tokens + out.stats.output_tokens
            ),
            Err(e) => error!(
                kind = %e.kind(),
                state = %state,
                mode = %mode,
                image = %first_image,
                "Analysis failed: {}", e
            ),
        }
        result
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        state: &mut PipelineState,
    ) -> Result<AnalysisOutput, AnalysisError> {
        let total_start = Instant::now();
        let mode = request.mode();
        let mut stats = AnalysisStats::default();

        request
            .validate(&self.config.trusted_image_domains)
            .map_err(|e| fail(state, e))?;

        // ── Vision ───────────────────────────────────────────────────────
        self.stage_start(Stage::Vision);
        let vision_start = Instant::now();
        let description =
            vision::extract_description(self.vision.as_ref(), request.images(), mode, &self.config)
                .await
                .map_err(|e| fail(state, e))?;
        stats.vision_ms = vision_start.elapsed().as_millis() as u64;
        stats.input_tokens += description.input_tokens;
        stats.output_tokens += description.output_tokens;
        self.stage_complete(Stage::Vision, vision_start.elapsed(), description.text.len());
        advance(state, PipelineState::VisionDone);

        // ── Structuring ──────────────────────────────────────────────────
        let schema_description = schema::schema_description(mode);
        self.stage_start(Stage::Structuring);
        let structuring_start = Instant::now();
        let mut raw = structure::structure(
            self.structuring.as_ref(),
            &description.text,
            mode,
            &schema_description,
            &self.config,
        )
        .await
        .map_err(|e| fail(state, e))?;

        let analysis = loop {
            stats.input_tokens += raw.input_tokens;
            stats.output_tokens += raw.output_tokens;
            advance(state, PipelineState::Structured);

            // ── Sanitize + validate ──────────────────────────────────────
            let candidate = sanitize::sanitize(&raw.text);
            advance(state, PipelineState::Sanitized);

            match validate::validate(&candidate, mode) {
                Ok(analysis) => break analysis,
                Err(e) if stats.repair_attempts_used < self.config.repair_attempts => {
                    stats.repair_attempts_used += 1;
                    warn!(
                        kind = %e.kind(),
                        mode = %mode,
                        "Structuring output rejected, repair {}/{}: {}",
                        stats.repair_attempts_used,
                        self.config.repair_attempts,
                        e
                    );
                    raw = structure::repair(
                        self.structuring.as_ref(),
                        &description.text,
                        mode,
                        &schema_description,
                        &candidate,
                        &e,
                        &self.config,
                    )
                    .await
                    .map_err(|e| fail(state, e))?;
                }
                Err(e) => return Err(fail(state, e)),
            }
        };
        stats.structuring_ms = structuring_start.elapsed().as_millis() as u64;
        self.stage_complete(Stage::Structuring, structuring_start.elapsed(), raw.text.len());
        advance(state, PipelineState::Validated);

        // ── Persistence (best effort) ────────────────────────────────────
        stats.persisted = match self.persist(request, &analysis).await {
            Some(Ok(())) => true,
            Some(Err(e)) => {
                warn!(mode = %mode, image = ?request.first_image(), "{}", e);
                false
            }
            None => false,
        };

        stats.total_ms = total_start.elapsed().as_millis() as u64;
        Ok(AnalysisOutput { analysis, stats })
    }

    /// `None` when no store is configured.
    async fn persist(
        &self,
        request: &AnalysisRequest,
        analysis: &StructuredAnalysis,
    ) -> Option<Result<(), PersistenceError>> {
        let store = self.store.as_ref()?;
        let record = AnalysisRecord {
            image_urls: request.images().to_vec(),
            mode: request.mode(),
            analysis: analysis.clone(),
            model_used: self.model_used(),
            created_at: Utc::now(),
        };
        let secs = self.config.api_timeout_secs;
        let outcome = match tokio::time::timeout(Duration::from_secs(secs), store.save(&record)).await {
            Ok(result) => result,
            Err(_) => Err(PersistenceError::Timeout { secs }),
        };
        Some(outcome)
    }

    fn stage_start(&self, stage: Stage) {
        if let Some(cb) = &self.config.progress_callback {
            cb.on_stage_start(stage);
        }
    }

    fn stage_complete(&self, stage: Stage, elapsed: Duration, text_len: usize) {
        if let Some(cb) = &self.config.progress_callback {
            cb.on_stage_complete(stage, elapsed, text_len);
        }
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    debug!("pipeline: {} → {}", state, next);
    *state = next;
}

fn fail(state: &mut PipelineState, err: AnalysisError) -> AnalysisError {
    let next = state.failed(&err);
    advance(state, next);
    err
}

// ── Provider resolution ──────────────────────────────────────────────────

/// Instantiate a named provider for one model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, AnalysisError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AnalysisError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Pick the provider, from most to least specific:
///
/// 1. the explicit name from the config or CLI;
/// 2. `EDGEQUAKE_LLM_PROVIDER`;
/// 3. `openrouter` when `OPENROUTER_API_KEY` is set (the default model ids
///    are OpenRouter ids);
/// 4. `openai` when `OPENAI_API_KEY` is set.
fn resolve_provider_name(explicit: Option<&str>) -> Result<String, AnalysisError> {
    let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

    if let Some(name) = explicit.filter(|n| !n.trim().is_empty()) {
        return Ok(name.trim().to_string());
    }
    if let Some(name) = env("EDGEQUAKE_LLM_PROVIDER") {
        return Ok(name);
    }
    if env("OPENROUTER_API_KEY").is_some() {
        return Ok("openrouter".to_string());
    }
    if env("OPENAI_API_KEY").is_some() {
        return Ok("openai".to_string());
    }
    Err(AnalysisError::ProviderNotConfigured {
        provider: "auto".to_string(),
        hint: "No LLM provider could be detected from the environment.\n\
               Set OPENROUTER_API_KEY (or OPENAI_API_KEY), or pass --provider."
            .to_string(),
    })
}

/// Convenience: analyse one image reference in `mode` with `analyzer`.
pub async fn analyze_image(
    analyzer: &Analyzer,
    image_url: impl Into<String>,
    mode: AnalysisMode,
) -> Result<StructuredAnalysis, AnalysisError> {
    let request = AnalysisRequest::single(image_url, mode);
    analyzer.analyze(&request).await.map(|out| out.analysis)
}
