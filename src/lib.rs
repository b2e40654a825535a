//! # mealscan
//!
//! Turn food photos into schema-validated JSON using Vision Language Models.
//!
//! Three kinds of photo are understood, one [`AnalysisMode`] each:
//!
//! * **dish**: a plated meal → identity, ingredients, nutrition for one
//!   serving, allergens, health and kid-friendliness, how to make it
//! * **fridge**: one or more shots of a fridge or pantry → inventory with
//!   freshness, balance assessment, exactly three kid-friendly recipes
//! * **recipe**: a cookbook page or recipe card → a verbatim transcription
//!   plus estimated nutrition
//!
//! ## Why two model calls?
//!
//! Multimodal models describe what they see far more reliably than they
//! emit strict JSON. The vision stage asks for a thorough free-text
//! description of exactly the facts the schema needs; a second, cheaper text
//! model then reformats that description into JSON at temperature zero. The
//! output is trusted only after it passes the mode's schema.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image URL(s) + mode
//!  │
//!  ├─ 1. Request    check references against the trusted storage domains
//!  ├─ 2. Vision     one multimodal call → free-text description
//!  ├─ 3. Structure  one text call (t = 0) → text intended to be JSON
//!  ├─ 4. Sanitize   strip code fences and surrounding whitespace
//!  ├─ 5. Validate   parse → schema check → typed record
//!  └─ 6. Persist    best-effort write to an optional store
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mealscan::{AnalysisMode, AnalysisRequest, Analyzer, AnalyzerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENROUTER_API_KEY / OPENAI_API_KEY
//!     let analyzer = Analyzer::from_config(AnalyzerConfig::default())?;
//!     let request = AnalysisRequest::single(
//!         "https://abc.supabase.co/storage/v1/object/public/images/lunch.jpg",
//!         AnalysisMode::Dish,
//!     );
//!     let output = analyzer.analyze(&request).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.analysis)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `mealscan` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | Enables [`server`] and `mealscan serve` (axum + tower-http) |
//!
//! ```toml
//! mealscan = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod analyze;
pub mod client;
pub mod config;
pub mod error;
pub mod mode;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{DishAnalysis, FridgeAnalysis, RecipeAnalysis, StructuredAnalysis};
pub use analyze::{analyze_image, AnalysisOutput, AnalysisStats, Analyzer, PipelineState};
pub use client::{ClientError, Completion, ImageInput, ImageTransport, ModelClient, ModelRequest, ProviderClient};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use error::{AnalysisError, ErrorKind, PersistenceError, Stage};
pub use mode::AnalysisMode;
pub use pipeline::request::AnalysisRequest;
pub use pipeline::sanitize::sanitize;
pub use pipeline::validate::validate;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use store::{AnalysisRecord, AnalysisStore, FileStore, RestStore};
