//! Progress-callback trait for per-stage analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to be told
//! when each remote call starts and finishes. The CLI uses it to drive a
//! spinner; a server could forward the events to a WebSocket.
//!
//! # Example
//!
//! ```rust
//! use mealscan::{AnalysisProgressCallback, AnalyzerConfig, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl AnalysisProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{stage} started");
//!     }
//! }
//!
//! let config = AnalyzerConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::Stage;
use std::sync::Arc;
use std::time::Duration;

/// Called by the pipeline as each request moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Concurrent requests sharing one config call the same
/// instance from different tasks.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called just before the remote call for `stage` is sent.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when `stage` returned non-empty text.
    ///
    /// # Arguments
    /// * `stage`: which remote call finished
    /// * `elapsed`: wall-clock time of the call, retries included
    /// * `text_len`: byte length of the returned text
    fn on_stage_complete(&self, stage: Stage, elapsed: Duration, text_len: usize) {
        let _ = (stage, elapsed, text_len);
    }

    /// Called once per request with the outcome.
    ///
    /// `error` is `None` on success and the error message otherwise.
    fn on_analysis_complete(&self, error: Option<&str>) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
