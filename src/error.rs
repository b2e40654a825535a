//! Error types for the mealscan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AnalysisError`]: **Fatal**: the request cannot produce a validated
//!   record (bad image reference, empty model reply, unparseable JSON, schema
//!   violation). Returned as `Err(AnalysisError)` from
//!   [`crate::analyze::Analyzer::analyze`].
//!
//! * [`PersistenceError`]: **Non-fatal**: the record was validated but could
//!   not be stored. It is logged and reflected in
//!   [`crate::analyze::AnalysisStats::persisted`]; the caller still receives
//!   the validated record.
//!
//! Every fatal error maps to a stable [`ErrorKind`] so tracing and metrics can
//! tell failures apart even though users only ever see one generic message.

use std::fmt;
use thiserror::Error;

/// Which remote call a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Multimodal description of the image(s).
    Vision,
    /// Text-only coercion of the description into JSON.
    Structuring,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vision => f.write_str("vision"),
            Stage::Structuring => f.write_str("structuring"),
        }
    }
}

/// Stable, low-cardinality label for an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    UpstreamEmptyResponse,
    UpstreamTimeout,
    UpstreamFailed,
    ImageFetchFailed,
    MalformedOutput,
    SchemaViolation,
    Configuration,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::UpstreamEmptyResponse => "upstream_empty_response",
            ErrorKind::UpstreamTimeout => "upstream_timeout",
            ErrorKind::UpstreamFailed => "upstream_failed",
            ErrorKind::ImageFetchFailed => "image_fetch_failed",
            ErrorKind::MalformedOutput => "malformed_output",
            ErrorKind::SchemaViolation => "schema_violation",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All fatal errors returned by the mealscan library.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Request errors ────────────────────────────────────────────────────
    /// Missing, malformed or untrusted image reference, or unknown mode.
    /// Raised before any remote call is made.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The model service answered but produced no usable text.
    #[error("The {stage} model returned an empty response")]
    UpstreamEmptyResponse { stage: Stage },

    /// The model call did not finish within the configured timeout.
    #[error("The {stage} model call timed out after {secs}s")]
    UpstreamTimeout { stage: Stage, secs: u64 },

    /// Transport or API error from the model service.
    #[error("The {stage} model call failed: {message}")]
    UpstreamFailed { stage: Stage, message: String },

    /// The vision client wants inline image bytes and the download failed.
    #[error("Failed to fetch image '{url}': {reason}")]
    ImageFetchFailed { url: String, reason: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The structuring output is not syntactically valid JSON.
    ///
    /// `excerpt` holds the offending text, truncated for diagnostics.
    #[error("Structuring output is not valid JSON: {detail}\nOutput began with: {excerpt:?}")]
    MalformedOutput { detail: String, excerpt: String },

    /// The JSON parsed but violates the mode's schema.
    ///
    /// `path`/`constraint` describe the first violation in document order;
    /// `total` counts every violation found.
    #[error("Schema violation at {path}: {constraint}{}", more_suffix(.total))]
    SchemaViolation {
        path: String,
        constraint: String,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The vision client declared it cannot accept images.
    #[error("Model '{model}' does not accept image input")]
    UnsupportedImageTransport { model: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn more_suffix(total: &usize) -> String {
    if *total > 1 {
        format!(" (and {} more)", total - 1)
    } else {
        String::new()
    }
}

impl AnalysisError {
    /// Shorthand for [`AnalysisError::InvalidRequest`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            AnalysisError::UpstreamEmptyResponse { .. } => ErrorKind::UpstreamEmptyResponse,
            AnalysisError::UpstreamTimeout { .. } => ErrorKind::UpstreamTimeout,
            AnalysisError::UpstreamFailed { .. } => ErrorKind::UpstreamFailed,
            AnalysisError::ImageFetchFailed { .. } => ErrorKind::ImageFetchFailed,
            AnalysisError::MalformedOutput { .. } => ErrorKind::MalformedOutput,
            AnalysisError::SchemaViolation { .. } => ErrorKind::SchemaViolation,
            AnalysisError::ProviderNotConfigured { .. }
            | AnalysisError::UnsupportedImageTransport { .. }
            | AnalysisError::InvalidConfig(_) => ErrorKind::Configuration,
            AnalysisError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// `true` when the caller is at fault (HTTP 400-class).
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalysisError::InvalidRequest { .. })
    }

    /// `true` for failures worth retrying when retries are enabled.
    ///
    /// Empty responses are deliberately excluded: the service answered, and
    /// asking again only changes the output and the bill.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::UpstreamTimeout { .. } | AnalysisError::UpstreamFailed { .. }
        )
    }
}

/// A non-fatal failure to store a validated record.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PersistenceError {
    /// The store rejected or failed the write.
    #[error("Failed to persist analysis: {detail}")]
    WriteFailed { detail: String },

    /// The store did not answer in time.
    #[error("Persisting analysis timed out after {secs}s")]
    Timeout { secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_display_single() {
        let e = AnalysisError::SchemaViolation {
            path: "$.data.dish.category".into(),
            constraint: "must be one of [\"main\"]".into(),
            total: 1,
        };
        let msg = e.to_string();
        assert!(msg.contains("$.data.dish.category"), "got: {msg}");
        assert!(!msg.contains("more"), "got: {msg}");
    }

    #[test]
    fn schema_violation_display_counts_others() {
        let e = AnalysisError::SchemaViolation {
            path: "$.status".into(),
            constraint: "missing required field".into(),
            total: 4,
        };
        assert!(e.to_string().contains("(and 3 more)"));
    }

    #[test]
    fn timeout_display_names_stage() {
        let e = AnalysisError::UpstreamTimeout {
            stage: Stage::Vision,
            secs: 60,
        };
        assert!(e.to_string().contains("vision"));
        assert!(e.to_string().contains("60s"));
        assert_eq!(e.kind(), ErrorKind::UpstreamTimeout);
    }

    #[test]
    fn only_invalid_request_is_client_error() {
        assert!(AnalysisError::invalid("missing mode").is_client_error());
        assert!(!AnalysisError::UpstreamEmptyResponse {
            stage: Stage::Structuring
        }
        .is_client_error());
        assert!(!AnalysisError::InvalidConfig("x".into()).is_client_error());
    }

    #[test]
    fn empty_response_is_not_retryable() {
        assert!(!AnalysisError::UpstreamEmptyResponse {
            stage: Stage::Vision
        }
        .is_retryable());
        assert!(AnalysisError::UpstreamFailed {
            stage: Stage::Vision,
            message: "503".into()
        }
        .is_retryable());
    }

    #[test]
    fn kind_labels_are_snake_case() {
        assert_eq!(ErrorKind::MalformedOutput.as_str(), "malformed_output");
        assert_eq!(
            AnalysisError::ProviderNotConfigured {
                provider: "openrouter".into(),
                hint: String::new()
            }
            .kind(),
            ErrorKind::Configuration
        );
    }
}
