//! HTTP surface: `POST /api/analyze` and `GET /health`.
//!
//! Request body:
//!
//! ```json
//! { "imageUrl": "https://…supabase.co/…/dish.jpg", "mode": "dish" }
//! { "imageUrls": ["https://…/shelf1.jpg", "https://…/shelf2.jpg"], "mode": "fridge" }
//! ```
//!
//! Responses: `200` with the mode's JSON record, `400 {"error": …}` for a
//! request rejected before any model call, `500 {"error": "Failed to analyze
//! image"}` for everything else. The `details` field on a 500 is only filled
//! when [`crate::AnalyzerConfig::expose_error_details`] is set.

use crate::analyze::Analyzer;
use crate::error::AnalysisError;
use crate::mode::AnalysisMode;
use crate::pipeline::request::AnalysisRequest;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info_span;

/// Generic message for every 500.
pub const GENERIC_FAILURE: &str = "Failed to analyze image";

#[derive(Clone)]
struct AppState {
    analyzer: Arc<Analyzer>,
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBody {
    pub image_url: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub mode: Option<String>,
}

impl AnalyzeBody {
    /// Resolve into a request; `imageUrls` wins when both fields are given.
    pub fn into_request(self) -> Result<AnalysisRequest, AnalysisError> {
        let missing = || AnalysisError::invalid("Missing imageUrl or mode");

        let mode_text = self.mode.filter(|m| !m.trim().is_empty()).ok_or_else(missing)?;
        let images = match (self.image_urls, self.image_url) {
            (Some(list), _) if !list.is_empty() => list,
            (_, Some(single)) if !single.trim().is_empty() => vec![single],
            _ => return Err(missing()),
        };
        let mode: AnalysisMode = mode_text
            .parse()
            .map_err(|e: crate::mode::UnknownMode| AnalysisError::invalid(e.to_string()))?;
        Ok(AnalysisRequest::new(images, mode))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// An [`AnalysisError`] on its way out as an HTTP response.
pub struct ApiError {
    error: AnalysisError,
    expose_details: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = if self.error.is_client_error() {
            let reason = match self.error {
                AnalysisError::InvalidRequest { reason } => reason,
                other => other.to_string(),
            };
            (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: reason,
                    details: None,
                },
            )
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: GENERIC_FAILURE.to_string(),
                    details: self.expose_details.then(|| self.error.to_string()),
                },
            )
        };
        (status, Json(body)).into_response()
    }
}

/// Build the router around a shared analyzer.
pub fn router(analyzer: Arc<Analyzer>) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
        let uri: String = request.uri().to_string();
        info_span!("http_request", method = ?request.method(), uri)
    });

    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/health", get(health))
        .layer(trace_layer)
        .with_state(AppState { analyzer })
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(analyzer: Arc<Analyzer>, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(analyzer)).await
}

async fn health() -> &'static str {
    "ok"
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<crate::analysis::StructuredAnalysis>, ApiError> {
    let expose_details = state.analyzer.config().expose_error_details;
    let api_error = |error| ApiError {
        error,
        expose_details,
    };

    let Json(body) = body.map_err(|rejection| {
        api_error(AnalysisError::invalid(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    })?;
    let request = body.into_request().map_err(api_error)?;
    let output = state.analyzer.analyze(&request).await.map_err(api_error)?;
    Ok(Json(output.analysis))
}
