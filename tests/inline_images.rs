//! Inline image transport against a local image host.
//!
//! An axum server on 127.0.0.1 stands in for the storage bucket; the trusted
//! domain list is narrowed to `127.0.0.1` so requests pass intake.

#![cfg(feature = "server")]

mod common;

use axum::http::{header, StatusCode};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::*;
use mealscan::pipeline::images::prepare_images;
use mealscan::{
    AnalysisError, AnalysisMode, AnalysisRequest, AnalyzerConfig, ImageInput, ImageTransport,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";

struct Host {
    addr: SocketAddr,
    secret_hits: Arc<AtomicUsize>,
}

impl Host {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn spawn_host() -> Host {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let secret_hits = Arc::new(AtomicUsize::new(0));

    let escape_target = format!("http://localhost:{}/secret.png", addr.port());
    let hits = secret_hits.clone();
    let app = Router::new()
        .route("/dish.png", get(|| async { ([(header::CONTENT_TYPE, "image/png")], PNG) }))
        .route(
            "/bucket/photo.jpg",
            get(|| async { ([(header::CONTENT_TYPE, "application/octet-stream")], PNG) }),
        )
        .route("/missing.png", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/empty.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], Vec::<u8>::new()) }),
        )
        .route(
            "/page.html",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html></html>") }),
        )
        .route(
            "/large.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0u8; 4096]) }),
        )
        .route("/hop.png", get(|| async { Redirect::temporary("/dish.png") }))
        .route(
            "/escape.png",
            get(move || {
                let target = escape_target.clone();
                async move { Redirect::temporary(&target) }
            }),
        )
        .route(
            "/secret.png",
            get(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                async { ([(header::CONTENT_TYPE, "image/png")], "SECRET-BYTES") }
            }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Host { addr, secret_hits }
}

fn local_config() -> AnalyzerConfig {
    AnalyzerConfig::builder()
        .trusted_image_domains(["127.0.0.1"])
        .image_fetch_timeout_secs(5)
        .image_transport(ImageTransport::InlineData)
        .build()
        .unwrap()
}

async fn fetch(url: String, config: &AnalyzerConfig) -> Result<Vec<ImageInput>, AnalysisError> {
    prepare_images(&[url], ImageTransport::InlineData, config).await
}

fn fetch_failure(result: Result<Vec<ImageInput>, AnalysisError>) -> String {
    match result {
        Err(AnalysisError::ImageFetchFailed { reason, .. }) => reason,
        other => panic!("expected ImageFetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn downloads_and_encodes_the_image() {
    let host = spawn_host().await;
    let images = fetch(host.url("/dish.png"), &local_config()).await.unwrap();

    assert_eq!(
        images,
        [ImageInput::Inline {
            mime_type: "image/png".into(),
            data: STANDARD.encode(PNG),
        }]
    );
}

#[tokio::test]
async fn generic_content_type_falls_back_to_extension() {
    let host = spawn_host().await;
    let images = fetch(host.url("/bucket/photo.jpg"), &local_config()).await.unwrap();

    assert!(matches!(&images[0], ImageInput::Inline { mime_type, .. } if mime_type == "image/jpeg"));
}

#[tokio::test]
async fn non_success_status_fails() {
    let host = spawn_host().await;
    let reason = fetch_failure(fetch(host.url("/missing.png"), &local_config()).await);
    assert!(reason.contains("404"), "{reason}");
}

#[tokio::test]
async fn empty_body_fails() {
    let host = spawn_host().await;
    let reason = fetch_failure(fetch(host.url("/empty.png"), &local_config()).await);
    assert_eq!(reason, "empty body");
}

#[tokio::test]
async fn non_image_content_type_fails() {
    let host = spawn_host().await;
    let reason = fetch_failure(fetch(host.url("/page.html"), &local_config()).await);
    assert_eq!(reason, "response is not an image");
}

#[tokio::test]
async fn oversized_image_is_refused() {
    let host = spawn_host().await;
    let config = AnalyzerConfig::builder()
        .trusted_image_domains(["127.0.0.1"])
        .max_image_bytes(1024)
        .build()
        .unwrap();

    let reason = fetch_failure(fetch(host.url("/large.png"), &config).await);
    assert!(reason.contains("1024"), "{reason}");
    assert!(fetch(host.url("/dish.png"), &config).await.is_ok());
}

#[tokio::test]
async fn redirect_within_trusted_host_is_followed() {
    let host = spawn_host().await;
    let images = fetch(host.url("/hop.png"), &local_config()).await.unwrap();
    assert!(matches!(&images[0], ImageInput::Inline { data, .. } if *data == STANDARD.encode(PNG)));
}

#[tokio::test]
async fn redirect_to_untrusted_host_is_refused() {
    let host = spawn_host().await;
    let reason = fetch_failure(fetch(host.url("/escape.png"), &local_config()).await);

    assert!(reason.contains("untrusted"), "{reason}");
    assert!(reason.contains("localhost"), "{reason}");
    assert_eq!(host.secret_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn analyzer_sends_inline_data_to_the_vision_client() {
    let host = spawn_host().await;
    let vision = ScriptedClient::with_transport(
        "vision-model",
        ImageTransport::InlineData,
        [Reply::text("A plate of grilled chicken.")],
    );
    let structuring = ScriptedClient::new("structure-model", [Reply::text(DISH)]);
    let analyzer = analyzer_with(&vision, &structuring, local_config());

    analyzer
        .analyze(&AnalysisRequest::single(host.url("/dish.png"), AnalysisMode::Dish))
        .await
        .unwrap();

    let sent = &vision.requests()[0].images;
    assert!(matches!(&sent[0], ImageInput::Inline { mime_type, .. } if mime_type == "image/png"));
}

#[tokio::test]
async fn analyzer_fails_on_untrusted_redirect_without_structuring() {
    let host = spawn_host().await;
    let vision = ScriptedClient::with_transport("vision-model", ImageTransport::InlineData, []);
    let structuring = ScriptedClient::new("structure-model", []);
    let analyzer = analyzer_with(&vision, &structuring, local_config());

    let err = expect_err(
        analyzer
            .analyze(&AnalysisRequest::single(host.url("/escape.png"), AnalysisMode::Dish))
            .await,
    );
    assert!(matches!(err, AnalysisError::ImageFetchFailed { .. }), "{err:?}");
    assert_eq!(vision.call_count(), 0);
    assert_eq!(structuring.call_count(), 0);
    assert_eq!(host.secret_hits.load(Ordering::SeqCst), 0);
}
