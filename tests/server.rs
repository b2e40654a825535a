//! HTTP surface tests: the router driven in-process with `tower::ServiceExt`.

#![cfg(feature = "server")]

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::*;
use mealscan::server::{router, GENERIC_FAILURE};
use mealscan::AnalyzerConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn post(app: axum::Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn app(structuring_reply: &str, expose_details: bool) -> (axum::Router, Arc<ScriptedClient>) {
    let vision = ScriptedClient::new("vision-model", [Reply::text("a plate of food")]);
    let structuring = ScriptedClient::new("structure-model", [Reply::text(structuring_reply)]);
    let config = AnalyzerConfig::builder()
        .expose_error_details(expose_details)
        .build()
        .unwrap();
    let analyzer = analyzer_with(&vision, &structuring, config);
    (router(Arc::new(analyzer)), vision)
}

#[tokio::test]
async fn returns_the_validated_record() {
    let (app, _) = app(DISH, false);
    let body = json!({ "imageUrl": DISH_URL, "mode": "dish" }).to_string();

    let (status, value) = post(app, &body).await;
    assert_eq!(status, StatusCode::OK);
    let expected: Value = serde_json::from_str(DISH).unwrap();
    assert!(json_eq(&value, &expected), "{value}");
}

#[tokio::test]
async fn accepts_an_image_list_for_fridge() {
    let (app, vision) = app(FRIDGE, false);
    let body = json!({ "imageUrls": [SHELF_1, SHELF_2], "mode": "fridge" }).to_string();

    let (status, value) = post(app, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["data"]["suggestedRecipes"].as_array().unwrap().len(), 3);
    assert_eq!(vision.requests()[0].images.len(), 2);
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let (app, vision) = app(DISH, false);
    let (status, value) = post(app, &json!({ "mode": "dish" }).to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value, json!({ "error": "Missing imageUrl or mode" }));
    assert_eq!(vision.call_count(), 0);
}

#[tokio::test]
async fn untrusted_host_is_a_bad_request() {
    let (app, vision) = app(DISH, false);
    let body = json!({ "imageUrl": "https://example.com/food.jpg", "mode": "dish" }).to_string();

    let (status, value) = post(app, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        value["error"],
        "imageUrl must be from a trusted domain (supabase.co)"
    );
    assert_eq!(vision.call_count(), 0);
}

#[tokio::test]
async fn unknown_mode_is_a_bad_request() {
    let (app, _) = app(DISH, false);
    let body = json!({ "imageUrl": DISH_URL, "mode": "brunch" }).to_string();

    let (status, value) = post(app, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].as_str().unwrap().contains("brunch"));
}

#[tokio::test]
async fn unparseable_body_is_a_bad_request() {
    let (app, _) = app(DISH, false);
    let (status, value) = post(app, "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn pipeline_failures_are_generic_500s() {
    let (app, _) = app("Sorry, I cannot help with that.", false);
    let body = json!({ "imageUrl": DISH_URL, "mode": "dish" }).to_string();

    let (status, value) = post(app, &body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value, json!({ "error": GENERIC_FAILURE }));
}

#[tokio::test]
async fn details_are_exposed_only_when_configured() {
    let (app, _) = app("Sorry, I cannot help with that.", true);
    let body = json!({ "imageUrl": DISH_URL, "mode": "dish" }).to_string();

    let (status, value) = post(app, &body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value["error"], GENERIC_FAILURE);
    assert!(value["details"]
        .as_str()
        .unwrap()
        .contains("not valid JSON"));
}

#[tokio::test]
async fn health_check() {
    let (app, _) = app(DISH, false);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}
