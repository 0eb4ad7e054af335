//! HTTP API tests
//!
//! Drive the router in-process with `tower::ServiceExt::oneshot`. Most tests
//! use a colour-based mock classifier so that results are predictable; one
//! test runs a real (randomly initialized) ResNet end to end.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use railsight_classifiers::{
    load_classifier, Architecture, ImageClassifier, ModelConfig, ModelInfo,
};
use railsight_core::{Prediction, Result as CoreResult};
use railsight_server::server::AnalyzeResponse;
use railsight_server::{build_app, AppState, ModelService, ServerConfig};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "railsight-test-boundary";

// ============================================================================
// Mock classifier
// ============================================================================

/// Labels red-dominant images "amtrak train", everything else "british train"
struct ColorClassifier {
    info: ModelInfo,
    call_count: AtomicU32,
}

impl ColorClassifier {
    fn new() -> Self {
        Self {
            info: ModelInfo {
                name: "color".to_string(),
                architecture: "mock".to_string(),
                labels: vec!["amtrak train".to_string(), "british train".to_string()],
                image_size: 32,
                device: "cpu".to_string(),
                weights_path: None,
            },
            call_count: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl ImageClassifier for ColorClassifier {
    fn classify(&self, image: &DynamicImage) -> CoreResult<Prediction> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let rgb = image.to_rgb8();
        let (red, blue) = rgb.pixels().fold((0u64, 0u64), |(r, b), p| {
            (r + p[0] as u64, b + p[2] as u64)
        });
        let probabilities = if red > blue { [0.9, 0.1] } else { [0.2, 0.8] };

        Prediction::from_probabilities(&self.info.labels, &probabilities)
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn test_config(root: &Path) -> ServerConfig {
    ServerConfig {
        static_dir: root.join("static"),
        view_dir: root.join("view"),
        max_upload_bytes: 64 * 1024,
        ..Default::default()
    }
}

fn app_with(config: ServerConfig, service: Arc<ModelService>) -> Router {
    build_app(AppState::new(config, service))
}

fn solid_png(color: [u8; 3]) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(48, 32, Rgb(color)));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn analyze_request(body: Vec<u8>) -> Request<Body> {
    Request::post("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// Split "<label> with probability <p>"
fn parse_result(result: &str) -> (String, f32) {
    let (label, probability) = result
        .rsplit_once(" with probability ")
        .unwrap_or_else(|| panic!("unexpected result format: {}", result));
    (label.to_string(), probability.parse().unwrap())
}

// ============================================================================
// Pages and static files
// ============================================================================

#[tokio::test]
async fn test_index_from_view_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("view")).unwrap();
    std::fs::write(
        dir.path().join("view/index.html"),
        "<html><body>trains</body></html>",
    )
    .unwrap();

    let app = app_with(test_config(dir.path()), Arc::new(ModelService::new()));
    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<html><body>trains</body></html>");
}

#[tokio::test]
async fn test_index_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(test_config(dir.path()), Arc::new(ModelService::new()));

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("<form"));
    assert!(html.contains("/analyze"));
}

#[tokio::test]
async fn test_static_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("static/css")).unwrap();
    std::fs::write(dir.path().join("static/css/style.css"), "body { margin: 0; }").unwrap();

    let app = app_with(test_config(dir.path()), Arc::new(ModelService::new()));

    let (status, body) = send(&app, get("/static/css/style.css")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"body { margin: 0; }");

    let (status, _) = send(&app, get("/static/missing.js")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(test_config(dir.path()), Arc::new(ModelService::new()));

    let response = app
        .clone()
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );

    let preflight = app
        .clone()
        .oneshot(
            Request::options("/analyze")
                .header(header::ORIGIN, "https://example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-requested-with")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(preflight.status(), StatusCode::OK);

    let allowed = preflight.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_lowercase();
    assert!(allowed.contains("x-requested-with"));
    assert!(allowed.contains("content-type"));
}

// ============================================================================
// Readiness
// ============================================================================

#[tokio::test]
async fn test_ready_transitions() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ModelService::new());
    let app = app_with(test_config(dir.path()), Arc::clone(&service));

    let (status, body) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send_json(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "loading");

    let (status, body) =
        send_json(&app, analyze_request(multipart_body("file", &solid_png([255, 0, 0])))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "model_unavailable");

    service.publish(Arc::new(ColorClassifier::new()));

    let (status, body) = send_json(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["model"]["name"], "color");
    assert_eq!(body["model"]["labels"][1], "british train");
}

#[tokio::test]
async fn test_ready_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ModelService::new());
    service.fail("artifact error: GET gs://trains/model.safetensors returned 404");
    let app = app_with(test_config(dir.path()), service);

    let (status, body) = send_json(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "failed");
    assert!(body["error"].as_str().unwrap().contains("404"));

    let (status, body) =
        send_json(&app, analyze_request(multipart_body("file", &solid_png([0, 0, 255])))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("model failed to load"));
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(test_config(dir.path()), Arc::new(ModelService::new()));

    let (status, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Analyze
// ============================================================================

#[tokio::test]
async fn test_analyze_valid_image() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = Arc::new(ColorClassifier::new());
    let service = Arc::new(ModelService::with_classifier(classifier.clone()));
    let app = app_with(test_config(dir.path()), service);

    let (status, body) =
        send(&app, analyze_request(multipart_body("file", &solid_png([220, 30, 30])))).await;
    assert_eq!(status, StatusCode::OK);

    let response: AnalyzeResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.result, "amtrak train with probability 0.9");
    assert_eq!(classifier.call_count(), 1);
}

#[tokio::test]
async fn test_analyze_skips_other_fields() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ModelService::with_classifier(Arc::new(ColorClassifier::new())));
    let app = app_with(test_config(dir.path()), service);

    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"comment\"\r\n\r\nseen at the station\r\n"
    )
    .into_bytes();
    body.extend(multipart_body("file", &solid_png([10, 10, 200])));

    let (status, body) = send_json(&app, analyze_request(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "british train with probability 0.8");
}

#[tokio::test]
async fn test_analyze_non_image_keeps_serving() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = Arc::new(ColorClassifier::new());
    let service = Arc::new(ModelService::with_classifier(classifier.clone()));
    let app = app_with(test_config(dir.path()), service);

    let (status, body) =
        send_json(&app, analyze_request(multipart_body("file", b"%PDF-1.4 not an image"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["type"], "invalid_image");

    let (status, _) =
        send(&app, analyze_request(multipart_body("file", &solid_png([255, 0, 0])))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(classifier.call_count(), 1);
}

#[tokio::test]
async fn test_analyze_missing_file_field() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ModelService::with_classifier(Arc::new(ColorClassifier::new())));
    let app = app_with(test_config(dir.path()), service);

    let (status, body) =
        send_json(&app, analyze_request(multipart_body("image", &solid_png([255, 0, 0])))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("'file'"));
}

#[tokio::test]
async fn test_analyze_requires_multipart() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ModelService::with_classifier(Arc::new(ColorClassifier::new())));
    let app = app_with(test_config(dir.path()), service);

    let request = Request::post("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"file": "train.jpg"}"#))
        .unwrap();

    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_analyze_oversized_upload() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ModelService::with_classifier(Arc::new(ColorClassifier::new())));
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..test_config(dir.path())
    };
    let app = app_with(config, service);

    let (status, _) =
        send(&app, analyze_request(multipart_body("file", &vec![0u8; 8 * 1024]))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = Arc::new(ColorClassifier::new());
    let service = Arc::new(ModelService::with_classifier(classifier.clone()));
    let app = app_with(test_config(dir.path()), service);

    let mut handles = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        let (color, expected) = if i % 2 == 0 {
            ([240, 20, 20], "amtrak train")
        } else {
            ([20, 20, 240], "british train")
        };

        handles.push(tokio::spawn(async move {
            let (status, body) =
                send_json(&app, analyze_request(multipart_body("file", &solid_png(color)))).await;
            assert_eq!(status, StatusCode::OK);
            let (label, _) = parse_result(body["result"].as_str().unwrap());
            assert_eq!(label, expected);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(classifier.call_count(), 16);
}

#[tokio::test]
async fn test_analyze_with_resnet() {
    let dir = tempfile::tempdir().unwrap();
    let weights = dir.path().join("model.safetensors");
    let config = ModelConfig {
        architecture: Architecture::Resnet18,
        image_size: 64,
        ..Default::default()
    };

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    config.architecture.build(config.labels.len(), vb).unwrap();
    varmap.save(&weights).unwrap();

    let classifier = load_classifier(&config, &weights).unwrap();
    let service = Arc::new(ModelService::with_classifier(classifier));
    let app = app_with(test_config(dir.path()), service);

    let (status, body) =
        send_json(&app, analyze_request(multipart_body("file", &solid_png([90, 120, 200])))).await;
    assert_eq!(status, StatusCode::OK);

    let (label, probability) = parse_result(body["result"].as_str().unwrap());
    assert!(config.labels.contains(&label));
    assert!((0.0..=1.0).contains(&probability));
}
