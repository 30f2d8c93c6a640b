//! VisionClient against an in-process fake DetectText endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use chrono::{NaiveDateTime, TimeZone, Utc};
use image::{DynamicImage, ImageFormat};
use inspoflow_core::{
    Category, Credentials, PipelineError, RequestSigner, ServiceErrorKind, VisionClient,
};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TARGET: &str = "RekognitionService.DetectText";

#[derive(Clone)]
struct Fake {
    endpoint: Arc<Mutex<String>>,
    status: StatusCode,
    response: &'static str,
    verified: Arc<Mutex<Vec<bool>>>,
}

fn signer() -> RequestSigner {
    RequestSigner::new(
        Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        "us-east-1",
        "rekognition",
    )
}

/// Re-sign what arrived and compare with the client's Authorization header.
fn signature_matches(endpoint: &str, headers: &HeaderMap, body: &[u8]) -> bool {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let (Some(date), Some(target), Some(auth)) = (
        header("x-amz-date"),
        header("x-amz-target"),
        header("authorization"),
    ) else {
        return false;
    };
    let Ok(naive) = NaiveDateTime::parse_from_str(date, "%Y%m%dT%H%M%SZ") else {
        return false;
    };
    let expected = signer()
        .sign("POST", endpoint, target, body.to_vec(), Utc.from_utc_datetime(&naive))
        .expect("fake endpoint signs");
    expected.header("Authorization") == Some(auth)
        && header("content-type") == Some("application/x-amz-json-1.1")
}

async fn detect_text(State(fake): State<Fake>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let endpoint = fake.endpoint.lock().unwrap().clone();
    let ok = headers.get("x-amz-target").and_then(|v| v.to_str().ok()) == Some(TARGET)
        && signature_matches(&endpoint, &headers, &body)
        && serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["Image"]["Bytes"].as_str().map(|s| !s.is_empty()))
            .unwrap_or(false);
    fake.verified.lock().unwrap().push(ok);

    if !ok {
        return (StatusCode::FORBIDDEN, "signature mismatch").into_response();
    }
    (fake.status, fake.response).into_response()
}

async fn spawn(status: StatusCode, response: &'static str) -> (VisionClient, Fake) {
    let fake = Fake {
        endpoint: Arc::new(Mutex::new(String::new())),
        status,
        response,
        verified: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/", post(detect_text))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/", listener.local_addr().unwrap());
    *fake.endpoint.lock().unwrap() = endpoint.clone();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = VisionClient::new(signer(), &endpoint, TARGET)
        .with_bounding_box(64)
        .with_timeout(Duration::from_secs(5));
    (client, fake)
}

fn png_bytes() -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(200, 100)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

const DETECTIONS: &str = r#"{
    "TextDetections": [
        {"DetectedText": "https://21st.dev", "Type": "LINE", "Confidence": 95.0, "Id": 0},
        {"DetectedText": "Get Started", "Type": "LINE", "Confidence": 90.0, "Id": 1},
        {"DetectedText": "Beautiful UI components for React", "Type": "LINE", "Confidence": 88.0, "Id": 2},
        {"DetectedText": "Beautiful", "Type": "WORD", "Confidence": 99.0, "Id": 3, "ParentId": 2}
    ],
    "TextModelVersion": "3.0"
}"#;

#[tokio::test]
async fn test_analyze_signed_round_trip() {
    let (client, fake) = spawn(StatusCode::OK, DETECTIONS).await;

    let result = client.analyze(&png_bytes()).await.unwrap();
    assert_eq!(fake.verified.lock().unwrap().as_slice(), &[true]);
    assert_eq!(result.url.as_deref(), Some("https://21st.dev"));
    assert_eq!(result.title, "Beautiful UI components for React");
    assert_eq!(result.category, Category::Website);
    assert!(!client.status().is_busy());
}

#[tokio::test]
async fn test_detect_text_keeps_provider_order() {
    let (client, _fake) = spawn(StatusCode::OK, DETECTIONS).await;

    let detections = client.detect_text(&png_bytes()).await.unwrap();
    let texts: Vec<&str> = detections.iter().map(|d| d.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "https://21st.dev",
            "Get Started",
            "Beautiful UI components for React",
            "Beautiful"
        ]
    );
}

#[tokio::test]
async fn test_empty_detections() {
    let (client, _fake) = spawn(StatusCode::OK, r#"{"TextDetections": []}"#).await;

    let result = client.analyze(&png_bytes()).await.unwrap();
    assert_eq!(result.url, None);
    assert_eq!(result.summary, "No description available.");
}

#[tokio::test]
async fn test_server_error_is_service_error() {
    let (client, _fake) = spawn(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"__type":"InternalServerError"}"#,
    )
    .await;

    let err = client.analyze(&png_bytes()).await.unwrap_err();
    match &err {
        PipelineError::Service { status, body } => {
            assert_eq!(*status, 500);
            assert!(body.contains("InternalServerError"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::Unavailable));
    assert!(!client.status().is_busy());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (client, _fake) = spawn(StatusCode::OK, "<html>not json</html>").await;

    let err = client.analyze(&png_bytes()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Decode { .. }));
    assert_eq!(
        err.user_message(),
        "Could not understand the AI service response."
    );
}

#[tokio::test]
async fn test_status_channel_reports_busy_during_call() {
    let (client, _fake) = spawn(StatusCode::OK, DETECTIONS).await;
    let mut rx = client.subscribe();

    let watcher = tokio::spawn(async move {
        let mut saw_busy = false;
        while rx.changed().await.is_ok() {
            if rx.borrow().is_busy() {
                saw_busy = true;
            } else if saw_busy {
                return true;
            }
        }
        saw_busy
    });

    client.analyze(&png_bytes()).await.unwrap();
    drop(client);
    assert!(watcher.await.unwrap());
}

#[tokio::test]
async fn test_ingest_saves_then_detects_duplicate() {
    use inspoflow_core::{IngestOutcome, Ingestor, MemoryStore};

    let (client, _fake) = spawn(StatusCode::OK, DETECTIONS).await;
    let store = Arc::new(MemoryStore::new());
    let ingestor = Ingestor::new(client, store.clone(), store.clone());

    let first = ingestor.ingest(&png_bytes()).await.unwrap();
    let IngestOutcome::Saved(item) = first else {
        panic!("expected first ingest to save");
    };
    assert_eq!(item.url.as_deref(), Some("https://21st.dev"));
    assert_eq!(item.tags, vec!["website"]);

    let second = ingestor.ingest(&png_bytes()).await.unwrap();
    assert!(matches!(second, IngestOutcome::Duplicate { .. }));
    assert_eq!(store.items().len(), 1);
    assert_eq!(store.uploaded_files().len(), 1);
}
