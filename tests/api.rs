//! End-to-end tests for the analysis API, driving the router with a stub
//! pose detector so no model file or ONNX runtime is needed.

use std::sync::Arc;

use axum_test::TestServer;
use image::RgbImage;
use serde_json::{json, Value};

use posture_coach::{
    create_router, AppState, Landmark, LandmarkSet, PoseDetector, PoseLandmark, PostureError,
};

/// Detector that returns a canned result for every frame.
struct StubDetector {
    result: Option<LandmarkSet>,
}

impl StubDetector {
    fn person(entries: &[(PoseLandmark, f32, f32)]) -> Self {
        let result = entries
            .iter()
            .map(|&(name, x, y)| (name, Landmark::new(x, y)))
            .collect();
        Self {
            result: Some(result),
        }
    }

    fn nobody() -> Self {
        Self { result: None }
    }
}

impl PoseDetector for StubDetector {
    fn detect(&self, _frame: &RgbImage) -> Result<Option<LandmarkSet>, PostureError> {
        Ok(self.result.clone())
    }
}

fn server(detector: StubDetector) -> TestServer {
    let state = Arc::new(AppState::new(Arc::new(detector)));
    TestServer::new(create_router(state)).expect("failed to start test server")
}

fn png_bytes() -> Vec<u8> {
    let frame = RgbImage::from_pixel(4, 4, image::Rgb([12, 80, 160]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(frame)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("failed to encode test frame");
    buf.into_inner()
}

const BOUNDARY: &str = "posture-test-boundary";

/// Build a multipart/form-data body with optional text fields and one
/// image file part.
fn multipart_body(fields: &[(&str, &str)], file: &[u8]) -> (Vec<u8>, String) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"frame.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    (body, content_type)
}

fn squatting_person() -> StubDetector {
    StubDetector::person(&[
        (PoseLandmark::LeftKnee, 0.6, 0.5),
        (PoseLandmark::LeftAnkle, 0.4, 0.9),
        (PoseLandmark::LeftEar, 0.5, 0.3),
        (PoseLandmark::LeftShoulder, 0.5, 0.5),
        (PoseLandmark::LeftHip, 0.5, 0.9),
    ])
}

fn slouching_person() -> StubDetector {
    StubDetector::person(&[
        (PoseLandmark::LeftKnee, 0.3, 0.5),
        (PoseLandmark::LeftAnkle, 0.4, 0.9),
        (PoseLandmark::LeftEar, 0.7, 0.35),
        (PoseLandmark::LeftShoulder, 0.5, 0.5),
        (PoseLandmark::LeftHip, 0.5, 0.9),
    ])
}

#[tokio::test]
async fn health_check_reports_running() {
    let server = server(StubDetector::nobody());
    let response = server.get("/").await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "status": "API is running" })
    );
}

#[tokio::test]
async fn squat_mode_flags_knees_over_toes() {
    let server = server(squatting_person());
    let (body, content_type) = multipart_body(&[], &png_bytes());

    let response = server
        .post("/analyze")
        .add_query_param("mode", "squat")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "feedback": ["Knees over toes detected!"] })
    );
}

#[tokio::test]
async fn mode_defaults_to_squat() {
    let server = server(squatting_person());
    let (body, content_type) = multipart_body(&[], &png_bytes());

    let response = server
        .post("/analyze")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "feedback": ["Knees over toes detected!"] })
    );
}

#[tokio::test]
async fn squat_mode_passes_clean_form() {
    let server = server(slouching_person());
    let (body, content_type) = multipart_body(&[], &png_bytes());

    let response = server
        .post("/analyze")
        .add_query_param("mode", "squat")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "feedback": [] }));
}

#[tokio::test]
async fn sitting_mode_flags_bent_neck() {
    let server = server(slouching_person());
    let (body, content_type) = multipart_body(&[], &png_bytes());

    let response = server
        .post("/analyze")
        .add_query_param("mode", "sitting")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "feedback": ["Neck bent forward (126°)"] })
    );
}

#[tokio::test]
async fn sitting_mode_passes_upright_posture() {
    let server = server(squatting_person());
    let (body, content_type) = multipart_body(&[], &png_bytes());

    let response = server
        .post("/analyze")
        .add_query_param("mode", "sitting")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "feedback": [] }));
}

#[tokio::test]
async fn unrecognized_mode_falls_through_to_sitting() {
    let server = server(slouching_person());
    let (body, content_type) = multipart_body(&[], &png_bytes());

    let response = server
        .post("/analyze")
        .add_query_param("mode", "handstand")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "feedback": ["Neck bent forward (126°)"] })
    );
}

#[tokio::test]
async fn mode_accepted_as_form_field() {
    let server = server(slouching_person());
    let (body, content_type) = multipart_body(&[("mode", "sitting")], &png_bytes());

    let response = server
        .post("/analyze")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "feedback": ["Neck bent forward (126°)"] })
    );
}

#[tokio::test]
async fn query_mode_wins_over_form_mode() {
    let server = server(squatting_person());
    let (body, content_type) = multipart_body(&[("mode", "sitting")], &png_bytes());

    let response = server
        .post("/analyze")
        .add_query_param("mode", "squat")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "feedback": ["Knees over toes detected!"] })
    );
}

#[tokio::test]
async fn no_person_short_circuits_rule_evaluation() {
    let server = server(StubDetector::nobody());
    let (body, content_type) = multipart_body(&[], &png_bytes());

    for mode in ["squat", "sitting", "handstand"] {
        let response = server
            .post("/analyze")
            .add_query_param("mode", mode)
            .add_header("content-type", &content_type)
            .bytes(body.clone().into())
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "feedback": ["No person detected"] })
        );
    }
}

#[tokio::test]
async fn malformed_image_answers_internal_error() {
    let server = server(squatting_person());
    let (body, content_type) = multipart_body(&[], b"definitely not an image");

    let response = server
        .post("/analyze")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_internal_server_error();
    let detail = response.json::<Value>();
    assert!(detail["detail"].as_str().unwrap().contains("decode"));
}

#[tokio::test]
async fn incomplete_landmark_set_answers_internal_error() {
    // A detector that violates the contract by omitting LEFT_ANKLE.
    let server = server(StubDetector::person(&[(PoseLandmark::LeftKnee, 0.6, 0.5)]));
    let (body, content_type) = multipart_body(&[], &png_bytes());

    let response = server
        .post("/analyze")
        .add_query_param("mode", "squat")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_internal_server_error();
    let detail = response.json::<Value>();
    assert!(detail["detail"].as_str().unwrap().contains("LEFT_ANKLE"));
}

#[tokio::test]
async fn missing_file_field_answers_internal_error() {
    let server = server(squatting_person());
    // Only a mode field, no file part.
    let mut body = Vec::new();
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"mode\"\r\n\r\nsquat\r\n--{BOUNDARY}--\r\n")
            .as_bytes(),
    );
    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");

    let response = server
        .post("/analyze")
        .add_header("content-type", &content_type)
        .bytes(body.into())
        .await;

    response.assert_status_internal_server_error();
}
