//! HTTP surface for posture analysis.
//!
//! # Routes
//!
//! - `GET /` - health check
//! - `POST /analyze` - multipart image upload + `mode` parameter, returns
//!   `{"feedback": [..]}`
//!
//! CORS is wide open (all origins, methods, and headers): the service is
//! meant to be called straight from browser frontends.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::PostureError;
use crate::inference::PoseDetector;
use crate::posture::{self, Mode};

/// Application state shared across handlers.
///
/// The detector is constructed once at startup and injected here; request
/// handlers never build their own.
pub struct AppState<D: PoseDetector + 'static> {
    pub detector: Arc<D>,
}

impl<D: PoseDetector + 'static> AppState<D> {
    pub fn new(detector: Arc<D>) -> Self {
        Self { detector }
    }
}

/// Create the application router.
pub fn create_router<D: PoseDetector + 'static>(state: Arc<AppState<D>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health_check))
        .route("/analyze", post(analyze::<D>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub mode: Option<String>,
}

/// GET / - health check
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "API is running",
    })
}

/// POST /analyze - run posture analysis over an uploaded image.
///
/// The body is multipart/form-data with one binary image field; `mode`
/// may come as a query parameter or a form field (query wins). Anything
/// going wrong past this point answers 500 with a JSON detail string.
async fn analyze<D: PoseDetector + 'static>(
    State(state): State<Arc<AppState<D>>>,
    Query(params): Query<AnalyzeParams>,
    mut multipart: Multipart,
) -> Result<Json<FeedbackResponse>, PostureError> {
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut form_mode: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PostureError::Internal(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("mode") => {
                form_mode = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| PostureError::Internal(e.to_string()))?,
                );
            }
            _ => {
                image_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| PostureError::Internal(e.to_string()))?
                        .to_vec(),
                );
            }
        }
    }

    let image_bytes = image_bytes
        .ok_or_else(|| PostureError::Internal("no image file in request body".into()))?;

    let mode = params
        .mode
        .or(form_mode)
        .map(|m| Mode::from_param(&m))
        .unwrap_or_default();

    let frame = image::load_from_memory(&image_bytes)?.to_rgb8();

    let Some(landmarks) = state.detector.detect(&frame)? else {
        tracing::debug!("no person detected in frame");
        return Ok(Json(FeedbackResponse {
            feedback: vec!["No person detected".to_string()],
        }));
    };

    let feedback = posture::evaluate(&landmarks, mode)?;
    tracing::debug!(?mode, issues = feedback.len(), "analysis complete");

    Ok(Json(FeedbackResponse { feedback }))
}
