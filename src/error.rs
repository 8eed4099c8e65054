use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::landmarks::PoseLandmark;

/// Errors surfaced by posture analysis.
///
/// `MissingLandmark` indicates a contract violation by the caller: the
/// evaluator was invoked with an incomplete landmark set. A frame with no
/// detected person is not an error and never reaches this type; the
/// request handler answers it with fixed feedback instead.
#[derive(Debug, thiserror::Error)]
pub enum PostureError {
    #[error("failed to decode image: {0}")]
    DecodeFailure(String),

    #[error("missing landmark: {0}")]
    MissingLandmark(PoseLandmark),

    #[error("pose detection failed: {0}")]
    Detection(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<image::ImageError> for PostureError {
    fn from(err: image::ImageError) -> Self {
        PostureError::DecodeFailure(err.to_string())
    }
}

#[cfg(feature = "onnx")]
impl From<ort::Error> for PostureError {
    fn from(err: ort::Error) -> Self {
        PostureError::Detection(err.to_string())
    }
}

impl IntoResponse for PostureError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        tracing::error!(error = %detail, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": detail })),
        )
            .into_response()
    }
}
