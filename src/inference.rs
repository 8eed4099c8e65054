//! Pose detection over a decoded RGB frame.
//!
//! The server only depends on the [`PoseDetector`] trait; the ONNX-backed
//! implementation lives behind the `onnx` feature so the rule and HTTP
//! layers build (and test) without a runtime or model file.

use image::RgbImage;

use crate::error::PostureError;
use crate::landmarks::LandmarkSet;

/// A pose-estimation backend.
///
/// `detect` returns `Ok(None)` when no person is found in the frame; that
/// is a valid result, not an error. Implementations must be safe to share
/// across concurrent requests.
pub trait PoseDetector: Send + Sync {
    /// Run pose estimation over one RGB frame.
    fn detect(&self, frame: &RgbImage) -> Result<Option<LandmarkSet>, PostureError>;
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxPoseDetector;

#[cfg(feature = "onnx")]
mod onnx {
    use std::sync::Mutex;

    use image::imageops::FilterType;
    use image::RgbImage;
    use ndarray::Array4;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;

    use crate::error::PostureError;
    use crate::landmarks::{Landmark, LandmarkSet, PoseLandmark, LANDMARK_COUNT};

    /// Pose detector backed by a BlazePose-style ONNX model.
    ///
    /// Expects a model that takes one normalized RGB frame in NCHW layout
    /// and emits 33 landmarks, each row carrying `x, y` (in input pixels),
    /// `z`, and a visibility logit.
    pub struct OnnxPoseDetector {
        // Session::run takes &mut self; requests serialize on the lock.
        session: Mutex<Session>,
        input_name: String,
        input_width: u32,
        input_height: u32,
        min_confidence: f32,
    }

    impl OnnxPoseDetector {
        pub fn new(model_path: &str, min_confidence: f32) -> Result<Self, PostureError> {
            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(model_path)
                .map_err(|e| {
                    PostureError::Detection(format!("failed to load model {model_path}: {e}"))
                })?;

            let input = session
                .inputs
                .first()
                .ok_or_else(|| PostureError::Detection("model has no inputs".into()))?;
            let input_name = input.name.clone();

            let (input_width, input_height) = input_dimensions(input).unwrap_or((256, 256));

            tracing::info!(
                model = model_path,
                input = %input_name,
                width = input_width,
                height = input_height,
                "pose model loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                input_name,
                input_width,
                input_height,
                min_confidence,
            })
        }

        fn preprocess(&self, frame: &RgbImage) -> Array4<f32> {
            let resized = image::imageops::resize(
                frame,
                self.input_width,
                self.input_height,
                FilterType::Triangle,
            );

            let (w, h) = (self.input_width as usize, self.input_height as usize);
            let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
            for (x, y, pixel) in resized.enumerate_pixels() {
                let (x, y) = (x as usize, y as usize);
                tensor[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
                tensor[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
                tensor[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
            }
            tensor
        }
    }

    impl super::PoseDetector for OnnxPoseDetector {
        fn detect(&self, frame: &RgbImage) -> Result<Option<LandmarkSet>, PostureError> {
            let input = self.preprocess(frame);
            let input_tensor = Tensor::from_array(input)?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| PostureError::Internal("detector lock poisoned".into()))?;
            let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

            let (_, value) = outputs
                .iter()
                .next()
                .ok_or_else(|| PostureError::Detection("model produced no outputs".into()))?;
            let raw: ndarray::ArrayViewD<f32> = value.try_extract_array()?;

            let landmarks = self.parse_landmarks(&raw)?;

            // Mirror the upstream detector's behavior: a frame whose
            // landmarks all fall below the confidence threshold counts as
            // "no person detected".
            let mean_visibility = PoseLandmark::ALL
                .iter()
                .filter_map(|&name| landmarks.get(name))
                .map(|l| l.visibility)
                .sum::<f32>()
                / LANDMARK_COUNT as f32;
            if mean_visibility < self.min_confidence {
                return Ok(None);
            }

            Ok(Some(landmarks))
        }
    }

    impl OnnxPoseDetector {
        /// Read landmark rows out of the raw output, accepting either a
        /// `[1, 33, C]` tensor or a flattened `[1, 33 * C]` one.
        fn parse_landmarks(
            &self,
            raw: &ndarray::ArrayViewD<f32>,
        ) -> Result<LandmarkSet, PostureError> {
            let flat: Vec<f32> = raw.iter().copied().collect();
            let channels = match raw.ndim() {
                3 => raw.shape()[2],
                2 if raw.shape()[1] % LANDMARK_COUNT == 0 => raw.shape()[1] / LANDMARK_COUNT,
                _ => {
                    return Err(PostureError::Detection(format!(
                        "unexpected output shape {:?}",
                        raw.shape()
                    )))
                }
            };
            if channels < 2 || flat.len() < LANDMARK_COUNT * channels {
                return Err(PostureError::Detection(format!(
                    "unexpected output shape {:?}",
                    raw.shape()
                )));
            }

            let (w, h) = (self.input_width as f32, self.input_height as f32);
            let mut landmarks = LandmarkSet::new();
            for name in PoseLandmark::ALL {
                let row = &flat[name.index() * channels..(name.index() + 1) * channels];
                let z = if channels > 2 { row[2] } else { 0.0 };
                let visibility = if channels > 3 { sigmoid(row[3]) } else { 1.0 };
                landmarks.insert(
                    name,
                    Landmark {
                        x: row[0] / w,
                        y: row[1] / h,
                        z,
                        visibility,
                    },
                );
            }
            Ok(landmarks)
        }
    }

    fn input_dimensions(input: &ort::session::Input) -> Option<(u32, u32)> {
        let dims = input.input_type.tensor_shape()?;
        if dims.len() >= 4 {
            let h = u32::try_from(dims[2]).ok()?;
            let w = u32::try_from(dims[3]).ok()?;
            Some((w, h))
        } else {
            None
        }
    }

    fn sigmoid(logit: f32) -> f32 {
        1.0 / (1.0 + (-logit).exp())
    }
}
