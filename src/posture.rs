//! Rule-based posture checks over one frame of landmarks.
//!
//! Each call is a pure function of its inputs: no state carries over
//! between frames, and feedback strings are appended in the order the
//! rules are checked.

use crate::error::PostureError;
use crate::landmarks::{Landmark, LandmarkSet, PoseLandmark};

/// Neck angles below this many degrees count as bent forward.
const NECK_ANGLE_MIN_DEG: f32 = 150.0;

/// Which posture rule set to apply.
///
/// Parsing deliberately treats every value other than `"squat"` as
/// [`Mode::Sitting`], matching the service's historical behavior for
/// unrecognized mode strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Squat,
    Sitting,
}

impl Mode {
    pub fn from_param(param: &str) -> Self {
        match param {
            "squat" => Mode::Squat,
            _ => Mode::Sitting,
        }
    }
}

/// Run the posture rules for `mode` over one frame of landmarks.
///
/// Returns the feedback strings for every rule that fired; an empty list
/// means no issues were detected. Fails with
/// [`PostureError::MissingLandmark`] if the selected rule set needs a
/// landmark the frame does not carry.
pub fn evaluate(landmarks: &LandmarkSet, mode: Mode) -> Result<Vec<String>, PostureError> {
    let mut feedback = Vec::new();

    match mode {
        Mode::Squat => {
            let knee = landmarks.require(PoseLandmark::LeftKnee)?;
            let ankle = landmarks.require(PoseLandmark::LeftAnkle)?;

            // Camera faces the subject's left side, so a knee further
            // along x than the ankle has traveled past the toes.
            if knee.x > ankle.x {
                feedback.push("Knees over toes detected!".to_string());
            }
        }
        Mode::Sitting => {
            let ear = landmarks.require(PoseLandmark::LeftEar)?;
            let shoulder = landmarks.require(PoseLandmark::LeftShoulder)?;
            let hip = landmarks.require(PoseLandmark::LeftHip)?;

            let neck_angle = angle_deg(ear, shoulder, hip);
            if neck_angle < NECK_ANGLE_MIN_DEG {
                feedback.push(format!("Neck bent forward ({}°)", neck_angle as i32));
            }
        }
    }

    Ok(feedback)
}

/// Unsigned angle at vertex `b` between rays `b -> a` and `b -> c`.
///
/// Works on the 2-D projection (z ignored) and folds the result into
/// `[0, 180]` degrees, so it is invariant to which ray comes first and to
/// uniform rotation of all three points about the vertex.
pub fn angle_deg(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        360.0 - degrees
    } else {
        degrees
    }
}
