//! Body landmark types for the 33-point pose model.
//!
//! Landmark coordinates are normalized to the source frame: `x` grows
//! rightward, `y` grows downward, both in `[0, 1]`. `z` and `visibility`
//! are carried through from the detector but the posture rules only read
//! the 2-D projection.

use crate::error::PostureError;

/// The closed set of landmark names produced by the pose model.
///
/// Discriminants match the model's output ordering, so a landmark's
/// position in the raw output tensor is `landmark as usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

/// Number of landmarks in the model output.
pub const LANDMARK_COUNT: usize = 33;

impl PoseLandmark {
    /// All landmarks in model output order.
    pub const ALL: [PoseLandmark; LANDMARK_COUNT] = [
        PoseLandmark::Nose,
        PoseLandmark::LeftEyeInner,
        PoseLandmark::LeftEye,
        PoseLandmark::LeftEyeOuter,
        PoseLandmark::RightEyeInner,
        PoseLandmark::RightEye,
        PoseLandmark::RightEyeOuter,
        PoseLandmark::LeftEar,
        PoseLandmark::RightEar,
        PoseLandmark::MouthLeft,
        PoseLandmark::MouthRight,
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        PoseLandmark::LeftElbow,
        PoseLandmark::RightElbow,
        PoseLandmark::LeftWrist,
        PoseLandmark::RightWrist,
        PoseLandmark::LeftPinky,
        PoseLandmark::RightPinky,
        PoseLandmark::LeftIndex,
        PoseLandmark::RightIndex,
        PoseLandmark::LeftThumb,
        PoseLandmark::RightThumb,
        PoseLandmark::LeftHip,
        PoseLandmark::RightHip,
        PoseLandmark::LeftKnee,
        PoseLandmark::RightKnee,
        PoseLandmark::LeftAnkle,
        PoseLandmark::RightAnkle,
        PoseLandmark::LeftHeel,
        PoseLandmark::RightHeel,
        PoseLandmark::LeftFootIndex,
        PoseLandmark::RightFootIndex,
    ];

    /// Position of this landmark in the model output tensor.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical upper-snake name, matching the pose model's naming.
    pub fn as_str(self) -> &'static str {
        match self {
            PoseLandmark::Nose => "NOSE",
            PoseLandmark::LeftEyeInner => "LEFT_EYE_INNER",
            PoseLandmark::LeftEye => "LEFT_EYE",
            PoseLandmark::LeftEyeOuter => "LEFT_EYE_OUTER",
            PoseLandmark::RightEyeInner => "RIGHT_EYE_INNER",
            PoseLandmark::RightEye => "RIGHT_EYE",
            PoseLandmark::RightEyeOuter => "RIGHT_EYE_OUTER",
            PoseLandmark::LeftEar => "LEFT_EAR",
            PoseLandmark::RightEar => "RIGHT_EAR",
            PoseLandmark::MouthLeft => "MOUTH_LEFT",
            PoseLandmark::MouthRight => "MOUTH_RIGHT",
            PoseLandmark::LeftShoulder => "LEFT_SHOULDER",
            PoseLandmark::RightShoulder => "RIGHT_SHOULDER",
            PoseLandmark::LeftElbow => "LEFT_ELBOW",
            PoseLandmark::RightElbow => "RIGHT_ELBOW",
            PoseLandmark::LeftWrist => "LEFT_WRIST",
            PoseLandmark::RightWrist => "RIGHT_WRIST",
            PoseLandmark::LeftPinky => "LEFT_PINKY",
            PoseLandmark::RightPinky => "RIGHT_PINKY",
            PoseLandmark::LeftIndex => "LEFT_INDEX",
            PoseLandmark::RightIndex => "RIGHT_INDEX",
            PoseLandmark::LeftThumb => "LEFT_THUMB",
            PoseLandmark::RightThumb => "RIGHT_THUMB",
            PoseLandmark::LeftHip => "LEFT_HIP",
            PoseLandmark::RightHip => "RIGHT_HIP",
            PoseLandmark::LeftKnee => "LEFT_KNEE",
            PoseLandmark::RightKnee => "RIGHT_KNEE",
            PoseLandmark::LeftAnkle => "LEFT_ANKLE",
            PoseLandmark::RightAnkle => "RIGHT_ANKLE",
            PoseLandmark::LeftHeel => "LEFT_HEEL",
            PoseLandmark::RightHeel => "RIGHT_HEEL",
            PoseLandmark::LeftFootIndex => "LEFT_FOOT_INDEX",
            PoseLandmark::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }
}

impl std::fmt::Display for PoseLandmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected body keypoint with normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }
}

/// One frame's detection result: a mapping from landmark name to landmark.
///
/// A full detection carries all 33 entries, but the set is allowed to be
/// partial so callers can distinguish "detector never produced this
/// landmark" from "coordinate happens to be zero".
#[derive(Debug, Clone)]
pub struct LandmarkSet {
    entries: [Option<Landmark>; LANDMARK_COUNT],
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self {
            entries: [None; LANDMARK_COUNT],
        }
    }
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: PoseLandmark, landmark: Landmark) {
        self.entries[name.index()] = Some(landmark);
    }

    pub fn get(&self, name: PoseLandmark) -> Option<&Landmark> {
        self.entries[name.index()].as_ref()
    }

    /// Fetch a landmark the caller cannot do without.
    ///
    /// Fails with [`PostureError::MissingLandmark`] rather than substituting
    /// a default coordinate.
    pub fn require(&self, name: PoseLandmark) -> Result<&Landmark, PostureError> {
        self.get(name).ok_or(PostureError::MissingLandmark(name))
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_none())
    }
}

impl FromIterator<(PoseLandmark, Landmark)> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = (PoseLandmark, Landmark)>>(iter: I) -> Self {
        let mut set = LandmarkSet::new();
        for (name, landmark) in iter {
            set.insert(name, landmark);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_match_model_order() {
        for (i, name) in PoseLandmark::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
        assert_eq!(PoseLandmark::LeftKnee.index(), 25);
        assert_eq!(PoseLandmark::LeftAnkle.index(), 27);
    }

    #[test]
    fn require_reports_missing_name() {
        let mut set = LandmarkSet::new();
        set.insert(PoseLandmark::LeftKnee, Landmark::new(0.5, 0.5));

        assert!(set.require(PoseLandmark::LeftKnee).is_ok());
        match set.require(PoseLandmark::LeftAnkle) {
            Err(PostureError::MissingLandmark(name)) => {
                assert_eq!(name, PoseLandmark::LeftAnkle);
                assert_eq!(name.as_str(), "LEFT_ANKLE");
            }
            other => panic!("expected MissingLandmark, got {:?}", other),
        }
    }

    #[test]
    fn set_is_partial_by_default() {
        let set = LandmarkSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        for name in PoseLandmark::ALL {
            assert!(set.get(name).is_none());
        }
    }
}
