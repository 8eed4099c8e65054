//! Posture analysis over uploaded images.
//!
//! A thin HTTP service: decode the uploaded frame, hand it to a
//! pose-estimation backend, and run a small set of geometric posture
//! rules over the resulting landmarks.
//!
//! ```text
//! Client ──POST /analyze──> decode ──> PoseDetector ──> posture rules ──> {"feedback": [..]}
//! ```
//!
//! The pose model does the heavy lifting; everything in this crate is
//! plumbing plus the rule math in [`posture`].

pub mod config;
pub mod error;
pub mod inference;
pub mod landmarks;
pub mod posture;
pub mod server;

pub use config::Config;
pub use error::PostureError;
pub use inference::PoseDetector;
pub use landmarks::{Landmark, LandmarkSet, PoseLandmark, LANDMARK_COUNT};
pub use posture::{angle_deg, evaluate, Mode};
pub use server::{create_router, AppState};
