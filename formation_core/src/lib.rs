//! # formation_core
//!
//! Turns a noisy per-frame stream of hand landmarks into a sword formation:
//! a debounced gesture mode, a 3-D blade layout, and a smoothed camera that
//! keeps it all in frame.
//!
//! ## Per-frame flow
//!
//! | Stage | Module | Output |
//! |---|---|---|
//! | Landmark Normalizer | [`landmark`] | [`HandPose`] for the primary hand, or none |
//! | Gesture Classifier | [`gesture`] | debounced [`GestureMode`] + tracking flag |
//! | Formation Generator | [`formation`] | [`Formation`] (blade positions and headings) |
//! | Tracking State Store | [`state`] | one atomically published [`TrackingState`] |
//! | Camera Controller | [`camera`] | [`CameraPose`] eased toward the formation |
//!
//! [`Pipeline`] runs the first four in that order once per rendered frame.
//! The camera is driven separately by whoever renders, from a
//! [`StateReader`].
//!
//! ## Gestures
//!
//! | Hand shape | Mode | Formation |
//! |---|---|---|
//! | Index finger pointing | `DRAGON` | blades trailing the fingertip |
//! | Open palm | `LOTUS` | phyllotaxis bloom, grows as the fingers spread |
//! | Fist | `SHIELD` | tight ring in front of the palm |
//! | Index + pinky ("horns") | `DAGENG` | concentric counter-rotating rings |
//!
//! ```rust
//! use formation_core::{Handedness, HandFrame, Pipeline, PipelineConfig, TrackingStore};
//! use formation_core::synthetic::{raw_hand, HandShape};
//!
//! let (writer, reader) = TrackingStore::new();
//! let mut pipeline = Pipeline::new(PipelineConfig::default(), writer);
//!
//! let palm = HandFrame::single(raw_hand(HandShape::OpenPalm, [0.5, 0.6], 0.15, Handedness::Right, 0.95));
//! for i in 0..5 {
//!     pipeline.process(Some(&palm), i as f32 / 60.0);
//! }
//! assert_eq!(reader.gesture_mode().name(), "LOTUS");
//! ```

pub mod camera;
pub mod config;
pub mod error;
pub mod formation;
pub mod gesture;
pub mod landmark;
pub mod pipeline;
pub mod state;
pub mod synthetic;

pub use camera::{CameraController, CameraPose, Viewport};
pub use config::PipelineConfig;
pub use error::{ConfigError, LandmarkError};
pub use formation::{Formation, FormationGenerator, FormationPoint};
pub use gesture::{GestureClassifier, GestureMode};
pub use landmark::{HandFrame, HandPose, Handedness, Landmark, LandmarkNormalizer, RawHand};
pub use pipeline::{FrameReport, Pipeline};
pub use state::{StateReader, StateWriter, TrackingState, TrackingStore};
