//! Per-frame orchestration.
//!
//! [`Pipeline::process`] is called once per rendered frame and always runs
//! the same sequence:
//!
//! ```text
//!   HandFrame ──► LandmarkNormalizer ──► GestureClassifier ──► FormationGenerator ──► StateWriter
//!                    (primary hand)        (debounced mode)       (blade layout)        (publish once)
//! ```
//!
//! The detector runs at its own cadence, so a frame may arrive with no new
//! data (`None`).  The last fresh pose is then re-used for up to
//! `stale_frame_limit` frames *without* stepping the classifier: debounce
//! counts detector observations, not render frames.  Once the limit is
//! exceeded every further empty frame is fed to the classifier as an absent
//! hand, so a stalled detector eventually reads as hand loss.
//!
//! The formation is built around the *anchor*: the last valid pose seen while
//! tracking.  Missed detections inside the loss grace window leave it in
//! place, so the blades hold their layout instead of collapsing to the idle
//! ring; the anchor is dropped only when tracking goes off.

use tracing::{debug, trace};

use crate::config::PipelineConfig;
use crate::formation::FormationGenerator;
use crate::gesture::{GestureClassifier, GestureMode};
use crate::landmark::{HandFrame, HandPose, LandmarkNormalizer};
use crate::state::{StateReader, StateWriter, TrackingState};

/// Summary of one processed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub mode:        GestureMode,
    pub is_tracking: bool,
    pub blade_count: usize,
    /// Whether this frame carried new detector data.
    pub fresh:       bool,
}

/// The single writer path into the tracking state.
#[derive(Debug)]
pub struct Pipeline {
    cfg:        PipelineConfig,
    normalizer: LandmarkNormalizer,
    classifier: GestureClassifier,
    generator:  FormationGenerator,
    writer:     StateWriter,

    last_pose:    Option<HandPose>,
    anchor:       Option<HandPose>,
    stale_frames: u32,
    frames:       u64,
}

impl Pipeline {
    pub fn new(cfg: PipelineConfig, writer: StateWriter) -> Self {
        Pipeline {
            normalizer:   LandmarkNormalizer::new(&cfg.normalizer),
            classifier:   GestureClassifier::new(&cfg.gesture),
            generator:    FormationGenerator::new(&cfg.layout),
            writer,
            last_pose:    None,
            anchor:       None,
            stale_frames: 0,
            frames:       0,
            cfg,
        }
    }

    pub fn config(&self) -> &PipelineConfig { &self.cfg }
    pub fn generator(&self) -> &FormationGenerator { &self.generator }
    pub fn frames(&self) -> u64 { self.frames }

    /// The newest detector pose, kept across at most `stale_frame_limit`
    /// frames without new data.
    pub fn last_pose(&self) -> Option<&HandPose> { self.last_pose.as_ref() }

    /// The pose the current formation is anchored to.  `Some` exactly while
    /// tracking.
    pub fn anchor_pose(&self) -> Option<&HandPose> { self.anchor.as_ref() }

    /// A read-only view onto the state this pipeline publishes.
    pub fn reader(&self) -> StateReader {
        self.writer.reader()
    }

    /// Run one frame.  `frame` is `None` when the detector has produced
    /// nothing new since the previous call; `elapsed` is the scene clock.
    pub fn process(&mut self, frame: Option<&HandFrame>, elapsed: f32) -> FrameReport {
        self.frames += 1;
        let before = (self.classifier.mode(), self.classifier.is_tracking());

        let fresh = match frame {
            Some(frame) => {
                self.stale_frames = 0;
                self.last_pose = self.normalizer.primary(frame);
                self.classifier.observe(self.last_pose.as_ref());
                if let Some(pose) = &self.last_pose {
                    self.anchor = Some(pose.clone());
                }
                true
            }
            None => {
                self.stale_frames = self.stale_frames.saturating_add(1);
                if self.stale_frames > self.cfg.stale_frame_limit {
                    if self.last_pose.take().is_some() {
                        debug!(frames = self.stale_frames, "detector stalled, treating hand as absent");
                    }
                    self.classifier.observe(None);
                }
                false
            }
        };

        let mode = self.classifier.mode();
        let is_tracking = self.classifier.is_tracking();
        if !is_tracking {
            self.anchor = None;
        } else if self.last_pose.is_none() {
            trace!(frame = self.frames, "no hand this frame, holding formation on anchor");
        }
        let formation = self.generator.generate(mode, is_tracking, self.anchor.as_ref(), elapsed);
        let blade_count = formation.len();

        self.writer.publish(TrackingState { is_tracking, gesture_mode: mode, formation });

        if before != (mode, is_tracking) {
            trace!(frame = self.frames, %mode, is_tracking, blade_count, "state published");
        }

        FrameReport { mode, is_tracking, blade_count, fresh }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
