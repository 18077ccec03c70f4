//! Landmark normalization: raw detector hands in, [`HandPose`]s out.
//!
//! The detector reports 21 points per hand in image space (x, y in `[0, 1]`
//! with y pointing down, z a relative depth).  Everything downstream works
//! on features measured in *palm units*: coordinates are shifted to the
//! wrist and divided by the wrist → middle-knuckle distance, so gesture
//! thresholds do not depend on how close the hand is to the camera.
//!
//! A hand that fails any check is dropped whole; there is no such thing as
//! a partially-populated pose.

use glam::Vec3;
use tracing::debug;

use crate::config::NormalizerConfig;
use crate::error::LandmarkError;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// (pip, tip) pairs for the four long fingers, index first.
const LONG_FINGERS: [(usize, usize); 4] = [
    (INDEX_PIP,  INDEX_TIP),
    (MIDDLE_PIP, MIDDLE_TIP),
    (RING_PIP,   RING_TIP),
    (PINKY_PIP,  PINKY_TIP),
];

const PALM_POINTS: [usize; 5] = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];
const FINGERTIPS:  [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

const MIN_PALM_SIZE: f32 = 1e-4;

// ════════════════════════════════════════════════════════════════════════════
// Detector input
// ════════════════════════════════════════════════════════════════════════════

/// One detector point in image space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

/// One hand as reported by the detector.
#[derive(Clone, Debug, PartialEq)]
pub struct RawHand {
    pub landmarks:  Vec<Landmark>,
    pub handedness: Handedness,
    /// Presence / confidence score in `[0, 1]`.
    pub score:      f32,
}

/// One detector result.  An empty `hands` list means "looked, found nothing",
/// which is different from the detector not having produced a result at all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandFrame {
    pub hands: Vec<RawHand>,
}

impl HandFrame {
    pub fn empty() -> Self {
        HandFrame::default()
    }

    pub fn single(hand: RawHand) -> Self {
        HandFrame { hands: vec![hand] }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandPose
// ════════════════════════════════════════════════════════════════════════════

/// Extended (true) / curled (false) state of each finger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerStates {
    pub thumb:  bool,
    pub index:  bool,
    pub middle: bool,
    pub ring:   bool,
    pub pinky:  bool,
}

impl FingerStates {
    pub fn extended_count(&self) -> usize {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|&&e| e)
            .count()
    }
}

/// A validated, feature-enriched hand for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HandPose {
    pub handedness: Handedness,
    pub confidence: f32,
    /// Mean of wrist and the four knuckles, image space.
    pub palm_center: Vec3,
    /// Index fingertip, image space.
    pub index_tip: Vec3,
    /// Unit direction from index knuckle to index tip, image space.
    pub pointing: Vec3,
    /// Unit palm normal, oriented toward the camera (negative detector z).
    pub palm_normal: Vec3,
    /// Wrist → middle-knuckle distance in image units.
    pub palm_scale: f32,
    /// Mean fingertip distance from the palm centre, in palm units.
    pub spread: f32,
    pub fingers: FingerStates,
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkNormalizer
// ════════════════════════════════════════════════════════════════════════════

/// Turns detector hands into [`HandPose`]s.  Stateless.
#[derive(Clone, Debug)]
pub struct LandmarkNormalizer {
    min_confidence:  f32,
    extension_ratio: f32,
}

impl LandmarkNormalizer {
    pub fn new(cfg: &NormalizerConfig) -> Self {
        LandmarkNormalizer {
            min_confidence:  cfg.min_confidence,
            extension_ratio: cfg.extension_ratio,
        }
    }

    /// Normalize one hand, or `None` if it is unusable.
    pub fn normalize(&self, hand: &RawHand) -> Option<HandPose> {
        match self.try_normalize(hand) {
            Ok(pose) => Some(pose),
            Err(e) => {
                debug!(error = %e, "hand rejected");
                None
            }
        }
    }

    /// Pick the best usable hand in a detector frame: highest confidence,
    /// ties going to the right hand.
    pub fn primary(&self, frame: &HandFrame) -> Option<HandPose> {
        frame
            .hands
            .iter()
            .filter_map(|h| self.normalize(h))
            .max_by(|a, b| {
                a.confidence
                    .total_cmp(&b.confidence)
                    .then_with(|| (a.handedness == Handedness::Right)
                        .cmp(&(b.handedness == Handedness::Right)))
            })
    }

    /// Same as [`normalize`](Self::normalize) but reports the rejection reason.
    pub fn try_normalize(&self, hand: &RawHand) -> Result<HandPose, LandmarkError> {
        if !hand.score.is_finite() {
            return Err(LandmarkError::NonFinite { index: 0 });
        }
        if hand.score < self.min_confidence {
            return Err(LandmarkError::LowConfidence {
                score:     hand.score,
                threshold: self.min_confidence,
            });
        }
        if hand.landmarks.len() != LANDMARK_COUNT {
            return Err(LandmarkError::WrongLandmarkCount {
                expected: LANDMARK_COUNT,
                actual:   hand.landmarks.len(),
            });
        }
        if let Some(index) = hand.landmarks.iter().position(|l| !l.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }

        let img: Vec<Vec3> = hand.landmarks.iter().map(|l| l.to_vec3()).collect();
        let wrist = img[WRIST];
        let palm_scale = img[WRIST].distance(img[MIDDLE_MCP]);
        if !(palm_scale >= MIN_PALM_SIZE) {
            return Err(LandmarkError::DegenerateHand { palm_size: palm_scale });
        }

        // Canonical space: wrist at the origin, one palm length = 1.
        let c: Vec<Vec3> = img.iter().map(|&p| (p - wrist) / palm_scale).collect();

        let fingers = self.finger_states(&c);

        let palm_center_c = PALM_POINTS.iter().map(|&i| c[i]).sum::<Vec3>() / PALM_POINTS.len() as f32;
        let spread = FINGERTIPS
            .iter()
            .map(|&i| c[i].distance(palm_center_c))
            .sum::<f32>()
            / FINGERTIPS.len() as f32;

        let pointing = (c[INDEX_TIP] - c[INDEX_MCP]).try_normalize().unwrap_or(Vec3::NEG_Y);

        let mut palm_normal = (c[INDEX_MCP] - c[WRIST])
            .cross(c[PINKY_MCP] - c[WRIST])
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);
        if palm_normal.z > 0.0 {
            palm_normal = -palm_normal;
        }

        let palm_center = PALM_POINTS.iter().map(|&i| img[i]).sum::<Vec3>() / PALM_POINTS.len() as f32;

        Ok(HandPose {
            handedness: hand.handedness,
            confidence: hand.score,
            palm_center,
            index_tip: img[INDEX_TIP],
            pointing,
            palm_normal,
            palm_scale,
            spread,
            fingers,
        })
    }

    fn finger_states(&self, c: &[Vec3]) -> FingerStates {
        let long = LONG_FINGERS.map(|(pip, tip)| {
            c[tip].length() > self.extension_ratio * c[pip].length()
        });
        // The thumb folds across the palm rather than toward the wrist, so
        // measure it against the pinky knuckle instead.
        let pinky_base = c[PINKY_MCP];
        let thumb = c[THUMB_TIP].distance(pinky_base)
            > self.extension_ratio * c[THUMB_IP].distance(pinky_base);

        FingerStates {
            thumb,
            index:  long[0],
            middle: long[1],
            ring:   long[2],
            pinky:  long[3],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
