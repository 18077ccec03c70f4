//! Synthetic hand landmarks.
//!
//! Builds anatomically plausible 21-point hands for a handful of shapes so
//! the pipeline can be driven without a camera: the keyboard simulator in the
//! front-end uses it, and so do the tests.

use crate::landmark::{FingerStates, Handedness, Landmark, RawHand, LANDMARK_COUNT};

/// Hand shapes the pipeline knows how to interpret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandShape {
    /// Index finger only.
    Point,
    /// Every finger extended.
    OpenPalm,
    /// Every finger curled.
    Fist,
    /// Index and pinky extended, middle and ring curled.
    Horns,
}

impl HandShape {
    pub const ALL: [HandShape; 4] = [
        HandShape::Point,
        HandShape::OpenPalm,
        HandShape::Fist,
        HandShape::Horns,
    ];

    pub fn fingers(self) -> FingerStates {
        match self {
            HandShape::Point => FingerStates { index: true, ..FingerStates::default() },
            HandShape::OpenPalm => FingerStates {
                thumb: true, index: true, middle: true, ring: true, pinky: true,
            },
            HandShape::Fist => FingerStates::default(),
            HandShape::Horns => FingerStates { index: true, pinky: true, ..FingerStates::default() },
        }
    }
}

// Palm geometry in palm units, y up, wrist at the origin.  The middle
// knuckle sits exactly one unit above the wrist.
const THUMB_CMC: [f32; 2] = [-0.28, 0.22];
const THUMB_MCP: [f32; 2] = [-0.50, 0.42];
const THUMB_EXTENDED: [[f32; 2]; 2] = [[-0.72, 0.62], [-1.00, 0.86]];
const THUMB_FOLDED:   [[f32; 2]; 2] = [[-0.42, 0.62], [-0.12, 0.66]];

/// (knuckle, splay angle in radians) for index, middle, ring, pinky.
const KNUCKLES: [([f32; 2], f32); 4] = [
    ([-0.30, 0.95], -0.12),
    ([ 0.00, 1.00],  0.00),
    ([ 0.25, 0.93],  0.10),
    ([ 0.45, 0.82],  0.22),
];

/// Build the 21 landmarks of a hand.
///
/// `wrist` is the wrist position in image coordinates and `size` the
/// wrist → middle-knuckle length in image units.  Left hands are mirrored.
pub fn hand_landmarks(fingers: FingerStates, wrist: [f32; 2], size: f32, handedness: Handedness) -> Vec<Landmark> {
    let mirror = match handedness {
        Handedness::Right => 1.0,
        Handedness::Left  => -1.0,
    };
    let to_image = |p: [f32; 2]| Landmark::new(wrist[0] + mirror * p[0] * size, wrist[1] - p[1] * size, 0.0);

    let mut out = Vec::with_capacity(LANDMARK_COUNT);
    out.push(to_image([0.0, 0.0]));

    let [thumb_ip, thumb_tip] = if fingers.thumb { THUMB_EXTENDED } else { THUMB_FOLDED };
    for p in [THUMB_CMC, THUMB_MCP, thumb_ip, thumb_tip] {
        out.push(to_image(p));
    }

    let long = [fingers.index, fingers.middle, fingers.ring, fingers.pinky];
    for (&(mcp, angle), extended) in KNUCKLES.iter().zip(long) {
        let d = [angle.sin(), angle.cos()];
        let at = |t: f32| [mcp[0] + d[0] * t, mcp[1] + d[1] * t];
        let joints = if extended {
            [at(0.42), at(0.70), at(0.94)]
        } else {
            [at(0.32), at(0.12), at(-0.12)]
        };
        out.push(to_image(mcp));
        for j in joints {
            out.push(to_image(j));
        }
    }
    out
}

/// Convenience wrapper producing a detector hand.
pub fn raw_hand(shape: HandShape, wrist: [f32; 2], size: f32, handedness: Handedness, score: f32) -> RawHand {
    RawHand {
        landmarks: hand_landmarks(shape.fingers(), wrist, size, handedness),
        handedness,
        score,
    }
}
