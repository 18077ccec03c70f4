//! Gesture classification with debounce.
//!
//! Per-frame classification of a hand shape is noisy: a single misread
//! frame from jitter or occlusion must not flip the formation.  The
//! [`GestureClassifier`] therefore only accepts a new [`GestureMode`] after
//! it has been the candidate for `confirmation_frames` consecutive
//! observations, and likewise debounces the tracking flag in both
//! directions.
//!
//! ```text
//!   Stable(m) ── candidate c != m ──► Pending(c, 1) ── c again ──► Pending(c, n + 1)
//!       ▲                                  │                              │
//!       └──────── candidate == m ──────────┘       n == confirmation ─────┴──► Stable(c)
//! ```

use tracing::{debug, info};

use crate::config::GestureConfig;
use crate::landmark::HandPose;

// ════════════════════════════════════════════════════════════════════════════
// GestureMode
// ════════════════════════════════════════════════════════════════════════════

/// The discrete formation the user is asking for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GestureMode {
    /// Index finger pointing: blades trail the fingertip.  Also the idle mode.
    #[default]
    Dragon,
    /// Open palm: blades bloom around the hand.
    Lotus,
    /// Fist: tight defensive ring.
    Shield,
    /// "Horns" seal: the great multi-ring array.
    Dageng,
}

impl GestureMode {
    pub const ALL: [GestureMode; 4] = [
        GestureMode::Dragon,
        GestureMode::Lotus,
        GestureMode::Shield,
        GestureMode::Dageng,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GestureMode::Dragon => "DRAGON",
            GestureMode::Lotus  => "LOTUS",
            GestureMode::Shield => "SHIELD",
            GestureMode::Dageng => "DAGENG",
        }
    }
}

impl std::fmt::Display for GestureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a hand's finger signature to a candidate mode.
///
/// The thumb only matters for the open palm; it is too unreliable to be part
/// of the other signatures.
pub fn classify(pose: &HandPose) -> GestureMode {
    let f = &pose.fingers;
    let long_extended = [f.index, f.middle, f.ring, f.pinky];

    if f.thumb && long_extended.iter().all(|&e| e) {
        GestureMode::Lotus
    } else if long_extended.iter().all(|&e| !e) {
        GestureMode::Shield
    } else if f.index && f.pinky && !f.middle && !f.ring {
        GestureMode::Dageng
    } else {
        GestureMode::Dragon
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Debounce state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Debounce {
    /// No change in progress.
    Stable,
    /// `candidate` has been seen `count` times in a row.
    Pending { candidate: GestureMode, count: u32 },
}

/// What the classifier decided for one observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifierOutput {
    pub mode:        GestureMode,
    pub is_tracking: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct GestureClassifier {
    cfg:      GestureConfig,
    stable:   GestureMode,
    debounce: Debounce,

    tracking: bool,
    /// Consecutive present observations while not tracking.
    seen:     u32,
    /// Consecutive absent observations while tracking.
    missed:   u32,
}

impl GestureClassifier {
    pub fn new(cfg: &GestureConfig) -> Self {
        GestureClassifier {
            cfg:      cfg.clone(),
            stable:   GestureMode::Dragon,
            debounce: Debounce::Stable,
            tracking: false,
            seen:     0,
            missed:   0,
        }
    }

    pub fn mode(&self) -> GestureMode { self.stable }
    pub fn is_tracking(&self) -> bool { self.tracking }
    pub fn debounce(&self) -> Debounce { self.debounce }

    /// Feed one detector observation.  `None` means no usable hand.
    pub fn observe(&mut self, pose: Option<&HandPose>) -> ClassifierOutput {
        let candidate = pose.map(classify).unwrap_or(GestureMode::Dragon);
        let was_tracking = self.tracking;
        self.update_tracking(pose.is_some());

        if was_tracking && !self.tracking {
            // Hand gone for good: fall back to the idle mode outright.
            if self.stable != GestureMode::Dragon {
                info!(from = %self.stable, "mode reset to DRAGON on hand loss");
            }
            self.stable = GestureMode::Dragon;
            self.debounce = Debounce::Stable;
        } else {
            self.step(candidate);
        }

        ClassifierOutput { mode: self.stable, is_tracking: self.tracking }
    }

    fn update_tracking(&mut self, present: bool) {
        if present {
            self.missed = 0;
            if !self.tracking {
                self.seen += 1;
                if self.seen >= self.cfg.acquire_frames {
                    self.tracking = true;
                    self.seen = 0;
                    info!("hand tracking acquired");
                }
            }
        } else {
            self.seen = 0;
            if self.tracking {
                self.missed += 1;
                if self.missed >= self.cfg.loss_grace_frames {
                    self.tracking = false;
                    self.missed = 0;
                    info!("hand tracking lost");
                }
            }
        }
    }

    fn step(&mut self, candidate: GestureMode) {
        if candidate == self.stable {
            self.debounce = Debounce::Stable;
            return;
        }

        let count = match self.debounce {
            Debounce::Pending { candidate: c, count } if c == candidate => count + 1,
            _ => {
                debug!(%candidate, "new pending candidate");
                1
            }
        };

        // While still acquiring, a confirmed candidate waits at the threshold
        // so the idle mode holds until tracking is on.
        if count >= self.cfg.confirmation_frames && self.tracking {
            info!(from = %self.stable, to = %candidate, "gesture mode confirmed");
            self.stable = candidate;
            self.debounce = Debounce::Stable;
        } else {
            let count = count.min(self.cfg.confirmation_frames);
            self.debounce = Debounce::Pending { candidate, count };
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
