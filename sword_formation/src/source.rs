//! Hand sources: where detector frames come from.
//!
//! The public interface is a stream of [`HandFrame`]s delivered over a `mpsc`
//! channel.  The render loop doesn't care whether they came from a LeapMotion
//! controller or from the keyboard simulator, and it never blocks on them:
//! a frame with nothing new in the channel is simply a frame without fresh
//! detector data.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use formation_core::synthetic::{raw_hand, HandShape};
use formation_core::{HandFrame, Handedness};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

// ════════════════════════════════════════════════════════════════════════════
// HandSource trait: unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver detector frames over a channel.  Returning from
/// `run` closes the channel.
pub trait HandSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandFrame>);
}

/// Spawn a hand source on its own thread and return the receiving end.
pub fn spawn_hand_source<S: HandSource>(source: S) -> Receiver<HandFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource: keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Keys 1–4.
    Shape(HandShape),
    /// Arrow keys, in image units.
    Nudge { dx: f32, dy: f32 },
    /// `H`: take the hand out of view / bring it back.
    ToggleHidden,
    Quit,
}

/// The simulated hand as the detector would see it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHand {
    pub shape:  HandShape,
    /// Wrist position in image coordinates.
    pub wrist:  [f32; 2],
    pub size:   f32,
    pub hidden: bool,
}

impl Default for SimHand {
    fn default() -> Self {
        SimHand {
            shape:  HandShape::Point,
            wrist:  [0.5, 0.75],
            size:   0.15,
            hidden: false,
        }
    }
}

const WRIST_MIN: f32 = 0.1;
const WRIST_MAX: f32 = 0.9;
const SIM_SCORE: f32 = 0.95;

impl SimHand {
    /// Apply one input.  Returns `false` on quit.
    pub fn apply(&mut self, input: SimInput) -> bool {
        match input {
            SimInput::Shape(shape) => {
                if shape != self.shape {
                    debug!(?shape, "simulated hand shape");
                }
                self.shape = shape;
            }
            SimInput::Nudge { dx, dy } => {
                self.wrist[0] = (self.wrist[0] + dx).clamp(WRIST_MIN, WRIST_MAX);
                self.wrist[1] = (self.wrist[1] + dy).clamp(WRIST_MIN, WRIST_MAX);
            }
            SimInput::ToggleHidden => self.hidden = !self.hidden,
            SimInput::Quit => return false,
        }
        true
    }

    /// What the detector reports this tick.  `jitter` is the largest
    /// per-landmark displacement, in image units.
    pub fn frame<R: Rng>(&self, rng: &mut R, jitter: f32) -> HandFrame {
        if self.hidden {
            return HandFrame::empty();
        }
        let mut hand = raw_hand(self.shape, self.wrist, self.size, Handedness::Right, SIM_SCORE);
        if jitter > 0.0 {
            for l in &mut hand.landmarks {
                l.x += rng.gen_range(-jitter..=jitter);
                l.y += rng.gen_range(-jitter..=jitter);
            }
        }
        HandFrame::single(hand)
    }
}

/// Hand source driven by [`SimInput`] events from the visualizer's window.
///
/// Runs at its own detector rate, independent of the render loop, the way a
/// camera-based detector would.
pub struct SimHandSource {
    pub rx:     Receiver<SimInput>,
    pub period: Duration,
    pub jitter: f32,
    pub seed:   u64,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>, detector_hz: f32, jitter: f32) -> Self {
        let hz = if detector_hz > 0.0 { detector_hz } else { 30.0 };
        SimHandSource {
            rx,
            period: Duration::from_secs_f32(1.0 / hz),
            jitter,
            seed: 0x5eed,
        }
    }
}

impl HandSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        let mut hand = SimHand::default();
        let mut rng = StdRng::seed_from_u64(self.seed);
        info!(period_ms = self.period.as_millis() as u64, "simulated detector running");

        loop {
            loop {
                match self.rx.try_recv() {
                    Ok(input) => {
                        if !hand.apply(input) {
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            if tx.send(hand.frame(&mut rng, self.jitter)).is_err() {
                return;
            }
            thread::sleep(self.period);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// LeapC reports bones in millimetres above the device.  Each hand is turned
/// into the 21-point landmark layout: bone joints become the knuckles and
/// tips, the wrist is taken as the mean of the four long metacarpal bases,
/// and the tracking volume is mapped onto the unit image square (y down).
#[cfg(feature = "leap")]
pub struct LeapHandSource {
    /// Millimetres covered by one image width.
    pub volume_mm: f32,
}

#[cfg(feature = "leap")]
impl Default for LeapHandSource {
    fn default() -> Self {
        LeapHandSource { volume_mm: 400.0 }
    }
}

#[cfg(feature = "leap")]
impl HandSource for LeapHandSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        use formation_core::{Landmark, RawHand};
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = ?e, "could not create LeapC connection");
                return;
            }
        };
        if let Err(e) = connection.open() {
            tracing::error!(error = ?e, "could not open LeapMotion device");
            return;
        }
        info!("LeapMotion connected");

        let scale = self.volume_mm;
        let to_image = |x: f32, y: f32, z: f32| Landmark::new(0.5 + x / scale, 1.0 - y / scale, z / scale);

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };
            let frame = match msg.event() {
                Event::Tracking(frame) => frame,
                _ => continue,
            };

            let mut hands = Vec::new();
            for hand in frame.hands() {
                let digits: Vec<_> = hand.digits().collect();
                if digits.len() < 5 {
                    continue;
                }

                let (mut wx, mut wy, mut wz) = (0.0, 0.0, 0.0);
                for d in &digits[1..] {
                    let j = d.metacarpal().prev_joint();
                    wx += j.x / 4.0;
                    wy += j.y / 4.0;
                    wz += j.z / 4.0;
                }

                let mut landmarks = Vec::with_capacity(21);
                landmarks.push(to_image(wx, wy, wz));
                for d in &digits {
                    for j in [
                        d.proximal().prev_joint(),
                        d.intermediate().prev_joint(),
                        d.distal().prev_joint(),
                        d.distal().next_joint(),
                    ] {
                        landmarks.push(to_image(j.x, j.y, j.z));
                    }
                }

                let handedness = if hand.hand_type() == HandType::Left {
                    Handedness::Left
                } else {
                    Handedness::Right
                };
                // LeapC only reports hands it is tracking.
                hands.push(RawHand { landmarks, handedness, score: 1.0 });
            }

            if tx.send(HandFrame { hands }).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
