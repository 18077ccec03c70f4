//! # sword_formation
//!
//! Interactive viewer for the sword formation: a hand source feeds detector
//! frames into the [`formation_core`] pipeline, and a software-rendered
//! window shows the blades through the smoothed camera.
//!
//! ## Gesture → formation
//!
//! | Hand | Mode | Formation |
//! |---|---|---|
//! | Index finger pointing | DRAGON | blades trail the fingertip |
//! | Open palm | LOTUS | bloom around the palm |
//! | Fist | SHIELD | tight guarding ring |
//! | Index + pinky | DAGENG | great multi-ring array |
//! | no hand | (idle) | slow ring, wandering camera |
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: the keyboard drives a synthetic hand.
//! * `leap`: **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | `1` `2` `3` `4` | Point / open palm / fist / horns |
//! | Arrows | Move the hand |
//! | `H` | Hide / show the hand |
//! | `Q` / `Escape` | Quit |
//!
//! Logging goes through `tracing`; set `RUST_LOG=debug` to watch pending
//! candidates and rejected hands.

pub mod app;
pub mod error;
pub mod overlay;
pub mod source;
pub mod visualizer;
