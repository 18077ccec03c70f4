//! Top-level application state.
//!
//! `AppState` owns the pipeline (the only writer of the tracking state), a
//! reader onto that state, and the camera controller.  Each rendered frame it
//! takes whatever the hand source delivered since the last frame, runs one
//! pipeline pass and eases the camera.

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Instant;

use formation_core::{
    CameraController, CameraPose, FrameReport, GestureMode, HandFrame, Pipeline, PipelineConfig,
    StateReader, TrackingState, TrackingStore, Viewport,
};
use glam::Vec3;
use tracing::{info, warn};

use crate::error::AppError;
use crate::overlay::Overlay;
use crate::source::{spawn_hand_source, SimInput};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub pipeline:    PipelineConfig,
    /// Rate of the simulated detector, independent of the render rate.
    pub detector_hz: f32,
    /// Landmark noise of the simulated detector, in image units.
    pub jitter:      f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            pipeline:    PipelineConfig::default(),
            detector_hz: 30.0,
            jitter:      0.002,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── pipeline ─────────────────────────────────────────────────────────
    pipeline: Pipeline,
    reader:   StateReader,

    // ── camera ───────────────────────────────────────────────────────────
    camera:   CameraController,
    pose:     CameraPose,

    // ── clock / bookkeeping ──────────────────────────────────────────────
    elapsed:       f32,
    report:        FrameReport,
    source_frames: u64,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        let (writer, reader) = TrackingStore::new();
        let camera = CameraController::new(&cfg.pipeline.camera);
        AppState {
            pipeline: Pipeline::new(cfg.pipeline.clone(), writer),
            reader,
            pose: camera.pose(),
            camera,
            elapsed: 0.0,
            report: FrameReport {
                mode:        GestureMode::Dragon,
                is_tracking: false,
                blade_count: 0,
                fresh:       false,
            },
            source_frames: 0,
        }
    }

    // ── per-frame tick ────────────────────────────────────────────────────

    /// One rendered frame.  `frame` is the newest detector result since the
    /// previous tick, if any; `dt` the wall-clock time since then.
    pub fn tick(&mut self, frame: Option<&HandFrame>, dt: f32, viewport: Viewport) -> FrameReport {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.elapsed += dt;
        if frame.is_some() {
            self.source_frames += 1;
        }

        let report = self.pipeline.process(frame, self.elapsed);
        let state = self.reader.snapshot();
        self.pose = self.camera.update(&state, viewport, self.elapsed, dt);
        self.report = report;
        report
    }

    // ── accessors for the render loop ─────────────────────────────────────

    pub fn state(&self)       -> Rc<TrackingState> { self.reader.snapshot() }
    pub fn camera_pose(&self) -> CameraPose         { self.pose }
    pub fn report(&self)      -> FrameReport        { self.report }
    pub fn elapsed(&self)     -> f32                { self.elapsed }

    pub fn overlay(&self) -> Overlay {
        Overlay::for_state(self.reader.is_tracking(), self.reader.gesture_mode())
    }

    /// True once the hand source has delivered anything.
    pub fn source_ready(&self) -> bool {
        self.source_frames > 0
    }

    /// World position of the tracked palm, for the on-screen hand marker.
    /// Holds through missed detections until tracking is lost.
    pub fn hand_marker(&self) -> Option<Vec3> {
        let pose = self.pipeline.anchor_pose()?;
        Some(self.pipeline.generator().anchor(pose.palm_center))
    }
}

/// Newest frame waiting in the channel, dropping older ones.  Reports a
/// closed channel through `closed`.
fn latest_frame(rx: &Receiver<HandFrame>, closed: &mut bool) -> Option<HandFrame> {
    let mut latest = None;
    loop {
        match rx.try_recv() {
            Ok(frame) => latest = Some(frame),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                if !*closed {
                    warn!("hand source stopped; formation will fall back to idle");
                    *closed = true;
                }
                break;
            }
        }
    }
    latest
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It creates the visualizer,
/// the hand source (simulation by default, hardware with `--features leap`),
/// and drives the render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    // ── Sim input channel (window → simulated detector) ──────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    #[cfg(feature = "leap")]
    let hand_rx = {
        drop(sim_rx);
        spawn_hand_source(crate::source::LeapHandSource::default())
    };
    #[cfg(not(feature = "leap"))]
    let hand_rx = spawn_hand_source(crate::source::SimHandSource::new(sim_rx, cfg.detector_hz, cfg.jitter));

    let mut vis = Visualizer::new(sim_tx)?;
    let mut app = AppState::new(&cfg);
    let mut closed = false;
    let mut last = Instant::now();

    info!("render loop started");
    while vis.is_open() {
        if !vis.poll_input() { break; }

        let frame = latest_frame(&hand_rx, &mut closed);
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        app.tick(frame.as_ref(), dt, vis.viewport());
        vis.render(&app);
    }
    info!(seconds = app.elapsed(), "render loop finished");

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
