//! Camera framing.
//!
//! Each frame the controller works out where the camera *wants* to be
//! (far enough back to fit the formation, centred on it while a hand is
//! tracked, wandering slowly while idle) and then eases toward that goal.
//! Four quantities are smoothed independently: the follow target, the
//! camera position, the look-at point and the zoom distance.
//!
//! Smoothing is exponential and frame-rate independent:
//!
//! ```text
//! alpha(dt) = 1 − (1 − s)^(dt · reference_hz)
//! ```
//!
//! so at the reference rate each step covers exactly `s` of the remaining
//! distance, and two half-length steps land where one full step would.

use glam::Vec3;
use tracing::trace;

use crate::config::CameraConfig;
use crate::formation::Formation;
use crate::gesture::GestureMode;
use crate::state::TrackingState;

/// Output surface size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width:  u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Viewport { width, height }
    }

    /// Landscape screens need to pull back further for the same framing.
    pub fn is_wide(&self) -> bool {
        self.width > self.height
    }
}

/// What the renderer applies to its camera this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at:  Vec3,
    pub zoom:     f32,
}

/// Smoothed state carried from frame to frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    pub target:   Vec3,
    pub position: Vec3,
    pub look_at:  Vec3,
    pub zoom:     f32,
}

#[derive(Clone, Debug)]
pub struct CameraController {
    cfg:   CameraConfig,
    frame: CameraFrame,
    /// Last finite goals, reused when a frame produces garbage.
    last_follow: Vec3,
    last_zoom:   f32,
}

impl CameraController {
    pub fn new(cfg: &CameraConfig) -> Self {
        let frame = CameraFrame {
            target:   Vec3::ZERO,
            position: Vec3::from_array(cfg.initial_position),
            look_at:  Vec3::ZERO,
            zoom:     cfg.initial_zoom,
        };
        CameraController {
            cfg:         cfg.clone(),
            frame,
            last_follow: Vec3::ZERO,
            last_zoom:   cfg.initial_zoom,
        }
    }

    pub fn frame(&self) -> &CameraFrame { &self.frame }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.frame.position,
            look_at:  self.frame.look_at,
            zoom:     self.frame.zoom,
        }
    }

    pub fn zoom_max(&self, mode: GestureMode) -> f32 {
        match mode {
            GestureMode::Dageng => self.cfg.zoom_max_dageng,
            _ => self.cfg.zoom_max_default,
        }
    }

    /// Advance one rendered frame.
    ///
    /// `elapsed` is the scene clock in seconds (drives the idle wander) and
    /// `dt` the time since the previous call.
    pub fn update(&mut self, state: &TrackingState, viewport: Viewport, elapsed: f32, dt: f32) -> CameraPose {
        let alpha = self.smoothing_alpha(dt);

        let zoom_goal = match self.target_zoom(&state.formation, state.gesture_mode, viewport) {
            Some(z) => { self.last_zoom = z; z }
            None => {
                trace!("non-finite zoom goal, holding previous");
                self.last_zoom
            }
        };
        let follow = match self.follow_point(state, elapsed) {
            Some(p) => { self.last_follow = p; p }
            None => {
                trace!("no usable follow point, holding previous");
                self.last_follow
            }
        };

        let f = &mut self.frame;
        f.zoom   += (zoom_goal - f.zoom) * alpha;
        f.target  = f.target.lerp(follow, alpha);

        let (position_goal, look_goal) = rig(&self.cfg, f.target, f.zoom);
        f.position = f.position.lerp(position_goal, alpha);
        f.look_at  = f.look_at.lerp(look_goal, alpha);

        self.pose()
    }

    /// Fraction of the remaining distance covered in a step of `dt` seconds.
    pub fn smoothing_alpha(&self, dt: f32) -> f32 {
        let dt = if dt.is_finite() { dt.clamp(0.0, self.cfg.max_frame_dt) } else { 0.0 };
        1.0 - (1.0 - self.cfg.smoothing_factor).powf(dt * self.cfg.reference_hz)
    }

    /// Distance needed to frame `formation`, clamped to the mode's bounds.
    /// `None` if the formation holds non-finite positions.
    pub fn target_zoom(&self, formation: &Formation, mode: GestureMode, viewport: Viewport) -> Option<f32> {
        if !formation.positions().all(|p| p.is_finite()) {
            return None;
        }
        let span = formation.span().unwrap_or(self.cfg.default_span);
        if !span.is_finite() {
            return None;
        }
        let mut distance = span * self.cfg.span_scale + self.cfg.span_padding;
        if viewport.is_wide() {
            distance *= self.cfg.wide_screen_multiplier;
        }
        Some(distance.max(self.cfg.zoom_min).min(self.zoom_max(mode)))
    }

    /// Where the camera should centre: the formation while tracking, an idle
    /// wander otherwise.  `None` if tracking but the formation is unusable.
    pub fn follow_point(&self, state: &TrackingState, elapsed: f32) -> Option<Vec3> {
        if state.is_tracking {
            state.formation.centroid().filter(|c| c.is_finite())
        } else {
            Some(self.idle_wander(elapsed))
        }
    }

    /// Two sinusoids with different periods: a slow, non-repeating-looking drift.
    pub fn idle_wander(&self, elapsed: f32) -> Vec3 {
        let [ax, ay] = self.cfg.idle_amplitude;
        let [fx, fy] = self.cfg.idle_frequency;
        Vec3::new((elapsed * fx).sin() * ax, (elapsed * fy).cos() * ay, 0.0)
    }
}

/// Camera position and look-at goals for a smoothed target.  The camera
/// follows the target only partially and sits above it; the look-at stays
/// closer to the action.
fn rig(cfg: &CameraConfig, target: Vec3, zoom: f32) -> (Vec3, Vec3) {
    let position = Vec3::new(
        target.x * cfg.position_follow[0],
        target.y * cfg.position_follow[1] + cfg.position_lift,
        zoom,
    );
    let look_at = Vec3::new(
        target.x * cfg.look_follow[0],
        target.y * cfg.look_follow[1],
        cfg.look_depth,
    );
    (position, look_at)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::FormationPoint;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;
    const WIDE: Viewport = Viewport { width: 1920, height: 1080 };
    const TALL: Viewport = Viewport { width: 1080, height: 1920 };

    fn controller() -> CameraController {
        CameraController::new(&CameraConfig::default())
    }

    fn formation_of(points: &[[f32; 3]]) -> Formation {
        Formation {
            points: points
                .iter()
                .map(|&p| FormationPoint { position: Vec3::from_array(p), heading: Vec3::Y })
                .collect(),
        }
    }

    fn tracked(formation: Formation, mode: GestureMode) -> TrackingState {
        TrackingState { is_tracking: true, gesture_mode: mode, formation }
    }

    #[test]
    fn starts_at_configured_pose() {
        let c = controller();
        assert_eq!(c.pose().position, Vec3::new(0.0, 5.0, 45.0));
        assert_eq!(c.pose().zoom, 40.0);
    }

    #[test]
    fn alpha_matches_factor_at_reference_rate() {
        let c = controller();
        assert_relative_eq!(c.smoothing_alpha(DT), 0.05, epsilon = 1e-6);
        assert_eq!(c.smoothing_alpha(0.0), 0.0);
        assert_eq!(c.smoothing_alpha(f32::NAN), 0.0);
        assert_eq!(c.smoothing_alpha(-1.0), 0.0);
    }

    #[test]
    fn long_stalls_are_capped() {
        let c = controller();
        assert_eq!(c.smoothing_alpha(5.0), c.smoothing_alpha(0.1));
        assert!(c.smoothing_alpha(5.0) < 1.0);
    }

    #[test]
    fn empty_formation_uses_default_span() {
        let c = controller();
        // 10 · 1.2 + 25 = 37, ×1.1 on a wide screen.
        assert_relative_eq!(c.target_zoom(&Formation::empty(), GestureMode::Dragon, TALL).unwrap(), 37.0);
        assert_relative_eq!(
            c.target_zoom(&Formation::empty(), GestureMode::Dragon, WIDE).unwrap(),
            40.7,
            epsilon = 1e-4
        );
    }

    #[test]
    fn zero_span_clamps_to_floor() {
        let c = controller();
        let f = formation_of(&[[1.0, 1.0, 0.0]]);
        assert_eq!(c.target_zoom(&f, GestureMode::Lotus, TALL), Some(35.0));
    }

    #[test]
    fn huge_span_clamps_per_mode() {
        let c = controller();
        let f = formation_of(&[[-1e6, 0.0, 0.0], [1e6, 0.0, 0.0]]);
        assert_eq!(c.target_zoom(&f, GestureMode::Lotus, WIDE), Some(80.0));
        assert_eq!(c.target_zoom(&f, GestureMode::Dageng, WIDE), Some(90.0));
    }

    #[test]
    fn span_uses_larger_axis() {
        let c = controller();
        let f = formation_of(&[[0.0, 0.0, 0.0], [10.0, 30.0, 100.0]]);
        // max(10, 30) · 1.2 + 25 = 61; depth is ignored.
        assert_relative_eq!(c.target_zoom(&f, GestureMode::Dragon, TALL).unwrap(), 61.0, epsilon = 1e-4);
    }

    #[test]
    fn follows_centroid_while_tracking() {
        let c = controller();
        let s = tracked(formation_of(&[[2.0, 4.0, 0.0], [4.0, 0.0, 2.0]]), GestureMode::Dragon);
        assert_eq!(c.follow_point(&s, 10.0), Some(Vec3::new(3.0, 2.0, 1.0)));
    }

    #[test]
    fn idle_wander_is_pure_function_of_time() {
        let c = controller();
        let s = TrackingState::default();
        assert_eq!(c.follow_point(&s, 0.0), Some(Vec3::new(0.0, 4.0, 0.0)));
        assert_eq!(c.follow_point(&s, 7.3), controller().follow_point(&s, 7.3));
    }

    #[test]
    fn idle_camera_path_is_reproducible() {
        let run = || {
            let mut c = controller();
            let s = TrackingState::default();
            (0..300).map(|i| c.update(&s, WIDE, i as f32 * DT, DT)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn step_covers_alpha_of_remaining_distance() {
        let mut c = controller();
        let s = tracked(formation_of(&[[30.0, -20.0, 0.0], [50.0, 10.0, 0.0]]), GestureMode::Dageng);
        let before = *c.frame();
        let goal_zoom = c.target_zoom(&s.formation, s.gesture_mode, WIDE).unwrap();
        let goal_target = c.follow_point(&s, 0.0).unwrap();
        c.update(&s, WIDE, 0.0, DT);
        let after = *c.frame();

        assert_relative_eq!(after.zoom - before.zoom, 0.05 * (goal_zoom - before.zoom), epsilon = 1e-4);
        assert!(after.target.abs_diff_eq(before.target + 0.05 * (goal_target - before.target), 1e-4));

        let (pos_goal, look_goal) = rig(&CameraConfig::default(), after.target, after.zoom);
        assert!(after.position.abs_diff_eq(before.position.lerp(pos_goal, 0.05), 1e-4));
        assert!(after.look_at.abs_diff_eq(before.look_at.lerp(look_goal, 0.05), 1e-4));
    }

    #[test]
    fn frame_rate_independent() {
        let s = tracked(formation_of(&[[20.0, 8.0, 0.0], [26.0, 14.0, 0.0]]), GestureMode::Lotus);
        let mut at60 = controller();
        let mut at120 = controller();
        for i in 0..60 {
            at60.update(&s, WIDE, i as f32 / 60.0, 1.0 / 60.0);
        }
        for i in 0..120 {
            at120.update(&s, WIDE, i as f32 / 120.0, 1.0 / 120.0);
        }
        assert_relative_eq!(at60.frame().zoom, at120.frame().zoom, epsilon = 1e-2);
        assert!(at60.frame().target.abs_diff_eq(at120.frame().target, 1e-2));
        // Position chases a moving goal, so allow a little more slack.
        assert!(at60.frame().position.abs_diff_eq(at120.frame().position, 0.1));
    }

    #[test]
    fn non_finite_formation_holds_previous_goal() {
        let mut c = controller();
        let good = tracked(formation_of(&[[10.0, 0.0, 0.0], [20.0, 0.0, 0.0]]), GestureMode::Dragon);
        for i in 0..10 {
            c.update(&good, WIDE, i as f32 * DT, DT);
        }
        let bad = tracked(formation_of(&[[f32::NAN, 0.0, 0.0], [20.0, 0.0, 0.0]]), GestureMode::Dragon);
        let mut reference = c.clone();
        let pose_bad = c.update(&bad, WIDE, 0.2, DT);
        let pose_good = reference.update(&good, WIDE, 0.2, DT);
        assert!(pose_bad.position.is_finite());
        assert!(pose_bad.zoom.is_finite());
        assert_eq!(pose_bad, pose_good);
    }

    #[test]
    fn tracked_empty_formation_holds_previous_target() {
        let mut c = controller();
        let s = tracked(Formation::empty(), GestureMode::Shield);
        let pose = c.update(&s, TALL, 1.0, DT);
        assert!(pose.look_at.is_finite());
        assert!(c.frame().target.abs_diff_eq(Vec3::ZERO, 1e-6));
    }
}
