//! Formation layout: where every blade goes this frame.
//!
//! A [`Formation`] is rebuilt from scratch each frame; nothing is mutated
//! in place.  What stays stable is *identity by index*: blade `i` of a
//! layout always occupies the same slot of that layout, so an animator can
//! ease blade `i` from one frame to the next even when the blade count
//! changes.
//!
//! World space: x right, y up, z toward the viewer.  Detector image
//! coordinates are mapped through [`FormationGenerator::anchor`].

use std::f32::consts::TAU;

use glam::Vec3;

use crate::config::LayoutConfig;
use crate::gesture::GestureMode;
use crate::landmark::HandPose;

/// Golden angle in radians; successive lotus petals never line up.
const GOLDEN_ANGLE: f32 = 2.399_963_2;

const SWAY_RATE:  f32 = 3.0;
const SWAY_PHASE: f32 = 0.7;
const LOTUS_CUP:  f32 = 0.05;
const LOTUS_TILT: f32 = 0.5;
const DAGENG_TIER_DEPTH: f32 = 1.5;

// ════════════════════════════════════════════════════════════════════════════
// Formation
// ════════════════════════════════════════════════════════════════════════════

/// One blade: where it is and which way its tip points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormationPoint {
    pub position: Vec3,
    /// Unit vector along the blade.
    pub heading:  Vec3,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Formation {
    pub points: Vec<FormationPoint>,
}

impl Formation {
    pub fn empty() -> Self {
        Formation::default()
    }

    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().map(|p| p.position)
    }

    /// Mean blade position, or `None` when empty.
    pub fn centroid(&self) -> Option<Vec3> {
        if self.is_empty() {
            return None;
        }
        Some(self.positions().sum::<Vec3>() / self.len() as f32)
    }

    /// Larger of the x and y extents, or `None` when empty.
    pub fn span(&self) -> Option<f32> {
        let mut it = self.positions();
        let first = it.next()?;
        let (min, max) = it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        let extent = max - min;
        Some(extent.x.max(extent.y))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FormationGenerator
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct FormationGenerator {
    cfg: LayoutConfig,
}

impl FormationGenerator {
    pub fn new(cfg: &LayoutConfig) -> Self {
        FormationGenerator { cfg: cfg.clone() }
    }

    pub fn config(&self) -> &LayoutConfig { &self.cfg }

    /// Build this frame's formation.
    ///
    /// Without tracking (or without a pose to anchor to) the idle ring is
    /// returned, which depends on `elapsed` alone.
    pub fn generate(
        &self,
        mode: GestureMode,
        is_tracking: bool,
        pose: Option<&HandPose>,
        elapsed: f32,
    ) -> Formation {
        let pose = match (is_tracking, pose) {
            (true, Some(p)) => p,
            _ => return self.idle(elapsed),
        };
        let points = match mode {
            GestureMode::Dragon => self.dragon(pose, elapsed),
            GestureMode::Lotus  => self.lotus(pose, elapsed),
            GestureMode::Shield => self.shield(pose, elapsed),
            GestureMode::Dageng => self.dageng(pose, elapsed),
        };
        Formation { points }
    }

    /// Horizontal ring slowly turning about the vertical axis.
    pub fn idle(&self, elapsed: f32) -> Formation {
        let n = self.cfg.dragon_blades;
        let r = self.cfg.idle_radius;
        let points = (0..n)
            .map(|i| {
                let theta = TAU * i as f32 / n as f32 + elapsed * self.cfg.idle_spin;
                let (s, c) = theta.sin_cos();
                FormationPoint {
                    position: Vec3::new(r * c, 0.0, r * s),
                    heading:  Vec3::new(-s, 0.0, c),
                }
            })
            .collect();
        Formation { points }
    }

    /// World position of an image-space point.
    pub fn anchor(&self, image: Vec3) -> Vec3 {
        Vec3::new(
            self.mirror() * (image.x - 0.5) * self.cfg.world_width,
            (0.5 - image.y) * self.cfg.world_height,
            -image.z * self.cfg.depth_scale,
        )
    }

    /// Lotus size for a given hand spread.
    pub fn lotus_blade_count(&self, spread: f32) -> usize {
        let (lo, hi) = (self.cfg.lotus_min_blades, self.cfg.lotus_max_blades);
        lo + (self.openness(spread) * hi.saturating_sub(lo) as f32).round() as usize
    }

    fn mirror(&self) -> f32 {
        if self.cfg.mirror_x { -1.0 } else { 1.0 }
    }

    /// Spread remapped to `[0, 1]`.
    fn openness(&self, spread: f32) -> f32 {
        let range = self.cfg.spread_open - self.cfg.spread_closed;
        ((spread - self.cfg.spread_closed) / range).clamp(0.0, 1.0)
    }

    /// Image-space direction mapped through the same axes as `anchor`.
    fn world_direction(&self, image: Vec3, fallback: Vec3) -> Vec3 {
        Vec3::new(
            self.mirror() * image.x * self.cfg.world_width,
            -image.y * self.cfg.world_height,
            -image.z * self.cfg.depth_scale,
        )
        .try_normalize()
        .unwrap_or(fallback)
    }

    // ── layouts ───────────────────────────────────────────────────────────

    /// Blades trailing back from the fingertip, swaying like a serpent.
    fn dragon(&self, pose: &HandPose, t: f32) -> Vec<FormationPoint> {
        let n = self.cfg.dragon_blades;
        let tip = self.anchor(pose.index_tip);
        let dir = self.world_direction(pose.pointing, Vec3::Y);
        let side = dir.cross(Vec3::Z).try_normalize().unwrap_or(Vec3::X);
        let tail = (n.saturating_sub(1)).max(1) as f32;

        let mut points: Vec<FormationPoint> = Vec::with_capacity(n);
        for i in 0..n {
            let k = i as f32;
            let sway = self.cfg.dragon_sway * (k / tail) * (t * SWAY_RATE - k * SWAY_PHASE).sin();
            let position = tip - dir * (self.cfg.dragon_spacing * k) + side * sway;
            let heading = match points.last() {
                Some(ahead) => (ahead.position - position).try_normalize().unwrap_or(dir),
                None => dir,
            };
            points.push(FormationPoint { position, heading });
        }
        points
    }

    /// Phyllotaxis bloom around the palm; more and wider petals as the hand opens.
    fn lotus(&self, pose: &HandPose, t: f32) -> Vec<FormationPoint> {
        let n = self.lotus_blade_count(pose.spread);
        let max = self.cfg.lotus_max_blades.max(1) as f32;
        let centre = self.anchor(pose.palm_center);
        let radius = self.cfg.lotus_radius * (0.6 + 0.4 * self.openness(pose.spread));

        (0..n)
            .map(|i| {
                let theta = i as f32 * GOLDEN_ANGLE + t * self.cfg.lotus_spin;
                let (s, c) = theta.sin_cos();
                // Radius depends on the slot, not on the current count.
                let r = radius * ((i + 1) as f32 / max).sqrt();
                FormationPoint {
                    position: centre + Vec3::new(r * c, r * s, -LOTUS_CUP * r * r),
                    heading:  Vec3::new(c, s, LOTUS_TILT).normalize(),
                }
            })
            .collect()
    }

    /// Tight spinning ring in front of the palm, facing along the palm normal.
    fn shield(&self, pose: &HandPose, t: f32) -> Vec<FormationPoint> {
        let n = self.cfg.shield_blades;
        let normal = Vec3::new(
            self.mirror() * pose.palm_normal.x,
            -pose.palm_normal.y,
            -pose.palm_normal.z,
        )
        .try_normalize()
        .unwrap_or(Vec3::Z);
        let (u, v) = normal.any_orthonormal_pair();
        let centre = self.anchor(pose.palm_center) + normal * self.cfg.shield_offset;

        (0..n)
            .map(|i| {
                let theta = TAU * i as f32 / n as f32 + t * self.cfg.shield_spin;
                let (s, c) = theta.sin_cos();
                let radial = u * c + v * s;
                FormationPoint {
                    position: centre + radial * self.cfg.shield_radius,
                    heading:  radial,
                }
            })
            .collect()
    }

    /// Concentric rings, alternating spin, each tier set a little deeper.
    fn dageng(&self, pose: &HandPose, t: f32) -> Vec<FormationPoint> {
        let centre = self.anchor(pose.palm_center);
        let mut points = Vec::with_capacity(self.cfg.dageng_blades());

        for (ring, &count) in self.cfg.dageng_rings.iter().enumerate() {
            let spin = if ring % 2 == 0 { 1.0 } else { -1.0 };
            let radius = self.cfg.dageng_ring_spacing * (ring + 1) as f32;
            let depth = -DAGENG_TIER_DEPTH * ring as f32;
            for j in 0..count {
                let theta = TAU * j as f32 / count as f32 + spin * t * self.cfg.dageng_spin;
                let (s, c) = theta.sin_cos();
                points.push(FormationPoint {
                    position: centre + Vec3::new(radius * c, radius * s, depth),
                    heading:  Vec3::new(-s, c, 0.0) * spin,
                });
            }
        }
        points
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
