//! Pipeline configuration.
//!
//! [`PipelineConfig`] carries every tunable the pipeline reads: detector
//! gating, gesture debounce, formation layout and camera framing. It is
//! fixed once the pipeline starts; the front-end may load it from a JSON
//! file at startup, with any omitted field falling back to its default.
//!
//! ```rust
//! use formation_core::config::PipelineConfig;
//!
//! let cfg = PipelineConfig::default();
//! cfg.validate().expect("defaults are valid");
//! assert_eq!(cfg.gesture.confirmation_frames, 5);
//! assert!(cfg.camera.zoom_max_dageng > cfg.camera.zoom_max_default);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// PipelineConfig
// ════════════════════════════════════════════════════════════════════════════

/// Complete configuration for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub normalizer: NormalizerConfig,
    pub gesture:    GestureConfig,
    pub layout:     LayoutConfig,
    pub camera:     CameraConfig,
    /// Render frames a fresh pose may be re-used for when the detector has
    /// not delivered anything new.  Past this, the hand counts as absent.
    pub stale_frame_limit: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            normalizer: NormalizerConfig::default(),
            gesture:    GestureConfig::default(),
            layout:     LayoutConfig::default(),
            camera:     CameraConfig::default(),
            stale_frame_limit: 3,
        }
    }
}

/// Detector gating and finger-extension heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Minimum detector presence score for a hand to be used.
    pub min_confidence: f32,
    /// A finger is extended when its tip is this many times farther from the
    /// reference joint than its middle joint is.
    pub extension_ratio: f32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig { min_confidence: 0.5, extension_ratio: 1.1 }
    }
}

/// Debounce thresholds, counted in detector observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Consecutive matching candidates needed to switch mode.
    pub confirmation_frames: u32,
    /// Consecutive present observations before tracking turns on.
    pub acquire_frames: u32,
    /// Consecutive absent observations before tracking turns off.
    pub loss_grace_frames: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            confirmation_frames: 5,
            acquire_frames:      2,
            loss_grace_frames:   8,
        }
    }
}

/// World mapping and per-mode formation geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// World units spanned by the full image width / height.
    pub world_width:  f32,
    pub world_height: f32,
    /// World units per unit of detector depth.
    pub depth_scale:  f32,
    /// Mirror x so the scene behaves like a selfie view.
    pub mirror_x:     bool,

    pub dragon_blades:  usize,
    pub dragon_spacing: f32,
    pub dragon_sway:    f32,

    pub lotus_min_blades: usize,
    pub lotus_max_blades: usize,
    pub lotus_radius:     f32,
    /// Hand spread (palm units) mapped to the smallest / largest lotus.
    pub spread_closed:    f32,
    pub spread_open:      f32,
    pub lotus_spin:       f32,

    pub shield_blades: usize,
    pub shield_radius: f32,
    pub shield_offset: f32,
    pub shield_spin:   f32,

    /// Blade count of each concentric ring, innermost first.
    pub dageng_rings:        Vec<usize>,
    pub dageng_ring_spacing: f32,
    pub dageng_spin:         f32,

    pub idle_radius: f32,
    pub idle_spin:   f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            world_width:  40.0,
            world_height: 24.0,
            depth_scale:  20.0,
            mirror_x:     true,

            dragon_blades:  9,
            dragon_spacing: 1.6,
            dragon_sway:    0.6,

            lotus_min_blades: 18,
            lotus_max_blades: 36,
            lotus_radius:     9.0,
            spread_closed:    0.6,
            spread_open:      1.2,
            lotus_spin:       0.25,

            shield_blades: 12,
            shield_radius: 3.5,
            shield_offset: 1.5,
            shield_spin:   1.2,

            dageng_rings:        vec![12, 24, 36],
            dageng_ring_spacing: 6.0,
            dageng_spin:         0.4,

            idle_radius: 6.0,
            idle_spin:   0.3,
        }
    }
}

impl LayoutConfig {
    /// Total blades in the DAGENG formation.
    pub fn dageng_blades(&self) -> usize {
        self.dageng_rings.iter().sum()
    }
}

/// Camera framing and smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub zoom_min:         f32,
    pub zoom_max_default: f32,
    pub zoom_max_dageng:  f32,
    pub span_scale:       f32,
    pub span_padding:     f32,
    /// Span assumed when the formation is empty.
    pub default_span:     f32,
    pub wide_screen_multiplier: f32,
    /// Fraction of the remaining distance covered per reference frame.
    pub smoothing_factor: f32,
    /// Frame rate at which `smoothing_factor` applies verbatim.
    pub reference_hz:     f32,
    /// Longest frame step honoured by the smoother (seconds).
    pub max_frame_dt:     f32,

    /// Idle wander: amplitude and angular frequency per axis (x, y).
    pub idle_amplitude: [f32; 2],
    pub idle_frequency: [f32; 2],

    /// Camera position = (target.x · k, target.y · k + lift, zoom).
    pub position_follow: [f32; 2],
    pub position_lift:   f32,
    /// Look-at = (target.x · k, target.y · k, depth).
    pub look_follow:     [f32; 2],
    pub look_depth:      f32,

    pub initial_position: [f32; 3],
    pub initial_zoom:     f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            zoom_min:         35.0,
            zoom_max_default: 80.0,
            zoom_max_dageng:  90.0,
            span_scale:       1.2,
            span_padding:     25.0,
            default_span:     10.0,
            wide_screen_multiplier: 1.1,
            smoothing_factor: 0.05,
            reference_hz:     60.0,
            max_frame_dt:     0.1,

            idle_amplitude: [6.0, 4.0],
            idle_frequency: [0.5, 0.4],

            position_follow: [0.3, 0.2],
            position_lift:   5.0,
            look_follow:     [0.4, 0.25],
            look_depth:      2.0,

            initial_position: [0.0, 5.0, 45.0],
            initial_zoom:     40.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Loading / validation
// ════════════════════════════════════════════════════════════════════════════

impl PipelineConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: PipelineConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every field and report the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = &self.normalizer;
        if !(0.0..=1.0).contains(&n.min_confidence) {
            return Err(ConfigError::invalid_value("min_confidence", "must be within [0, 1]"));
        }
        if !(n.extension_ratio > 0.0) {
            return Err(ConfigError::invalid_value("extension_ratio", "must be > 0"));
        }

        let g = &self.gesture;
        if g.confirmation_frames == 0 {
            return Err(ConfigError::invalid_value("confirmation_frames", "must be >= 1"));
        }
        if g.acquire_frames == 0 {
            return Err(ConfigError::invalid_value("acquire_frames", "must be >= 1"));
        }
        if g.loss_grace_frames == 0 {
            return Err(ConfigError::invalid_value("loss_grace_frames", "must be >= 1"));
        }

        let l = &self.layout;
        if !(l.world_width > 0.0 && l.world_height > 0.0) {
            return Err(ConfigError::invalid_value("world_width", "world extent must be > 0"));
        }
        if l.dragon_blades == 0 {
            return Err(ConfigError::invalid_value("dragon_blades", "must be >= 1"));
        }
        if l.lotus_min_blades == 0 || l.lotus_min_blades > l.lotus_max_blades {
            return Err(ConfigError::invalid_value(
                "lotus_min_blades",
                "must be >= 1 and <= lotus_max_blades",
            ));
        }
        if !(l.spread_open > l.spread_closed) {
            return Err(ConfigError::invalid_value("spread_open", "must exceed spread_closed"));
        }
        if l.shield_blades == 0 {
            return Err(ConfigError::invalid_value("shield_blades", "must be >= 1"));
        }
        if l.dageng_rings.is_empty() || l.dageng_rings.contains(&0) {
            return Err(ConfigError::invalid_value("dageng_rings", "rings must be non-empty"));
        }

        let c = &self.camera;
        let scalars = [
            ("zoom_min", c.zoom_min),
            ("zoom_max_default", c.zoom_max_default),
            ("zoom_max_dageng", c.zoom_max_dageng),
            ("span_scale", c.span_scale),
            ("span_padding", c.span_padding),
            ("default_span", c.default_span),
            ("wide_screen_multiplier", c.wide_screen_multiplier),
            ("smoothing_factor", c.smoothing_factor),
            ("reference_hz", c.reference_hz),
            ("max_frame_dt", c.max_frame_dt),
            ("position_lift", c.position_lift),
            ("look_depth", c.look_depth),
            ("initial_zoom", c.initial_zoom),
        ];
        let vectors = [
            ("idle_amplitude", &c.idle_amplitude[..]),
            ("idle_frequency", &c.idle_frequency[..]),
            ("position_follow", &c.position_follow[..]),
            ("look_follow", &c.look_follow[..]),
            ("initial_position", &c.initial_position[..]),
        ];
        if let Some((field, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::invalid_value(*field, "must be finite"));
        }
        if let Some((field, _)) = vectors.iter().find(|(_, v)| v.iter().any(|x| !x.is_finite())) {
            return Err(ConfigError::invalid_value(*field, "must be finite"));
        }
        if !(c.zoom_min > 0.0) {
            return Err(ConfigError::invalid_value("zoom_min", "must be > 0"));
        }
        if c.zoom_max_default < c.zoom_min || c.zoom_max_dageng < c.zoom_min {
            return Err(ConfigError::invalid_value("zoom_max_default", "zoom maxima must be >= zoom_min"));
        }
        if !(c.smoothing_factor > 0.0 && c.smoothing_factor <= 1.0) {
            return Err(ConfigError::invalid_value("smoothing_factor", "must be within (0, 1]"));
        }
        if !(c.reference_hz > 0.0) {
            return Err(ConfigError::invalid_value("reference_hz", "must be > 0"));
        }
        if !(c.max_frame_dt > 0.0) {
            return Err(ConfigError::invalid_value("max_frame_dt", "must be > 0"));
        }
        if !(c.default_span >= 0.0) {
            return Err(ConfigError::invalid_value("default_span", "must be >= 0"));
        }
        if c.initial_zoom < c.zoom_min {
            return Err(ConfigError::invalid_value("initial_zoom", "must be >= zoom_min"));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
