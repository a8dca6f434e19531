use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-entity size range; sampled uniformly for every spawned plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: f32,
    pub max: f32,
}

/// Configuration surface for the swarm. The deployed page shipped four
/// near-identical script variants (different category sets, label styling,
/// enabled features); they collapse into this single resource.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Category names matched by substring against image identifiers.
    pub categories: Vec<String>,
    /// Upper bound on live planes per selection.
    pub max_images: usize,
    /// Translation per frame while a movement mode is active.
    pub movement_speed: f32,
    /// Wrap collage replacement in a fade-out/fade-in ramp.
    pub fade_enabled: bool,
    pub fade_duration_secs: f32,
    /// Randomised plane size; `None` falls back to `fixed_size`.
    pub random_size: Option<SizeRange>,
    pub fixed_size: f32,
    /// Expose the r/g/b/l metric sort shortcuts.
    pub sort_metrics_enabled: bool,
    /// How long the QR overlay stays up before auto-dismissing.
    pub qr_display_secs: f32,
    /// Dismissing the QR overlay also stops movement and reselects.
    pub reset_on_dismiss: bool,
    /// Vertical label anchor offset in CSS pixels.
    pub label_offset_px: f32,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            categories: vec!["Y1".into(), "Y2".into(), "Y3".into(), "Y4".into()],
            max_images: 50,
            movement_speed: 1.2,
            fade_enabled: true,
            fade_duration_secs: 0.4,
            random_size: Some(SizeRange {
                min: 50.0,
                max: 250.0,
            }),
            fixed_size: 200.0,
            sort_metrics_enabled: true,
            qr_display_secs: 7.0,
            reset_on_dismiss: false,
            label_offset_px: -10.0,
        }
    }
}
