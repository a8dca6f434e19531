use bevy::prelude::*;

use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::core::app_state::CollageState;
use crate::engine::swarm::entity_pool::{ImagePlane, RebuildCollage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    Out,
    In,
}

#[derive(Debug, Clone)]
pub struct ActiveFade {
    pub phase: FadePhase,
    pub from: f32,
    pub started_at: f32,
    pub duration: f32,
    /// Selection swapped in at the bottom of the fade-out.
    pub pending: Option<Vec<String>>,
}

/// The single fade ramp. Driven by elapsed time rather than fixed-step
/// polling, so it is frame-rate independent. A replace request arriving
/// mid-fade overwrites the ramp in place, restarting from the pool's
/// current opacity; nothing queues and a stale ramp cannot fire.
#[derive(Resource, Default)]
pub struct FadeTransition {
    pub active: Option<ActiveFade>,
}

impl FadeTransition {
    pub fn begin(&mut self, from: f32, now: f32, duration: f32, identifiers: Vec<String>) {
        self.active = Some(ActiveFade {
            phase: FadePhase::Out,
            from,
            started_at: now,
            duration,
            pending: Some(identifiers),
        });
    }
}

/// Linear opacity ramp, clamped to the endpoints.
pub fn sample(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Route a replacement either through the fade ramp or straight to the
/// rebuild event, per configuration.
pub fn request_replacement(
    config: &SwarmConfig,
    fade: &mut FadeTransition,
    rebuilds: &mut EventWriter<RebuildCollage>,
    collage: &CollageState,
    now: f32,
    identifiers: Vec<String>,
) {
    if config.fade_enabled {
        fade.begin(collage.opacity, now, config.fade_duration_secs, identifiers);
    } else {
        rebuilds.write(RebuildCollage {
            identifiers,
            start_opacity: 1.0,
        });
    }
}

/// Advance the active ramp: opacity runs current -> 0, the pool is swapped
/// at the bottom, then 0 -> 1 over the new planes.
pub fn update_fade_transition(
    time: Res<Time>,
    mut fade: ResMut<FadeTransition>,
    mut collage: ResMut<CollageState>,
    mut rebuilds: EventWriter<RebuildCollage>,
    mut planes: Query<&mut Sprite, With<ImagePlane>>,
) {
    let Some(mut active) = fade.active.take() else {
        return;
    };

    let now = time.elapsed_secs();
    let t = if active.duration <= f32::EPSILON {
        1.0
    } else {
        ((now - active.started_at) / active.duration).clamp(0.0, 1.0)
    };
    let target = match active.phase {
        FadePhase::Out => 0.0,
        FadePhase::In => 1.0,
    };
    let opacity = sample(active.from, target, t);

    collage.opacity = opacity;
    for mut sprite in &mut planes {
        sprite.color.set_alpha(opacity);
    }

    if t < 1.0 {
        fade.active = Some(active);
        return;
    }

    match active.phase {
        FadePhase::Out => {
            let identifiers = active.pending.take().unwrap_or_default();
            rebuilds.write(RebuildCollage {
                identifiers,
                start_opacity: 0.0,
            });
            fade.active = Some(ActiveFade {
                phase: FadePhase::In,
                from: 0.0,
                started_at: now,
                duration: active.duration,
                pending: None,
            });
        }
        FadePhase::In => {
            collage.opacity = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_clamped_and_monotonic() {
        assert_eq!(sample(1.0, 0.0, -0.5), 1.0);
        assert_eq!(sample(1.0, 0.0, 0.0), 1.0);
        assert_eq!(sample(1.0, 0.0, 0.5), 0.5);
        assert_eq!(sample(1.0, 0.0, 1.0), 0.0);
        assert_eq!(sample(1.0, 0.0, 2.0), 0.0);

        let mut last = 1.0;
        for step in 0..=10 {
            let value = sample(1.0, 0.0, step as f32 / 10.0);
            assert!(value <= last);
            last = value;
        }
    }

    #[test]
    fn restarting_mid_fade_resumes_from_current_opacity() {
        let mut fade = FadeTransition::default();
        fade.begin(1.0, 0.0, 0.4, vec!["a.png".into()]);

        // Halfway down, a second replace request arrives.
        let mid = sample(1.0, 0.0, 0.5);
        fade.begin(mid, 0.2, 0.4, vec!["b.png".into()]);

        let active = fade.active.as_ref().unwrap();
        assert_eq!(active.phase, FadePhase::Out);
        assert_eq!(active.from, 0.5);
        assert_eq!(active.pending.as_deref(), Some(&["b.png".to_string()][..]));
    }

    #[test]
    fn zero_duration_completes_immediately() {
        // t is forced to 1.0 when the configured duration is degenerate.
        assert_eq!(sample(0.7, 0.0, 1.0), 0.0);
    }
}
