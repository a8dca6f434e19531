use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::core::app_state::CollageState;
use crate::engine::swarm::entity_pool::{ImagePlane, MotionVector};

/// Axis along which planes translate each frame. A strict 3-state cycle;
/// horizontal and vertical are never active together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MovementMode {
    #[default]
    Off,
    Horizontal,
    Vertical,
}

impl MovementMode {
    pub fn cycled(self) -> Self {
        match self {
            MovementMode::Off => MovementMode::Horizontal,
            MovementMode::Horizontal => MovementMode::Vertical,
            MovementMode::Vertical => MovementMode::Off,
        }
    }
}

/// One frame of translation for a single plane.
pub fn advance(position: Vec2, vector: &MotionVector, mode: MovementMode, speed: f32) -> Vec2 {
    match mode {
        MovementMode::Off => position,
        MovementMode::Horizontal => Vec2::new(
            position.x + vector.angle.cos() * speed * vector.dx,
            position.y,
        ),
        MovementMode::Vertical => Vec2::new(
            position.x,
            position.y + vector.angle.sin() * speed * vector.dy,
        ),
    }
}

/// Wrap, not bounce: crossing `+half` lands on `-half` exactly and
/// symmetrically for the lower bound.
pub fn wrap_axis(value: f32, half_extent: f32) -> f32 {
    if value > half_extent {
        -half_extent
    } else if value < -half_extent {
        half_extent
    } else {
        value
    }
}

/// Advance every plane and wrap at the viewport edges. The extent is read
/// from the primary window each tick, so a resize is honoured without any
/// explicit resize handling.
pub fn update_motion(
    collage: Res<CollageState>,
    config: Res<SwarmConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut planes: Query<(&mut Transform, &MotionVector), With<ImagePlane>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let half = Vec2::new(window.width(), window.height()) * 0.5;

    for (mut transform, vector) in &mut planes {
        let moved = advance(
            transform.translation.truncate(),
            vector,
            collage.movement_mode,
            config.movement_speed,
        );
        transform.translation.x = wrap_axis(moved.x, half.x);
        transform.translation.y = wrap_axis(moved.y, half.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rightward() -> MotionVector {
        MotionVector {
            angle: 0.0,
            dx: 1.0,
            dy: 1.0,
        }
    }

    #[test]
    fn off_mode_never_translates() {
        let position = Vec2::new(10.0, -20.0);
        assert_eq!(
            advance(position, &rightward(), MovementMode::Off, 1.2),
            position
        );
    }

    #[test]
    fn horizontal_moves_x_only_and_vertical_y_only() {
        let position = Vec2::ZERO;
        let vector = MotionVector {
            angle: 0.0,
            dx: 1.0,
            dy: -1.0,
        };
        let horizontal = advance(position, &vector, MovementMode::Horizontal, 1.2);
        assert_eq!(horizontal, Vec2::new(1.2, 0.0));

        let vector = MotionVector {
            angle: std::f32::consts::FRAC_PI_2,
            dx: 1.0,
            dy: -1.0,
        };
        let vertical = advance(position, &vector, MovementMode::Vertical, 1.2);
        assert!(vertical.x.abs() < 1e-6);
        assert!((vertical.y + 1.2).abs() < 1e-6);
    }

    #[test]
    fn crossing_the_edge_wraps_exactly() {
        let half = 640.0;
        // One horizontal tick past the edge must land on -half, not clamp.
        let start = Vec2::new(half + 0.5, 0.0);
        let moved = advance(start, &rightward(), MovementMode::Horizontal, 1.2);
        assert_eq!(wrap_axis(moved.x, half), -half);
        assert_eq!(wrap_axis(-half - 0.1, half), half);
        assert_eq!(wrap_axis(0.0, half), 0.0);
        assert_eq!(wrap_axis(half, half), half);
    }

    #[test]
    fn three_toggles_return_to_off() {
        let mut mode = MovementMode::Off;
        let mut seen = Vec::new();
        for _ in 0..3 {
            mode = mode.cycled();
            seen.push(mode);
        }
        assert_eq!(
            seen,
            vec![
                MovementMode::Horizontal,
                MovementMode::Vertical,
                MovementMode::Off
            ]
        );
    }
}
