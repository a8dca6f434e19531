use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::swarm::entity_pool::{ImageLabel, ImagePlane};

/// Project a world position through the centred orthographic camera to
/// normalized device coordinates. With the 2D camera one world unit is one
/// pixel and the origin sits at the viewport centre.
pub fn world_to_ndc(world: Vec2, viewport: Vec2) -> Vec2 {
    let viewport = viewport.max(Vec2::ONE);
    Vec2::new(2.0 * world.x / viewport.x, 2.0 * world.y / viewport.y)
}

/// NDC to CSS pixels. Y flips because screen space grows downward while
/// NDC grows upward.
pub fn ndc_to_screen(ndc: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        (ndc.x * 0.5 + 0.5) * viewport.x,
        (1.0 - (ndc.y * 0.5 + 0.5)) * viewport.y,
    )
}

/// Horizontal centring: the overlay anchors its left edge, so shift by half
/// the laid-out text width to centre it over the plane.
pub fn centered_left(anchor_x: f32, label_width: f32) -> f32 {
    anchor_x - label_width * 0.5
}

/// Re-derive every label's overlay position from its plane, after motion has
/// run. A label whose plane is gone this frame is skipped; the rebuild
/// system despawns the pair together.
pub fn update_labels(
    windows: Query<&Window, With<PrimaryWindow>>,
    config: Res<SwarmConfig>,
    planes: Query<&Transform, With<ImagePlane>>,
    mut labels: Query<(&ImageLabel, &mut Node, &ComputedNode)>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let viewport = Vec2::new(window.width(), window.height());

    for (label, mut node, computed) in &mut labels {
        let Ok(transform) = planes.get(label.target) else {
            continue;
        };
        let ndc = world_to_ndc(transform.translation.truncate(), viewport);
        let screen = ndc_to_screen(ndc, viewport);
        let width = computed.size().x * computed.inverse_scale_factor();
        node.left = Val::Px(centered_left(screen.x, width));
        node.top = Val::Px(screen.y + config.label_offset_px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(1600.0, 900.0);

    #[test]
    fn world_origin_projects_to_viewport_centre() {
        let ndc = world_to_ndc(Vec2::ZERO, VIEWPORT);
        assert_eq!(ndc, Vec2::ZERO);
        assert_eq!(ndc_to_screen(ndc, VIEWPORT), Vec2::new(800.0, 450.0));
    }

    #[test]
    fn upper_right_ndc_is_screen_top_right() {
        let screen = ndc_to_screen(Vec2::new(1.0, 1.0), VIEWPORT);
        assert_eq!(screen, Vec2::new(1600.0, 0.0));
    }

    #[test]
    fn y_axis_is_flipped() {
        // World +y (up) must map to a smaller screen y (towards the top).
        let up = world_to_ndc(Vec2::new(0.0, 225.0), VIEWPORT);
        let screen = ndc_to_screen(up, VIEWPORT);
        assert_eq!(screen, Vec2::new(800.0, 225.0));
        assert!(screen.y < 450.0);
    }

    #[test]
    fn labels_centre_over_their_anchor() {
        // An 80 px label anchored at x=800 spans 760..840.
        assert_eq!(centered_left(800.0, 80.0), 760.0);
        // Width is unknown on the first layout pass; the anchor is unchanged.
        assert_eq!(centered_left(800.0, 0.0), 800.0);
    }

    #[test]
    fn viewport_edges_project_to_screen_corners() {
        let corner = world_to_ndc(Vec2::new(-800.0, -450.0), VIEWPORT);
        assert_eq!(corner, Vec2::new(-1.0, -1.0));
        assert_eq!(ndc_to_screen(corner, VIEWPORT), Vec2::new(0.0, 900.0));
    }
}
