use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::Rng;
use rand::thread_rng;

use crate::constants::path;
use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::core::app_state::CollageState;

const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_COLOR: Color = Color::srgb(0.2, 1.0, 0.2);
const FALLBACK_VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

/// One displayed image plane.
#[derive(Component, Debug)]
pub struct ImagePlane {
    pub identifier: String,
}

/// Motion vector assigned at spawn and fixed for the entity's lifetime.
#[derive(Component, Debug, Clone, Copy)]
pub struct MotionVector {
    /// Heading angle in radians.
    pub angle: f32,
    /// Horizontal direction sign, -1 or +1.
    pub dx: f32,
    /// Vertical direction sign, -1 or +1.
    pub dy: f32,
}

impl MotionVector {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            angle: rng.gen_range(0.0..std::f32::consts::TAU),
            dx: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
            dy: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
        }
    }
}

/// Screen-space identifier overlay, 1:1 with its plane.
#[derive(Component, Debug)]
pub struct ImageLabel {
    pub target: Entity,
}

/// Full pool replacement request. Replacing with an empty list clears the
/// collage.
#[derive(Event, Debug, Clone)]
pub struct RebuildCollage {
    pub identifiers: Vec<String>,
    pub start_opacity: f32,
}

/// Uniform random position inside the centred viewport rectangle.
pub fn random_position<R: Rng>(rng: &mut R, viewport: Vec2) -> Vec2 {
    let half = (viewport * 0.5).max(Vec2::ONE);
    Vec2::new(
        rng.gen_range(-half.x..half.x),
        rng.gen_range(-half.y..half.y),
    )
}

/// Plane edge length: fixed, or uniform within the configured range.
pub fn random_extent<R: Rng>(rng: &mut R, config: &SwarmConfig) -> f32 {
    match config.random_size {
        Some(range) if range.max > range.min => rng.gen_range(range.min..range.max),
        Some(range) => range.min,
        None => config.fixed_size,
    }
}

/// Tear down every plane and label, then materialise the requested
/// selection in the same sync point, so no partial pool is ever observable
/// by the motion or label systems. Multiple requests in one frame collapse
/// to the last one. Image loading is fire-and-forget through the asset
/// server; a texture that never resolves leaves a blank plane, and a load
/// finishing after its entity was despawned dies with the handle.
pub fn rebuild_collage(
    mut requests: EventReader<RebuildCollage>,
    mut commands: Commands,
    planes: Query<Entity, With<ImagePlane>>,
    labels: Query<Entity, With<ImageLabel>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    asset_server: Res<AssetServer>,
    config: Res<SwarmConfig>,
    mut collage: ResMut<CollageState>,
) {
    let Some(request) = requests.read().last().cloned() else {
        return;
    };

    for entity in &planes {
        commands.entity(entity).despawn();
    }
    for entity in &labels {
        commands.entity(entity).despawn();
    }

    collage.generation = collage.generation.wrapping_add(1);
    collage.opacity = request.start_opacity;

    let viewport = windows
        .single()
        .map(|window| Vec2::new(window.width(), window.height()))
        .unwrap_or(FALLBACK_VIEWPORT);

    let mut rng = thread_rng();
    for identifier in &request.identifiers {
        let extent = random_extent(&mut rng, &config);
        let position = random_position(&mut rng, viewport);
        let image = asset_server.load(format!("{}/{}", path::IMAGE_BASE_PATH, identifier));

        let plane = commands
            .spawn((
                Sprite {
                    image,
                    custom_size: Some(Vec2::splat(extent)),
                    color: Color::srgba(1.0, 1.0, 1.0, request.start_opacity),
                    ..default()
                },
                Transform::from_translation(position.extend(0.0)),
                ImagePlane {
                    identifier: identifier.clone(),
                },
                MotionVector::random(&mut rng),
            ))
            .id();

        commands.spawn((
            Text::new(identifier.clone()),
            TextFont {
                font_size: LABEL_FONT_SIZE,
                ..default()
            },
            TextColor(LABEL_COLOR),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(0.0),
                top: Val::Px(0.0),
                ..default()
            },
            ImageLabel { target: plane },
        ));
    }

    info!(
        "Collage rebuilt: {} planes (generation {})",
        request.identifiers.len(),
        collage.generation
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::swarm_settings::SizeRange;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_position_stays_inside_viewport_halves() {
        let mut rng = StdRng::seed_from_u64(3);
        let viewport = Vec2::new(1920.0, 1080.0);
        for _ in 0..200 {
            let position = random_position(&mut rng, viewport);
            assert!(position.x >= -960.0 && position.x < 960.0);
            assert!(position.y >= -540.0 && position.y < 540.0);
        }
    }

    #[test]
    fn random_position_tolerates_degenerate_viewport() {
        let mut rng = StdRng::seed_from_u64(4);
        // A zero-sized window must not panic the spawn path.
        let position = random_position(&mut rng, Vec2::ZERO);
        assert!(position.x.abs() <= 1.0 && position.y.abs() <= 1.0);
    }

    #[test]
    fn random_extent_honours_configured_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = SwarmConfig {
            random_size: Some(SizeRange {
                min: 50.0,
                max: 250.0,
            }),
            ..default()
        };
        for _ in 0..200 {
            let extent = random_extent(&mut rng, &config);
            assert!((50.0..250.0).contains(&extent));
        }

        let fixed = SwarmConfig {
            random_size: None,
            fixed_size: 200.0,
            ..default()
        };
        assert_eq!(random_extent(&mut rng, &fixed), 200.0);
    }

    #[test]
    fn motion_vector_signs_are_unit() {
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..100 {
            let vector = MotionVector::random(&mut rng);
            assert!(vector.dx == 1.0 || vector.dx == -1.0);
            assert!(vector.dy == 1.0 || vector.dy == -1.0);
            assert!((0.0..std::f32::consts::TAU).contains(&vector.angle));
        }
    }
}
