use bevy::prelude::*;

use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::catalog::image_catalog::{SortMetric, plan_selection};
use crate::engine::core::app_state::{CatalogStore, CollageState, SwarmCommand};
use crate::engine::swarm::entity_pool::RebuildCollage;
use crate::engine::swarm::fade::{FadeTransition, request_replacement};
use crate::engine::systems::remote_sort::{SortResultQueue, issue_sort_request};
use crate::rpc::capture_flow::{CaptureFlow, CapturePhase};

const CATEGORY_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Map key presses to commands. The deployed variants disagreed on the
/// bindings; this is their union, gated by configuration: digits select a
/// category, ArrowRight cycles, Space randomizes, X/ArrowDown toggles
/// movement, Q/ArrowLeft is the capture trigger, and r/g/b/l request a
/// metric sort when enabled (R falls back to randomize otherwise).
pub fn handle_keyboard_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    config: Res<SwarmConfig>,
    mut commands: EventWriter<SwarmCommand>,
) {
    for (index, key) in CATEGORY_KEYS
        .iter()
        .take(config.categories.len())
        .enumerate()
    {
        if keyboard.just_pressed(*key) {
            commands.write(SwarmCommand::SelectCategory(index));
        }
    }

    if keyboard.just_pressed(KeyCode::ArrowRight) {
        commands.write(SwarmCommand::CycleCategory);
    }
    if keyboard.just_pressed(KeyCode::Space) {
        commands.write(SwarmCommand::Randomize);
    }
    if keyboard.just_pressed(KeyCode::KeyX) || keyboard.just_pressed(KeyCode::ArrowDown) {
        commands.write(SwarmCommand::ToggleMovement);
    }
    if keyboard.just_pressed(KeyCode::KeyQ) || keyboard.just_pressed(KeyCode::ArrowLeft) {
        commands.write(SwarmCommand::CaptureTrigger);
    }

    if config.sort_metrics_enabled {
        if keyboard.just_pressed(KeyCode::KeyR) {
            commands.write(SwarmCommand::SortBy(SortMetric::Red));
        }
        if keyboard.just_pressed(KeyCode::KeyG) {
            commands.write(SwarmCommand::SortBy(SortMetric::Green));
        }
        if keyboard.just_pressed(KeyCode::KeyB) {
            commands.write(SwarmCommand::SortBy(SortMetric::Blue));
        }
        if keyboard.just_pressed(KeyCode::KeyL) {
            commands.write(SwarmCommand::SortBy(SortMetric::Luminance));
        }
    } else if keyboard.just_pressed(KeyCode::KeyR) {
        commands.write(SwarmCommand::Randomize);
    }
}

/// Apply queued commands synchronously. Selection commands recompute a plan
/// from the stored catalog and hand it to the fade/rebuild path; sort
/// commands go out to the server tagged with the current generation.
pub fn apply_swarm_commands(
    time: Res<Time>,
    config: Res<SwarmConfig>,
    catalog: Res<CatalogStore>,
    sort_queue: Res<SortResultQueue>,
    mut reader: EventReader<SwarmCommand>,
    mut collage: ResMut<CollageState>,
    mut fade: ResMut<FadeTransition>,
    mut capture: ResMut<CaptureFlow>,
    mut rebuilds: EventWriter<RebuildCollage>,
) {
    let now = time.elapsed_secs();

    for command in reader.read() {
        match command {
            SwarmCommand::SelectCategory(index) => {
                if *index >= config.categories.len() {
                    warn!("Ignoring out-of-range category index {index}");
                    continue;
                }
                collage.category_index = Some(*index);
                collage.sort_metric = None;
                info!("Category selected: {}", config.categories[*index]);
                reselect(&config, &catalog, &mut collage, &mut fade, &mut rebuilds, now);
            }
            SwarmCommand::CycleCategory => {
                if config.categories.is_empty() {
                    continue;
                }
                let next = collage
                    .category_index
                    .map(|index| (index + 1) % config.categories.len())
                    .unwrap_or(0);
                collage.category_index = Some(next);
                collage.sort_metric = None;
                info!("Category cycled to: {}", config.categories[next]);
                reselect(&config, &catalog, &mut collage, &mut fade, &mut rebuilds, now);
            }
            SwarmCommand::Randomize => {
                collage.category_index = None;
                collage.sort_metric = None;
                reselect(&config, &catalog, &mut collage, &mut fade, &mut rebuilds, now);
            }
            SwarmCommand::Reset => {
                reselect(&config, &catalog, &mut collage, &mut fade, &mut rebuilds, now);
            }
            SwarmCommand::SortBy(metric) => {
                if !config.sort_metrics_enabled {
                    continue;
                }
                collage.sort_metric = Some(*metric);
                let category = collage.current_category(&config).unwrap_or_default();
                info!(
                    "Requesting server sort: metric={} category={:?}",
                    metric.wire_name(),
                    category
                );
                issue_sort_request(sort_queue.0.clone(), collage.generation, *metric, category);
            }
            SwarmCommand::ToggleMovement => {
                collage.movement_mode = collage.movement_mode.cycled();
                info!("Movement mode: {:?}", collage.movement_mode);
            }
            SwarmCommand::CaptureTrigger => {
                if capture.register_press(now) {
                    if matches!(capture.phase, CapturePhase::Idle) {
                        info!("Capture trigger confirmed, starting snapshot");
                        capture.begin_capture(now);
                    } else {
                        info!("Capture already in progress, trigger ignored");
                    }
                }
            }
        }
    }
}

fn reselect(
    config: &SwarmConfig,
    catalog: &CatalogStore,
    collage: &mut CollageState,
    fade: &mut FadeTransition,
    rebuilds: &mut EventWriter<RebuildCollage>,
    now: f32,
) {
    let category = collage.current_category(config);
    let plan = plan_selection(&catalog.identifiers, category.as_deref(), config.max_images);
    if plan.is_empty() {
        warn!("No identifiers match category {:?}", category);
    }
    request_replacement(config, fade, rebuilds, collage, now, plan);
}
