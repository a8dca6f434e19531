use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

mod constants;
mod engine;
mod error;
mod rpc;

use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::catalog::catalog_loader::{
    CatalogLoader, poll_catalog, reload_catalog_on_key, start_catalog_loading,
};
use crate::engine::catalog::image_catalog::ImageCatalog;
use crate::engine::core::app_state::{AppState, CatalogStore, CollageState, SwarmCommand};
use crate::engine::core::window_config::create_window_config;
use crate::engine::swarm::entity_pool::{RebuildCollage, rebuild_collage};
use crate::engine::swarm::fade::{FadeTransition, update_fade_transition};
use crate::engine::swarm::labels::update_labels;
use crate::engine::swarm::motion::update_motion;
use crate::engine::systems::input_commands::{apply_swarm_commands, handle_keyboard_input};
use crate::engine::systems::remote_sort::{SortResultQueue, drain_sort_results};
use crate::rpc::capture_flow::{
    CaptureFlow, UploadResultQueue, advance_capture, auto_dismiss_overlay,
    capture_debounce_window, drain_upload_results,
};
use crate::rpc::page_commands::drain_page_commands;

#[cfg(target_arch = "wasm32")]
use crate::rpc::page_commands::setup_page_command_listener;

fn main() {
    let mut app = create_app();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}

fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        // Registers the image catalog as a loadable asset type from JSON.
        .add_plugins(JsonAssetPlugin::<ImageCatalog>::new(&["json"]))
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .init_state::<AppState>();

    app.init_resource::<SwarmConfig>()
        .init_resource::<CollageState>()
        .init_resource::<CatalogStore>()
        .init_resource::<CatalogLoader>()
        .init_resource::<FadeTransition>()
        .init_resource::<SortResultQueue>()
        .init_resource::<CaptureFlow>()
        .init_resource::<UploadResultQueue>()
        .add_event::<SwarmCommand>()
        .add_event::<RebuildCollage>();

    app.add_systems(Startup, (setup, start_catalog_loading).chain());

    #[cfg(target_arch = "wasm32")]
    app.add_systems(Startup, setup_page_command_listener);

    // Loading phase: poll the catalog, allow the explicit reload key.
    app.add_systems(
        Update,
        (poll_catalog, reload_catalog_on_key)
            .chain()
            .run_if(in_state(AppState::Loading))
            .before(drain_sort_results),
    );

    // Command intake only once the catalog is in.
    app.add_systems(
        Update,
        (handle_keyboard_input, drain_page_commands, apply_swarm_commands)
            .chain()
            .run_if(in_state(AppState::Ready))
            .before(drain_sort_results),
    );

    // The per-frame tick. Runs in every state (an empty pool always ticks
    // safely); motion must precede label projection, and a rebuild runs to
    // completion before either reads the pool.
    app.add_systems(
        Update,
        (
            drain_sort_results,
            update_fade_transition,
            rebuild_collage,
            update_motion,
            update_labels,
            capture_debounce_window,
            advance_capture,
            drain_upload_results,
            auto_dismiss_overlay,
        )
            .chain(),
    );

    app.add_systems(Update, fps_text_update_system);

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

fn setup(mut commands: Commands) {
    println!("=== IMAGE SWARM RENDER ENGINE ===");
    commands.spawn(Camera2d);
    spawn_ui(&mut commands);
}

#[derive(Component)]
struct FpsText;

fn spawn_ui(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
        });
}

fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                text.0 = format!("FPS: {value:.1}");
            }
        }
    }
}
