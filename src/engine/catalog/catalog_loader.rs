use bevy::asset::LoadState;
use bevy::prelude::*;

use crate::constants::path;
use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::catalog::image_catalog::{ImageCatalog, plan_selection};
use crate::engine::core::app_state::{AppState, CatalogStore, CollageState};
use crate::engine::swarm::entity_pool::RebuildCollage;
use crate::error::SwarmError;

#[derive(Resource, Default)]
pub struct CatalogLoader {
    handle: Option<Handle<ImageCatalog>>,
    failed: bool,
}

/// Issue the catalog fetch on startup. The asset server resolves it over
/// HTTP in browser builds and from the asset directory natively.
pub fn start_catalog_loading(
    mut loader: ResMut<CatalogLoader>,
    asset_server: Res<AssetServer>,
) {
    info!("Loading image catalog from {}", path::RELATIVE_CATALOG_PATH);
    loader.handle = Some(asset_server.load(path::RELATIVE_CATALOG_PATH));
}

/// Poll the catalog while Loading. Success stores the identifiers,
/// materialises the initial selection and transitions to Ready. Failure or
/// an empty catalog is `CatalogUnavailable`: no entities are spawned, the
/// previously displayed collage (none, on boot) is untouched, and the app
/// stays in Loading until the reload key is pressed.
pub fn poll_catalog(
    mut loader: ResMut<CatalogLoader>,
    asset_server: Res<AssetServer>,
    catalogs: Res<Assets<ImageCatalog>>,
    config: Res<SwarmConfig>,
    mut store: ResMut<CatalogStore>,
    collage: Res<CollageState>,
    mut rebuilds: EventWriter<RebuildCollage>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    // Cloned so the loader can be mutated below without fighting the borrow.
    let Some(handle) = loader.handle.clone() else {
        return;
    };

    if let Some(catalog) = catalogs.get(&handle) {
        let identifiers = catalog.identifiers();
        if identifiers.is_empty() {
            if !loader.failed {
                error!(
                    "{}",
                    SwarmError::CatalogUnavailable("catalog contains no identifiers".into())
                );
                loader.failed = true;
            }
            return;
        }

        info!("Catalog loaded: {} identifiers", identifiers.len());
        store.identifiers = identifiers.to_vec();
        loader.failed = false;

        let category = collage.current_category(&config);
        let identifiers = plan_selection(&store.identifiers, category.as_deref(), config.max_images);
        rebuilds.write(RebuildCollage {
            identifiers,
            start_opacity: 1.0,
        });
        next_state.set(AppState::Ready);
    } else if matches!(
        asset_server.get_load_state(&handle),
        Some(LoadState::Failed(_))
    ) && !loader.failed
    {
        error!(
            "{}",
            SwarmError::CatalogUnavailable(path::RELATIVE_CATALOG_PATH.into())
        );
        loader.failed = true;
    }
}

/// No automatic retry: a failed catalog load waits for an explicit key press.
pub fn reload_catalog_on_key(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut loader: ResMut<CatalogLoader>,
    asset_server: Res<AssetServer>,
) {
    if loader.failed && keyboard.just_pressed(KeyCode::KeyR) {
        info!("Reloading image catalog");
        loader.failed = false;
        asset_server.reload(path::RELATIVE_CATALOG_PATH);
    }
}
