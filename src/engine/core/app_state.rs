use bevy::prelude::*;

use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::catalog::image_catalog::SortMetric;
use crate::engine::swarm::motion::MovementMode;

/// Top-level lifecycle. The tick loop runs in both states; ticking an empty
/// pool is always safe. A failed catalog load keeps the app in `Loading`
/// until the reload key is pressed.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    Ready,
}

/// The single owner of process-wide collage state. Only command handling
/// and the per-frame swarm systems mutate this, always on the main schedule.
#[derive(Resource, Debug)]
pub struct CollageState {
    /// Active category filter; `None` means unfiltered.
    pub category_index: Option<usize>,
    /// Active server-side sort metric; `None` means catalog order.
    pub sort_metric: Option<SortMetric>,
    pub movement_mode: MovementMode,
    /// Pool-wide opacity, driven by the fade ramp.
    pub opacity: f32,
    /// Bumped by every rebuild. Asynchronous continuations carry the
    /// generation at issue time and discard themselves when it is stale.
    pub generation: u64,
}

impl Default for CollageState {
    fn default() -> Self {
        Self {
            category_index: Some(0),
            sort_metric: None,
            movement_mode: MovementMode::Off,
            opacity: 1.0,
            generation: 0,
        }
    }
}

impl CollageState {
    pub fn current_category(&self, config: &SwarmConfig) -> Option<String> {
        self.category_index
            .and_then(|index| config.categories.get(index).cloned())
    }
}

/// Identifier list retained after the catalog asset resolves, so selection
/// commands never re-fetch.
#[derive(Resource, Default)]
pub struct CatalogStore {
    pub identifiers: Vec<String>,
}

/// User-facing commands. Keyboard input and the page command bridge both
/// emit these; they are applied synchronously on the main schedule.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum SwarmCommand {
    SelectCategory(usize),
    CycleCategory,
    Randomize,
    SortBy(SortMetric),
    ToggleMovement,
    CaptureTrigger,
    /// Reselect for the current category; issued by the QR dismiss policy.
    Reset,
}
