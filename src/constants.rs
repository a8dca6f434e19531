/// Catalog, endpoint and DOM overlay path constants.
pub mod path;

/// Runtime configuration collapsing the deployment variants into one surface.
pub mod swarm_settings;
