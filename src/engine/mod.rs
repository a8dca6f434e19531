//! Scene lifecycle and animation engine for the image swarm.

/// Image catalog asset, category filtering and uniform selection.
pub mod catalog;

/// Application state machine and process-wide collage state.
pub mod core;

/// Live entity pool, per-frame motion and label projection.
pub mod swarm;

/// Command dispatch and remote sort integration.
pub mod systems;
