//! The live entity pool and its per-frame systems.
//!
//! Frame order matters: rebuild runs to completion before motion reads the
//! pool, and motion runs before label projection.

/// Pool ownership: the rebuild system is the only code that adds or removes
/// collage entities.
pub mod entity_pool;

/// Movement modes, per-frame translation and viewport edge wrapping.
pub mod motion;

/// Screen-space label projection from plane world positions.
pub mod labels;

/// Elapsed-time fade-out/replace/fade-in ramp around pool replacement.
pub mod fade;
