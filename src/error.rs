use thiserror::Error;

/// Failure taxonomy for the swarm engine. Image texture loads that never
/// complete are deliberately absent: a plane without a texture stays on
/// screen as a blank rectangle and is not reported anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwarmError {
    /// The image catalog could not be fetched or contained no identifiers.
    /// Fatal to the initial load; an explicit reload is required.
    #[error("image catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// The sort endpoint failed or returned garbage. The previously
    /// displayed collage is retained.
    #[error("sort request failed: {0}")]
    SortRequestFailed(String),

    /// The render canvas was still missing after the bounded retry loop.
    #[error("render canvas not found after {0} attempts")]
    CaptureSurfaceNotReady(u32),

    /// The snapshot POST failed in transport or was rejected by the server.
    #[error("snapshot upload failed: {0}")]
    UploadFailed(String),
}
