//! Browser interop: page command bridge and the snapshot-to-QR flow.

/// `window.postMessage` bridge mirroring the page's UI buttons 1:1.
pub mod page_commands;

/// Capture -> upload -> display state machine with debounce and retry.
pub mod capture_flow;
