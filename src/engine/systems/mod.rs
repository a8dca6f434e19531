/// Keyboard dispatch and synchronous command application.
pub mod input_commands;

/// Server-side metric sort: request issue, result queue, stale discard.
pub mod remote_sort;
