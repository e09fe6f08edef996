//! Shared crate-wide constants.

use std::time::Duration;

/// Cadence at which an active drag polls the pointer.
///
/// Pointer motion outside the dragged handle is not delivered to it, so the
/// detector samples the global pointer instead. 50 ms keeps reordering
/// responsive without flooding subscribers with updates.
pub const DRAG_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Only show a window's handle on the panel of the monitor the window is on.
pub const ISOLATE_MONITORS: bool = true;

/// Only show a window's handle while its workspace is the active one.
pub const ISOLATE_WORKSPACES: bool = true;

/// File name of the persisted window order inside the state directory.
pub const ORDER_FILE_NAME: &str = "window-order.json";
