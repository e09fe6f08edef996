//! A multi-monitor taskbar window list.
//!
//! Every monitor gets a panel with a favorites launcher strip and a window
//! list. Buttons on either strip can be reordered by dragging them; window
//! buttons can also be dragged onto another monitor's panel, which moves the
//! window there. A single [`WindowOrder`] is shared by all monitors and is
//! persisted so the order survives restarts.
//!
//! The crate never talks to a real windowing system. Shell services come in
//! through the traits in [`host`]; [`headless::HeadlessShell`] implements them
//! in memory for the demo binary and the tests.

pub mod config;
pub mod constants;
pub mod dnd;
pub mod drivers;
pub mod error;
pub mod event_loop;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod order;
pub mod panel;
pub mod taskbar;
pub mod theme;
pub mod timer;
pub mod tracing_sub;
pub mod ui;
pub mod view;

pub use config::TaskbarConfig;
pub use dnd::{DragDropManager, DragEvent, DragState, SharedPointer};
pub use error::{Result, TaskbarError};
pub use geometry::{Bounds, MonitorIndex, Point};
pub use headless::HeadlessShell;
pub use host::ShellHost;
pub use order::{FileOrderStore, MemoryOrderStore, OrderStore, WindowId, WindowOrder};
pub use taskbar::{MonitorViews, Taskbar};
pub use timer::{IntervalTimers, TimerId, TimerSource};
pub use view::{AppId, Container, HandleId, ScrollDirection};
