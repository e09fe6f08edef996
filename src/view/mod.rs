//! Per-monitor views: the favorites launcher strip and the window list.

pub mod favorites;
pub mod window_list;

use crate::geometry::{Bounds, MonitorIndex};
use crate::order::WindowId;

pub use favorites::{AppId, FavoritesView};
pub use window_list::{ScrollDirection, WindowListView};

/// Which of a panel's two containers a handle lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Container {
    Favorites,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Window(WindowId),
    /// Favorites are identified by a per-view serial so recreating the
    /// favorites list never collides with handles still being torn down.
    Favorite(u64),
}

/// A button on a specific monitor's panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId {
    pub monitor: MonitorIndex,
    pub slot: Slot,
}

impl HandleId {
    pub const fn window(monitor: MonitorIndex, window: WindowId) -> Self {
        Self {
            monitor,
            slot: Slot::Window(window),
        }
    }

    pub const fn favorite(monitor: MonitorIndex, serial: u64) -> Self {
        Self {
            monitor,
            slot: Slot::Favorite(serial),
        }
    }

    pub fn window_id(&self) -> Option<WindowId> {
        match self.slot {
            Slot::Window(window) => Some(window),
            Slot::Favorite(_) => None,
        }
    }

    pub fn container(&self) -> Container {
        match self.slot {
            Slot::Window(_) => Container::Windows,
            Slot::Favorite(_) => Container::Favorites,
        }
    }
}

/// Local index of the visible child closest to `x`, measured horizontally
/// (zero inside a child). Ties resolve to the earliest child.
///
/// `children` holds `(local index, container-local bounds)` of the visible
/// children in container order.
pub fn nearest_index(children: &[(usize, Bounds)], x: i32) -> Option<usize> {
    children
        .iter()
        .min_by_key(|(_, bounds)| bounds.horizontal_distance(x))
        .map(|(index, _)| *index)
}

/// Where a dragged handle should go for pointer position `x`.
///
/// When the moving handle is hidden (it belongs to another monitor and is
/// being dragged in from there) and the pointer is nearest to the last
/// visible child, the handle goes after that child rather than onto it.
pub fn insertion_index(
    children: &[(usize, Bounds)],
    x: i32,
    moving_visible: bool,
) -> Option<usize> {
    let nearest = nearest_index(children, x)?;
    let last_visible = children.last().map(|(index, _)| *index);
    if !moving_visible && Some(nearest) == last_visible {
        Some(nearest + 1)
    } else {
        Some(nearest)
    }
}
