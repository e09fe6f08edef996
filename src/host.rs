//! Seams to the shell hosting the taskbar.
//!
//! The core never draws, styles or lays anything out itself. Everything it
//! needs from the outside world goes through these traits: handle widgets,
//! monitor geometry, window state and the favorites store. The taskbar is
//! handed a `&mut dyn ShellHost` on every call and keeps no reference to it.

use crate::geometry::{Bounds, MonitorIndex, Point};
use crate::order::WindowId;
use crate::view::{AppId, Container, HandleId};

/// Handle widgets inside a monitor's panel containers.
pub trait HandleSurface {
    fn create_handle(&mut self, handle: HandleId, container: Container, label: String);
    fn destroy_handle(&mut self, handle: HandleId);
    /// Reposition `handle` to `index` among its container's children.
    fn place_handle(&mut self, handle: HandleId, index: usize);
    fn set_handle_visible(&mut self, handle: HandleId, visible: bool);
    fn set_handle_dragging(&mut self, handle: HandleId, dragging: bool);
    /// Extents relative to the handle's container. `None` while the handle
    /// is hidden or unknown.
    fn handle_bounds(&self, handle: HandleId) -> Option<Bounds>;
    /// Global position of a container's origin.
    fn container_origin(&self, monitor: MonitorIndex, container: Container) -> Point;
}

pub trait MonitorResolver {
    fn monitor_for_point(&self, pos: Point) -> Option<MonitorIndex>;
}

pub trait WindowHost {
    fn window_title(&self, window: WindowId) -> String;
    fn window_monitor(&self, window: WindowId) -> Option<MonitorIndex>;
    fn window_on_active_workspace(&self, window: WindowId) -> bool;
    fn skip_taskbar(&self, window: WindowId) -> bool;
    fn focused_window(&self) -> Option<WindowId>;
    fn activate_window(&mut self, window: WindowId);
    fn minimize_window(&mut self, window: WindowId);
    fn close_window(&mut self, window: WindowId);
    fn move_window_to_monitor(&mut self, window: WindowId, monitor: MonitorIndex);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteApp {
    pub app: AppId,
    pub name: String,
}

pub trait FavoritesHost {
    fn favorites(&self) -> Vec<FavoriteApp>;
    /// Persist `app` at `position` of the favorites list.
    fn move_favorite(&mut self, app: &AppId, position: usize);
    fn launch_favorite(&mut self, app: &AppId);
}

pub trait ShellHost: HandleSurface + MonitorResolver + WindowHost + FavoritesHost {}

impl<T> ShellHost for T where
    T: HandleSurface + MonitorResolver + WindowHost + FavoritesHost + ?Sized
{
}
