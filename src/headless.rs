//! In-memory shell used by the demo binary and the tests.
//!
//! Monitors sit side by side, left to right, starting at x = 0. Each monitor
//! has a one row panel at its top: the favorites container at the panel's
//! left edge, followed by a one column gap and the window container. Visible
//! handles are packed left to right inside their container, each as wide as
//! its label plus one column of padding on either side.

use std::collections::BTreeMap;

use crate::geometry::{Bounds, MonitorIndex, Point};
use crate::host::{FavoriteApp, FavoritesHost, HandleSurface, MonitorResolver, WindowHost};
use crate::order::WindowId;
use crate::view::{AppId, Container, HandleId};

/// Longest label a handle shows before it is cut.
const MAX_LABEL_WIDTH: usize = 16;

#[derive(Debug, Clone)]
struct WindowInfo {
    title: String,
    monitor: MonitorIndex,
    workspace: usize,
    skip_taskbar: bool,
    minimized: bool,
}

#[derive(Debug, Clone)]
struct HandleInfo {
    label: String,
    visible: bool,
    dragging: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessShell {
    monitors: Vec<Bounds>,
    windows: BTreeMap<WindowId, WindowInfo>,
    next_window: u64,
    active_workspace: usize,
    focused: Option<WindowId>,
    favorites: Vec<FavoriteApp>,
    launched: Vec<AppId>,
    closed: Vec<WindowId>,
    handles: BTreeMap<HandleId, HandleInfo>,
    containers: BTreeMap<(MonitorIndex, Container), Vec<HandleId>>,
}

impl HeadlessShell {
    /// One monitor per entry of `widths`, each `height` rows tall.
    pub fn with_monitors(widths: &[u16], height: u16) -> Self {
        let mut x = 0i32;
        let monitors = widths
            .iter()
            .map(|width| {
                let bounds = Bounds::new(x, 0, *width, height);
                x = bounds.right();
                bounds
            })
            .collect();
        Self {
            monitors,
            ..Self::default()
        }
    }

    pub fn new(widths: &[u16]) -> Self {
        Self::with_monitors(widths, 24)
    }

    pub fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    pub fn monitor_bounds(&self, monitor: MonitorIndex) -> Option<Bounds> {
        self.monitors.get(monitor).copied()
    }

    /// Global bounds of a monitor's panel row.
    pub fn panel_bounds(&self, monitor: MonitorIndex) -> Option<Bounds> {
        self.monitor_bounds(monitor)
            .map(|m| Bounds::new(m.x, m.y, m.width, 1))
    }

    /// Open a window on the active workspace and focus it.
    pub fn open_window(&mut self, title: &str, monitor: MonitorIndex) -> WindowId {
        self.next_window += 1;
        let window = WindowId(self.next_window);
        self.windows.insert(
            window,
            WindowInfo {
                title: title.to_string(),
                monitor,
                workspace: self.active_workspace,
                skip_taskbar: false,
                minimized: false,
            },
        );
        self.focused = Some(window);
        window
    }

    /// Forget a window, as the shell does once it has finished closing.
    pub fn remove_window(&mut self, window: WindowId) -> bool {
        if self.focused == Some(window) {
            self.focused = None;
        }
        self.windows.remove(&window).is_some()
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.keys().copied().collect()
    }

    pub fn set_window_monitor(&mut self, window: WindowId, monitor: MonitorIndex) {
        if let Some(info) = self.windows.get_mut(&window) {
            info.monitor = monitor;
        }
    }

    pub fn window_workspace(&self, window: WindowId) -> Option<usize> {
        self.windows.get(&window).map(|w| w.workspace)
    }

    pub fn set_window_workspace(&mut self, window: WindowId, workspace: usize) {
        if let Some(info) = self.windows.get_mut(&window) {
            info.workspace = workspace;
        }
    }

    pub fn set_skip_taskbar(&mut self, window: WindowId, skip: bool) {
        if let Some(info) = self.windows.get_mut(&window) {
            info.skip_taskbar = skip;
        }
    }

    pub fn active_workspace(&self) -> usize {
        self.active_workspace
    }

    pub fn set_active_workspace(&mut self, workspace: usize) {
        self.active_workspace = workspace;
    }

    pub fn focus(&mut self, window: Option<WindowId>) {
        self.focused = window;
    }

    pub fn is_minimized(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.minimized)
    }

    pub fn set_favorites(&mut self, favorites: Vec<FavoriteApp>) {
        self.favorites = favorites;
    }

    pub fn favorite_apps(&self) -> Vec<AppId> {
        self.favorites.iter().map(|f| f.app.clone()).collect()
    }

    pub fn launched(&self) -> &[AppId] {
        &self.launched
    }

    pub fn closed(&self) -> &[WindowId] {
        &self.closed
    }

    /// Handles of a container in display order, hidden ones included.
    pub fn handles_in(&self, monitor: MonitorIndex, container: Container) -> Vec<HandleId> {
        self.containers
            .get(&(monitor, container))
            .cloned()
            .unwrap_or_default()
    }

    /// Labels of the visible handles of a container in display order.
    pub fn labels(&self, monitor: MonitorIndex, container: Container) -> Vec<String> {
        self.handles_in(monitor, container)
            .into_iter()
            .filter_map(|id| self.handles.get(&id))
            .filter(|h| h.visible)
            .map(|h| h.label.clone())
            .collect()
    }

    pub fn is_handle_visible(&self, handle: HandleId) -> bool {
        self.handles.get(&handle).is_some_and(|h| h.visible)
    }

    pub fn is_handle_dragging(&self, handle: HandleId) -> bool {
        self.handles.get(&handle).is_some_and(|h| h.dragging)
    }

    pub fn has_handle(&self, handle: HandleId) -> bool {
        self.handles.contains_key(&handle)
    }

    pub fn handle_label(&self, handle: HandleId) -> Option<&str> {
        self.handles.get(&handle).map(|h| h.label.as_str())
    }

    /// Bounds of a visible handle in global coordinates.
    pub fn handle_global_bounds(&self, handle: HandleId) -> Option<Bounds> {
        let local = self.handle_bounds(handle)?;
        let origin = self.container_origin(handle.monitor, handle.container());
        Some(local.offset(origin))
    }

    /// A point in the middle of a visible handle.
    pub fn handle_center(&self, handle: HandleId) -> Option<Point> {
        let bounds = self.handle_global_bounds(handle)?;
        Some(Point::new(bounds.x + bounds.width as i32 / 2, bounds.y))
    }

    /// Topmost visible handle under `pos`.
    pub fn hit_test(&self, pos: Point) -> Option<HandleId> {
        self.containers
            .values()
            .flatten()
            .copied()
            .find(|id| {
                self.handle_global_bounds(*id)
                    .is_some_and(|bounds| bounds.contains(pos))
            })
    }

    fn container_width(&self, monitor: MonitorIndex, container: Container) -> i32 {
        self.handles_in(monitor, container)
            .into_iter()
            .filter_map(|id| self.handles.get(&id))
            .filter(|h| h.visible)
            .map(|h| handle_width(&h.label) as i32)
            .sum()
    }
}

fn handle_width(label: &str) -> u16 {
    label.chars().count().clamp(1, MAX_LABEL_WIDTH) as u16 + 2
}

impl HandleSurface for HeadlessShell {
    fn create_handle(&mut self, handle: HandleId, container: Container, label: String) {
        self.handles.insert(
            handle,
            HandleInfo {
                label,
                visible: false,
                dragging: false,
            },
        );
        let key = (handle.monitor, container);
        let children = self.containers.entry(key).or_default();
        if !children.contains(&handle) {
            children.push(handle);
        }
    }

    fn destroy_handle(&mut self, handle: HandleId) {
        self.handles.remove(&handle);
        let key = (handle.monitor, handle.container());
        if let Some(children) = self.containers.get_mut(&key) {
            children.retain(|id| *id != handle);
        }
    }

    fn place_handle(&mut self, handle: HandleId, index: usize) {
        let key = (handle.monitor, handle.container());
        let Some(children) = self.containers.get_mut(&key) else {
            return;
        };
        let Some(current) = children.iter().position(|id| *id == handle) else {
            return;
        };
        let moved = children.remove(current);
        let index = index.min(children.len());
        children.insert(index, moved);
    }

    fn set_handle_visible(&mut self, handle: HandleId, visible: bool) {
        if let Some(info) = self.handles.get_mut(&handle) {
            info.visible = visible;
        }
    }

    fn set_handle_dragging(&mut self, handle: HandleId, dragging: bool) {
        if let Some(info) = self.handles.get_mut(&handle) {
            info.dragging = dragging;
        }
    }

    fn handle_bounds(&self, handle: HandleId) -> Option<Bounds> {
        let mut x = 0i32;
        for id in self.handles_in(handle.monitor, handle.container()) {
            let Some(info) = self.handles.get(&id) else {
                continue;
            };
            if !info.visible {
                continue;
            }
            let width = handle_width(&info.label);
            if id == handle {
                return Some(Bounds::new(x, 0, width, 1));
            }
            x += width as i32;
        }
        None
    }

    fn container_origin(&self, monitor: MonitorIndex, container: Container) -> Point {
        let panel = self.monitor_bounds(monitor).unwrap_or_default();
        match container {
            Container::Favorites => Point::new(panel.x, panel.y),
            Container::Windows => {
                let favorites = self.container_width(monitor, Container::Favorites);
                let gap = if favorites > 0 { 1 } else { 0 };
                Point::new(panel.x + favorites + gap, panel.y)
            }
        }
    }
}

impl MonitorResolver for HeadlessShell {
    fn monitor_for_point(&self, pos: Point) -> Option<MonitorIndex> {
        self.monitors.iter().position(|bounds| bounds.contains(pos))
    }
}

impl WindowHost for HeadlessShell {
    fn window_title(&self, window: WindowId) -> String {
        self.windows
            .get(&window)
            .map(|w| w.title.clone())
            .unwrap_or_else(|| window.to_string())
    }

    fn window_monitor(&self, window: WindowId) -> Option<MonitorIndex> {
        self.windows.get(&window).map(|w| w.monitor)
    }

    fn window_on_active_workspace(&self, window: WindowId) -> bool {
        self.windows
            .get(&window)
            .is_some_and(|w| w.workspace == self.active_workspace)
    }

    fn skip_taskbar(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.skip_taskbar)
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.focused
    }

    fn activate_window(&mut self, window: WindowId) {
        if let Some(info) = self.windows.get_mut(&window) {
            info.minimized = false;
            self.focused = Some(window);
        }
    }

    fn minimize_window(&mut self, window: WindowId) {
        if let Some(info) = self.windows.get_mut(&window) {
            info.minimized = true;
            if self.focused == Some(window) {
                self.focused = None;
            }
        }
    }

    fn close_window(&mut self, window: WindowId) {
        if self.remove_window(window) {
            self.closed.push(window);
        }
    }

    fn move_window_to_monitor(&mut self, window: WindowId, monitor: MonitorIndex) {
        self.set_window_monitor(window, monitor);
    }
}

impl FavoritesHost for HeadlessShell {
    fn favorites(&self) -> Vec<FavoriteApp> {
        self.favorites.clone()
    }

    fn move_favorite(&mut self, app: &AppId, position: usize) {
        let Some(current) = self.favorites.iter().position(|f| &f.app == app) else {
            return;
        };
        let favorite = self.favorites.remove(current);
        let position = position.min(self.favorites.len());
        self.favorites.insert(position, favorite);
    }

    fn launch_favorite(&mut self, app: &AppId) {
        self.launched.push(app.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitors_are_laid_out_left_to_right() {
        let shell = HeadlessShell::with_monitors(&[40, 60], 10);
        assert_eq!(shell.monitor_for_point(Point::new(0, 0)), Some(0));
        assert_eq!(shell.monitor_for_point(Point::new(39, 9)), Some(0));
        assert_eq!(shell.monitor_for_point(Point::new(40, 0)), Some(1));
        assert_eq!(shell.monitor_for_point(Point::new(100, 0)), None);
        assert_eq!(shell.monitor_for_point(Point::new(5, 10)), None);
    }

    #[test]
    fn visible_handles_pack_left_to_right() {
        let mut shell = HeadlessShell::new(&[80]);
        let fav = HandleId::favorite(0, 1);
        let a = HandleId::window(0, WindowId(1));
        let b = HandleId::window(0, WindowId(2));
        shell.create_handle(fav, Container::Favorites, "term".into());
        shell.set_handle_visible(fav, true);
        for (id, label) in [(a, "alpha"), (b, "beta")] {
            shell.create_handle(id, Container::Windows, label.into());
            shell.set_handle_visible(id, true);
        }
        // "term" is 6 wide, plus the gap
        assert_eq!(
            shell.container_origin(0, Container::Windows),
            Point::new(7, 0)
        );
        assert_eq!(shell.handle_bounds(a), Some(Bounds::new(0, 0, 7, 1)));
        assert_eq!(shell.handle_bounds(b), Some(Bounds::new(7, 0, 6, 1)));
        assert_eq!(shell.hit_test(Point::new(15, 0)), Some(b));

        shell.set_handle_visible(a, false);
        assert_eq!(shell.handle_bounds(a), None);
        assert_eq!(shell.handle_bounds(b), Some(Bounds::new(0, 0, 6, 1)));

        shell.place_handle(b, 0);
        assert_eq!(shell.handles_in(0, Container::Windows), vec![b, a]);
    }

    #[test]
    fn closing_and_focus() {
        let mut shell = HeadlessShell::new(&[80]);
        let w = shell.open_window("editor", 0);
        assert_eq!(shell.focused_window(), Some(w));
        shell.minimize_window(w);
        assert!(shell.is_minimized(w));
        assert_eq!(shell.focused_window(), None);
        shell.activate_window(w);
        assert!(!shell.is_minimized(w));
        shell.close_window(w);
        assert_eq!(shell.closed(), &[w]);
        assert!(shell.window_ids().is_empty());
    }

    #[test]
    fn move_favorite_reorders_store() {
        let mut shell = HeadlessShell::new(&[80]);
        shell.set_favorites(
            ["a", "b", "c"]
                .into_iter()
                .map(|id| FavoriteApp {
                    app: AppId::new(id),
                    name: id.to_string(),
                })
                .collect(),
        );
        shell.move_favorite(&AppId::new("a"), 2);
        assert_eq!(
            shell.favorite_apps(),
            vec![AppId::new("b"), AppId::new("c"), AppId::new("a")]
        );
    }
}
