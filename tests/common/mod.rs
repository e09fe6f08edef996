#![allow(dead_code)]

use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::MouseButton;
use term_taskbar::host::{FavoriteApp, FavoritesHost, HandleSurface, MonitorResolver, WindowHost};
use term_taskbar::{
    AppId, Bounds, Container, HandleId, HeadlessShell, IntervalTimers, MemoryOrderStore,
    MonitorIndex, OrderStore, Point, SharedPointer, Taskbar, TaskbarConfig, WindowId,
};

/// A taskbar wired to an in-memory shell, a hand-driven pointer and timers
/// that only fire when the test says so.
pub struct Harness {
    pub shell: HeadlessShell,
    pub pointer: SharedPointer,
    pub timers: Rc<IntervalTimers>,
    pub taskbar: Taskbar,
    clock: Instant,
}

impl Harness {
    pub fn new(widths: &[u16]) -> Self {
        Self::with_store(widths, Box::new(MemoryOrderStore::new()))
    }

    pub fn with_store(widths: &[u16], store: Box<dyn OrderStore>) -> Self {
        Self::with_config(widths, TaskbarConfig::default(), store)
    }

    pub fn with_config(widths: &[u16], config: TaskbarConfig, store: Box<dyn OrderStore>) -> Self {
        let mut shell = HeadlessShell::new(widths);
        let pointer = SharedPointer::new();
        let timers = Rc::new(IntervalTimers::new());
        let mut taskbar = Taskbar::new(config, store, Rc::new(pointer.clone()), timers.clone());
        for monitor in 0..widths.len() {
            taskbar.add_monitor(monitor, &mut shell).unwrap();
        }
        Self {
            shell,
            pointer,
            timers,
            taskbar,
            clock: Instant::now(),
        }
    }

    /// Open a window and announce it to the taskbar.
    pub fn open(&mut self, title: &str, monitor: usize) -> WindowId {
        let window = self.shell.open_window(title, monitor);
        self.taskbar
            .window_created(window, &mut self.shell)
            .unwrap();
        window
    }

    /// Press and release `button` on `handle` without moving the pointer.
    pub fn click(&mut self, handle: HandleId, button: MouseButton) {
        self.taskbar
            .button_press(handle, button, &mut self.shell)
            .unwrap();
        self.taskbar
            .button_release(handle, button, &mut self.shell)
            .unwrap();
    }

    pub fn set_favorites(&mut self, names: &[&str]) {
        self.shell.set_favorites(
            names
                .iter()
                .map(|name| FavoriteApp {
                    app: AppId::new(*name),
                    name: name.to_string(),
                })
                .collect(),
        );
        self.taskbar.favorites_changed(&mut self.shell);
    }

    pub fn favorite_handle(&self, monitor: usize, app: &str) -> HandleId {
        self.taskbar
            .views(monitor)
            .and_then(|views| views.favorites.handle_for(&AppId::new(app)))
            .unwrap()
    }

    pub fn order(&self) -> Vec<WindowId> {
        self.taskbar.order().windows().to_vec()
    }

    pub fn center(&self, handle: HandleId) -> Point {
        self.shell.handle_center(handle).unwrap()
    }

    /// Press the primary button on `handle` and move off it, which starts a
    /// drag.
    pub fn begin_drag(&mut self, handle: HandleId) {
        let center = self.center(handle);
        self.pointer.move_to(center);
        self.pointer.press();
        self.taskbar
            .button_press(handle, MouseButton::Left, &mut self.shell)
            .unwrap();
        self.taskbar
            .hover_changed(handle, false, &mut self.shell)
            .unwrap();
    }

    /// Fire every scheduled timer once.
    pub fn tick(&mut self) {
        self.clock += Duration::from_secs(3600);
        for timer in self.timers.due(self.clock) {
            if self.timers.is_scheduled(timer) {
                self.taskbar.timer_fired(timer, &mut self.shell).unwrap();
            }
        }
    }

    pub fn drag_to(&mut self, pos: Point) {
        self.pointer.move_to(pos);
        self.tick();
    }

    /// Like [`Harness::drag_to`], returning the dragging marks set during
    /// the poll in the order they were set.
    pub fn drag_to_marking(&mut self, pos: Point) -> Vec<(HandleId, bool)> {
        self.pointer.move_to(pos);
        self.clock += Duration::from_secs(3600);
        let mut shell = MarkingShell {
            inner: &mut self.shell,
            marks: Vec::new(),
        };
        for timer in self.timers.due(self.clock) {
            if self.timers.is_scheduled(timer) {
                self.taskbar.timer_fired(timer, &mut shell).unwrap();
            }
        }
        shell.marks
    }

    /// Let go of the button and let the next poll notice.
    pub fn drop_here(&mut self) {
        self.pointer.release();
        self.tick();
    }
}

/// Shell wrapper that remembers every dragging mark the taskbar sets, in
/// call order.
pub struct MarkingShell<'a> {
    pub inner: &'a mut HeadlessShell,
    pub marks: Vec<(HandleId, bool)>,
}

impl HandleSurface for MarkingShell<'_> {
    fn create_handle(&mut self, handle: HandleId, container: Container, label: String) {
        self.inner.create_handle(handle, container, label);
    }

    fn destroy_handle(&mut self, handle: HandleId) {
        self.inner.destroy_handle(handle);
    }

    fn place_handle(&mut self, handle: HandleId, index: usize) {
        self.inner.place_handle(handle, index);
    }

    fn set_handle_visible(&mut self, handle: HandleId, visible: bool) {
        self.inner.set_handle_visible(handle, visible);
    }

    fn set_handle_dragging(&mut self, handle: HandleId, dragging: bool) {
        self.marks.push((handle, dragging));
        self.inner.set_handle_dragging(handle, dragging);
    }

    fn handle_bounds(&self, handle: HandleId) -> Option<Bounds> {
        self.inner.handle_bounds(handle)
    }

    fn container_origin(&self, monitor: MonitorIndex, container: Container) -> Point {
        self.inner.container_origin(monitor, container)
    }
}

impl MonitorResolver for MarkingShell<'_> {
    fn monitor_for_point(&self, pos: Point) -> Option<MonitorIndex> {
        self.inner.monitor_for_point(pos)
    }
}

impl WindowHost for MarkingShell<'_> {
    fn window_title(&self, window: WindowId) -> String {
        self.inner.window_title(window)
    }

    fn window_monitor(&self, window: WindowId) -> Option<MonitorIndex> {
        self.inner.window_monitor(window)
    }

    fn window_on_active_workspace(&self, window: WindowId) -> bool {
        self.inner.window_on_active_workspace(window)
    }

    fn skip_taskbar(&self, window: WindowId) -> bool {
        self.inner.skip_taskbar(window)
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.inner.focused_window()
    }

    fn activate_window(&mut self, window: WindowId) {
        self.inner.activate_window(window);
    }

    fn minimize_window(&mut self, window: WindowId) {
        self.inner.minimize_window(window);
    }

    fn close_window(&mut self, window: WindowId) {
        self.inner.close_window(window);
    }

    fn move_window_to_monitor(&mut self, window: WindowId, monitor: MonitorIndex) {
        self.inner.move_window_to_monitor(window, monitor);
    }
}

impl FavoritesHost for MarkingShell<'_> {
    fn favorites(&self) -> Vec<FavoriteApp> {
        self.inner.favorites()
    }

    fn move_favorite(&mut self, app: &AppId, position: usize) {
        self.inner.move_favorite(app, position);
    }

    fn launch_favorite(&mut self, app: &AppId) {
        self.inner.launch_favorite(app);
    }
}
