//! Coordinator owning the window order and every monitor's views.
//!
//! Every host notification enters through a [`Taskbar`] method. The method
//! routes it to the affected view, then drains the order's event queue and
//! delivers each event to all window lists before returning, so every view
//! is consistent with the canonical order whenever control is back with the
//! host.

use std::collections::BTreeMap;
use std::rc::Rc;

use crossterm::event::MouseButton;

use crate::config::TaskbarConfig;
use crate::dnd::PointerProbe;
use crate::error::{Result, TaskbarError};
use crate::geometry::{MonitorIndex, Point};
use crate::host::ShellHost;
use crate::order::{OrderError, OrderEvent, OrderStore, WindowId, WindowOrder};
use crate::timer::{TimerId, TimerSource};
use crate::view::{FavoritesView, HandleId, ScrollDirection, Slot, WindowListView};

/// Both views living on one monitor's panel.
#[derive(Debug)]
pub struct MonitorViews {
    pub favorites: FavoritesView,
    pub windows: WindowListView,
}

pub struct Taskbar {
    config: TaskbarConfig,
    order: WindowOrder,
    monitors: BTreeMap<MonitorIndex, MonitorViews>,
    probe: Rc<dyn PointerProbe>,
    timers: Rc<dyn TimerSource>,
}

impl std::fmt::Debug for Taskbar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Taskbar")
            .field("config", &self.config)
            .field("order", &self.order)
            .field("monitors", &self.monitors)
            .finish_non_exhaustive()
    }
}

impl Taskbar {
    pub fn new(
        config: TaskbarConfig,
        store: Box<dyn OrderStore>,
        probe: Rc<dyn PointerProbe>,
        timers: Rc<dyn TimerSource>,
    ) -> Self {
        Self {
            config,
            order: WindowOrder::new(store),
            monitors: BTreeMap::new(),
            probe,
            timers,
        }
    }

    pub fn config(&self) -> TaskbarConfig {
        self.config
    }

    pub fn order(&self) -> &WindowOrder {
        &self.order
    }

    pub fn monitors(&self) -> impl Iterator<Item = MonitorIndex> + '_ {
        self.monitors.keys().copied()
    }

    pub fn views(&self, monitor: MonitorIndex) -> Option<&MonitorViews> {
        self.monitors.get(&monitor)
    }

    /// Window being dragged on any monitor.
    pub fn dragged_window(&self) -> Option<WindowId> {
        self.monitors
            .values()
            .find_map(|views| views.windows.dragged_window())
    }

    /// Number of views with a drag in progress. Never more than one.
    pub fn active_drags(&self) -> usize {
        self.monitors
            .values()
            .filter(|views| {
                views.windows.drag_state().is_active() || views.favorites.drag_state().is_active()
            })
            .count()
    }

    pub fn add_monitor(&mut self, monitor: MonitorIndex, host: &mut dyn ShellHost) -> Result<()> {
        if self.monitors.contains_key(&monitor) {
            return Err(TaskbarError::MonitorExists(monitor));
        }
        let mut favorites = FavoritesView::new(
            monitor,
            self.config,
            self.probe.clone(),
            self.timers.clone(),
        );
        favorites.recreate(host);
        let mut windows = WindowListView::new(
            monitor,
            self.config,
            self.probe.clone(),
            self.timers.clone(),
        );
        windows.populate(&self.order, host);
        tracing::debug!(monitor, windows = self.order.len(), "panel added");
        self.monitors
            .insert(monitor, MonitorViews { favorites, windows });
        Ok(())
    }

    pub fn remove_monitor(
        &mut self,
        monitor: MonitorIndex,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let mut views = self
            .monitors
            .remove(&monitor)
            .ok_or(TaskbarError::UnknownMonitor(monitor))?;
        views.favorites.destroy(host);
        views.windows.destroy(&mut self.order, host);
        tracing::debug!(monitor, "panel removed");
        self.flush(host)
    }

    /// Populate the order with the windows present at startup, restoring
    /// the persisted order.
    pub fn load_initial_windows(
        &mut self,
        live: &[WindowId],
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        self.order.load_initial(live.iter().copied())?;
        self.flush(host)
    }

    pub fn window_created(&mut self, window: WindowId, host: &mut dyn ShellHost) -> Result<()> {
        self.order.append(window)?;
        self.flush(host)
    }

    pub fn window_destroyed(&mut self, window: WindowId, host: &mut dyn ShellHost) -> Result<()> {
        self.order.remove(window)?;
        self.flush(host)
    }

    /// A window landed on another monitor. It goes to the end of the list
    /// unless it got there by being dragged.
    pub fn window_entered_monitor(
        &mut self,
        window: WindowId,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        self.move_to_end_unless_dragged(window, host)?;
        self.refresh_visibility(host)
    }

    pub fn window_workspace_changed(
        &mut self,
        window: WindowId,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        self.move_to_end_unless_dragged(window, host)?;
        self.refresh_visibility(host)
    }

    pub fn workspace_switched(&mut self, host: &mut dyn ShellHost) -> Result<()> {
        self.refresh_visibility(host)
    }

    /// Window state relevant to visibility changed (e.g. its skip-taskbar
    /// flag).
    pub fn window_changed(&mut self, window: WindowId, host: &mut dyn ShellHost) -> Result<()> {
        if !self.order.contains(window) {
            return Err(OrderError::UnknownWindow(window).into());
        }
        self.refresh_visibility(host)
    }

    pub fn favorites_changed(&mut self, host: &mut dyn ShellHost) {
        for views in self.monitors.values_mut() {
            views.favorites.recreate(host);
        }
    }

    pub fn button_press(
        &mut self,
        handle: HandleId,
        button: MouseButton,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let views = self
            .monitors
            .get_mut(&handle.monitor)
            .ok_or(TaskbarError::UnknownMonitor(handle.monitor))?;
        match handle.slot {
            Slot::Window(_) => views
                .windows
                .button_press(handle, button, &mut self.order, host)?,
            Slot::Favorite(_) => views.favorites.button_press(handle, button, host),
        }
        self.flush(host)
    }

    pub fn button_release(
        &mut self,
        handle: HandleId,
        button: MouseButton,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let views = self
            .monitors
            .get_mut(&handle.monitor)
            .ok_or(TaskbarError::UnknownMonitor(handle.monitor))?;
        match handle.slot {
            Slot::Window(_) => views
                .windows
                .button_release(handle, button, &mut self.order, host)?,
            Slot::Favorite(_) => views.favorites.button_release(handle, button, host),
        }
        self.flush(host)
    }

    /// Returns `true` when the host should skip hover styling for `handle`.
    pub fn hover_changed(
        &mut self,
        handle: HandleId,
        hovered: bool,
        host: &mut dyn ShellHost,
    ) -> Result<bool> {
        let views = self
            .monitors
            .get_mut(&handle.monitor)
            .ok_or(TaskbarError::UnknownMonitor(handle.monitor))?;
        let suppress = match handle.slot {
            Slot::Window(_) => views
                .windows
                .hover_changed(handle, hovered, &mut self.order, host)?,
            Slot::Favorite(_) => views.favorites.hover_changed(handle, hovered, host),
        };
        self.flush(host)?;
        Ok(suppress)
    }

    /// Dispatch a timer expiry. Returns `false` if no view owns `timer`,
    /// which happens when a drag ended after the timer was collected.
    pub fn timer_fired(&mut self, timer: TimerId, host: &mut dyn ShellHost) -> Result<bool> {
        let Some(views) = self.monitors.values_mut().find(|views| {
            views.windows.owns_timer(timer) || views.favorites.owns_timer(timer)
        }) else {
            tracing::trace!(timer = timer.raw(), "timer has no owner");
            return Ok(false);
        };
        if views.windows.owns_timer(timer) {
            views.windows.poll(timer, &mut self.order, host)?;
        } else {
            views.favorites.poll(timer, host)?;
        }
        self.flush(host)?;
        Ok(true)
    }

    /// Scrolling over a monitor's window list walks the focus through its
    /// visible windows.
    pub fn scroll(
        &mut self,
        monitor: MonitorIndex,
        direction: ScrollDirection,
        host: &mut dyn ShellHost,
    ) -> Result<Option<WindowId>> {
        let views = self
            .monitors
            .get(&monitor)
            .ok_or(TaskbarError::UnknownMonitor(monitor))?;
        Ok(views.windows.focus_step(direction, host))
    }

    /// Tear every panel down and persist the window order.
    pub fn destroy(&mut self, host: &mut dyn ShellHost) -> Result<()> {
        for (_, mut views) in std::mem::take(&mut self.monitors) {
            views.favorites.destroy(host);
            views.windows.destroy(&mut self.order, host);
        }
        self.order.destroy()?;
        Ok(())
    }

    fn move_to_end_unless_dragged(
        &mut self,
        window: WindowId,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let index = self
            .order
            .index_of(window)
            .ok_or(OrderError::UnknownWindow(window))?;
        if self.dragged_window() == Some(window) {
            tracing::trace!(window = %window, "keeping dragged window in place");
            return Ok(());
        }
        if index + 1 == self.order.len() {
            return Ok(());
        }
        self.order.move_window(index, self.order.len())?;
        self.flush(host)
    }

    fn refresh_visibility(&mut self, host: &mut dyn ShellHost) -> Result<()> {
        for views in self.monitors.values_mut() {
            views.windows.refresh_visibility(&mut self.order, host)?;
        }
        self.flush(host)
    }

    /// Deliver queued order events to every window list.
    fn flush(&mut self, host: &mut dyn ShellHost) -> Result<()> {
        while let Some(event) = self.order.next_event() {
            if let OrderEvent::DragTransferredToMonitor { src, monitor, pos } = event {
                self.transfer_drag(src, monitor, pos, host)?;
                continue;
            }
            for views in self.monitors.values_mut() {
                views.windows.apply(event, &mut self.order, host)?;
            }
        }
        Ok(())
    }

    /// Continue a drag on `monitor`: place the window where the pointer is
    /// on the target list, move it to that monitor, then resume the drag
    /// there. The source view has already ended its own drag.
    fn transfer_drag(
        &mut self,
        src: usize,
        monitor: MonitorIndex,
        pos: Point,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let window = self.order.window_at(src).ok_or(OrderError::IndexOutOfRange {
            index: src,
            len: self.order.len(),
        })?;
        let Some(target) = self.monitors.get(&monitor) else {
            return self.keep_drag_home(window, monitor, host);
        };
        if let Some(dst) = target.windows.insertion_index(window, pos, &*host)
            && dst != src
        {
            self.order.move_window(src, dst)?;
            self.flush(host)?;
        }
        host.move_window_to_monitor(window, monitor);
        self.refresh_visibility(host)?;
        let target = self
            .monitors
            .get_mut(&monitor)
            .ok_or(TaskbarError::UnknownMonitor(monitor))?;
        target.windows.resume_drag(window, &mut self.order, host)?;
        tracing::debug!(window = %window, monitor, "drag resumed on target monitor");
        self.flush(host)
    }

    /// The pointer went over a monitor without a panel. Restart the drag on
    /// the panel of the monitor the window is still on, so it picks up again
    /// once the pointer comes back.
    fn keep_drag_home(
        &mut self,
        window: WindowId,
        monitor: MonitorIndex,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let home = host
            .window_monitor(window)
            .and_then(|home| self.monitors.get_mut(&home).map(|views| (home, views)));
        let Some((home, views)) = home else {
            tracing::warn!(monitor, window = %window, "drag left for a monitor without a panel");
            return Ok(());
        };
        tracing::trace!(window = %window, monitor, home, "no panel under pointer, drag stays");
        views.windows.resume_drag(window, &mut self.order, host)?;
        self.flush(host)
    }
}
