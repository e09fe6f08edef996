//! One monitor's list of window buttons.
//!
//! The local handle list is index-aligned with [`WindowOrder`]: handles are
//! only added, removed or moved when an [`OrderEvent`] is applied. Dragging
//! a handle asks the order to move the window; the move comes back as an
//! event like any other change.

use std::rc::Rc;

use crossterm::event::MouseButton;

use super::{Container, HandleId, insertion_index};
use crate::config::TaskbarConfig;
use crate::dnd::{DragDropManager, DragEvent, DragHandler, DragState, PointerProbe};
use crate::error::{Result, TaskbarError};
use crate::geometry::{Bounds, MonitorIndex, Point};
use crate::host::ShellHost;
use crate::order::{OrderError, OrderEvent, WindowId, WindowOrder, move_in_vec};
use crate::timer::{TimerId, TimerSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
struct WindowHandle {
    window: WindowId,
    visible: bool,
}

#[derive(Debug)]
pub struct WindowListView {
    monitor: MonitorIndex,
    config: TaskbarConfig,
    handles: Vec<WindowHandle>,
    dnd: DragDropManager<HandleId>,
}

impl WindowListView {
    pub fn new(
        monitor: MonitorIndex,
        config: TaskbarConfig,
        probe: Rc<dyn PointerProbe>,
        timers: Rc<dyn TimerSource>,
    ) -> Self {
        Self {
            monitor,
            config,
            handles: Vec::new(),
            dnd: DragDropManager::with_poll_interval(probe, timers, config.poll_interval),
        }
    }

    pub fn monitor(&self) -> MonitorIndex {
        self.monitor
    }

    pub fn handle_for(&self, window: WindowId) -> HandleId {
        HandleId::window(self.monitor, window)
    }

    pub fn windows(&self) -> Vec<WindowId> {
        self.handles.iter().map(|h| h.window).collect()
    }

    pub fn visible_windows(&self) -> Vec<WindowId> {
        self.handles
            .iter()
            .filter(|h| h.visible)
            .map(|h| h.window)
            .collect()
    }

    pub fn is_visible(&self, window: WindowId) -> bool {
        self.handles
            .iter()
            .any(|h| h.window == window && h.visible)
    }

    pub fn drag_state(&self) -> DragState<HandleId> {
        self.dnd.state()
    }

    pub fn dragged_window(&self) -> Option<WindowId> {
        self.dnd.dragged_widget().and_then(|h| h.window_id())
    }

    pub fn owns_timer(&self, timer: TimerId) -> bool {
        self.dnd.timer() == Some(timer)
    }

    /// Create handles for every window already in the order, e.g. for a
    /// monitor that appeared after startup.
    pub fn populate(&mut self, order: &WindowOrder, host: &mut dyn ShellHost) {
        for window in order.windows() {
            self.add_handle(*window, host);
        }
    }

    /// Replay one order change on the local handles.
    pub fn apply(
        &mut self,
        event: OrderEvent,
        order: &mut WindowOrder,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        match event {
            OrderEvent::WindowAppended(window) => {
                self.add_handle(window, host);
                Ok(())
            }
            OrderEvent::WindowRemoved(index) => self.remove_handle(index, order, host),
            OrderEvent::WindowMoved { src, dst } => self.move_handle(src, dst, host),
            // Routed to the target monitor by the taskbar.
            OrderEvent::DragTransferredToMonitor { .. } => Ok(()),
        }
    }

    /// Recompute which handles this monitor shows. A dragged handle that
    /// becomes hidden ends its drag.
    pub fn refresh_visibility(
        &mut self,
        order: &mut WindowOrder,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let (monitor, config) = (self.monitor, self.config);
        let mut hidden = Vec::new();
        for handle in self.handles.iter_mut() {
            let visible = compute_visible(config, monitor, handle.window, &*host);
            if visible == handle.visible {
                continue;
            }
            handle.visible = visible;
            let id = HandleId::window(monitor, handle.window);
            host.set_handle_visible(id, visible);
            if !visible {
                hidden.push(id);
            }
        }
        if hidden.is_empty() {
            return Ok(());
        }
        let mut ctx = DragCtx::new(monitor, &self.handles, order, host);
        for id in hidden {
            self.dnd.on_visibility_changed(id, false, &mut ctx);
        }
        ctx.into_result()
    }

    /// Where `window` would land if it were dropped at `pos` on this list.
    pub fn insertion_index(
        &self,
        window: WindowId,
        pos: Point,
        host: &dyn ShellHost,
    ) -> Option<usize> {
        insertion_target(self.monitor, &self.handles, host, window, pos)
    }

    /// Continue a drag handed over from another monitor.
    pub fn resume_drag(
        &mut self,
        window: WindowId,
        order: &mut WindowOrder,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let handle = self.handle_for(window);
        let mut ctx = DragCtx::new(self.monitor, &self.handles, order, host);
        let started = self.dnd.start_drag(handle, &mut ctx);
        ctx.into_result()?;
        started?;
        Ok(())
    }

    pub fn button_press(
        &mut self,
        handle: HandleId,
        button: MouseButton,
        order: &mut WindowOrder,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        if button == MouseButton::Middle {
            if let Some(window) = handle.window_id() {
                tracing::debug!(window = %window, "closing window from taskbar");
                host.close_window(window);
            }
            return Ok(());
        }
        let mut ctx = DragCtx::new(self.monitor, &self.handles, order, host);
        self.dnd.on_button_press(handle, button, &mut ctx);
        ctx.into_result()
    }

    /// A primary release on the handle that was pressed is a click: the
    /// window is minimized if it has focus and activated otherwise.
    pub fn button_release(
        &mut self,
        handle: HandleId,
        button: MouseButton,
        order: &mut WindowOrder,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let clicked = button == MouseButton::Left && self.dnd.state() == DragState::Armed(handle);
        let mut ctx = DragCtx::new(self.monitor, &self.handles, order, host);
        self.dnd.on_button_release(handle, button, &mut ctx);
        ctx.into_result()?;
        if clicked && let Some(window) = handle.window_id() {
            if host.focused_window() == Some(window) {
                host.minimize_window(window);
            } else {
                host.activate_window(window);
            }
        }
        Ok(())
    }

    pub fn hover_changed(
        &mut self,
        handle: HandleId,
        hovered: bool,
        order: &mut WindowOrder,
        host: &mut dyn ShellHost,
    ) -> Result<bool> {
        let mut ctx = DragCtx::new(self.monitor, &self.handles, order, host);
        let suppress = self.dnd.on_hover_changed(handle, hovered, &mut ctx);
        ctx.into_result()?;
        Ok(suppress)
    }

    pub fn poll(
        &mut self,
        timer: TimerId,
        order: &mut WindowOrder,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        let mut ctx = DragCtx::new(self.monitor, &self.handles, order, host);
        let polled = self.dnd.on_poll(timer, &mut ctx);
        ctx.into_result()?;
        polled?;
        Ok(())
    }

    /// Focus the visible window before or after the focused one. Stops at
    /// either end of the list.
    pub fn focus_step(
        &self,
        direction: ScrollDirection,
        host: &mut dyn ShellHost,
    ) -> Option<WindowId> {
        let visible = self.visible_windows();
        let last = visible.len().checked_sub(1)?;
        let current = host
            .focused_window()
            .and_then(|focused| visible.iter().position(|w| *w == focused));
        let target = match (direction, current) {
            (ScrollDirection::Up, None) => last,
            (ScrollDirection::Down, None) => 0,
            (ScrollDirection::Up, Some(index)) => index.checked_sub(1)?,
            (ScrollDirection::Down, Some(index)) if index < last => index + 1,
            (ScrollDirection::Down, Some(_)) => return None,
        };
        let window = visible[target];
        host.activate_window(window);
        Some(window)
    }

    /// End any drag silently and drop every handle.
    pub fn destroy(&mut self, order: &mut WindowOrder, host: &mut dyn ShellHost) {
        let mut ctx = DragCtx::new(self.monitor, &self.handles, order, host);
        self.dnd.destroy(&mut ctx);
        if let Err(err) = ctx.into_result() {
            tracing::warn!(%err, monitor = self.monitor, "error while tearing down window list");
        }
        for handle in self.handles.drain(..) {
            host.destroy_handle(HandleId::window(self.monitor, handle.window));
        }
    }

    fn add_handle(&mut self, window: WindowId, host: &mut dyn ShellHost) {
        let handle = self.handle_for(window);
        let label = host.window_title(window);
        host.create_handle(handle, Container::Windows, label);
        let visible = compute_visible(self.config, self.monitor, window, &*host);
        self.handles.push(WindowHandle { window, visible });
        host.place_handle(handle, self.handles.len() - 1);
        host.set_handle_visible(handle, visible);
        self.dnd.register_widget(handle);
    }

    fn remove_handle(
        &mut self,
        index: usize,
        order: &mut WindowOrder,
        host: &mut dyn ShellHost,
    ) -> Result<()> {
        if index >= self.handles.len() {
            let err = OrderError::IndexOutOfRange {
                index,
                len: self.handles.len(),
            };
            tracing::error!(%err, monitor = self.monitor, "window list out of sync");
            return Err(err.into());
        }
        // Drop the local handle first so a final drag update sees the same
        // list as the order does.
        let removed = self.handles.remove(index);
        let handle = self.handle_for(removed.window);
        let mut ctx = DragCtx::new(self.monitor, &self.handles, order, host);
        self.dnd.on_widget_destroyed(handle, &mut ctx);
        let result = ctx.into_result();
        host.destroy_handle(handle);
        result
    }

    fn move_handle(&mut self, src: usize, dst: usize, host: &mut dyn ShellHost) -> Result<()> {
        if !move_in_vec(&mut self.handles, src, dst) {
            let err = OrderError::IndexOutOfRange {
                index: src,
                len: self.handles.len(),
            };
            tracing::error!(%err, monitor = self.monitor, "window list out of sync");
            return Err(err.into());
        }
        let index = dst.min(self.handles.len() - 1);
        let window = self.handles[index].window;
        host.place_handle(self.handle_for(window), index);
        Ok(())
    }
}

fn compute_visible(
    config: TaskbarConfig,
    monitor: MonitorIndex,
    window: WindowId,
    host: &dyn ShellHost,
) -> bool {
    if host.skip_taskbar(window) {
        return false;
    }
    if config.isolate_workspaces && !host.window_on_active_workspace(window) {
        return false;
    }
    if config.isolate_monitors && host.window_monitor(window) != Some(monitor) {
        return false;
    }
    true
}

fn insertion_target(
    monitor: MonitorIndex,
    handles: &[WindowHandle],
    host: &dyn ShellHost,
    window: WindowId,
    pos: Point,
) -> Option<usize> {
    let origin = host.container_origin(monitor, Container::Windows);
    let x = pos.relative_to(origin).x;
    let children: Vec<(usize, Bounds)> = handles
        .iter()
        .enumerate()
        .filter(|(_, h)| h.visible)
        .filter_map(|(index, h)| {
            host.handle_bounds(HandleId::window(monitor, h.window))
                .map(|bounds| (index, bounds))
        })
        .collect();
    let moving_visible = handles.iter().any(|h| h.window == window && h.visible);
    insertion_index(&children, x, moving_visible)
}

/// Borrowed state a window list's drag handler works on. The detector is
/// kept outside so the handler can receive it mutably.
struct DragCtx<'a> {
    monitor: MonitorIndex,
    handles: &'a [WindowHandle],
    order: &'a mut WindowOrder,
    host: &'a mut dyn ShellHost,
    error: Option<TaskbarError>,
}

impl<'a> DragCtx<'a> {
    fn new(
        monitor: MonitorIndex,
        handles: &'a [WindowHandle],
        order: &'a mut WindowOrder,
        host: &'a mut dyn ShellHost,
    ) -> Self {
        Self {
            monitor,
            handles,
            order,
            host,
            error: None,
        }
    }

    fn into_result(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn on_update(
        &mut self,
        dnd: &mut DragDropManager<HandleId>,
        handle: HandleId,
        pos: Point,
    ) -> Result<()> {
        let Some(window) = handle.window_id() else {
            return Ok(());
        };
        let local = self.handles.iter().position(|h| h.window == window);
        let src = self.order.index_of(window);
        let src = match (local, src) {
            (Some(local), Some(src)) if local == src => src,
            _ => {
                // Removed, or an order change not yet replayed here.
                tracing::trace!(window = %window, "skipping drag update");
                return Ok(());
            }
        };

        if dnd.is_active() {
            match self.host.monitor_for_point(pos) {
                Some(target) if target != self.monitor => {
                    tracing::debug!(
                        window = %window,
                        from = self.monitor,
                        to = target,
                        "handing drag over to another monitor"
                    );
                    dnd.end_drag(self);
                    self.order.transfer_drag_to_monitor(src, target, pos)?;
                    return Ok(());
                }
                Some(_) => {}
                None => {
                    tracing::trace!(x = pos.x, y = pos.y, "pointer outside every monitor");
                }
            }
        }

        let Some(dst) = insertion_target(self.monitor, self.handles, &*self.host, window, pos)
        else {
            return Ok(());
        };
        if dst != src {
            self.order.move_window(src, dst)?;
        }
        Ok(())
    }
}

impl DragHandler<HandleId> for DragCtx<'_> {
    fn handle_drag_event(
        &mut self,
        dnd: &mut DragDropManager<HandleId>,
        event: DragEvent<HandleId>,
    ) {
        match event {
            DragEvent::Started { widget, .. } => self.host.set_handle_dragging(widget, true),
            DragEvent::Update { widget, pos } => {
                if let Err(err) = self.on_update(dnd, widget, pos) {
                    self.error.get_or_insert(err);
                }
            }
            DragEvent::Ended { widget, .. } => self.host.set_handle_dragging(widget, false),
        }
    }
}
