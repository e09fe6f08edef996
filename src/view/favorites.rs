//! Pinned launcher buttons of one monitor's panel.
//!
//! Unlike window buttons, favorites are ordered locally and never leave
//! their monitor. The new position is written back to the favorites store
//! once, when the drag ends, and only if it changed.

use std::fmt;
use std::rc::Rc;

use crossterm::event::MouseButton;

use super::{Container, HandleId, Slot, insertion_index};
use crate::config::TaskbarConfig;
use crate::dnd::{DragDropManager, DragError, DragEvent, DragHandler, DragState, PointerProbe};
use crate::geometry::{Bounds, MonitorIndex, Point};
use crate::host::ShellHost;
use crate::order::move_in_vec;
use crate::timer::{TimerId, TimerSource};

/// Identifier of a favorited application, as known to the favorites store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppId(pub String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct FavoriteHandle {
    serial: u64,
    app: AppId,
}

#[derive(Debug)]
pub struct FavoritesView {
    monitor: MonitorIndex,
    favorites: Vec<FavoriteHandle>,
    next_serial: u64,
    /// Index the dragged favorite started from.
    drag_origin: Option<usize>,
    dnd: DragDropManager<HandleId>,
}

impl FavoritesView {
    pub fn new(
        monitor: MonitorIndex,
        config: TaskbarConfig,
        probe: Rc<dyn PointerProbe>,
        timers: Rc<dyn TimerSource>,
    ) -> Self {
        Self {
            monitor,
            favorites: Vec::new(),
            next_serial: 0,
            drag_origin: None,
            dnd: DragDropManager::with_poll_interval(probe, timers, config.poll_interval),
        }
    }

    pub fn monitor(&self) -> MonitorIndex {
        self.monitor
    }

    pub fn apps(&self) -> Vec<AppId> {
        self.favorites.iter().map(|f| f.app.clone()).collect()
    }

    pub fn handles(&self) -> Vec<HandleId> {
        self.favorites
            .iter()
            .map(|f| HandleId::favorite(self.monitor, f.serial))
            .collect()
    }

    /// Handle currently showing `app`.
    pub fn handle_for(&self, app: &AppId) -> Option<HandleId> {
        self.favorites
            .iter()
            .find(|f| &f.app == app)
            .map(|f| HandleId::favorite(self.monitor, f.serial))
    }

    pub fn drag_state(&self) -> DragState<HandleId> {
        self.dnd.state()
    }

    pub fn owns_timer(&self, timer: TimerId) -> bool {
        self.dnd.timer() == Some(timer)
    }

    /// Throw away every favorite button and rebuild the list from the
    /// favorites store. A drag in progress ends without committing.
    pub fn recreate(&mut self, host: &mut dyn ShellHost) {
        self.drag_origin = None;
        let old = std::mem::take(&mut self.favorites);
        {
            let mut ctx = FavoritesCtx::new(
                self.monitor,
                &mut self.favorites,
                &mut self.drag_origin,
                &mut *host,
            );
            for favorite in &old {
                let handle = HandleId::favorite(self.monitor, favorite.serial);
                self.dnd.on_widget_destroyed(handle, &mut ctx);
            }
        }
        for favorite in old {
            host.destroy_handle(HandleId::favorite(self.monitor, favorite.serial));
        }

        for (index, favorite) in host.favorites().into_iter().enumerate() {
            self.next_serial += 1;
            let serial = self.next_serial;
            let handle = HandleId::favorite(self.monitor, serial);
            host.create_handle(handle, Container::Favorites, favorite.name);
            host.place_handle(handle, index);
            host.set_handle_visible(handle, true);
            self.dnd.register_widget(handle);
            self.favorites.push(FavoriteHandle {
                serial,
                app: favorite.app,
            });
        }
        tracing::debug!(
            monitor = self.monitor,
            favorites = self.favorites.len(),
            "favorites recreated"
        );
    }

    pub fn button_press(
        &mut self,
        handle: HandleId,
        button: MouseButton,
        host: &mut dyn ShellHost,
    ) {
        let mut ctx = FavoritesCtx::new(
            self.monitor,
            &mut self.favorites,
            &mut self.drag_origin,
            host,
        );
        self.dnd.on_button_press(handle, button, &mut ctx);
    }

    /// A primary release on the pressed favorite launches it.
    pub fn button_release(
        &mut self,
        handle: HandleId,
        button: MouseButton,
        host: &mut dyn ShellHost,
    ) {
        let clicked = button == MouseButton::Left && self.dnd.state() == DragState::Armed(handle);
        {
            let mut ctx = FavoritesCtx::new(
                self.monitor,
                &mut self.favorites,
                &mut self.drag_origin,
                host,
            );
            self.dnd.on_button_release(handle, button, &mut ctx);
        }
        if !clicked {
            return;
        }
        let Slot::Favorite(serial) = handle.slot else {
            return;
        };
        if let Some(favorite) = self.favorites.iter().find(|f| f.serial == serial) {
            tracing::debug!(app = %favorite.app, "launching favorite");
            host.launch_favorite(&favorite.app);
        }
    }

    pub fn hover_changed(
        &mut self,
        handle: HandleId,
        hovered: bool,
        host: &mut dyn ShellHost,
    ) -> bool {
        let mut ctx = FavoritesCtx::new(
            self.monitor,
            &mut self.favorites,
            &mut self.drag_origin,
            host,
        );
        self.dnd.on_hover_changed(handle, hovered, &mut ctx)
    }

    pub fn poll(&mut self, timer: TimerId, host: &mut dyn ShellHost) -> Result<(), DragError> {
        let mut ctx = FavoritesCtx::new(
            self.monitor,
            &mut self.favorites,
            &mut self.drag_origin,
            host,
        );
        self.dnd.on_poll(timer, &mut ctx)
    }

    pub fn destroy(&mut self, host: &mut dyn ShellHost) {
        self.drag_origin = None;
        {
            let mut ctx = FavoritesCtx::new(
                self.monitor,
                &mut self.favorites,
                &mut self.drag_origin,
                host,
            );
            self.dnd.destroy(&mut ctx);
        }
        for favorite in self.favorites.drain(..) {
            host.destroy_handle(HandleId::favorite(self.monitor, favorite.serial));
        }
    }
}

struct FavoritesCtx<'a> {
    monitor: MonitorIndex,
    favorites: &'a mut Vec<FavoriteHandle>,
    drag_origin: &'a mut Option<usize>,
    host: &'a mut dyn ShellHost,
}

impl<'a> FavoritesCtx<'a> {
    fn new(
        monitor: MonitorIndex,
        favorites: &'a mut Vec<FavoriteHandle>,
        drag_origin: &'a mut Option<usize>,
        host: &'a mut dyn ShellHost,
    ) -> Self {
        Self {
            monitor,
            favorites,
            drag_origin,
            host,
        }
    }

    fn position(&self, handle: HandleId) -> Option<usize> {
        let Slot::Favorite(serial) = handle.slot else {
            return None;
        };
        self.favorites.iter().position(|f| f.serial == serial)
    }

    fn on_update(&mut self, handle: HandleId, pos: Point) {
        let Some(current) = self.position(handle) else {
            return;
        };
        let origin = self
            .host
            .container_origin(self.monitor, Container::Favorites);
        let x = pos.relative_to(origin).x;
        let children: Vec<(usize, Bounds)> = self
            .favorites
            .iter()
            .enumerate()
            .filter_map(|(index, f)| {
                self.host
                    .handle_bounds(HandleId::favorite(self.monitor, f.serial))
                    .map(|bounds| (index, bounds))
            })
            .collect();
        let Some(target) = insertion_index(&children, x, true) else {
            return;
        };
        if target == current {
            return;
        }
        move_in_vec(&mut *self.favorites, current, target);
        let index = target.min(self.favorites.len() - 1);
        self.host.place_handle(handle, index);
    }

    fn on_ended(&mut self, handle: HandleId) {
        self.host.set_handle_dragging(handle, false);
        let Some(origin) = self.drag_origin.take() else {
            return;
        };
        let Some(current) = self.position(handle) else {
            return;
        };
        if current != origin {
            let app = self.favorites[current].app.clone();
            tracing::debug!(app = %app, from = origin, to = current, "favorite moved");
            self.host.move_favorite(&app, current);
        }
    }
}

impl DragHandler<HandleId> for FavoritesCtx<'_> {
    fn handle_drag_event(
        &mut self,
        _dnd: &mut DragDropManager<HandleId>,
        event: DragEvent<HandleId>,
    ) {
        match event {
            DragEvent::Started { widget, .. } => {
                *self.drag_origin = self.position(widget);
                self.host.set_handle_dragging(widget, true);
            }
            DragEvent::Update { widget, pos } => self.on_update(widget, pos),
            DragEvent::Ended { widget, .. } => self.on_ended(widget),
        }
    }
}
