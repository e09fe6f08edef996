//! Canonical ordering of windows shared by every monitor's window list.
//!
//! Views never reorder themselves. A view that wants a window moved asks
//! [`WindowOrder::move_window`], which mutates the canonical sequence and
//! queues a [`OrderEvent`]. The coordinator drains the queue and delivers
//! each event to every view, which replays it on its local handles. Since
//! every view replays the same events in the same order, local orders stay
//! index-aligned with the canonical sequence.

pub mod store;

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{MonitorIndex, Point};

pub use store::{FileOrderStore, MemoryOrderStore, OrderStore, StoreError};

/// Stable identifier assigned by the host when a window is created.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    WindowAppended(WindowId),
    WindowRemoved(usize),
    /// Remove at `src`, then insert at `dst` in the shortened sequence.
    WindowMoved { src: usize, dst: usize },
    /// The window at `src` is being dragged onto `monitor`'s panel. Carries
    /// no mutation; the target view decides where the window lands.
    DragTransferredToMonitor {
        src: usize,
        monitor: MonitorIndex,
        pos: Point,
    },
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("window {0} is already in the order")]
    Duplicate(WindowId),
    #[error("window {0} is not in the order")]
    UnknownWindow(WindowId),
    #[error("index {index} out of range (len={len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("window order has been destroyed")]
    Destroyed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct WindowOrder {
    windows: Vec<WindowId>,
    outbox: VecDeque<OrderEvent>,
    store: Box<dyn OrderStore>,
    destroyed: bool,
}

impl fmt::Debug for WindowOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowOrder")
            .field("windows", &self.windows)
            .field("pending", &self.outbox.len())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl WindowOrder {
    pub fn new(store: Box<dyn OrderStore>) -> Self {
        Self {
            windows: Vec::new(),
            outbox: VecDeque::new(),
            store,
            destroyed: false,
        }
    }

    pub fn windows(&self) -> &[WindowId] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.windows.contains(&window)
    }

    pub fn index_of(&self, window: WindowId) -> Option<usize> {
        self.windows.iter().position(|w| *w == window)
    }

    pub fn window_at(&self, index: usize) -> Option<WindowId> {
        self.windows.get(index).copied()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Pop the oldest undelivered event.
    pub fn next_event(&mut self) -> Option<OrderEvent> {
        self.outbox.pop_front()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Append the windows that exist at startup, ordered by the persisted
    /// order so the taskbar survives a restart.
    pub fn load_initial<I>(&mut self, live: I) -> Result<(), OrderError>
    where
        I: IntoIterator<Item = WindowId>,
    {
        let live: Vec<WindowId> = live.into_iter().collect();
        let persisted = match self.store.load_order() {
            Ok(persisted) => persisted,
            Err(err) => {
                tracing::warn!(%err, "ignoring unreadable persisted window order");
                Vec::new()
            }
        };
        let restored = restore_order(&live, &persisted);
        tracing::debug!(
            live = live.len(),
            persisted = persisted.len(),
            "restoring window order"
        );
        for window in restored {
            self.append(window)?;
        }
        Ok(())
    }

    pub fn append(&mut self, window: WindowId) -> Result<(), OrderError> {
        self.ensure_alive()?;
        if self.windows.contains(&window) {
            let err = OrderError::Duplicate(window);
            tracing::error!(%err, "refusing to append window");
            return Err(err);
        }
        self.windows.push(window);
        tracing::debug!(window = %window, index = self.windows.len() - 1, "window appended");
        self.outbox.push_back(OrderEvent::WindowAppended(window));
        Ok(())
    }

    pub fn remove(&mut self, window: WindowId) -> Result<usize, OrderError> {
        self.ensure_alive()?;
        let Some(index) = self.index_of(window) else {
            let err = OrderError::UnknownWindow(window);
            tracing::error!(%err, "refusing to remove window");
            return Err(err);
        };
        self.windows.remove(index);
        tracing::debug!(window = %window, index, "window removed");
        self.outbox.push_back(OrderEvent::WindowRemoved(index));
        Ok(index)
    }

    /// Move the window at `src` so it ends up at `dst` of the sequence with
    /// `src` already removed. `dst == len` is accepted and means "last".
    pub fn move_window(&mut self, src: usize, dst: usize) -> Result<(), OrderError> {
        self.ensure_alive()?;
        let len = self.windows.len();
        self.check_index(src, len)?;
        if dst > len {
            return Err(self.out_of_range(dst, len));
        }
        move_in_vec(&mut self.windows, src, dst);
        tracing::debug!(src, dst, "window moved");
        self.outbox.push_back(OrderEvent::WindowMoved { src, dst });
        Ok(())
    }

    /// Announce that the drag of the window at `src` continues on
    /// `monitor`. Nothing is reordered here.
    pub fn transfer_drag_to_monitor(
        &mut self,
        src: usize,
        monitor: MonitorIndex,
        pos: Point,
    ) -> Result<(), OrderError> {
        self.ensure_alive()?;
        self.check_index(src, self.windows.len())?;
        tracing::debug!(
            src,
            monitor,
            x = pos.x,
            y = pos.y,
            "drag transferred to monitor"
        );
        self.outbox
            .push_back(OrderEvent::DragTransferredToMonitor { src, monitor, pos });
        Ok(())
    }

    pub fn save(&mut self) -> Result<(), OrderError> {
        self.store.save_order(&self.windows)?;
        Ok(())
    }

    /// Persist the current order and stop accepting changes. Undelivered
    /// events are discarded.
    pub fn destroy(&mut self) -> Result<(), OrderError> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.outbox.clear();
        tracing::debug!(windows = self.windows.len(), "saving window order");
        self.save()
    }

    fn ensure_alive(&self) -> Result<(), OrderError> {
        if self.destroyed {
            return Err(OrderError::Destroyed);
        }
        Ok(())
    }

    fn check_index(&self, index: usize, len: usize) -> Result<(), OrderError> {
        if index >= len {
            return Err(self.out_of_range(index, len));
        }
        Ok(())
    }

    fn out_of_range(&self, index: usize, len: usize) -> OrderError {
        let err = OrderError::IndexOutOfRange { index, len };
        tracing::error!(%err, "invalid window index");
        err
    }
}

/// Remove the item at `src` and insert it at `dst` of the shortened vector,
/// clamping `dst` to its length. Returns `false` if `src` is out of range.
pub fn move_in_vec<T>(items: &mut Vec<T>, src: usize, dst: usize) -> bool {
    if src >= items.len() {
        return false;
    }
    let item = items.remove(src);
    let dst = dst.min(items.len());
    items.insert(dst, item);
    true
}

/// Sort `live` by each window's position in `persisted`. Windows missing
/// from `persisted` go last, keeping the order they were listed in.
pub fn restore_order(live: &[WindowId], persisted: &[WindowId]) -> Vec<WindowId> {
    let mut positions = HashMap::with_capacity(persisted.len());
    for (index, window) in persisted.iter().enumerate() {
        positions.entry(*window).or_insert(index);
    }
    let mut restored = live.to_vec();
    restored.sort_by_key(|window| positions.get(window).copied().unwrap_or(usize::MAX));
    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(raw: &[u64]) -> Vec<WindowId> {
        raw.iter().copied().map(WindowId).collect()
    }

    fn order_with(raw: &[u64]) -> WindowOrder {
        let mut order = WindowOrder::new(Box::new(MemoryOrderStore::new()));
        for id in ids(raw) {
            order.append(id).unwrap();
        }
        while order.next_event().is_some() {}
        order
    }

    #[test]
    fn move_window_removes_then_inserts() {
        let mut order = order_with(&[1, 2, 3, 4]);
        order.move_window(0, 2).unwrap();
        assert_eq!(order.windows(), ids(&[2, 3, 1, 4]).as_slice());
        assert_eq!(
            order.next_event(),
            Some(OrderEvent::WindowMoved { src: 0, dst: 2 })
        );
        assert_eq!(order.next_event(), None);
    }

    #[test]
    fn move_window_to_len_lands_last() {
        let mut order = order_with(&[1, 2, 3]);
        order.move_window(0, 3).unwrap();
        assert_eq!(order.windows(), ids(&[2, 3, 1]).as_slice());
        order.move_window(2, 0).unwrap();
        assert_eq!(order.windows(), ids(&[1, 2, 3]).as_slice());
    }

    #[test]
    fn move_window_rejects_bad_indices() {
        let mut order = order_with(&[1, 2]);
        assert!(matches!(
            order.move_window(2, 0),
            Err(OrderError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            order.move_window(0, 3),
            Err(OrderError::IndexOutOfRange { index: 3, len: 2 })
        ));
        assert!(!order.has_pending_events());
    }

    #[test]
    fn append_and_remove_keep_every_window_once() {
        let mut order = WindowOrder::new(Box::new(MemoryOrderStore::new()));
        for id in ids(&[5, 6, 7]) {
            order.append(id).unwrap();
        }
        assert!(matches!(
            order.append(WindowId(6)),
            Err(OrderError::Duplicate(WindowId(6)))
        ));
        order.move_window(2, 0).unwrap();
        assert_eq!(order.remove(WindowId(5)).unwrap(), 1);
        assert!(matches!(
            order.remove(WindowId(5)),
            Err(OrderError::UnknownWindow(WindowId(5)))
        ));
        assert_eq!(order.windows(), ids(&[7, 6]).as_slice());

        let events: Vec<_> = std::iter::from_fn(|| order.next_event()).collect();
        assert_eq!(
            events,
            vec![
                OrderEvent::WindowAppended(WindowId(5)),
                OrderEvent::WindowAppended(WindowId(6)),
                OrderEvent::WindowAppended(WindowId(7)),
                OrderEvent::WindowMoved { src: 2, dst: 0 },
                OrderEvent::WindowRemoved(1),
            ]
        );
    }

    #[test]
    fn transfer_does_not_reorder() {
        let mut order = order_with(&[1, 2]);
        order
            .transfer_drag_to_monitor(1, 3, Point::new(10, 0))
            .unwrap();
        assert_eq!(order.windows(), ids(&[1, 2]).as_slice());
        assert_eq!(
            order.next_event(),
            Some(OrderEvent::DragTransferredToMonitor {
                src: 1,
                monitor: 3,
                pos: Point::new(10, 0)
            })
        );
        let out_of_range = order.transfer_drag_to_monitor(2, 0, Point::default());
        assert!(out_of_range.is_err());
    }

    #[test]
    fn restore_order_puts_unknown_windows_last() {
        let restored = restore_order(&ids(&[3, 1, 2]), &ids(&[2, 3]));
        assert_eq!(restored, ids(&[2, 3, 1]));
        let restored = restore_order(&ids(&[9, 3, 8, 1]), &ids(&[1, 3]));
        assert_eq!(restored, ids(&[1, 3, 9, 8]));
        assert_eq!(restore_order(&[], &ids(&[1])), Vec::<WindowId>::new());
    }

    #[test]
    fn load_initial_uses_persisted_order() {
        let store = MemoryOrderStore::with_order(ids(&[2, 3]));
        let mut order = WindowOrder::new(Box::new(store));
        order.load_initial(ids(&[3, 1, 2])).unwrap();
        assert_eq!(order.windows(), ids(&[2, 3, 1]).as_slice());
        assert_eq!(
            order.next_event(),
            Some(OrderEvent::WindowAppended(WindowId(2)))
        );
    }

    #[test]
    fn destroy_saves_and_refuses_further_changes() {
        let store = MemoryOrderStore::new();
        let mut order = WindowOrder::new(Box::new(store.clone()));
        order.append(WindowId(4)).unwrap();
        order.append(WindowId(2)).unwrap();
        order.destroy().unwrap();
        assert_eq!(store.order(), ids(&[4, 2]));
        assert!(!order.has_pending_events());
        assert!(matches!(
            order.append(WindowId(9)),
            Err(OrderError::Destroyed)
        ));
        // idempotent
        order.destroy().unwrap();
    }

    #[test]
    fn move_in_vec_clamps_destination() {
        let mut v = vec!['a', 'b', 'c'];
        assert!(move_in_vec(&mut v, 0, 10));
        assert_eq!(v, vec!['b', 'c', 'a']);
        assert!(!move_in_vec(&mut v, 3, 0));
    }
}
