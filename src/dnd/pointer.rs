use std::cell::Cell;
use std::rc::Rc;

use crate::geometry::Point;

/// Snapshot of the global pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerState {
    pub pos: Point,
    pub primary_held: bool,
}

pub trait PointerProbe {
    fn read(&self) -> PointerState;
}

impl<T: PointerProbe + ?Sized> PointerProbe for Rc<T> {
    fn read(&self) -> PointerState {
        (**self).read()
    }
}

/// Pointer state fed by the host's input loop and read back by every drag
/// detector. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SharedPointer {
    state: Rc<Cell<PointerState>>,
}

impl SharedPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, state: PointerState) {
        self.state.set(state);
    }

    pub fn move_to(&self, pos: Point) {
        let mut state = self.state.get();
        state.pos = pos;
        self.state.set(state);
    }

    pub fn press(&self) {
        let mut state = self.state.get();
        state.primary_held = true;
        self.state.set(state);
    }

    pub fn release(&self) {
        let mut state = self.state.get();
        state.primary_held = false;
        self.state.set(state);
    }
}

impl PointerProbe for SharedPointer {
    fn read(&self) -> PointerState {
        self.state.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let pointer = SharedPointer::new();
        let other = pointer.clone();
        pointer.move_to(Point::new(4, 2));
        pointer.press();
        assert_eq!(
            other.read(),
            PointerState {
                pos: Point::new(4, 2),
                primary_held: true
            }
        );
        other.release();
        assert!(!pointer.read().primary_held);
    }
}
