pub mod console;

use ::crossterm::event::Event;
use ratatui::backend::Backend;
use std::io;
use std::time::Duration;

use crate::ui::UiFrame;

pub trait InputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;
    fn read(&mut self) -> io::Result<Event>;
}

impl<T: InputDriver + ?Sized> InputDriver for &mut T {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        (**self).poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        (**self).read()
    }
}

pub trait OutputDriver {
    type Backend: Backend;

    fn enter(&mut self) -> io::Result<()>;
    fn exit(&mut self) -> io::Result<()>;

    fn draw<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(UiFrame<'_>);
}
