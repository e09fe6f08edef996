use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::{InputDriver, OutputDriver};
use crate::ui::UiFrame;

/// Reads crossterm events. Key releases are dropped so every key reports
/// once on platforms that emit both press and release.
#[derive(Default)]
pub struct ConsoleInputDriver {
    event_queue: VecDeque<Event>,
}

impl ConsoleInputDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_internal(&mut self) -> io::Result<Event> {
        loop {
            let evt = crossterm::event::read()?;
            if keep(&evt) {
                return Ok(evt);
            }
        }
    }
}

fn keep(event: &Event) -> bool {
    !matches!(event, Event::Key(key) if key.kind == KeyEventKind::Release)
}

impl InputDriver for ConsoleInputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        if !self.event_queue.is_empty() {
            return Ok(true);
        }
        crossterm::event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        if let Some(evt) = self.event_queue.pop_front() {
            return Ok(evt);
        }
        self.read_internal()
    }
}

pub struct ConsoleOutputDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    entered: bool,
}

impl ConsoleOutputDriver {
    pub fn new() -> io::Result<Self> {
        let stdout = io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            entered: false,
        })
    }
}

impl OutputDriver for ConsoleOutputDriver {
    type Backend = CrosstermBackend<Stdout>;

    fn enter(&mut self) -> io::Result<()> {
        if self.entered {
            return Ok(());
        }
        execute!(
            self.terminal.backend_mut(),
            EnterAlternateScreen,
            EnableMouseCapture
        )?;
        terminal::enable_raw_mode()?;
        self.terminal.hide_cursor()?;
        self.entered = true;
        Ok(())
    }

    fn exit(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        self.entered = false;
        Ok(())
    }

    fn draw<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(UiFrame<'_>),
    {
        self.terminal
            .draw(move |frame| {
                let wrapper = UiFrame::new(frame);
                f(wrapper);
            })
            .map(|_| ())
            .map_err(|err| io::Error::other(err.to_string()))
    }
}

impl Drop for ConsoleOutputDriver {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}
