use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use indoc::indoc;
use ratatui::style::Style;
use tracing::Level;

use term_taskbar::config::TaskbarConfig;
use term_taskbar::dnd::PointerProbe;
use term_taskbar::drivers::OutputDriver;
use term_taskbar::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use term_taskbar::event_loop::{ControlFlow, EventLoop, LoopEvent};
use term_taskbar::host::{FavoriteApp, FavoritesHost, MonitorResolver, WindowHost};
use term_taskbar::order::{FileOrderStore, MemoryOrderStore, OrderStore};
use term_taskbar::panel::Panel;
use term_taskbar::ui::UiFrame;
use term_taskbar::{
    AppId, HeadlessShell, IntervalTimers, Point, ScrollDirection, SharedPointer,
    Taskbar, TaskbarError, TimerId, theme, tracing_sub,
};

const KEYS: &str = indoc! {"
    Mouse:
      left drag    reorder buttons, or drag a window button onto another monitor
      left click   activate / minimize a window, launch a favorite
      middle click close a window
      wheel        walk focus through a monitor's windows

    Keys:
      n  open a window on the monitor under the pointer
      x  close the focused window
      m  move the focused window to the next monitor
      s  send the focused window to the other workspace
      k  toggle skip-taskbar on the focused window
      w  switch workspace
      f  rotate the favorites
      q  quit
"};

const STATUS: &str = "n new  x close  m monitor  s send  k skip  w workspace  f favorites  q quit";

/// Multi-monitor taskbar demo on a simulated shell.
#[derive(Debug, Parser)]
#[command(name = "term-taskbar", version, about, after_help = KEYS)]
struct Args {
    /// Number of simulated monitors, side by side.
    #[arg(long, default_value_t = 2)]
    monitors: usize,

    /// Windows opened at startup.
    #[arg(long, default_value_t = 3)]
    windows: usize,

    /// Drag poll interval in milliseconds.
    #[arg(long = "poll-ms", default_value_t = 50)]
    poll_ms: u64,

    /// Show every window on every monitor.
    #[arg(long)]
    no_isolate_monitors: bool,

    /// Show windows from every workspace.
    #[arg(long)]
    no_isolate_workspaces: bool,

    /// Where the window order is kept between runs.
    #[arg(long, value_name = "PATH")]
    state_file: Option<PathBuf>,

    /// Write logs to this file. Nothing is logged otherwise.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log at trace level instead of debug.
    #[arg(short, long)]
    verbose: bool,
}

struct Demo {
    shell: HeadlessShell,
    pointer: SharedPointer,
    taskbar: Taskbar,
    panel: Panel,
    closed_seen: usize,
    opened: usize,
}

impl Demo {
    fn new(args: &Args, width: u16, height: u16, timers: Rc<IntervalTimers>) -> io::Result<Self> {
        let monitors = args.monitors.clamp(1, width.max(1) as usize);
        let mut shell = HeadlessShell::with_monitors(&split_width(width, monitors), height);
        shell.set_favorites(
            ["terminal", "browser", "files"]
                .into_iter()
                .map(|name| FavoriteApp {
                    app: AppId::new(name),
                    name: name.to_string(),
                })
                .collect(),
        );

        let config = TaskbarConfig::default()
            .with_poll_interval(Duration::from_millis(args.poll_ms.max(1)))
            .with_isolate_monitors(!args.no_isolate_monitors)
            .with_isolate_workspaces(!args.no_isolate_workspaces);
        let pointer = SharedPointer::new();
        let mut taskbar = Taskbar::new(
            config,
            open_store(args.state_file.clone()),
            Rc::new(pointer.clone()),
            timers,
        );
        for monitor in 0..monitors {
            taskbar
                .add_monitor(monitor, &mut shell)
                .map_err(io::Error::other)?;
        }
        for index in 0..args.windows {
            shell.open_window(&format!("app {}", index + 1), index % monitors);
        }
        let live = shell.window_ids();
        taskbar
            .load_initial_windows(&live, &mut shell)
            .map_err(io::Error::other)?;

        Ok(Self {
            shell,
            pointer,
            taskbar,
            panel: Panel::new(),
            closed_seen: 0,
            opened: args.windows,
        })
    }

    fn handle_event(&mut self, event: Event) -> ControlFlow {
        let result = match event {
            Event::Key(key) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return ControlFlow::Quit,
                _ => self.handle_key(key),
            },
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => Ok(()),
        };
        if let Err(err) = result.and_then(|_| self.sync_closed()) {
            tracing::error!(%err, "taskbar rejected event");
        }
        ControlFlow::Continue
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<(), TaskbarError> {
        let focused = self.shell.focused_window();
        match (key.code, focused) {
            (KeyCode::Char('n'), _) => {
                let monitor = self
                    .shell
                    .monitor_for_point(self.pointer_pos())
                    .unwrap_or_default();
                self.opened += 1;
                let title = format!("app {}", self.opened);
                let window = self.shell.open_window(&title, monitor);
                self.taskbar.window_created(window, &mut self.shell)
            }
            (KeyCode::Char('x'), Some(window)) => {
                self.shell.close_window(window);
                Ok(())
            }
            (KeyCode::Char('m'), Some(window)) => {
                let count = self.shell.monitor_count();
                let next = self
                    .shell
                    .window_monitor(window)
                    .map_or(0, |monitor| (monitor + 1) % count);
                self.shell.set_window_monitor(window, next);
                self.taskbar.window_entered_monitor(window, &mut self.shell)
            }
            (KeyCode::Char('s'), Some(window)) => {
                let workspace = self.shell.window_workspace(window).unwrap_or_default();
                self.shell.set_window_workspace(window, (workspace + 1) % 2);
                self.taskbar
                    .window_workspace_changed(window, &mut self.shell)
            }
            (KeyCode::Char('k'), Some(window)) => {
                let skip = self.shell.skip_taskbar(window);
                self.shell.set_skip_taskbar(window, !skip);
                self.taskbar.window_changed(window, &mut self.shell)
            }
            (KeyCode::Char('w'), _) => {
                let workspace = (self.shell.active_workspace() + 1) % 2;
                self.shell.set_active_workspace(workspace);
                self.taskbar.workspace_switched(&mut self.shell)
            }
            (KeyCode::Char('f'), _) => {
                let mut favorites = self.shell.favorites();
                if !favorites.is_empty() {
                    favorites.rotate_left(1);
                }
                self.shell.set_favorites(favorites);
                self.taskbar.favorites_changed(&mut self.shell);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<(), TaskbarError> {
        let pos = Point::new(i32::from(mouse.column), i32::from(mouse.row));
        self.pointer.move_to(pos);
        match mouse.kind {
            MouseEventKind::Down(button) => {
                if button == MouseButton::Left {
                    self.pointer.press();
                }
                self.update_hover(pos)?;
                if let Some(handle) = self.shell.hit_test(pos) {
                    self.taskbar.button_press(handle, button, &mut self.shell)?;
                }
            }
            MouseEventKind::Up(button) => {
                if button == MouseButton::Left {
                    self.pointer.release();
                }
                if let Some(handle) = self.shell.hit_test(pos) {
                    self.taskbar
                        .button_release(handle, button, &mut self.shell)?;
                }
                self.update_hover(pos)?;
            }
            MouseEventKind::Drag(_) | MouseEventKind::Moved => self.update_hover(pos)?,
            MouseEventKind::ScrollUp => self.scroll(pos, ScrollDirection::Up)?,
            MouseEventKind::ScrollDown => self.scroll(pos, ScrollDirection::Down)?,
            _ => {}
        }
        Ok(())
    }

    fn scroll(&mut self, pos: Point, direction: ScrollDirection) -> Result<(), TaskbarError> {
        let Some(monitor) = self.shell.monitor_for_point(pos) else {
            return Ok(());
        };
        let on_panel = self
            .shell
            .panel_bounds(monitor)
            .is_some_and(|panel| panel.contains(pos));
        if on_panel {
            self.taskbar.scroll(monitor, direction, &mut self.shell)?;
        }
        Ok(())
    }

    /// Tell the taskbar when the pointer leaves one button or enters another.
    fn update_hover(&mut self, pos: Point) -> Result<(), TaskbarError> {
        let current = self.shell.hit_test(pos);
        let previous = self.panel.hovered();
        if current == previous {
            return Ok(());
        }
        if let Some(handle) = previous
            && self.shell.has_handle(handle)
        {
            self.taskbar.hover_changed(handle, false, &mut self.shell)?;
        }
        let suppress = match current {
            Some(handle) => self.taskbar.hover_changed(handle, true, &mut self.shell)?,
            None => false,
        };
        // the update may have moved another button under the pointer
        let landed = self.shell.hit_test(pos);
        let suppressed = suppress && landed == current;
        self.panel.set_hovered(landed, suppressed);
        Ok(())
    }

    fn timer_fired(&mut self, timer: TimerId) {
        if let Err(err) = self
            .taskbar
            .timer_fired(timer, &mut self.shell)
            .and_then(|_| self.sync_closed())
        {
            tracing::error!(%err, "drag poll failed");
        }
    }

    /// Report windows the shell has finished closing.
    fn sync_closed(&mut self) -> Result<(), TaskbarError> {
        let closed: Vec<_> = self.shell.closed()[self.closed_seen..].to_vec();
        self.closed_seen += closed.len();
        for window in closed {
            self.taskbar.window_destroyed(window, &mut self.shell)?;
        }
        Ok(())
    }

    fn pointer_pos(&self) -> Point {
        self.pointer.read().pos
    }

    fn draw(&self, mut frame: UiFrame<'_>) {
        self.panel.render(&mut frame, &self.shell);
        let area = frame.area();
        if area.height == 0 {
            return;
        }
        let row = area.y + area.height - 1;
        let status = match self.taskbar.dragged_window() {
            Some(window) => format!(
                "dragging {}  workspace {}",
                self.shell.window_title(window),
                self.shell.active_workspace()
            ),
            None => format!("workspace {}  {STATUS}", self.shell.active_workspace()),
        };
        frame.set_string(
            area.x,
            row,
            &status,
            Style::default().fg(theme::panel_fg()).bg(theme::panel_bg()),
        );
    }
}

/// Split `width` columns into `count` monitors; the last one takes the
/// remainder.
fn split_width(width: u16, count: usize) -> Vec<u16> {
    let count = count.max(1) as u16;
    let base = width / count;
    let mut widths = vec![base; count as usize];
    if let Some(last) = widths.last_mut() {
        *last += width - base * count;
    }
    widths
}

fn open_store(path: Option<PathBuf>) -> Box<dyn OrderStore> {
    let store = match path {
        Some(path) => Ok(FileOrderStore::new(path)),
        None => FileOrderStore::open_default(),
    };
    match store {
        Ok(store) => {
            tracing::debug!(path = %store.path().display(), "using window order file");
            Box::new(store)
        }
        Err(err) => {
            tracing::warn!(%err, "window order will not be persisted");
            Box::new(MemoryOrderStore::new())
        }
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        tracing_sub::set_log_file(path)?;
        tracing_sub::init_with_level(if args.verbose {
            Level::TRACE
        } else {
            Level::DEBUG
        });
    }

    let (width, height) = crossterm::terminal::size()?;
    let timers = Rc::new(IntervalTimers::new());
    let mut demo = Demo::new(&args, width, height.saturating_sub(1), timers.clone())?;

    let mut output = ConsoleOutputDriver::new()?;
    output.enter()?;
    let mut event_loop = EventLoop::new(
        ConsoleInputDriver::new(),
        Duration::from_millis(250),
        timers,
    );
    let result = event_loop.run(|_, event| {
        match event {
            LoopEvent::Idle => output.draw(|frame| demo.draw(frame))?,
            LoopEvent::Input(event) => return Ok(demo.handle_event(event)),
            LoopEvent::Timer(timer) => demo.timer_fired(timer),
        }
        Ok(ControlFlow::Continue)
    });

    if let Err(err) = demo.taskbar.destroy(&mut demo.shell) {
        tracing::error!(%err, "failed to save window order");
    }
    output.exit()?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_width_gives_remainder_to_last() {
        assert_eq!(split_width(80, 3), vec![26, 26, 28]);
        assert_eq!(split_width(10, 1), vec![10]);
        assert_eq!(split_width(10, 0), vec![10]);
    }

    #[test]
    fn args_parse_defaults() {
        let args = Args::parse_from(["term-taskbar"]);
        assert_eq!(args.monitors, 2);
        assert_eq!(args.windows, 3);
        assert_eq!(args.poll_ms, 50);
        assert!(!args.no_isolate_monitors);
    }
}
