//! Terminal rendering of the headless shell: one panel row per monitor with
//! the favorites and window buttons laid out by the shell, and a framed body
//! listing the windows that live on that monitor.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::geometry::MonitorIndex;
use crate::headless::HeadlessShell;
use crate::host::WindowHost;
use crate::theme;
use crate::ui::{UiFrame, truncate_to_width};
use crate::view::{Container, HandleId, Slot};

#[derive(Debug, Default)]
pub struct Panel {
    hovered: Option<HandleId>,
    hover_suppressed: bool,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<HandleId> {
        self.hovered
    }

    /// Track the handle under the pointer. `suppressed` hides the hover
    /// highlight while a drag passes over the handle.
    pub fn set_hovered(&mut self, handle: Option<HandleId>, suppressed: bool) {
        self.hovered = handle;
        self.hover_suppressed = handle.is_some() && suppressed;
    }

    pub fn render(&self, frame: &mut UiFrame<'_>, shell: &HeadlessShell) {
        for monitor in 0..shell.monitor_count() {
            self.render_panel(frame, shell, monitor);
            render_body(frame, shell, monitor);
        }
    }

    fn render_panel(&self, frame: &mut UiFrame<'_>, shell: &HeadlessShell, monitor: MonitorIndex) {
        let Some(panel) = shell.panel_bounds(monitor) else {
            return;
        };
        frame.fill_style(
            panel.to_rect(),
            Style::default().bg(theme::panel_bg()).fg(theme::panel_fg()),
        );
        for container in [Container::Favorites, Container::Windows] {
            for handle in shell.handles_in(monitor, container) {
                let Some(bounds) = shell.handle_global_bounds(handle) else {
                    continue;
                };
                if bounds.x < 0 || bounds.y < 0 {
                    continue;
                }
                let label = shell.handle_label(handle).unwrap_or_default();
                let inner = truncate_to_width(label, bounds.width.saturating_sub(2) as usize);
                let chunk = format!(" {inner} ");
                frame.set_string(
                    bounds.x as u16,
                    bounds.y as u16,
                    &chunk,
                    self.handle_style(handle, shell),
                );
            }
        }
    }

    fn handle_style(&self, handle: HandleId, shell: &HeadlessShell) -> Style {
        let base = Style::default().bg(theme::panel_bg());
        if shell.is_handle_dragging(handle) {
            return base
                .bg(theme::dragging_bg())
                .fg(theme::dragging_fg())
                .add_modifier(Modifier::BOLD);
        }
        if self.hovered == Some(handle) && !self.hover_suppressed {
            return base.bg(theme::hover_bg()).fg(theme::panel_fg());
        }
        match handle.slot {
            Slot::Favorite(_) => base.fg(theme::favorite_fg()),
            Slot::Window(window) if shell.focused_window() == Some(window) => base
                .bg(theme::focused_bg())
                .fg(theme::focused_fg())
                .add_modifier(Modifier::BOLD),
            Slot::Window(window) if shell.is_minimized(window) => base
                .fg(theme::minimized_fg())
                .add_modifier(Modifier::DIM),
            Slot::Window(_) => base.fg(theme::window_fg()),
        }
    }
}

fn render_body(frame: &mut UiFrame<'_>, shell: &HeadlessShell, monitor: MonitorIndex) {
    let Some(bounds) = shell.monitor_bounds(monitor) else {
        return;
    };
    let area = bounds.to_rect();
    if area.height < 2 {
        return;
    }
    let body = Rect {
        y: area.y + 1,
        height: area.height - 1,
        ..area
    };
    let lines: Vec<Line> = shell
        .window_ids()
        .into_iter()
        .filter(|w| shell.window_monitor(*w) == Some(monitor))
        .map(|w| {
            let mut text = format!(
                "{} {}  ws{}",
                w,
                shell.window_title(w),
                shell.window_workspace(w).unwrap_or_default()
            );
            if shell.is_minimized(w) {
                text.push_str("  (minimized)");
            }
            if shell.skip_taskbar(w) {
                text.push_str("  (skip taskbar)");
            }
            Line::from(text)
        })
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::monitor_border()))
        .title(format!(" monitor {monitor} "))
        .title_style(Style::default().fg(theme::monitor_title()));
    frame.render_widget(Paragraph::new(lines).block(block), body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HandleSurface;
    use ratatui::buffer::Buffer;

    fn row(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width)
            .filter_map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()))
            .collect()
    }

    fn shell_with_buttons() -> (HeadlessShell, HandleId, HandleId) {
        let mut shell = HeadlessShell::with_monitors(&[30], 4);
        let fav = HandleId::favorite(0, 1);
        shell.create_handle(fav, Container::Favorites, "sh".into());
        shell.set_handle_visible(fav, true);
        let window = shell.open_window("editor", 0);
        let handle = HandleId::window(0, window);
        shell.create_handle(handle, Container::Windows, "editor".into());
        shell.set_handle_visible(handle, true);
        (shell, fav, handle)
    }

    #[test]
    fn panel_row_shows_favorites_then_windows() {
        let (shell, _, _) = shell_with_buttons();
        let area = Rect::new(0, 0, 30, 4);
        let mut buf = Buffer::empty(area);
        let mut ui = UiFrame::from_parts(area, &mut buf);
        Panel::new().render(&mut ui, &shell);
        assert!(row(&buf, 0, 30).starts_with(" sh   editor "));
        assert!(row(&buf, 1, 30).contains("monitor 0"));
    }

    #[test]
    fn dragging_wins_over_hover() {
        let (mut shell, _, handle) = shell_with_buttons();
        shell.set_handle_dragging(handle, true);
        let mut panel = Panel::new();
        panel.set_hovered(Some(handle), false);
        let style = panel.handle_style(handle, &shell);
        assert_eq!(style.bg, Some(theme::dragging_bg()));

        shell.set_handle_dragging(handle, false);
        shell.focus(None);
        let style = panel.handle_style(handle, &shell);
        assert_eq!(style.bg, Some(theme::hover_bg()));
        panel.set_hovered(Some(handle), true);
        let style = panel.handle_style(handle, &shell);
        assert_eq!(style.bg, Some(theme::panel_bg()));
    }

    #[test]
    fn focused_window_is_highlighted() {
        let (shell, fav, handle) = shell_with_buttons();
        let panel = Panel::new();
        assert_eq!(shell.focused_window(), handle.window_id());
        let window_style = panel.handle_style(handle, &shell);
        assert_eq!(window_style.bg, Some(theme::focused_bg()));
        let favorite_style = panel.handle_style(fav, &shell);
        assert_eq!(favorite_style.fg, Some(theme::favorite_fg()));
    }
}
