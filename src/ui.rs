//! UiFrame: a thin wrapper around `ratatui::Frame` that clamps drawing to the
//! visible area.
//!
//! Panel rectangles are derived from shell coordinates, which may drift
//! partially or fully outside the terminal buffer (a monitor wider than the
//! terminal, a resize between frames). Writing out of bounds into the
//! underlying `Buffer` panics, so every draw call goes through here and is
//! clipped first.
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

pub struct UiFrame<'a> {
    area: Rect,
    buffer: &'a mut Buffer,
}

impl<'a> UiFrame<'a> {
    pub fn new(frame: &'a mut Frame<'_>) -> Self {
        let area = frame.area();
        let buffer = frame.buffer_mut();
        Self { area, buffer }
    }

    /// Construct a `UiFrame` directly from an area and buffer, for offscreen
    /// rendering.
    pub fn from_parts(area: Rect, buffer: &'a mut Buffer) -> Self {
        Self { area, buffer }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    fn clip_rect(&self, rect: Rect) -> Option<Rect> {
        let clipped = rect.intersection(self.area);
        if clipped.width == 0 || clipped.height == 0 {
            None
        } else {
            Some(clipped)
        }
    }

    pub fn render_widget<W>(&mut self, widget: W, area: Rect)
    where
        W: Widget,
    {
        if let Some(clipped) = self.clip_rect(area) {
            widget.render(clipped, self.buffer);
        }
    }

    /// Restyle every cell of `area` without touching its symbols.
    pub fn fill_style(&mut self, area: Rect, style: Style) {
        let Some(clipped) = self.clip_rect(area) else {
            return;
        };
        self.buffer.set_style(clipped, style);
    }

    pub fn set_string(&mut self, x: u16, y: u16, text: &str, style: Style) {
        let area = self.area;
        safe_set_string(self.buffer, area, x, y, text, style);
    }
}

pub(crate) fn safe_set_string(
    buffer: &mut Buffer,
    bounds: Rect,
    x: u16,
    y: u16,
    text: &str,
    style: Style,
) {
    if bounds.width == 0 || bounds.height == 0 {
        return;
    }
    let max_x = bounds.x.saturating_add(bounds.width);
    let max_y = bounds.y.saturating_add(bounds.height);
    if x < bounds.x || x >= max_x || y < bounds.y || y >= max_y {
        return;
    }
    let available = max_x.saturating_sub(x);
    if available == 0 {
        return;
    }
    let text = truncate_to_width(text, available as usize);
    buffer.set_string(x, y, text, style);
}

pub(crate) fn truncate_to_width(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    value.chars().take(width).collect()
}
