use ratatui::style::Color;

// Centralized taskbar colors. Small helpers so the palette can change in
// one place.

// Panel
pub fn panel_bg() -> Color {
    Color::DarkGray
}
pub fn panel_fg() -> Color {
    Color::White
}

// Favorites
pub fn favorite_fg() -> Color {
    Color::Cyan
}

// Window buttons
pub fn window_fg() -> Color {
    Color::Gray
}
pub fn focused_bg() -> Color {
    Color::Gray
}
pub fn focused_fg() -> Color {
    Color::Black
}
pub fn minimized_fg() -> Color {
    Color::Black
}
pub fn hover_bg() -> Color {
    Color::Blue
}

// Drag feedback
pub fn dragging_bg() -> Color {
    Color::Rgb(200, 100, 0)
}
pub fn dragging_fg() -> Color {
    Color::Black
}

// Monitor frames
pub fn monitor_border() -> Color {
    Color::DarkGray
}
pub fn monitor_title() -> Color {
    Color::Rgb(255, 165, 0)
}
