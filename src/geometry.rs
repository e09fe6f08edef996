use ratatui::layout::Rect;

/// Index of a monitor (and therefore of the panel hosting a window list).
pub type MonitorIndex = usize;

/// A point in global (shell) coordinates. Monitors may sit left of or above
/// the primary one, so both axes are signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Rebase this point onto `origin`.
    pub fn relative_to(self, origin: Point) -> Point {
        Point {
            x: self.x.saturating_sub(origin.x),
            y: self.y.saturating_sub(origin.y),
        }
    }
}

/// Signed origin with unsigned size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Bounds {
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, point: Point) -> bool {
        if self.is_empty() {
            return false;
        }
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Horizontal distance from `x` to this span; zero when `x` falls inside.
    pub fn horizontal_distance(&self, x: i32) -> u32 {
        if x < self.left() {
            self.left().abs_diff(x)
        } else if x >= self.right() {
            x.abs_diff(self.right().saturating_sub(1))
        } else {
            0
        }
    }

    pub fn offset(self, origin: Point) -> Bounds {
        Bounds {
            x: self.x.saturating_add(origin.x),
            y: self.y.saturating_add(origin.y),
            ..self
        }
    }

    /// Clip to the non-negative quadrant so the bounds can be drawn into a
    /// terminal buffer.
    pub fn to_rect(self) -> Rect {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().max(0);
        let y1 = self.bottom().max(0);
        Rect {
            x: x0.min(u16::MAX as i32) as u16,
            y: y0.min(u16::MAX as i32) as u16,
            width: (x1 - x0).min(u16::MAX as i32) as u16,
            height: (y1 - y0).min(u16::MAX as i32) as u16,
        }
    }
}
