// Pointer gesture math: dragging, resizing, opacity steps

use web_sys::MouseEvent;

use crate::model::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MIN_HEIGHT, MIN_WIDTH, WindowId};

pub const OPACITY_MIN: f64 = 0.1;
pub const OPACITY_MAX: f64 = 1.0;
const OPACITY_STEPS_PER_UNIT: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Viewport coordinates of a mouse or pointer event.
    pub fn from_mouse(ev: &MouseEvent) -> Self {
        Self::new(ev.client_x() as f64, ev.client_y() as f64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Grow to at least the minimum window size.
    pub fn at_least_minimum(self) -> Self {
        Self {
            width: self.width.max(MIN_WIDTH),
            height: self.height.max(MIN_HEIGHT),
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

/// A window being moved by its title bar.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub id: WindowId,
    // press point minus window origin
    grab_offset: Point,
}

impl DragSession {
    pub fn begin(id: WindowId, pointer: Point, origin: Point) -> Self {
        Self {
            id,
            grab_offset: Point::new(pointer.x - origin.x, pointer.y - origin.y),
        }
    }

    /// Window origin that keeps the grabbed spot under the pointer.
    pub fn origin_at(&self, pointer: Point) -> Point {
        Point::new(pointer.x - self.grab_offset.x, pointer.y - self.grab_offset.y)
    }
}

/// A resize handle held down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeSession {
    pointer_start: Point,
    size_start: Size,
}

impl ResizeSession {
    pub fn begin(pointer: Point, size: Size) -> Self {
        Self {
            pointer_start: pointer,
            size_start: size,
        }
    }

    pub fn size_at(&self, pointer: Point) -> Size {
        Size::new(
            self.size_start.width + (pointer.x - self.pointer_start.x),
            self.size_start.height + (pointer.y - self.pointer_start.y),
        )
        .at_least_minimum()
    }
}

/// Clamp a slider value into the opacity range and round to its step.
pub fn snap_opacity(value: f64) -> f64 {
    if !value.is_finite() {
        return OPACITY_MAX;
    }
    let stepped = (value * OPACITY_STEPS_PER_UNIT).round() / OPACITY_STEPS_PER_UNIT;
    stepped.clamp(OPACITY_MIN, OPACITY_MAX)
}
