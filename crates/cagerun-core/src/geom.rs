use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in screen space (y grows downward).
///
/// `x`/`y` are the top-left corner. All gameplay overlap tests go through
/// [`Rect::overlaps`], which treats touching edges as non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle whose bottom edge is centered on `(center_x, bottom)`.
    pub fn from_midbottom(center_x: f32, bottom: f32, w: f32, h: f32) -> Self {
        Self {
            x: center_x - w / 2.0,
            y: bottom - h,
            w,
            h,
        }
    }

    /// Rectangle whose top edge is centered on `(center_x, top)`.
    pub fn from_midtop(center_x: f32, top: f32, w: f32, h: f32) -> Self {
        Self {
            x: center_x - w / 2.0,
            y: top,
            w,
            h,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    /// Grow (positive) or shrink (negative) around the center.
    ///
    /// Shrinking past zero clamps the dimension to zero instead of flipping.
    pub fn inflate(&self, dw: f32, dh: f32) -> Self {
        let w = (self.w + dw).max(0.0);
        let h = (self.h + dh).max(0.0);
        Self {
            x: self.center_x() - w / 2.0,
            y: self.center_y() - h / 2.0,
            w,
            h,
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}
