//! Clip regions exchanged with the drawing library
//!
//! A [`Region`] is a plain list of boxes in pixman form: `(x1, y1)` is the
//! inclusive top-left corner and `(x2, y2)` the exclusive bottom-right corner.
//! Region algebra (union, subtraction, coalescing) belongs to the caller; this
//! type only carries rectangles and knows how to flip them vertically.
//!
//! # Example
//!
//! ```
//! use axiom_glx::region::{Rect, Region};
//!
//! let region = Region::from_rect(Rect::new(0, 0, 10, 20));
//! let flipped = region.flipped_y(100);
//! assert_eq!(flipped.rects(), &[Rect::new(0, 80, 10, 100)]);
//! ```

/// Axis-aligned box in pixman form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    /// Creates a box from its two corners
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Creates a box from origin and size
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width as i32,
            y2: y + height as i32,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// A box with no area
    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Mirror the vertical extent against a surface of `height` pixels.
    ///
    /// Converts between the X11 convention (origin top-left, y down) and the
    /// GL convention (origin bottom-left, y up). Applying it twice with the
    /// same height yields the original box.
    pub fn flip_y(&self, height: i32) -> Self {
        Self {
            x1: self.x1,
            y1: height - self.y2,
            x2: self.x2,
            y2: height - self.y1,
        }
    }
}

/// List of boxes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::from_rects([rect])
    }

    /// Builds a region, dropping boxes without area
    pub fn from_rects<I: IntoIterator<Item = Rect>>(rects: I) -> Self {
        Self {
            rects: rects.into_iter().filter(|r| !r.is_empty()).collect(),
        }
    }

    pub fn push(&mut self, rect: Rect) {
        if !rect.is_empty() {
            self.rects.push(rect);
        }
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Bounding box of all rectangles
    pub fn extents(&self) -> Option<Rect> {
        let first = *self.rects.first()?;
        Some(self.rects.iter().skip(1).fold(first, |acc, r| Rect {
            x1: acc.x1.min(r.x1),
            y1: acc.y1.min(r.y1),
            x2: acc.x2.max(r.x2),
            y2: acc.y2.max(r.y2),
        }))
    }

    /// Copy of this region with every box flipped against `height`
    pub fn flipped_y(&self, height: i32) -> Region {
        Region {
            rects: self.rects.iter().map(|r| r.flip_y(height)).collect(),
        }
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Region::from_rect(rect)
    }
}
