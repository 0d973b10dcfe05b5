use crate::foundation::error::{ViewerError, ViewerResult};

/// Timeline position of the frame being viewed.
pub type SequenceTime = i64;

/// Index of the stereo/multi-view channel being displayed.
pub type ViewIndex = u32;

/// Integer pixel rectangle `[x1, x2) x [y1, y2)` in source-resolution coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RectI {
    /// Inclusive left bound.
    pub x1: i32,
    /// Inclusive bottom bound.
    pub y1: i32,
    /// Exclusive right bound.
    pub x2: i32,
    /// Exclusive top bound.
    pub y2: i32,
}

impl RectI {
    /// Create a validated rectangle with `x1 <= x2` and `y1 <= y2`.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> ViewerResult<Self> {
        if x1 > x2 || y1 > y2 {
            return Err(ViewerError::validation(format!(
                "RectI bounds are inverted: ({x1},{y1})-({x2},{y2})"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(width: i32, height: i32) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: width.max(0),
            y2: height.max(0),
        }
    }

    /// The unbounded rectangle generators use to signal "infinite extent".
    pub fn infinite() -> Self {
        Self {
            x1: i32::MIN,
            y1: i32::MIN,
            x2: i32::MAX,
            y2: i32::MAX,
        }
    }

    /// Return `true` when any bound sits at the integer limits.
    pub fn is_infinite(self) -> bool {
        self.x1 == i32::MIN || self.y1 == i32::MIN || self.x2 == i32::MAX || self.y2 == i32::MAX
    }

    /// Width in pixels; inverted rectangles report 0.
    pub fn width(self) -> i32 {
        self.x2.saturating_sub(self.x1).max(0)
    }

    /// Height in pixels; inverted rectangles report 0.
    pub fn height(self) -> i32 {
        self.y2.saturating_sub(self.y1).max(0)
    }

    /// Return `true` when the rectangle covers no pixel.
    pub fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Return `true` when `(x, y)` is inside the rectangle.
    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Intersection of two rectangles, or `None` when they do not overlap.
    pub fn intersect(self, other: RectI) -> Option<RectI> {
        let r = RectI {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        if r.is_empty() { None } else { Some(r) }
    }

    /// Replace each bound sitting at the integer limits by the matching bound of `fallback`.
    ///
    /// Finite bounds are kept, so finite rectangles are returned unchanged.
    pub fn clip_infinite_to(self, fallback: RectI) -> RectI {
        Self {
            x1: if self.x1 == i32::MIN { fallback.x1 } else { self.x1 },
            y1: if self.y1 == i32::MIN { fallback.y1 } else { self.y1 },
            x2: if self.x2 == i32::MAX { fallback.x2 } else { self.x2 },
            y2: if self.y2 == i32::MAX { fallback.y2 } else { self.y2 },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
