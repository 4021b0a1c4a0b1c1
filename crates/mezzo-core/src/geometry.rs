#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Native-view coordinates: `f64` points, origin at top-left, y growing down.

/// A point in native-view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both coordinates into the given inclusive ranges.
    ///
    /// Each range must satisfy `min <= max`; callers derive the ranges from
    /// content size, viewport size, and insets.
    #[inline]
    pub fn clamped(self, x_range: (f64, f64), y_range: (f64, f64)) -> Point {
        Point {
            x: self.x.clamp(x_range.0, x_range.1),
            y: self.y.clamp(y_range.0, y_range.1),
        }
    }
}

/// A size in native-view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check whether either dimension is zero (or negative).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Edge insets around a scrollable content area.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Insets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Insets {
    pub const ZERO: Insets = Insets {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    /// Create new insets.
    #[inline]
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Total horizontal inset.
    #[inline]
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    /// Total vertical inset.
    #[inline]
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_clamps_into_range() {
        let p = Point::new(-10.0, 250.0);
        let clamped = p.clamped((0.0, 100.0), (0.0, 200.0));
        assert_eq!(clamped, Point::new(0.0, 200.0));
    }

    #[test]
    fn point_inside_range_unchanged() {
        let p = Point::new(5.0, 5.0);
        assert_eq!(p.clamped((0.0, 10.0), (0.0, 10.0)), p);
    }

    #[test]
    fn size_empty() {
        assert!(Size::ZERO.is_empty());
        assert!(Size::new(10.0, 0.0).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn insets_totals() {
        let i = Insets::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(i.horizontal(), 6.0);
        assert_eq!(i.vertical(), 4.0);
    }
}
