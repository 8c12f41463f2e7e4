//! Geometry primitives shared across the engine.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// A field rectangle in document points, origin at the page's bottom-left
/// corner with y increasing upward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl FieldRect {
    /// Create a rectangle from its bottom-left corner and size.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Bottom-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    /// Field-wise comparison within `eps`, for float-tolerant assertions.
    pub fn approx_eq(&self, other: &FieldRect, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.w - other.w).abs() <= eps
            && (self.h - other.h).abs() <= eps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_rect_accessors() {
        let r = FieldRect::new(10.0, 20.0, 120.0, 60.0);
        assert_eq!(r.origin(), Point::new(10.0, 20.0));
        assert_eq!(r.size(), Size::new(120.0, 60.0));
    }

    #[test]
    fn test_approx_eq_tolerance() {
        let a = FieldRect::new(1.0, 2.0, 3.0, 4.0);
        let b = FieldRect::new(1.0005, 2.0, 3.0, 4.0);
        assert!(a.approx_eq(&b, 1e-3));
        assert!(!a.approx_eq(&b, 1e-4));
    }

    #[test]
    fn test_serde_named_fields() {
        let r = FieldRect::new(50.0, 60.0, 120.0, 40.0);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"x\":50.0"));
        assert!(json.contains("\"h\":40.0"));
        let back: FieldRect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
