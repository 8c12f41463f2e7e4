//! Mapping between render pixel-space and document point-space.
//!
//! The renderer works in pixels with the origin at the page's top-left
//! corner and y growing downward; document geometry is in points with the
//! origin at the bottom-left corner and y growing upward. A single scalar
//! zoom factor relates the two, but vertical positions additionally need
//! the page height to flip between the conventions.

use crate::geom::FieldRect;
use kurbo::{Point, Rect, Size};

/// Transform for one page at one zoom level.
///
/// Pages may differ in size, so a fresh transform must be built whenever
/// the active page changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTransform {
    /// Zoom factor relating points to pixels.
    scale: f64,
    /// Page size in document points.
    page_size: Size,
}

impl PageTransform {
    /// Create a transform for a page of `page_size` points at `scale`.
    pub fn new(scale: f64, page_size: Size) -> Self {
        Self { scale, page_size }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    /// Page extent in pixel-space at the current zoom.
    pub fn page_size_px(&self) -> Size {
        Size::new(
            self.page_size.width * self.scale,
            self.page_size.height * self.scale,
        )
    }

    /// Scale a length from points to pixels.
    pub fn to_px(&self, v_pt: f64) -> f64 {
        v_pt * self.scale
    }

    /// Scale a length from pixels to points.
    pub fn to_pt(&self, v_px: f64) -> f64 {
        v_px / self.scale
    }

    /// Convert a document-point position to a pixel-space position.
    pub fn point_to_px(&self, pt: Point) -> Point {
        Point::new(
            self.to_px(pt.x),
            (self.page_size.height - pt.y) * self.scale,
        )
    }

    /// Convert a pixel-space position to a document-point position.
    pub fn point_to_pt(&self, px: Point) -> Point {
        Point::new(
            self.to_pt(px.x),
            self.page_size.height - self.to_pt(px.y),
        )
    }

    /// Convert a field rectangle to the pixel-space box the renderer draws.
    ///
    /// The returned rect is anchored at its top-left corner:
    /// `y0 = (page_height - y - h) * scale`.
    pub fn rect_to_px(&self, rect: FieldRect) -> Rect {
        let x0 = self.to_px(rect.x);
        let y0 = (self.page_size.height - rect.y - rect.h) * self.scale;
        Rect::new(x0, y0, x0 + self.to_px(rect.w), y0 + self.to_px(rect.h))
    }

    /// Convert a pixel-space box back into a field rectangle.
    pub fn rect_to_pt(&self, rect: Rect) -> FieldRect {
        let w = self.to_pt(rect.width());
        let h = self.to_pt(rect.height());
        FieldRect::new(
            self.to_pt(rect.x0),
            self.page_size.height - self.to_pt(rect.y0) - h,
            w,
            h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-3;

    fn letter() -> Size {
        Size::new(612.0, 792.0)
    }

    #[test]
    fn test_scalar_round_trip() {
        for &scale in &[0.5, 1.0, 1.37, 2.0, 4.0] {
            let t = PageTransform::new(scale, letter());
            for &v in &[0.0, 1.0, 36.5, 611.25, 792.0] {
                assert!((t.to_pt(t.to_px(v)) - v).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_rect_round_trip() {
        let rects = [
            FieldRect::new(50.0, 50.0, 120.0, 60.0),
            FieldRect::new(0.0, 0.0, 612.0, 792.0),
            FieldRect::new(500.25, 700.75, 10.5, 3.125),
        ];
        for &scale in &[0.5, 1.0, 1.37, 4.0] {
            let t = PageTransform::new(scale, letter());
            for &r in &rects {
                let back = t.rect_to_pt(t.rect_to_px(r));
                assert!(back.approx_eq(&r, EPS), "scale {scale}: {back:?} vs {r:?}");
            }
        }
    }

    #[test]
    fn test_vertical_flip() {
        // A field at the bottom-left of a letter page, zoom 2x: its top
        // edge in pixels sits near the bottom of the rendered page.
        let t = PageTransform::new(2.0, letter());
        let px = t.rect_to_px(FieldRect::new(0.0, 0.0, 100.0, 50.0));
        assert!((px.x0 - 0.0).abs() < EPS);
        assert!((px.y0 - (792.0 - 50.0) * 2.0).abs() < EPS);
        assert!((px.width() - 200.0).abs() < EPS);
        assert!((px.height() - 100.0).abs() < EPS);
    }

    #[test]
    fn test_point_flip_round_trip() {
        let t = PageTransform::new(1.5, letter());
        let pt = Point::new(300.0, 100.0);
        let px = t.point_to_px(pt);
        assert!((px.y - (792.0 - 100.0) * 1.5).abs() < EPS);
        let back = t.point_to_pt(px);
        assert!((back.x - pt.x).abs() < EPS && (back.y - pt.y).abs() < EPS);
    }

    #[test]
    fn test_page_height_affects_y_only() {
        // Same rect on pages of different heights lands at different pixel
        // rows but the same pixel column.
        let r = FieldRect::new(72.0, 72.0, 144.0, 72.0);
        let a = PageTransform::new(1.0, Size::new(612.0, 792.0)).rect_to_px(r);
        let b = PageTransform::new(1.0, Size::new(612.0, 1008.0)).rect_to_px(r);
        assert!((a.x0 - b.x0).abs() < EPS);
        assert!((b.y0 - a.y0 - 216.0).abs() < EPS);
    }

    #[test]
    fn test_page_size_px() {
        let t = PageTransform::new(2.0, letter());
        assert_eq!(t.page_size_px(), Size::new(1224.0, 1584.0));
    }
}
