//! Grid and alignment-guide snapping for field gestures.
//!
//! All snapping happens in pixel-space mid-gesture. Guides come from the
//! page bounds (edges and center) and from every *other* field box on the
//! page (edges and centers per axis). Each edge of a dragged box attracts
//! independently to the nearest guide within tolerance; when both edges of
//! an axis find candidates, the smaller displacement wins and the box
//! shifts rigidly along that axis, so a box never changes size while
//! snapping.
//!
//! The visual grid does not attract; it only gates creation so that a
//! micro-click cannot produce a near-zero-sized field.

use kurbo::{Rect, Size};

/// Pixel distance within which an edge attracts to a guide.
pub const SNAP_TOLERANCE_PX: f64 = 5.0;
/// Visual grid pitch in document points.
pub const GRID_PT: f64 = 8.0;
/// Grid cells a drawn rectangle must exceed, per axis, to create a field.
pub const MIN_GRID_CELLS: f64 = 3.0;

/// Alignment guides for one page, in pixel-space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuideSet {
    /// Vertical guide lines (x values).
    pub xs: Vec<f64>,
    /// Horizontal guide lines (y values).
    pub ys: Vec<f64>,
}

impl GuideSet {
    /// Collect guides from the page bounds and the other field boxes.
    pub fn collect(page_size: Size, others: &[Rect]) -> Self {
        let mut xs = vec![0.0, page_size.width / 2.0, page_size.width];
        let mut ys = vec![0.0, page_size.height / 2.0, page_size.height];
        for r in others {
            xs.extend([r.x0, r.center().x, r.x1]);
            ys.extend([r.y0, r.center().y, r.y1]);
        }
        Self { xs, ys }
    }
}

/// Outcome of snapping a candidate rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The (possibly shifted) rectangle.
    pub rect: Rect,
    /// Whether the x axis snapped to a guide.
    pub snapped_x: bool,
    /// Whether the y axis snapped to a guide.
    pub snapped_y: bool,
}

/// Edge-attraction snapping with a configurable tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapEngine {
    tolerance: f64,
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self {
            tolerance: SNAP_TOLERANCE_PX,
        }
    }
}

impl SnapEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Snap a candidate rectangle against the guides, axis by axis.
    pub fn snap_rect(&self, rect: Rect, guides: &GuideSet) -> SnapResult {
        let dx = axis_shift(rect.x0, rect.x1, &guides.xs, self.tolerance);
        let dy = axis_shift(rect.y0, rect.y1, &guides.ys, self.tolerance);
        let shifted = Rect::new(
            rect.x0 + dx.unwrap_or(0.0),
            rect.y0 + dy.unwrap_or(0.0),
            rect.x1 + dx.unwrap_or(0.0),
            rect.y1 + dy.unwrap_or(0.0),
        );
        SnapResult {
            rect: shifted,
            snapped_x: dx.is_some(),
            snapped_y: dy.is_some(),
        }
    }
}

/// Shift that lands the leading or trailing edge on its nearest guide.
///
/// When both edges have a candidate within tolerance, the smaller
/// displacement wins (ties favor the leading edge).
fn axis_shift(lead: f64, trail: f64, guides: &[f64], tolerance: f64) -> Option<f64> {
    let lead_delta = nearest_delta(lead, guides, tolerance);
    let trail_delta = nearest_delta(trail, guides, tolerance);
    match (lead_delta, trail_delta) {
        (Some(a), Some(b)) => Some(if b.abs() < a.abs() { b } else { a }),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Smallest delta from `edge` to any guide within tolerance.
fn nearest_delta(edge: f64, guides: &[f64], tolerance: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for &guide in guides {
        let delta = guide - edge;
        if delta.abs() <= tolerance && best.is_none_or(|b: f64| delta.abs() < b.abs()) {
            best = Some(delta);
        }
    }
    best
}

/// Grid pitch in pixels at the given zoom factor.
pub fn grid_px(scale: f64) -> f64 {
    GRID_PT * scale
}

/// Creation gate: both dimensions must exceed [`MIN_GRID_CELLS`] grid
/// cells. The comparison is strict, so a rect of exactly three cells is
/// still discarded.
pub fn meets_min_draw_size(size: Size, grid_px: f64) -> bool {
    let min = MIN_GRID_CELLS * grid_px;
    size.width > min && size.height > min
}
