//! Export-time clamping and widget naming against target page geometry.
//!
//! Planning is pure: it takes the final field list plus the target
//! document's page boxes and existing form-field names, and produces the
//! widget placements a document writer can bake in, together with the
//! fields that had to be skipped and why. Skips are normal (fields parked
//! off-page, degenerate rects), never errors.

use crate::field::{Field, FieldKind};
use crate::geom::FieldRect;
use crate::naming;
use kurbo::Size;
use std::collections::HashSet;

/// Widgets narrower or shorter than this many points are dropped.
pub const MIN_WIDGET_PT: f64 = 1.0;

/// Usable geometry of one target page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    /// Full media box size.
    pub media: Size,
    /// Crop box size, when the page declares one.
    pub crop: Option<Size>,
}

impl PageBox {
    pub fn new(media: Size) -> Self {
        Self { media, crop: None }
    }

    pub fn with_crop(media: Size, crop: Size) -> Self {
        Self {
            media,
            crop: Some(crop),
        }
    }

    /// Crop box when present, media box otherwise.
    pub fn usable(&self) -> Size {
        self.crop.unwrap_or(self.media)
    }
}

/// A clamped, uniquely named widget ready for the document writer.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetPlacement {
    /// Final widget name, unique within the target document.
    pub name: String,
    /// 1-based page number.
    pub page: u32,
    /// Clamped rectangle in document points.
    pub rect: FieldRect,
    /// Maps to the widget-level mandatory flag.
    pub required: bool,
}

/// Why a field was left out of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Declared page is outside `[1, page_count]`.
    PageOutOfRange,
    /// The page is fully consumed at the clamped origin.
    OriginOutsidePage,
    /// Clamping left less than [`MIN_WIDGET_PT`] in one dimension.
    DegenerateSize,
}

/// A field that could not be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedField {
    pub name: String,
    pub page: u32,
    pub reason: SkipReason,
}

/// Everything the widget writer needs for one export pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportPlan {
    pub placements: Vec<WidgetPlacement>,
    pub skipped: Vec<SkippedField>,
}

/// Clamp every signature field against its page and assign unique widget
/// names.
///
/// Name uniqueness is enforced against the union of `existing_names` (the
/// target document's interactive-form fields) and names assigned earlier
/// in this pass, case-insensitively, with the same `_{k}` suffix rule used
/// at placement time. A blank field name falls back to the `Signature`
/// base.
pub fn plan(fields: &[Field], pages: &[PageBox], existing_names: &[String]) -> ExportPlan {
    let mut taken: HashSet<String> = existing_names.iter().map(|n| naming::name_key(n)).collect();
    let mut result = ExportPlan::default();

    for field in fields.iter().filter(|f| f.kind == FieldKind::Signature) {
        let skip = |reason| SkippedField {
            name: field.name.clone(),
            page: field.page,
            reason,
        };

        if field.page == 0 || field.page as usize > pages.len() {
            result.skipped.push(skip(SkipReason::PageOutOfRange));
            continue;
        }
        let page_size = pages[(field.page - 1) as usize].usable();

        let x = field.rect.x.max(0.0);
        let y = field.rect.y.max(0.0);
        let w = field.rect.w.max(0.0);
        let h = field.rect.h.max(0.0);

        let max_w = page_size.width - x;
        let max_h = page_size.height - y;
        if max_w <= 0.0 || max_h <= 0.0 {
            result.skipped.push(skip(SkipReason::OriginOutsidePage));
            continue;
        }

        let w = w.min(max_w);
        let h = h.min(max_h);
        if w < MIN_WIDGET_PT || h < MIN_WIDGET_PT {
            result.skipped.push(skip(SkipReason::DegenerateSize));
            continue;
        }

        let trimmed = field.name.trim();
        let base = if trimmed.is_empty() {
            naming::DEFAULT_BASE_NAME
        } else {
            trimmed
        };
        let name = naming::resolve_unique(base, &taken);
        taken.insert(naming::name_key(&name));

        result.placements.push(WidgetPlacement {
            name,
            page: field.page,
            rect: FieldRect::new(x, y, w, h),
            required: field.required,
        });
    }
    result
}
