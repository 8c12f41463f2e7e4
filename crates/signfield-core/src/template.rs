//! Reusable field-group templates and their application at a drop point.

use crate::field::Field;
use crate::snap::{GuideSet, SnapEngine};
use crate::store::FieldStore;
use crate::transform::PageTransform;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Group assigned to templates that do not declare one.
pub const DEFAULT_TEMPLATE_GROUP: &str = "General";

fn default_required() -> bool {
    true
}

/// One field shape within a template.
///
/// `dx`/`dy` offset the item from the drop anchor; all four lengths are in
/// document points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateItem {
    pub name: String,
    pub w: f64,
    pub h: f64,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub dx: f64,
    #[serde(default)]
    pub dy: f64,
}

impl TemplateItem {
    pub fn new(name: impl Into<String>, w: f64, h: f64) -> Self {
        Self {
            name: name.into(),
            w,
            h,
            required: true,
            dx: 0.0,
            dy: 0.0,
        }
    }

    pub fn with_offset(mut self, dx: f64, dy: f64) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A named, reusable group of field shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub items: Vec<TemplateItem>,
}

impl Template {
    pub fn new(name: impl Into<String>, group: impl Into<String>, items: Vec<TemplateItem>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            group: group.into(),
            items,
        }
    }

    /// Repair a loaded record: fresh id when blank, default group when blank.
    pub fn repair(&mut self) {
        if self.id.trim().is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        if self.group.trim().is_empty() {
            self.group = DEFAULT_TEMPLATE_GROUP.to_string();
        }
    }
}

/// Expand `template` at `anchor` (pixel-space, top-left origin) on `page`.
///
/// Each item's pixel box is offset from the anchor, snapped against the
/// page and the fields already present (including items placed earlier in
/// this same application), converted to document points and added to the
/// store through the ordinary naming rule. Items land as independent
/// fields; nothing groups them afterwards. Returns the created fields.
pub fn apply(
    template: &Template,
    page: u32,
    anchor: Point,
    transform: &PageTransform,
    engine: &SnapEngine,
    store: &mut FieldStore,
) -> Vec<Field> {
    let mut boxes: Vec<Rect> = store
        .fields_on_page(page)
        .iter()
        .map(|f| transform.rect_to_px(f.rect))
        .collect();
    let mut created = Vec::with_capacity(template.items.len());
    for item in &template.items {
        let x0 = anchor.x + transform.to_px(item.dx);
        let y0 = anchor.y + transform.to_px(item.dy);
        let candidate = Rect::new(
            x0,
            y0,
            x0 + transform.to_px(item.w),
            y0 + transform.to_px(item.h),
        );
        let guides = GuideSet::collect(transform.page_size_px(), &boxes);
        let snapped = engine.snap_rect(candidate, &guides).rect;
        let field = store.add(page, transform.rect_to_pt(snapped), item.required, Some(&item.name));
        boxes.push(snapped);
        created.push(field);
    }
    created
}
